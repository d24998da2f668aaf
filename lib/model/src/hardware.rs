use std::os::unix::io::RawFd;

use crate::port::Port;

/// Per-frame counters maintained by a `Hardware` entry, reset only when the
/// entry itself is recreated (interface loss, daemon restart).
#[derive(Debug, Clone, Copy, Default)]
pub struct Counters {
    pub tx_cnt: u64,
    pub rx_cnt: u64,
    pub rx_discarded_cnt: u64,
    pub rx_unrecognized_cnt: u64,
}

/// Variant-specific state. Replaces the original's `h_ops` function-pointer
/// vtable and `h_data` blob (Design Notes): a plain interface only needs its
/// descriptors, a bond slave also carries its master's name and whether it
/// is the currently-active slave.
#[derive(Debug, Clone)]
pub enum HardwareKind {
    Ethernet,
    BondSlave { master_name: String, master_ifindex: u32, active: bool },
}

/// A local transmit/receive endpoint bound to one OS interface (section 3).
/// Exactly one `Hardware` exists per selected interface; recreated whenever
/// the interface is lost and rediscovered.
pub struct Hardware {
    pub ifname: String,
    pub ifindex: u32,
    pub lladdr: [u8; 6],
    pub kind: HardwareKind,
    pub send_fd: RawFd,
    pub recv_fds: Vec<RawFd>,
    pub flags: u32,
    pub mtu: u32,
    pub counters: Counters,
    pub port: Port,
}

impl Hardware {
    pub fn is_bond_slave(&self) -> bool {
        matches!(self.kind, HardwareKind::BondSlave { .. })
    }

    /// Frames sent on the active slave of a bond must have their source MAC
    /// zeroed so switch-side MAC learning doesn't bind the slave's permanent
    /// MAC to a port the bond isn't using (section 4.4, testable property 5).
    pub fn should_zero_source_mac(&self) -> bool {
        matches!(self.kind, HardwareKind::BondSlave { active: true, .. })
    }
}

impl Drop for Hardware {
    fn drop(&mut self) {
        // Descriptor close and multicast-membership teardown is performed
        // explicitly by `rawio::cleanup` before a `Hardware` is dropped --
        // `rawio` owns the privileged multicast-membership ioctl, which this
        // crate has no access to. This impl intentionally does nothing
        // beyond what `Vec`/`RawFd` already do, documenting that cleanup is
        // the caller's responsibility and not implicit here.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortIdSubtype;

    fn sample_hardware(kind: HardwareKind) -> Hardware {
        Hardware {
            ifname: "eth0".into(),
            ifindex: 2,
            lladdr: [0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
            kind,
            send_fd: -1,
            recv_fds: Vec::new(),
            flags: 0,
            mtu: 1500,
            counters: Counters::default(),
            port: Port::new(PortIdSubtype::InterfaceName, b"eth0".to_vec(), "eth0"),
        }
    }

    #[test]
    fn active_slave_zeroes_source_mac() {
        let hw = sample_hardware(HardwareKind::BondSlave {
            master_name: "bond0".into(),
            master_ifindex: 9,
            active: true,
        });
        assert!(hw.should_zero_source_mac());
    }

    #[test]
    fn inactive_slave_sends_verbatim() {
        let hw = sample_hardware(HardwareKind::BondSlave {
            master_name: "bond0".into(),
            master_ifindex: 9,
            active: false,
        });
        assert!(!hw.should_zero_source_mac());
    }

    #[test]
    fn plain_interface_never_zeroes_source_mac() {
        let hw = sample_hardware(HardwareKind::Ethernet);
        assert!(!hw.should_zero_source_mac());
        assert!(!hw.is_bond_slave());
    }
}
