use std::ffi::CString;
use std::os::fd::RawFd;

use privsep::PrivClient;

use crate::error::ClassifyResult;

// Ioctl request numbers this module issues directly (unprivileged -- plain
// reads on an AF_INET datagram socket, no monitor round trip needed).
const SIOCGIWNAME: u64 = 0x8B01;
const SIOCBONDINFOQUERY: u64 = 0x8994;
const SIOCBONDSLAVEINFOQUERY: u64 = 0x8995;
const SIOCGIFVLAN: u64 = 0x8982;
const GET_VLAN_REALDEV_NAME_CMD: i32 = 8;

/// Outcome of classifying one OS interface (section 4.3). Only `Physical`
/// and `BondSlave` interfaces are announced on directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Bridge,
    Wireless,
    Vlan { real_device: String },
    BondMaster,
    BondSlave { master: String, active: bool },
    Physical,
}

fn open_probe_socket() -> Result<RawFd, nix::errno::Errno> {
    nix::sys::socket::socket(
        nix::sys::socket::AddressFamily::Inet,
        nix::sys::socket::SockType::Datagram,
        nix::sys::socket::SockFlag::empty(),
        None,
    )
}

fn make_ifreq(ifname: &str) -> libc::ifreq {
    let mut ifreq: libc::ifreq = unsafe { std::mem::zeroed() };
    let name = CString::new(ifname).expect("interface name must not contain NUL");
    let bytes = name.as_bytes_with_nul();
    let len = bytes.len().min(ifreq.ifr_name.len());
    for (slot, byte) in ifreq.ifr_name.iter_mut().zip(bytes[..len].iter()) {
        *slot = *byte as libc::c_char;
    }
    ifreq
}

fn is_wireless(ifname: &str) -> bool {
    let Ok(sock) = open_probe_socket() else { return false };
    let mut ifreq = make_ifreq(ifname);
    let rc = unsafe { libc::ioctl(sock, SIOCGIWNAME as _, &mut ifreq) };
    let _ = nix::unistd::close(sock);
    rc == 0
}

fn is_bond_master(ifname: &str) -> bool {
    let Ok(sock) = open_probe_socket() else { return false };
    let mut ifreq = make_ifreq(ifname);
    let rc = unsafe { libc::ioctl(sock, SIOCBONDINFOQUERY as _, &mut ifreq) };
    let _ = nix::unistd::close(sock);
    rc == 0
}

/// Returns the VLAN's real (underlying) device name if `ifname` is a VLAN.
fn vlan_real_device(ifname: &str) -> Option<String> {
    let sock = open_probe_socket().ok()?;
    let mut ifreq = make_ifreq(ifname);
    #[repr(C)]
    struct VlanIoctlArgs {
        cmd: i32,
        device1: [libc::c_char; libc::IFNAMSIZ],
        flag: i16,
        u: [u8; 64],
        device2: [libc::c_char; libc::IFNAMSIZ],
    }
    let mut args: VlanIoctlArgs = unsafe { std::mem::zeroed() };
    args.cmd = GET_VLAN_REALDEV_NAME_CMD;
    let name = CString::new(ifname).ok()?;
    let bytes = name.as_bytes_with_nul();
    let len = bytes.len().min(args.device1.len());
    for (slot, byte) in args.device1.iter_mut().zip(bytes[..len].iter()) {
        *slot = *byte as libc::c_char;
    }
    ifreq.ifr_ifru.ifru_data = (&mut args as *mut VlanIoctlArgs) as *mut libc::c_char;
    let rc = unsafe { libc::ioctl(sock, SIOCGIFVLAN as _, &mut ifreq) };
    let _ = nix::unistd::close(sock);
    if rc != 0 {
        return None;
    }
    let real = unsafe { std::ffi::CStr::from_ptr(args.device2.as_ptr()) };
    let name = real.to_string_lossy().into_owned();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// If `slave` is currently enslaved to `master`, returns whether it is the
/// active slave (used once a candidate master has already been found some
/// other way). The original re-queries this on every send to decide whether
/// to zero the source MAC (`iface_is_bond_slave`'s `active` out-param); this
/// crate instead refreshes it once per scan and caches it on the `Hardware`
/// entry, since a scan already runs on the section 4.3 interval. Callers
/// here are expected to do the same outer loop over known masters.
fn slave_active_state(slave: &str, master: &str) -> Option<bool> {
    let sock = open_probe_socket().ok()?;
    let mut ifreq = make_ifreq(master);
    #[repr(C)]
    struct IfSlave {
        slave_id: i32,
        slave_name: [libc::c_char; libc::IFNAMSIZ],
        link: i32,
        state: i32,
        link_failure_count: u32,
        perm_hwaddr: [libc::c_char; 32],
        queue_id: u16,
    }
    let mut args: IfSlave = unsafe { std::mem::zeroed() };
    ifreq.ifr_ifru.ifru_data = (&mut args as *mut IfSlave) as *mut libc::c_char;
    let rc = unsafe { libc::ioctl(sock, SIOCBONDSLAVEINFOQUERY as _, &mut ifreq) };
    let _ = nix::unistd::close(sock);
    if rc != 0 {
        return None;
    }
    let name = unsafe { std::ffi::CStr::from_ptr(args.slave_name.as_ptr()) };
    if name.to_string_lossy() == slave {
        Some(args.state != 0)
    } else {
        None
    }
}

/// Accessible via the monitor's allowlisted open, per "Bridge:
/// `/sys/class/net/<if>/bridge/` is accessible".
fn is_bridge(priv_client: &mut PrivClient, ifname: &str) -> bool {
    let path = format!("/sys/class/net/{}/bridge/bridge_id", ifname);
    priv_client.open(&path).is_ok()
}

/// Classifies one interface, trying predicates in the order section 4.3
/// specifies. `known_masters` lists bond masters already discovered this
/// scan, used to resolve bond-slave membership without repeating the
/// master-discovery pass per interface.
pub fn classify(
    priv_client: &mut PrivClient,
    ifname: &str,
    known_masters: &[String],
) -> ClassifyResult<Classification> {
    if is_bridge(priv_client, ifname) {
        return Ok(Classification::Bridge);
    }
    if is_wireless(ifname) {
        return Ok(Classification::Wireless);
    }
    if let Some(real_device) = vlan_real_device(ifname) {
        return Ok(Classification::Vlan { real_device });
    }
    if is_bond_master(ifname) {
        return Ok(Classification::BondMaster);
    }
    for master in known_masters {
        if let Some(active) = slave_active_state(ifname, master) {
            return Ok(Classification::BondSlave { master: master.clone(), active });
        }
    }
    Ok(Classification::Physical)
}

/// Minimal acceptance check (section 4.3): packet-family link-layer address,
/// Ethernet hardware type, nonzero address length, multicast or broadcast
/// flag set, not itself a VLAN or bond master.
pub fn passes_minimal_checks(
    hatype: u16,
    lladdr_len: usize,
    flags: u32,
    classification: &Classification,
) -> bool {
    const ARPHRD_ETHER: u16 = 1;
    const IFF_BROADCAST: u32 = 0x2;
    const IFF_MULTICAST: u32 = 0x1000;

    if hatype != ARPHRD_ETHER || lladdr_len == 0 {
        return false;
    }
    if flags & (IFF_BROADCAST | IFF_MULTICAST) == 0 {
        return false;
    }
    !matches!(classification, Classification::Vlan { .. } | Classification::BondMaster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_checks_reject_non_ethernet_hardware_type() {
        assert!(!passes_minimal_checks(0, 6, 0x1002, &Classification::Physical));
    }

    #[test]
    fn minimal_checks_reject_zero_length_address() {
        assert!(!passes_minimal_checks(1, 0, 0x1002, &Classification::Physical));
    }

    #[test]
    fn minimal_checks_reject_interfaces_with_no_multicast_or_broadcast() {
        assert!(!passes_minimal_checks(1, 6, 0, &Classification::Physical));
    }

    #[test]
    fn minimal_checks_reject_vlan_and_bond_master() {
        assert!(!passes_minimal_checks(
            1,
            6,
            0x1002,
            &Classification::Vlan { real_device: "bond0".into() }
        ));
        assert!(!passes_minimal_checks(1, 6, 0x1002, &Classification::BondMaster));
    }

    #[test]
    fn minimal_checks_accept_a_plain_ethernet_interface() {
        assert!(passes_minimal_checks(1, 6, 0x1002, &Classification::Physical));
    }

    #[test]
    fn minimal_checks_accept_a_bond_slave() {
        assert!(passes_minimal_checks(
            1,
            6,
            0x1002,
            &Classification::BondSlave { master: "bond0".into(), active: false }
        ));
    }
}
