/// Mirrors the kernel's `struct ethtool_cmd` layout closely enough for the
/// `ETHTOOL_GSET` ioctl (ethtool.h). Only the fields this design consumes
/// (supported/advertising bitsets, speed, duplex) are interpreted by
/// `lib/ifaces`; the rest round-trips opaquely.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct EthtoolCmd {
    pub cmd: u32,
    pub supported: u32,
    pub advertising: u32,
    pub speed: u16,
    pub duplex: u8,
    pub port: u8,
    pub phy_address: u8,
    pub transceiver: u8,
    pub autoneg: u8,
    pub mdio_support: u8,
    pub maxtxpkt: u32,
    pub maxrxpkt: u32,
    pub speed_hi: u16,
    pub eth_tp_mdix: u8,
    pub eth_tp_mdix_ctrl: u8,
    pub lp_advertising: u32,
    pub reserved: [u32; 2],
}

pub const ETHTOOL_GSET: u32 = 0x0000_0001;
pub const SIOCETHTOOL: u64 = 0x8946;

impl EthtoolCmd {
    pub fn request() -> Self {
        EthtoolCmd { cmd: ETHTOOL_GSET, ..Default::default() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe {
            std::slice::from_raw_parts(
                (self as *const Self) as *const u8,
                std::mem::size_of::<Self>(),
            )
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert_eq!(bytes.len(), std::mem::size_of::<Self>());
        let mut cmd = EthtoolCmd::default();
        unsafe {
            std::ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                (&mut cmd as *mut Self) as *mut u8,
                bytes.len(),
            );
        }
        cmd
    }
}
