/// The fixed, closed command menu the monitor exposes (section 4.2).
/// Numbered contiguously from 1, matching `priv-linux.c`'s `PRIV_*` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Open = 1,
    Ethtool = 2,
    IfaceInit = 3,
    IfaceMulticast = 4,
}

impl Command {
    pub fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            1 => Command::Open,
            2 => Command::Ethtool,
            3 => Command::IfaceInit,
            4 => Command::IfaceMulticast,
            _ => return None,
        })
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}
