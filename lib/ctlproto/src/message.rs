/// Control-socket request/response discriminant (section 6): `None` is both
/// a request type's "no such entity" reply and never a valid request on its
/// own. Numbered contiguously from 0, extensible per the design note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    None = 0,
    GetInterfaces = 1,
    GetInterface = 2,
    GetPort = 3,
    GetChassis = 4,
    GetVlans = 5,
    SetPort = 6,
}

impl MessageType {
    pub fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            0 => MessageType::None,
            1 => MessageType::GetInterfaces,
            2 => MessageType::GetInterface,
            3 => MessageType::GetPort,
            4 => MessageType::GetChassis,
            5 => MessageType::GetVlans,
            6 => MessageType::SetPort,
            _ => return None,
        })
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}
