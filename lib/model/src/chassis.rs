use std::any::Any;
use std::net::Ipv4Addr;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use marshal::{GraphNode, NodeRef, Schema};
use std::io::Cursor;

bitflags::bitflags! {
    /// Capability bits, both the "available" and "enabled" bitsets use this
    /// type. Values match the IEEE 802.1AB system capabilities encoding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Capabilities: u16 {
        const OTHER     = 0b0000_0001;
        const REPEATER  = 0b0000_0010;
        const BRIDGE    = 0b0000_0100;
        const WLAN      = 0b0000_1000;
        const ROUTER    = 0b0001_0000;
        const TELEPHONE = 0b0010_0000;
        const DOCSIS    = 0b0100_0000;
        const STATION   = 0b1000_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChassisIdSubtype {
    InterfaceAlias,
    InterfaceName,
    Local,
    LinkLayerAddress,
    NetworkAddress,
    Port,
    ChassisComponent,
}

impl ChassisIdSubtype {
    fn to_u8(self) -> u8 {
        match self {
            ChassisIdSubtype::ChassisComponent => 1,
            ChassisIdSubtype::InterfaceAlias => 2,
            ChassisIdSubtype::Port => 3,
            ChassisIdSubtype::LinkLayerAddress => 4,
            ChassisIdSubtype::NetworkAddress => 5,
            ChassisIdSubtype::InterfaceName => 6,
            ChassisIdSubtype::Local => 7,
        }
    }

    fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            1 => ChassisIdSubtype::ChassisComponent,
            2 => ChassisIdSubtype::InterfaceAlias,
            3 => ChassisIdSubtype::Port,
            4 => ChassisIdSubtype::LinkLayerAddress,
            5 => ChassisIdSubtype::NetworkAddress,
            6 => ChassisIdSubtype::InterfaceName,
            7 => ChassisIdSubtype::Local,
            _ => return None,
        })
    }
}

/// Identity of a local or remote station. The local chassis is a process-
/// lifetime singleton; remote chassis are created on receipt of an
/// announcement and may be shared by several [`crate::port::Port`]s on
/// different `Hardware` entries -- see the identity-folding requirement on
/// the marshalling engine.
#[derive(Debug, Clone)]
pub struct Chassis {
    pub id_subtype: ChassisIdSubtype,
    pub id: Vec<u8>,
    pub name: String,
    pub description: String,
    pub mgmt_ip: Option<Ipv4Addr>,
    pub mgmt_iface_index: u32,
    pub cap_available: Capabilities,
    pub cap_enabled: Capabilities,
}

impl Chassis {
    pub fn new_local(name: impl Into<String>, description: impl Into<String>) -> Self {
        Chassis {
            id_subtype: ChassisIdSubtype::Local,
            id: Vec::new(),
            name: name.into(),
            description: description.into(),
            mgmt_ip: None,
            mgmt_iface_index: 0,
            cap_available: Capabilities::STATION,
            cap_enabled: Capabilities::STATION,
        }
    }
}

static CHASSIS_SCHEMA: Schema = Schema { name: "chassis", fields: &[] };

const NO_MGMT_IP: u8 = 0;
const HAS_MGMT_IP: u8 = 1;

impl GraphNode for Chassis {
    fn schema(&self) -> &'static Schema {
        &CHASSIS_SCHEMA
    }

    fn encode_self(&self, buf: &mut Vec<u8>) {
        buf.push(self.id_subtype.to_u8());
        write_len_prefixed(buf, &self.id);
        write_len_prefixed(buf, self.name.as_bytes());
        write_len_prefixed(buf, self.description.as_bytes());
        match self.mgmt_ip {
            Some(ip) => {
                buf.push(HAS_MGMT_IP);
                buf.extend_from_slice(&ip.octets());
            }
            None => buf.push(NO_MGMT_IP),
        }
        buf.write_u32::<LittleEndian>(self.mgmt_iface_index).unwrap();
        buf.write_u16::<LittleEndian>(self.cap_available.bits()).unwrap();
        buf.write_u16::<LittleEndian>(self.cap_enabled.bits()).unwrap();
    }

    fn pointer_count(&self) -> usize {
        0
    }

    fn get_pointer(&self, _index: usize) -> Option<NodeRef> {
        None
    }

    fn set_pointer(&mut self, _index: usize, _value: Option<NodeRef>) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn write_len_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.write_u32::<LittleEndian>(bytes.len() as u32).unwrap();
    buf.extend_from_slice(bytes);
}

/// Constructs a `Chassis` from the bytes written by [`GraphNode::encode_self`].
/// Registered with `marshal::Registry` under the name `"chassis"`.
pub fn decode_chassis(body: &[u8]) -> Chassis {
    let mut cursor = Cursor::new(body);
    let id_subtype = ChassisIdSubtype::from_u8(cursor.read_u8().unwrap()).unwrap();
    let id = read_len_prefixed(&mut cursor);
    let name = String::from_utf8(read_len_prefixed(&mut cursor)).unwrap();
    let description = String::from_utf8(read_len_prefixed(&mut cursor)).unwrap();
    let mgmt_ip = match cursor.read_u8().unwrap() {
        HAS_MGMT_IP => {
            let mut octets = [0u8; 4];
            std::io::Read::read_exact(&mut cursor, &mut octets).unwrap();
            Some(Ipv4Addr::from(octets))
        }
        _ => None,
    };
    let mgmt_iface_index = cursor.read_u32::<LittleEndian>().unwrap();
    let cap_available = Capabilities::from_bits_truncate(cursor.read_u16::<LittleEndian>().unwrap());
    let cap_enabled = Capabilities::from_bits_truncate(cursor.read_u16::<LittleEndian>().unwrap());
    Chassis {
        id_subtype,
        id,
        name,
        description,
        mgmt_ip,
        mgmt_iface_index,
        cap_available,
        cap_enabled,
    }
}

fn read_len_prefixed(cursor: &mut Cursor<&[u8]>) -> Vec<u8> {
    let len = cursor.read_u32::<LittleEndian>().unwrap() as usize;
    let mut bytes = vec![0u8; len];
    std::io::Read::read_exact(cursor, &mut bytes).unwrap();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips_plain_fields() {
        let mut chassis = Chassis::new_local("host1", "Linux 6.1 x86_64");
        chassis.mgmt_ip = Some(Ipv4Addr::new(192, 168, 1, 10));
        chassis.cap_available = Capabilities::STATION | Capabilities::BRIDGE;

        let mut buf = Vec::new();
        chassis.encode_self(&mut buf);
        let decoded = decode_chassis(&buf);

        assert_eq!(decoded.name, "host1");
        assert_eq!(decoded.description, "Linux 6.1 x86_64");
        assert_eq!(decoded.mgmt_ip, Some(Ipv4Addr::new(192, 168, 1, 10)));
        assert_eq!(decoded.cap_available, Capabilities::STATION | Capabilities::BRIDGE);
    }

    #[test]
    fn absent_management_address_round_trips_as_none() {
        let chassis = Chassis::new_local("host2", "");
        let mut buf = Vec::new();
        chassis.encode_self(&mut buf);
        assert!(decode_chassis(&buf).mgmt_ip.is_none());
    }
}
