use std::any::Any;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use marshal::{FieldKind, FieldSchema, GraphNode, NodeRef, Registry, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortIdSubtype {
    InterfaceAlias,
    PortComponent,
    MacAddress,
    NetworkAddress,
    InterfaceName,
    AgentCircuitId,
    Local,
}

impl PortIdSubtype {
    fn to_u8(self) -> u8 {
        match self {
            PortIdSubtype::InterfaceAlias => 1,
            PortIdSubtype::PortComponent => 2,
            PortIdSubtype::MacAddress => 3,
            PortIdSubtype::NetworkAddress => 4,
            PortIdSubtype::InterfaceName => 5,
            PortIdSubtype::AgentCircuitId => 6,
            PortIdSubtype::Local => 7,
        }
    }

    fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            1 => PortIdSubtype::InterfaceAlias,
            2 => PortIdSubtype::PortComponent,
            3 => PortIdSubtype::MacAddress,
            4 => PortIdSubtype::NetworkAddress,
            5 => PortIdSubtype::InterfaceName,
            6 => PortIdSubtype::AgentCircuitId,
            7 => PortIdSubtype::Local,
            _ => return None,
        })
    }
}

bitflags::bitflags! {
    /// IEEE 802.3 link auto-negotiation bitset, shared by the supported,
    /// advertised and enabled fields.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AutonegCaps: u16 {
        const MAU_10BASE_T          = 1 << 0;
        const MAU_10BASE_T_FD       = 1 << 1;
        const MAU_100BASE_TX        = 1 << 2;
        const MAU_100BASE_TX_FD     = 1 << 3;
        const MAU_100BASE_T4        = 1 << 4;
        const MAU_1000BASE_X        = 1 << 5;
        const MAU_1000BASE_X_FD     = 1 << 6;
        const MAU_1000BASE_T        = 1 << 7;
        const MAU_1000BASE_T_FD     = 1 << 8;
    }
}

/// A single 802.1Q VLAN tag associated with a port. VLANs carry no identity
/// that needs folding across a message, so they are flattened into the
/// owning `Port`'s body rather than walked as separate marshal nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vlan {
    pub vid: u16,
    pub name: String,
}

/// A sender/receiver endpoint described by an announcement (section 3). The
/// local port is owned by its `Hardware`; remote ports are owned by the
/// `NeighborPort` that holds them, created on receive and destroyed on
/// cleanup.
#[derive(Clone)]
pub struct Port {
    pub id_subtype: PortIdSubtype,
    pub id: Vec<u8>,
    pub description: String,
    pub aggregation_id: u32,
    pub mau_supported: AutonegCaps,
    pub mau_advertised: AutonegCaps,
    pub autoneg_enabled: bool,
    pub autoneg_supported: bool,
    pub max_frame_size: u32,
    pub vlans: Vec<Vlan>,
    pub chassis: Option<NodeRef>,
}

impl std::fmt::Debug for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Port")
            .field("id_subtype", &self.id_subtype)
            .field("id", &self.id)
            .field("description", &self.description)
            .field("aggregation_id", &self.aggregation_id)
            .field("mau_supported", &self.mau_supported)
            .field("mau_advertised", &self.mau_advertised)
            .field("autoneg_enabled", &self.autoneg_enabled)
            .field("autoneg_supported", &self.autoneg_supported)
            .field("max_frame_size", &self.max_frame_size)
            .field("vlans", &self.vlans)
            .field(
                "chassis",
                &self.chassis.as_ref().map(|_| "NodeRef { .. }"),
            )
            .finish()
    }
}

impl Port {
    pub fn new(id_subtype: PortIdSubtype, id: Vec<u8>, description: impl Into<String>) -> Self {
        Port {
            id_subtype,
            id,
            description: description.into(),
            aggregation_id: 0,
            mau_supported: AutonegCaps::empty(),
            mau_advertised: AutonegCaps::empty(),
            autoneg_enabled: false,
            autoneg_supported: false,
            max_frame_size: 1500,
            vlans: Vec::new(),
            chassis: None,
        }
    }
}

static PORT_SCHEMA: Schema = Schema {
    name: "port",
    fields: &[FieldSchema { field_index: 0, kind: FieldKind::OwningPointer, referent: "chassis" }],
};

impl GraphNode for Port {
    fn schema(&self) -> &'static Schema {
        &PORT_SCHEMA
    }

    fn encode_self(&self, buf: &mut Vec<u8>) {
        buf.push(self.id_subtype.to_u8());
        write_len_prefixed(buf, &self.id);
        write_len_prefixed(buf, self.description.as_bytes());
        buf.write_u32::<LittleEndian>(self.aggregation_id).unwrap();
        buf.write_u16::<LittleEndian>(self.mau_supported.bits()).unwrap();
        buf.write_u16::<LittleEndian>(self.mau_advertised.bits()).unwrap();
        buf.push(self.autoneg_enabled as u8);
        buf.push(self.autoneg_supported as u8);
        buf.write_u32::<LittleEndian>(self.max_frame_size).unwrap();
        buf.write_u32::<LittleEndian>(self.vlans.len() as u32).unwrap();
        for vlan in &self.vlans {
            buf.write_u16::<LittleEndian>(vlan.vid).unwrap();
            write_len_prefixed(buf, vlan.name.as_bytes());
        }
    }

    fn pointer_count(&self) -> usize {
        1
    }

    fn get_pointer(&self, index: usize) -> Option<NodeRef> {
        assert_eq!(index, 0, "port declares a single owning pointer: its chassis");
        self.chassis.clone()
    }

    fn set_pointer(&mut self, index: usize, value: Option<NodeRef>) {
        assert_eq!(index, 0, "port declares a single owning pointer: its chassis");
        self.chassis = value;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn write_len_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.write_u32::<LittleEndian>(bytes.len() as u32).unwrap();
    buf.extend_from_slice(bytes);
}

/// Constructs a `Port` from the bytes written by [`GraphNode::encode_self`],
/// with its `chassis` pointer left `None` -- the deserializer patches it in
/// via `set_pointer` once the referent has been decoded.
pub fn decode_port(body: &[u8]) -> NodeRef {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut cursor = Cursor::new(body);
    let id_subtype = PortIdSubtype::from_u8(cursor.read_u8().unwrap()).unwrap();
    let id = read_len_prefixed(&mut cursor);
    let description = String::from_utf8(read_len_prefixed(&mut cursor)).unwrap();
    let aggregation_id = cursor.read_u32::<LittleEndian>().unwrap();
    let mau_supported = AutonegCaps::from_bits_truncate(cursor.read_u16::<LittleEndian>().unwrap());
    let mau_advertised = AutonegCaps::from_bits_truncate(cursor.read_u16::<LittleEndian>().unwrap());
    let autoneg_enabled = cursor.read_u8().unwrap() != 0;
    let autoneg_supported = cursor.read_u8().unwrap() != 0;
    let max_frame_size = cursor.read_u32::<LittleEndian>().unwrap();
    let vlan_count = cursor.read_u32::<LittleEndian>().unwrap();
    let mut vlans = Vec::with_capacity(vlan_count as usize);
    for _ in 0..vlan_count {
        let vid = cursor.read_u16::<LittleEndian>().unwrap();
        let name = String::from_utf8(read_len_prefixed(&mut cursor)).unwrap();
        vlans.push(Vlan { vid, name });
    }

    Rc::new(RefCell::new(Port {
        id_subtype,
        id,
        description,
        aggregation_id,
        mau_supported,
        mau_advertised,
        autoneg_enabled,
        autoneg_supported,
        max_frame_size,
        vlans,
        chassis: None,
    }))
}

fn read_len_prefixed(cursor: &mut Cursor<&[u8]>) -> Vec<u8> {
    let len = cursor.read_u32::<LittleEndian>().unwrap() as usize;
    let mut bytes = vec![0u8; len];
    std::io::Read::read_exact(cursor, &mut bytes).unwrap();
    bytes
}

/// Registers the node types this crate contributes with a fresh registry.
/// Call once per process before using `marshal::deserialize`.
pub fn register(registry: &mut Registry) {
    registry.register("port", decode_port);
    registry.register("chassis", |body| {
        use std::cell::RefCell;
        use std::rc::Rc;
        Rc::new(RefCell::new(crate::chassis::decode_chassis(body)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chassis::Chassis;
    use marshal::{deserialize, serialize};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn two_ports_sharing_a_chassis_fold_to_one_allocation() {
        let chassis: NodeRef = Rc::new(RefCell::new(Chassis::new_local("sw1", "switch")));

        let mut port_a = Port::new(PortIdSubtype::InterfaceName, b"eth0".to_vec(), "eth0");
        port_a.chassis = Some(chassis.clone());
        let mut port_b = Port::new(PortIdSubtype::InterfaceName, b"eth1".to_vec(), "eth1");
        port_b.chassis = Some(chassis);

        static PAIR_SCHEMA: Schema = Schema {
            name: "port_pair",
            fields: &[
                FieldSchema { field_index: 0, kind: FieldKind::OwningPointer, referent: "port" },
                FieldSchema { field_index: 1, kind: FieldKind::OwningPointer, referent: "port" },
            ],
        };
        struct Pair {
            a: Option<NodeRef>,
            b: Option<NodeRef>,
        }
        impl GraphNode for Pair {
            fn schema(&self) -> &'static Schema {
                &PAIR_SCHEMA
            }
            fn encode_self(&self, _buf: &mut Vec<u8>) {}
            fn pointer_count(&self) -> usize {
                2
            }
            fn get_pointer(&self, index: usize) -> Option<NodeRef> {
                match index {
                    0 => self.a.clone(),
                    1 => self.b.clone(),
                    _ => unreachable!(),
                }
            }
            fn set_pointer(&mut self, index: usize, value: Option<NodeRef>) {
                match index {
                    0 => self.a = value,
                    1 => self.b = value,
                    _ => unreachable!(),
                }
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }

        let pair: NodeRef = Rc::new(RefCell::new(Pair {
            a: Some(Rc::new(RefCell::new(port_a))),
            b: Some(Rc::new(RefCell::new(port_b))),
        }));

        let mut registry = Registry::new();
        register(&mut registry);
        registry.register("port_pair", |_| {
            Rc::new(RefCell::new(Pair { a: None, b: None }))
        });

        let bytes = serialize(&Some(pair));
        let decoded = deserialize(&registry, &bytes).unwrap().unwrap();

        let a = decoded.borrow().get_pointer(0).unwrap();
        let b = decoded.borrow().get_pointer(1).unwrap();
        let chassis_a = a.borrow().get_pointer(0).unwrap();
        let chassis_b = b.borrow().get_pointer(0).unwrap();
        assert!(Rc::ptr_eq(&chassis_a, &chassis_b), "shared chassis must fold to one allocation");
    }

    #[test]
    fn vlans_round_trip_in_declaration_order() {
        let mut port = Port::new(PortIdSubtype::InterfaceName, b"eth0".to_vec(), "eth0");
        port.vlans.push(Vlan { vid: 10, name: "vlan10".into() });
        port.vlans.push(Vlan { vid: 20, name: "vlan20".into() });

        let mut buf = Vec::new();
        port.encode_self(&mut buf);
        let decoded = decode_port(&buf);
        let decoded = decoded.borrow();
        let decoded = decoded.as_any().downcast_ref::<Port>().unwrap();
        assert_eq!(decoded.vlans, port.vlans);
    }
}
