use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use marshal::{deserialize, serialize, NodeRef, Registry};

use crate::error::{CtlError, CtlResult};
use crate::message::MessageType;

/// A request the client can issue (section 6). `SetPort`'s `location` and
/// `power_policy` are the "set port-specific parameters" fields the design
/// calls out; both are optional so a client can update just one.
#[derive(Debug, Clone)]
pub enum Request {
    GetInterfaces,
    GetInterface { ifname: String },
    GetPort { ifname: String },
    GetChassis { ifname: String },
    GetVlans { ifname: String },
    SetPort { ifname: String, location: Option<String>, power_policy: Option<String> },
}

impl Request {
    pub fn encode(&self) -> (MessageType, Vec<u8>) {
        match self {
            Request::GetInterfaces => (MessageType::GetInterfaces, Vec::new()),
            Request::GetInterface { ifname } => {
                (MessageType::GetInterface, ifname.as_bytes().to_vec())
            }
            Request::GetPort { ifname } => (MessageType::GetPort, ifname.as_bytes().to_vec()),
            Request::GetChassis { ifname } => {
                (MessageType::GetChassis, ifname.as_bytes().to_vec())
            }
            Request::GetVlans { ifname } => (MessageType::GetVlans, ifname.as_bytes().to_vec()),
            Request::SetPort { ifname, location, power_policy } => {
                let mut buf = Vec::new();
                write_str(&mut buf, ifname);
                write_optional_str(&mut buf, location.as_deref());
                write_optional_str(&mut buf, power_policy.as_deref());
                (MessageType::SetPort, buf)
            }
        }
    }

    pub fn decode(msg_type: MessageType, payload: &[u8]) -> CtlResult<Request> {
        Ok(match msg_type {
            MessageType::GetInterfaces => Request::GetInterfaces,
            MessageType::GetInterface => Request::GetInterface { ifname: decode_str(payload)? },
            MessageType::GetPort => Request::GetPort { ifname: decode_str(payload)? },
            MessageType::GetChassis => Request::GetChassis { ifname: decode_str(payload)? },
            MessageType::GetVlans => Request::GetVlans { ifname: decode_str(payload)? },
            MessageType::SetPort => {
                let mut cursor = Cursor::new(payload);
                let ifname = read_str(&mut cursor)?;
                let location = read_optional_str(&mut cursor)?;
                let power_policy = read_optional_str(&mut cursor)?;
                Request::SetPort { ifname, location, power_policy }
            }
            MessageType::None => return Err(CtlError::Malformed("NONE is not a request".into())),
        })
    }
}

/// A reply to a [`Request`] (section 6). `None` is the "requested entity
/// does not exist" reply: type `NONE`, empty payload.
#[derive(Clone)]
pub enum Response {
    None,
    Interfaces(Vec<String>),
    Node(NodeRef),
    Vlans(Vec<model::Vlan>),
    Ack,
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Response::None => f.write_str("None"),
            Response::Interfaces(names) => f.debug_tuple("Interfaces").field(names).finish(),
            Response::Node(_) => f.write_str("Node(NodeRef { .. })"),
            Response::Vlans(vlans) => f.debug_tuple("Vlans").field(vlans).finish(),
            Response::Ack => f.write_str("Ack"),
        }
    }
}

impl Response {
    pub fn encode(&self) -> (MessageType, Vec<u8>) {
        match self {
            Response::None => (MessageType::None, Vec::new()),
            Response::Interfaces(names) => {
                let mut buf = Vec::new();
                buf.write_u32::<LittleEndian>(names.len() as u32).unwrap();
                for name in names {
                    write_str(&mut buf, name);
                }
                (MessageType::GetInterfaces, buf)
            }
            Response::Node(node) => {
                (MessageType::GetPort, serialize(&Some(node.clone())))
            }
            Response::Vlans(vlans) => {
                let mut buf = Vec::new();
                buf.write_u32::<LittleEndian>(vlans.len() as u32).unwrap();
                for vlan in vlans {
                    buf.write_u16::<LittleEndian>(vlan.vid).unwrap();
                    write_str(&mut buf, &vlan.name);
                }
                (MessageType::GetVlans, buf)
            }
            Response::Ack => (MessageType::SetPort, Vec::new()),
        }
    }

    /// Decodes a reply. `registry` resolves the schema names inside a
    /// [`Response::Node`] payload back into live `Chassis`/`Port` graphs.
    pub fn decode(msg_type: MessageType, payload: &[u8], registry: &Registry) -> CtlResult<Response> {
        Ok(match msg_type {
            MessageType::None => Response::None,
            MessageType::GetInterfaces => {
                let mut cursor = Cursor::new(payload);
                let count = cursor.read_u32::<LittleEndian>().map_err(|_| CtlError::Truncated)?;
                let mut names = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    names.push(read_str(&mut cursor)?);
                }
                Response::Interfaces(names)
            }
            MessageType::GetPort | MessageType::GetChassis => {
                let node = deserialize(registry, payload)?
                    .ok_or_else(|| CtlError::Malformed("expected a node, got null".into()))?;
                Response::Node(node)
            }
            MessageType::GetVlans => {
                let mut cursor = Cursor::new(payload);
                let count = cursor.read_u32::<LittleEndian>().map_err(|_| CtlError::Truncated)?;
                let mut vlans = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let vid = cursor.read_u16::<LittleEndian>().map_err(|_| CtlError::Truncated)?;
                    let name = read_str(&mut cursor)?;
                    vlans.push(model::Vlan { vid, name });
                }
                Response::Vlans(vlans)
            }
            MessageType::SetPort => Response::Ack,
            MessageType::GetInterface => {
                return Err(CtlError::Malformed("GET_INTERFACE is not a reply type".into()))
            }
        })
    }
}

/// Builds a fresh registry knowing how to decode every node type this
/// protocol's responses carry. Call once per process.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    model::port::register(&mut registry);
    registry
}

fn write_str(buf: &mut Vec<u8>, s: &str) {
    buf.write_u32::<LittleEndian>(s.len() as u32).unwrap();
    buf.extend_from_slice(s.as_bytes());
}

fn write_optional_str(buf: &mut Vec<u8>, s: Option<&str>) {
    match s {
        Some(s) => {
            buf.push(1);
            write_str(buf, s);
        }
        None => buf.push(0),
    }
}

fn decode_str(payload: &[u8]) -> CtlResult<String> {
    String::from_utf8(payload.to_vec()).map_err(|_| CtlError::Malformed("invalid utf-8".into()))
}

fn read_str(cursor: &mut Cursor<&[u8]>) -> CtlResult<String> {
    let len = cursor.read_u32::<LittleEndian>().map_err(|_| CtlError::Truncated)? as usize;
    let mut bytes = vec![0u8; len];
    std::io::Read::read_exact(cursor, &mut bytes).map_err(|_| CtlError::Truncated)?;
    String::from_utf8(bytes).map_err(|_| CtlError::Malformed("invalid utf-8".into()))
}

fn read_optional_str(cursor: &mut Cursor<&[u8]>) -> CtlResult<Option<String>> {
    let tag = cursor.read_u8().map_err(|_| CtlError::Truncated)?;
    match tag {
        0 => Ok(None),
        1 => Ok(Some(read_str(cursor)?)),
        _ => Err(CtlError::Malformed("bad optional-string tag".into())),
    }
}
