use std::collections::HashMap;
use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use wire::shared::{WireError, WireResult};

use crate::node::{identity, GraphNode, NodeRef, Registry};

const TAG_NULL: u8 = 0;
const TAG_BACKREF: u8 = 1;
const TAG_BODY: u8 = 2;

/// Serializes the pointer graph rooted at `root` into a self-contained
/// buffer. Shared sub-objects (same `Rc` allocation reached through more
/// than one field) are emitted once and referenced by index thereafter;
/// cycles terminate naturally because a node's identity is recorded before
/// its owning pointers are visited.
pub fn serialize(root: &Option<NodeRef>) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut seen: HashMap<usize, u32> = HashMap::new();
    let mut next_index = 0u32;
    write_pointer(&mut buf, root, &mut seen, &mut next_index);
    buf
}

fn write_pointer(
    buf: &mut Vec<u8>,
    ptr: &Option<NodeRef>,
    seen: &mut HashMap<usize, u32>,
    next_index: &mut u32,
) {
    let node = match ptr {
        None => {
            buf.push(TAG_NULL);
            return;
        }
        Some(node) => node,
    };

    let id = identity(node);
    if let Some(&idx) = seen.get(&id) {
        buf.push(TAG_BACKREF);
        buf.write_u32::<LittleEndian>(idx).unwrap();
        return;
    }

    let idx = *next_index;
    *next_index += 1;
    seen.insert(id, idx);

    buf.push(TAG_BODY);
    buf.write_u32::<LittleEndian>(idx).unwrap();

    let (name, body, children) = {
        let borrowed = node.borrow();
        let name = borrowed.schema().name;
        let mut body = Vec::new();
        borrowed.encode_self(&mut body);
        let children: Vec<Option<NodeRef>> =
            (0..borrowed.pointer_count()).map(|i| borrowed.get_pointer(i)).collect();
        (name, body, children)
    };

    write_len_prefixed_bytes(buf, name.as_bytes());
    write_len_prefixed_bytes(buf, &body);
    buf.write_u32::<LittleEndian>(children.len() as u32).unwrap();

    for child in &children {
        write_pointer(buf, child, seen, next_index);
    }
}

fn write_len_prefixed_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.write_u32::<LittleEndian>(bytes.len() as u32).unwrap();
    buf.extend_from_slice(bytes);
}

/// Deserializes a buffer produced by [`serialize`] back into an isomorphic
/// graph. Each first-seen index allocates a fresh node via the registry
/// before recursing into its owning pointers, so a back-reference to an
/// index that is still being populated (a self- or mutually-referential
/// cycle) resolves to the same allocation rather than recursing forever.
pub fn deserialize(registry: &Registry, buf: &[u8]) -> WireResult<Option<NodeRef>> {
    let mut cursor = Cursor::new(buf);
    let mut nodes: Vec<NodeRef> = Vec::new();
    read_pointer(&mut cursor, registry, &mut nodes)
}

fn read_pointer(
    cursor: &mut Cursor<&[u8]>,
    registry: &Registry,
    nodes: &mut Vec<NodeRef>,
) -> WireResult<Option<NodeRef>> {
    let tag = read_u8(cursor)?;
    match tag {
        TAG_NULL => Ok(None),
        TAG_BACKREF => {
            let idx = read_u32(cursor)? as usize;
            nodes.get(idx).cloned().map(Some).ok_or(WireError::Truncated)
        }
        TAG_BODY => {
            let idx = read_u32(cursor)? as usize;
            let name = String::from_utf8(read_len_prefixed_bytes(cursor)?)
                .map_err(|_| WireError::Truncated)?;
            let body = read_len_prefixed_bytes(cursor)?;
            let node = registry.decode_body(&name, &body)?;

            if idx != nodes.len() {
                return Err(WireError::Truncated);
            }
            nodes.push(node.clone());

            let pointer_count = read_u32(cursor)? as usize;
            for i in 0..pointer_count {
                let child = read_pointer(cursor, registry, nodes)?;
                node.borrow_mut().set_pointer(i, child);
            }
            Ok(Some(node))
        }
        _ => Err(WireError::Truncated),
    }
}

fn read_u8(cursor: &mut Cursor<&[u8]>) -> WireResult<u8> {
    cursor.read_u8().map_err(|_| WireError::Truncated)
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> WireResult<u32> {
    cursor.read_u32::<LittleEndian>().map_err(|_| WireError::Truncated)
}

fn read_len_prefixed_bytes(cursor: &mut Cursor<&[u8]>) -> WireResult<Vec<u8>> {
    let len = read_u32(cursor)? as usize;
    let mut bytes = vec![0u8; len];
    cursor.read_exact(&mut bytes).map_err(|_| WireError::Truncated)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, FieldSchema, Schema};
    use std::any::Any;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// A one-field intrusive node, used to exercise cycle preservation the
    /// way an intrusive list of length 1 does: `next` can point back at
    /// `self`.
    struct ListNode {
        value: i32,
        next: Option<NodeRef>,
    }

    static LIST_NODE_SCHEMA: Schema = Schema {
        name: "list_node",
        fields: &[FieldSchema { field_index: 0, kind: FieldKind::OwningPointer, referent: "list_node" }],
    };

    impl GraphNode for ListNode {
        fn schema(&self) -> &'static Schema {
            &LIST_NODE_SCHEMA
        }

        fn encode_self(&self, buf: &mut Vec<u8>) {
            buf.write_i32::<LittleEndian>(self.value).unwrap();
        }

        fn pointer_count(&self) -> usize {
            1
        }

        fn get_pointer(&self, index: usize) -> Option<NodeRef> {
            assert_eq!(index, 0);
            self.next.clone()
        }

        fn set_pointer(&mut self, index: usize, value: Option<NodeRef>) {
            assert_eq!(index, 0);
            self.next = value;
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn decode_list_node(body: &[u8]) -> NodeRef {
        let mut cursor = Cursor::new(body);
        let value = cursor.read_i32::<LittleEndian>().unwrap();
        Rc::new(RefCell::new(ListNode { value, next: None }))
    }

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register("list_node", decode_list_node);
        reg
    }

    fn node_value(node: &NodeRef) -> i32 {
        node.borrow().as_any().downcast_ref::<ListNode>().unwrap().value
    }

    #[test]
    fn round_trips_a_plain_chain() {
        let tail: NodeRef = Rc::new(RefCell::new(ListNode { value: 2, next: None }));
        let head: NodeRef = Rc::new(RefCell::new(ListNode { value: 1, next: Some(tail) }));

        let bytes = serialize(&Some(head));
        let decoded = deserialize(&registry(), &bytes).unwrap().unwrap();

        assert_eq!(node_value(&decoded), 1);
        let next = decoded.borrow().get_pointer(0).unwrap();
        assert_eq!(node_value(&next), 2);
        assert!(next.borrow().get_pointer(0).is_none());
    }

    #[test]
    fn preserves_shared_identity() {
        let shared: NodeRef = Rc::new(RefCell::new(ListNode { value: 42, next: None }));
        let head: NodeRef = Rc::new(RefCell::new(ListNode { value: 1, next: Some(shared.clone()) }));
        // A second field pointing at the very same allocation would need a
        // two-pointer node; reuse head->next itself from two call sites
        // instead by serializing a small vector of roots sharing `shared`.
        let other_head: NodeRef = Rc::new(RefCell::new(ListNode { value: 2, next: Some(shared) }));

        let a = deserialize(&registry(), &serialize(&Some(head))).unwrap().unwrap();
        let b = deserialize(&registry(), &serialize(&Some(other_head))).unwrap().unwrap();

        // Two independent serialize/deserialize calls naturally produce
        // independent allocations; identity folding is meaningful within a
        // single message. Exercise that directly via a two-pointer root.
        struct Pair {
            left: Option<NodeRef>,
            right: Option<NodeRef>,
        }
        static PAIR_SCHEMA: Schema = Schema {
            name: "pair",
            fields: &[
                FieldSchema { field_index: 0, kind: FieldKind::OwningPointer, referent: "list_node" },
                FieldSchema { field_index: 1, kind: FieldKind::OwningPointer, referent: "list_node" },
            ],
        };
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
                    0 => self.left.clone(),
                    1 => self.right.clone(),
                    _ => unreachable!(),
                }
            }
            fn set_pointer(&mut self, index: usize, value: Option<NodeRef>) {
                match index {
                    0 => self.left = value,
                    1 => self.right = value,
                    _ => unreachable!(),
                }
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }
        fn decode_pair(_body: &[u8]) -> NodeRef {
            Rc::new(RefCell::new(Pair { left: None, right: None }))
        }

        let shared: NodeRef = Rc::new(RefCell::new(ListNode { value: 7, next: None }));
        let pair: NodeRef =
            Rc::new(RefCell::new(Pair { left: Some(shared.clone()), right: Some(shared) }));

        let mut reg = registry();
        reg.register("pair", decode_pair);

        let bytes = serialize(&Some(pair));
        let decoded = deserialize(&reg, &bytes).unwrap().unwrap();
        let left = decoded.borrow().get_pointer(0).unwrap();
        let right = decoded.borrow().get_pointer(1).unwrap();
        assert!(Rc::ptr_eq(&left, &right), "shared sub-object must fold to one allocation");

        // silence unused warnings from the scaffolding above
        let _ = (a, b);
    }

    #[test]
    fn preserves_a_self_cycle() {
        let head: NodeRef = Rc::new(RefCell::new(ListNode { value: 9, next: None }));
        head.borrow_mut().set_pointer(0, Some(head.clone()));

        let bytes = serialize(&Some(head));
        let decoded = deserialize(&registry(), &bytes).unwrap().unwrap();

        let next = decoded.borrow().get_pointer(0).unwrap();
        assert!(Rc::ptr_eq(&decoded, &next), "self-cycle must round-trip to the same allocation");
    }

    #[test]
    fn null_pointer_round_trips() {
        let bytes = serialize(&None);
        let decoded = deserialize(&registry(), &bytes).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn truncated_input_is_rejected() {
        let tail: NodeRef = Rc::new(RefCell::new(ListNode { value: 2, next: None }));
        let head: NodeRef = Rc::new(RefCell::new(ListNode { value: 1, next: Some(tail) }));
        let mut bytes = serialize(&Some(head));
        bytes.truncate(bytes.len() - 2);

        let result = deserialize(&registry(), &bytes);
        assert!(matches!(result, Err(WireError::Truncated)));
    }

    #[test]
    fn unknown_schema_name_is_rejected() {
        let node: NodeRef = Rc::new(RefCell::new(ListNode { value: 1, next: None }));
        let bytes = serialize(&Some(node));
        let result = deserialize(&Registry::new(), &bytes);
        assert!(matches!(result, Err(WireError::UnknownSchema(name)) if name == "list_node"));
    }
}
