use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wire::shared::{WireError, WireResult};

use crate::schema::Schema;

/// A node participating in the marshalled pointer graph. Types reached only
/// through `Vec`/inline encoding (VLAN descriptors, counters, ...) don't
/// need to implement this -- it exists for the identity-sensitive part of
/// the graph: values that may be shared by more than one holder (the local
/// chassis referenced by several ports) or that form cycles.
pub trait GraphNode: Any {
    /// Static schema describing this node's owning-pointer fields.
    fn schema(&self) -> &'static Schema;

    /// Encode everything about this node except its owning pointers: fixed
    /// fields and any inline substructs, flattened in declaration order.
    fn encode_self(&self, buf: &mut Vec<u8>);

    /// Number of owning-pointer fields, i.e. the valid range for
    /// `get_pointer`/`set_pointer`.
    fn pointer_count(&self) -> usize;

    /// Current value of owning-pointer field `index`.
    fn get_pointer(&self, index: usize) -> Option<NodeRef>;

    /// Patch owning-pointer field `index` during deserialization.
    fn set_pointer(&mut self, index: usize, value: Option<NodeRef>);

    fn as_any(&self) -> &dyn Any;
}

pub type NodeRef = Rc<RefCell<dyn GraphNode>>;

/// Identity of a node for the purposes of the serializer's seen-map: the
/// address of the `RefCell` backing the `Rc`. Two `NodeRef`s produced by
/// `Rc::clone` of the same allocation compare equal here even though they
/// are distinct smart-pointer values.
pub fn identity(node: &NodeRef) -> usize {
    Rc::as_ptr(node) as *const () as usize
}

/// Maps a schema name to a constructor that decodes a freshly read body into
/// a node with its scalar fields populated and its owning pointers left
/// null, ready to be patched by the deserializer as it walks the rest of
/// the frame.
pub struct Registry {
    decoders: HashMap<&'static str, fn(&[u8]) -> NodeRef>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { decoders: HashMap::new() }
    }

    pub fn register(&mut self, name: &'static str, decode: fn(&[u8]) -> NodeRef) {
        self.decoders.insert(name, decode);
    }

    pub fn decode_body(&self, name: &str, body: &[u8]) -> WireResult<NodeRef> {
        match self.decoders.get(name) {
            Some(decode) => Ok(decode(body)),
            None => Err(WireError::UnknownSchema(name.to_string())),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
