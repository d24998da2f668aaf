//! Schema-directed marshalling for the control socket. Rather than the
//! offset-based pointer rewriting the original daemon uses internally, this
//! crate walks a graph of [`node::GraphNode`] values through an identity map
//! so that shared sub-objects and cycles survive a round trip through the
//! wire format intact.

pub mod engine;
pub mod node;
pub mod schema;

pub use engine::{deserialize, serialize};
pub use node::{identity, GraphNode, NodeRef, Registry};
pub use schema::{check_no_inline_cycles, FieldKind, FieldSchema, Schema};
