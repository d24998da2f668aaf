use std::collections::HashSet;

use wire::shared::{WireError, WireResult};

/// Kind of a declared sub-entry in a [`Schema`].
///
/// An owning pointer denotes a separately allocated referent reached through
/// a pointer field; an inline substruct is embedded directly in the parent
/// and is descended into without emitting a separate frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    OwningPointer,
    InlineSubstruct,
}

/// One declared sub-entry of a [`Schema`]. `field_index` plays the role the
/// C original gives to a byte offset: it identifies which pointer slot on
/// the node this entry corresponds to, in schema declaration order. Rust's
/// ownership model rules out reinterpreting an arbitrary byte offset as a
/// pointer, so the node itself (see [`crate::node::GraphNode`]) exposes its
/// owning pointers by that same index.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub field_index: usize,
    pub kind: FieldKind,
    pub referent: &'static str,
}

/// Static schema for one marshalled struct type: its name (used on the wire
/// to pick a decoder) and the ordered list of pointer-bearing sub-entries.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldSchema],
}

/// Rejects a set of schemas that declare a cycle reachable purely through
/// `InlineSubstruct` entries. Such a cycle would mean a struct embeds
/// itself by value, which has no finite layout; owning-pointer cycles are
/// fine since they are resolved at runtime through reference identity, not
/// through recursive inlining.
pub fn check_no_inline_cycles(schemas: &[&'static Schema]) -> WireResult<()> {
    let by_name: std::collections::HashMap<&str, &Schema> =
        schemas.iter().map(|s| (s.name, *s)).collect();

    for schema in schemas {
        let mut stack = HashSet::new();
        walk(schema, &by_name, &mut stack)?;
    }
    Ok(())
}

fn walk<'a>(
    schema: &'a Schema,
    by_name: &std::collections::HashMap<&str, &'a Schema>,
    stack: &mut HashSet<&'a str>,
) -> WireResult<()> {
    if !stack.insert(schema.name) {
        return Err(WireError::CyclicSubstruct(schema.name.to_string()));
    }
    for field in schema.fields {
        if field.kind == FieldKind::InlineSubstruct {
            if let Some(referent) = by_name.get(field.referent) {
                walk(referent, by_name, stack)?;
            }
        }
    }
    stack.remove(schema.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_acyclic_inline_chain() {
        static LEAF: Schema = Schema { name: "leaf", fields: &[] };
        static ROOT: Schema = Schema {
            name: "root",
            fields: &[FieldSchema { field_index: 0, kind: FieldKind::InlineSubstruct, referent: "leaf" }],
        };
        assert!(check_no_inline_cycles(&[&ROOT, &LEAF]).is_ok());
    }

    #[test]
    fn rejects_inline_self_cycle() {
        static SELFISH: Schema = Schema {
            name: "selfish",
            fields: &[FieldSchema { field_index: 0, kind: FieldKind::InlineSubstruct, referent: "selfish" }],
        };
        let err = check_no_inline_cycles(&[&SELFISH]).unwrap_err();
        assert!(matches!(err, WireError::CyclicSubstruct(name) if name == "selfish"));
    }

    #[test]
    fn owning_pointer_cycles_are_not_rejected() {
        static A: Schema = Schema {
            name: "a",
            fields: &[FieldSchema { field_index: 0, kind: FieldKind::OwningPointer, referent: "b" }],
        };
        static B: Schema = Schema {
            name: "b",
            fields: &[FieldSchema { field_index: 0, kind: FieldKind::OwningPointer, referent: "a" }],
        };
        assert!(check_no_inline_cycles(&[&A, &B]).is_ok());
    }
}
