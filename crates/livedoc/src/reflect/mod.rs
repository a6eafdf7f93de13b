// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reflection schema emitter.
//!
//! Every type serializes to a JSON object whose first key is `"nature"`,
//! followed by `"annotations"` when the node carries any, followed by the
//! variant's own fields. Key order is part of the format (external tooling
//! reads it positionally), so objects are built with `serde_json`'s
//! order-preserving map.
//!
//! | Nature | Fields |
//! |--------|--------|
//! | `reactive_value` | `type` |
//! | `reactive_record` | `name`, `fields` (root) |
//! | `reactive_ref` | `ref` (also used for records referenced from elsewhere) |
//! | `reactive_table` | `record_name` |
//! | `reactive_map` | `domain`, `range` |
//! | `reactive_list` / `reactive_maybe` / `reactive_lazy` | `type` |
//! | `reactive_holder` | `message_name` |
//! | `reactive_projection` | `table`, `field`, `domain` |
//! | `reactive_text` / `replication_status` | none |
//! | `native_message` | `name`, `fields` (root) |

use crate::check::SchemaView;
use crate::types::{StructureStorage, TypeKind, TypeNode};
use serde_json::{Map, Value};

/// How a node is being described.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectionShape {
    /// The authoritative definition.
    Root,
    /// A mention from another type.
    Reference,
}

/// Write the reflection of `node` into `out`.
pub fn write_type_reflection(
    out: &mut Map<String, Value>,
    node: &TypeNode,
    shape: ReflectionShape,
    view: &SchemaView<'_>,
) {
    if shape == ReflectionShape::Reference {
        if let TypeKind::Record(record) = &node.kind {
            out.insert("nature".into(), Value::from("reactive_ref"));
            out.insert("ref".into(), Value::from(record.name()));
            return;
        }
        if let TypeKind::Message(message) = &node.kind {
            out.insert("nature".into(), Value::from("reactive_ref"));
            out.insert("ref".into(), Value::from(message.name()));
            return;
        }
    }
    out.insert("nature".into(), Value::from(node.nature()));
    if !node.annotations.is_empty() {
        let annotations = node
            .annotations
            .iter()
            .map(|a| {
                let mut entry = Map::new();
                entry.insert("name".into(), Value::from(a.name.as_str()));
                if let Some(value) = &a.value {
                    entry.insert("value".into(), Value::from(value.as_str()));
                }
                Value::Object(entry)
            })
            .collect();
        out.insert("annotations".into(), Value::Array(annotations));
    }
    node.variant().reflect(node.id(), out, view);
}

/// Reflection of a type mentioned from another type.
pub fn reflect_type(node: &TypeNode, view: &SchemaView<'_>) -> Value {
    let mut out = Map::new();
    write_type_reflection(&mut out, node, ReflectionShape::Reference, view);
    Value::Object(out)
}

/// Reflection of a type as its own definition.
pub fn reflect_root(node: &TypeNode, view: &SchemaView<'_>) -> Value {
    let mut out = Map::new();
    write_type_reflection(&mut out, node, ReflectionShape::Root, view);
    Value::Object(out)
}

/// `{ field: { "type": ..., "privacy": ... } }` in declaration order.
pub fn reflect_structure_fields(
    storage: &StructureStorage,
    view: &SchemaView<'_>,
) -> Map<String, Value> {
    let mut fields = Map::new();
    for field in &storage.fields {
        let mut entry = Map::new();
        entry.insert("type".into(), reflect_type(&field.node, view));
        entry.insert(
            "privacy".into(),
            Value::from(field.effective_policy().to_string()),
        );
        fields.insert(field.name.clone(), Value::Object(entry));
    }
    fields
}

/// Whole-space schema: `{"types": {...}, "root": {...}}`.
pub fn reflect_space(view: &SchemaView<'_>) -> Value {
    let mut types = Map::new();
    for (name, node) in view.table().iter() {
        types.insert(name.to_string(), reflect_root(node, view));
    }
    let root = view.root();
    let mut shape = Map::new();
    shape.insert("nature".into(), Value::from("reactive_record"));
    shape.insert("name".into(), Value::from(root.name.as_str()));
    shape.insert(
        "fields".into(),
        Value::Object(reflect_structure_fields(root, view)),
    );

    let mut out = Map::new();
    out.insert("types".into(), Value::Object(types));
    out.insert("root".into(), Value::Object(shape));
    Value::Object(out)
}
