// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural equality and per-field ordering.

use super::fields::{concrete, is_stored};
use super::writer::CodeWriter;
use crate::check::SchemaView;
use crate::types::{StructureStorage, TypeBehavior};

pub(crate) fn emit_compare(w: &mut CodeWriter, storage: &StructureStorage, view: &SchemaView<'_>) {
    let terms: Vec<String> = storage
        .fields
        .iter()
        .filter(|f| is_stored(f, view))
        .map(|f| match concrete(&f.node, view).behavior() {
            TypeBehavior::ReadWriteWithSetGet => {
                format!("self.{0}.get() == __other.{0}.get()", f.name)
            }
            _ => format!("self.{0}.__structurally_equals(&__other.{0})", f.name),
        })
        .collect();
    w.open("pub fn __structurally_equals(&self, __other: &Self) -> bool");
    if terms.is_empty() {
        w.line("true");
    } else {
        w.line(terms.join("\n        && "));
    }
    w.close();
    w.blank();

    w.open("pub fn __comparator(__field: &str) -> Option<fn(&Self, &Self) -> std::cmp::Ordering>");
    w.open("match __field");
    for field in &storage.fields {
        let Some(orderable) = concrete(&field.node, view).as_orderable() else {
            continue;
        };
        let expression = orderable.compare_expression(
            &format!("__a.{}.get()", field.name),
            &format!("__b.{}.get()", field.name),
        );
        w.line(format!(
            "\"{}\" => Some(|__a: &Self, __b: &Self| {}),",
            field.name, expression
        ));
    }
    w.line("_ => None,");
    w.close();
    w.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Checker;
    use crate::types::TypeNode;

    #[test]
    fn test_comparator_covers_orderable_fields() {
        let root = StructureStorage::root()
            .field("name", TypeNode::string())
            .field("score", TypeNode::double())
            .field("flag", TypeNode::boolean())
            .field("tags", TypeNode::list(TypeNode::string()));
        let checked = Checker::new(root).check();
        let view = checked.view();
        let mut w = CodeWriter::new();
        emit_compare(&mut w, view.root(), &view);
        let out = w.finish();
        assert!(out.contains("\"name\" => Some(|__a: &Self, __b: &Self| __a.name.get().cmp(&__b.name.get())),"));
        assert!(out.contains("__a.score.get().total_cmp(&__b.score.get())"));
        assert!(!out.contains("\"flag\""));
        assert!(out.contains("self.tags.__structurally_equals(&__other.tags)"));
        assert!(out.contains("self.flag.get() == __other.flag.get()"));
    }
}
