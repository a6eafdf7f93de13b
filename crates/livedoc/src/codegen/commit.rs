// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Commit and revert.
//!
//! `__commit` writes the forward patch and the reverse (undo) patch of every
//! dirty stored field under `__name`; `__revert` discards uncommitted
//! changes.

use super::fields::is_stored;
use super::writer::CodeWriter;
use crate::check::SchemaView;
use crate::types::StructureStorage;

pub(crate) fn emit_commit_revert(
    w: &mut CodeWriter,
    storage: &StructureStorage,
    view: &SchemaView<'_>,
) {
    let stored: Vec<_> = storage
        .fields
        .iter()
        .filter(|f| is_stored(f, view))
        .collect();

    w.open(concat!(
        "pub fn __commit(&mut self, __name: &str, ",
        "__forward: &mut JsonStreamWriter, __reverse: &mut JsonStreamWriter)"
    ));
    w.open("if self.__owner.is_dirty()");
    w.line("__forward.write_object_field_intro(__name);");
    w.line("__forward.begin_object();");
    w.line("__reverse.write_object_field_intro(__name);");
    w.line("__reverse.begin_object();");
    for field in &stored {
        w.line(format!(
            "self.{0}.__commit(\"{0}\", __forward, __reverse);",
            field.name
        ));
    }
    w.line("__forward.end_object();");
    w.line("__reverse.end_object();");
    w.line("self.__owner.lower_dirty();");
    w.close();
    w.close();
    w.blank();

    w.open("pub fn __revert(&mut self)");
    w.open("if self.__owner.is_dirty()");
    for field in &stored {
        w.line(format!("self.{}.__revert();", field.name));
    }
    w.line("self.__owner.lower_dirty();");
    w.close();
    w.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Checker;
    use crate::types::TypeNode;

    #[test]
    fn test_derived_fields_do_not_commit() {
        let root = StructureStorage::root()
            .field("a", TypeNode::int())
            .field("twice", TypeNode::lazy(TypeNode::int(), "__this.a() * 2"));
        let checked = Checker::new(root).check();
        let view = checked.view();
        let mut w = CodeWriter::new();
        emit_commit_revert(&mut w, view.root(), &view);
        let out = w.finish();
        assert!(out.contains("self.a.__commit(\"a\", __forward, __reverse);"));
        assert!(out.contains("self.a.__revert();"));
        assert!(!out.contains("self.twice"));
    }
}
