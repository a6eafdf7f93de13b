// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record generation.
//!
//! A record `R` lowers to `RTxR` with:
//!
//! - storage for every declared field, plus the owner link and the position
//!   of the `id` field used by the identity accessors;
//! - one optional index invalidator per `@index`, wired only when the owner
//!   is an indexed table (checked at runtime through
//!   `Owner::as_indexed_table`, since the same record type is used both bare
//!   and as table rows, so both branches are always generated);
//! - `deindex` / `reindex` and `invalidate_index` / `pump_index_events`;
//! - `__id` / `__set_id`, where a forced set bypasses revert tracking;
//! - commit/revert, the delta type and structural compare;
//! - `__settle` and `__kill`.

use super::commit::emit_commit_revert;
use super::compare::emit_compare;
use super::delta::emit_delta;
use super::fields::{
    concrete, emit_accessors, emit_bindings, emit_construction, emit_methods, emit_policies,
    emit_settle, emit_storage,
};
use super::writer::CodeWriter;
use crate::check::SchemaView;
use crate::types::{ScalarKind, StructureStorage};

/// One index column of a record.
struct IndexColumn<'s> {
    column: usize,
    field: &'s str,
    native: &'static str,
    extract: String,
}

fn index_columns<'s>(storage: &'s StructureStorage, view: &SchemaView<'s>) -> Vec<IndexColumn<'s>> {
    storage
        .indices
        .iter()
        .enumerate()
        .filter_map(|(column, index)| {
            let field = storage.lookup(&index.field)?;
            let kind: ScalarKind = concrete(&field.node, view).as_scalar()?;
            Some(IndexColumn {
                column,
                field: &field.name,
                native: kind.native_type(),
                extract: kind.index_expression("__value")?,
            })
        })
        .collect()
}

/// Generated type name of record `name`.
pub fn record_type_name(name: &str) -> String {
    format!("RTx{name}")
}

pub(crate) fn emit_record(w: &mut CodeWriter, storage: &StructureStorage, view: &SchemaView<'_>) {
    let ty = record_type_name(&storage.name);
    let columns = index_columns(storage, view);
    let id_slot = storage
        .fields
        .iter()
        .position(|f| f.name == "id")
        .unwrap_or_default();

    w.open(format!("pub struct {ty}"));
    w.line("__owner: Owner,");
    emit_storage(w, storage, view);
    for column in &columns {
        w.line(format!(
            "__index_{}: Option<IndexInvalidate<{ty}>>,",
            column.field
        ));
    }
    w.close();
    w.blank();

    w.open(format!("impl {ty}"));
    w.line(format!("pub const __ID_FIELD: usize = {id_slot};"));
    w.line(format!("pub const __INDEX_COLUMNS: usize = {};", columns.len()));
    w.blank();

    // construction and index wiring
    w.open("pub fn new(__owner: Owner) -> Self");
    w.line("let __link = __owner.link();");
    emit_construction(w, storage, view);
    for column in &columns {
        w.open(format!(
            "let __index_{} = match __owner.as_indexed_table()",
            column.field
        ));
        w.open("Some(__table) =>");
        w.line(format!(
            "let __invalidate = IndexInvalidate::new(__table, {}, |__value: &{}| {});",
            column.column, column.native, column.extract
        ));
        w.line(format!(
            "{}.__subscribe(__invalidate.clone());",
            column.field
        ));
        w.line("Some(__invalidate)");
        w.close();
        w.line("None => None,");
        w.close_with(";");
    }
    w.open("let mut __self = Self");
    w.line("__owner,");
    for field in &storage.fields {
        w.line(format!("{},", field.name));
    }
    for column in &columns {
        w.line(format!("__index_{},", column.field));
    }
    w.close_with(";");
    emit_bindings(w, storage);
    w.line("__self");
    w.close();
    w.blank();

    emit_index_hooks(w, &columns);
    w.blank();

    // identity
    w.open("pub fn __id(&self) -> i32");
    w.line("self.id.get()");
    w.close();
    w.blank();
    w.open("pub fn __set_id(&mut self, value: i32, force: bool)");
    w.open("if force");
    w.line("self.id.force_set(value);");
    w.close_with(" else {");
    w.line("    self.id.set(value);");
    w.line("}");
    w.close();
    w.blank();

    emit_accessors(w, storage, view);
    emit_methods(w, storage, view);
    emit_policies(w, storage);
    emit_commit_revert(w, storage, view);
    w.blank();
    emit_compare(w, storage, view);
    w.blank();
    emit_settle(w, storage, view);
    w.blank();

    w.open("pub fn __kill(&mut self)");
    for field in &storage.fields {
        if let Some(killable) = concrete(&field.node, view).as_killable() {
            w.line(killable.kill_call(&field.name));
        }
    }
    w.line("self.deindex();");
    w.line("self.__owner.kill();");
    w.close();
    w.close();
    w.blank();

    emit_delta(w, &ty, storage, view);
}

fn emit_index_hooks(w: &mut CodeWriter, columns: &[IndexColumn<'_>]) {
    w.open("pub fn deindex(&mut self)");
    for column in columns {
        w.open(format!("if let Some(__index) = &self.__index_{}", column.field));
        w.line("__index.deindex();");
        w.close();
    }
    w.close();
    w.blank();

    w.open("pub fn reindex(&mut self)");
    for column in columns {
        w.open(format!("if let Some(__index) = &self.__index_{}", column.field));
        w.line("__index.reindex();");
        w.close();
    }
    w.close();
    w.blank();

    w.open("pub fn invalidate_index(&self, __pubsub: &TablePubSub)");
    w.line("__pubsub.primary(self.__id());");
    for column in columns {
        w.open("");
        w.line(format!("let __value = &self.{}.get();", column.field));
        w.line(format!("__pubsub.index({}, {});", column.column, column.extract));
        w.close();
    }
    w.close();
    w.blank();

    w.open("pub fn pump_index_events(&self, __pubsub: &TablePubSub)");
    for column in columns {
        w.line("let __watch = __pubsub.clone();");
        w.open(format!(
            "self.{}.__subscribe(move |__value: &{}|",
            column.field, column.native
        ));
        w.line(format!("__watch.index({}, {});", column.column, column.extract));
        w.line("true");
        w.close_with(");");
    }
    w.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Checker;
    use crate::types::TypeNode;

    fn generate(storage: StructureStorage) -> String {
        let mut checker = Checker::new(StructureStorage::root());
        checker.declare_record(storage);
        let checked = checker.check();
        assert!(checked.is_deployable(), "{}", checked.diagnostics());
        let view = checked.view();
        let record = view.table().records().next().expect("record");
        let mut w = CodeWriter::new();
        emit_record(&mut w, record, &view);
        w.finish()
    }

    #[test]
    fn test_index_invalidator_has_both_branches() {
        let out = generate(
            StructureStorage::record("Foo")
                .field("id", TypeNode::int())
                .field("name", TypeNode::string())
                .index("name"),
        );
        assert!(out.contains("__index_name: Option<IndexInvalidate<RTxFoo>>,"));
        assert!(out.contains("let __index_name = match __owner.as_indexed_table() {"));
        assert!(out.contains(
            "let __invalidate = IndexInvalidate::new(__table, 0, |__value: &String| IndexHash::of_str(__value));"
        ));
        assert!(out.contains("name.__subscribe(__invalidate.clone());"));
        assert!(out.contains("Some(__invalidate)"));
        assert!(out.contains("None => None,"));
        assert!(out.contains("__pubsub.index(0, IndexHash::of_str(__value));"));
    }

    #[test]
    fn test_identity_accessors() {
        let out = generate(
            StructureStorage::record("Foo")
                .field("label", TypeNode::string())
                .field("id", TypeNode::int()),
        );
        assert!(out.contains("pub const __ID_FIELD: usize = 1;"));
        assert!(out.contains("pub fn __id(&self) -> i32 {"));
        assert!(out.contains("self.id.force_set(value);"));
        assert!(out.contains("pub struct RTxFooDelta {"));
        assert!(out.contains("pub fn __kill(&mut self) {"));
    }

    #[test]
    fn test_record_without_indices_has_empty_hooks() {
        let out = generate(StructureStorage::record("Bare").field("id", TypeNode::int()));
        assert!(!out.contains("IndexInvalidate"));
        assert!(out.contains("pub fn deindex(&mut self) {\n    }"));
    }
}
