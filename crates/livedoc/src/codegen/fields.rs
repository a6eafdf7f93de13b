// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-field emission shared by records and the document root.

use super::writer::CodeWriter;
use crate::check::SchemaView;
use crate::types::{
    FieldDefinition, PrivacyPolicy, StructureStorage, TypeBehavior, TypeKind, TypeNode,
};

/// The concrete node behind a field (references followed).
pub(crate) fn concrete<'n>(node: &'n TypeNode, view: &SchemaView<'n>) -> &'n TypeNode {
    view.follow(node).unwrap_or(node)
}

/// Whether the field holds state that commits, reverts and syncs. Lazies
/// and projections are derived from other fields.
pub(crate) fn is_stored(field: &FieldDefinition, view: &SchemaView<'_>) -> bool {
    !matches!(
        concrete(&field.node, view).kind,
        TypeKind::Lazy(_) | TypeKind::Projection(_)
    )
}

/// Whether the field reaches clients through the delta. Derived fields are
/// synchronized like stored ones; only private fields stay out.
pub(crate) fn in_delta(field: &FieldDefinition) -> bool {
    field.effective_policy() != PrivacyPolicy::Private
}

/// `name: RuntimeType,` for every field.
pub(crate) fn emit_storage(w: &mut CodeWriter, storage: &StructureStorage, view: &SchemaView<'_>) {
    for field in &storage.fields {
        w.line(format!("{}: {},", field.name, field.node.runtime_type(view)));
    }
}

/// `let name = <constructor>;` for every field, linked under `__link`.
pub(crate) fn emit_construction(
    w: &mut CodeWriter,
    storage: &StructureStorage,
    view: &SchemaView<'_>,
) {
    for field in &storage.fields {
        let constructor = field.node.constructor("__link.clone()", view);
        match &field.default_value {
            Some(initial) => w.line(format!(
                "let {} = {}.initialized({});",
                field.name,
                constructor,
                initial.trim()
            )),
            None => w.line(format!("let {} = {};", field.name, constructor)),
        };
    }
}

/// Statements run once every field of `__self` is linked.
pub(crate) fn emit_bindings(w: &mut CodeWriter, storage: &StructureStorage) {
    for field in &storage.fields {
        if let TypeKind::Projection(projection) = &field.node.kind {
            w.line(projection.bind_call(&field.name));
        }
    }
}

/// Accessors following each field's behavior tag.
pub(crate) fn emit_accessors(
    w: &mut CodeWriter,
    storage: &StructureStorage,
    view: &SchemaView<'_>,
) {
    for field in &storage.fields {
        let target = concrete(&field.node, view);
        let name = &field.name;
        match target.behavior() {
            TypeBehavior::ReadWriteWithSetGet => {
                let native = field.node.native_type(view);
                w.open(format!("pub fn {name}(&self) -> {native}"));
                w.line(format!("self.{name}.get()"));
                w.close();
                if !field.readonly {
                    w.blank();
                    w.open(format!("pub fn set_{name}(&mut self, value: {native})"));
                    w.line(format!("self.{name}.set(value);"));
                    w.close();
                }
            }
            TypeBehavior::ReadOnlyWithGet => {
                let runtime = field.node.runtime_type(view);
                w.open(format!("pub fn {name}(&self) -> &{runtime}"));
                w.line(format!("&self.{name}"));
                w.close();
                if !field.readonly && !matches!(target.kind, TypeKind::Projection(_)) {
                    w.blank();
                    w.open(format!("pub fn {name}_mut(&mut self) -> &mut {runtime}"));
                    w.line(format!("&mut self.{name}"));
                    w.close();
                }
            }
            TypeBehavior::ReadOnlyGetNativeValue => {
                let native = field.node.native_type(view);
                let read = match target.kind {
                    TypeKind::Lazy(_) => format!("self.{name}.get(self)"),
                    _ => format!("self.{name}.get()"),
                };
                w.open(format!("pub fn {name}(&self) -> {native}"));
                w.line(read);
                w.close();
            }
            TypeBehavior::ReadOnlyNativeValue | TypeBehavior::ReadWriteNative => {
                let native = field.node.native_type(view);
                w.open(format!("pub fn {name}(&self) -> &{native}"));
                w.line(format!("&self.{name}"));
                w.close();
            }
        }
        w.blank();
    }
}

/// User methods; bodies are emitted verbatim.
pub(crate) fn emit_methods(w: &mut CodeWriter, storage: &StructureStorage, view: &SchemaView<'_>) {
    for method in &storage.methods {
        let receiver = if method.readonly { "&self" } else { "&mut self" };
        let mut params = vec![receiver.to_string()];
        params.extend(
            method
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name, p.node.native_type(view))),
        );
        let returns = method
            .returns
            .as_ref()
            .map(|r| format!(" -> {}", r.native_type(view)))
            .unwrap_or_default();
        w.open(format!(
            "pub fn {}({}){}",
            method.name,
            params.join(", "),
            returns
        ));
        w.block(&method.body);
        w.close();
        w.blank();
    }
}

/// Custom visibility policies consulted by the delta writer.
pub(crate) fn emit_policies(w: &mut CodeWriter, storage: &StructureStorage) {
    for policy in &storage.policies {
        w.open(format!(
            "pub fn __policy_{}(&self, __who: &NtPrincipal) -> bool",
            policy.name
        ));
        w.block(&policy.body);
        w.close();
        w.blank();
    }
}

/// `__settle` over every field that needs settling.
pub(crate) fn emit_settle(w: &mut CodeWriter, storage: &StructureStorage, view: &SchemaView<'_>) {
    w.open("pub fn __settle(&mut self)");
    for field in &storage.fields {
        if let Some(settle) = concrete(&field.node, view).as_needs_settle() {
            w.line(settle.settle_call(&field.name));
        }
    }
    w.close();
}
