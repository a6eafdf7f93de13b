// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Delta (change-diff) companion types.
//!
//! For a structure `T` the generator emits `TDelta` holding one delta per
//! synchronized field. `show` writes what a viewer is allowed to observe
//! and `hide` retracts a previously shown value. Private fields are never
//! written; `viewer_is<f>` and `use_custom<p>` fields are gated per viewer.

use super::fields::{concrete, in_delta};
use super::writer::CodeWriter;
use crate::check::SchemaView;
use crate::types::{FieldDefinition, PrivacyPolicy, StructureStorage, TypeBehavior};

/// Emit `{type_name}Delta` for a structure whose generated type is `type_name`.
pub(crate) fn emit_delta(
    w: &mut CodeWriter,
    type_name: &str,
    storage: &StructureStorage,
    view: &SchemaView<'_>,
) {
    let synced: Vec<(&FieldDefinition, String)> = storage
        .fields
        .iter()
        .filter(|f| in_delta(f))
        .filter_map(|f| f.node.delta_type(view).map(|d| (f, d)))
        .collect();
    let delta = format!("{type_name}Delta");

    w.line("#[derive(Default)]");
    w.open(format!("pub struct {delta}"));
    w.line("__emitted: bool,");
    for (field, delta_type) in &synced {
        w.line(format!("{}: {},", field.name, delta_type));
    }
    w.close();
    w.blank();

    w.open(format!("impl {delta}"));
    w.open("pub fn new() -> Self");
    w.line("Self::default()");
    w.close();
    w.blank();

    w.open(format!(
        "pub fn show(&mut self, __item: &{type_name}, __writer: &mut PrivateLazyDeltaWriter)"
    ));
    w.line("let __viewer = __writer.viewer().clone();");
    w.line("let mut __obj = __writer.plan_object();");
    for (field, _) in &synced {
        let value = match concrete(&field.node, view).behavior() {
            TypeBehavior::ReadWriteWithSetGet | TypeBehavior::ReadOnlyGetNativeValue => {
                format!("&__item.{}.get()", field.name)
            }
            _ => format!("&__item.{}", field.name),
        };
        let show = format!(
            "self.{0}.show({1}, __obj.plan_field(\"{0}\"));",
            field.name, value
        );
        let hide = format!(
            "self.{0}.hide(__obj.plan_field(\"{0}\"));",
            field.name
        );
        match field.effective_policy() {
            PrivacyPolicy::Public => {
                w.line(show);
            }
            PrivacyPolicy::ViewerIs(owner) => {
                w.open(format!("if __item.{owner}.get() == __viewer"));
                w.line(show);
                w.close_with(" else {");
                w.line(format!("    {hide}"));
                w.line("}");
            }
            PrivacyPolicy::UseCustom(policy) => {
                w.open(format!("if __item.__policy_{policy}(&__viewer)"));
                w.line(show);
                w.close_with(" else {");
                w.line(format!("    {hide}"));
                w.line("}");
            }
            PrivacyPolicy::Private => {}
        }
    }
    w.line("__obj.end();");
    w.line("self.__emitted = true;");
    w.close();
    w.blank();

    w.open("pub fn hide(&mut self, __writer: &mut PrivateLazyDeltaWriter)");
    w.open("if self.__emitted");
    w.line("self.__emitted = false;");
    w.line("__writer.write_null();");
    w.close();
    w.close();
    w.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Checker;
    use crate::types::TypeNode;

    #[test]
    fn test_privacy_gates_delta_fields() {
        let root = StructureStorage::root()
            .with_field(
                FieldDefinition::new("owner", TypeNode::principal()).policy(PrivacyPolicy::Public),
            )
            .with_field(
                FieldDefinition::new("secret", TypeNode::string())
                    .policy(PrivacyPolicy::ViewerIs("owner".into())),
            )
            .field("hidden", TypeNode::int());
        let checked = Checker::new(root).check();
        let view = checked.view();
        let mut w = CodeWriter::new();
        emit_delta(&mut w, "LivingDocument", view.root(), &view);
        let out = w.finish();
        assert!(out.contains("pub struct LivingDocumentDelta {"));
        assert!(out.contains("owner: DPrincipal,"));
        assert!(out.contains("secret: DString,"));
        assert!(!out.contains("hidden"));
        assert!(out.contains("if __item.owner.get() == __viewer {"));
        assert!(out.contains("self.secret.hide(__obj.plan_field(\"secret\"));"));
    }

    #[test]
    fn test_public_formula_reaches_the_delta() {
        let root = StructureStorage::root()
            .with_field(FieldDefinition::new("a", TypeNode::int()).policy(PrivacyPolicy::Public))
            .with_field(
                FieldDefinition::new("twice", TypeNode::lazy(TypeNode::int(), "__this.a.get() * 2"))
                    .policy(PrivacyPolicy::Public),
            )
            .field("shadow", TypeNode::lazy(TypeNode::int(), "__this.a.get()"));
        let checked = Checker::new(root).check();
        assert!(checked.is_deployable(), "{}", checked.diagnostics());
        let view = checked.view();
        let mut w = CodeWriter::new();
        emit_delta(&mut w, "LivingDocument", view.root(), &view);
        let out = w.finish();
        assert!(out.contains("twice: DLazy<DInt32>,"), "{out}");
        assert!(out.contains("self.twice.show("), "{out}");
        assert!(!out.contains("shadow"));
    }
}
