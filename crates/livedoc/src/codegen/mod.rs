// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Code generation.
//!
//! A checked space lowers to one Rust source file (the *unit*) that builds
//! as a `cdylib` against `livedoc_runtime`. The unit contains, in order:
//!
//! 1. a header importing the runtime prelude;
//! 2. one struct per message (`MsgName`);
//! 3. one struct per record (`RTxName`) in dependency-first order, each
//!    followed by its delta type;
//! 4. the document root (`LivingDocument`) and its delta type;
//! 5. the C-ABI glue exporting `livedoc_unit_vtable`.
//!
//! Generation is a pure projection of the checked space: nothing in the
//! type graph is mutated.

mod commit;
mod compare;
mod delta;
mod document;
mod fields;
mod message;
mod record;
mod writer;

pub use document::{DocumentPolicies, DocumentSurface, TestDefinition};
pub use message::message_type_name;
pub use record::record_type_name;
pub use writer::CodeWriter;

use crate::check::CheckedSpace;
use crate::reflect::reflect_space;
use crate::types::{rust_literal, StorageSpecialization, ROOT_NAME};
use serde_json::Value;
use tera::Tera;
use thiserror::Error;

/// ABI version stamped into every generated vtable.
pub const UNIT_ABI_VERSION: u32 = 1;

/// Name of the exported vtable symbol.
pub const UNIT_ENTRY_SYMBOL: &str = "livedoc_unit_vtable";

const GLUE_TEMPLATE: &str = include_str!("templates/unit_glue.rs.tera");

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("space has {0} type error(s) and can not be generated")]
    NotDeployable(usize),
    #[error("invalid unit name '{0}'")]
    InvalidUnitName(String),
    #[error("glue template: {0}")]
    Template(#[from] tera::Error),
}

/// Output of [`generate_unit`].
#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    pub unit_name: String,
    pub source: String,
    /// Reflection schema of the space.
    pub reflection: Value,
}

/// Lower a checked space into a unit.
pub fn generate_unit(
    checked: &CheckedSpace,
    surface: &DocumentSurface,
    unit_name: &str,
) -> Result<GeneratedUnit, CodegenError> {
    if !checked.is_deployable() {
        return Err(CodegenError::NotDeployable(checked.diagnostics().len()));
    }
    if !is_unit_name(unit_name) {
        return Err(CodegenError::InvalidUnitName(unit_name.to_string()));
    }
    let view = checked.view();
    let mut w = CodeWriter::new();

    w.line(format!("// Generated by livedoc for unit '{unit_name}'. Do not edit."));
    w.line("#![allow(unused, non_snake_case, non_camel_case_types, clippy::all)]");
    w.blank();
    w.line("use livedoc_runtime::prelude::*;");
    w.blank();

    let mut messages = 0usize;
    for storage in view.table().messages() {
        message::emit_message(&mut w, storage, &view);
        w.blank();
        messages += 1;
    }

    let mut records = 0usize;
    for name in checked.graph().ordering() {
        let Some(storage) = view.structure(&name) else {
            continue;
        };
        if storage.specialization != StorageSpecialization::Record {
            continue;
        }
        record::emit_record(&mut w, storage, &view);
        w.blank();
        records += 1;
    }

    document::emit_document(&mut w, surface, &view);
    w.blank();

    let tests: Vec<&str> = surface.tests.iter().map(|t| t.name.as_str()).collect();
    let mut context = tera::Context::new();
    context.insert("unit_name", unit_name);
    context.insert("abi_version", &UNIT_ABI_VERSION);
    context.insert("root", ROOT_NAME);
    context.insert(
        "tests_literal",
        &rust_literal(&serde_json::to_string(&tests).unwrap_or_else(|_| "[]".into())),
    );
    let mut tera = Tera::default();
    tera.add_raw_template("unit_glue.rs", GLUE_TEMPLATE)?;
    let glue = tera.render("unit_glue.rs", &context)?;

    let mut source = w.finish();
    source.push_str(&glue);

    log::debug!(
        "[codegen] unit '{}': {} messages, {} records, {} tests, {} bytes",
        unit_name,
        messages,
        records,
        tests.len(),
        source.len()
    );

    Ok(GeneratedUnit {
        unit_name: unit_name.to_string(),
        source,
        reflection: reflect_space(&view),
    })
}

/// Unit names become crate names: ASCII alphanumerics and `_`, not starting
/// with a digit.
fn is_unit_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Checker;
    use crate::types::{StructureStorage, TypeNode};

    fn space() -> CheckedSpace {
        let mut checker = Checker::new(
            StructureStorage::root()
                .field("rows", TypeNode::table("Foo"))
                .field("last", TypeNode::holder("Ping")),
        );
        checker.declare_record(
            StructureStorage::record("Foo")
                .field("id", TypeNode::int())
                .field("child", TypeNode::maybe(TypeNode::reference("Bar"))),
        );
        checker.declare_record(StructureStorage::record("Bar").field("id", TypeNode::int()));
        checker.declare_message(StructureStorage::message("Ping").field("at", TypeNode::long()));
        checker.check()
    }

    #[test]
    fn test_unit_layout() {
        let unit = generate_unit(&space(), &DocumentSurface::default(), "demo").expect("generate");
        let source = &unit.source;
        let ping = source.find("pub struct MsgPing").expect("message");
        let bar = source.find("pub struct RTxBar ").expect("bar");
        let foo = source.find("pub struct RTxFoo ").expect("foo");
        let root = source.find("pub struct LivingDocument ").expect("root");
        assert!(ping < bar && bar < foo && foo < root);
        assert!(source.contains("use livedoc_runtime::prelude::*;"));
        assert!(source.contains("pub static livedoc_unit_vtable: UnitVTable"));
        assert!(source.contains("abi_version: 1,"));
        assert!(source.contains("__glue_out(\"[]\")"));
        assert_eq!(unit.reflection["root"]["nature"], "reactive_record");
    }

    #[test]
    fn test_glue_lists_embedded_tests() {
        let surface = DocumentSurface::default().test("smoke", "let _ = __report;");
        let unit = generate_unit(&space(), &surface, "demo").expect("generate");
        assert!(unit.source.contains(r#"__glue_out("[\"smoke\"]")"#));
    }

    #[test]
    fn test_rejects_undeployable_space() {
        let checked =
            Checker::new(StructureStorage::root().field("rows", TypeNode::table("Nope"))).check();
        let err = generate_unit(&checked, &DocumentSurface::default(), "demo").unwrap_err();
        assert!(matches!(err, CodegenError::NotDeployable(n) if n > 0));
    }

    #[test]
    fn test_unit_name_validation() {
        assert!(is_unit_name("space_42"));
        assert!(!is_unit_name("42space"));
        assert!(!is_unit_name("my-space"));
        assert!(!is_unit_name(""));
    }
}
