// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message generation: plain native structs carried by holders and
//! service calls.

use super::writer::CodeWriter;
use crate::check::SchemaView;
use crate::types::StructureStorage;

/// Generated type name of message `name`.
pub fn message_type_name(name: &str) -> String {
    format!("Msg{name}")
}

pub(crate) fn emit_message(w: &mut CodeWriter, storage: &StructureStorage, view: &SchemaView<'_>) {
    let ty = message_type_name(&storage.name);

    w.line("#[derive(Debug, Clone, Default, PartialEq)]");
    w.open(format!("pub struct {ty}"));
    for field in &storage.fields {
        w.line(format!(
            "pub {}: {},",
            field.name,
            field.node.native_type(view)
        ));
    }
    w.close();
    w.blank();

    w.open(format!("impl NtMessage for {ty}"));
    w.open("fn write(&self, __writer: &mut JsonStreamWriter)");
    w.line("__writer.begin_object();");
    for field in &storage.fields {
        w.line(format!(
            "__writer.write_field(\"{0}\", &self.{0});",
            field.name
        ));
    }
    w.line("__writer.end_object();");
    w.close();
    w.blank();
    w.open("fn read(__reader: &mut JsonStreamReader) -> Self");
    w.line("let mut __msg = Self::default();");
    w.open("while let Some(__key) = __reader.next_field()");
    w.open("match __key.as_str()");
    for field in &storage.fields {
        w.line(format!(
            "\"{0}\" => __msg.{0} = __reader.read_value(),",
            field.name
        ));
    }
    w.line("_ => __reader.skip_value(),");
    w.close();
    w.close();
    w.line("__msg");
    w.close();
    w.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Checker;
    use crate::types::TypeNode;

    #[test]
    fn test_message_struct_and_codec() {
        let mut checker = Checker::new(StructureStorage::root());
        checker.declare_message(
            StructureStorage::message("Greeting")
                .field("who", TypeNode::string())
                .field("times", TypeNode::int()),
        );
        let checked = checker.check();
        let view = checked.view();
        let message = view.table().messages().next().expect("message");
        let mut w = CodeWriter::new();
        emit_message(&mut w, message, &view);
        let out = w.finish();
        assert!(out.contains("pub struct MsgGreeting {"));
        assert!(out.contains("    pub who: String,"));
        assert!(out.contains("    pub times: i32,"));
        assert!(out.contains("__writer.write_field(\"times\", &self.times);"));
        assert!(out.contains("\"who\" => __msg.who = __reader.read_value(),"));
    }
}
