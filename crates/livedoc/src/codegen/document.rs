// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Document root generation.
//!
//! The root structure lowers to `LivingDocument`, which besides the usual
//! structure machinery carries the document-level surface bound by the
//! factory:
//!
//! | Generated item | Purpose |
//! |----------------|---------|
//! | `new(monitor)` | construct an instance reporting to a monitor |
//! | `__can_create` / `__can_invent` / `__can_send_while_disconnected` | static policy predicates |
//! | `__config()` / `__services()` | static JSON descriptions |
//! | `__generic_clients()` | one client descriptor per service |
//! | `__transact_construct` | the synthetic construct transaction |
//! | `__late_bind` | attach space and key after construction |
//! | `__get_tests()` / `__run_test` | embedded tests |

use super::commit::emit_commit_revert;
use super::compare::emit_compare;
use super::delta::emit_delta;
use super::fields::{
    emit_accessors, emit_bindings, emit_construction, emit_methods, emit_policies, emit_settle,
    emit_storage,
};
use super::writer::CodeWriter;
use crate::check::SchemaView;
use crate::types::{rust_literal, ROOT_NAME};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Bodies of the three static policy predicates. Each body is opaque target
/// source evaluated with `__context: &RequestContext`; an absent body
/// denies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPolicies {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_create: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_invent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_send_while_disconnected: Option<String>,
}

/// `test name { body }`. The body runs with `__report: &mut TestReport`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDefinition {
    pub name: String,
    pub body: String,
}

impl TestDefinition {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

/// Document-level declarations that live outside the root structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSurface {
    #[serde(default)]
    pub policies: DocumentPolicies,
    /// `@static { config }` values, emitted as JSON.
    #[serde(default)]
    pub config: Map<String, Value>,
    /// Service name to its binding properties.
    #[serde(default)]
    pub services: IndexMap<String, IndexMap<String, String>>,
    /// Body of the construct event, run with `__who: &NtPrincipal` and
    /// `__arg: &str`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor: Option<String>,
    #[serde(default)]
    pub tests: Vec<TestDefinition>,
}

impl DocumentSurface {
    #[must_use]
    pub fn config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn service(
        mut self,
        name: impl Into<String>,
        properties: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.services
            .insert(name.into(), properties.into_iter().collect());
        self
    }

    #[must_use]
    pub fn test(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.tests.push(TestDefinition::new(name, body));
        self
    }

    #[must_use]
    pub fn can_create(mut self, body: impl Into<String>) -> Self {
        self.policies.can_create = Some(body.into());
        self
    }

    #[must_use]
    pub fn can_invent(mut self, body: impl Into<String>) -> Self {
        self.policies.can_invent = Some(body.into());
        self
    }

    #[must_use]
    pub fn can_send_while_disconnected(mut self, body: impl Into<String>) -> Self {
        self.policies.can_send_while_disconnected = Some(body.into());
        self
    }

    #[must_use]
    pub fn constructor(mut self, body: impl Into<String>) -> Self {
        self.constructor = Some(body.into());
        self
    }

    /// One `{"service", "class"}` descriptor per declared service.
    pub fn generic_clients(&self) -> Value {
        Value::Array(
            self.services
                .iter()
                .map(|(name, properties)| {
                    let class = properties.get("class").map_or("generic", String::as_str);
                    json!({ "service": name, "class": class })
                })
                .collect(),
        )
    }
}

pub(crate) fn emit_document(w: &mut CodeWriter, surface: &DocumentSurface, view: &SchemaView<'_>) {
    let root = view.root();

    w.open(format!("pub struct {ROOT_NAME}"));
    w.line("__owner: Owner,");
    w.line("__space: String,");
    w.line("__key: String,");
    emit_storage(w, root, view);
    w.close();
    w.blank();

    w.open(format!("impl {ROOT_NAME}"));
    w.open("pub fn new(__monitor: MonitorSink) -> Self");
    w.line("let __owner = Owner::root(__monitor);");
    w.line("let __link = __owner.link();");
    emit_construction(w, root, view);
    w.open("let mut __self = Self");
    w.line("__owner,");
    w.line("__space: String::new(),");
    w.line("__key: String::new(),");
    for field in &root.fields {
        w.line(format!("{},", field.name));
    }
    w.close_with(";");
    emit_bindings(w, root);
    w.line("__self");
    w.close();
    w.blank();

    emit_predicate(w, "__can_create", surface.policies.can_create.as_deref());
    emit_predicate(w, "__can_invent", surface.policies.can_invent.as_deref());
    emit_predicate(
        w,
        "__can_send_while_disconnected",
        surface.policies.can_send_while_disconnected.as_deref(),
    );

    emit_static_json(w, "__config", &Value::Object(surface.config.clone()));
    emit_static_json(w, "__services", &json!(surface.services));
    emit_static_json(w, "__generic_clients", &surface.generic_clients());

    w.open("pub fn __transact_construct(&mut self, __who: &NtPrincipal, __arg: &str) -> String");
    match &surface.constructor {
        Some(body) => {
            w.open("");
            w.block(body);
            w.close();
        }
        None => {
            w.line("let _ = (__who, __arg);");
        }
    }
    w.line("self.__settle();");
    w.line("let mut __forward = JsonStreamWriter::new();");
    w.line("let mut __reverse = JsonStreamWriter::new();");
    w.line("__forward.begin_object();");
    w.line("__reverse.begin_object();");
    w.line("self.__commit(\"data\", &mut __forward, &mut __reverse);");
    w.line("__forward.end_object();");
    w.line("__reverse.end_object();");
    w.line("self.__owner.notify(&__forward);");
    w.line("__forward.into_string()");
    w.close();
    w.blank();

    w.open("pub fn __late_bind(&mut self, __space: &str, __key: &str)");
    w.line("self.__space = __space.to_string();");
    w.line("self.__key = __key.to_string();");
    w.close();
    w.blank();

    emit_tests(w, surface);

    emit_accessors(w, root, view);
    emit_methods(w, root, view);
    emit_policies(w, root);
    emit_commit_revert(w, root, view);
    w.blank();
    emit_compare(w, root, view);
    w.blank();
    emit_settle(w, root, view);
    w.close();
    w.blank();

    emit_delta(w, ROOT_NAME, root, view);
}

fn emit_predicate(w: &mut CodeWriter, name: &str, body: Option<&str>) {
    w.open(format!("pub fn {name}(__context: &RequestContext) -> bool"));
    match body {
        Some(body) => {
            w.block(body);
        }
        None => {
            w.line("let _ = __context;");
            w.line("false");
        }
    }
    w.close();
    w.blank();
}

fn emit_static_json(w: &mut CodeWriter, name: &str, value: &Value) {
    w.open(format!("pub fn {name}() -> &'static str"));
    w.line(rust_literal(&value.to_string()));
    w.close();
    w.blank();
}

fn emit_tests(w: &mut CodeWriter, surface: &DocumentSurface) {
    let names: Vec<String> = surface.tests.iter().map(|t| rust_literal(&t.name)).collect();
    w.open("pub fn __get_tests() -> &'static [&'static str]");
    w.line(format!("&[{}]", names.join(", ")));
    w.close();
    w.blank();

    for test in &surface.tests {
        w.open(format!(
            "fn __test_{}(&mut self, __report: &mut TestReport)",
            test.name
        ));
        w.block(&test.body);
        w.close();
        w.blank();
    }

    w.open("pub fn __run_test(&mut self, __report: &mut TestReport, __name: &str) -> bool");
    w.open("match __name");
    for test in &surface.tests {
        w.open(format!("{} =>", rust_literal(&test.name)));
        w.line(format!("self.__test_{}(__report);", test.name));
        w.line("true");
        w.close();
    }
    w.line("_ => false,");
    w.close();
    w.close();
    w.blank();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Checker;
    use crate::types::{StructureStorage, TypeNode};

    fn generate(surface: &DocumentSurface) -> String {
        let root = StructureStorage::root().field("count", TypeNode::int());
        let checked = Checker::new(root).check();
        let view = checked.view();
        let mut w = CodeWriter::new();
        emit_document(&mut w, surface, &view);
        w.finish()
    }

    #[test]
    fn test_absent_policies_deny() {
        let surface = DocumentSurface::default().can_create("!__context.who.is_anonymous()");
        let out = generate(&surface);
        assert!(out.contains(concat!(
            "pub fn __can_create(__context: &RequestContext) -> bool {\n",
            "        !__context.who.is_anonymous()\n"
        )));
        assert!(out.contains(concat!(
            "pub fn __can_invent(__context: &RequestContext) -> bool {\n",
            "        let _ = __context;\n",
            "        false\n"
        )));
    }

    #[test]
    fn test_static_config_is_json_literal() {
        let out = generate(&DocumentSurface::default().config("maximum_history", 50));
        assert!(out.contains(r#""{\"maximum_history\":50}""#));
    }

    #[test]
    fn test_embedded_tests_dispatch() {
        let surface = DocumentSurface::default()
            .test("starts_empty", "__report.assert_true(self.count() == 0, \"empty\");")
            .test("bumps", "self.set_count(1);");
        let out = generate(&surface);
        assert!(out.contains("&[\"starts_empty\", \"bumps\"]"));
        assert!(out.contains("fn __test_bumps(&mut self, __report: &mut TestReport) {"));
        assert!(out.contains(concat!(
            "\"starts_empty\" => {\n",
            "                self.__test_starts_empty(__report);"
        )));
        assert!(out.contains("_ => false,"));
    }

    #[test]
    fn test_generic_clients_default_class() {
        let surface = DocumentSurface::default()
            .service("billing", [("class".to_string(), "http".to_string())])
            .service("mail", Vec::new());
        assert_eq!(
            surface.generic_clients().to_string(),
            r#"[{"service":"billing","class":"http"},{"service":"mail","class":"generic"}]"#
        );
    }
}
