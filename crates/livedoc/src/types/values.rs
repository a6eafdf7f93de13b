// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Text, replication status, message holders and lazy formulas.

use super::capability::{
    ContainsEmbeddedType, HasDeltaType, HasMethods, MethodSignature, NeedsSettle,
};
use super::collections::delta_of;
use super::{rust_literal, NodeId, ReactiveVariant, TypeBehavior, TypeKind, TypeNode};
use crate::check::{Environment, Resolution, SchemaView};
use crate::reflect::reflect_type;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collaborative text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactiveText {}

impl ReactiveVariant for ReactiveText {
    fn nature(&self) -> &'static str {
        "reactive_text"
    }

    fn behavior(&self) -> TypeBehavior {
        TypeBehavior::ReadOnlyWithGet
    }

    fn describe(&self) -> String {
        "text".to_string()
    }

    fn typing<'a>(&'a self, _node: &'a TypeNode, _env: &mut Environment<'a>) {}

    fn reflect(&self, _id: NodeId, _out: &mut Map<String, Value>, _view: &SchemaView<'_>) {}

    fn runtime_type(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        "RxText".to_string()
    }

    fn native_type(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        "String".to_string()
    }

    fn default_value(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        "String::new()".to_string()
    }

    fn constructor(&self, _id: NodeId, link: &str, _view: &SchemaView<'_>) -> String {
        format!("RxText::link({link})")
    }
}

impl HasMethods for ReactiveText {
    fn methods(&self) -> Vec<MethodSignature> {
        vec![
            MethodSignature::new("get", 0, "string", false),
            MethodSignature::new("set", 1, "void", true),
            MethodSignature::new("append", 1, "void", true),
        ]
    }
}

impl HasDeltaType for ReactiveText {
    fn delta_type(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        "DText".to_string()
    }
}

/// Tracks outbound replication of a value to a remote service method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationStatus {
    pub service: String,
    pub method: String,
}

impl ReplicationStatus {
    pub fn new(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
        }
    }
}

impl ReactiveVariant for ReplicationStatus {
    fn nature(&self) -> &'static str {
        "replication_status"
    }

    fn behavior(&self) -> TypeBehavior {
        TypeBehavior::ReadOnlyGetNativeValue
    }

    fn describe(&self) -> String {
        format!("replication<{}:{}>", self.service, self.method)
    }

    fn typing<'a>(&'a self, node: &'a TypeNode, env: &mut Environment<'a>) {
        if self.service.is_empty() || self.method.is_empty() {
            env.error(
                node.position,
                "A replication status requires both a service and a method",
            );
        }
    }

    fn reflect(&self, _id: NodeId, _out: &mut Map<String, Value>, _view: &SchemaView<'_>) {}

    fn runtime_type(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        "RxReplicationStatus".to_string()
    }

    fn native_type(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        "String".to_string()
    }

    fn default_value(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        "String::new()".to_string()
    }

    fn constructor(&self, _id: NodeId, link: &str, _view: &SchemaView<'_>) -> String {
        format!(
            "RxReplicationStatus::link({link}, {}, {})",
            rust_literal(&self.service),
            rust_literal(&self.method)
        )
    }
}

impl HasDeltaType for ReplicationStatus {
    fn delta_type(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        "DString".to_string()
    }
}

/// Reactive cell holding one native message value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactiveHolder {
    #[serde(rename = "message")]
    pub message_name: String,
}

impl ReactiveHolder {
    pub fn new(message_name: impl Into<String>) -> Self {
        Self {
            message_name: message_name.into(),
        }
    }

    fn resolved_message<'v>(&'v self, id: NodeId, view: &'v SchemaView<'_>) -> &'v str {
        match view.resolution(id) {
            Some(Resolution::Message(name)) => name,
            _ => &self.message_name,
        }
    }
}

impl ReactiveVariant for ReactiveHolder {
    fn nature(&self) -> &'static str {
        "reactive_holder"
    }

    fn behavior(&self) -> TypeBehavior {
        TypeBehavior::ReadWriteWithSetGet
    }

    fn describe(&self) -> String {
        format!("holder<{}>", self.message_name)
    }

    fn typing<'a>(&'a self, node: &'a TypeNode, env: &mut Environment<'a>) {
        let Some(target) = env.resolve_name(&self.message_name, node.position) else {
            return;
        };
        match &target.kind {
            TypeKind::Message(message) => {
                env.record(node.id(), Resolution::Message(message.storage.name.clone()));
            }
            _ => env.error(
                node.position,
                format!(
                    "A holder must name a message, but '{}' is '{}'",
                    self.message_name,
                    target.describe()
                ),
            ),
        }
    }

    fn reflect(&self, id: NodeId, out: &mut Map<String, Value>, view: &SchemaView<'_>) {
        out.insert(
            "message_name".into(),
            Value::from(self.resolved_message(id, view)),
        );
    }

    fn runtime_type(&self, id: NodeId, view: &SchemaView<'_>) -> String {
        format!("RxHolder<Msg{}>", self.resolved_message(id, view))
    }

    fn native_type(&self, id: NodeId, view: &SchemaView<'_>) -> String {
        format!("Msg{}", self.resolved_message(id, view))
    }

    fn default_value(&self, id: NodeId, view: &SchemaView<'_>) -> String {
        format!("Msg{}::default()", self.resolved_message(id, view))
    }

    fn constructor(&self, id: NodeId, link: &str, view: &SchemaView<'_>) -> String {
        format!(
            "RxHolder::with_value({link}, Msg{}::default())",
            self.resolved_message(id, view)
        )
    }
}

impl HasDeltaType for ReactiveHolder {
    fn delta_type(&self, id: NodeId, view: &SchemaView<'_>) -> String {
        format!("DHolder<Msg{}>", self.resolved_message(id, view))
    }
}

/// Value computed from other reactive values by a formula.
///
/// The formula is an opaque expression over the owning structure, bound as
/// `__this`. Cached lazies keep their last value until a dependency fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactiveLazy {
    pub computed: Box<TypeNode>,
    #[serde(default)]
    pub cached: bool,
    pub formula: String,
}

impl ReactiveLazy {
    pub fn new(computed: TypeNode, formula: impl Into<String>) -> Self {
        Self {
            computed: Box::new(computed),
            cached: false,
            formula: formula.into(),
        }
    }

    #[must_use]
    pub fn cached(mut self) -> Self {
        self.cached = true;
        self
    }

    fn cell(&self) -> &'static str {
        if self.cached {
            "RxCachedLazy"
        } else {
            "RxLazy"
        }
    }
}

impl ReactiveVariant for ReactiveLazy {
    fn nature(&self) -> &'static str {
        "reactive_lazy"
    }

    fn behavior(&self) -> TypeBehavior {
        TypeBehavior::ReadOnlyGetNativeValue
    }

    fn describe(&self) -> String {
        format!("formula<{}>", self.computed.describe())
    }

    fn typing<'a>(&'a self, node: &'a TypeNode, env: &mut Environment<'a>) {
        self.computed.typing(env);
        if self.formula.trim().is_empty() {
            env.error(node.position, "The formula of a lazy value must not be empty");
        }
        env.reject_table_range(&self.computed, "formula", node.position);
    }

    fn reflect(&self, _id: NodeId, out: &mut Map<String, Value>, view: &SchemaView<'_>) {
        out.insert("type".into(), reflect_type(&self.computed, view));
    }

    fn runtime_type(&self, _id: NodeId, view: &SchemaView<'_>) -> String {
        format!("{}<{}>", self.cell(), self.computed.native_type(view))
    }

    fn native_type(&self, _id: NodeId, view: &SchemaView<'_>) -> String {
        self.computed.native_type(view)
    }

    fn default_value(&self, _id: NodeId, view: &SchemaView<'_>) -> String {
        self.computed.default_value(view)
    }

    fn constructor(&self, _id: NodeId, link: &str, view: &SchemaView<'_>) -> String {
        format!(
            "{}::link({link}, |__this: &Self| -> {} {{ {} }})",
            self.cell(),
            self.computed.native_type(view),
            self.formula.trim()
        )
    }
}

impl HasDeltaType for ReactiveLazy {
    fn delta_type(&self, _id: NodeId, view: &SchemaView<'_>) -> String {
        format!("DLazy<{}>", delta_of(&self.computed, view))
    }
}

impl NeedsSettle for ReactiveLazy {}

impl ContainsEmbeddedType for ReactiveLazy {
    fn embedded_type(&self) -> &TypeNode {
        &self.computed
    }
}
