// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Records, messages and named references.

use super::capability::{
    HasDeltaType, HasMethods, Killable, MethodSignature, NeedsSettle, SpecialResolve,
};
use super::{
    NodeId, ReactiveVariant, StorageSpecialization, StructureStorage, TypeBehavior, TypeKind,
    TypeNode,
};
use crate::check::{Environment, Resolution, SchemaView};
use crate::reflect::reflect_structure_fields;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named reactive structure, stored bare or as the row type of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactiveRecord {
    #[serde(flatten)]
    pub storage: StructureStorage,
}

impl ReactiveRecord {
    pub fn new(storage: StructureStorage) -> Self {
        Self { storage }
    }

    pub fn name(&self) -> &str {
        &self.storage.name
    }
}

impl ReactiveVariant for ReactiveRecord {
    fn nature(&self) -> &'static str {
        "reactive_record"
    }

    fn behavior(&self) -> TypeBehavior {
        TypeBehavior::ReadOnlyWithGet
    }

    fn describe(&self) -> String {
        self.storage.name.clone()
    }

    fn typing<'a>(&'a self, node: &'a TypeNode, env: &mut Environment<'a>) {
        self.storage.typing(node.position, env);
    }

    /// Root shape; cross references are written by the reflection emitter.
    fn reflect(&self, _id: NodeId, out: &mut Map<String, Value>, view: &SchemaView<'_>) {
        out.insert("name".into(), Value::from(self.storage.name.as_str()));
        out.insert(
            "fields".into(),
            Value::Object(reflect_structure_fields(&self.storage, view)),
        );
    }

    fn runtime_type(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        format!("RTx{}", self.storage.name)
    }

    fn native_type(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        format!("RecordRef<RTx{}>", self.storage.name)
    }

    fn default_value(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        "RecordRef::detached()".to_string()
    }

    fn constructor(&self, _id: NodeId, link: &str, _view: &SchemaView<'_>) -> String {
        format!("RTx{}::new(Owner::record({link}))", self.storage.name)
    }
}

impl HasMethods for ReactiveRecord {
    fn methods(&self) -> Vec<MethodSignature> {
        let mut methods: Vec<_> = self
            .storage
            .methods
            .iter()
            .map(|m| {
                let returns = m
                    .returns
                    .as_ref()
                    .map_or_else(|| "void".to_string(), TypeNode::describe);
                MethodSignature::new(&m.name, m.params.len(), &returns, !m.readonly)
            })
            .collect();
        methods.push(MethodSignature::new("delete", 0, "void", true));
        methods
    }
}

impl HasDeltaType for ReactiveRecord {
    fn delta_type(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        format!("RTx{}Delta", self.storage.name)
    }
}

impl NeedsSettle for ReactiveRecord {}

impl Killable for ReactiveRecord {}

impl SpecialResolve for ReactiveRecord {
    fn special_resolve(&self, name: &str) -> Resolution {
        Resolution::Record(name.to_string())
    }
}

/// Plain (non-reactive) structure; the payload of holders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeMessage {
    #[serde(flatten)]
    pub storage: StructureStorage,
}

impl NativeMessage {
    pub fn new(storage: StructureStorage) -> Self {
        Self { storage }
    }

    pub fn name(&self) -> &str {
        &self.storage.name
    }
}

impl ReactiveVariant for NativeMessage {
    fn nature(&self) -> &'static str {
        "native_message"
    }

    fn behavior(&self) -> TypeBehavior {
        TypeBehavior::ReadOnlyNativeValue
    }

    fn describe(&self) -> String {
        self.storage.name.clone()
    }

    fn typing<'a>(&'a self, node: &'a TypeNode, env: &mut Environment<'a>) {
        self.storage.typing(node.position, env);
    }

    fn reflect(&self, _id: NodeId, out: &mut Map<String, Value>, view: &SchemaView<'_>) {
        out.insert("name".into(), Value::from(self.storage.name.as_str()));
        out.insert(
            "fields".into(),
            Value::Object(reflect_structure_fields(&self.storage, view)),
        );
    }

    fn runtime_type(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        format!("Msg{}", self.storage.name)
    }

    fn native_type(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        format!("Msg{}", self.storage.name)
    }

    fn default_value(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        format!("Msg{}::default()", self.storage.name)
    }

    fn constructor(&self, _id: NodeId, _link: &str, _view: &SchemaView<'_>) -> String {
        format!("Msg{}::default()", self.storage.name)
    }
}

impl SpecialResolve for NativeMessage {
    fn special_resolve(&self, name: &str) -> Resolution {
        Resolution::Message(name.to_string())
    }
}

/// A name that resolves to a record, message or alias during checking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactiveRef {
    pub name: String,
}

impl ReactiveRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn target<'v>(&self, id: NodeId, view: &SchemaView<'v>) -> Option<&'v TypeNode> {
        match view.resolution(id) {
            Some(Resolution::Record(name) | Resolution::Message(name) | Resolution::Alias(name)) => {
                view.lookup(name)
            }
            _ => view.follow_name(&self.name),
        }
    }
}

impl ReactiveVariant for ReactiveRef {
    fn nature(&self) -> &'static str {
        "reactive_ref"
    }

    fn behavior(&self) -> TypeBehavior {
        TypeBehavior::ReadOnlyWithGet
    }

    fn describe(&self) -> String {
        self.name.clone()
    }

    fn typing<'a>(&'a self, node: &'a TypeNode, env: &mut Environment<'a>) {
        let Some(target) = env.resolve(node) else {
            return;
        };
        let inside_message = env
            .scope()
            .is_some_and(|s| s.specialization == StorageSpecialization::Message);
        match (&target.kind, inside_message) {
            (TypeKind::Message(message), false) => env.error(
                node.position,
                format!(
                    "The message '{}' can not be stored directly in a reactive structure; use holder<{}>",
                    message.name(),
                    message.name()
                ),
            ),
            (TypeKind::Record(record), true) => env.error(
                node.position,
                format!(
                    "The record '{}' can not be stored inside a message",
                    record.name()
                ),
            ),
            _ => {}
        }
    }

    fn reflect(&self, _id: NodeId, out: &mut Map<String, Value>, _view: &SchemaView<'_>) {
        out.insert("ref".into(), Value::from(self.name.as_str()));
    }

    fn runtime_type(&self, id: NodeId, view: &SchemaView<'_>) -> String {
        self.target(id, view).map_or_else(
            || format!("RTx{}", self.name),
            |t| t.runtime_type(view),
        )
    }

    fn native_type(&self, id: NodeId, view: &SchemaView<'_>) -> String {
        self.target(id, view).map_or_else(
            || format!("RecordRef<RTx{}>", self.name),
            |t| t.native_type(view),
        )
    }

    fn default_value(&self, id: NodeId, view: &SchemaView<'_>) -> String {
        self.target(id, view).map_or_else(
            || "RecordRef::detached()".to_string(),
            |t| t.default_value(view),
        )
    }

    fn constructor(&self, id: NodeId, link: &str, view: &SchemaView<'_>) -> String {
        self.target(id, view).map_or_else(
            || format!("RTx{}::new(Owner::record({link}))", self.name),
            |t| t.constructor(link, view),
        )
    }
}

impl HasDeltaType for ReactiveRef {
    fn delta_type(&self, id: NodeId, view: &SchemaView<'_>) -> String {
        self.target(id, view)
            .and_then(|t| t.delta_type(view))
            .unwrap_or_else(|| "DOpaque".to_string())
    }
}
