// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lists, maps and maybes.

use super::capability::{
    ContainsEmbeddedType, HasDeltaType, HasMethods, Killable, MethodSignature, NeedsSettle,
};
use super::{NodeId, ReactiveVariant, TypeBehavior, TypeKind, TypeNode};
use crate::check::{Environment, SchemaView};
use crate::reflect::reflect_type;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered reactive collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactiveList {
    pub element: Box<TypeNode>,
}

impl ReactiveList {
    pub fn new(element: TypeNode) -> Self {
        Self {
            element: Box::new(element),
        }
    }
}

impl ReactiveVariant for ReactiveList {
    fn nature(&self) -> &'static str {
        "reactive_list"
    }

    fn behavior(&self) -> TypeBehavior {
        TypeBehavior::ReadOnlyWithGet
    }

    fn describe(&self) -> String {
        format!("list<{}>", self.element.describe())
    }

    fn typing<'a>(&'a self, node: &'a TypeNode, env: &mut Environment<'a>) {
        self.element.typing(env);
        env.reject_table_range(&self.element, "list", node.position);
    }

    fn reflect(&self, _id: NodeId, out: &mut Map<String, Value>, view: &SchemaView<'_>) {
        out.insert("type".into(), reflect_type(&self.element, view));
    }

    fn runtime_type(&self, _id: NodeId, view: &SchemaView<'_>) -> String {
        format!("RxList<{}>", self.element.runtime_type(view))
    }

    fn native_type(&self, _id: NodeId, view: &SchemaView<'_>) -> String {
        format!("NtList<{}>", self.element.native_type(view))
    }

    fn default_value(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        "NtList::new()".to_string()
    }

    fn constructor(&self, _id: NodeId, link: &str, view: &SchemaView<'_>) -> String {
        format!(
            "RxList::link({link}, |__link| {})",
            self.element.constructor("__link", view)
        )
    }
}

impl HasMethods for ReactiveList {
    fn methods(&self) -> Vec<MethodSignature> {
        vec![
            MethodSignature::new("size", 0, "int", false),
            MethodSignature::new("append", 1, "void", true),
            MethodSignature::new("remove", 1, "bool", true),
            MethodSignature::new("clear", 0, "void", true),
        ]
    }
}

impl HasDeltaType for ReactiveList {
    fn delta_type(&self, _id: NodeId, view: &SchemaView<'_>) -> String {
        format!("DList<{}>", delta_of(&self.element, view))
    }
}

impl ContainsEmbeddedType for ReactiveList {
    fn embedded_type(&self) -> &TypeNode {
        &self.element
    }
}

/// Reactive associative container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactiveMap {
    pub domain: Box<TypeNode>,
    pub range: Box<TypeNode>,
}

impl ReactiveMap {
    pub fn new(domain: TypeNode, range: TypeNode) -> Self {
        Self {
            domain: Box::new(domain),
            range: Box::new(range),
        }
    }

    fn key_type(&self, view: &SchemaView<'_>) -> String {
        view.follow(&self.domain)
            .and_then(TypeNode::as_map_domain)
            .map(|d| d.domain_key_type().to_string())
            .unwrap_or_else(|| self.domain.native_type(view))
    }
}

impl ReactiveVariant for ReactiveMap {
    fn nature(&self) -> &'static str {
        "reactive_map"
    }

    fn behavior(&self) -> TypeBehavior {
        TypeBehavior::ReadOnlyWithGet
    }

    fn describe(&self) -> String {
        format!("map<{},{}>", self.domain.describe(), self.range.describe())
    }

    fn typing<'a>(&'a self, node: &'a TypeNode, env: &mut Environment<'a>) {
        self.domain.typing(env);
        self.range.typing(env);
        if let Some(domain) = env.follow(&self.domain) {
            if domain.as_map_domain().is_none() {
                env.error(
                    node.position,
                    format!(
                        "The domain type of a map must be int, long, string or principal, but got '{}'",
                        self.domain.describe()
                    ),
                );
            }
        }
        env.reject_table_range(&self.range, "map", node.position);
    }

    fn reflect(&self, _id: NodeId, out: &mut Map<String, Value>, view: &SchemaView<'_>) {
        out.insert("domain".into(), reflect_type(&self.domain, view));
        out.insert("range".into(), reflect_type(&self.range, view));
    }

    fn runtime_type(&self, _id: NodeId, view: &SchemaView<'_>) -> String {
        format!(
            "RxMap<{}, {}>",
            self.key_type(view),
            self.range.runtime_type(view)
        )
    }

    fn native_type(&self, _id: NodeId, view: &SchemaView<'_>) -> String {
        format!(
            "NtMap<{}, {}>",
            self.key_type(view),
            self.range.native_type(view)
        )
    }

    fn default_value(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        "NtMap::new()".to_string()
    }

    fn constructor(&self, _id: NodeId, link: &str, view: &SchemaView<'_>) -> String {
        format!(
            "RxMap::link({link}, |__link| {})",
            self.range.constructor("__link", view)
        )
    }
}

impl HasMethods for ReactiveMap {
    fn methods(&self) -> Vec<MethodSignature> {
        vec![
            MethodSignature::new("size", 0, "int", false),
            MethodSignature::new("has", 1, "bool", false),
            MethodSignature::new("remove", 1, "bool", true),
            MethodSignature::new("clear", 0, "void", true),
        ]
    }
}

impl HasDeltaType for ReactiveMap {
    fn delta_type(&self, _id: NodeId, view: &SchemaView<'_>) -> String {
        format!(
            "DMap<{}, {}>",
            self.key_type(view),
            delta_of(&self.range, view)
        )
    }
}

impl NeedsSettle for ReactiveMap {}

impl ContainsEmbeddedType for ReactiveMap {
    fn embedded_type(&self) -> &TypeNode {
        &self.range
    }
}

/// Optional reactive value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactiveMaybe {
    pub inner: Box<TypeNode>,
}

impl ReactiveMaybe {
    pub fn new(inner: TypeNode) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    /// Type produced by reading the maybe: records are handed out by
    /// reference, plain values by copy.
    pub fn type_after_get(&self, view: &SchemaView<'_>) -> String {
        match view.follow(&self.inner).map(|t| &t.kind) {
            Some(TypeKind::Record(record)) => format!("RecordRef<RTx{}>", record.storage.name),
            _ => self.inner.native_type(view),
        }
    }
}

impl ReactiveVariant for ReactiveMaybe {
    fn nature(&self) -> &'static str {
        "reactive_maybe"
    }

    fn behavior(&self) -> TypeBehavior {
        TypeBehavior::ReadWriteWithSetGet
    }

    fn describe(&self) -> String {
        format!("maybe<{}>", self.inner.describe())
    }

    fn typing<'a>(&'a self, _node: &'a TypeNode, env: &mut Environment<'a>) {
        self.inner.typing(env);
    }

    fn reflect(&self, _id: NodeId, out: &mut Map<String, Value>, view: &SchemaView<'_>) {
        out.insert("type".into(), reflect_type(&self.inner, view));
    }

    fn runtime_type(&self, _id: NodeId, view: &SchemaView<'_>) -> String {
        format!("RxMaybe<{}>", self.inner.runtime_type(view))
    }

    fn native_type(&self, _id: NodeId, view: &SchemaView<'_>) -> String {
        format!("NtMaybe<{}>", self.type_after_get(view))
    }

    fn default_value(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        "NtMaybe::none()".to_string()
    }

    fn constructor(&self, _id: NodeId, link: &str, view: &SchemaView<'_>) -> String {
        format!(
            "RxMaybe::link({link}, |__link| {})",
            self.inner.constructor("__link", view)
        )
    }
}

impl HasMethods for ReactiveMaybe {
    fn methods(&self) -> Vec<MethodSignature> {
        vec![
            MethodSignature::new("has", 0, "bool", false),
            MethodSignature::new("delete", 0, "void", true),
        ]
    }
}

impl HasDeltaType for ReactiveMaybe {
    fn delta_type(&self, _id: NodeId, view: &SchemaView<'_>) -> String {
        format!("DMaybe<{}>", delta_of(&self.inner, view))
    }
}

impl ContainsEmbeddedType for ReactiveMaybe {
    fn embedded_type(&self) -> &TypeNode {
        &self.inner
    }
}

impl Killable for ReactiveMaybe {
    fn kill_call(&self, field: &str) -> String {
        format!("self.{field}.delete();")
    }
}

/// Delta type of `node`, or the opaque placeholder for types that never sync.
pub(crate) fn delta_of(node: &TypeNode, view: &SchemaView<'_>) -> String {
    node.delta_type(view)
        .unwrap_or_else(|| "DOpaque".to_string())
}
