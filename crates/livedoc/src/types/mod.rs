// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reactive type hierarchy.
//!
//! Every field of a living document is described by a [`TypeNode`]: a closed
//! [`TypeKind`] variant plus the metadata shared by all variants (behavior,
//! source position, annotations, node identity).
//!
//! # Variants
//!
//! | Variant | Nature | Notes |
//! |---------|--------|-------|
//! | [`ReactiveScalar`] | `reactive_value` | bool, int, long, double, string, ... |
//! | [`ReactiveText`] | `reactive_text` | collaborative text |
//! | [`ReplicationStatus`] | `replication_status` | outbound replication tracker |
//! | [`ReactiveList`] | `reactive_list` | |
//! | [`ReactiveMap`] | `reactive_map` | domain must be map-domain capable |
//! | [`ReactiveMaybe`] | `reactive_maybe` | |
//! | [`ReactiveTable`] | `reactive_table` | rows are records, indexable |
//! | [`ReactiveHolder`] | `reactive_holder` | holds one message value |
//! | [`ProjectionMap`] | `reactive_projection` | table grouped by one field |
//! | [`ReactiveLazy`] | `reactive_lazy` | computed, optionally cached |
//! | [`ReactiveRecord`] | `reactive_record` | owns a [`StructureStorage`] |
//! | [`NativeMessage`] | `native_message` | holder payloads |
//! | [`ReactiveRef`] | `reactive_ref` | resolved during checking |
//!
//! # Capabilities
//!
//! Orthogonal capabilities live in [`capability`] as separate traits; a node
//! exposes the ones its variant implements through the `as_*` accessors.
//!
//! # Identity
//!
//! Each node owns a [`NodeId`]. Cloning a node (or moving it to a new
//! position with [`TypeNode::with_position`]) yields a distinct node with a
//! fresh identity, so resolution results recorded against one node are
//! never observed through a copy.

pub mod capability;
mod collections;
mod ident;
mod record;
mod scalar;
mod structure;
mod table;
mod values;

pub use capability::{
    CanBeMapDomain, ContainsEmbeddedType, HasDeltaType, HasMethods, Killable, MethodSignature,
    NeedsSettle, Orderable, SpecialResolve,
};
pub use collections::{ReactiveList, ReactiveMap, ReactiveMaybe};
pub use ident::{member_name_problem, type_name_problem};
pub use record::{NativeMessage, ReactiveRecord, ReactiveRef};
pub use scalar::{ReactiveScalar, ScalarKind};
pub(crate) use structure::unusable_name;
pub use structure::{
    FieldDefinition, IndexDefinition, MethodDefinition, MethodParameter, PolicyDefinition,
    PrivacyPolicy, StorageSpecialization, StructureStorage, ROOT_NAME,
};
pub use table::{ProjectionMap, ReactiveTable};
pub use values::{ReactiveHolder, ReactiveLazy, ReactiveText, ReplicationStatus};

use crate::check::{Environment, SchemaView};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one type node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh identity.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value (diagnostics only).
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Location of a declaration in its source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
    #[serde(default)]
    pub end_line: u32,
    #[serde(default)]
    pub end_column: u32,
}

impl SourcePosition {
    /// Position covering a single point.
    pub fn at(line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            end_line: line,
            end_column: column,
        }
    }

    /// Position covering a range.
    pub fn span(line: u32, column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            line,
            column,
            end_line,
            end_column,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// User annotation attached to a type, copied into the reflection schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Annotation {
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// How generated accessors expose a field of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeBehavior {
    /// Plain native value, no accessors (message fields).
    ReadOnlyNativeValue,
    /// Getter returning a native value computed from reactive state.
    ReadOnlyGetNativeValue,
    /// Plain native value with direct mutation.
    ReadWriteNative,
    /// Getter and setter over a reactive cell.
    ReadWriteWithSetGet,
    /// Getter returning the reactive object; mutation goes through its methods.
    ReadOnlyWithGet,
}

impl TypeBehavior {
    /// Whether generated code may expose a setter or mutable accessor.
    pub fn is_mutable(self) -> bool {
        matches!(
            self,
            TypeBehavior::ReadWriteNative
                | TypeBehavior::ReadWriteWithSetGet
                | TypeBehavior::ReadOnlyWithGet
        )
    }
}

/// Behavior shared by every type variant.
///
/// Typing, reflection and source generation are carried per variant; the
/// `id` argument is the identity of the node being processed, used to look
/// up scope-dependent resolutions.
pub trait ReactiveVariant {
    /// Reflection discriminator.
    fn nature(&self) -> &'static str;

    fn behavior(&self) -> TypeBehavior;

    /// Human-readable type for diagnostics.
    fn describe(&self) -> String;

    /// Check this variant, recording problems in `env`.
    fn typing<'a>(&'a self, node: &'a TypeNode, env: &mut Environment<'a>);

    /// Write the type-specific reflection fields (after `nature` and `annotations`).
    fn reflect(&self, id: NodeId, out: &mut Map<String, Value>, view: &SchemaView<'_>);

    /// Reactive storage type used for fields of this type.
    fn runtime_type(&self, id: NodeId, view: &SchemaView<'_>) -> String;

    /// Native value type returned by getters.
    fn native_type(&self, id: NodeId, view: &SchemaView<'_>) -> String;

    /// Native default value expression.
    fn default_value(&self, id: NodeId, view: &SchemaView<'_>) -> String;

    /// Expression constructing the reactive storage, linked under `link`.
    fn constructor(&self, id: NodeId, link: &str, view: &SchemaView<'_>) -> String;
}

/// Closed set of type variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Scalar(ReactiveScalar),
    Text(ReactiveText),
    ReplicationStatus(ReplicationStatus),
    List(ReactiveList),
    Map(ReactiveMap),
    Maybe(ReactiveMaybe),
    Table(ReactiveTable),
    Holder(ReactiveHolder),
    Projection(ProjectionMap),
    Lazy(ReactiveLazy),
    Record(ReactiveRecord),
    Message(NativeMessage),
    Ref(ReactiveRef),
}

/// A reactive type descriptor.
#[derive(Debug, Serialize, Deserialize)]
pub struct TypeNode {
    #[serde(skip, default = "NodeId::next")]
    id: NodeId,
    #[serde(default)]
    pub position: SourcePosition,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(flatten)]
    pub kind: TypeKind,
}

impl Clone for TypeNode {
    fn clone(&self) -> Self {
        Self {
            id: NodeId::next(),
            position: self.position,
            annotations: self.annotations.clone(),
            kind: self.kind.clone(),
        }
    }
}

impl PartialEq for TypeNode {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.annotations == other.annotations
    }
}

impl TypeNode {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            id: NodeId::next(),
            position: SourcePosition::default(),
            annotations: Vec::new(),
            kind,
        }
    }

    pub fn scalar(kind: ScalarKind) -> Self {
        Self::new(TypeKind::Scalar(ReactiveScalar::new(kind)))
    }

    pub fn boolean() -> Self {
        Self::scalar(ScalarKind::Boolean)
    }

    pub fn int() -> Self {
        Self::scalar(ScalarKind::Int32)
    }

    pub fn long() -> Self {
        Self::scalar(ScalarKind::Int64)
    }

    pub fn double() -> Self {
        Self::scalar(ScalarKind::Double)
    }

    pub fn string() -> Self {
        Self::scalar(ScalarKind::String)
    }

    pub fn principal() -> Self {
        Self::scalar(ScalarKind::Principal)
    }

    pub fn text() -> Self {
        Self::new(TypeKind::Text(ReactiveText::default()))
    }

    pub fn replication_status(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self::new(TypeKind::ReplicationStatus(ReplicationStatus::new(
            service, method,
        )))
    }

    pub fn list(element: TypeNode) -> Self {
        Self::new(TypeKind::List(ReactiveList::new(element)))
    }

    pub fn map(domain: TypeNode, range: TypeNode) -> Self {
        Self::new(TypeKind::Map(ReactiveMap::new(domain, range)))
    }

    pub fn maybe(inner: TypeNode) -> Self {
        Self::new(TypeKind::Maybe(ReactiveMaybe::new(inner)))
    }

    pub fn table(record: impl Into<String>) -> Self {
        Self::new(TypeKind::Table(ReactiveTable::new(record)))
    }

    pub fn holder(message: impl Into<String>) -> Self {
        Self::new(TypeKind::Holder(ReactiveHolder::new(message)))
    }

    pub fn projection(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(TypeKind::Projection(ProjectionMap::new(table, field)))
    }

    pub fn lazy(computed: TypeNode, formula: impl Into<String>) -> Self {
        Self::new(TypeKind::Lazy(ReactiveLazy::new(computed, formula)))
    }

    pub fn record(storage: StructureStorage) -> Self {
        let position = storage.position;
        Self::new(TypeKind::Record(ReactiveRecord::new(storage))).at(position)
    }

    pub fn message(storage: StructureStorage) -> Self {
        let position = storage.position;
        Self::new(TypeKind::Message(NativeMessage::new(storage))).at(position)
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Ref(ReactiveRef::new(name)))
    }

    /// Attach a source position in place (builder style, keeps identity).
    #[must_use]
    pub fn at(mut self, position: SourcePosition) -> Self {
        self.position = position;
        self
    }

    /// Attach an annotation (builder style).
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Copy this node to a new position. The copy is a distinct node.
    pub fn with_position(&self, position: SourcePosition) -> Self {
        let mut copy = self.clone();
        copy.position = position;
        copy
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn variant(&self) -> &dyn ReactiveVariant {
        match &self.kind {
            TypeKind::Scalar(v) => v,
            TypeKind::Text(v) => v,
            TypeKind::ReplicationStatus(v) => v,
            TypeKind::List(v) => v,
            TypeKind::Map(v) => v,
            TypeKind::Maybe(v) => v,
            TypeKind::Table(v) => v,
            TypeKind::Holder(v) => v,
            TypeKind::Projection(v) => v,
            TypeKind::Lazy(v) => v,
            TypeKind::Record(v) => v,
            TypeKind::Message(v) => v,
            TypeKind::Ref(v) => v,
        }
    }

    pub fn nature(&self) -> &'static str {
        self.variant().nature()
    }

    pub fn behavior(&self) -> TypeBehavior {
        self.variant().behavior()
    }

    pub fn describe(&self) -> String {
        self.variant().describe()
    }

    /// Type this node (and, first, everything it embeds).
    pub fn typing<'a>(&'a self, env: &mut Environment<'a>) {
        self.variant().typing(self, env);
    }

    pub fn runtime_type(&self, view: &SchemaView<'_>) -> String {
        self.variant().runtime_type(self.id, view)
    }

    pub fn native_type(&self, view: &SchemaView<'_>) -> String {
        self.variant().native_type(self.id, view)
    }

    pub fn default_value(&self, view: &SchemaView<'_>) -> String {
        self.variant().default_value(self.id, view)
    }

    pub fn constructor(&self, link: &str, view: &SchemaView<'_>) -> String {
        self.variant().constructor(self.id, link, view)
    }

    /// Companion delta type, for types that participate in delta sync.
    pub fn delta_type(&self, view: &SchemaView<'_>) -> Option<String> {
        self.as_has_delta_type().map(|d| d.delta_type(self.id, view))
    }

    pub fn is_table(&self) -> bool {
        matches!(self.kind, TypeKind::Table(_))
    }

    pub fn as_scalar(&self) -> Option<ScalarKind> {
        match &self.kind {
            TypeKind::Scalar(s) => Some(s.kind),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Ref(r) => Some(&r.name),
            _ => None,
        }
    }

    pub fn as_has_methods(&self) -> Option<&dyn HasMethods> {
        match &self.kind {
            TypeKind::Text(v) => Some(v),
            TypeKind::List(v) => Some(v),
            TypeKind::Map(v) => Some(v),
            TypeKind::Maybe(v) => Some(v),
            TypeKind::Table(v) => Some(v),
            TypeKind::Record(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_has_delta_type(&self) -> Option<&dyn HasDeltaType> {
        match &self.kind {
            TypeKind::Scalar(v) => Some(v),
            TypeKind::Text(v) => Some(v),
            TypeKind::ReplicationStatus(v) => Some(v),
            TypeKind::List(v) => Some(v),
            TypeKind::Map(v) => Some(v),
            TypeKind::Maybe(v) => Some(v),
            TypeKind::Holder(v) => Some(v),
            TypeKind::Projection(v) => Some(v),
            TypeKind::Lazy(v) => Some(v),
            TypeKind::Record(v) => Some(v),
            TypeKind::Ref(v) => Some(v),
            TypeKind::Table(_) | TypeKind::Message(_) => None,
        }
    }

    pub fn as_needs_settle(&self) -> Option<&dyn NeedsSettle> {
        match &self.kind {
            TypeKind::Map(v) => Some(v),
            TypeKind::Table(v) => Some(v),
            TypeKind::Projection(v) => Some(v),
            TypeKind::Lazy(v) => Some(v),
            TypeKind::Record(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_contains_embedded(&self) -> Option<&dyn ContainsEmbeddedType> {
        match &self.kind {
            TypeKind::List(v) => Some(v),
            TypeKind::Map(v) => Some(v),
            TypeKind::Maybe(v) => Some(v),
            TypeKind::Lazy(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_orderable(&self) -> Option<&dyn Orderable> {
        match &self.kind {
            TypeKind::Scalar(v) if v.kind.is_orderable() => Some(v),
            _ => None,
        }
    }

    pub fn as_killable(&self) -> Option<&dyn Killable> {
        match &self.kind {
            TypeKind::Maybe(v) => Some(v),
            TypeKind::Record(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map_domain(&self) -> Option<&dyn CanBeMapDomain> {
        match &self.kind {
            TypeKind::Scalar(v) if v.kind.can_be_map_domain() => Some(v),
            _ => None,
        }
    }

    pub fn as_special_resolve(&self) -> Option<&dyn SpecialResolve> {
        match &self.kind {
            TypeKind::Record(v) => Some(v),
            TypeKind::Message(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Quote a string as a Rust string literal for generated code.
pub(crate) fn rust_literal(value: &str) -> String {
    format!("{:?}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_gets_fresh_identity() {
        let node = TypeNode::list(TypeNode::int());
        let copy = node.clone();
        assert_ne!(node.id(), copy.id());
        assert_eq!(node, copy);
    }

    #[test]
    fn test_with_position_is_distinct_node() {
        let node = TypeNode::reference("Foo");
        let moved = node.with_position(SourcePosition::at(4, 2));
        assert_ne!(node.id(), moved.id());
        assert_eq!(moved.position.line, 4);
        assert_eq!(node.position, SourcePosition::default());
    }

    #[test]
    fn test_describe_nested() {
        let node = TypeNode::map(TypeNode::string(), TypeNode::list(TypeNode::reference("Foo")));
        assert_eq!(node.describe(), "map<string,list<Foo>>");
        assert_eq!(TypeNode::table("Foo").describe(), "table<Foo>");
        assert_eq!(TypeNode::maybe(TypeNode::long()).describe(), "maybe<long>");
    }

    #[test]
    fn test_capability_selection() {
        assert!(TypeNode::int().as_map_domain().is_some());
        assert!(TypeNode::double().as_map_domain().is_none());
        assert!(TypeNode::table("Foo").as_has_delta_type().is_none());
        assert!(TypeNode::table("Foo").as_needs_settle().is_some());
        assert!(TypeNode::list(TypeNode::int()).as_contains_embedded().is_some());
        assert!(TypeNode::maybe(TypeNode::int()).as_killable().is_some());
        assert!(TypeNode::string().as_orderable().is_some());
        assert!(TypeNode::boolean().as_orderable().is_none());
    }

    #[test]
    fn test_deserialize_tagged_kind() {
        let node: TypeNode = serde_json::from_str(
            r#"{"kind":"map","domain":{"kind":"scalar","scalar":"int"},"range":{"kind":"ref","name":"Foo"}}"#,
        )
        .expect("parse map");
        assert_eq!(node.describe(), "map<int,Foo>");
    }
}
