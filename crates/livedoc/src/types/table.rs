// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tables of records and the projection maps derived from them.

use super::capability::{HasDeltaType, HasMethods, MethodSignature, NeedsSettle};
use super::{NodeId, ReactiveVariant, TypeBehavior, TypeKind, TypeNode};
use crate::check::{Environment, Resolution, SchemaView};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reactive table holding rows of one record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactiveTable {
    #[serde(rename = "record")]
    pub record_name: String,
}

impl ReactiveTable {
    pub fn new(record_name: impl Into<String>) -> Self {
        Self {
            record_name: record_name.into(),
        }
    }

    /// Concrete record name (after following aliases) once checked.
    pub fn resolved_record<'v>(&'v self, id: NodeId, view: &'v SchemaView<'_>) -> &'v str {
        match view.resolution(id) {
            Some(Resolution::Record(name)) => name,
            _ => &self.record_name,
        }
    }
}

impl ReactiveVariant for ReactiveTable {
    fn nature(&self) -> &'static str {
        "reactive_table"
    }

    fn behavior(&self) -> TypeBehavior {
        TypeBehavior::ReadOnlyWithGet
    }

    fn describe(&self) -> String {
        format!("table<{}>", self.record_name)
    }

    fn typing<'a>(&'a self, node: &'a TypeNode, env: &mut Environment<'a>) {
        let Some(target) = env.resolve_name(&self.record_name, node.position) else {
            return;
        };
        match &target.kind {
            TypeKind::Record(record) => {
                env.record(node.id(), Resolution::Record(record.storage.name.clone()));
            }
            TypeKind::Message(_) => env.error(
                node.position,
                format!(
                    "A table must contain a record, but '{}' is a message",
                    self.record_name
                ),
            ),
            _ => env.error(
                node.position,
                format!(
                    "The range type of a table must be a record, but got '{}'",
                    target.describe()
                ),
            ),
        }
    }

    fn reflect(&self, id: NodeId, out: &mut Map<String, Value>, view: &SchemaView<'_>) {
        out.insert(
            "record_name".into(),
            Value::from(self.resolved_record(id, view)),
        );
    }

    fn runtime_type(&self, id: NodeId, view: &SchemaView<'_>) -> String {
        format!("RxTable<RTx{}>", self.resolved_record(id, view))
    }

    fn native_type(&self, id: NodeId, view: &SchemaView<'_>) -> String {
        format!("NtTable<RTx{}>", self.resolved_record(id, view))
    }

    fn default_value(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        "NtTable::new()".to_string()
    }

    fn constructor(&self, id: NodeId, link: &str, view: &SchemaView<'_>) -> String {
        format!(
            "RxTable::link({link}, RTx{}::new)",
            self.resolved_record(id, view)
        )
    }
}

impl HasMethods for ReactiveTable {
    fn methods(&self) -> Vec<MethodSignature> {
        vec![
            MethodSignature::new("size", 0, "int", false),
            MethodSignature::new("make", 0, &self.record_name, true),
            MethodSignature::new("delete", 0, "void", true),
        ]
    }
}

impl NeedsSettle for ReactiveTable {}

/// Read-only grouping of a table's rows by one of their fields.
///
/// `table` names a table variable of the enclosing structure and `field` a
/// field of that table's record. The projected field must be usable as a
/// map domain; the resolved record and domain are recorded in the
/// resolution table during checking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionMap {
    pub table: String,
    pub field: String,
}

impl ProjectionMap {
    pub fn new(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Statement binding the projection to its source table, run once the
    /// owning structure has linked every field.
    pub fn bind_call(&self, field: &str) -> String {
        format!("__self.{field}.watch(&__self.{});", self.table)
    }

    fn resolved<'v>(&self, id: NodeId, view: &'v SchemaView<'_>) -> Option<(&'v str, &'static str)> {
        match view.resolution(id) {
            Some(Resolution::Projection { record, domain, .. }) => {
                Some((record.as_str(), domain.native_type()))
            }
            _ => None,
        }
    }
}

impl ReactiveVariant for ProjectionMap {
    fn nature(&self) -> &'static str {
        "reactive_projection"
    }

    fn behavior(&self) -> TypeBehavior {
        TypeBehavior::ReadOnlyWithGet
    }

    fn describe(&self) -> String {
        format!("projection<{}.{}>", self.table, self.field)
    }

    fn typing<'a>(&'a self, node: &'a TypeNode, env: &mut Environment<'a>) {
        let Some(scope) = env.scope() else {
            env.error(
                node.position,
                format!(
                    "The projection of '{}.{}' must be declared inside a structure",
                    self.table, self.field
                ),
            );
            return;
        };
        let Some(table_field) = scope.lookup(&self.table) else {
            env.error(
                node.position,
                format!(
                    "The table variable '{}' was not found in '{}'",
                    self.table, scope.name
                ),
            );
            return;
        };
        let record_name = match env.follow(&table_field.node).map(|t| &t.kind) {
            Some(TypeKind::Table(table)) => table.record_name.as_str(),
            _ => {
                env.error(
                    node.position,
                    format!(
                        "The variable '{}' is not a table; a projection requires a table",
                        self.table
                    ),
                );
                return;
            }
        };
        let Some(record) = env
            .follow_name(record_name)
            .and_then(|t| match &t.kind {
                TypeKind::Record(record) => Some(&record.storage),
                _ => None,
            })
        else {
            // the table reports its own missing record
            return;
        };
        let Some(projected) = record.lookup(&self.field) else {
            env.error(
                node.position,
                format!(
                    "The field '{}' was not found on the record '{}' of the table variable '{}'",
                    self.field, record.name, self.table
                ),
            );
            return;
        };
        let domain = env
            .follow(&projected.node)
            .filter(|t| t.as_map_domain().is_some())
            .and_then(TypeNode::as_scalar);
        match domain {
            Some(domain) => env.record(
                node.id(),
                Resolution::Projection {
                    table: self.table.clone(),
                    record: record.name.clone(),
                    domain,
                },
            ),
            None => env.error(
                node.position,
                format!(
                    "The projected field '{}' has type '{}'; it must be int, long, string or principal",
                    self.field,
                    projected.node.describe()
                ),
            ),
        }
    }

    fn reflect(&self, id: NodeId, out: &mut Map<String, Value>, view: &SchemaView<'_>) {
        out.insert("table".into(), Value::from(self.table.as_str()));
        out.insert("field".into(), Value::from(self.field.as_str()));
        let domain = match view.resolution(id) {
            Some(Resolution::Projection { domain, .. }) => {
                let mut shape = Map::new();
                shape.insert("nature".into(), Value::from("reactive_value"));
                shape.insert("type".into(), Value::from(domain.type_name()));
                Value::Object(shape)
            }
            _ => Value::Null,
        };
        out.insert("domain".into(), domain);
    }

    fn runtime_type(&self, id: NodeId, view: &SchemaView<'_>) -> String {
        match self.resolved(id, view) {
            Some((record, domain)) => format!("RxProjectionMap<{domain}, RTx{record}>"),
            None => "RxProjectionMap<(), ()>".to_string(),
        }
    }

    fn native_type(&self, id: NodeId, view: &SchemaView<'_>) -> String {
        match self.resolved(id, view) {
            Some((record, domain)) => format!("NtMap<{domain}, NtList<RecordRef<RTx{record}>>>"),
            None => "NtMap<(), ()>".to_string(),
        }
    }

    fn default_value(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        "NtMap::new()".to_string()
    }

    fn constructor(&self, id: NodeId, link: &str, view: &SchemaView<'_>) -> String {
        match self.resolved(id, view) {
            Some((record, _)) => format!(
                "RxProjectionMap::link({link}, |__row: &RTx{record}| __row.{}.get())",
                self.field
            ),
            None => format!("RxProjectionMap::link({link}, |_| ())"),
        }
    }
}

impl HasDeltaType for ProjectionMap {
    fn delta_type(&self, id: NodeId, view: &SchemaView<'_>) -> String {
        match self.resolved(id, view) {
            Some((record, domain)) => format!("DProjection<{domain}, RTx{record}Delta>"),
            None => "DOpaque".to_string(),
        }
    }
}

impl NeedsSettle for ProjectionMap {}
