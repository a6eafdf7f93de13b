// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reactive scalar values.

use super::capability::{CanBeMapDomain, HasDeltaType, Orderable};
use super::{NodeId, ReactiveVariant, TypeBehavior, TypeNode};
use crate::check::{Environment, SchemaView};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Scalar value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    #[serde(rename = "bool")]
    Boolean,
    #[serde(rename = "int")]
    Int32,
    #[serde(rename = "long")]
    Int64,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "principal")]
    Principal,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    #[serde(rename = "time")]
    Time,
    #[serde(rename = "timespan")]
    TimeSpan,
    /// Arbitrary JSON.
    #[serde(rename = "dynamic")]
    Dynamic,
    /// 3D vector of doubles.
    #[serde(rename = "vec3")]
    Vec3,
    /// State machine label.
    #[serde(rename = "label")]
    Label,
}

impl ScalarKind {
    /// Name used in reflection and diagnostics.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Boolean => "bool",
            Self::Int32 => "int",
            Self::Int64 => "long",
            Self::Double => "double",
            Self::String => "string",
            Self::Principal => "principal",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Time => "time",
            Self::TimeSpan => "timespan",
            Self::Dynamic => "dynamic",
            Self::Vec3 => "vec3",
            Self::Label => "label",
        }
    }

    fn runtime_cell(self) -> &'static str {
        match self {
            Self::Boolean => "RxBoolean",
            Self::Int32 => "RxInt32",
            Self::Int64 => "RxInt64",
            Self::Double => "RxDouble",
            Self::String => "RxString",
            Self::Principal => "RxPrincipal",
            Self::Date => "RxDate",
            Self::DateTime => "RxDateTime",
            Self::Time => "RxTime",
            Self::TimeSpan => "RxTimeSpan",
            Self::Dynamic => "RxDynamic",
            Self::Vec3 => "RxVec3",
            Self::Label => "RxStateMachineLabel",
        }
    }

    pub fn native_type(self) -> &'static str {
        match self {
            Self::Boolean => "bool",
            Self::Int32 => "i32",
            Self::Int64 => "i64",
            Self::Double => "f64",
            Self::String | Self::Label => "String",
            Self::Principal => "NtPrincipal",
            Self::Date => "NtDate",
            Self::DateTime => "NtDateTime",
            Self::Time => "NtTime",
            Self::TimeSpan => "NtTimeSpan",
            Self::Dynamic => "NtDynamic",
            Self::Vec3 => "NtVec3",
        }
    }

    pub fn default_value(self) -> &'static str {
        match self {
            Self::Boolean => "false",
            Self::Int32 => "0",
            Self::Int64 => "0i64",
            Self::Double => "0.0",
            Self::String | Self::Label => "String::new()",
            Self::Principal => "NtPrincipal::no_one()",
            Self::Date => "NtDate::default()",
            Self::DateTime => "NtDateTime::default()",
            Self::Time => "NtTime::default()",
            Self::TimeSpan => "NtTimeSpan::default()",
            Self::Dynamic => "NtDynamic::null()",
            Self::Vec3 => "NtVec3::default()",
        }
    }

    fn delta_type(self) -> &'static str {
        match self {
            Self::Boolean => "DBoolean",
            Self::Int32 => "DInt32",
            Self::Int64 => "DInt64",
            Self::Double => "DDouble",
            Self::String | Self::Label => "DString",
            Self::Principal => "DPrincipal",
            Self::Date => "DDate",
            Self::DateTime => "DDateTime",
            Self::Time => "DTime",
            Self::TimeSpan => "DTimeSpan",
            Self::Dynamic => "DDynamic",
            Self::Vec3 => "DVec3",
        }
    }

    pub fn can_be_map_domain(self) -> bool {
        matches!(
            self,
            Self::Int32 | Self::Int64 | Self::String | Self::Principal
        )
    }

    pub fn is_orderable(self) -> bool {
        !matches!(
            self,
            Self::Boolean | Self::Dynamic | Self::Vec3 | Self::Label
        )
    }

    /// Index classification: expression turning the native value `value`
    /// (a reference) into the `i32` stored in a table index, or `None` when
    /// the kind can not be indexed.
    pub fn index_expression(self, value: &str) -> Option<String> {
        match self {
            Self::Boolean => Some(format!("i32::from(*{value})")),
            Self::Int32 => Some(format!("*{value}")),
            Self::Int64 => Some(format!("IndexHash::of_i64(*{value})")),
            Self::String | Self::Label => Some(format!("IndexHash::of_str({value})")),
            Self::Principal => Some(format!("IndexHash::of_principal({value})")),
            Self::Date | Self::DateTime | Self::Time => Some(format!("{value}.to_index()")),
            Self::Double | Self::TimeSpan | Self::Dynamic | Self::Vec3 => None,
        }
    }

    pub fn is_indexable(self) -> bool {
        self.index_expression("v").is_some()
    }
}

/// A reactive cell holding one scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactiveScalar {
    #[serde(rename = "scalar")]
    pub kind: ScalarKind,
}

impl ReactiveScalar {
    pub fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }
}

impl ReactiveVariant for ReactiveScalar {
    fn nature(&self) -> &'static str {
        "reactive_value"
    }

    fn behavior(&self) -> TypeBehavior {
        TypeBehavior::ReadWriteWithSetGet
    }

    fn describe(&self) -> String {
        self.kind.type_name().to_string()
    }

    fn typing<'a>(&'a self, _node: &'a TypeNode, _env: &mut Environment<'a>) {}

    fn reflect(&self, _id: NodeId, out: &mut Map<String, Value>, _view: &SchemaView<'_>) {
        out.insert("type".into(), Value::from(self.kind.type_name()));
    }

    fn runtime_type(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        self.kind.runtime_cell().to_string()
    }

    fn native_type(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        self.kind.native_type().to_string()
    }

    fn default_value(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        self.kind.default_value().to_string()
    }

    fn constructor(&self, _id: NodeId, link: &str, _view: &SchemaView<'_>) -> String {
        format!(
            "{}::with_value({link}, {})",
            self.kind.runtime_cell(),
            self.kind.default_value()
        )
    }
}

impl HasDeltaType for ReactiveScalar {
    fn delta_type(&self, _id: NodeId, _view: &SchemaView<'_>) -> String {
        self.kind.delta_type().to_string()
    }
}

impl Orderable for ReactiveScalar {
    fn compare_expression(&self, a: &str, b: &str) -> String {
        match self.kind {
            ScalarKind::Double => format!("{a}.total_cmp(&{b})"),
            _ => format!("{a}.cmp(&{b})"),
        }
    }
}

impl CanBeMapDomain for ReactiveScalar {
    fn domain_key_type(&self) -> &'static str {
        self.kind.native_type()
    }
}
