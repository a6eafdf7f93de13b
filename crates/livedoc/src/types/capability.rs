// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Orthogonal type capabilities.
//!
//! Each capability is a separate trait implemented by the variants that
//! support it; [`super::TypeNode`] selects the implementation per variant.

use super::{NodeId, TypeNode};
use crate::check::{Resolution, SchemaView};

/// Signature of a named operation exposed by a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    /// Number of arguments.
    pub arity: usize,
    /// Description of the returned type (`"int"`, `"void"`, ...).
    pub returns: String,
    /// Whether the operation mutates the receiver.
    pub mutates: bool,
}

impl MethodSignature {
    pub fn new(name: &str, arity: usize, returns: &str, mutates: bool) -> Self {
        Self {
            name: name.to_string(),
            arity,
            returns: returns.to_string(),
            mutates,
        }
    }
}

/// Supports named operations (`size`, `append`, `remove`, ...).
pub trait HasMethods {
    fn methods(&self) -> Vec<MethodSignature>;

    fn lookup_method(&self, name: &str) -> Option<MethodSignature> {
        self.methods().into_iter().find(|m| m.name == name)
    }
}

/// Participates in change-diff synchronization.
pub trait HasDeltaType {
    /// Name of the companion delta type in generated code.
    fn delta_type(&self, id: NodeId, view: &SchemaView<'_>) -> String;
}

/// Must be settled after a transaction before it is observed.
pub trait NeedsSettle {
    fn settle_call(&self, field: &str) -> String {
        format!("self.{field}.__settle();")
    }
}

/// Wraps another type.
pub trait ContainsEmbeddedType {
    fn embedded_type(&self) -> &TypeNode;
}

/// Values can be ordered.
pub trait Orderable {
    /// Expression comparing `a` and `b` (both native values) to an `Ordering`.
    fn compare_expression(&self, a: &str, b: &str) -> String;
}

/// Supports deletion.
pub trait Killable {
    fn kill_call(&self, field: &str) -> String {
        format!("self.{field}.__kill();")
    }
}

/// Usable as the key type of a map.
pub trait CanBeMapDomain {
    /// Native key type in generated code.
    fn domain_key_type(&self) -> &'static str;
}

/// Supplies its own resolution when a reference names it.
pub trait SpecialResolve {
    fn special_resolve(&self, name: &str) -> Resolution;
}
