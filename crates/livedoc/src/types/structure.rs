// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structure storage shared by records, messages and the document root.
//!
//! A [`StructureStorage`] is an ordered list of fields plus index and method
//! definitions. Field order is declaration order and is preserved by code
//! generation and reflection.
//!
//! # Example
//!
//! ```
//! use livedoc::types::{StructureStorage, TypeNode};
//!
//! let foo = StructureStorage::record("Foo")
//!     .field("id", TypeNode::int())
//!     .field("name", TypeNode::string())
//!     .index("name");
//! assert_eq!(foo.fields.len(), 2);
//! assert!(foo.lookup("name").is_some());
//! ```

use super::ident::member_name_problem;
use super::{ScalarKind, SourcePosition, TypeKind, TypeNode};
use crate::check::Environment;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the generated document root structure.
pub const ROOT_NAME: &str = "LivingDocument";

/// What a structure is used for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageSpecialization {
    #[default]
    Record,
    Message,
    /// The document itself.
    Root,
}

/// Who may observe a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyPolicy {
    Public,
    #[default]
    Private,
    /// Visible to the principal stored in the named field.
    ViewerIs(String),
    /// Visible when the named custom policy allows it.
    UseCustom(String),
}

impl fmt::Display for PrivacyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Private => f.write_str("private"),
            Self::ViewerIs(field) => write!(f, "viewer_is<{field}>"),
            Self::UseCustom(policy) => write!(f, "use_custom<{policy}>"),
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub node: TypeNode,
    /// Explicit privacy policy; fields are private when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PrivacyPolicy>,
    #[serde(default)]
    pub readonly: bool,
    /// Opaque initial-value expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, rename = "span")]
    pub position: SourcePosition,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, node: TypeNode) -> Self {
        Self {
            name: name.into(),
            node,
            policy: None,
            readonly: false,
            default_value: None,
            position: SourcePosition::default(),
        }
    }

    #[must_use]
    pub fn policy(mut self, policy: PrivacyPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    #[must_use]
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, expression: impl Into<String>) -> Self {
        self.default_value = Some(expression.into());
        self
    }

    #[must_use]
    pub fn at(mut self, position: SourcePosition) -> Self {
        self.position = position;
        self
    }

    /// Policy in effect (private unless stated otherwise).
    pub fn effective_policy(&self) -> PrivacyPolicy {
        self.policy.clone().unwrap_or_default()
    }
}

/// `@index field` on a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub field: String,
    #[serde(default, rename = "span")]
    pub position: SourcePosition,
}

impl IndexDefinition {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            position: SourcePosition::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub node: TypeNode,
}

/// User method on a structure. The body is opaque target source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDefinition {
    pub name: String,
    #[serde(default)]
    pub params: Vec<MethodParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<TypeNode>,
    /// Readonly methods take `&self`.
    #[serde(default)]
    pub readonly: bool,
    pub body: String,
    #[serde(default, rename = "span")]
    pub position: SourcePosition,
}

impl MethodDefinition {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: None,
            readonly: false,
            body: body.into(),
            position: SourcePosition::default(),
        }
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, node: TypeNode) -> Self {
        self.params.push(MethodParameter {
            name: name.into(),
            node,
        });
        self
    }

    #[must_use]
    pub fn returns(mut self, node: TypeNode) -> Self {
        self.returns = Some(node);
        self
    }

    #[must_use]
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

/// `policy name { body }`: a custom visibility rule. The body is opaque
/// target source evaluated with `__who: &NtPrincipal` and yields `bool`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDefinition {
    pub name: String,
    pub body: String,
    #[serde(default, rename = "span")]
    pub position: SourcePosition,
}

/// Ordered fields, indices and methods of one structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureStorage {
    pub name: String,
    #[serde(default)]
    pub specialization: StorageSpecialization,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indices: Vec<IndexDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<PolicyDefinition>,
    #[serde(default, rename = "span")]
    pub position: SourcePosition,
}

impl Default for StructureStorage {
    fn default() -> Self {
        Self::root()
    }
}

impl StructureStorage {
    fn new(name: impl Into<String>, specialization: StorageSpecialization) -> Self {
        Self {
            name: name.into(),
            specialization,
            fields: Vec::new(),
            indices: Vec::new(),
            methods: Vec::new(),
            policies: Vec::new(),
            position: SourcePosition::default(),
        }
    }

    pub fn record(name: impl Into<String>) -> Self {
        Self::new(name, StorageSpecialization::Record)
    }

    pub fn message(name: impl Into<String>) -> Self {
        Self::new(name, StorageSpecialization::Message)
    }

    pub fn root() -> Self {
        Self::new(ROOT_NAME, StorageSpecialization::Root)
    }

    /// Add a field (builder style).
    #[must_use]
    pub fn field(self, name: impl Into<String>, node: TypeNode) -> Self {
        self.with_field(FieldDefinition::new(name, node))
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn index(mut self, field: impl Into<String>) -> Self {
        self.indices.push(IndexDefinition::new(field));
        self
    }

    #[must_use]
    pub fn method(mut self, method: MethodDefinition) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a custom visibility policy for `use_custom<name>` fields.
    #[must_use]
    pub fn custom_policy(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.policies.push(PolicyDefinition {
            name: name.into(),
            body: body.into(),
            position: SourcePosition::default(),
        });
        self
    }

    #[must_use]
    pub fn at(mut self, position: SourcePosition) -> Self {
        self.position = position;
        self
    }

    /// Look a field up by name.
    pub fn lookup(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Type every field, index and method, with this structure as scope.
    ///
    /// `position` is the position of the declaring node; structural errors
    /// (such as a missing `id`) are attached to it.
    pub fn typing<'a>(&'a self, position: SourcePosition, env: &mut Environment<'a>) {
        let outer = env.enter(self);
        let mut seen = IndexSet::new();
        for field in &self.fields {
            if let Some(problem) = member_name_problem(&field.name) {
                bad_name(env, field.position, "field", &field.name, problem);
            }
            if !seen.insert(field.name.as_str()) {
                env.error(
                    field.position,
                    format!(
                        "The field '{}' is declared more than once in '{}'",
                        field.name, self.name
                    ),
                );
            }
            field.node.typing(env);
            self.check_field(field, env);
        }
        if self.specialization == StorageSpecialization::Record {
            self.check_identity(position, env);
        }
        for index in &self.indices {
            self.check_index(index, env);
        }
        let mut methods = IndexSet::new();
        for method in &self.methods {
            if let Some(problem) = member_name_problem(&method.name) {
                bad_name(env, method.position, "method", &method.name, problem);
            }
            for param in &method.params {
                if let Some(problem) = member_name_problem(&param.name) {
                    bad_name(env, method.position, "parameter", &param.name, problem);
                }
            }
            if seen.contains(method.name.as_str()) {
                env.error(
                    method.position,
                    format!(
                        "The method '{}' collides with a field of '{}'",
                        method.name, self.name
                    ),
                );
            }
            if !methods.insert(method.name.as_str()) {
                env.error(
                    method.position,
                    format!(
                        "The method '{}' is declared more than once in '{}'",
                        method.name, self.name
                    ),
                );
            }
            for param in &method.params {
                param.node.typing(env);
            }
            if let Some(returns) = &method.returns {
                returns.typing(env);
            }
        }
        for policy in &self.policies {
            if let Some(problem) = member_name_problem(&policy.name) {
                bad_name(env, policy.position, "policy", &policy.name, problem);
            }
        }
        env.leave(outer);
    }

    fn check_field<'a>(&'a self, field: &'a FieldDefinition, env: &mut Environment<'a>) {
        if field.policy.is_some() && env.follow(&field.node).is_some_and(TypeNode::is_table) {
            env.error(
                field.position,
                format!(
                    "Tables are private by default; the privacy policy on '{}' is not allowed",
                    field.name
                ),
            );
        }
        if matches!(field.node.kind, TypeKind::Projection(_))
            && (field.readonly || field.policy.is_some())
        {
            env.error(
                field.position,
                format!(
                    "The projection '{}' is implicitly readonly and private; it can not be marked readonly or carry a privacy policy",
                    field.name
                ),
            );
        }
        match &field.policy {
            Some(PrivacyPolicy::ViewerIs(owner)) => {
                let principal = self
                    .lookup(owner)
                    .and_then(|f| env.follow(&f.node))
                    .and_then(TypeNode::as_scalar)
                    == Some(ScalarKind::Principal);
                if !principal {
                    env.error(
                        field.position,
                        format!(
                            "The policy viewer_is<{}> on '{}' must name a principal field of '{}'",
                            owner, field.name, self.name
                        ),
                    );
                }
            }
            Some(PrivacyPolicy::UseCustom(policy))
                if !self.policies.iter().any(|p| &p.name == policy) =>
            {
                env.error(
                    field.position,
                    format!(
                        "The policy '{}' used by '{}' was not found on '{}'",
                        policy, field.name, self.name
                    ),
                );
            }
            _ => {}
        }
        if self.specialization == StorageSpecialization::Message
            && !message_compatible(&field.node)
        {
            env.error(
                field.position,
                format!(
                    "The field '{}' of message '{}' has type '{}', which can not be stored in a message",
                    field.name,
                    self.name,
                    field.node.describe()
                ),
            );
        }
    }

    fn check_identity<'a>(&'a self, position: SourcePosition, env: &mut Environment<'a>) {
        let Some(id) = self.lookup("id") else {
            env.error(
                position,
                format!("Record '{}' must have an 'id' field of type int", self.name),
            );
            return;
        };
        let kind = env.follow(&id.node).and_then(TypeNode::as_scalar);
        if kind != Some(ScalarKind::Int32) {
            env.error(
                position,
                format!(
                    "Record '{}' has an 'id' field of type '{}'; it must be int",
                    self.name,
                    id.node.describe()
                ),
            );
        }
    }

    fn check_index<'a>(&'a self, index: &'a IndexDefinition, env: &mut Environment<'a>) {
        let Some(field) = self.lookup(&index.field) else {
            env.error(
                index.position,
                format!(
                    "The index field '{}' was not found on '{}'",
                    index.field, self.name
                ),
            );
            return;
        };
        let indexable = env
            .follow(&field.node)
            .and_then(TypeNode::as_scalar)
            .is_some_and(ScalarKind::is_indexable);
        if !indexable {
            env.error(
                index.position,
                format!(
                    "The field '{}' of type '{}' can not be indexed",
                    index.field,
                    field.node.describe()
                ),
            );
        }
    }
}

/// Whether `node` may appear inside a message. References are checked when
/// they resolve.
fn message_compatible(node: &TypeNode) -> bool {
    match &node.kind {
        TypeKind::Scalar(_) | TypeKind::Message(_) | TypeKind::Ref(_) => true,
        TypeKind::List(list) => message_compatible(&list.element),
        TypeKind::Maybe(maybe) => message_compatible(&maybe.inner),
        _ => false,
    }
}

/// Diagnostic for a name that can not be emitted into generated source.
pub(crate) fn unusable_name(what: &str, name: &str, problem: &str) -> String {
    format!("The {what} name '{name}' can not be used: {problem}")
}

fn bad_name(
    env: &mut Environment<'_>,
    position: SourcePosition,
    what: &str,
    name: &str,
    problem: &str,
) {
    env.error(position, unusable_name(what, name, problem));
}
