// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Resolution results, kept outside the type nodes.

use super::TypeTable;
use crate::types::{FieldDefinition, NodeId, ScalarKind, StructureStorage, TypeNode};
use std::collections::HashMap;

/// What a name (or a scope-dependent node) resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Record(String),
    Message(String),
    /// A named alias whose target is not itself a name.
    Alias(String),
    /// A projection map grouped by a field of `record`, reached through the
    /// table variable `table`.
    Projection {
        table: String,
        record: String,
        domain: ScalarKind,
    },
}

/// Resolutions keyed by node identity.
#[derive(Debug, Clone, Default)]
pub struct ResolutionTable {
    entries: HashMap<NodeId, Resolution>,
}

impl ResolutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolution. Resolving the same node twice yields the same
    /// value, so a later entry simply replaces the earlier one.
    pub fn insert(&mut self, id: NodeId, resolution: Resolution) {
        self.entries.insert(id, resolution);
    }

    pub fn get(&self, id: NodeId) -> Option<&Resolution> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-only view over a checked type graph, used by code generation and
/// reflection.
#[derive(Debug, Clone, Copy)]
pub struct SchemaView<'a> {
    table: &'a TypeTable,
    resolutions: &'a ResolutionTable,
}

impl<'a> SchemaView<'a> {
    pub fn new(table: &'a TypeTable, resolutions: &'a ResolutionTable) -> Self {
        Self { table, resolutions }
    }

    pub fn table(&self) -> &'a TypeTable {
        self.table
    }

    pub fn resolution(&self, id: NodeId) -> Option<&'a Resolution> {
        self.resolutions.get(id)
    }

    /// Named type, without following aliases.
    pub fn lookup(&self, name: &str) -> Option<&'a TypeNode> {
        self.table.get(name)
    }

    pub fn follow_name(&self, name: &str) -> Option<&'a TypeNode> {
        self.table.follow_name(name)
    }

    /// `node` itself, or the concrete node a reference stands for.
    pub fn follow<'n>(&self, node: &'n TypeNode) -> Option<&'n TypeNode>
    where
        'a: 'n,
    {
        match node.as_reference() {
            Some(name) => self.follow_name(name),
            None => Some(node),
        }
    }

    pub fn structure(&self, name: &str) -> Option<&'a StructureStorage> {
        self.table.structure(name)
    }

    pub fn root(&self) -> &'a StructureStorage {
        self.table.root()
    }

    /// Field of the document root.
    pub fn root_field(&self, name: &str) -> Option<&'a FieldDefinition> {
        self.table.root().lookup(name)
    }
}
