// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typing environment and accumulated diagnostics.

use super::{Resolution, ResolutionTable, TypeTable};
use crate::types::{NodeId, SourcePosition, StructureStorage, TypeNode};
use std::fmt;

/// One typing problem, attached to the offending node's position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{position}: {message}")]
pub struct DocumentError {
    pub message: String,
    pub position: SourcePosition,
}

impl DocumentError {
    pub fn new(position: SourcePosition, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Every problem found in one checking pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    errors: Vec<DocumentError>,
}

impl Diagnostics {
    pub fn push(&mut self, error: DocumentError) {
        self.errors.push(error);
    }

    /// A space with any diagnostic can not be deployed.
    pub fn is_deployable(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentError> {
        self.errors.iter()
    }

    /// Whether any message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.errors.iter().any(|e| e.message.contains(needle))
    }

    pub fn into_errors(self) -> Vec<DocumentError> {
        self.errors
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

/// State threaded through typing.
///
/// Holds the global table, the structure whose fields are being typed, the
/// diagnostics collected so far and the resolution table being built.
pub struct Environment<'a> {
    table: &'a TypeTable,
    scope: Option<&'a StructureStorage>,
    diagnostics: Diagnostics,
    resolutions: ResolutionTable,
}

impl<'a> Environment<'a> {
    pub fn new(table: &'a TypeTable) -> Self {
        Self {
            table,
            scope: None,
            diagnostics: Diagnostics::default(),
            resolutions: ResolutionTable::new(),
        }
    }

    pub fn table(&self) -> &'a TypeTable {
        self.table
    }

    pub fn error(&mut self, position: SourcePosition, message: impl Into<String>) {
        let error = DocumentError::new(position, message);
        log::trace!("[check] {}", error);
        self.diagnostics.push(error);
    }

    pub fn push(&mut self, error: DocumentError) {
        self.diagnostics.push(error);
    }

    /// Structure whose fields are being typed.
    pub fn scope(&self) -> Option<&'a StructureStorage> {
        self.scope
    }

    /// Enter `scope`, returning the previous one for [`Self::leave`].
    pub fn enter(&mut self, scope: &'a StructureStorage) -> Option<&'a StructureStorage> {
        self.scope.replace(scope)
    }

    pub fn leave(&mut self, previous: Option<&'a StructureStorage>) {
        self.scope = previous;
    }

    pub fn record(&mut self, id: NodeId, resolution: Resolution) {
        self.resolutions.insert(id, resolution);
    }

    /// Follow a reference without reporting; problems are reported where
    /// the reference itself is typed.
    pub fn follow(&self, node: &'a TypeNode) -> Option<&'a TypeNode> {
        self.table.follow(node)
    }

    pub fn follow_name(&self, name: &str) -> Option<&'a TypeNode> {
        self.table.follow_name(name)
    }

    /// Resolve `name` to its concrete node, reporting failures at `position`.
    pub fn resolve_name(&mut self, name: &str, position: SourcePosition) -> Option<&'a TypeNode> {
        match self.table.resolve_name(name) {
            Ok(resolution) => self.target_of(&resolution),
            Err(e) => {
                self.error(position, e.to_string());
                None
            }
        }
    }

    /// Resolve a reference node and record the result against its identity.
    /// Non-reference nodes resolve to themselves.
    pub fn resolve(&mut self, node: &'a TypeNode) -> Option<&'a TypeNode> {
        let Some(name) = node.as_reference() else {
            return Some(node);
        };
        match self.table.resolve_name(name) {
            Ok(resolution) => {
                let target = self.target_of(&resolution);
                self.record(node.id(), resolution);
                target
            }
            Err(e) => {
                self.error(node.position, e.to_string());
                None
            }
        }
    }

    fn target_of(&self, resolution: &Resolution) -> Option<&'a TypeNode> {
        match resolution {
            Resolution::Record(name) | Resolution::Message(name) | Resolution::Alias(name) => {
                self.table.get(name)
            }
            Resolution::Projection { .. } => None,
        }
    }

    /// Report when the range type of a container is a table.
    pub fn reject_table_range(
        &mut self,
        range: &'a TypeNode,
        container: &str,
        position: SourcePosition,
    ) {
        if self.follow(range).is_some_and(TypeNode::is_table) {
            self.error(
                position,
                format!(
                    "The range type of a {} must not be a table, but got '{}'",
                    container,
                    range.describe()
                ),
            );
        }
    }

    /// Finish the pass.
    pub fn finish(self) -> (Diagnostics, ResolutionTable) {
        (self.diagnostics, self.resolutions)
    }
}
