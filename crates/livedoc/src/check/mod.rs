// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type resolution and checking.
//!
//! Checking is two-phase: every named type is declared into a
//! [`TypeTable`] first, then every body is typed against the complete
//! table. Typing never aborts; each violation becomes a [`DocumentError`]
//! and the pass continues, so one run reports everything.
//!
//! ```
//! use livedoc::check::Checker;
//! use livedoc::types::{StructureStorage, TypeNode};
//!
//! let mut checker = Checker::new(StructureStorage::root());
//! checker.declare_record(StructureStorage::record("Foo").field("name", TypeNode::string()));
//! let checked = checker.check();
//! assert!(!checked.is_deployable());
//! assert!(checked.diagnostics().mentions("must have an 'id' field"));
//! ```

mod dependency;
mod environment;
mod resolution;
mod table;

pub use dependency::DependencyGraph;
pub use environment::{Diagnostics, DocumentError, Environment};
pub use resolution::{Resolution, ResolutionTable, SchemaView};
pub use table::{ResolveError, TypeTable};

use crate::types::{
    member_name_problem, type_name_problem, unusable_name, SourcePosition, StructureStorage,
    TypeNode,
};
use indexmap::IndexSet;

/// Two-phase checker.
pub struct Checker {
    table: TypeTable,
    declaration_errors: Vec<DocumentError>,
}

impl Checker {
    pub fn new(root: StructureStorage) -> Self {
        Self {
            table: TypeTable::new(root),
            declaration_errors: Vec::new(),
        }
    }

    /// Declare a named type (first phase).
    pub fn declare(&mut self, name: impl Into<String>, node: TypeNode) {
        let name = name.into();
        let position = node.position;
        if let Some(problem) = type_name_problem(&name) {
            self.declaration_errors
                .push(DocumentError::new(position, unusable_name("type", &name, problem)));
        }
        if !self.table.declare(name.clone(), node) {
            self.declaration_errors.push(DocumentError::new(
                position,
                format!("The type '{}' is already defined", name),
            ));
        }
    }

    pub fn declare_record(&mut self, storage: StructureStorage) {
        let name = storage.name.clone();
        self.declare(name, TypeNode::record(storage));
    }

    pub fn declare_message(&mut self, storage: StructureStorage) {
        let name = storage.name.clone();
        self.declare(name, TypeNode::message(storage));
    }

    /// Validate the names of embedded tests, which become generated members.
    pub fn declare_tests<'n>(&mut self, names: impl IntoIterator<Item = &'n str>) {
        let mut seen = IndexSet::new();
        for name in names {
            if let Some(problem) = member_name_problem(name) {
                self.declaration_errors.push(DocumentError::new(
                    SourcePosition::default(),
                    unusable_name("test", name, problem),
                ));
            } else if !seen.insert(name) {
                self.declaration_errors.push(DocumentError::new(
                    SourcePosition::default(),
                    format!("The test '{}' is declared more than once", name),
                ));
            }
        }
    }

    /// Type every declaration and the document root (second phase).
    pub fn check(self) -> CheckedSpace {
        let Checker { table, declaration_errors } = self;
        let graph = DependencyGraph::build(&table);
        let (diagnostics, resolutions) = {
            let mut env = Environment::new(&table);
            for error in declaration_errors {
                env.push(error);
            }
            for (_, node) in table.iter() {
                node.typing(&mut env);
            }
            table.root().typing(table.root().position, &mut env);
            for cycle in graph.embedding_cycles() {
                let position = cycle
                    .first()
                    .and_then(|name| table.get(name))
                    .map_or_else(SourcePosition::default, |node| node.position);
                let mut chain = cycle.clone();
                if let Some(first) = cycle.first() {
                    chain.push(first.clone());
                }
                env.error(
                    position,
                    format!(
                        "The records {} embed each other directly and can never be constructed; \
                         store one side in a table, list, map or maybe",
                        chain.join(" -> ")
                    ),
                );
            }
            env.finish()
        };
        log::debug!(
            "[check] {} types, {} resolutions, {} errors",
            table.len(),
            resolutions.len(),
            diagnostics.len()
        );
        CheckedSpace {
            table,
            resolutions,
            diagnostics,
            graph,
        }
    }
}

/// Result of checking: the table, its resolutions and every diagnostic.
///
/// Not `Clone`: copying the table would give every node a fresh identity
/// and detach it from its resolutions.
#[derive(Debug)]
pub struct CheckedSpace {
    table: TypeTable,
    resolutions: ResolutionTable,
    diagnostics: Diagnostics,
    graph: DependencyGraph,
}

impl CheckedSpace {
    pub fn table(&self) -> &TypeTable {
        &self.table
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn is_deployable(&self) -> bool {
        self.diagnostics.is_deployable()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn view(&self) -> SchemaView<'_> {
        SchemaView::new(&self.table, &self.resolutions)
    }
}
