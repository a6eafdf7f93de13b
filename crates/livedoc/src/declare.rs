// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declarations of one space, as produced by a front end.
//!
//! The JSON form mirrors the builder API:
//!
//! ```json
//! {
//!   "space": "shop",
//!   "records": [{"name": "Item", "fields": [{"name": "id", "type": {"kind": "scalar", "scalar": "int"}}]}],
//!   "messages": [],
//!   "aliases": {"Row": {"kind": "ref", "name": "Item"}},
//!   "root": {"name": "LivingDocument", "fields": [{"name": "items", "type": {"kind": "table", "record": "Item"}}]},
//!   "document": {"config": {"maximum_history": 50}}
//! }
//! ```

use crate::check::{CheckedSpace, Checker};
use crate::codegen::DocumentSurface;
use crate::types::{StorageSpecialization, StructureStorage, TypeNode, ROOT_NAME};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeclareError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything declared for one space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceDeclarations {
    pub space: String,
    #[serde(default)]
    pub records: Vec<StructureStorage>,
    #[serde(default)]
    pub messages: Vec<StructureStorage>,
    /// Named aliases of other types.
    #[serde(default)]
    pub aliases: IndexMap<String, TypeNode>,
    #[serde(default)]
    pub root: StructureStorage,
    #[serde(default)]
    pub document: DocumentSurface,
}

impl SpaceDeclarations {
    pub fn new(space: impl Into<String>) -> Self {
        Self {
            space: space.into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, DeclareError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DeclareError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    #[must_use]
    pub fn record(mut self, record: StructureStorage) -> Self {
        self.records.push(record);
        self
    }

    #[must_use]
    pub fn message(mut self, message: StructureStorage) -> Self {
        self.messages.push(message);
        self
    }

    #[must_use]
    pub fn alias(mut self, name: impl Into<String>, node: TypeNode) -> Self {
        self.aliases.insert(name.into(), node);
        self
    }

    #[must_use]
    pub fn root(mut self, root: StructureStorage) -> Self {
        self.root = root;
        self
    }

    #[must_use]
    pub fn document(mut self, document: DocumentSurface) -> Self {
        self.document = document;
        self
    }

    /// First phase: a checker with every name declared. Specializations
    /// follow the list a structure was declared in.
    pub fn checker(&self) -> Checker {
        let mut root = self.root.clone();
        root.name = ROOT_NAME.to_string();
        root.specialization = StorageSpecialization::Root;

        let mut checker = Checker::new(root);
        for record in &self.records {
            let mut record = record.clone();
            record.specialization = StorageSpecialization::Record;
            checker.declare_record(record);
        }
        for message in &self.messages {
            let mut message = message.clone();
            message.specialization = StorageSpecialization::Message;
            checker.declare_message(message);
        }
        for (name, node) in &self.aliases {
            checker.declare(name.clone(), node.clone());
        }
        checker.declare_tests(self.document.tests.iter().map(|t| t.name.as_str()));
        checker
    }

    /// Both phases.
    pub fn check(&self) -> CheckedSpace {
        self.checker().check()
    }

    /// Crate name of this space's unit.
    pub fn unit_name(&self) -> String {
        let sanitized: String = self
            .space
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        format!("livedoc_{sanitized}")
    }
}
