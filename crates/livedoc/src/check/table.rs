// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global table of named types.

use super::Resolution;
use crate::types::{StructureStorage, TypeKind, TypeNode};
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

/// Failure to resolve a name against the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No type with this name.
    #[error("The type '{0}' was not found")]
    NotFound(String),
    /// Aliases name each other; carries the chain in order.
    #[error("The alias chain {} forms a cycle", .0.join(" -> "))]
    AliasCycle(Vec<String>),
}

/// Named records, messages and aliases, plus the document root.
///
/// Insertion order is declaration order.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: IndexMap<String, TypeNode>,
    root: StructureStorage,
}

impl TypeTable {
    pub fn new(root: StructureStorage) -> Self {
        Self {
            types: IndexMap::new(),
            root,
        }
    }

    /// Declare a named type. Returns `false` (leaving the first declaration in
    /// place) when the name is already taken.
    pub fn declare(&mut self, name: impl Into<String>, node: TypeNode) -> bool {
        let name = name.into();
        if self.types.contains_key(&name) {
            return false;
        }
        self.types.insert(name, node);
        true
    }

    pub fn get(&self, name: &str) -> Option<&TypeNode> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn root(&self) -> &StructureStorage {
        &self.root
    }

    /// All named types in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeNode)> {
        self.types.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn records(&self) -> impl Iterator<Item = &StructureStorage> {
        self.types.values().filter_map(|t| match &t.kind {
            TypeKind::Record(record) => Some(&record.storage),
            _ => None,
        })
    }

    pub fn messages(&self) -> impl Iterator<Item = &StructureStorage> {
        self.types.values().filter_map(|t| match &t.kind {
            TypeKind::Message(message) => Some(&message.storage),
            _ => None,
        })
    }

    /// Record or message storage by name.
    pub fn structure(&self, name: &str) -> Option<&StructureStorage> {
        match &self.types.get(name)?.kind {
            TypeKind::Record(record) => Some(&record.storage),
            TypeKind::Message(message) => Some(&message.storage),
            _ => None,
        }
    }

    /// Resolve a name, following alias chains.
    ///
    /// Records and messages supply their own resolution. An alias whose
    /// target is another name is followed; an alias to any other type
    /// resolves to itself.
    pub fn resolve_name(&self, name: &str) -> Result<Resolution, ResolveError> {
        let mut chain: IndexSet<&str> = IndexSet::new();
        let mut current = name;
        loop {
            if !chain.insert(current) {
                let mut cycle: Vec<String> = chain.iter().map(|s| s.to_string()).collect();
                cycle.push(current.to_string());
                return Err(ResolveError::AliasCycle(cycle));
            }
            let node = self
                .types
                .get(current)
                .ok_or_else(|| ResolveError::NotFound(current.to_string()))?;
            if let Some(special) = node.as_special_resolve() {
                return Ok(special.special_resolve(current));
            }
            match node.as_reference() {
                Some(next) => current = next,
                None => return Ok(Resolution::Alias(current.to_string())),
            }
        }
    }

    /// Concrete node a name stands for, if it resolves.
    pub fn follow_name(&self, name: &str) -> Option<&TypeNode> {
        match self.resolve_name(name).ok()? {
            Resolution::Record(target) | Resolution::Message(target) | Resolution::Alias(target) => {
                self.types.get(&target)
            }
            Resolution::Projection { .. } => None,
        }
    }

    /// `node` itself, or the node a reference stands for.
    pub fn follow<'n>(&'n self, node: &'n TypeNode) -> Option<&'n TypeNode> {
        match node.as_reference() {
            Some(name) => self.follow_name(name),
            None => Some(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TypeTable {
        let mut table = TypeTable::default();
        table.declare(
            "Foo",
            TypeNode::record(StructureStorage::record("Foo").field("id", TypeNode::int())),
        );
        table.declare("Bar", TypeNode::reference("Foo"));
        table.declare("Baz", TypeNode::reference("Bar"));
        table.declare("Ints", TypeNode::list(TypeNode::int()));
        table.declare("A", TypeNode::reference("B"));
        table.declare("B", TypeNode::reference("A"));
        table
    }

    #[test]
    fn test_declare_rejects_duplicates() {
        let mut table = table();
        assert!(!table.declare("Foo", TypeNode::int()));
        assert_eq!(table.get("Foo").map(TypeNode::nature), Some("reactive_record"));
    }

    #[test]
    fn test_alias_chain_reaches_record() {
        let table = table();
        assert_eq!(
            table.resolve_name("Baz"),
            Ok(Resolution::Record("Foo".into()))
        );
        assert_eq!(
            table.resolve_name("Ints"),
            Ok(Resolution::Alias("Ints".into()))
        );
    }

    #[test]
    fn test_alias_cycle_detected() {
        let table = table();
        match table.resolve_name("A") {
            Err(ResolveError::AliasCycle(chain)) => assert_eq!(chain, ["A", "B", "A"]),
            other => panic!("expected cycle, got {:?}", other),
        }
        assert_eq!(
            table.resolve_name("Nope"),
            Err(ResolveError::NotFound("Nope".into()))
        );
    }

    #[test]
    fn test_resolve_error_messages() {
        let cycle = ResolveError::AliasCycle(vec!["A".into(), "B".into(), "A".into()]);
        assert_eq!(cycle.to_string(), "The alias chain A -> B -> A forms a cycle");
        let missing: Box<dyn std::error::Error> = Box::new(ResolveError::NotFound("Nope".into()));
        assert_eq!(missing.to_string(), "The type 'Nope' was not found");
    }

    #[test]
    fn test_follow_reference() {
        let table = table();
        let node = TypeNode::reference("Baz");
        assert_eq!(table.follow(&node).map(TypeNode::describe).as_deref(), Some("Foo"));
        let plain = TypeNode::int();
        assert!(std::ptr::eq(table.follow(&plain).unwrap(), &plain));
    }
}
