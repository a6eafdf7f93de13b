// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record dependency graph.
//!
//! Each record projects to the set of record names its fields reference,
//! through any container. References that go through an indirection (table,
//! list, map, maybe, lazy) may form cycles; references made only of direct
//! embeddings may not, since such a record could never be constructed.
//!
//! Components are computed with Tarjan's algorithm, which emits each
//! strongly connected component after every component it depends on; the
//! flattened component list is therefore a dependency-first ordering.

use super::TypeTable;
use crate::types::{TypeKind, TypeNode};
use indexmap::{IndexMap, IndexSet};

/// Record name -> directly referenced record names.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: IndexMap<String, IndexSet<String>>,
    /// Subset of `edges` made of direct embeddings.
    embedded: IndexMap<String, IndexSet<String>>,
}

impl DependencyGraph {
    /// Project every record of `table`.
    pub fn build(table: &TypeTable) -> Self {
        let mut graph = Self::default();
        for record in table.records() {
            let mut edges = IndexSet::new();
            let mut embedded = IndexSet::new();
            for field in &record.fields {
                let mut aliases = IndexSet::new();
                walk(table, &field.node, true, &mut aliases, &mut edges, &mut embedded);
            }
            graph.edges.insert(record.name.clone(), edges);
            graph.embedded.insert(record.name.clone(), embedded);
        }
        graph
    }

    /// Records referenced by `record`.
    pub fn dependencies(&self, record: &str) -> Option<&IndexSet<String>> {
        self.edges.get(record)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Strongly connected components, dependencies first.
    pub fn components(&self) -> Vec<Vec<String>> {
        tarjan(&self.edges)
    }

    /// Records in dependency-first order.
    pub fn ordering(&self) -> Vec<String> {
        self.components().into_iter().flatten().collect()
    }

    /// Cycles made only of direct embeddings.
    pub fn embedding_cycles(&self) -> Vec<Vec<String>> {
        tarjan(&self.embedded)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => self
                    .embedded
                    .get(single)
                    .is_some_and(|targets| targets.contains(single)),
                _ => true,
            })
            .collect()
    }
}

fn walk(
    table: &TypeTable,
    node: &TypeNode,
    direct: bool,
    aliases: &mut IndexSet<String>,
    edges: &mut IndexSet<String>,
    embedded: &mut IndexSet<String>,
) {
    match &node.kind {
        TypeKind::Ref(reference) => {
            let Some(target) = table.follow_name(&reference.name) else {
                return;
            };
            match &target.kind {
                TypeKind::Record(record) => {
                    edges.insert(record.storage.name.clone());
                    if direct {
                        embedded.insert(record.storage.name.clone());
                    }
                }
                TypeKind::Message(_) => {}
                _ => {
                    // alias to a container; guard against alias loops
                    if aliases.insert(reference.name.clone()) {
                        walk(table, target, direct, aliases, edges, embedded);
                    }
                }
            }
        }
        TypeKind::Record(record) => {
            edges.insert(record.storage.name.clone());
            if direct {
                embedded.insert(record.storage.name.clone());
            }
        }
        TypeKind::Table(t) => {
            let target = table.follow_name(&t.record_name).map(|n| &n.kind);
            if let Some(TypeKind::Record(record)) = target {
                edges.insert(record.storage.name.clone());
            }
        }
        _ => {
            if let Some(container) = node.as_contains_embedded() {
                walk(table, container.embedded_type(), false, aliases, edges, embedded);
            }
        }
    }
}

/// Tarjan's strongly connected components over `edges`. Targets that are not
/// keys are ignored.
fn tarjan(edges: &IndexMap<String, IndexSet<String>>) -> Vec<Vec<String>> {
    struct State<'g> {
        edges: &'g IndexMap<String, IndexSet<String>>,
        index: usize,
        indices: IndexMap<&'g str, usize>,
        lowlink: IndexMap<&'g str, usize>,
        stack: Vec<&'g str>,
        on_stack: IndexSet<&'g str>,
        components: Vec<Vec<String>>,
    }

    fn connect<'g>(state: &mut State<'g>, node: &'g str) {
        state.indices.insert(node, state.index);
        state.lowlink.insert(node, state.index);
        state.index += 1;
        state.stack.push(node);
        state.on_stack.insert(node);

        let edges = state.edges;
        if let Some(targets) = edges.get(node) {
            for target in targets {
                let Some((target, _)) = edges.get_key_value(target.as_str()) else {
                    continue;
                };
                let target = target.as_str();
                if !state.indices.contains_key(target) {
                    connect(state, target);
                    let low = state.lowlink[target].min(state.lowlink[node]);
                    state.lowlink.insert(node, low);
                } else if state.on_stack.contains(target) {
                    let low = state.indices[target].min(state.lowlink[node]);
                    state.lowlink.insert(node, low);
                }
            }
        }

        if state.lowlink[node] == state.indices[node] {
            let mut component = Vec::new();
            while let Some(member) = state.stack.pop() {
                state.on_stack.swap_remove(member);
                component.push(member.to_string());
                if member == node {
                    break;
                }
            }
            component.reverse();
            state.components.push(component);
        }
    }

    let mut state = State {
        edges,
        index: 0,
        indices: IndexMap::new(),
        lowlink: IndexMap::new(),
        stack: Vec::new(),
        on_stack: IndexSet::new(),
        components: Vec::new(),
    };
    for node in edges.keys() {
        if !state.indices.contains_key(node.as_str()) {
            connect(&mut state, node.as_str());
        }
    }
    state.components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StructureStorage;

    fn record(name: &str) -> StructureStorage {
        StructureStorage::record(name).field("id", TypeNode::int())
    }

    fn declare(table: &mut TypeTable, storage: StructureStorage) {
        let name = storage.name.clone();
        table.declare(name, TypeNode::record(storage));
    }

    #[test]
    fn test_ordering_is_dependency_first() {
        let mut table = TypeTable::default();
        declare(&mut table, record("A").field("b", TypeNode::reference("B")));
        declare(&mut table, record("B").field("c", TypeNode::table("C")));
        declare(&mut table, record("C"));
        let graph = DependencyGraph::build(&table);
        assert_eq!(graph.ordering(), ["C", "B", "A"]);
        assert!(graph.embedding_cycles().is_empty());
    }

    #[test]
    fn test_cycle_through_table_is_allowed() {
        let mut table = TypeTable::default();
        declare(&mut table, record("Node").field("children", TypeNode::table("Node")));
        declare(&mut table, record("A").field("b", TypeNode::maybe(TypeNode::reference("B"))));
        declare(&mut table, record("B").field("a", TypeNode::list(TypeNode::reference("A"))));
        let graph = DependencyGraph::build(&table);
        assert!(graph.embedding_cycles().is_empty());
        let components = graph.components();
        assert!(components.contains(&vec!["A".to_string(), "B".to_string()]));
    }

    #[test]
    fn test_embedding_cycle_is_reported() {
        let mut table = TypeTable::default();
        declare(&mut table, record("A").field("b", TypeNode::reference("B")));
        declare(&mut table, record("B").field("a", TypeNode::reference("A")));
        declare(&mut table, record("Me").field("me", TypeNode::reference("Me")));
        let graph = DependencyGraph::build(&table);
        let cycles = graph.embedding_cycles();
        assert_eq!(cycles.len(), 2);
        assert!(cycles.contains(&vec!["Me".to_string()]));
    }
}
