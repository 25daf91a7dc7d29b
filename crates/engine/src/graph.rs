// Retrace - Trace Replay Debugger
// Copyright (C) 2026 The Retrace contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Heap reachability graph, built breadth-first from stack and static
//! roots.
//!
//! The graph is an arena of nodes indexed by [`NodeId`]. Children are the
//! only ownership edges; parent links store ids, so multi-parent and
//! cyclic object graphs (self-references, mutual references) come out as
//! back-edges instead of duplicated subtrees. Every heap item id maps to
//! exactly one node regardless of how many references point at it, which
//! is also what guarantees termination on cyclic heaps.

use std::collections::{HashMap, VecDeque};

use retrace_common::types::{ArrayElement, HeapId, HeapItem, Snapshot, Value, Var};

/// Index of a node within a [`HeapGraph`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// What a graph node stands for
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    /// The synthetic root above all statics and stack variables
    Root,
    /// A named variable slot: stack local, static field, or object field
    Variable(Var),
    /// An array slot
    Element(ArrayElement),
    /// A resolved heap item; look it up in the snapshot by id
    Item(HeapId),
    /// A reference whose target id is absent from the heap. Tolerated,
    /// not an error; renderers decide how to show it.
    Dangling(HeapId),
}

/// One node of the reachability graph
#[derive(Debug, Clone)]
pub struct HeapNode {
    /// What the node stands for
    pub content: NodeContent,
    /// Display name: variable name, element text, or char for string slots
    pub name: String,
    /// Distance from the root (root 0, variable seeds 1, heap items 2+)
    pub depth: usize,
    /// Non-owning back references to every node pointing here
    pub parents: Vec<NodeId>,
    /// Owned children in traversal order
    pub children: Vec<NodeId>,
    /// For stack seeds: logical frame number, outermost frame always 0
    pub stack_frame_depth: Option<usize>,
    /// For static seeds: the declaring class
    pub class_name: Option<String>,
}

/// The reachability graph of one snapshot
#[derive(Debug, Clone)]
pub struct HeapGraph {
    nodes: Vec<HeapNode>,
    heap_nodes: Vec<NodeId>,
    id_map: HashMap<HeapId, NodeId>,
}

impl HeapGraph {
    /// Id of the synthetic root node
    pub const ROOT: NodeId = NodeId(0);

    /// The synthetic root node
    pub fn root(&self) -> &HeapNode {
        &self.nodes[0]
    }

    /// Node by arena id
    pub fn node(&self, id: NodeId) -> &HeapNode {
        &self.nodes[id.0]
    }

    /// All nodes, root first
    pub fn nodes(&self) -> &[HeapNode] {
        &self.nodes
    }

    /// Flat set of all reachable heap nodes (everything below the
    /// variable seeds), in discovery order
    pub fn heap_nodes(&self) -> &[NodeId] {
        &self.heap_nodes
    }

    /// The unique node representing the given heap item id, if reachable
    pub fn node_for_item(&self, id: HeapId) -> Option<NodeId> {
        self.id_map.get(&id).copied()
    }

    /// Total number of nodes including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds only the root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

struct GraphBuilder<'a> {
    snapshot: &'a Snapshot,
    nodes: Vec<HeapNode>,
    id_map: HashMap<HeapId, NodeId>,
    queue: VecDeque<NodeId>,
}

/// Build the reachable-object graph of a snapshot.
///
/// Seeds are the static fields of every loaded class followed by the
/// local variables of every stack frame; frames are logically renumbered
/// so the outermost frame is depth 0, keeping node identifiers stable
/// while leaf frames come and go. With `only_innermost` set, stack
/// seeding is restricted to the innermost frame (single-method scope
/// rendering); statics are seeded either way.
///
/// Pure function of the snapshot: no side effects, and dangling
/// references come back as [`NodeContent::Dangling`] nodes.
pub fn build_heap_graph(snapshot: &Snapshot, only_innermost: bool) -> HeapGraph {
    let mut builder = GraphBuilder {
        snapshot,
        nodes: vec![HeapNode {
            content: NodeContent::Root,
            name: "root".into(),
            depth: 0,
            parents: Vec::new(),
            children: Vec::new(),
            stack_frame_depth: None,
            class_name: None,
        }],
        id_map: HashMap::new(),
        queue: VecDeque::new(),
    };

    builder.seed_statics();
    builder.seed_stack(only_innermost);
    builder.expand_queue();

    let heap_nodes = builder
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.depth >= 2)
        .map(|(idx, _)| NodeId(idx))
        .collect();

    HeapGraph { nodes: builder.nodes, heap_nodes, id_map: builder.id_map }
}

impl GraphBuilder<'_> {
    fn seed_statics(&mut self) {
        for class in &self.snapshot.loaded_classes {
            for field in &class.static_fields {
                self.seed_var(field, None, Some(class.class_name.clone()));
            }
        }
    }

    fn seed_stack(&mut self, only_innermost: bool) {
        let frames = &self.snapshot.stack;
        let start = if only_innermost { 0 } else { frames.len().saturating_sub(1) };
        // Physical order is innermost-first; walk outermost-first so the
        // logical frame number of main() is always 0.
        for physical in (0..=start).rev().filter(|i| *i < frames.len()) {
            let logical = frames.len() - 1 - physical;
            for var in &frames[physical].local_variables {
                self.seed_var(var, Some(logical), None);
            }
        }
    }

    /// Add a root-level variable node, and the node of its reference
    /// target where it has one
    fn seed_var(
        &mut self,
        var: &Var,
        stack_frame_depth: Option<usize>,
        class_name: Option<String>,
    ) {
        let var_node = self.push_node(HeapNode {
            content: NodeContent::Variable(var.clone()),
            name: var.name.clone(),
            depth: 1,
            parents: vec![HeapGraph::ROOT],
            children: Vec::new(),
            stack_frame_depth,
            class_name,
        });
        self.nodes[HeapGraph::ROOT.0].children.push(var_node);

        if let Some(id) = var.value.as_reference() {
            let target = self.item_node(id, &var.name, 2, var_node);
            self.nodes[var_node.0].children.push(target);
        }
    }

    /// Node for a referenced heap item: reuse and re-parent if the id is
    /// already mapped, otherwise create, map, and enqueue
    fn item_node(&mut self, id: HeapId, name: &str, depth: usize, parent: NodeId) -> NodeId {
        if let Some(&existing) = self.id_map.get(&id) {
            self.nodes[existing.0].parents.push(parent);
            return existing;
        }
        let content = if self.snapshot.find_heap_item(id).is_some() {
            NodeContent::Item(id)
        } else {
            NodeContent::Dangling(id)
        };
        let node = self.push_node(HeapNode {
            content,
            name: name.to_string(),
            depth,
            parents: vec![parent],
            children: Vec::new(),
            stack_frame_depth: None,
            class_name: None,
        });
        self.id_map.insert(id, node);
        self.queue.push_back(node);
        node
    }

    fn expand_queue(&mut self) {
        // The snapshot reference outlives the builder's own borrows, so
        // item data can be walked while the arena grows.
        let snapshot = self.snapshot;
        while let Some(node) = self.queue.pop_front() {
            let NodeContent::Item(id) = self.nodes[node.0].content else {
                continue;
            };
            let Some(item) = snapshot.find_heap_item(id) else {
                continue;
            };
            match item {
                HeapItem::Object(object) => {
                    for field in &object.fields {
                        self.expand_var_child(node, field);
                    }
                }
                HeapItem::Array(array) => {
                    for element in &array.elements {
                        self.expand_element_child(node, element, false);
                    }
                }
                HeapItem::Str(string) => {
                    // A string's children are the slots of its backing
                    // char array; the array item itself stays hidden.
                    let Some(backing) = string.char_arr.value.as_reference() else {
                        continue;
                    };
                    if let Some(HeapItem::Array(array)) = snapshot.find_heap_item(backing) {
                        for element in &array.elements {
                            self.expand_element_child(node, element, true);
                        }
                    }
                }
            }
        }
    }

    fn expand_var_child(&mut self, parent: NodeId, field: &Var) {
        let child = match field.value.as_reference() {
            Some(id) => {
                let depth = self.nodes[parent.0].depth + 1;
                self.item_node(id, &field.name, depth, parent)
            }
            None => {
                let depth = self.nodes[parent.0].depth + 1;
                self.push_node(HeapNode {
                    content: NodeContent::Variable(field.clone()),
                    name: field.name.clone(),
                    depth,
                    parents: vec![parent],
                    children: Vec::new(),
                    stack_frame_depth: None,
                    class_name: None,
                })
            }
        };
        self.nodes[parent.0].children.push(child);
    }

    fn expand_element_child(&mut self, parent: NodeId, element: &ArrayElement, as_char: bool) {
        let child = match element.value.as_reference() {
            Some(id) => {
                let depth = self.nodes[parent.0].depth + 1;
                let name = format!("[{}]", element.index);
                self.item_node(id, &name, depth, parent)
            }
            None => {
                let name = element_name(element, as_char);
                let depth = self.nodes[parent.0].depth + 1;
                self.push_node(HeapNode {
                    content: NodeContent::Element(element.clone()),
                    name,
                    depth,
                    parents: vec![parent],
                    children: Vec::new(),
                    stack_frame_depth: None,
                    class_name: None,
                })
            }
        };
        self.nodes[parent.0].children.push(child);
    }

    fn push_node(&mut self, node: HeapNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }
}

/// Display name of a primitive array slot: the slot text, or the decoded
/// character for string backing arrays (engines report chars as codes)
fn element_name(element: &ArrayElement, as_char: bool) -> String {
    match &element.value {
        Value::Primitive { primitive_value, .. } if as_char => primitive_value
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| primitive_value.clone()),
        Value::Primitive { primitive_value, .. } => primitive_value.clone(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SnapshotBuilder;
    use retrace_common::types::Value;

    #[test]
    fn test_mutual_cycle_yields_two_nodes_with_mutual_parents() {
        // a -> A, A.other -> B, B.other -> A
        let snapshot = SnapshotBuilder::new("Main", 5)
            .local("a", "Node", Value::reference(1u64))
            .object_with_fields(1, "Node", vec![("other", "Node", Value::reference(2u64))])
            .object_with_fields(2, "Node", vec![("other", "Node", Value::reference(1u64))])
            .build();

        let graph = build_heap_graph(&snapshot, false);

        let node_a = graph.node_for_item(HeapId(1)).unwrap();
        let node_b = graph.node_for_item(HeapId(2)).unwrap();
        assert_eq!(graph.heap_nodes().len(), 2);

        assert_eq!(graph.node(node_a).children, vec![node_b]);
        assert_eq!(graph.node(node_b).children, vec![node_a]);
        assert!(graph.node(node_a).parents.contains(&node_b));
        assert!(graph.node(node_b).parents.contains(&node_a));
    }

    #[test]
    fn test_one_node_per_id_with_many_referrers() {
        let snapshot = SnapshotBuilder::new("Main", 5)
            .local("x", "int[]", Value::reference(7u64))
            .local("y", "int[]", Value::reference(7u64))
            .local("z", "int[]", Value::reference(7u64))
            .int_array(7, &[1, 2])
            .build();

        let graph = build_heap_graph(&snapshot, false);
        let array = graph.node_for_item(HeapId(7)).unwrap();
        assert_eq!(graph.node(array).parents.len(), 3);
        // array node + its two element nodes
        assert_eq!(graph.heap_nodes().len(), 3);
    }

    #[test]
    fn test_self_reference_terminates() {
        let snapshot = SnapshotBuilder::new("Main", 5)
            .local("selfish", "Node", Value::reference(4u64))
            .object_with_fields(4, "Node", vec![("me", "Node", Value::reference(4u64))])
            .build();

        let graph = build_heap_graph(&snapshot, false);
        let node = graph.node_for_item(HeapId(4)).unwrap();
        assert_eq!(graph.node(node).children, vec![node]);
        assert!(graph.node(node).parents.contains(&node));
    }

    #[test]
    fn test_dangling_reference_is_unresolved_not_error() {
        let snapshot = SnapshotBuilder::new("Main", 5)
            .local("gone", "Object", Value::reference(99u64))
            .build();

        let graph = build_heap_graph(&snapshot, false);
        let node = graph.node_for_item(HeapId(99)).unwrap();
        assert_eq!(graph.node(node).content, NodeContent::Dangling(HeapId(99)));
        assert!(graph.node(node).children.is_empty());
    }

    #[test]
    fn test_outermost_frame_is_logical_depth_zero() {
        let snapshot = SnapshotBuilder::new("Main", 3)
            .local("rooted", "int", Value::primitive("1"))
            .push_frame("Main", "helper", 9)
            .local("leaf", "int", Value::primitive("2"))
            .build();

        let graph = build_heap_graph(&snapshot, false);
        let depths: Vec<(String, Option<usize>)> = graph
            .root()
            .children
            .iter()
            .map(|&c| (graph.node(c).name.clone(), graph.node(c).stack_frame_depth))
            .collect();
        assert!(depths.contains(&("rooted".to_string(), Some(0))));
        assert!(depths.contains(&("leaf".to_string(), Some(1))));
    }

    #[test]
    fn test_only_innermost_restricts_stack_seeds() {
        let snapshot = SnapshotBuilder::new("Main", 3)
            .local("outer", "int", Value::primitive("1"))
            .push_frame("Main", "helper", 9)
            .local("inner", "int", Value::primitive("2"))
            .build();

        let graph = build_heap_graph(&snapshot, true);
        let names: Vec<&str> =
            graph.root().children.iter().map(|&c| graph.node(c).name.as_str()).collect();
        assert!(names.contains(&"inner"));
        assert!(!names.contains(&"outer"));
    }

    #[test]
    fn test_string_expands_backing_char_array() {
        let snapshot = SnapshotBuilder::new("Main", 3)
            .local("s", "String", Value::reference(10u64))
            .string(10, "hi", 11)
            .build();

        let graph = build_heap_graph(&snapshot, false);
        let string_node = graph.node_for_item(HeapId(10)).unwrap();
        let children: Vec<&str> = graph
            .node(string_node)
            .children
            .iter()
            .map(|&c| graph.node(c).name.as_str())
            .collect();
        assert_eq!(children, vec!["h", "i"]);
    }
}
