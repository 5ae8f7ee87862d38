//! The taxonomy store: a flat arena of typed target nodes with explicit
//! subclass edges.
//!
//! Node names are unique within the store regardless of kind; every creation
//! funnels through [`TaxonomyStore::create_or_get`] so the invariant cannot
//! be bypassed. Subclass edges are an explicit parent set per node, and
//! adding an existing edge is a no-op rather than an error.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::{NodeKind, SourceDb};
use crate::normalize::normalize_name;

/// Handle to a node in the arena. Stable for the lifetime of the store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyNode {
    pub name: String,
    pub kind: NodeKind,
    pub parents: BTreeSet<NodeId>,
    pub is_drug_combination: bool,
    pub symbol: Option<String>,
    pub comment: Option<String>,
    pub found_in: BTreeSet<SourceDb>,
}

impl TaxonomyNode {
    fn new(kind: NodeKind, name: String) -> Self {
        Self {
            name,
            kind,
            parents: BTreeSet::new(),
            is_drug_combination: false,
            symbol: None,
            comment: None,
            found_in: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyStore {
    nodes: Vec<TaxonomyNode>,
    // Derived from `nodes`; rebuilt after deserialization.
    #[serde(skip)]
    by_name: HashMap<String, NodeId>,
}

impl TaxonomyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Creates a node under the normalized name, or returns the existing one.
    /// Lookup is by name only: if a node with the same normalized name
    /// already exists its kind is left untouched, whatever kind was asked
    /// for.
    pub fn create_or_get(&mut self, kind: NodeKind, name: &str) -> NodeId {
        let key = normalize_name(name);
        if let Some(id) = self.by_name.get(&key) {
            return *id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(TaxonomyNode::new(kind, key.clone()));
        self.by_name.insert(key, id);
        id
    }

    /// Looks up a node by normalized name. Never creates.
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(&normalize_name(name)).copied()
    }

    pub fn node(&self, id: NodeId) -> &TaxonomyNode {
        &self.nodes[id.0]
    }

    /// Idempotent subclass-edge insertion; a duplicate edge is a no-op.
    pub fn add_subclass_edge(&mut self, child: NodeId, parent: NodeId) {
        if child == parent {
            return;
        }
        self.nodes[child.0].parents.insert(parent);
    }

    pub fn is_subclass_of(&self, child: NodeId, parent: NodeId) -> bool {
        self.nodes[child.0].parents.contains(&parent)
    }

    pub fn mark_drug_combination(&mut self, id: NodeId) {
        self.nodes[id.0].is_drug_combination = true;
    }

    pub fn set_symbol(&mut self, id: NodeId, symbol: &str) {
        self.nodes[id.0].symbol = Some(symbol.to_string());
    }

    pub fn set_comment(&mut self, id: NodeId, comment: &str) {
        self.nodes[id.0].comment = Some(comment.to_string());
    }

    /// Records the asserting database on the node. Set semantics: the same
    /// (node, database) pair asserted twice is stored once.
    pub fn record_found_in(&mut self, id: NodeId, database: SourceDb) {
        self.nodes[id.0].found_in.insert(database);
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TaxonomyNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub(crate) fn rebuild_index(&mut self) {
        self.by_name = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.name.clone(), NodeId(i)))
            .collect();
    }

    /// Rebuilds the store keeping only the given nodes (plus their renamed
    /// edges), returning the remap from old to new handles. Used by the
    /// optional prune pass; annotation sets must be rewritten through the
    /// returned map.
    pub fn retain(&mut self, keep: &BTreeSet<NodeId>) -> HashMap<NodeId, NodeId> {
        let mut remap = HashMap::new();
        let mut nodes = Vec::with_capacity(keep.len());
        let mut by_name = HashMap::with_capacity(keep.len());
        for (old_index, node) in self.nodes.iter().enumerate() {
            let old_id = NodeId(old_index);
            if !keep.contains(&old_id) {
                continue;
            }
            let new_id = NodeId(nodes.len());
            by_name.insert(node.name.clone(), new_id);
            nodes.push(node.clone());
            remap.insert(old_id, new_id);
        }
        for node in &mut nodes {
            node.parents = node
                .parents
                .iter()
                .filter_map(|parent| remap.get(parent).copied())
                .collect();
        }
        self.nodes = nodes;
        self.by_name = by_name;
        remap
    }
}
