// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session nodes of the data set, USS and job trees.
//!
//! A node keeps a snapshot of its profile keyed by name. After any mutation
//! of the profile table the owner calls [`TreeProviders::sync_profile`] so
//! every view observes the change.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::profile::Profile;
use crate::validation::ValidationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeKind {
    Dataset,
    Uss,
    Job,
}

impl TreeKind {
    pub const ALL: [TreeKind; 3] = [TreeKind::Dataset, TreeKind::Uss, TreeKind::Job];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dataset => "dataset",
            Self::Uss => "uss",
            Self::Job => "job",
        }
    }
}

impl std::fmt::Display for TreeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-level session node showing one profile.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionNode {
    pub profile: Profile,
    /// Whether automatic validation runs for this node.
    pub validation_enabled: bool,
    pub status: Option<ValidationStatus>,
}

impl SessionNode {
    pub fn new(profile: Profile) -> Self {
        Self { profile, validation_enabled: true, status: None }
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }
}

/// Session nodes of one tree.
#[derive(Debug)]
pub struct SessionTree {
    kind: TreeKind,
    nodes: RwLock<Vec<SessionNode>>,
}

impl SessionTree {
    pub fn new(kind: TreeKind) -> Self {
        Self { kind, nodes: RwLock::new(Vec::new()) }
    }

    pub fn kind(&self) -> TreeKind {
        self.kind
    }

    pub fn nodes(&self) -> Vec<SessionNode> {
        self.nodes.read().clone()
    }

    pub fn find(&self, name: &str) -> Option<SessionNode> {
        self.nodes.read().iter().find(|n| n.name() == name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.read().iter().any(|n| n.name() == name)
    }

    /// Add a node for `profile`. Returns false if one already exists.
    pub fn add(&self, profile: Profile) -> bool {
        let mut nodes = self.nodes.write();
        if nodes.iter().any(|n| n.name() == profile.name) {
            return false;
        }
        nodes.push(SessionNode::new(profile));
        true
    }

    pub fn remove(&self, name: &str) -> bool {
        let mut nodes = self.nodes.write();
        let before = nodes.len();
        nodes.retain(|n| n.name() != name);
        nodes.len() != before
    }

    /// Apply `f` to the node for `name`. Returns whether one existed.
    pub fn update(&self, name: &str, f: impl FnOnce(&mut SessionNode)) -> bool {
        let mut nodes = self.nodes.write();
        match nodes.iter_mut().find(|n| n.name() == name) {
            Some(node) => {
                f(node);
                true
            }
            None => false,
        }
    }
}

/// All registered trees.
#[derive(Debug, Clone, Default)]
pub struct TreeProviders {
    trees: Vec<Arc<SessionTree>>,
}

impl TreeProviders {
    pub fn new(trees: Vec<Arc<SessionTree>>) -> Self {
        Self { trees }
    }

    /// One empty tree of each kind.
    pub fn standard() -> Self {
        Self::new(TreeKind::ALL.into_iter().map(|k| Arc::new(SessionTree::new(k))).collect())
    }

    pub fn all(&self) -> &[Arc<SessionTree>] {
        &self.trees
    }

    pub fn get(&self, kind: TreeKind) -> Option<&Arc<SessionTree>> {
        self.trees.iter().find(|t| t.kind() == kind)
    }

    /// Kinds of tree currently showing `name`.
    pub fn session_for_all_trees(&self, name: &str) -> Vec<TreeKind> {
        self.trees.iter().filter(|t| t.contains(name)).map(|t| t.kind()).collect()
    }

    /// Apply `f` to every node showing `name`, across all trees. Returns the
    /// number of nodes touched.
    pub fn for_each_node(&self, name: &str, mut f: impl FnMut(&mut SessionNode)) -> usize {
        self.trees.iter().filter(|t| t.update(name, &mut f)).count()
    }

    /// Refresh every node's snapshot of `profile`.
    pub fn sync_profile(&self, profile: &Profile) -> usize {
        self.for_each_node(&profile.name, |node| node.profile = profile.clone())
    }

    pub fn remove_profile(&self, name: &str) -> usize {
        self.trees.iter().filter(|t| t.remove(name)).count()
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
