//! Parent links declared by a child node.
//!
//! A link lives on the child side only. The parent activates it by listing
//! the child among its confirmed children; neither side writes into the
//! other's state.

use arbor_ledger::{BasisPoints, FULL_SHARE_BP};

/// Position of a node in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Interest a child grants one parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink {
    pub parent: NodeIndex,
    pub basis_points: BasisPoints,
}

/// Outbound links of one node, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentLinkTable {
    links: Vec<ParentLink>,
}

impl ParentLinkTable {
    pub fn new() -> Self {
        Self { links: Vec::new() }
    }

    /// Declared basis points toward `parent`, if any.
    pub fn get(&self, parent: NodeIndex) -> Option<BasisPoints> {
        self.links
            .iter()
            .find(|l| l.parent == parent)
            .map(|l| l.basis_points)
    }

    pub fn contains(&self, parent: NodeIndex) -> bool {
        self.get(parent).is_some()
    }

    /// Sum of declared basis points.
    pub fn declared_total(&self) -> u32 {
        self.links.iter().map(|l| l.basis_points as u32).sum()
    }

    /// Basis points still available for new links.
    pub fn remaining(&self) -> u32 {
        (FULL_SHARE_BP as u32).saturating_sub(self.declared_total())
    }

    /// Append a link. Callers check duplicates and the 100% cap first.
    pub(crate) fn push(&mut self, link: ParentLink) {
        self.links.push(link);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParentLink> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
