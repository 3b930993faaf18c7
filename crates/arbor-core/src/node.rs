//! A single accounting node.

use arbor_governance::Governance;
use arbor_ledger::{Address, Ledger};

use crate::links::{NodeIndex, ParentLinkTable};

/// One node: balances, outbound links, confirmed children and governance.
///
/// Nodes only reference each other through [`NodeIndex`] values into the
/// registry arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) address: Address,
    pub(crate) ledger: Ledger,
    pub(crate) parents: ParentLinkTable,
    /// Children whose link this node confirmed, in confirmation order
    pub(crate) children: Vec<NodeIndex>,
    pub(crate) governance: Governance,
}

impl Node {
    pub(crate) fn new(address: Address, parents: ParentLinkTable, governance: Governance) -> Self {
        Self {
            address,
            ledger: Ledger::new(),
            parents,
            children: Vec::new(),
            governance,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn parent_links(&self) -> &ParentLinkTable {
        &self.parents
    }

    pub fn confirmed_children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn has_confirmed(&self, child: NodeIndex) -> bool {
        self.children.contains(&child)
    }

    pub fn governance(&self) -> &Governance {
        &self.governance
    }
}
