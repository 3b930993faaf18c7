//! Serializable copy of a registry, for an external persistence layer.
//!
//! Snapshots name nodes by address instead of arena index, so they stay
//! meaningful as JSON.

use std::collections::{HashMap, HashSet};

use arbor_governance::Governance;
use arbor_ledger::{Address, BasisPoints, Ledger};
use serde::{Deserialize, Serialize};

use crate::config::RegistryConfig;
use crate::error::{Error, Result};
use crate::events::{Journal, JournalEntry, Sequencer};
use crate::links::{NodeIndex, ParentLink, ParentLinkTable};
use crate::node::Node;
use crate::registry::Registry;

/// One node in a [`RegistrySnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub address: Address,
    pub ledger: Ledger,
    /// Declared links, in declaration order
    pub parent_links: Vec<(Address, BasisPoints)>,
    /// Confirmed children, in confirmation order
    pub children: Vec<Address>,
    pub governance: Governance,
}

/// Full registry state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub deploy_nonce: u64,
    /// Nodes in construction order
    pub nodes: Vec<NodeSnapshot>,
    pub journal: Vec<JournalEntry>,
}

impl RegistrySnapshot {
    /// First sequence number after the captured journal.
    pub fn next_seq(&self) -> u64 {
        self.journal.last().map_or(0, |e| e.seq + 1)
    }
}

impl Registry {
    /// Capture the current state.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let nodes = self
            .nodes
            .iter()
            .map(|node| NodeSnapshot {
                address: node.address,
                ledger: node.ledger.clone(),
                parent_links: node
                    .parents
                    .iter()
                    .map(|l| (self.address_of(l.parent), l.basis_points))
                    .collect(),
                children: node.children.iter().map(|c| self.address_of(*c)).collect(),
                governance: node.governance.clone(),
            })
            .collect();

        RegistrySnapshot {
            deploy_nonce: self.deploy_nonce,
            nodes,
            journal: self.journal.entries().to_vec(),
        }
    }

    /// Rebuild a registry from a snapshot.
    ///
    /// Every address must resolve and every ledger must satisfy the supply
    /// invariant. Parent links get the same checks as at construction, every
    /// confirmed child must have declared the link, and the confirmed links
    /// must not form a cycle.
    pub fn restore(
        snapshot: RegistrySnapshot,
        config: RegistryConfig,
        sequencer: Box<dyn Sequencer>,
    ) -> Result<Self> {
        let RegistrySnapshot {
            deploy_nonce,
            nodes: node_snapshots,
            journal,
        } = snapshot;

        let mut index = HashMap::with_capacity(node_snapshots.len());
        for (i, node) in node_snapshots.iter().enumerate() {
            let position = u32::try_from(i).map_err(|_| Error::Overflow)?;
            if index.insert(node.address, NodeIndex(position)).is_some() {
                return Err(Error::InvalidSnapshot(format!(
                    "node {} appears twice",
                    node.address
                )));
            }
        }

        let journal_len = journal.len();
        let mut registry = Self {
            config,
            nodes: Vec::with_capacity(node_snapshots.len()),
            index,
            journal: Journal::with_entries(sequencer, journal),
            deploy_nonce,
        };

        for node in node_snapshots {
            node.ledger.verify_supply()?;

            let mut parents = ParentLinkTable::new();
            for (parent, basis_points) in node.parent_links {
                let parent_index = registry
                    .check_parent_link(&node.address, &parents, &parent, basis_points)
                    .map_err(|e| match e {
                        Error::UnknownNode(_) => e,
                        other => Error::InvalidSnapshot(format!(
                            "link from {} to {}: {}",
                            node.address, parent, other
                        )),
                    })?;
                parents.push(ParentLink {
                    parent: parent_index,
                    basis_points,
                });
            }

            let mut seen = HashSet::with_capacity(node.children.len());
            let mut children = Vec::with_capacity(node.children.len());
            for child in &node.children {
                let child_index = registry.node_index(child)?;
                if !seen.insert(child_index) {
                    return Err(Error::InvalidSnapshot(format!(
                        "{} confirmed {} twice",
                        node.address, child
                    )));
                }
                children.push(child_index);
            }

            registry.nodes.push(Node {
                address: node.address,
                ledger: node.ledger,
                parents,
                children,
                governance: node.governance,
            });
        }

        registry.check_confirmed_links()?;

        tracing::info!(
            "Restored {} node(s) and {} journal entries",
            registry.nodes.len(),
            journal_len
        );
        Ok(registry)
    }

    /// Confirmed links must be declared by the child and stay acyclic.
    fn check_confirmed_links(&self) -> Result<()> {
        for (i, node) in self.nodes.iter().enumerate() {
            let parent = NodeIndex(i as u32);
            for &child in &node.children {
                let child_node = self.node_at(child);
                if !child_node.parents.contains(parent) {
                    return Err(Error::InvalidSnapshot(format!(
                        "{} confirmed {} without a declared link",
                        node.address, child_node.address
                    )));
                }
                if self.find_route(child, parent).is_some() {
                    return Err(Error::InvalidSnapshot(format!(
                        "confirming {} under {} closes a cycle",
                        child_node.address, node.address
                    )));
                }
            }
        }
        Ok(())
    }
}
