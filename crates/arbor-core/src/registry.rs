//! Arena of nodes and the governance entry points.
//!
//! The registry owns every node in a `Vec` and hands out [`NodeIndex`]
//! positions. Links and confirmations store indices, so any DAG shape can
//! be represented without nodes owning one another.

use std::collections::HashMap;

use arbor_governance::{Governance, Proposal, ProposalId, ProposalKind, ProposalStatus};
use arbor_ledger::{Address, Amount, BasisPoints, FULL_SHARE_BP};

use crate::config::RegistryConfig;
use crate::error::{Error, Result};
use crate::events::{CounterSequencer, Journal, JournalEntry, RegistryEvent, Sequencer};
use crate::links::{NodeIndex, ParentLink, ParentLinkTable};
use crate::node::Node;

/// All nodes known to one deployment.
#[derive(Debug)]
pub struct Registry {
    pub(crate) config: RegistryConfig,
    pub(crate) nodes: Vec<Node>,
    pub(crate) index: HashMap<Address, NodeIndex>,
    pub(crate) journal: Journal,
    pub(crate) deploy_nonce: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl Registry {
    /// Create an empty registry with a counting sequencer.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_sequencer(config, Box::new(CounterSequencer::new()))
    }

    /// Create an empty registry stamping journal entries with `sequencer`.
    pub fn with_sequencer(config: RegistryConfig, sequencer: Box<dyn Sequencer>) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            index: HashMap::new(),
            journal: Journal::new(sequencer),
            deploy_nonce: 0,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // --- Lookups ---

    pub(crate) fn node_index(&self, address: &Address) -> Result<NodeIndex> {
        self.index
            .get(address)
            .copied()
            .ok_or(Error::UnknownNode(*address))
    }

    pub(crate) fn node_at(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.as_usize()]
    }

    pub(crate) fn node_at_mut(&mut self, index: NodeIndex) -> &mut Node {
        &mut self.nodes[index.as_usize()]
    }

    pub(crate) fn address_of(&self, index: NodeIndex) -> Address {
        self.node_at(index).address
    }

    /// Get a node by address.
    pub fn node(&self, address: &Address) -> Result<&Node> {
        self.node_index(address).map(|i| self.node_at(i))
    }

    pub fn contains_node(&self, address: &Address) -> bool {
        self.index.contains_key(address)
    }

    /// All nodes in construction order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn balance_of(&self, node: &Address, member: &Address) -> Result<Amount> {
        Ok(self.node(node)?.ledger.balance_of(member))
    }

    pub fn total_supply(&self, node: &Address) -> Result<Amount> {
        Ok(self.node(node)?.ledger.total_supply())
    }

    pub fn is_admin(&self, node: &Address, who: &Address) -> Result<bool> {
        Ok(self.node(node)?.governance.is_admin(who))
    }

    pub fn proposal(&self, node: &Address, id: ProposalId) -> Result<&Proposal> {
        self.node(node)?
            .governance
            .proposal(id)
            .ok_or(Error::UnknownProposal(id))
    }

    pub fn journal(&self) -> &[JournalEntry] {
        self.journal.entries()
    }

    /// Verify `total supply == sum of balances` on every node.
    pub fn check_invariants(&self) -> Result<()> {
        for node in &self.nodes {
            if let Err(e) = node.ledger.verify_supply() {
                tracing::error!("Supply invariant broken on {}: {}", node.address, e);
                return Err(e.into());
            }
        }
        Ok(())
    }

    // --- Construction ---

    /// Deploy a node with its initial admins and declared parent links.
    ///
    /// Parents must already be registered. The links stay unconfirmed until
    /// each parent processes a `ConfirmChildLink` proposal.
    pub fn construct<I>(
        &mut self,
        initial_admins: I,
        declared_parent_links: &[(Address, BasisPoints)],
    ) -> Result<Address>
    where
        I: IntoIterator<Item = Address>,
    {
        let admins: Vec<Address> = initial_admins.into_iter().collect();
        let first_admin = *admins.first().ok_or(Error::NoAdmins)?;
        let governance = Governance::new(admins.iter().copied(), self.config.quorum)?;

        let address = self.next_node_address(&first_admin);

        let mut parents = ParentLinkTable::new();
        for &(parent, basis_points) in declared_parent_links {
            let parent_index = self.check_parent_link(&address, &parents, &parent, basis_points)?;
            parents.push(ParentLink {
                parent: parent_index,
                basis_points,
            });
        }

        let index = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node::new(address, parents, governance));
        self.index.insert(address, index);

        tracing::info!(
            "Constructed node {} with {} admin(s) and {} parent link(s)",
            address,
            admins.len(),
            declared_parent_links.len()
        );
        self.journal.record(
            address,
            RegistryEvent::NodeConstructed {
                admins,
                parent_links: declared_parent_links.to_vec(),
            },
        );

        Ok(address)
    }

    fn next_node_address(&mut self, first_admin: &Address) -> Address {
        loop {
            let candidate = Address::derive_node(first_admin, self.deploy_nonce);
            self.deploy_nonce += 1;
            if !self.index.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Validate a new link from `child` to `parent`.
    pub(crate) fn check_parent_link(
        &self,
        child: &Address,
        table: &ParentLinkTable,
        parent: &Address,
        basis_points: BasisPoints,
    ) -> Result<NodeIndex> {
        let parent_index = self.node_index(parent)?;

        if parent == child {
            return Err(Error::SelfLink(*parent));
        }
        if table.contains(parent_index) {
            return Err(Error::DuplicateLink {
                parent: *parent,
                child: *child,
            });
        }

        let total = table.declared_total() + basis_points as u32;
        if basis_points > FULL_SHARE_BP || total > FULL_SHARE_BP as u32 {
            return Err(Error::InvalidPercentage {
                requested: basis_points as u32,
                total,
            });
        }

        Ok(parent_index)
    }

    // --- Governance ---

    /// Open a proposal on `node`. Only admins may propose.
    pub fn create_proposal(
        &mut self,
        node: &Address,
        kind: ProposalKind,
        caller: &Address,
    ) -> Result<ProposalId> {
        let index = self.node_index(node)?;
        let id = self
            .node_at_mut(index)
            .governance
            .create(kind.clone(), caller)?;

        tracing::info!("Proposal {} ({}) opened on {} by {}", id, kind.name(), node, caller);
        self.journal.record(
            *node,
            RegistryEvent::ProposalCreated {
                id,
                proposer: *caller,
                proposal: kind,
            },
        );
        Ok(id)
    }

    /// Vote on an open proposal and return its status afterwards.
    pub fn vote(
        &mut self,
        node: &Address,
        id: ProposalId,
        support: bool,
        caller: &Address,
    ) -> Result<ProposalStatus> {
        let index = self.node_index(node)?;
        let status = self.node_at_mut(index).governance.vote(id, support, caller)?;

        tracing::debug!("{} voted {} on proposal {} of {}", caller, support, id, node);
        self.journal.record(
            *node,
            RegistryEvent::VoteCast {
                id,
                admin: *caller,
                support,
            },
        );

        match status {
            ProposalStatus::Approved => {
                tracing::info!("Proposal {} on {} approved", id, node);
                self.journal
                    .record(*node, RegistryEvent::ProposalApproved { id });
            }
            ProposalStatus::Rejected => {
                tracing::warn!("Proposal {} on {} rejected", id, node);
                self.journal
                    .record(*node, RegistryEvent::ProposalRejected { id });
            }
            ProposalStatus::Open | ProposalStatus::Processed => {}
        }
        Ok(status)
    }

    /// Apply an approved proposal's effect exactly once.
    ///
    /// If the effect cannot be applied nothing changes and the proposal stays
    /// Approved, so it can be processed again once the blocker is gone.
    pub fn process_voting(
        &mut self,
        node: &Address,
        id: ProposalId,
        caller: &Address,
    ) -> Result<()> {
        let index = self.node_index(node)?;
        let kind = self.node_at(index).governance.approved(id, caller)?.kind.clone();

        if let Err(e) = self.apply(index, &kind) {
            tracing::warn!("Proposal {} on {} could not be applied: {}", id, node, e);
            return Err(e);
        }

        self.node_at_mut(index).governance.mark_processed(id)?;
        tracing::info!("Proposal {} ({}) processed on {}", id, kind.name(), node);
        self.journal
            .record(*node, RegistryEvent::ProposalProcessed { id });
        Ok(())
    }

    fn apply(&mut self, index: NodeIndex, kind: &ProposalKind) -> Result<()> {
        let node_address = self.address_of(index);

        match kind {
            ProposalKind::AddMember { member, amount } => {
                self.grant(index, member, *amount)?;
            }
            ProposalKind::AddFounder { member, amount } => {
                self.grant(index, member, *amount)?;
                if self.node_at_mut(index).governance.add_admin(*member) {
                    self.journal
                        .record(node_address, RegistryEvent::AdminAdded { admin: *member });
                }
            }
            ProposalKind::ConfirmChildLink { child } => {
                let basis_points = self.check_confirmation(index, child)?;
                let child_index = self.node_index(child)?;
                self.node_at_mut(index).children.push(child_index);
                self.journal.record(
                    node_address,
                    RegistryEvent::ChildLinkConfirmed {
                        child: *child,
                        basis_points,
                    },
                );
            }
            ProposalKind::DeclareParentLink {
                parent,
                basis_points,
            } => {
                let parent_index = self.check_parent_link(
                    &node_address,
                    &self.node_at(index).parents,
                    parent,
                    *basis_points,
                )?;
                self.node_at_mut(index).parents.push(ParentLink {
                    parent: parent_index,
                    basis_points: *basis_points,
                });
                self.journal.record(
                    node_address,
                    RegistryEvent::ParentLinkDeclared {
                        parent: *parent,
                        basis_points: *basis_points,
                    },
                );
            }
            ProposalKind::AddAdmin { admin } => {
                if self.node_at_mut(index).governance.add_admin(*admin) {
                    self.journal
                        .record(node_address, RegistryEvent::AdminAdded { admin: *admin });
                }
            }
            ProposalKind::RemoveAdmin { admin } => {
                if self.node_at_mut(index).governance.remove_admin(admin)? {
                    self.journal
                        .record(node_address, RegistryEvent::AdminRemoved { admin: *admin });
                }
            }
        }
        Ok(())
    }

    /// Credit a brand-new member.
    fn grant(&mut self, index: NodeIndex, member: &Address, amount: Amount) -> Result<()> {
        let node = self.node_at_mut(index);
        if node.ledger.is_member(member) {
            return Err(Error::DuplicateMember {
                node: node.address,
                member: *member,
            });
        }
        node.ledger.credit(*member, amount)?;

        let node_address = node.address;
        self.journal.record(
            node_address,
            RegistryEvent::MemberCredited {
                member: *member,
                amount,
            },
        );
        Ok(())
    }

    /// Check that `parent` may confirm `child`; returns the child's declared share.
    fn check_confirmation(&self, parent: NodeIndex, child: &Address) -> Result<BasisPoints> {
        let parent_address = self.address_of(parent);
        let child_index = self.node_index(child)?;

        if child_index == parent {
            return Err(Error::SelfLink(*child));
        }

        let basis_points = self
            .node_at(child_index)
            .parents
            .get(parent)
            .ok_or(Error::LinkNotDeclared {
                parent: parent_address,
                child: *child,
            })?;

        if self.node_at(parent).has_confirmed(child_index) {
            return Err(Error::DuplicateLink {
                parent: parent_address,
                child: *child,
            });
        }

        // parent already below child: the new edge would close a loop
        if self.find_route(child_index, parent).is_some() {
            return Err(Error::CycleDetected {
                parent: parent_address,
                child: *child,
            });
        }

        Ok(basis_points)
    }
}
