//! Proposals and their lifecycle states.

use std::collections::BTreeMap;
use std::fmt;

use arbor_ledger::{Address, Amount, BasisPoints};
use serde::{Deserialize, Serialize};

/// Per-node proposal identifier. Assigned from 0 and never reused.
pub type ProposalId = u64;

/// What a proposal does once processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposalKind {
    /// Grant a brand-new balance.
    AddMember { member: Address, amount: Amount },
    /// Grant a bootstrap balance together with admin rights.
    AddFounder { member: Address, amount: Amount },
    /// Activate a link the child already declared toward this node.
    ConfirmChildLink { child: Address },
    /// Declare this node as a child of `parent`, granting it `basis_points`.
    DeclareParentLink {
        parent: Address,
        basis_points: BasisPoints,
    },
    /// Add an admin.
    AddAdmin { admin: Address },
    /// Remove an admin. The last admin cannot be removed.
    RemoveAdmin { admin: Address },
}

impl ProposalKind {
    /// Short label used in logs and events.
    pub const fn name(&self) -> &'static str {
        match self {
            ProposalKind::AddMember { .. } => "add_member",
            ProposalKind::AddFounder { .. } => "add_founder",
            ProposalKind::ConfirmChildLink { .. } => "confirm_child_link",
            ProposalKind::DeclareParentLink { .. } => "declare_parent_link",
            ProposalKind::AddAdmin { .. } => "add_admin",
            ProposalKind::RemoveAdmin { .. } => "remove_admin",
        }
    }

    /// The identity the proposal is about.
    pub const fn target(&self) -> &Address {
        match self {
            ProposalKind::AddMember { member, .. } | ProposalKind::AddFounder { member, .. } => {
                member
            }
            ProposalKind::ConfirmChildLink { child } => child,
            ProposalKind::DeclareParentLink { parent, .. } => parent,
            ProposalKind::AddAdmin { admin } | ProposalKind::RemoveAdmin { admin } => admin,
        }
    }
}

/// Lifecycle state.
///
/// ```text
/// Open ──(threshold met)──▶ Approved ──(process)──▶ Processed
///   └──(threshold unreachable)──▶ Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Open,
    Approved,
    Rejected,
    Processed,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProposalStatus::Open => "open",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Processed => "processed",
        };
        f.write_str(s)
    }
}

/// A proposal submitted to one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub kind: ProposalKind,
    /// Admin that created the proposal
    pub proposer: Address,
    /// Votes cast, keyed by admin
    pub votes: BTreeMap<Address, bool>,
    pub status: ProposalStatus,
}

impl Proposal {
    /// Create an open proposal with no votes.
    pub fn new(id: ProposalId, kind: ProposalKind, proposer: Address) -> Self {
        Self {
            id,
            kind,
            proposer,
            votes: BTreeMap::new(),
            status: ProposalStatus::Open,
        }
    }

    /// Supporting votes cast by identities accepted by `counts`.
    pub fn supporting<F>(&self, counts: F) -> usize
    where
        F: Fn(&Address) -> bool,
    {
        self.votes.iter().filter(|(a, s)| **s && counts(a)).count()
    }

    /// Opposing votes cast by identities accepted by `counts`.
    pub fn opposing<F>(&self, counts: F) -> usize
    where
        F: Fn(&Address) -> bool,
    {
        self.votes.iter().filter(|(a, s)| !**s && counts(a)).count()
    }

    pub fn is_open(&self) -> bool {
        self.status == ProposalStatus::Open
    }
}
