//! Proposal book and admin set of a single node.

use std::collections::BTreeSet;

use arbor_ledger::Address;
use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, Result};
use crate::quorum::{approval_threshold, approval_unreachable, QuorumRule};
use crate::{Proposal, ProposalId, ProposalKind, ProposalStatus};

/// Admins, quorum rule and proposals of one node.
///
/// This type only drives the lifecycle. Applying a processed proposal's
/// effect is up to the owner, which calls [`Governance::approved`] to read
/// the proposal and [`Governance::mark_processed`] once the effect landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Governance {
    admins: BTreeSet<Address>,
    quorum: QuorumRule,
    proposals: Vec<Proposal>,
}

impl Governance {
    /// Create governance with an initial admin set.
    pub fn new<I>(admins: I, quorum: QuorumRule) -> Result<Self>
    where
        I: IntoIterator<Item = Address>,
    {
        let admins: BTreeSet<Address> = admins.into_iter().collect();
        if admins.is_empty() {
            return Err(GovernanceError::NoAdmins);
        }
        Ok(Self {
            admins,
            quorum,
            proposals: Vec::new(),
        })
    }

    pub fn is_admin(&self, who: &Address) -> bool {
        self.admins.contains(who)
    }

    pub fn admins(&self) -> impl Iterator<Item = &Address> {
        self.admins.iter()
    }

    pub fn admin_count(&self) -> usize {
        self.admins.len()
    }

    pub fn quorum(&self) -> QuorumRule {
        self.quorum
    }

    /// Supporting votes needed with the current admin set.
    pub fn threshold(&self) -> usize {
        approval_threshold(self.quorum, self.admins.len())
    }

    /// Get a proposal by id.
    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(id as usize)
    }

    /// All proposals in creation order.
    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.iter()
    }

    /// Open a new proposal.
    pub fn create(&mut self, kind: ProposalKind, caller: &Address) -> Result<ProposalId> {
        self.require_admin(caller)?;
        let id = self.proposals.len() as ProposalId;
        self.proposals.push(Proposal::new(id, kind, *caller));
        Ok(id)
    }

    /// Cast a vote and return the resulting status.
    pub fn vote(
        &mut self,
        id: ProposalId,
        support: bool,
        caller: &Address,
    ) -> Result<ProposalStatus> {
        self.require_admin(caller)?;

        let threshold = self.threshold();
        let admin_count = self.admins.len();
        let quorum = self.quorum;
        let admins = &self.admins;

        let proposal = self
            .proposals
            .get_mut(id as usize)
            .ok_or(GovernanceError::UnknownProposal(id))?;

        if !proposal.is_open() {
            return Err(GovernanceError::InvalidState {
                id,
                expected: ProposalStatus::Open,
                actual: proposal.status,
            });
        }
        if proposal.votes.contains_key(caller) {
            return Err(GovernanceError::AlreadyVoted { id, admin: *caller });
        }

        proposal.votes.insert(*caller, support);

        // Only votes of current admins count
        let supporting = proposal.supporting(|a| admins.contains(a));
        let opposing = proposal.opposing(|a| admins.contains(a));

        if supporting >= threshold {
            proposal.status = ProposalStatus::Approved;
        } else if approval_unreachable(opposing, quorum, admin_count) {
            proposal.status = ProposalStatus::Rejected;
        }

        Ok(proposal.status)
    }

    /// Read an approved proposal that `caller` wants to process.
    pub fn approved(&self, id: ProposalId, caller: &Address) -> Result<&Proposal> {
        self.require_admin(caller)?;
        let proposal = self
            .proposal(id)
            .ok_or(GovernanceError::UnknownProposal(id))?;

        if proposal.status != ProposalStatus::Approved {
            return Err(GovernanceError::InvalidState {
                id,
                expected: ProposalStatus::Approved,
                actual: proposal.status,
            });
        }
        Ok(proposal)
    }

    /// Transition Approved → Processed.
    pub fn mark_processed(&mut self, id: ProposalId) -> Result<()> {
        let proposal = self
            .proposals
            .get_mut(id as usize)
            .ok_or(GovernanceError::UnknownProposal(id))?;

        if proposal.status != ProposalStatus::Approved {
            return Err(GovernanceError::InvalidState {
                id,
                expected: ProposalStatus::Approved,
                actual: proposal.status,
            });
        }
        proposal.status = ProposalStatus::Processed;
        Ok(())
    }

    /// Add an admin. Returns false if already present.
    pub fn add_admin(&mut self, admin: Address) -> bool {
        self.admins.insert(admin)
    }

    /// Remove an admin. Returns false if absent.
    pub fn remove_admin(&mut self, admin: &Address) -> Result<bool> {
        if !self.admins.contains(admin) {
            return Ok(false);
        }
        if self.admins.len() == 1 {
            return Err(GovernanceError::LastAdmin(*admin));
        }
        Ok(self.admins.remove(admin))
    }

    fn require_admin(&self, caller: &Address) -> Result<()> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(GovernanceError::Unauthorized { caller: *caller })
        }
    }
}
