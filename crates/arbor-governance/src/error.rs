//! Error types for arbor-governance.

use arbor_ledger::Address;
use thiserror::Error;

use crate::{ProposalId, ProposalStatus};

/// Result type for governance operations.
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Errors that can occur in the proposal lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    /// Caller is not an admin of the node.
    #[error("{caller} is not an admin")]
    Unauthorized { caller: Address },

    /// Proposal is not in the lifecycle state the operation requires.
    #[error("proposal {id} is {actual}, expected {expected}")]
    InvalidState {
        id: ProposalId,
        expected: ProposalStatus,
        actual: ProposalStatus,
    },

    /// No proposal with this id.
    #[error("unknown proposal {0}")]
    UnknownProposal(ProposalId),

    /// Each admin votes once per proposal.
    #[error("{admin} already voted on proposal {id}")]
    AlreadyVoted { id: ProposalId, admin: Address },

    /// The admin set may not become empty.
    #[error("cannot remove {0}: last admin")]
    LastAdmin(Address),

    /// A node needs at least one admin.
    #[error("admin set is empty")]
    NoAdmins,
}
