//! Error types for arbor-core.

use arbor_governance::{GovernanceError, ProposalId, ProposalStatus};
use arbor_ledger::{Address, Amount, LedgerError};
use thiserror::Error;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Caller lacks the admin or member rights the action needs.
    #[error("{caller} is not authorized")]
    Unauthorized { caller: Address },

    /// Proposal is not in the required lifecycle state.
    #[error("proposal {id} is {actual}, expected {expected}")]
    InvalidState {
        id: ProposalId,
        expected: ProposalStatus,
        actual: ProposalStatus,
    },

    /// Share query against a node with zero total supply.
    #[error("node {0} has zero total supply")]
    DivisionByZero(Address),

    /// The child declared the link but the parent has not confirmed it.
    #[error("link from {child} to parent {parent} is not confirmed")]
    UnconfirmedLink { parent: Address, child: Address },

    /// Path shorter than a member followed by one node.
    #[error("path needs a member and at least one node, got {0} entries")]
    EmptyPath(usize),

    /// Consecutive path entries are not a member/node or parent/child pair.
    #[error("malformed path at entry {position}: {reason}")]
    MalformedPath {
        position: usize,
        reason: &'static str,
    },

    /// Debit exceeds the member's balance.
    #[error("insufficient balance for {member}: available {available}, requested {requested}")]
    InsufficientBalance {
        member: Address,
        available: Amount,
        requested: Amount,
    },

    /// No confirmed chain connects the two nodes.
    #[error("no confirmed path from {from} to {to}")]
    NoPathFound { from: Address, to: Address },

    /// The debit landed but the credit did not. Needs external reconciliation.
    #[error("{member} lost {debited} at {source_node}, credit at {terminal_node} failed: {cause}")]
    PartialTransferFailure {
        member: Address,
        source_node: Address,
        terminal_node: Address,
        debited: Amount,
        cause: Box<Error>,
    },

    /// No node is registered at this address.
    #[error("unknown node {0}")]
    UnknownNode(Address),

    /// No proposal with this id on the node.
    #[error("unknown proposal {0}")]
    UnknownProposal(ProposalId),

    /// Each admin votes once per proposal.
    #[error("{admin} already voted on proposal {id}")]
    AlreadyVoted { id: ProposalId, admin: Address },

    /// AddMember / AddFounder for an identity that already holds an entry.
    #[error("{member} is already a member of {node}")]
    DuplicateMember { node: Address, member: Address },

    /// The link is already declared (child side) or confirmed (parent side).
    #[error("link from {child} to parent {parent} already exists")]
    DuplicateLink { parent: Address, child: Address },

    /// Parent tried to confirm a link the child never declared.
    #[error("{child} has not declared {parent} as parent")]
    LinkNotDeclared { parent: Address, child: Address },

    /// A node cannot link to itself.
    #[error("{0} cannot link to itself")]
    SelfLink(Address),

    /// Declared basis points would exceed 100% in total.
    #[error("link of {requested} bp would raise the total granted to {total} bp, above 10000")]
    InvalidPercentage { requested: u32, total: u32 },

    /// Confirming the link would close a cycle.
    #[error("confirming {child} under {parent} would create a cycle")]
    CycleDetected { parent: Address, child: Address },

    /// The admin set may not become empty.
    #[error("cannot remove {0}: last admin")]
    LastAdmin(Address),

    /// A node needs at least one admin.
    #[error("admin set is empty")]
    NoAdmins,

    /// Arithmetic exceeded the representable range.
    #[error("arithmetic overflow")]
    Overflow,

    /// Recorded total supply disagrees with the sum of balances.
    #[error("supply invariant violated: recorded {recorded}, actual {actual}")]
    InvariantViolation { recorded: Amount, actual: Amount },

    /// A snapshot does not describe a consistent registry.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl From<LedgerError> for Error {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientBalance {
                member,
                available,
                requested,
            } => Error::InsufficientBalance {
                member,
                available,
                requested,
            },
            LedgerError::Overflow => Error::Overflow,
            LedgerError::SupplyMismatch { recorded, actual } => {
                Error::InvariantViolation { recorded, actual }
            }
        }
    }
}

impl From<GovernanceError> for Error {
    fn from(e: GovernanceError) -> Self {
        match e {
            GovernanceError::Unauthorized { caller } => Error::Unauthorized { caller },
            GovernanceError::InvalidState {
                id,
                expected,
                actual,
            } => Error::InvalidState {
                id,
                expected,
                actual,
            },
            GovernanceError::UnknownProposal(id) => Error::UnknownProposal(id),
            GovernanceError::AlreadyVoted { id, admin } => Error::AlreadyVoted { id, admin },
            GovernanceError::LastAdmin(admin) => Error::LastAdmin(admin),
            GovernanceError::NoAdmins => Error::NoAdmins,
        }
    }
}
