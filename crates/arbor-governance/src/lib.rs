//! Arbor Governance
//!
//! Every supply-changing or link-changing mutation of an Arbor node goes
//! through a proposal:
//!
//! 1. An admin creates the proposal (Open)
//! 2. Admins vote; enough support makes it Approved, enough opposition
//!    makes it Rejected
//! 3. An admin processes it: the effect is applied once and the proposal
//!    becomes Processed
//!
//! # Quorum
//!
//! The approval threshold is explicit and configurable ([`QuorumRule`]).
//! The default is a strict majority of the current admin set, which for a
//! single-admin node means the first supporting vote approves.

mod error;
mod governance;
mod proposal;
mod quorum;

pub use error::{GovernanceError, Result};
pub use governance::Governance;
pub use proposal::{Proposal, ProposalId, ProposalKind, ProposalStatus};
pub use quorum::{
    approval_threshold, approval_unreachable, meets_threshold, votes_needed, ParseQuorumError,
    QuorumRule,
};
