//! Arbor Ledger
//!
//! Balances held by members of a single Arbor node, and the identities that
//! name both members and nodes.
//!
//! # Design
//!
//! Identities are 32-byte Blake3 digests. Members are derived from a label,
//! nodes from the registry's deployment counter, so both live in one
//! address space: a node can be a member of another node.
//!
//! Every balance change goes through checked arithmetic and keeps the
//! recorded total supply equal to the sum of balances.

mod address;
mod error;
mod ledger;

pub use address::Address;
pub use error::{LedgerError, Result};
pub use ledger::Ledger;

/// Token quantity. Unsigned, so balances and supply are never negative.
pub type Amount = u64;

/// Integer hundredths of a percent.
pub type BasisPoints = u16;

/// 100% expressed in basis points.
pub const FULL_SHARE_BP: BasisPoints = 10_000;
