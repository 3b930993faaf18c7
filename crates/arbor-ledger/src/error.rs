//! Error types for arbor-ledger.

use crate::{Address, Amount};
use thiserror::Error;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while mutating a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Debit exceeds the member's balance.
    #[error("insufficient balance for {member}: available {available}, requested {requested}")]
    InsufficientBalance {
        member: Address,
        available: Amount,
        requested: Amount,
    },

    /// A balance or the total supply would exceed the representable range.
    #[error("amount overflow")]
    Overflow,

    /// Recorded total supply disagrees with the sum of balances.
    #[error("supply mismatch: recorded {recorded}, sum of balances {actual}")]
    SupplyMismatch { recorded: Amount, actual: Amount },
}
