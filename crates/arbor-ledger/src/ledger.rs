//! Per-node balance book.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::{Address, Amount};

/// Balances held by the members of one node.
///
/// The recorded total supply is updated alongside every balance change, so
/// `total_supply() == sum of balances` holds after each call returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    balances: BTreeMap<Address, Amount>,
    total_supply: Amount,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            balances: BTreeMap::new(),
            total_supply: 0,
        }
    }

    /// Balance of a member, 0 for non-members.
    pub fn balance_of(&self, member: &Address) -> Amount {
        self.balances.get(member).copied().unwrap_or(0)
    }

    /// Whether the member has an entry (even a zero one).
    pub fn is_member(&self, member: &Address) -> bool {
        self.balances.contains_key(member)
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Credit a member, creating the entry if absent. Grows the total supply.
    pub fn credit(&mut self, member: Address, amount: Amount) -> Result<Amount> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self
            .balance_of(&member)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.balances.insert(member, balance);
        self.total_supply = supply;
        Ok(balance)
    }

    /// Debit a member. Shrinks the total supply. The entry stays even when it
    /// reaches zero.
    pub fn debit(&mut self, member: &Address, amount: Amount) -> Result<Amount> {
        let available = self.balance_of(member);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                member: *member,
                available,
                requested: amount,
            });
        }

        let balance = available - amount;
        if let Some(entry) = self.balances.get_mut(member) {
            *entry = balance;
        }
        // available >= amount, and total_supply >= available
        self.total_supply -= amount;
        Ok(balance)
    }

    /// Iterate members and balances in address order.
    pub fn balances(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Recompute the sum of balances and compare it with the recorded supply.
    pub fn verify_supply(&self) -> Result<()> {
        let actual = self
            .balances
            .values()
            .try_fold(0 as Amount, |acc, b| acc.checked_add(*b))
            .ok_or(LedgerError::Overflow)?;

        if actual != self.total_supply {
            return Err(LedgerError::SupplyMismatch {
                recorded: self.total_supply,
                actual,
            });
        }
        Ok(())
    }
}
