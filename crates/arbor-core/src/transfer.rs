//! Value moves along a confirmed path.
//!
//! A transfer debits the member at the first node and credits the same
//! member at the terminal node with the amount scaled by the compounded
//! path share. The two ledgers are updated one after the other; there is no
//! cross-node rollback.

use arbor_ledger::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::events::RegistryEvent;
use crate::registry::Registry;
use crate::share::{unscale_amount, Share};

/// Outcome of a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Taken from the member at the first node
    pub debited: Amount,
    /// Given to the member at the terminal node
    pub credited: Amount,
    /// Compounded share of the member along the path
    pub path_share: Share,
}

impl Registry {
    /// Move `amount` of `path[0]` from `path[1]` down to the last node of the path.
    ///
    /// The caller must be the member itself or an admin of the node the
    /// member address names. Every check runs before the debit; a failure
    /// after the debit surfaces as [`Error::PartialTransferFailure`].
    pub fn path_transfer(
        &mut self,
        path: &[Address],
        amount: Amount,
        caller: &Address,
    ) -> Result<TransferReceipt> {
        let member = *path.first().ok_or(Error::EmptyPath(0))?;
        self.authorize_transfer(&member, caller)?;

        let path_share = self.path_share(path)?;
        let credited = unscale_amount(amount, path_share, path.len())?;

        let source = self.node_index(&path[1])?;
        let terminal = self.node_index(&path[path.len() - 1])?;
        let source_node = self.address_of(source);
        let terminal_node = self.address_of(terminal);

        let available = self.node_at(source).ledger.balance_of(&member);
        if available < amount {
            return Err(Error::InsufficientBalance {
                member,
                available,
                requested: amount,
            });
        }

        self.node_at_mut(source).ledger.debit(&member, amount)?;
        self.journal
            .record(source_node, RegistryEvent::TransferDebited { member, amount });

        if let Err(e) = self.node_at_mut(terminal).ledger.credit(member, credited) {
            tracing::warn!(
                "Debited {} from {} at {} but credit at {} failed: {}",
                amount,
                member,
                source_node,
                terminal_node,
                e
            );
            return Err(Error::PartialTransferFailure {
                member,
                source_node,
                terminal_node,
                debited: amount,
                cause: Box::new(e.into()),
            });
        }
        self.journal.record(
            terminal_node,
            RegistryEvent::TransferCredited {
                member,
                amount: credited,
            },
        );

        self.node_at(source).ledger.verify_supply()?;
        self.node_at(terminal).ledger.verify_supply()?;

        tracing::info!(
            "Transferred {} of {} from {} to {} as {}",
            amount,
            member,
            source_node,
            terminal_node,
            credited
        );
        Ok(TransferReceipt {
            debited: amount,
            credited,
            path_share,
        })
    }

    fn authorize_transfer(&self, member: &Address, caller: &Address) -> Result<()> {
        if member == caller {
            return Ok(());
        }
        // a node holding a balance acts through its admins
        match self.node(member) {
            Ok(node) if node.governance.is_admin(caller) => Ok(()),
            _ => Err(Error::Unauthorized { caller: *caller }),
        }
    }
}
