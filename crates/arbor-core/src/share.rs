//! Member shares and compounded path shares.
//!
//! Fixed-point conventions:
//! - a member share is in basis points (10000 = 100%)
//! - every link hop multiplies by the link's basis points and divides by
//!   100, adding two digits of scale instead of renormalizing
//! - `*_amount_share` results carry two more digits on top of that
//!
//! So `path_amount_share(path, amount) / path_scale(path.len())` is `amount`
//! times the compounded fraction, in plain token units. [`unscale_amount`]
//! gives the same value without forming the scaled product.

use arbor_ledger::{Address, Amount, BasisPoints, FULL_SHARE_BP};

use crate::error::{Error, Result};
use crate::links::NodeIndex;
use crate::registry::Registry;

/// Scaled share value. Grows by two decimal digits per hop.
pub type Share = u128;

/// Fixed-point scale of `path_amount_share` for a path of `path_len` entries:
/// `100^(path_len - 1)`.
pub fn path_scale(path_len: usize) -> Result<Share> {
    if path_len < 2 {
        return Err(Error::EmptyPath(path_len));
    }
    let exp = u32::try_from(path_len - 1).map_err(|_| Error::Overflow)?;
    (100 as Share).checked_pow(exp).ok_or(Error::Overflow)
}

/// `amount * path_share / 100^path_len` in token units, truncating.
///
/// Peels `path_len` base-100 digits off the share so every intermediate
/// stays below `100 * amount`. `Overflow` only when the result itself does
/// not fit an [`Amount`].
pub fn unscale_amount(amount: Amount, path_share: Share, path_len: usize) -> Result<Amount> {
    let amount = amount as Share;
    let mut high = path_share;
    // invariant: low < amount
    let mut low: Share = 0;
    for _ in 0..path_len {
        let digit = high % 100;
        high /= 100;
        low = (low + amount * digit) / 100;
    }

    amount
        .checked_mul(high)
        .and_then(|v| v.checked_add(low))
        .and_then(|v| Amount::try_from(v).ok())
        .ok_or(Error::Overflow)
}

fn scale_by(value: Share, factor: Share, divisor: Share) -> Result<Share> {
    value
        .checked_mul(factor)
        .map(|v| v / divisor)
        .ok_or(Error::Overflow)
}

impl Registry {
    /// Member's share of a node in basis points, truncating.
    pub fn member_share(&self, node: &Address, member: &Address) -> Result<Share> {
        let index = self.node_index(node)?;
        self.member_share_at(index, member)
    }

    pub(crate) fn member_share_at(&self, index: NodeIndex, member: &Address) -> Result<Share> {
        let node = self.node_at(index);
        let supply = node.ledger.total_supply();
        if supply == 0 {
            return Err(Error::DivisionByZero(node.address));
        }
        let balance = node.ledger.balance_of(member) as Share;
        scale_by(balance, FULL_SHARE_BP as Share, supply as Share)
    }

    /// `amount * member_share / 100`.
    pub fn member_amount_share(
        &self,
        node: &Address,
        member: &Address,
        amount: Amount,
    ) -> Result<Share> {
        let share = self.member_share(node, member)?;
        scale_by(amount as Share, share, 100)
    }

    /// Confirmed basis points `child` grants `parent`.
    pub fn link_share(&self, parent: &Address, child: &Address) -> Result<BasisPoints> {
        let parent_index = self.node_index(parent)?;
        let child_index = self.node_index(child)?;
        self.confirmed_link(parent_index, child_index)
    }

    /// Basis points of a link the parent confirmed.
    ///
    /// `LinkNotDeclared` when the child never declared the parent,
    /// `UnconfirmedLink` when it did but the parent has not confirmed.
    pub(crate) fn confirmed_link(
        &self,
        parent: NodeIndex,
        child: NodeIndex,
    ) -> Result<BasisPoints> {
        let declared = self
            .node_at(child)
            .parents
            .get(parent)
            .ok_or(Error::LinkNotDeclared {
                parent: self.address_of(parent),
                child: self.address_of(child),
            })?;

        if !self.node_at(parent).has_confirmed(child) {
            return Err(Error::UnconfirmedLink {
                parent: self.address_of(parent),
                child: self.address_of(child),
            });
        }
        Ok(declared)
    }

    /// Check path shape and resolve its nodes (`path[1..]`).
    pub(crate) fn validate_path(&self, path: &[Address]) -> Result<Vec<NodeIndex>> {
        if path.len() < 2 {
            return Err(Error::EmptyPath(path.len()));
        }
        if path.len() > self.config.max_path_len {
            return Err(Error::MalformedPath {
                position: self.config.max_path_len,
                reason: "path longer than the configured maximum",
            });
        }

        let nodes = path[1..]
            .iter()
            .enumerate()
            .map(|(i, address)| {
                self.node_index(address).map_err(|_| Error::MalformedPath {
                    position: i + 1,
                    reason: "not a registered node",
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if !self.node_at(nodes[0]).ledger.is_member(&path[0]) {
            return Err(Error::MalformedPath {
                position: 0,
                reason: "member has no balance entry in the first node",
            });
        }

        Ok(nodes)
    }

    /// Basis points of every hop, in path order.
    fn hop_shares(&self, nodes: &[NodeIndex]) -> Result<Vec<BasisPoints>> {
        nodes
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                self.confirmed_link(pair[0], pair[1]).map_err(|e| match e {
                    Error::LinkNotDeclared { .. } => Error::MalformedPath {
                        position: i + 2,
                        reason: "node is not a declared child of the previous node",
                    },
                    other => other,
                })
            })
            .collect()
    }

    /// Compounded share of `path[0]` along the path.
    ///
    /// Seeded with the member's share of `path[1]`; each following hop
    /// multiplies by the hop's confirmed basis points and divides by 100.
    pub fn path_share(&self, path: &[Address]) -> Result<Share> {
        let nodes = self.validate_path(path)?;
        // links first: an unconfirmed hop is reported even on an empty node
        let hops = self.hop_shares(&nodes)?;

        let seed = self.member_share_at(nodes[0], &path[0])?;
        let share = hops
            .iter()
            .try_fold(seed, |acc, bp| scale_by(acc, *bp as Share, 100))?;

        tracing::debug!("Path share over {} hop(s): {}", hops.len(), share);
        Ok(share)
    }

    /// `amount * path_share(path) / 100`.
    pub fn path_amount_share(&self, path: &[Address], amount: Amount) -> Result<Share> {
        let share = self.path_share(path)?;
        scale_by(amount as Share, share, 100)
    }
}
