//! Approval threshold for admin votes.
//!
//! The threshold is a function of the current admin-set size:
//! - `AnyAdmin` → 1 supporting vote
//! - `Majority` → floor(n / 2) + 1 (strict majority)
//! - `Fixed(k)` → k, clamped to [1, n]
//!
//! With a single admin every rule approves on the first supporting vote.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How many supporting admin votes approve a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumRule {
    /// First supporting vote approves.
    AnyAdmin,
    /// Strict majority of the current admin set.
    #[default]
    Majority,
    /// A fixed number of votes, never more than the admin set.
    Fixed(usize),
}

impl QuorumRule {
    /// Supporting votes required with `admins` admins.
    pub const fn threshold(self, admins: usize) -> usize {
        approval_threshold(self, admins)
    }
}

/// Calculate the approval threshold for a given admin-set size.
///
/// # Examples
///
/// ```
/// use arbor_governance::{approval_threshold, QuorumRule};
///
/// assert_eq!(approval_threshold(QuorumRule::Majority, 1), 1);
/// assert_eq!(approval_threshold(QuorumRule::Majority, 4), 3);
/// assert_eq!(approval_threshold(QuorumRule::Fixed(9), 3), 3);
/// ```
pub const fn approval_threshold(rule: QuorumRule, admins: usize) -> usize {
    let raw = match rule {
        QuorumRule::AnyAdmin => 1,
        QuorumRule::Majority => admins / 2 + 1,
        QuorumRule::Fixed(k) => k,
    };
    if raw > admins {
        if admins == 0 {
            1
        } else {
            admins
        }
    } else if raw == 0 {
        1
    } else {
        raw
    }
}

/// Check if a supporting-vote count meets the threshold.
pub const fn meets_threshold(supporting: usize, rule: QuorumRule, admins: usize) -> bool {
    supporting >= approval_threshold(rule, admins)
}

/// Whether opposing votes leave too few admins to ever reach the threshold.
pub const fn approval_unreachable(opposing: usize, rule: QuorumRule, admins: usize) -> bool {
    let threshold = approval_threshold(rule, admins);
    admins.saturating_sub(opposing) < threshold
}

/// Calculate how many more supporting votes are needed.
pub const fn votes_needed(supporting: usize, rule: QuorumRule, admins: usize) -> usize {
    let threshold = approval_threshold(rule, admins);
    if supporting >= threshold {
        0
    } else {
        threshold - supporting
    }
}

/// Invalid textual quorum rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid quorum rule {0:?}: expected `any`, `majority` or `fixed:<votes>`")]
pub struct ParseQuorumError(pub String);

impl FromStr for QuorumRule {
    type Err = ParseQuorumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "any" => Ok(QuorumRule::AnyAdmin),
            "majority" => Ok(QuorumRule::Majority),
            _ => s
                .strip_prefix("fixed:")
                .and_then(|k| k.parse().ok())
                .map(QuorumRule::Fixed)
                .ok_or_else(|| ParseQuorumError(s.to_string())),
        }
    }
}

impl fmt::Display for QuorumRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuorumRule::AnyAdmin => write!(f, "any"),
            QuorumRule::Majority => write!(f, "majority"),
            QuorumRule::Fixed(k) => write!(f, "fixed:{}", k),
        }
    }
}
