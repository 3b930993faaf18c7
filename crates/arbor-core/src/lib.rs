//! Arbor Core
//!
//! A registry of token-bearing nodes linked into a directed acyclic graph.
//!
//! # Links
//!
//! A child node declares a percentage interest it grants to a parent. The
//! link counts only once the parent confirms the child through its own
//! governance. Unconfirmed links are invisible to share queries and path
//! resolution.
//!
//! # Compounded shares
//!
//! A path `[member, n1, n2, ..., nk]` starts with the member's share of `n1`
//! in basis points and multiplies in each confirmed link on the way down,
//! dividing by 100 per hop. Transfers use that compounded share to move value
//! from `n1` down to `nk`.
//!
//! # Ordering
//!
//! Every mutating call takes `&mut Registry`. Applied effects are journaled
//! with sequence numbers from an injected [`Sequencer`]. [`SharedRegistry`]
//! wraps a registry for concurrent async readers.

mod config;
mod error;
mod events;
mod links;
mod node;
mod registry;
mod resolver;
mod share;
mod shared;
mod snapshot;
mod transfer;

pub use config::RegistryConfig;
pub use error::{Error, Result};
pub use events::{CounterSequencer, Journal, JournalEntry, RegistryEvent, Sequencer};
pub use links::{NodeIndex, ParentLink, ParentLinkTable};
pub use node::Node;
pub use registry::Registry;
pub use share::{path_scale, unscale_amount, Share};
pub use shared::SharedRegistry;
pub use snapshot::{NodeSnapshot, RegistrySnapshot};
pub use transfer::TransferReceipt;

pub use arbor_governance::{ProposalId, ProposalKind, ProposalStatus, QuorumRule};
pub use arbor_ledger::{Address, Amount, BasisPoints, FULL_SHARE_BP};
