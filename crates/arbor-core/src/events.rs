//! Journal of applied effects.
//!
//! Each entry is stamped by an injected [`Sequencer`]. The default counts
//! from zero; a deployment plugs in the sequence numbers of whatever
//! external mechanism orders its mutations.

use std::fmt;

use arbor_governance::{ProposalId, ProposalKind};
use arbor_ledger::{Address, Amount, BasisPoints};
use serde::{Deserialize, Serialize};

/// Source of monotonically increasing sequence numbers.
pub trait Sequencer: fmt::Debug + Send + Sync {
    /// Next sequence number. Must be greater than every earlier one.
    fn next_seq(&mut self) -> u64;
}

/// In-memory counter.
#[derive(Debug, Clone, Default)]
pub struct CounterSequencer {
    next: u64,
}

impl CounterSequencer {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Continue numbering after a restored journal.
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }
}

impl Sequencer for CounterSequencer {
    fn next_seq(&mut self) -> u64 {
        let seq = self.next;
        self.next += 1;
        seq
    }
}

/// Effects recorded in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RegistryEvent {
    /// A node was deployed
    NodeConstructed {
        admins: Vec<Address>,
        parent_links: Vec<(Address, BasisPoints)>,
    },

    ProposalCreated {
        id: ProposalId,
        proposer: Address,
        proposal: ProposalKind,
    },

    VoteCast {
        id: ProposalId,
        admin: Address,
        support: bool,
    },

    ProposalApproved { id: ProposalId },

    ProposalRejected { id: ProposalId },

    /// The effect of the proposal was applied
    ProposalProcessed { id: ProposalId },

    MemberCredited { member: Address, amount: Amount },

    AdminAdded { admin: Address },

    AdminRemoved { admin: Address },

    ParentLinkDeclared {
        parent: Address,
        basis_points: BasisPoints,
    },

    /// The parent activated a child's declared link
    ChildLinkConfirmed {
        child: Address,
        basis_points: BasisPoints,
    },

    TransferDebited { member: Address, amount: Amount },

    TransferCredited { member: Address, amount: Amount },
}

/// One journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub seq: u64,
    /// Node whose state changed
    pub node: Address,
    pub event: RegistryEvent,
}

/// Append-only event log.
#[derive(Debug)]
pub struct Journal {
    sequencer: Box<dyn Sequencer>,
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new(sequencer: Box<dyn Sequencer>) -> Self {
        Self {
            sequencer,
            entries: Vec::new(),
        }
    }

    pub(crate) fn with_entries(sequencer: Box<dyn Sequencer>, entries: Vec<JournalEntry>) -> Self {
        Self { sequencer, entries }
    }

    /// Stamp and append an event.
    pub fn record(&mut self, node: Address, event: RegistryEvent) -> u64 {
        let seq = self.sequencer.next_seq();
        if let Some(last) = self.entries.last() {
            if seq <= last.seq {
                tracing::warn!("Sequencer went backwards: {} after {}", seq, last.seq);
            }
        }
        self.entries.push(JournalEntry { seq, node, event });
        seq
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Entries stamped after `seq`.
    pub fn entries_since(&self, seq: u64) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(move |e| e.seq > seq)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new(Box::new(CounterSequencer::new()))
    }
}
