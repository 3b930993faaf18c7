//! Shared fixtures for Arbor scenario tests.
//!
//! A [`Fixture`] owns one registry and one admin identity that administers
//! every node it constructs, so each proposal passes with a single vote.

use arbor_core::{Address, Amount, BasisPoints, ProposalKind, Registry, RegistryConfig, Result};

/// Registry plus the admin used to drive it.
#[derive(Debug)]
pub struct Fixture {
    pub registry: Registry,
    pub admin: Address,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::new())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            registry: Registry::new(config),
            admin: member("admin"),
        }
    }

    /// Construct a node administered by the fixture admin.
    pub fn node(&mut self, parents: &[(Address, BasisPoints)]) -> Address {
        self.registry
            .construct([self.admin], parents)
            .unwrap_or_else(|e| panic!("construct failed: {}", e))
    }

    /// Create, approve and process a proposal.
    pub fn pass(&mut self, node: &Address, kind: ProposalKind) -> Result<()> {
        let admin = self.admin;
        let id = self.registry.create_proposal(node, kind, &admin)?;
        self.registry.vote(node, id, true, &admin)?;
        self.registry.process_voting(node, id, &admin)
    }

    pub fn grant(&mut self, node: &Address, member: Address, amount: Amount) {
        self.pass(node, ProposalKind::AddMember { member, amount })
            .unwrap_or_else(|e| panic!("grant failed: {}", e));
    }

    pub fn confirm(&mut self, parent: &Address, child: Address) -> Result<()> {
        self.pass(parent, ProposalKind::ConfirmChildLink { child })
    }

    /// Construct a child of `parent` granting `basis_points` and confirm it.
    pub fn child(&mut self, parent: &Address, basis_points: BasisPoints) -> Address {
        let child = self.node(&[(*parent, basis_points)]);
        self.confirm(parent, child)
            .unwrap_or_else(|e| panic!("confirm failed: {}", e));
        child
    }

    /// Root plus a chain of confirmed children, one per entry of `links`.
    pub fn chain(&mut self, links: &[BasisPoints]) -> Vec<Address> {
        let mut nodes = vec![self.node(&[])];
        for bp in links {
            let parent = nodes[nodes.len() - 1];
            nodes.push(self.child(&parent, *bp));
        }
        nodes
    }
}

/// Member identity for a label.
pub fn member(label: &str) -> Address {
    Address::from_label(label)
}
