//! Scenario files and their replay.
//!
//! A scenario names nodes and members by label. Node labels are bound when
//! the `construct` step runs; any other label is a member identity derived
//! with [`Address::from_label`]. A node label used as a member resolves to
//! the node's address.

use std::collections::{BTreeMap, HashMap};

use arbor_core::{
    Address, Amount, BasisPoints, JournalEntry, ProposalId, ProposalKind, QuorumRule, Registry,
    RegistryConfig, Share,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Errors raised while replaying a step.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("no node labelled {0:?} has been constructed")]
    UnknownNode(String),

    #[error("node label {0:?} is already taken")]
    DuplicateNode(String),

    #[error("a member path needs exactly one target, got {0}")]
    MemberPathTargets(usize),

    #[error(transparent)]
    Registry(#[from] arbor_core::Error),
}

pub type Result<T> = std::result::Result<T, ScenarioError>;

/// A scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Overrides `ARBOR_QUORUM`
    #[serde(default)]
    pub quorum: Option<QuorumRule>,
    /// Overrides `ARBOR_MAX_PATH_LEN`
    #[serde(default)]
    pub max_path_len: Option<usize>,
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Registry configuration: environment first, then scenario overrides.
    pub fn config(&self) -> RegistryConfig {
        let mut config = RegistryConfig::default();
        if let Some(quorum) = self.quorum {
            config = config.with_quorum(quorum);
        }
        if let Some(len) = self.max_path_len {
            config = config.with_max_path_len(len);
        }
        config
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelledLink {
    pub parent: String,
    pub basis_points: BasisPoints,
}

/// Proposal payload with labels instead of addresses.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelledProposal {
    AddMember { member: String, amount: Amount },
    AddFounder { member: String, amount: Amount },
    ConfirmChildLink { child: String },
    DeclareParentLink { parent: String, basis_points: BasisPoints },
    AddAdmin { admin: String },
    RemoveAdmin { admin: String },
}

/// One replayed operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Construct {
        node: String,
        admins: Vec<String>,
        #[serde(default)]
        parents: Vec<LabelledLink>,
    },
    Propose {
        node: String,
        caller: String,
        proposal: LabelledProposal,
    },
    Vote {
        node: String,
        caller: String,
        id: ProposalId,
        support: bool,
    },
    Process {
        node: String,
        caller: String,
        id: ProposalId,
    },
    Transfer {
        path: Vec<String>,
        amount: Amount,
        caller: String,
    },
    /// Member share, or member amount share when `amount` is set
    Share {
        node: String,
        member: String,
        #[serde(default)]
        amount: Option<Amount>,
    },
    /// Path share, or path amount share when `amount` is set
    PathShare {
        path: Vec<String>,
        #[serde(default)]
        amount: Option<Amount>,
    },
    /// Routes from `origin` to each target, or a full member path to a
    /// single target when `member` is set
    Resolve {
        #[serde(default)]
        member: Option<String>,
        origin: String,
        targets: Vec<String>,
    },
    Balance {
        node: String,
        member: String,
    },
}

impl Step {
    pub const fn name(&self) -> &'static str {
        match self {
            Step::Construct { .. } => "construct",
            Step::Propose { .. } => "propose",
            Step::Vote { .. } => "vote",
            Step::Process { .. } => "process",
            Step::Transfer { .. } => "transfer",
            Step::Share { .. } => "share",
            Step::PathShare { .. } => "path_share",
            Step::Resolve { .. } => "resolve",
            Step::Balance { .. } => "balance",
        }
    }
}

/// Result of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Printed after a replay.
#[derive(Debug, Serialize)]
pub struct Report {
    pub outcomes: Vec<StepOutcome>,
    /// node label -> member label -> balance
    pub balances: BTreeMap<String, BTreeMap<String, Amount>>,
    /// label -> address, to read the journal
    pub labels: BTreeMap<String, Address>,
    pub journal: Vec<JournalEntry>,
}

/// Shares can exceed what a JSON number holds; wide values become strings.
fn share_value(share: Share) -> Value {
    u64::try_from(share)
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(share.to_string()))
}

/// Replays steps against one registry, keeping the label bindings.
#[derive(Debug)]
pub struct Runner {
    registry: Registry,
    nodes: HashMap<String, Address>,
    labels: HashMap<Address, String>,
}

impl Runner {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            registry: Registry::new(config),
            nodes: HashMap::new(),
            labels: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn node(&self, label: &str) -> Result<Address> {
        self.nodes
            .get(label)
            .copied()
            .ok_or_else(|| ScenarioError::UnknownNode(label.to_string()))
    }

    /// Node address for node labels, derived identity otherwise.
    fn identity(&mut self, label: &str) -> Address {
        if let Some(address) = self.nodes.get(label) {
            return *address;
        }
        let address = Address::from_label(label);
        self.labels.entry(address).or_insert_with(|| label.to_string());
        address
    }

    fn label(&self, address: &Address) -> String {
        self.labels
            .get(address)
            .cloned()
            .unwrap_or_else(|| address.to_hex())
    }

    /// Path labels: first entry is a member, the rest are nodes.
    fn path(&mut self, labels: &[String]) -> Result<Vec<Address>> {
        let Some((member, nodes)) = labels.split_first() else {
            return Ok(Vec::new());
        };
        let mut path = vec![self.identity(member)];
        for label in nodes {
            path.push(self.node(label)?);
        }
        Ok(path)
    }

    fn proposal(&mut self, labelled: &LabelledProposal) -> Result<ProposalKind> {
        Ok(match labelled {
            LabelledProposal::AddMember { member, amount } => ProposalKind::AddMember {
                member: self.identity(member),
                amount: *amount,
            },
            LabelledProposal::AddFounder { member, amount } => ProposalKind::AddFounder {
                member: self.identity(member),
                amount: *amount,
            },
            LabelledProposal::ConfirmChildLink { child } => ProposalKind::ConfirmChildLink {
                child: self.node(child)?,
            },
            LabelledProposal::DeclareParentLink {
                parent,
                basis_points,
            } => ProposalKind::DeclareParentLink {
                parent: self.node(parent)?,
                basis_points: *basis_points,
            },
            LabelledProposal::AddAdmin { admin } => ProposalKind::AddAdmin {
                admin: self.identity(admin),
            },
            LabelledProposal::RemoveAdmin { admin } => ProposalKind::RemoveAdmin {
                admin: self.identity(admin),
            },
        })
    }

    /// Apply one step.
    pub fn step(&mut self, step: &Step) -> Result<Value> {
        match step {
            Step::Construct {
                node,
                admins,
                parents,
            } => {
                if self.nodes.contains_key(node) {
                    return Err(ScenarioError::DuplicateNode(node.clone()));
                }
                let admins: Vec<Address> = admins.iter().map(|a| self.identity(a)).collect();
                let links = parents
                    .iter()
                    .map(|l| -> Result<(Address, BasisPoints)> {
                        Ok((self.node(&l.parent)?, l.basis_points))
                    })
                    .collect::<Result<Vec<_>>>()?;

                let address = self.registry.construct(admins, &links)?;
                self.nodes.insert(node.clone(), address);
                self.labels.insert(address, node.clone());
                Ok(json!({ "address": address }))
            }
            Step::Propose {
                node,
                caller,
                proposal,
            } => {
                let node = self.node(node)?;
                let caller = self.identity(caller);
                let kind = self.proposal(proposal)?;
                let id = self.registry.create_proposal(&node, kind, &caller)?;
                Ok(json!({ "id": id }))
            }
            Step::Vote {
                node,
                caller,
                id,
                support,
            } => {
                let node = self.node(node)?;
                let caller = self.identity(caller);
                let status = self.registry.vote(&node, *id, *support, &caller)?;
                Ok(json!({ "status": status }))
            }
            Step::Process { node, caller, id } => {
                let node = self.node(node)?;
                let caller = self.identity(caller);
                self.registry.process_voting(&node, *id, &caller)?;
                let status = self.registry.proposal(&node, *id)?.status;
                Ok(json!({ "status": status }))
            }
            Step::Transfer {
                path,
                amount,
                caller,
            } => {
                let path = self.path(path)?;
                let caller = self.identity(caller);
                let receipt = self.registry.path_transfer(&path, *amount, &caller)?;
                Ok(json!({
                    "debited": receipt.debited,
                    "credited": receipt.credited,
                    "path_share": share_value(receipt.path_share),
                }))
            }
            Step::Share {
                node,
                member,
                amount,
            } => {
                let node = self.node(node)?;
                let member = self.identity(member);
                let share = match amount {
                    Some(amount) => self.registry.member_amount_share(&node, &member, *amount)?,
                    None => self.registry.member_share(&node, &member)?,
                };
                Ok(json!({ "share": share_value(share) }))
            }
            Step::PathShare { path, amount } => {
                let path = self.path(path)?;
                let share = match amount {
                    Some(amount) => self.registry.path_amount_share(&path, *amount)?,
                    None => self.registry.path_share(&path)?,
                };
                Ok(json!({ "share": share_value(share) }))
            }
            Step::Resolve {
                member,
                origin,
                targets,
            } => {
                let origin = self.node(origin)?;
                let targets = targets
                    .iter()
                    .map(|t| self.node(t))
                    .collect::<Result<Vec<_>>>()?;
                let resolved = match member {
                    Some(member) => {
                        let [target] = targets[..] else {
                            return Err(ScenarioError::MemberPathTargets(targets.len()));
                        };
                        let member = self.identity(member);
                        self.registry.resolve_member_path(&member, &origin, &target)?
                    }
                    None => self.registry.resolve_to_descendant(&origin, &targets)?,
                };
                let labels: Vec<String> = resolved.iter().map(|a| self.label(a)).collect();
                Ok(json!({ "path": labels }))
            }
            Step::Balance { node, member } => {
                let node = self.node(node)?;
                let member = self.identity(member);
                Ok(json!({ "balance": self.registry.balance_of(&node, &member)? }))
            }
        }
    }

    /// Apply every step in order. Failed steps are recorded, not fatal.
    pub fn run(&mut self, steps: &[Step]) -> Vec<StepOutcome> {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| match self.step(step) {
                Ok(result) => {
                    tracing::info!("Step {} ({}): {}", index, step.name(), result);
                    StepOutcome {
                        index,
                        op: step.name(),
                        result: Some(result),
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!("Step {} ({}) failed: {}", index, step.name(), e);
                    StepOutcome {
                        index,
                        op: step.name(),
                        result: None,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect()
    }

    /// Final balances and journal.
    pub fn report(&self, outcomes: Vec<StepOutcome>) -> Report {
        let balances = self
            .registry
            .nodes()
            .map(|node| {
                let members: BTreeMap<String, Amount> = node
                    .ledger()
                    .balances()
                    .map(|(member, balance)| (self.label(member), *balance))
                    .collect();
                (self.label(node.address()), members)
            })
            .collect();
        let labels = self
            .labels
            .iter()
            .map(|(address, label)| (label.clone(), *address))
            .collect();

        Report {
            outcomes,
            balances,
            labels,
            journal: self.registry.journal().to_vec(),
        }
    }
}

/// Replay a whole scenario on a fresh registry.
pub fn replay(scenario: &Scenario) -> Report {
    let mut runner = Runner::new(scenario.config());
    let outcomes = runner.run(&scenario.steps);
    if let Err(e) = runner.registry().check_invariants() {
        tracing::error!("Registry invariants broken after replay: {}", e);
    }
    runner.report(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(json: &str) -> Scenario {
        serde_json::from_str(json).unwrap()
    }

    const TWO_NODES: &str = r#"{
        "quorum": "majority",
        "steps": [
            { "op": "construct", "node": "A", "admins": ["x"] },
            { "op": "propose", "node": "A", "caller": "x",
              "proposal": { "kind": "add_founder", "member": "x", "amount": 100 } },
            { "op": "vote", "node": "A", "caller": "x", "id": 0, "support": true },
            { "op": "process", "node": "A", "caller": "x", "id": 0 },
            { "op": "propose", "node": "A", "caller": "x",
              "proposal": { "kind": "add_member", "member": "y", "amount": 150 } },
            { "op": "vote", "node": "A", "caller": "x", "id": 1, "support": true },
            { "op": "process", "node": "A", "caller": "x", "id": 1 },
            { "op": "construct", "node": "B", "admins": ["x"],
              "parents": [{ "parent": "A", "basis_points": 6000 }] },
            { "op": "resolve", "origin": "A", "targets": ["B"] },
            { "op": "propose", "node": "A", "caller": "x",
              "proposal": { "kind": "confirm_child_link", "child": "B" } },
            { "op": "vote", "node": "A", "caller": "x", "id": 2, "support": true },
            { "op": "process", "node": "A", "caller": "x", "id": 2 },
            { "op": "resolve", "member": "x", "origin": "A", "targets": ["B"] },
            { "op": "share", "node": "A", "member": "x" },
            { "op": "path_share", "path": ["x", "A", "B"], "amount": 50 },
            { "op": "transfer", "path": ["x", "A", "B"], "amount": 50, "caller": "x" },
            { "op": "balance", "node": "B", "member": "x" }
        ]
    }"#;

    #[test]
    fn replay_two_nodes() {
        let report = replay(&scenario(TWO_NODES));
        let outcomes = &report.outcomes;

        assert!(outcomes[8].error.as_deref().unwrap().contains("no confirmed path"));
        assert!(outcomes.iter().enumerate().all(|(i, o)| i == 8 || o.is_ok()));

        assert_eq!(outcomes[12].result.as_ref().unwrap()["path"], json!(["x", "A", "B"]));
        assert_eq!(outcomes[13].result.as_ref().unwrap()["share"], 4000);
        assert_eq!(outcomes[14].result.as_ref().unwrap()["share"], 120_000);
        assert_eq!(outcomes[15].result.as_ref().unwrap()["credited"], 12);
        assert_eq!(outcomes[16].result.as_ref().unwrap()["balance"], 12);

        assert_eq!(report.balances["A"]["x"], 50);
        assert_eq!(report.balances["A"]["y"], 150);
        assert_eq!(report.balances["B"]["x"], 12);
        assert_eq!(report.labels["B"], report.journal.last().unwrap().node);
    }

    #[test]
    fn unknown_and_duplicate_labels() {
        let mut runner = Runner::new(RegistryConfig::new());
        let steps = scenario(
            r#"{ "steps": [
                { "op": "balance", "node": "nowhere", "member": "x" },
                { "op": "construct", "node": "A", "admins": ["x"] },
                { "op": "construct", "node": "A", "admins": ["x"] }
            ] }"#,
        )
        .steps;

        let outcomes = runner.run(&steps);
        assert!(matches!(
            runner.step(&steps[0]),
            Err(ScenarioError::UnknownNode(label)) if label == "nowhere"
        ));
        assert!(outcomes[1].is_ok());
        assert!(outcomes[2].error.as_deref().unwrap().contains("already taken"));
        assert_eq!(runner.registry().len(), 1);
    }

    #[test]
    fn resolve_targets_and_member_paths() {
        let mut runner = Runner::new(RegistryConfig::new());
        let steps = scenario(
            r#"{ "steps": [
                { "op": "construct", "node": "A", "admins": ["x"] },
                { "op": "construct", "node": "B", "admins": ["x"],
                  "parents": [{ "parent": "A", "basis_points": 3000 }] },
                { "op": "construct", "node": "C", "admins": ["x"],
                  "parents": [{ "parent": "A", "basis_points": 3000 }] },
                { "op": "propose", "node": "A", "caller": "x",
                  "proposal": { "kind": "confirm_child_link", "child": "B" } },
                { "op": "vote", "node": "A", "caller": "x", "id": 0, "support": true },
                { "op": "process", "node": "A", "caller": "x", "id": 0 },
                { "op": "propose", "node": "A", "caller": "x",
                  "proposal": { "kind": "confirm_child_link", "child": "C" } },
                { "op": "vote", "node": "A", "caller": "x", "id": 1, "support": true },
                { "op": "process", "node": "A", "caller": "x", "id": 1 },
                { "op": "resolve", "origin": "A", "targets": ["C", "B"] },
                { "op": "resolve", "member": "x", "origin": "A", "targets": ["B", "C"] }
            ] }"#,
        )
        .steps;

        let outcomes = runner.run(&steps);
        assert!(outcomes[..9].iter().all(StepOutcome::is_ok), "{:?}", outcomes);
        assert_eq!(outcomes[9].result.as_ref().unwrap()["path"], json!(["C", "B"]));
        assert!(matches!(
            runner.step(&steps[10]),
            Err(ScenarioError::MemberPathTargets(2))
        ));
    }

    #[test]
    fn node_labels_resolve_as_members() {
        let mut runner = Runner::new(RegistryConfig::new());
        let steps = scenario(
            r#"{ "steps": [
                { "op": "construct", "node": "A", "admins": ["x"] },
                { "op": "construct", "node": "C", "admins": ["x"] },
                { "op": "propose", "node": "C", "caller": "x",
                  "proposal": { "kind": "add_member", "member": "A", "amount": 9 } },
                { "op": "vote", "node": "C", "caller": "x", "id": 0, "support": true },
                { "op": "process", "node": "C", "caller": "x", "id": 0 }
            ] }"#,
        )
        .steps;
        assert!(runner.run(&steps).iter().all(StepOutcome::is_ok));

        let report = runner.report(Vec::new());
        assert_eq!(report.balances["C"]["A"], 9);
    }

    #[test]
    fn bundled_scenarios_replay() {
        let report = replay(&scenario(include_str!("../scenarios/two_nodes.json")));
        let failed: Vec<usize> = report
            .outcomes
            .iter()
            .filter(|o| !o.is_ok())
            .map(|o| o.index)
            .collect();
        // resolve before confirmation, overdraft
        assert_eq!(failed, vec![10, 17]);
        assert_eq!(report.balances["B"]["x"], 12);

        let report = replay(&scenario(include_str!("../scenarios/three_hops.json")));
        let failed: Vec<usize> = report
            .outcomes
            .iter()
            .filter(|o| !o.is_ok())
            .map(|o| o.index)
            .collect();
        // path share over the unconfirmed B -> C link
        assert_eq!(failed, vec![18]);
        assert_eq!(report.outcomes[23].result.as_ref().unwrap()["share"], 12_000_000);
        assert_eq!(report.balances["C"]["x"], 6);
    }

    #[test]
    fn wide_shares_become_strings() {
        assert_eq!(share_value(7), json!(7));
        assert_eq!(share_value(Share::from(u64::MAX) + 1), json!("18446744073709551616"));
    }
}
