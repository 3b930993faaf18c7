//! Proposal lifecycle across ledger, governance and registry.

use arbor_core::{Error, ProposalKind, ProposalStatus, QuorumRule, Registry, RegistryConfig};
use arbor_governance::approval_threshold;
use arbor_integration_tests::{member, Fixture};

#[test]
fn founder_and_member_shares() {
    let mut fx = Fixture::new();
    let (x, y) = (member("x"), member("y"));
    let a = fx.node(&[]);

    fx.pass(&a, ProposalKind::AddFounder { member: x, amount: 100 }).unwrap();
    assert_eq!(fx.registry.balance_of(&a, &x).unwrap(), 100);
    assert!(fx.registry.is_admin(&a, &x).unwrap());

    fx.pass(&a, ProposalKind::AddMember { member: y, amount: 150 }).unwrap();
    assert_eq!(fx.registry.member_share(&a, &x).unwrap(), 4000);
    assert_eq!(fx.registry.member_share(&a, &y).unwrap(), 6000);
    assert_eq!(fx.registry.member_amount_share(&a, &x, 50).unwrap(), 2000);
    fx.registry.check_invariants().unwrap();
}

#[test]
fn lifecycle_states_are_enforced() {
    let mut reg = Registry::new(RegistryConfig::new());
    let (x, z) = (member("x"), member("z"));
    let a = reg.construct([x, z], &[]).unwrap();

    let id = reg
        .create_proposal(&a, ProposalKind::AddMember { member: x, amount: 5 }, &x)
        .unwrap();
    assert_eq!(reg.proposal(&a, id).unwrap().status, ProposalStatus::Open);

    // not approved yet
    assert!(matches!(
        reg.process_voting(&a, id, &x),
        Err(Error::InvalidState { actual: ProposalStatus::Open, .. })
    ));

    assert_eq!(reg.vote(&a, id, true, &x).unwrap(), ProposalStatus::Open);
    assert_eq!(reg.vote(&a, id, true, &x), Err(Error::AlreadyVoted { id, admin: x }));
    assert_eq!(reg.vote(&a, id, true, &z).unwrap(), ProposalStatus::Approved);

    // voting closed
    assert!(matches!(
        reg.vote(&a, id, false, &z),
        Err(Error::InvalidState { actual: ProposalStatus::Approved, .. })
    ));

    reg.process_voting(&a, id, &z).unwrap();
    for _ in 0..3 {
        assert!(matches!(
            reg.process_voting(&a, id, &x),
            Err(Error::InvalidState { actual: ProposalStatus::Processed, .. })
        ));
    }
    assert_eq!(reg.balance_of(&a, &x).unwrap(), 5);
    assert_eq!(reg.total_supply(&a).unwrap(), 5);
}

#[test]
fn rejection_is_final() {
    let mut reg = Registry::new(RegistryConfig::new());
    let admins = [member("a1"), member("a2"), member("a3")];
    let a = reg.construct(admins, &[]).unwrap();

    let id = reg
        .create_proposal(&a, ProposalKind::AddMember { member: member("m"), amount: 1 }, &admins[0])
        .unwrap();
    // majority of 3 is 2: one "no" keeps it open, two make approval unreachable
    assert_eq!(reg.vote(&a, id, false, &admins[0]).unwrap(), ProposalStatus::Open);
    assert_eq!(reg.vote(&a, id, false, &admins[1]).unwrap(), ProposalStatus::Rejected);

    assert!(matches!(
        reg.vote(&a, id, true, &admins[2]),
        Err(Error::InvalidState { actual: ProposalStatus::Rejected, .. })
    ));
    assert!(matches!(
        reg.process_voting(&a, id, &admins[2]),
        Err(Error::InvalidState { actual: ProposalStatus::Rejected, .. })
    ));
    assert_eq!(reg.total_supply(&a).unwrap(), 0);
}

#[test]
fn quorum_rules() {
    let admins = [member("a1"), member("a2"), member("a3")];
    let cases = [
        (QuorumRule::AnyAdmin, 1),
        (QuorumRule::Majority, 2),
        (QuorumRule::Fixed(3), 3),
        // clamped to the admin count
        (QuorumRule::Fixed(10), 3),
    ];

    for (rule, needed) in cases {
        let mut reg = Registry::new(RegistryConfig::new().with_quorum(rule));
        let a = reg.construct(admins, &[]).unwrap();
        assert_eq!(approval_threshold(rule, admins.len()), needed);
        assert_eq!(reg.node(&a).unwrap().governance().threshold(), needed);
        let kind = ProposalKind::AddMember {
            member: member("m"),
            amount: 1,
        };
        let id = reg.create_proposal(&a, kind, &admins[0]).unwrap();

        for (i, admin) in admins.iter().take(needed).enumerate() {
            let status = reg.vote(&a, id, true, admin).unwrap();
            let expected = if i + 1 == needed {
                ProposalStatus::Approved
            } else {
                ProposalStatus::Open
            };
            assert_eq!(status, expected, "{:?} after {} vote(s)", rule, i + 1);
        }
    }
}

#[test]
fn outsiders_are_unauthorized() {
    let mut fx = Fixture::new();
    let a = fx.node(&[]);
    let outsider = member("outsider");

    assert_eq!(
        fx.registry
            .create_proposal(&a, ProposalKind::AddAdmin { admin: outsider }, &outsider),
        Err(Error::Unauthorized { caller: outsider })
    );

    let admin = fx.admin;
    let id = fx
        .registry
        .create_proposal(&a, ProposalKind::AddMember { member: outsider, amount: 1 }, &admin)
        .unwrap();
    assert_eq!(
        fx.registry.vote(&a, id, true, &outsider),
        Err(Error::Unauthorized { caller: outsider })
    );
    assert_eq!(fx.registry.vote(&a, 99, true, &admin), Err(Error::UnknownProposal(99)));
}

#[test]
fn proposal_ids_are_per_node() {
    let mut fx = Fixture::new();
    let a = fx.node(&[]);
    let b = fx.node(&[]);
    let admin = fx.admin;

    let kind = |n: &str| ProposalKind::AddMember { member: member(n), amount: 1 };
    assert_eq!(fx.registry.create_proposal(&a, kind("m1"), &admin).unwrap(), 0);
    assert_eq!(fx.registry.create_proposal(&a, kind("m2"), &admin).unwrap(), 1);
    assert_eq!(fx.registry.create_proposal(&b, kind("m1"), &admin).unwrap(), 0);
}

#[test]
fn failed_effect_can_be_retried() {
    let mut fx = Fixture::new();
    let a = fx.node(&[]);
    let admin = fx.admin;
    let b = fx.node(&[]);

    // confirm before the child declares: blocked, stays approved
    let id = fx
        .registry
        .create_proposal(&a, ProposalKind::ConfirmChildLink { child: b }, &admin)
        .unwrap();
    fx.registry.vote(&a, id, true, &admin).unwrap();
    assert_eq!(
        fx.registry.process_voting(&a, id, &admin),
        Err(Error::LinkNotDeclared { parent: a, child: b })
    );
    assert_eq!(fx.registry.proposal(&a, id).unwrap().status, ProposalStatus::Approved);

    fx.pass(&b, ProposalKind::DeclareParentLink { parent: a, basis_points: 2500 })
        .unwrap();
    fx.registry.process_voting(&a, id, &admin).unwrap();
    assert_eq!(fx.registry.link_share(&a, &b).unwrap(), 2500);
}
