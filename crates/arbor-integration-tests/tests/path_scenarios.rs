//! Linked nodes: compounded shares, resolution and transfers.

use arbor_core::{
    path_scale, unscale_amount, Address, Error, ProposalKind, RegistryConfig, RegistryEvent,
    TransferReceipt,
};
use arbor_integration_tests::{member, Fixture};
use arbor_ledger::Ledger;

/// A(x:100, y:150) and an unconfirmed child B declaring 60% to A.
fn two_nodes() -> (Fixture, Address, Address, Address) {
    let mut fx = Fixture::new();
    let x = member("x");
    let a = fx.node(&[]);
    fx.grant(&a, x, 100);
    fx.grant(&a, member("y"), 150);
    let b = fx.node(&[(a, 6000)]);
    (fx, x, a, b)
}

#[test]
fn links_count_only_once_confirmed() {
    let (mut fx, x, a, b) = two_nodes();

    assert_eq!(
        fx.registry.resolve_to_descendant(&a, &[b]),
        Err(Error::NoPathFound { from: a, to: b })
    );
    assert_eq!(
        fx.registry.path_share(&[x, a, b]),
        Err(Error::UnconfirmedLink { parent: a, child: b })
    );

    fx.confirm(&a, b).unwrap();
    assert_eq!(fx.registry.resolve_to_descendant(&a, &[b]).unwrap(), vec![b]);
    assert_eq!(fx.registry.path_share(&[x, a, b]).unwrap(), 240_000);
    assert_eq!(fx.registry.path_amount_share(&[x, a, b], 50).unwrap(), 120_000);
}

#[test]
fn transfer_moves_compounded_value() {
    let (mut fx, x, a, b) = two_nodes();
    fx.confirm(&a, b).unwrap();

    let path = fx.registry.resolve_member_path(&x, &a, &b).unwrap();
    assert_eq!(path, vec![x, a, b]);

    let receipt = fx.registry.path_transfer(&path, 50, &x).unwrap();
    assert_eq!(
        receipt,
        TransferReceipt {
            debited: 50,
            credited: (120_000 / path_scale(3).unwrap()) as u64,
            path_share: 240_000,
        }
    );
    assert_eq!(receipt.credited, 12);
    assert_eq!(unscale_amount(50, receipt.path_share, path.len()).unwrap(), 12);
    assert_eq!(fx.registry.balance_of(&a, &x).unwrap(), 50);
    assert_eq!(fx.registry.balance_of(&b, &x).unwrap(), 12);
    fx.registry.check_invariants().unwrap();

    let ledger: &Ledger = fx.registry.node(&b).unwrap().ledger();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.total_supply(), 12);

    // overdraft after the first transfer
    let before = fx.registry.snapshot();
    assert_eq!(
        fx.registry.path_transfer(&path, 51, &x),
        Err(Error::InsufficientBalance {
            member: x,
            available: 50,
            requested: 51,
        })
    );
    assert_eq!(fx.registry.snapshot(), before);
}

#[test]
fn three_hops_compound() {
    let mut fx = Fixture::new();
    let x = member("x");
    let nodes = fx.chain(&[6000, 5000]);
    fx.grant(&nodes[0], x, 100);
    fx.grant(&nodes[0], member("y"), 150);

    let path: Vec<Address> = std::iter::once(x).chain(nodes.iter().copied()).collect();
    // 40% * 60% * 50%
    assert_eq!(fx.registry.path_share(&path).unwrap(), 12_000_000);

    let prefix = fx.registry.path_share(&path[..3]).unwrap();
    let last_hop = fx.registry.link_share(&nodes[1], &nodes[2]).unwrap() as u128;
    assert_eq!(prefix * last_hop / 100, 12_000_000);

    let receipt = fx.registry.path_transfer(&path, 50, &x).unwrap();
    assert_eq!(receipt.credited, 6);
    assert_eq!(fx.registry.balance_of(&nodes[2], &x).unwrap(), 6);
    assert_eq!(fx.registry.balance_of(&nodes[1], &x).unwrap(), 0);
}

#[test]
fn targets_resolve_from_the_origin() {
    // root -> {left, right}; both confirm leaf
    let mut fx = Fixture::new();
    let root = fx.node(&[]);
    let left = fx.child(&root, 3000);
    let right = fx.child(&root, 3000);
    let leaf = fx.node(&[(left, 1000), (right, 2000)]);
    fx.confirm(&right, leaf).unwrap();
    fx.confirm(&left, leaf).unwrap();

    // first confirmed child of root is explored first
    assert_eq!(
        fx.registry.resolve_to_descendant(&root, &[leaf]).unwrap(),
        vec![left, leaf]
    );
    assert_eq!(
        fx.registry.resolve_to_descendant(&root, &[right, left]).unwrap(),
        vec![right, left]
    );
    assert_eq!(
        fx.registry.resolve_to_descendant(&root, &[right, leaf]).unwrap(),
        vec![right, left, leaf]
    );

    let x = member("x");
    fx.grant(&root, x, 10);
    let path = fx.registry.resolve_member_path(&x, &root, &leaf).unwrap();
    assert_eq!(path, vec![x, root, left, leaf]);
    // 100% * 30% * 10%, and the other branch at 20%
    assert_eq!(fx.registry.path_share(&path).unwrap(), 3_000_000);
    assert_eq!(fx.registry.path_share(&[x, root, right, leaf]).unwrap(), 6_000_000);
}

#[test]
fn cycles_cannot_be_confirmed() {
    let mut fx = Fixture::new();
    let nodes = fx.chain(&[5000, 5000]);
    let (top, bottom) = (nodes[0], nodes[2]);

    fx.pass(&top, ProposalKind::DeclareParentLink { parent: bottom, basis_points: 100 })
        .unwrap();
    assert_eq!(
        fx.confirm(&bottom, top),
        Err(Error::CycleDetected { parent: bottom, child: top })
    );
    // the declared but unconfirmed link stays invisible
    assert!(matches!(
        fx.registry.resolve_to_descendant(&bottom, &[top]),
        Err(Error::NoPathFound { .. })
    ));
}

#[test]
fn declared_links_never_exceed_full_share() {
    let mut fx = Fixture::new();
    let p1 = fx.node(&[]);
    let p2 = fx.node(&[]);
    let child = fx.node(&[(p1, 7000)]);

    assert_eq!(
        fx.pass(&child, ProposalKind::DeclareParentLink { parent: p2, basis_points: 3001 }),
        Err(Error::InvalidPercentage {
            requested: 3001,
            total: 10_001
        })
    );
    fx.pass(&child, ProposalKind::DeclareParentLink { parent: p2, basis_points: 3000 })
        .unwrap();
    assert_eq!(
        fx.registry.node(&child).unwrap().parent_links().declared_total(),
        10_000
    );
}

#[test]
fn path_length_limit_from_config() {
    let mut fx = Fixture::with_config(RegistryConfig::new().with_max_path_len(3));
    let x = member("x");
    let nodes = fx.chain(&[5000, 5000]);
    fx.grant(&nodes[0], x, 1);

    assert!(fx.registry.path_share(&[x, nodes[0], nodes[1]]).is_ok());
    assert!(matches!(
        fx.registry.path_share(&[x, nodes[0], nodes[1], nodes[2]]),
        Err(Error::MalformedPath { .. })
    ));
}

#[test]
fn journal_tells_the_story() {
    let (mut fx, x, a, b) = two_nodes();
    fx.confirm(&a, b).unwrap();
    fx.registry.path_transfer(&[x, a, b], 50, &x).unwrap();

    let entries = fx.registry.journal();
    assert!(entries.windows(2).all(|w| w[0].seq < w[1].seq));

    let confirmed = entries
        .iter()
        .find(|e| matches!(e.event, RegistryEvent::ChildLinkConfirmed { .. }))
        .unwrap();
    assert_eq!(confirmed.node, a);
    assert_eq!(
        confirmed.event,
        RegistryEvent::ChildLinkConfirmed {
            child: b,
            basis_points: 6000
        }
    );

    let credited = entries.last().unwrap();
    assert_eq!(credited.node, b);
    assert_eq!(
        credited.event,
        RegistryEvent::TransferCredited { member: x, amount: 12 }
    );

    // journal lines are plain JSON objects tagged by type
    let json = serde_json::to_value(credited).unwrap();
    assert_eq!(json["event"]["type"], "TransferCredited");
    assert_eq!(json["node"], b.to_hex());
}
