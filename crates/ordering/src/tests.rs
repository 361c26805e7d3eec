use super::*;

use ledgerline_model::{CostCenter, RootContext, VirtualNode};
use ledgerline_store::Store;

struct Fixture {
    store: Store,
    ebitda: i64,
    revenue: i64,
    domestic: i64,
    expenses: i64,
}

fn cc(code: &str, kind: &str) -> RootContext {
    RootContext::CostCenter(CostCenter {
        code: code.into(),
        kind: kind.into(),
        name: format!("CC {code}"),
    })
}

fn fixture() -> Fixture {
    let store = Store::open_in_memory().unwrap();
    for (code, kind) in [("200", "operational"), ("300", "administrative")] {
        store
            .insert_cost_center(&CostCenter {
                code: code.into(),
                kind: kind.into(),
                name: format!("CC {code}"),
            })
            .unwrap();
    }
    let ebitda = store
        .insert_virtual_node(&VirtualNode {
            id: 0,
            name: "EBITDA".into(),
            formula: None,
            style: None,
        })
        .unwrap();
    let revenue = store
        .insert_node("Revenue", None, Some(&cc("200", "operational")))
        .unwrap();
    let domestic = store.insert_node("Domestic", Some(revenue), None).unwrap();
    let expenses = store
        .insert_node("Expenses", None, Some(&cc("300", "administrative")))
        .unwrap();
    store.insert_binding(revenue, "3.1.01", None, 0).unwrap();
    store.insert_binding(domestic, "3.1.02", None, 0).unwrap();
    store
        .insert_label_override("9.9.01", "Manual KPI", None, Some(ebitda))
        .unwrap();
    Fixture {
        store,
        ebitda,
        revenue,
        domestic,
        expenses,
    }
}

#[test]
fn initialize_is_idempotent() {
    let fx = fixture();
    let positions = Positions::new(&fx.store, DEFAULT_GAP);
    let first = positions.initialize(false).unwrap();
    assert!(first > 0);
    let second = positions.initialize(false).unwrap();
    assert_eq!(second, 0);
}

#[test]
fn initialize_seeds_gap_progression_per_context() {
    let fx = fixture();
    let positions = Positions::new(&fx.store, DEFAULT_GAP);
    positions.initialize(false).unwrap();

    let root = positions.siblings(ROOT_CTX).unwrap();
    let pos: Vec<i64> = root.iter().map(|s| s.position).collect();
    assert_eq!(pos, vec![10, 20, 30]);
    // virtual nodes come first, then root groups in id order
    assert_eq!(root[0].kind, "virtual");
    assert_eq!(root[1].node_ref, fx.revenue.to_string());
    assert_eq!(root[2].node_ref, fx.expenses.to_string());

    let kinds = positions.siblings(KINDS_CTX).unwrap();
    let refs: Vec<&str> = kinds.iter().map(|s| s.node_ref.as_str()).collect();
    assert_eq!(refs, vec!["administrative", "operational"]);

    let under_revenue = positions
        .siblings(&format!("group_{}", fx.revenue))
        .unwrap();
    assert_eq!(under_revenue.len(), 2);
    assert_eq!(under_revenue[0].kind, "subgroup");
    assert_eq!(under_revenue[1].kind, "account");
    assert_eq!(under_revenue[1].depth, 1);
    assert_eq!(
        under_revenue[1].path.as_deref(),
        Some(format!("root::group_{}", fx.revenue).as_str())
    );
}

#[test]
fn reset_reseeds_from_scratch() {
    let fx = fixture();
    let positions = Positions::new(&fx.store, DEFAULT_GAP);
    let first = positions.initialize(false).unwrap();
    positions
        .bulk_reorder(ROOT_CTX, &[("virtual".into(), fx.ebitda.to_string(), 900)])
        .unwrap();
    let reseeded = positions.initialize(true).unwrap();
    assert_eq!(reseeded, first);
    let root = positions.siblings(ROOT_CTX).unwrap();
    assert_eq!(root[0].position, 10);
}

#[test]
fn add_node_at_end_lands_after_current_max() {
    let fx = fixture();
    let positions = Positions::new(&fx.store, DEFAULT_GAP);
    positions
        .bulk_reorder(
            "cc_200",
            &[
                ("subgrupo".into(), "1".into(), 10),
                ("subgrupo".into(), "2".into(), 25),
            ],
        )
        .unwrap();

    positions
        .add_node("subgrupo", "77", "cc_200", Placement::End)
        .unwrap();

    let siblings = positions.siblings("cc_200").unwrap();
    let last = siblings.last().unwrap();
    assert_eq!(last.node_ref, "77");
    assert_eq!(last.position, 35);
}

#[test]
fn add_node_at_start_floors_at_one() {
    let fx = fixture();
    let positions = Positions::new(&fx.store, DEFAULT_GAP);
    positions
        .bulk_reorder("cc_200", &[("subgrupo".into(), "1".into(), 10)])
        .unwrap();

    let first = positions
        .add_node("subgrupo", "5", "cc_200", Placement::Start)
        .unwrap();
    assert_eq!(first.position, 1);

    let empty = positions
        .add_node("subgrupo", "9", "cc_900", Placement::Start)
        .unwrap();
    assert_eq!(empty.position, DEFAULT_GAP);
}

#[test]
fn move_relative_to_anchor() {
    let fx = fixture();
    let positions = Positions::new(&fx.store, DEFAULT_GAP);
    positions.initialize(false).unwrap();

    // Put EBITDA right after Revenue: 20 + gap/2
    let slot = positions
        .move_entry(
            "virtual",
            &fx.ebitda.to_string(),
            ROOT_CTX,
            ROOT_CTX,
            None,
            Some(&Anchor::After {
                kind: "group".into(),
                node_ref: fx.revenue.to_string(),
            }),
        )
        .unwrap();
    assert_eq!(slot.position, 25);

    let slot = positions
        .move_entry(
            "virtual",
            &fx.ebitda.to_string(),
            ROOT_CTX,
            ROOT_CTX,
            None,
            Some(&Anchor::Before {
                kind: "group".into(),
                node_ref: fx.expenses.to_string(),
            }),
        )
        .unwrap();
    assert_eq!(slot.position, 25);
}

#[test]
fn move_inside_switches_to_child_context() {
    let fx = fixture();
    let positions = Positions::new(&fx.store, DEFAULT_GAP);
    positions.initialize(false).unwrap();

    let from_ctx = format!("subgroup_{}", fx.domestic);
    let slot = positions
        .move_entry(
            "account",
            "3.1.02",
            &from_ctx,
            &from_ctx,
            None,
            Some(&Anchor::Inside {
                kind: "group".into(),
                node_ref: fx.revenue.to_string(),
            }),
        )
        .unwrap();
    assert_eq!(slot.context, format!("group_{}", fx.revenue));
    // existing siblings at 10 and 20, so the end slot is 30
    assert_eq!(slot.position, 30);
    assert!(positions
        .siblings(&from_ctx)
        .unwrap()
        .is_empty());
}

#[test]
fn move_unknown_entry_fails() {
    let fx = fixture();
    let positions = Positions::new(&fx.store, DEFAULT_GAP);
    let err = positions
        .move_entry("group", "999", ROOT_CTX, ROOT_CTX, Some(50), None)
        .unwrap_err();
    assert!(matches!(err, OrderingError::UnknownEntry { .. }), "got {err}");
}

#[test]
fn normalize_restores_gap_progression() {
    let fx = fixture();
    let positions = Positions::new(&fx.store, DEFAULT_GAP);
    positions
        .bulk_reorder(
            "cc_200",
            &[
                ("subgrupo".into(), "a".into(), 3),
                ("subgrupo".into(), "b".into(), 4),
                ("subgrupo".into(), "c".into(), 97),
            ],
        )
        .unwrap();

    positions.normalize("cc_200").unwrap();

    let siblings = positions.siblings("cc_200").unwrap();
    let pairs: Vec<(&str, i64)> = siblings
        .iter()
        .map(|s| (s.node_ref.as_str(), s.position))
        .collect();
    assert_eq!(pairs, vec![("a", 10), ("b", 20), ("c", 30)]);
}

#[test]
fn priority_chain_falls_through() {
    let fx = fixture();
    let positions = Positions::new(&fx.store, DEFAULT_GAP);
    positions.initialize(false).unwrap();

    // virtual wins when present
    let p = positions
        .priority_for(Some(fx.ebitda), Some(fx.revenue), "operational", 999)
        .unwrap();
    assert_eq!(p, 10);

    // falls back to the root group
    let p = positions
        .priority_for(None, Some(fx.expenses), "administrative", 999)
        .unwrap();
    assert_eq!(p, 30);

    // falls back to the cost-center kind
    let p = positions.priority_for(None, None, "operational", 999).unwrap();
    assert_eq!(p, 20);

    // sentinel when nothing matches
    let p = positions.priority_for(None, None, "unknown", 999).unwrap();
    assert_eq!(p, 999);
}

#[test]
fn remove_node_clears_all_contexts() {
    let fx = fixture();
    let positions = Positions::new(&fx.store, DEFAULT_GAP);
    positions.initialize(false).unwrap();
    let removed = positions
        .remove_node("subgroup", &fx.domestic.to_string(), None)
        .unwrap();
    assert_eq!(removed, 1);
}

#[test]
fn tree_expands_in_position_order() {
    let fx = fixture();
    let positions = Positions::new(&fx.store, DEFAULT_GAP);
    positions.initialize(false).unwrap();

    let tree = positions.build_tree().unwrap();
    let labels: Vec<&str> = tree.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(labels, vec!["EBITDA", "Revenue", "Expenses"]);

    let revenue = &tree[1];
    assert_eq!(revenue.children.len(), 2);
    assert_eq!(revenue.children[0].label, "Domestic");
    assert_eq!(revenue.children[0].children[0].label, "3.1.02");
    assert_eq!(revenue.children[1].label, "3.1.01");

    // account labeled directly under the virtual node, with its custom label
    let ebitda = &tree[0];
    assert_eq!(ebitda.children.len(), 1);
    assert_eq!(ebitda.children[0].label, "Manual KPI");
}

#[test]
fn tree_skips_orphan_entries() {
    let fx = fixture();
    let positions = Positions::new(&fx.store, DEFAULT_GAP);
    positions.initialize(false).unwrap();
    // entry pointing at a node that no longer exists
    positions
        .bulk_reorder(ROOT_CTX, &[("group".into(), "424242".into(), 5)])
        .unwrap();

    let tree = positions.build_tree().unwrap();
    assert_eq!(tree.len(), 3, "orphan must be skipped, not rendered");
}
