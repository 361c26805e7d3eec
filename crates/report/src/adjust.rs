//! Adjustment-layer resolution: the active override map, the inclusion list,
//! and the idempotent auto-adjustment sweep.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use ledgerline_model::{
    fingerprint, AdjustmentKind, AdjustmentRecord, AdjustmentStatus, LedgerEntry,
};
use ledgerline_store::Store;

use crate::config::EngineConfig;
use crate::error::EngineError;

/// The adjustment layer as the aggregation engine consumes it.
#[derive(Debug, Default)]
pub struct ActiveAdjustments {
    /// Fingerprint → the override that substitutes that ledger row. At most
    /// one active override per fingerprint is assumed valid; a concurrent
    /// second record is a data-integrity bug upstream, not handled here.
    pub overrides: HashMap<String, AdjustmentRecord>,
    /// Wholly synthetic rows appended after the base pass.
    pub inclusions: Vec<AdjustmentRecord>,
    /// Fingerprints whose override was invalidated: the underlying ledger
    /// rows are dropped from the report entirely.
    pub invalidated: HashSet<String>,
}

fn partition(records: Vec<AdjustmentRecord>) -> ActiveAdjustments {
    let mut active = ActiveAdjustments::default();
    for rec in records {
        debug_assert_ne!(rec.status, AdjustmentStatus::Rejected);
        if rec.kind.is_override() {
            let Some(fp) = rec.fingerprint.clone() else {
                warn!(id = rec.id, kind = %rec.kind, "override adjustment without fingerprint");
                continue;
            };
            if rec.invalid {
                active.invalidated.insert(fp);
            } else {
                active.overrides.insert(fp, rec);
            }
        } else if !rec.invalid {
            active.inclusions.push(rec);
        }
    }
    active
}

fn synthesize_nonoperating(row: &LedgerEntry, fp: String, config: &EngineConfig) -> AdjustmentRecord {
    let now = chrono::Utc::now().to_rfc3339();
    AdjustmentRecord {
        id: 0,
        kind: AdjustmentKind::AutoNonoperating,
        status: AdjustmentStatus::Approved,
        invalid: false,
        fingerprint: Some(fp),
        origin: Some(row.origin.clone()),
        account: Some(row.account.clone()),
        title: Some(row.title.clone()),
        date: Some(row.date),
        document: row.document.clone(),
        branch: row.branch.clone(),
        cost_center: row.cost_center.clone(),
        item: row.item.clone(),
        debit_cents: row.debit_cents,
        credit_cents: row.credit_cents,
        show_balance: true,
        created_by: config.auto_adjust_author.clone(),
        created_at: now.clone(),
        approved_by: Some(config.auto_adjust_author.clone()),
        approved_at: Some(now),
    }
}

/// Load the active adjustment layer.
///
/// Side effect: every ledger row carrying the configured non-operating item
/// marker and lacking an adjustment for its fingerprint gets a pre-approved
/// auto-adjustment synthesized and persisted in one batched insert.
/// Idempotent: the next call finds the fingerprints already covered.
pub fn resolve_adjustments(
    store: &Store,
    config: &EngineConfig,
) -> Result<ActiveAdjustments, EngineError> {
    let mut active = partition(store.adjustments_for_resolution()?);

    let marked = store.ledger_entries_by_item(&config.non_operating_item)?;
    let mut batch: Vec<AdjustmentRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for row in &marked {
        let fp = fingerprint(row);
        if active.overrides.contains_key(&fp)
            || active.invalidated.contains(&fp)
            || !seen.insert(fp.clone())
        {
            continue;
        }
        batch.push(synthesize_nonoperating(row, fp, config));
    }

    if !batch.is_empty() {
        let inserted = store.insert_adjustments(&batch)?;
        debug!(inserted, "synthesized non-operating adjustments");
        // Reload so the map carries the persisted records, ids included.
        active = partition(store.adjustments_for_resolution()?);
    }

    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(account: &str, item: Option<&str>, credit: i64) -> LedgerEntry {
        LedgerEntry {
            id: 0,
            origin: "erp".into(),
            account: account.into(),
            title: format!("Account {account}"),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            document: Some(format!("DOC-{account}")),
            branch: None,
            cost_center: Some("200".into()),
            item: item.map(Into::into),
            debit_cents: 0,
            credit_cents: credit,
        }
    }

    fn adjustment(kind: AdjustmentKind, fp: Option<&str>) -> AdjustmentRecord {
        AdjustmentRecord {
            id: 0,
            kind,
            status: AdjustmentStatus::Pending,
            invalid: false,
            fingerprint: fp.map(Into::into),
            origin: Some("erp".into()),
            account: Some("3.1.01".into()),
            title: None,
            date: NaiveDate::from_ymd_opt(2024, 3, 10),
            document: None,
            branch: None,
            cost_center: None,
            item: None,
            debit_cents: 0,
            credit_cents: 100,
            show_balance: true,
            created_by: "tester".into(),
            created_at: "2024-04-01T00:00:00Z".into(),
            approved_by: None,
            approved_at: None,
        }
    }

    #[test]
    fn partition_splits_kinds() {
        let store = Store::open_in_memory().unwrap();
        store
            .create_adjustment(&adjustment(AdjustmentKind::Edit, Some("fp-1")))
            .unwrap();
        store
            .create_adjustment(&adjustment(AdjustmentKind::Include, None))
            .unwrap();
        store
            .create_adjustment(&adjustment(AdjustmentKind::AutoIntergroup, None))
            .unwrap();
        let mut invalid = adjustment(AdjustmentKind::Edit, Some("fp-2"));
        invalid.invalid = true;
        store.create_adjustment(&invalid).unwrap();

        let active = resolve_adjustments(&store, &EngineConfig::default()).unwrap();
        assert_eq!(active.overrides.len(), 1);
        assert!(active.overrides.contains_key("fp-1"));
        assert_eq!(active.inclusions.len(), 2);
        assert_eq!(
            active.invalidated,
            HashSet::from(["fp-2".to_string()])
        );
    }

    #[test]
    fn sweep_synthesizes_once() {
        let store = Store::open_in_memory().unwrap();
        let config = EngineConfig::default();
        store
            .insert_entries(&[
                entry("5.9.01", Some("NONOP"), 300),
                entry("3.1.01", None, 500),
            ])
            .unwrap();

        let active = resolve_adjustments(&store, &config).unwrap();
        assert_eq!(active.overrides.len(), 1);
        let auto = active.overrides.values().next().unwrap();
        assert_eq!(auto.kind, AdjustmentKind::AutoNonoperating);
        assert_eq!(auto.status, AdjustmentStatus::Approved);
        assert!(auto.id > 0, "synthesized record must be persisted");

        // Second resolution finds the fingerprint covered: nothing new.
        let again = resolve_adjustments(&store, &config).unwrap();
        assert_eq!(again.overrides.len(), 1);
        assert_eq!(store.list_adjustments().unwrap().len(), 1);
    }

    #[test]
    fn sweep_skips_rows_already_adjusted() {
        let store = Store::open_in_memory().unwrap();
        let config = EngineConfig::default();
        let row = entry("5.9.01", Some("NONOP"), 300);
        let fp = fingerprint(&row);
        store.insert_entries(&[row]).unwrap();
        store
            .create_adjustment(&adjustment(AdjustmentKind::Edit, Some(&fp)))
            .unwrap();

        let active = resolve_adjustments(&store, &config).unwrap();
        assert_eq!(active.overrides.len(), 1);
        assert_eq!(active.overrides[&fp].kind, AdjustmentKind::Edit);
        assert_eq!(store.list_adjustments().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_marked_rows_synthesize_one_record() {
        let store = Store::open_in_memory().unwrap();
        let config = EngineConfig::default();
        // same identity fields twice, identical fingerprint
        store
            .insert_entries(&[
                entry("5.9.01", Some("NONOP"), 300),
                entry("5.9.01", Some("NONOP"), 300),
            ])
            .unwrap();

        let active = resolve_adjustments(&store, &config).unwrap();
        assert_eq!(active.overrides.len(), 1);
        assert_eq!(store.list_adjustments().unwrap().len(), 1);
    }
}
