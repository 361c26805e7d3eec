//! Derived-line evaluation: formula-bearing virtual nodes computed over the
//! aggregated report, in ordering-priority order.
//!
//! This is a strict forward chain, not a dependency graph: a formula sees
//! the results of nodes evaluated before it in the same pass and the
//! pre-evaluation (zero) state of anything later.

use std::collections::HashMap;

use tracing::debug;

use ledgerline_model::{Formula, FormulaOp, OperandRef, ReportLine};
use ledgerline_ordering::Positions;
use ledgerline_store::Store;

use crate::config::EngineConfig;
use crate::error::EngineError;

type Months = [f64; 12];

/// Append derived lines to an aggregated report and re-sort by priority.
pub fn evaluate_virtual_nodes(
    mut lines: Vec<ReportLine>,
    store: &Store,
    positions: &Positions<'_>,
    config: &EngineConfig,
) -> Result<Vec<ReportLine>, EngineError> {
    // Every aggregated line feeds the lookup under all of its groupings, so
    // an operand can reference a kind, any path segment, or a virtual root.
    let mut lookup: HashMap<String, Months> = HashMap::new();
    for line in &lines {
        register(&mut lookup, format!("kind:{}", line.kind), &line.months);
        for segment in line.path.split("::").filter(|s| !s.is_empty()) {
            register(&mut lookup, format!("node:{segment}"), &line.months);
        }
        if let Some(virtual_id) = line.virtual_root_id {
            register(&mut lookup, format!("virtual:{virtual_id}"), &line.months);
        }
    }

    let mut formula_nodes = Vec::new();
    for node in store.virtual_nodes()? {
        if node.formula.is_some() {
            let priority = positions.virtual_priority(node.id, config.default_priority)?;
            formula_nodes.push((priority, node));
        }
    }
    formula_nodes.sort_by_key(|(priority, node)| (*priority, node.id));

    for (priority, node) in formula_nodes {
        let Some(formula) = node.formula else {
            continue;
        };
        let months = eval(&lookup, &formula);
        debug!(node = %node.name, priority, "evaluated virtual node");

        // Later-evaluated formulas may reference this node by id or name.
        lookup.insert(format!("virtual:{}", node.id), months);
        lookup.insert(format!("virtual:{}", node.name), months);

        let rounded = months.map(|v| v.round() as i64);
        lines.push(ReportLine {
            kind: "virtual".into(),
            virtual_root_id: Some(node.id),
            path: node.name.clone(),
            account: String::new(),
            title: node.name,
            origin: None,
            cost_center: None,
            months: rounded,
            total_cents: rounded.iter().sum(),
            priority,
        });
    }

    lines.sort_by_key(|l| l.priority);
    Ok(lines)
}

fn register(lookup: &mut HashMap<String, Months>, key: String, months: &[i64; 12]) {
    let slot = lookup.entry(key).or_insert([0.0; 12]);
    for (i, value) in months.iter().enumerate() {
        slot[i] += *value as f64;
    }
}

/// Exact-key lookup with a case-insensitive fallback scan; unknown operands
/// read as zero.
fn operand_months(lookup: &HashMap<String, Months>, operand: &OperandRef) -> Months {
    let key = operand.lookup_key();
    if let Some(months) = lookup.get(&key) {
        return *months;
    }
    lookup
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        .map(|(_, months)| *months)
        .unwrap_or([0.0; 12])
}

fn eval(lookup: &HashMap<String, Months>, formula: &Formula) -> Months {
    let series: Vec<Months> = formula
        .operands
        .iter()
        .map(|operand| operand_months(lookup, operand))
        .collect();

    let mut out = [0.0; 12];
    for i in 0..12 {
        let value = match formula.op {
            FormulaOp::Sum => series.iter().map(|s| s[i]).sum(),
            FormulaOp::Difference => {
                let first = series.first().map(|s| s[i]).unwrap_or(0.0);
                let rest: f64 = series.iter().skip(1).map(|s| s[i]).sum();
                first - rest
            }
            FormulaOp::Product => {
                if series.is_empty() {
                    0.0
                } else {
                    series.iter().map(|s| s[i]).product()
                }
            }
            FormulaOp::Quotient => {
                let numerator = series.first().map(|s| s[i]).unwrap_or(0.0);
                let divisor = series.get(1).map(|s| s[i]).unwrap_or(0.0);
                if divisor == 0.0 {
                    0.0
                } else {
                    numerator / divisor
                }
            }
        };
        out[i] = value * formula.multiplier;
    }
    out
}
