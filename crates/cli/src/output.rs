//! Plain-text rendering for report lines, adjustments, and the ordered tree.

use ledgerline_model::{AdjustmentRecord, ReportEnvelope};
use ledgerline_ordering::TreeNode;

/// Cents → "1234.56" (sign preserved).
fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

pub fn print_report(envelope: &ReportEnvelope) {
    println!(
        "# {} lines, generated {}",
        envelope.lines.len(),
        envelope.meta.generated_at
    );
    println!(
        "{:>4}  {:<12} {:<32} {:<10} {:>14}",
        "prio", "account", "title", "kind", "total"
    );
    for line in &envelope.lines {
        let account = if line.account.is_empty() {
            "(derived)"
        } else {
            line.account.as_str()
        };
        let title = match &line.cost_center {
            Some(cc) => format!("{} [{}]", line.title, cc),
            None => line.title.clone(),
        };
        println!(
            "{:>4}  {:<12} {:<32} {:<10} {:>14}",
            line.priority,
            account,
            title,
            line.kind,
            format_cents(line.total_cents),
        );
    }
}

pub fn print_adjustments(records: &[AdjustmentRecord]) {
    println!(
        "{:>5}  {:<18} {:<9} {:<7} {:<12} {:>12}",
        "id", "kind", "status", "invalid", "account", "value"
    );
    for rec in records {
        println!(
            "{:>5}  {:<18} {:<9} {:<7} {:<12} {:>12}",
            rec.id,
            rec.kind.to_string(),
            rec.status.to_string(),
            rec.invalid,
            rec.account.as_deref().unwrap_or("-"),
            format_cents(rec.signed_cents()),
        );
    }
}

pub fn print_tree(nodes: &[TreeNode], indent: usize) {
    for node in nodes {
        println!(
            "{}{} ({}/{}, pos {})",
            "  ".repeat(indent),
            node.label,
            node.kind,
            node.node_ref,
            node.position
        );
        print_tree(&node.children, indent + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_formatting() {
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(500), "5.00");
        assert_eq!(format_cents(-123456), "-1234.56");
        assert_eq!(format_cents(7), "0.07");
    }
}
