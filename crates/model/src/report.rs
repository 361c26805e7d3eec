use serde::Serialize;

/// One row of the generated report: an account (or derived line) with twelve
/// monthly columns and a yearly total, in integer cents, credit-positive.
#[derive(Debug, Clone, Serialize)]
pub struct ReportLine {
    /// Primary grouping kind: a cost-center classification kind, or
    /// `"virtual"` for virtual-rooted and derived lines.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_root_id: Option<i64>,
    /// `::`-joined materialized path of the owning classification node.
    pub path: String,
    pub account: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Present only when the report groups by cost-center.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_center: Option<String>,
    /// January..December, calendar order.
    pub months: [i64; 12],
    pub total_cents: i64,
    /// Display priority resolved from the ordering subsystem.
    pub priority: i64,
}

impl ReportLine {
    /// A zero-valued line: the skeleton shape before accumulation.
    pub fn empty(kind: &str, path: &str, account: &str, title: &str) -> Self {
        Self {
            kind: kind.to_string(),
            virtual_root_id: None,
            path: path.to_string(),
            account: account.to_string(),
            title: title.to_string(),
            origin: None,
            cost_center: None,
            months: [0; 12],
            total_cents: 0,
            priority: 0,
        }
    }

    /// Add a value into the month bucket (1-based calendar month) and the
    /// yearly total.
    pub fn accumulate(&mut self, month: u32, cents: i64) {
        debug_assert!((1..=12).contains(&month));
        self.months[(month as usize).saturating_sub(1).min(11)] += cents;
        self.total_cents += cents;
    }
}

/// Report envelope handed to the presentation collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEnvelope {
    pub meta: ReportMeta,
    pub lines: Vec<ReportLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub by_cost_center: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_buckets_by_calendar_month() {
        let mut line = ReportLine::empty("operational", "Revenue", "3.1.01", "Sales");
        line.accumulate(3, 500);
        line.accumulate(3, 250);
        line.accumulate(12, 100);
        assert_eq!(line.months[2], 750);
        assert_eq!(line.months[11], 100);
        assert_eq!(line.total_cents, 850);
    }
}
