//! CSV ledger import: the minimal stand-in for the upstream import
//! pipeline, so the binary works end to end.

use std::path::Path;

use chrono::NaiveDate;

use ledgerline_model::LedgerEntry;

/// Read ledger entries from a CSV file with the fixed ledgerline header.
///
/// Imports are all-or-nothing: any unparseable row aborts with a row-numbered
/// error instead of silently importing a partial batch.
pub fn read_entries(path: &Path) -> Result<Vec<LedgerEntry>, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let idx = |name: &str| -> Result<usize, Box<dyn std::error::Error>> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| format!("missing column '{name}'").into())
    };

    let origin_idx = idx("origin")?;
    let account_idx = idx("account")?;
    let title_idx = idx("title")?;
    let date_idx = idx("date")?;
    let document_idx = idx("document")?;
    let branch_idx = idx("branch")?;
    let cost_center_idx = idx("cost_center")?;
    let item_idx = idx("item")?;
    let debit_idx = idx("debit_cents")?;
    let credit_idx = idx("credit_cents")?;

    let optional = |field: &str| -> Option<String> {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    };

    let mut entries = Vec::new();
    for (row_no, record) in reader.records().enumerate() {
        let record = record?;
        let get = |i: usize| record.get(i).unwrap_or("");

        let date_raw = get(date_idx);
        let date = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d")
            .map_err(|_| format!("row {}: cannot parse date '{date_raw}'", row_no + 2))?;

        let parse_cents = |i: usize, name: &str| -> Result<i64, Box<dyn std::error::Error>> {
            let raw = get(i).trim();
            if raw.is_empty() {
                return Ok(0);
            }
            raw.parse()
                .map_err(|_| format!("row {}: cannot parse {name} '{raw}'", row_no + 2).into())
        };

        entries.push(LedgerEntry {
            id: 0,
            origin: get(origin_idx).trim().to_string(),
            account: get(account_idx).trim().to_string(),
            title: get(title_idx).trim().to_string(),
            date,
            document: optional(get(document_idx)),
            branch: optional(get(branch_idx)),
            cost_center: optional(get(cost_center_idx)),
            item: optional(get(item_idx)),
            debit_cents: parse_cents(debit_idx, "debit_cents")?,
            credit_cents: parse_cents(credit_idx, "credit_cents")?,
        });
    }
    Ok(entries)
}
