use serde::Deserialize;

use crate::error::EngineError;

/// Engine configuration. Every knob has a default so a missing config file
/// means "stock behavior", not an error.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Display name for report metadata.
    pub name: String,
    /// Item marker that flags a ledger row as non-operating. Rows carrying
    /// it get an auto-adjustment synthesized on resolution.
    pub non_operating_item: String,
    /// Author recorded on synthesized auto-adjustments.
    pub auto_adjust_author: String,
    /// Spacing between seeded ordering positions.
    pub ordering_gap: i64,
    /// Sort priority for lines with no ordering entry at all.
    pub default_priority: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "ledgerline".into(),
            non_operating_item: "NONOP".into(),
            auto_adjust_author: "system".into(),
            ordering_gap: 10,
            default_priority: 999,
        }
    }
}

impl EngineConfig {
    pub fn from_toml(raw: &str) -> Result<Self, EngineError> {
        toml::from_str(raw).map_err(|e| EngineError::ConfigParse(e.to_string()))
    }
}
