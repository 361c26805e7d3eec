use ledgerline_model::{ReportEnvelope, ReportMeta};
use ledgerline_ordering::Positions;
use ledgerline_store::Store;

use crate::adjust::resolve_adjustments;
use crate::aggregate::{generate_report, ReportParams};
use crate::classify::Hierarchy;
use crate::config::EngineConfig;
use crate::derived::evaluate_virtual_nodes;
use crate::error::EngineError;

/// One full report run: resolve the adjustment layer, build the hierarchy,
/// aggregate, evaluate derived lines, wrap for presentation.
///
/// Runs inside the caller's transactional unit; the engine itself opens no
/// nested scopes and spawns nothing.
pub fn run(
    store: &Store,
    params: &ReportParams,
    config: &EngineConfig,
) -> Result<ReportEnvelope, EngineError> {
    let positions = Positions::new(store, config.ordering_gap);
    let adjustments = resolve_adjustments(store, config)?;
    let hierarchy = Hierarchy::build(store)?;
    let lines = generate_report(store, &hierarchy, &adjustments, &positions, params, config)?;
    let lines = evaluate_virtual_nodes(lines, store, &positions, config)?;

    Ok(ReportEnvelope {
        meta: ReportMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            origin: params.origin.clone(),
            by_cost_center: params.by_cost_center,
        },
        lines,
    })
}
