use std::collections::HashMap;

use entity::{StageId, deal, stage};
use serde::Serialize;

/// Dashboard figures derived from the current deal list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PipelineMetrics {
    pub total_deals: usize,
    /// Deals outside every won/lost stage. Deals in unknown stages count as open.
    pub active_deals: usize,
    pub open_value_cents: i64,
    pub average_open_cents: i64,
    pub won_deals: usize,
    pub won_value_cents: i64,
    /// Share of all deals that are won, rounded to a whole percent.
    pub win_rate_percent: u32,
}

pub fn pipeline_metrics(deals: &[deal::Model], stages: &[stage::Model]) -> PipelineMetrics {
    let outcome: HashMap<&StageId, &stage::Model> =
        stages.iter().map(|stage| (&stage.id, stage)).collect();

    let mut metrics = PipelineMetrics {
        total_deals: deals.len(),
        ..PipelineMetrics::default()
    };
    for deal in deals {
        let stage = outcome.get(&deal.stage);
        if stage.is_some_and(|stage| stage.is_won) {
            metrics.won_deals += 1;
            metrics.won_value_cents = metrics.won_value_cents.saturating_add(deal.value_or_zero());
        }
        if !stage.is_some_and(|stage| stage.is_closed()) {
            metrics.active_deals += 1;
            metrics.open_value_cents = metrics.open_value_cents.saturating_add(deal.value_or_zero());
        }
    }
    if metrics.active_deals > 0 {
        metrics.average_open_cents = metrics.open_value_cents / metrics.active_deals as i64;
    }
    if metrics.total_deals > 0 {
        let rate = metrics.won_deals as f64 * 100.0 / metrics.total_deals as f64;
        metrics.win_rate_percent = rate.round() as u32;
    }
    metrics
}
