use entity::{RecordId, StageId, deal, stage};

use super::RejectReason;

/// Verdict on a proposed stage move.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<'a> {
    /// The deal already sits in the target stage.
    NoOp,
    Valid {
        deal: &'a deal::Model,
        target: &'a stage::Model,
    },
    Invalid(RejectReason),
}

/// Decide whether `deal` may move to `target`. Pure; performs no I/O.
///
/// The deal must be known. A target equal to the deal's current stage is a
/// no-op even when that stage has since disappeared from `stages`; any other
/// target must name a known stage. Won and lost stages get no special
/// treatment here, a deal may leave them like any other stage.
pub fn validate_transition<'a>(
    deal: Option<&'a deal::Model>,
    deal_id: RecordId,
    target: &StageId,
    stages: &'a [stage::Model],
) -> Transition<'a> {
    let Some(deal) = deal else {
        return Transition::Invalid(RejectReason::UnknownDeal(deal_id));
    };
    if &deal.stage == target {
        return Transition::NoOp;
    }
    match stages.iter().find(|stage| &stage.id == target) {
        Some(stage) => Transition::Valid {
            deal,
            target: stage,
        },
        None => Transition::Invalid(RejectReason::UnknownStage(target.clone())),
    }
}
