use std::{sync::Arc, time::Duration};

use entity::{RecordId, StageId, deal, stage};
use platform_store::{DealStore, RecordStore, StageStore, StoreError};
use serde::Serialize;
use tracing::{Instrument, debug, info, info_span, warn};

use super::{
    PipelineError,
    metrics::{PipelineMetrics, pipeline_metrics},
    partition::{PipelineBoard, partition},
    transition::{Transition, validate_transition},
};

pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// A confirmed stage move.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StageMove {
    pub deal_id: RecordId,
    pub from: StageId,
    pub to: StageId,
    /// The target stage is flagged as won; callers use this to celebrate.
    pub entered_won: bool,
    pub board: PipelineBoard,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum MoveOutcome {
    /// Target equals the current stage. Nothing was written or recomputed.
    Unchanged,
    Moved(StageMove),
}

impl MoveOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, MoveOutcome::Moved(_))
    }
}

/// One user's view of the pipeline.
///
/// Local deal and stage lists change only through [`PipelineSession::reload`]
/// or a stage move the store has acknowledged.
pub struct PipelineSession {
    deals_store: Arc<dyn DealStore>,
    stages_store: Arc<dyn StageStore>,
    deals: Vec<deal::Model>,
    stages: Vec<stage::Model>,
    write_timeout: Duration,
}

impl PipelineSession {
    /// Read deals and stages from the stores.
    pub async fn load(
        deals_store: Arc<dyn DealStore>,
        stages_store: Arc<dyn StageStore>,
    ) -> Result<Self, PipelineError> {
        let mut session = Self {
            deals_store,
            stages_store,
            deals: Vec::new(),
            stages: Vec::new(),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        };
        session.reload().await?;
        Ok(session)
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub async fn reload(&mut self) -> Result<(), PipelineError> {
        let (deals, stages) = tokio::try_join!(
            self.deals_store.list(),
            self.stages_store.list_stages()
        )
        .map_err(PipelineError::Load)?;
        debug!(deals = deals.len(), stages = stages.len(), "pipeline reloaded");
        self.deals = deals;
        self.stages = stages;
        Ok(())
    }

    pub fn deals(&self) -> &[deal::Model] {
        &self.deals
    }

    pub fn stages(&self) -> &[stage::Model] {
        &self.stages
    }

    pub fn deal(&self, id: RecordId) -> Option<&deal::Model> {
        self.deals.iter().find(|deal| deal.id == id)
    }

    pub fn board(&self) -> PipelineBoard {
        partition(&self.deals, &self.stages)
    }

    pub fn metrics(&self) -> PipelineMetrics {
        pipeline_metrics(&self.deals, &self.stages)
    }

    /// Move a deal to another stage.
    ///
    /// Validation runs before any I/O. A no-op issues no write. A rejected or
    /// failed write (timeouts included) leaves local state exactly as it was;
    /// only an acknowledged write updates the deal's stage reference.
    pub async fn move_deal(
        &mut self,
        deal_id: RecordId,
        target: &StageId,
    ) -> Result<MoveOutcome, PipelineError> {
        let span = info_span!("crm.moveDeal", deal_id, target = %target);
        async move {
            let (from, to, entered_won) =
                match validate_transition(self.deal(deal_id), deal_id, target, &self.stages) {
                    Transition::NoOp => {
                        debug!("deal already in target stage");
                        return Ok(MoveOutcome::Unchanged);
                    }
                    Transition::Invalid(reason) => {
                        warn!(%reason, "stage move rejected");
                        return Err(PipelineError::TransitionRejected(reason));
                    }
                    Transition::Valid { deal, target } => {
                        (deal.stage.clone(), target.id.clone(), target.is_won)
                    }
                };

            let write = self.deals_store.set_deal_stage(deal_id, to.clone());
            match tokio::time::timeout(self.write_timeout, write).await {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => {
                    warn!(error = %err, "stage write failed");
                    return Err(PipelineError::PersistenceFailed(err));
                }
                Err(_) => {
                    warn!(
                        timeout_ms = self.write_timeout.as_millis() as u64,
                        "stage write timed out"
                    );
                    return Err(PipelineError::PersistenceFailed(StoreError::Timeout));
                }
            }

            if let Some(local) = self.deals.iter_mut().find(|deal| deal.id == deal_id) {
                local.stage = to.clone();
            }
            let board = self.board();
            debug_assert!(board.verify(&self.deals).is_ok());
            info!(from = %from, to = %to, entered_won, "deal moved");
            Ok(MoveOutcome::Moved(StageMove {
                deal_id,
                from,
                to,
                entered_won,
                board,
            }))
        }
        .instrument(span)
        .await
    }
}
