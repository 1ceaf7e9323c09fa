use std::collections::{HashMap, HashSet};

use entity::{RecordId, StageId, deal, stage};
use serde::Serialize;

use super::PipelineError;

/// Count and value of the deals in one column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StageAggregate {
    pub count: usize,
    pub sum_cents: i64,
}

impl StageAggregate {
    fn add(&mut self, deal: &deal::Model) {
        self.count += 1;
        self.sum_cents = self.sum_cents.saturating_add(deal.value_or_zero());
    }

    fn of<'a>(deals: impl IntoIterator<Item = &'a deal::Model>) -> Self {
        let mut aggregate = Self::default();
        for deal in deals {
            aggregate.add(deal);
        }
        aggregate
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StageColumn {
    pub stage: stage::Model,
    pub deals: Vec<deal::Model>,
    pub aggregate: StageAggregate,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PipelineBoard {
    pub columns: Vec<StageColumn>,
    /// Deals whose stage reference names no known stage.
    pub unassigned: Vec<RecordId>,
    /// Totals over every column; unassigned deals are not counted.
    pub total: StageAggregate,
}

impl PipelineBoard {
    pub fn column(&self, id: &StageId) -> Option<&StageColumn> {
        self.columns.iter().find(|column| &column.stage.id == id)
    }

    pub fn aggregate(&self, id: &StageId) -> Option<StageAggregate> {
        self.column(id).map(|column| column.aggregate)
    }

    /// Recompute every column from `deals` and compare with what the board holds.
    pub fn verify(&self, deals: &[deal::Model]) -> Result<(), PipelineError> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            let expected = if seen.insert(&column.stage.id) {
                StageAggregate::of(deals.iter().filter(|deal| deal.stage == column.stage.id))
            } else {
                StageAggregate::default()
            };
            let members = StageAggregate::of(column.deals.iter());
            if column.aggregate != expected || members != expected {
                return Err(PipelineError::AggregateInconsistency {
                    stage: column.stage.id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Group deals into stage columns.
///
/// Columns follow stage display order; deals keep their input order inside a
/// column. A deal lands in at most one column. If two stages share an
/// identifier only the first in display order receives members.
pub fn partition(deals: &[deal::Model], stages: &[stage::Model]) -> PipelineBoard {
    let mut ordered = stages.to_vec();
    stage::sort_for_display(&mut ordered);

    let mut index: HashMap<&StageId, usize> = HashMap::with_capacity(ordered.len());
    for (position, stage) in ordered.iter().enumerate() {
        index.entry(&stage.id).or_insert(position);
    }

    let mut buckets: Vec<Vec<deal::Model>> = vec![Vec::new(); ordered.len()];
    let mut unassigned = Vec::new();
    for deal in deals {
        match index.get(&deal.stage) {
            Some(&position) => buckets[position].push(deal.clone()),
            None => unassigned.push(deal.id),
        }
    }

    let mut total = StageAggregate::default();
    let columns = ordered
        .into_iter()
        .zip(buckets)
        .map(|(stage, deals)| {
            let aggregate = StageAggregate::of(deals.iter());
            total.count += aggregate.count;
            total.sum_cents = total.sum_cents.saturating_add(aggregate.sum_cents);
            StageColumn {
                stage,
                deals,
                aggregate,
            }
        })
        .collect();

    PipelineBoard {
        columns,
        unassigned,
        total,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn deal(id: RecordId, value: Option<i64>, stage: &str) -> deal::Model {
        let now = Utc::now();
        deal::Model {
            id,
            title: format!("Deal {}", id),
            value_cents: value,
            stage: StageId::from(stage),
            contact_id: None,
            notes: String::new(),
            close_date: None,
            probability: 50,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_stage_list_produces_no_columns() {
        let board = partition(&[deal(1, Some(100), "lead")], &[]);
        assert!(board.columns.is_empty());
        assert_eq!(board.unassigned, vec![1]);
        assert_eq!(board.total, StageAggregate::default());
    }

    #[test]
    fn missing_values_count_as_zero() {
        let stages = [stage::Model::new("lead", "Lead", 1)];
        let board = partition(&[deal(1, None, "lead"), deal(2, Some(250), "lead")], &stages);
        let lead = board.aggregate(&StageId::from("lead")).unwrap();
        assert_eq!(lead, StageAggregate { count: 2, sum_cents: 250 });
    }

    #[test]
    fn columns_follow_sort_order_not_input_order() {
        let stages = [
            stage::Model::new("won", "Won", 9),
            stage::Model::new("lead", "Lead", 1),
        ];
        let board = partition(&[], &stages);
        let ids: Vec<&str> = board.columns.iter().map(|c| c.stage.id.as_str()).collect();
        assert_eq!(ids, vec!["lead", "won"]);
    }

    #[test]
    fn verify_catches_tampered_aggregates() {
        let stages = [stage::Model::new("lead", "Lead", 1)];
        let deals = [deal(1, Some(100), "lead")];
        let mut board = partition(&deals, &stages);
        assert!(board.verify(&deals).is_ok());
        board.columns[0].aggregate.sum_cents += 1;
        assert_eq!(
            board.verify(&deals),
            Err(PipelineError::AggregateInconsistency {
                stage: StageId::from("lead")
            })
        );
    }

    #[test]
    fn duplicate_stage_ids_do_not_double_count() {
        let stages = [
            stage::Model::new("lead", "Lead", 1),
            stage::Model::new("lead", "Lead again", 2),
        ];
        let board = partition(&[deal(1, Some(10), "lead")], &stages);
        assert_eq!(board.total.count, 1);
        assert_eq!(board.columns[1].aggregate.count, 0);
        assert!(board.verify(&[deal(1, Some(10), "lead")]).is_ok());
    }
}
