//! Aggregation of a normalized collection into summary statistics

use crate::types::{NormalizedRecord, StatsSummary};

/// Aggregation type for rollups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateType {
    Min,
    Max,
    Avg,
}

/// Accumulator for calculating aggregates over multiple observations
#[derive(Debug, Clone)]
pub struct Accumulator {
    observations: Vec<f64>,
    aggregate_type: AggregateType,
}

impl Accumulator {
    pub fn new(aggregate_type: AggregateType) -> Self {
        Self {
            observations: Vec::new(),
            aggregate_type,
        }
    }

    pub fn add(&mut self, value: f64) {
        self.observations.push(value);
    }

    /// `None` when nothing was added; the mean of zero values is undefined
    pub fn result(&self) -> Option<f64> {
        if self.observations.is_empty() {
            return None;
        }

        Some(match self.aggregate_type {
            AggregateType::Min => self
                .observations
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min),
            AggregateType::Max => self
                .observations
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max),
            AggregateType::Avg => {
                let sum: f64 = self.observations.iter().sum();
                sum / self.observations.len() as f64
            }
        })
    }

    pub fn count(&self) -> usize {
        self.observations.len()
    }
}

/// Reduce a collection to its summary
///
/// Averages `pressure_avg`, takes the maximum of `pressure_max` and the
/// minimum of `pressure_min`. Values stay unrounded; the summary rounds
/// them to one decimal when it is serialized. Returns `None` for an empty
/// collection.
pub fn summarize(records: &[NormalizedRecord]) -> Option<StatsSummary> {
    let mut avg = Accumulator::new(AggregateType::Avg);
    let mut max = Accumulator::new(AggregateType::Max);
    let mut min = Accumulator::new(AggregateType::Min);

    for record in records {
        avg.add(record.pressure_avg);
        max.add(record.pressure_max);
        min.add(record.pressure_min);
    }

    Some(StatsSummary {
        avg_pressure: avg.result()?,
        max_pressure: max.result()?,
        min_pressure: min.result()?,
        total_records: avg.count(),
    })
}
