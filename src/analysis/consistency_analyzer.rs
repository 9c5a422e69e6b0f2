use serde::{Deserialize, Serialize};

use super::{CoachingInsight, SessionAnalyzer};
use crate::session::Session;
use crate::telemetry::LapBoundary;

/// Spread between fastest and slowest valid lap, in seconds, still considered consistent
pub const DEFAULT_CONSISTENCY_THRESHOLD_S: f64 = 1.0;
pub const DEFAULT_MIN_CONSISTENCY_LAPS: usize = 3;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConsistencyVerdict {
    High,
    Inconsistent,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConsistencyAssessment {
    /// Slowest minus fastest valid lap time
    pub lap_time_range_s: f64,
    pub lap_count: usize,
    pub verdict: ConsistencyVerdict,
}

/// Range of valid lap times. Omitted with fewer than `min_laps` valid laps.
pub fn assess_consistency(
    laps: &[LapBoundary],
    threshold_s: f64,
    min_laps: usize,
) -> Option<ConsistencyAssessment> {
    let lap_times: Vec<f64> = laps
        .iter()
        .filter(|lap| lap.valid)
        .map(|lap| lap.lap_time_s)
        .collect();
    if lap_times.is_empty() || lap_times.len() < min_laps {
        return None;
    }

    let fastest = lap_times.iter().copied().fold(f64::INFINITY, f64::min);
    let slowest = lap_times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lap_time_range_s = slowest - fastest;

    Some(ConsistencyAssessment {
        lap_time_range_s,
        lap_count: lap_times.len(),
        verdict: if lap_time_range_s < threshold_s {
            ConsistencyVerdict::High
        } else {
            ConsistencyVerdict::Inconsistent
        },
    })
}

pub struct ConsistencyAnalyzer {
    threshold_s: f64,
    min_laps: usize,
}

impl ConsistencyAnalyzer {
    pub fn new(threshold_s: f64, min_laps: usize) -> Self {
        Self {
            threshold_s,
            min_laps,
        }
    }
}

impl SessionAnalyzer for ConsistencyAnalyzer {
    fn analyze(&self, session: &Session) -> Vec<CoachingInsight> {
        assess_consistency(session.laps(), self.threshold_s, self.min_laps)
            .map(CoachingInsight::Consistency)
            .into_iter()
            .collect()
    }
}
