use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{CoachingInsight, SessionAnalyzer};
use crate::session::Session;
use crate::telemetry::TelemetryPoint;

/// Speed drop between consecutive samples, in km/h, that counts as hard braking
pub const DEFAULT_BRAKING_THRESHOLD_KMH: f64 = 2.5;
pub const DEFAULT_BRAKING_TOP_N: usize = 5;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BrakingZone {
    /// Index of the sample the drop was measured at
    pub point_index: usize,
    /// Speed at that sample, km/h
    pub entry_speed: f64,
    /// Speed lost since the previous sample, km/h
    pub deceleration_magnitude: f64,
}

/// Hardest speed drops between consecutive samples, strongest first.
/// Equal drops keep their sample order.
pub fn detect_braking_zones(
    points: &[TelemetryPoint],
    threshold_kmh: f64,
    top_n: usize,
) -> Vec<BrakingZone> {
    points
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let decel = pair[0].speed - pair[1].speed;
            (decel > threshold_kmh).then(|| BrakingZone {
                point_index: i + 1,
                entry_speed: pair[1].speed,
                deceleration_magnitude: decel,
            })
        })
        .sorted_by(|a, b| b.deceleration_magnitude.total_cmp(&a.deceleration_magnitude))
        .take(top_n)
        .collect()
}

pub struct BrakingAnalyzer {
    threshold_kmh: f64,
    top_n: usize,
}

impl BrakingAnalyzer {
    pub fn new(threshold_kmh: f64, top_n: usize) -> Self {
        Self {
            threshold_kmh,
            top_n,
        }
    }
}

impl SessionAnalyzer for BrakingAnalyzer {
    fn analyze(&self, session: &Session) -> Vec<CoachingInsight> {
        let zones = detect_braking_zones(session.points(), self.threshold_kmh, self.top_n);
        if zones.is_empty() {
            return Vec::new();
        }
        vec![CoachingInsight::HardBraking { zones }]
    }
}
