// Scalar summaries over point ranges and lap sets.
// Every aggregate is 0 over an empty input, never NaN.

use serde::{Deserialize, Serialize};

use super::best_lap::best_lap_seconds;
use super::distance::accumulate_distance;
use super::segmenter::LapSegment;
use crate::telemetry::{LapBoundary, TelemetryPoint};

pub fn max_speed(points: &[TelemetryPoint]) -> f64 {
    points.iter().map(|p| p.speed).fold(0., f64::max)
}

pub fn avg_speed(points: &[TelemetryPoint]) -> f64 {
    if points.is_empty() {
        return 0.;
    }
    points.iter().map(|p| p.speed).sum::<f64>() / points.len() as f64
}

pub fn max_rpm(points: &[TelemetryPoint]) -> f64 {
    points.iter().map(|p| p.rpm).fold(0., f64::max)
}

/// Session level summary persisted with every session.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionStats {
    /// km/h
    pub max_speed: f64,
    /// km/h
    pub avg_speed: f64,
    pub max_rpm: f64,
    pub total_distance_km: f64,
    pub lap_count: usize,
    /// Fastest valid lap, 0 when there is none
    pub best_lap_s: f64,
}

impl SessionStats {
    pub fn compute(points: &[TelemetryPoint], laps: &[LapBoundary], max_segment_m: f64) -> Self {
        Self {
            max_speed: max_speed(points),
            avg_speed: avg_speed(points),
            max_rpm: max_rpm(points),
            total_distance_km: accumulate_distance(points, max_segment_m) / 1000.,
            lap_count: laps.len(),
            best_lap_s: best_lap_seconds(laps),
        }
    }
}

/// Per-lap summary used by lap browsing views.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LapStats {
    pub lap_number: u32,
    pub lap_time_s: f64,
    pub valid: bool,
    pub point_count: usize,
    pub max_speed: f64,
    pub avg_speed: f64,
    pub max_rpm: f64,
    pub distance_km: f64,
}

impl LapStats {
    pub fn from_segment(segment: &LapSegment<'_>, max_segment_m: f64) -> Self {
        Self {
            lap_number: segment.lap_number,
            lap_time_s: segment.lap_time_s,
            valid: segment.valid,
            point_count: segment.points.len(),
            max_speed: max_speed(segment.points),
            avg_speed: avg_speed(segment.points),
            max_rpm: max_rpm(segment.points),
            distance_km: accumulate_distance(segment.points, max_segment_m) / 1000.,
        }
    }
}
