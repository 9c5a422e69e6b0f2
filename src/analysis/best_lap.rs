use serde::{Deserialize, Serialize};

use super::distance::cumulative_distance;
use super::segmenter::LapSegment;
use crate::telemetry::{LapBoundary, TelemetryPoint};
use crate::telemetry::timestamp::resolve_time_token;

/// Conventional 3-sector split
pub const DEFAULT_SECTOR_COUNT: usize = 3;
/// Discount applied to the best lap by the legacy theoretical best estimate
pub const LEGACY_THEORETICAL_RATIO: f64 = 0.95;

/// Fastest valid lap. Ties resolve to the earliest lap.
pub fn best_lap(laps: &[LapBoundary]) -> Option<&LapBoundary> {
    laps.iter()
        .filter(|lap| lap.valid)
        .min_by(|a, b| a.lap_time_s.total_cmp(&b.lap_time_s))
}

pub fn best_lap_seconds(laps: &[LapBoundary]) -> f64 {
    best_lap(laps).map(|lap| lap.lap_time_s).unwrap_or(0.)
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TheoreticalBestMethod {
    /// Sum of the fastest sector times across valid laps
    #[default]
    SectorMinimum,
    /// Best lap scaled by a fixed ratio, kept for parity with older reports
    FixedRatio,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum TheoreticalBest {
    Available {
        lap_time_s: f64,
        /// Fastest time per sector, empty for the fixed ratio estimate
        sector_times_s: Vec<f64>,
    },
    /// Sector timing could not be derived, only the best lap is reported
    Unavailable { best_lap_s: f64 },
}

impl TheoreticalBest {
    pub fn lap_time_s(&self) -> Option<f64> {
        match self {
            TheoreticalBest::Available { lap_time_s, .. } => Some(*lap_time_s),
            TheoreticalBest::Unavailable { .. } => None,
        }
    }
}

fn best_segment<'s, 'a>(segments: &'s [LapSegment<'a>]) -> Option<&'s LapSegment<'a>> {
    segments
        .iter()
        .filter(|segment| segment.valid)
        .min_by(|a, b| a.lap_time_s.total_cmp(&b.lap_time_s))
}

pub fn theoretical_best(
    segments: &[LapSegment<'_>],
    sector_count: usize,
    method: TheoreticalBestMethod,
) -> TheoreticalBest {
    let Some(reference) = best_segment(segments) else {
        return TheoreticalBest::Unavailable { best_lap_s: 0. };
    };
    let best_lap_s = reference.lap_time_s;

    match method {
        TheoreticalBestMethod::FixedRatio => TheoreticalBest::Available {
            lap_time_s: best_lap_s * LEGACY_THEORETICAL_RATIO,
            sector_times_s: Vec::new(),
        },
        TheoreticalBestMethod::SectorMinimum => {
            match sector_minimum(segments, reference, sector_count) {
                Some(sector_times_s) => TheoreticalBest::Available {
                    lap_time_s: sector_times_s.iter().sum(),
                    sector_times_s,
                },
                None => TheoreticalBest::Unavailable { best_lap_s },
            }
        }
    }
}

/// Splits the reference lap into equal-duration sectors, projects the split
/// positions onto every valid lap and keeps the fastest time per sector.
fn sector_minimum(
    segments: &[LapSegment<'_>],
    reference: &LapSegment<'_>,
    sector_count: usize,
) -> Option<Vec<f64>> {
    if sector_count < 2 {
        return None;
    }
    let reference_profile = LapProfile::from_segment(reference)?;
    let sector_length_s = reference_profile.lap_time_s / sector_count as f64;
    let split_fractions: Vec<f64> = (1..sector_count)
        .map(|k| reference_profile.distance_fraction_at(k as f64 * sector_length_s))
        .collect();

    let mut best_sectors = vec![f64::INFINITY; sector_count];
    for segment in segments.iter().filter(|s| s.valid) {
        let Some(profile) = LapProfile::from_segment(segment) else {
            continue;
        };
        let mut splits = Vec::with_capacity(sector_count + 1);
        splits.push(0.);
        splits.extend(split_fractions.iter().map(|f| profile.time_at_fraction(*f)));
        splits.push(profile.lap_time_s);

        for (sector, window) in splits.windows(2).enumerate() {
            best_sectors[sector] = best_sectors[sector].min(window[1] - window[0]);
        }
    }

    Some(best_sectors)
}

/// Elapsed time against distance travelled within one lap.
struct LapProfile {
    lap_time_s: f64,
    total_distance_m: f64,
    /// (elapsed seconds, distance meters), both non-decreasing
    samples: Vec<(f64, f64)>,
}

impl LapProfile {
    /// `None` when the lap has no usable timing or no distance.
    fn from_segment(segment: &LapSegment<'_>) -> Option<Self> {
        if segment.points.len() < 2 || segment.lap_time_s <= 0. {
            return None;
        }
        let times = segment
            .points
            .iter()
            .map(|p| resolve_time_token(&p.time).map(|t| t.timestamp_millis()))
            .collect::<Option<Vec<i64>>>()?;
        if times.windows(2).any(|w| w[1] < w[0]) {
            return None;
        }
        let first_ms = times[0];
        let span_ms = times[times.len() - 1] - first_ms;
        if span_ms <= 0 {
            return None;
        }

        // samples without a GPS fix sit at (0, 0), the profile interpolates across them
        let fixed: Vec<(i64, &TelemetryPoint)> = times
            .iter()
            .copied()
            .zip(segment.points)
            .filter(|(_, point)| point.has_fix())
            .collect();
        if fixed.len() < 2 {
            return None;
        }

        let distances = cumulative_distance(fixed.iter().map(|(_, point)| *point));
        let total_distance_m = *distances.last()?;
        if total_distance_m <= 0. {
            return None;
        }

        // device lap time is authoritative, timestamps only give the shape
        let scale = segment.lap_time_s / span_ms as f64;
        let samples = fixed
            .iter()
            .zip(distances)
            .map(|((ms, _), distance)| ((ms - first_ms) as f64 * scale, distance))
            .collect();

        Some(Self {
            lap_time_s: segment.lap_time_s,
            total_distance_m,
            samples,
        })
    }

    fn distance_fraction_at(&self, elapsed_s: f64) -> f64 {
        interpolate(&self.samples, elapsed_s, |s| s.0, |s| s.1) / self.total_distance_m
    }

    fn time_at_fraction(&self, fraction: f64) -> f64 {
        interpolate(
            &self.samples,
            fraction * self.total_distance_m,
            |s| s.1,
            |s| s.0,
        )
    }
}

fn interpolate(
    samples: &[(f64, f64)],
    target: f64,
    key: impl Fn(&(f64, f64)) -> f64,
    value: impl Fn(&(f64, f64)) -> f64,
) -> f64 {
    let idx = samples.partition_point(|s| key(s) < target);
    if idx == 0 {
        return value(&samples[0]);
    }
    if idx >= samples.len() {
        return value(&samples[samples.len() - 1]);
    }
    let (before, after) = (&samples[idx - 1], &samples[idx]);
    let span = key(after) - key(before);
    if span <= 0. {
        return value(after);
    }
    value(before) + (value(after) - value(before)) * (target - key(before)) / span
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::segmenter::segment_laps;
    use proptest::prelude::*;

    const BASE_MS: i64 = 1_700_000_000_000;

    fn lap(lap_number: u32, lap_time_s: f64, point_index: usize, valid: bool) -> LapBoundary {
        LapBoundary {
            lap_number,
            lap_time_s,
            point_index,
            valid,
        }
    }

    /// A lap along the 45th parallel, one point every 0.0001 degrees
    fn lap_points(start_ms: i64, offsets_s: &[i64]) -> Vec<TelemetryPoint> {
        offsets_s
            .iter()
            .enumerate()
            .map(|(i, offset)| TelemetryPoint {
                time: (start_ms + offset * 1000).to_string(),
                lat: 45.,
                lng: 9. + i as f64 * 0.0001,
                speed: 100.,
                rpm: 9000.,
                ..TelemetryPoint::default()
            })
            .collect()
    }

    #[test]
    fn test_best_lap_skips_invalid() {
        let laps = vec![lap(1, 62.1, 0, true), lap(2, 58.8, 1, true), lap(3, 65.4, 2, false)];
        assert_eq!(best_lap_seconds(&laps), 58.8);
        assert_eq!(best_lap(&laps).unwrap().lap_number, 2);
    }

    #[test]
    fn test_invalid_faster_lap_ignored() {
        let laps = vec![lap(1, 62.1, 0, true), lap(2, 50.0, 1, false)];
        assert_eq!(best_lap_seconds(&laps), 62.1);
    }

    #[test]
    fn test_best_lap_tie_resolves_to_earliest() {
        let laps = vec![lap(1, 60.0, 0, true), lap(2, 59.0, 1, true), lap(3, 59.0, 2, true)];
        assert_eq!(best_lap(&laps).unwrap().lap_number, 2);
    }

    #[test]
    fn test_no_valid_laps() {
        assert_eq!(best_lap_seconds(&[]), 0.);
        assert_eq!(best_lap_seconds(&[lap(1, 60.0, 0, false)]), 0.);
        assert_eq!(
            theoretical_best(&[], DEFAULT_SECTOR_COUNT, TheoreticalBestMethod::SectorMinimum),
            TheoreticalBest::Unavailable { best_lap_s: 0. }
        );
    }

    #[test]
    fn test_sector_minimum_combines_fastest_sectors() {
        // lap 1 is even, lap 2 is quick early and slow late
        let mut points = lap_points(BASE_MS, &[0, 10, 20, 30, 40, 50, 60]);
        points.extend(lap_points(BASE_MS + 70_000, &[0, 8, 16, 24, 36, 48, 62]));
        let laps = vec![lap(1, 60., 6, true), lap(2, 62., 13, true)];
        let segmentation = segment_laps(&points, &laps);

        let result = theoretical_best(
            segmentation.laps(),
            DEFAULT_SECTOR_COUNT,
            TheoreticalBestMethod::SectorMinimum,
        );
        match result {
            TheoreticalBest::Available {
                lap_time_s,
                sector_times_s,
            } => {
                assert_eq!(sector_times_s.len(), 3);
                assert!((sector_times_s[0] - 16.).abs() < 1e-6);
                assert!((sector_times_s[1] - 20.).abs() < 1e-6);
                assert!((sector_times_s[2] - 20.).abs() < 1e-6);
                assert!((lap_time_s - 56.).abs() < 1e-6);
            }
            other => panic!("Expected an available theoretical best, got {other:?}"),
        }
    }

    #[test]
    fn test_single_sector_is_unavailable() {
        let points = lap_points(BASE_MS, &[0, 10, 20, 30]);
        let laps = vec![lap(1, 30., 3, true)];
        let segmentation = segment_laps(&points, &laps);
        assert_eq!(
            theoretical_best(segmentation.laps(), 1, TheoreticalBestMethod::SectorMinimum),
            TheoreticalBest::Unavailable { best_lap_s: 30. }
        );
    }

    #[test]
    fn test_no_gps_fix_is_unavailable() {
        let mut points = lap_points(BASE_MS, &[0, 10, 20, 30]);
        for point in points.iter_mut() {
            point.lat = 0.;
            point.lng = 0.;
        }
        let laps = vec![lap(1, 30., 3, true)];
        let segmentation = segment_laps(&points, &laps);
        let result = theoretical_best(
            segmentation.laps(),
            DEFAULT_SECTOR_COUNT,
            TheoreticalBestMethod::SectorMinimum,
        );
        assert_eq!(result, TheoreticalBest::Unavailable { best_lap_s: 30. });
        assert_eq!(result.lap_time_s(), None);
    }

    #[test]
    fn test_samples_without_fix_do_not_shorten_sectors() {
        let mut points = lap_points(BASE_MS, &[0, 10, 20, 30, 40, 50, 60]);
        points.extend(lap_points(BASE_MS + 70_000, &[0, 10, 20, 30, 40, 50, 60]));
        points[8].lat = 0.;
        points[8].lng = 0.;
        let laps = vec![lap(1, 60., 6, true), lap(2, 60., 13, true)];
        let segmentation = segment_laps(&points, &laps);

        match theoretical_best(
            segmentation.laps(),
            DEFAULT_SECTOR_COUNT,
            TheoreticalBestMethod::SectorMinimum,
        ) {
            TheoreticalBest::Available {
                lap_time_s,
                sector_times_s,
            } => {
                assert!((lap_time_s - 60.).abs() < 1e-6);
                assert!(sector_times_s.iter().all(|s| (s - 20.).abs() < 1e-6));
            }
            other => panic!("Expected an available theoretical best, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_lap_sectors_ignored() {
        // lap 2 is twice as fast everywhere but flagged invalid
        let mut points = lap_points(BASE_MS, &[0, 10, 20, 30, 40, 50, 60]);
        points.extend(lap_points(BASE_MS + 70_000, &[0, 5, 10, 15, 20, 25, 30]));
        let laps = vec![lap(1, 60., 6, true), lap(2, 30., 13, false)];
        let segmentation = segment_laps(&points, &laps);

        match theoretical_best(
            segmentation.laps(),
            DEFAULT_SECTOR_COUNT,
            TheoreticalBestMethod::SectorMinimum,
        ) {
            TheoreticalBest::Available {
                lap_time_s,
                sector_times_s,
            } => {
                assert!((lap_time_s - 60.).abs() < 1e-6);
                assert!(sector_times_s.iter().all(|s| (s - 20.).abs() < 1e-6));
            }
            other => panic!("Expected an available theoretical best, got {other:?}"),
        }
    }

    #[test]
    fn test_fixed_ratio_method() {
        let points = lap_points(BASE_MS, &[0, 10, 20, 30]);
        let laps = vec![lap(1, 40., 3, true)];
        let segmentation = segment_laps(&points, &laps);
        let result = theoretical_best(
            segmentation.laps(),
            DEFAULT_SECTOR_COUNT,
            TheoreticalBestMethod::FixedRatio,
        );
        assert!((result.lap_time_s().unwrap() - 38.).abs() < 1e-9);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_theoretical_best_never_slower_than_best_lap(
            laps_steps in prop::collection::vec(prop::collection::vec(1i64..20, 4..12), 1..5),
            sector_count in 2usize..5,
        ) {
            let mut points = Vec::new();
            let mut laps = Vec::new();
            let mut start_ms = BASE_MS;
            for (i, steps) in laps_steps.iter().enumerate() {
                let mut offsets = vec![0];
                for step in steps {
                    offsets.push(offsets.last().unwrap() + step);
                }
                let lap_time = *offsets.last().unwrap() as f64;
                points.extend(lap_points(start_ms, &offsets));
                laps.push(lap(i as u32 + 1, lap_time, points.len() - 1, true));
                start_ms += (lap_time as i64 + 10) * 1000;
            }

            let segmentation = segment_laps(&points, &laps);
            let result = theoretical_best(segmentation.laps(), sector_count, TheoreticalBestMethod::SectorMinimum);
            let best = best_lap_seconds(&laps);
            match result {
                TheoreticalBest::Available { lap_time_s, sector_times_s } => {
                    prop_assert_eq!(sector_times_s.len(), sector_count);
                    prop_assert!(sector_times_s.iter().all(|s| *s >= -1e-9));
                    prop_assert!(lap_time_s <= best + 1e-6);
                }
                TheoreticalBest::Unavailable { .. } => prop_assert!(false, "timing should be available"),
            }
        }
    }
}
