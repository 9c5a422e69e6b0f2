// Partitions a point stream into lap ranges using device lap boundaries

use std::ops::Range;

use crate::errors::DataWarning;
use crate::telemetry::{LapBoundary, TelemetryPoint};

/// Point range covered by each lap, half-open, plus the integrity warnings
/// raised while deriving them.
///
/// Lap `i` covers `(laps[i-1].point_index, laps[i].point_index]`, the first
/// lap starting at 0. Boundaries past the end of the points are clamped and
/// boundaries that do not advance produce an empty range. Nothing is logged
/// here, ingestion reports the warnings once.
pub fn lap_ranges(point_count: usize, laps: &[LapBoundary]) -> (Vec<Range<usize>>, Vec<DataWarning>) {
    let mut ranges = Vec::with_capacity(laps.len());
    let mut warnings = Vec::new();
    let mut next_start = 0usize;
    let mut previous_end: Option<usize> = None;

    for lap in laps {
        let mut end = lap.point_index;
        if point_count == 0 || end >= point_count {
            let clamped_to = point_count.saturating_sub(1);
            warnings.push(DataWarning::LapBoundaryOutOfRange {
                lap_number: lap.lap_number,
                point_index: lap.point_index,
                clamped_to,
            });
            end = clamped_to;
        }

        if let Some(previous_index) = previous_end {
            if end <= previous_index {
                if lap.point_index < point_count {
                    warnings.push(DataWarning::LapBoundaryOutOfOrder {
                        lap_number: lap.lap_number,
                        point_index: lap.point_index,
                        previous_index,
                    });
                }
                ranges.push(next_start..next_start);
                continue;
            }
        }

        let range_end = if point_count == 0 { 0 } else { end + 1 };
        ranges.push(next_start..range_end);
        next_start = range_end;
        previous_end = Some(end);
    }

    (ranges, warnings)
}

/// One lap's points together with its boundary metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct LapSegment<'a> {
    pub lap_number: u32,
    pub lap_time_s: f64,
    pub valid: bool,
    /// Absolute index range of the lap within the session points
    pub range: Range<usize>,
    pub points: &'a [TelemetryPoint],
}

impl LapSegment<'_> {
    pub fn start_index(&self) -> usize {
        self.range.start
    }

    /// Last point index of the lap, `None` for an empty lap.
    pub fn end_index(&self) -> Option<usize> {
        if self.range.is_empty() {
            None
        } else {
            Some(self.range.end - 1)
        }
    }
}

/// How a session's points are laid out for lap-scoped views.
#[derive(Clone, Debug, PartialEq)]
pub enum LapLayout<'a> {
    /// No lap records, the whole point stream is one unsegmented view
    FullSession(&'a [TelemetryPoint]),
    Laps(Vec<LapSegment<'a>>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Segmentation<'a> {
    pub layout: LapLayout<'a>,
    pub warnings: Vec<DataWarning>,
}

impl<'a> Segmentation<'a> {
    pub fn laps(&self) -> &[LapSegment<'a>] {
        match &self.layout {
            LapLayout::FullSession(_) => &[],
            LapLayout::Laps(laps) => laps,
        }
    }
}

pub fn segment_laps<'a>(points: &'a [TelemetryPoint], laps: &[LapBoundary]) -> Segmentation<'a> {
    if laps.is_empty() {
        return Segmentation {
            layout: LapLayout::FullSession(points),
            warnings: Vec::new(),
        };
    }

    let (ranges, warnings) = lap_ranges(points.len(), laps);
    let segments = laps
        .iter()
        .zip(ranges)
        .map(|(lap, range)| LapSegment {
            lap_number: lap.lap_number,
            lap_time_s: lap.lap_time_s,
            valid: lap.valid,
            points: &points[range.clone()],
            range,
        })
        .collect();

    Segmentation {
        layout: LapLayout::Laps(segments),
        warnings,
    }
}
