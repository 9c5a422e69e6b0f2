pub mod best_lap;
pub mod braking_analyzer;
pub mod consistency_analyzer;
pub mod distance;
pub mod lean_analyzer;
pub mod segmenter;
pub mod stats;

use serde::{Deserialize, Serialize};

use crate::{config::AnalysisConfig, session::Session};

pub use best_lap::{TheoreticalBest, TheoreticalBestMethod, best_lap, best_lap_seconds, theoretical_best};
pub use braking_analyzer::{BrakingAnalyzer, BrakingZone, detect_braking_zones};
pub use consistency_analyzer::{
    ConsistencyAnalyzer, ConsistencyAssessment, ConsistencyVerdict, assess_consistency,
};
pub use distance::{accumulate_distance, haversine_distance};
pub use lean_analyzer::{LeanAnalyzer, LeanAssessment, LeanVerdict, assess_lean};
pub use segmenter::{LapLayout, LapSegment, Segmentation, segment_laps};
pub use stats::{LapStats, SessionStats};

/// How a coaching insight should be presented.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum InsightTone {
    Success,
    Warning,
    Info,
}

/// Coaching feedback derived from a whole session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum CoachingInsight {
    HardBraking { zones: Vec<BrakingZone> },
    Cornering(LeanAssessment),
    Consistency(ConsistencyAssessment),
}

impl CoachingInsight {
    pub fn tone(&self) -> InsightTone {
        match self {
            CoachingInsight::HardBraking { .. } => InsightTone::Info,
            CoachingInsight::Cornering(assessment) => match assessment.verdict {
                LeanVerdict::Conservative => InsightTone::Warning,
                LeanVerdict::Confident => InsightTone::Success,
            },
            CoachingInsight::Consistency(assessment) => match assessment.verdict {
                ConsistencyVerdict::High => InsightTone::Success,
                ConsistencyVerdict::Inconsistent => InsightTone::Warning,
            },
        }
    }

    pub fn message(&self) -> String {
        match self {
            CoachingInsight::HardBraking { zones } => match zones.first() {
                Some(hardest) => format!(
                    "{} hard braking zones, the hardest drops {:.1} km/h down to {:.1} km/h at sample {}",
                    zones.len(),
                    hardest.deceleration_magnitude,
                    hardest.entry_speed,
                    hardest.point_index
                ),
                None => "No hard braking detected".to_string(),
            },
            CoachingInsight::Cornering(assessment) => match assessment.verdict {
                LeanVerdict::Conservative => format!(
                    "Conservative cornering: max lean {:.1}° ({}% confidence). Work on carrying more lean mid-corner.",
                    assessment.max_lean_deg, assessment.confidence_pct
                ),
                LeanVerdict::Confident => format!(
                    "Confident cornering: max lean {:.1}° ({}% confidence).",
                    assessment.max_lean_deg, assessment.confidence_pct
                ),
            },
            CoachingInsight::Consistency(assessment) => match assessment.verdict {
                ConsistencyVerdict::High => format!(
                    "High consistency: {} laps within {:.2}s.",
                    assessment.lap_count, assessment.lap_time_range_s
                ),
                ConsistencyVerdict::Inconsistent => format!(
                    "Inconsistent rhythm: {:.2}s between fastest and slowest lap. Try repeating the same braking points every lap.",
                    assessment.lap_time_range_s
                ),
            },
        }
    }
}

/// Produces coaching insights from a read-only session.
pub trait SessionAnalyzer {
    fn analyze(&self, session: &Session) -> Vec<CoachingInsight>;
}

pub fn coach_session(session: &Session, config: &AnalysisConfig) -> Vec<CoachingInsight> {
    let analyzers: Vec<Box<dyn SessionAnalyzer>> = vec![
        Box::new(BrakingAnalyzer::new(
            config.braking_threshold_kmh,
            config.braking_top_n,
        )),
        Box::new(LeanAnalyzer::new(
            config.lean_scale,
            config.confident_lean_deg,
            config.max_plausible_lean_deg,
        )),
        Box::new(ConsistencyAnalyzer::new(
            config.consistency_threshold_s,
            config.min_consistency_laps,
        )),
    ];

    analyzers
        .iter()
        .flat_map(|analyzer| analyzer.analyze(session))
        .collect()
}
