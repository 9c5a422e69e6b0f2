use serde::{Deserialize, Serialize};

use super::{CoachingInsight, SessionAnalyzer};
use crate::session::Session;
use crate::telemetry::TelemetryPoint;

/// Raw device units per degree of lean
pub const DEFAULT_LEAN_SCALE: f64 = 10.;
pub const DEFAULT_CONFIDENT_LEAN_DEG: f64 = 35.;
/// Lean that maps to a 100% confidence score
pub const DEFAULT_MAX_PLAUSIBLE_LEAN_DEG: f64 = 45.;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LeanVerdict {
    Conservative,
    Confident,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LeanAssessment {
    pub max_lean_deg: f64,
    /// 0 to 100
    pub confidence_pct: u8,
    pub verdict: LeanVerdict,
}

/// `None` when no sample carries a lean angle.
pub fn assess_lean(
    points: &[TelemetryPoint],
    scale: f64,
    confident_lean_deg: f64,
    max_plausible_lean_deg: f64,
) -> Option<LeanAssessment> {
    let max_lean_deg = points
        .iter()
        .filter_map(|p| p.lean_degrees(scale))
        .filter(|lean| lean.is_finite())
        .reduce(f64::max)?;

    let confidence_pct = if max_plausible_lean_deg > 0. {
        (max_lean_deg / max_plausible_lean_deg * 100.)
            .round()
            .clamp(0., 100.) as u8
    } else {
        0
    };
    let verdict = if max_lean_deg < confident_lean_deg {
        LeanVerdict::Conservative
    } else {
        LeanVerdict::Confident
    };

    Some(LeanAssessment {
        max_lean_deg,
        confidence_pct,
        verdict,
    })
}

pub struct LeanAnalyzer {
    scale: f64,
    confident_lean_deg: f64,
    max_plausible_lean_deg: f64,
}

impl LeanAnalyzer {
    pub fn new(scale: f64, confident_lean_deg: f64, max_plausible_lean_deg: f64) -> Self {
        Self {
            scale,
            confident_lean_deg,
            max_plausible_lean_deg,
        }
    }
}

impl SessionAnalyzer for LeanAnalyzer {
    fn analyze(&self, session: &Session) -> Vec<CoachingInsight> {
        assess_lean(
            session.points(),
            self.scale,
            self.confident_lean_deg,
            self.max_plausible_lean_deg,
        )
        .map(CoachingInsight::Cornering)
        .into_iter()
        .collect()
    }
}
