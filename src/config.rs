use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::LapsightError;
use crate::analysis::best_lap::{DEFAULT_SECTOR_COUNT, TheoreticalBestMethod};
use crate::analysis::braking_analyzer::{DEFAULT_BRAKING_THRESHOLD_KMH, DEFAULT_BRAKING_TOP_N};
use crate::analysis::consistency_analyzer::{
    DEFAULT_CONSISTENCY_THRESHOLD_S, DEFAULT_MIN_CONSISTENCY_LAPS,
};
use crate::analysis::distance::MAX_SEGMENT_DISTANCE_M;
use crate::analysis::lean_analyzer::{
    DEFAULT_CONFIDENT_LEAN_DEG, DEFAULT_LEAN_SCALE, DEFAULT_MAX_PLAUSIBLE_LEAN_DEG,
};
use crate::playback::TICK_INTERVAL_MS;
use crate::telemetry::ExportSchema;

const CONFIG_DIR_NAME: &str = "lapsight";
const CONFIG_FILE_NAME: &str = "config.json";

/// Tunable constants for ingestion, analysis and playback.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub schema: ExportSchema,
    pub max_segment_distance_m: f64,
    pub sector_count: usize,
    pub theoretical_best_method: TheoreticalBestMethod,
    pub braking_threshold_kmh: f64,
    pub braking_top_n: usize,
    /// Raw lean units per degree
    pub lean_scale: f64,
    pub confident_lean_deg: f64,
    pub max_plausible_lean_deg: f64,
    pub consistency_threshold_s: f64,
    pub min_consistency_laps: usize,
    pub tick_interval_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            schema: ExportSchema::BASIC,
            max_segment_distance_m: MAX_SEGMENT_DISTANCE_M,
            sector_count: DEFAULT_SECTOR_COUNT,
            theoretical_best_method: TheoreticalBestMethod::default(),
            braking_threshold_kmh: DEFAULT_BRAKING_THRESHOLD_KMH,
            braking_top_n: DEFAULT_BRAKING_TOP_N,
            lean_scale: DEFAULT_LEAN_SCALE,
            confident_lean_deg: DEFAULT_CONFIDENT_LEAN_DEG,
            max_plausible_lean_deg: DEFAULT_MAX_PLAUSIBLE_LEAN_DEG,
            consistency_threshold_s: DEFAULT_CONSISTENCY_THRESHOLD_S,
            min_consistency_laps: DEFAULT_MIN_CONSISTENCY_LAPS,
            tick_interval_ms: TICK_INTERVAL_MS,
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self, LapsightError> {
        let file =
            std::fs::File::open(path).map_err(|e| LapsightError::ConfigIOError { source: e })?;
        serde_json::from_reader(file).map_err(|e| LapsightError::ConfigSerializeError { source: e })
    }

    /// Reads the config saved in the user's config directory, if any.
    pub fn from_local_file() -> Result<Option<Self>, LapsightError> {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(None);
        };
        let config_path = config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::from_file(&config_path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn save(&self) -> Result<(), LapsightError> {
        let config_dir = dirs::config_dir()
            .ok_or(LapsightError::NoConfigDir)?
            .join(CONFIG_DIR_NAME);
        self.save_to(&config_dir.join(CONFIG_FILE_NAME))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), LapsightError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LapsightError::ConfigIOError { source: e })?;
            }
        }
        let file =
            std::fs::File::create(path).map_err(|e| LapsightError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| LapsightError::ConfigSerializeError { source: e })
    }
}
