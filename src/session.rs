// Session assembly: raw export in, immutable analysed session out

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    LapsightError,
    analysis::{
        LapStats, Segmentation, SessionStats, TheoreticalBest, segment_laps, theoretical_best,
    },
    config::AnalysisConfig,
    errors::DataWarning,
    telemetry::{
        LapBoundary, ParsedExport, TelemetryPoint, parse_export, parse_gpx,
        timestamp::resolve_session_start,
    },
};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Gpx,
}

impl ExportFormat {
    /// GPX by `.gpx` extension, anything else is treated as the CSV format.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gpx") => ExportFormat::Gpx,
            _ => ExportFormat::Csv,
        }
    }
}

/// Everything about a session that is not its point or lap arrays.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionHeader {
    pub started_at: DateTime<Utc>,
    pub stats: SessionStats,
    pub warnings: Vec<DataWarning>,
}

/// One ingested export. Read-only once created.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Session {
    started_at: DateTime<Utc>,
    points: Vec<TelemetryPoint>,
    laps: Vec<LapBoundary>,
    stats: SessionStats,
    warnings: Vec<DataWarning>,
}

impl Session {
    /// Builds a session from parsed records. `now` stands in for device time
    /// when the first time token is corrupt.
    pub fn from_export(parsed: ParsedExport, config: &AnalysisConfig, now: DateTime<Utc>) -> Self {
        let ParsedExport {
            points,
            laps,
            mut warnings,
        } = parsed;

        let (started_at, timestamp_warning) =
            resolve_session_start(points.first().map(|p| p.time.as_str()), now);
        warnings.extend(timestamp_warning);
        for warning in segment_laps(&points, &laps).warnings {
            warn!("{}", warning);
            warnings.push(warning);
        }

        let stats = SessionStats::compute(&points, &laps, config.max_segment_distance_m);
        if points.is_empty() {
            warn!("Export contained no telemetry points");
        }
        info!(
            "Ingested session starting {} with {} points and {} laps ({} warnings)",
            started_at,
            points.len(),
            laps.len(),
            warnings.len()
        );

        Self {
            started_at,
            points,
            laps,
            stats,
            warnings,
        }
    }

    pub fn ingest_csv(raw: &str, config: &AnalysisConfig) -> Self {
        Self::from_export(parse_export(raw, &config.schema), config, Utc::now())
    }

    pub fn ingest_gpx<R: Read>(reader: R, config: &AnalysisConfig) -> Self {
        Self::from_export(parse_gpx(reader), config, Utc::now())
    }

    /// Reassembles a persisted session without recomputing anything.
    pub fn restore(header: SessionHeader, points: Vec<TelemetryPoint>, laps: Vec<LapBoundary>) -> Self {
        Self {
            started_at: header.started_at,
            points,
            laps,
            stats: header.stats,
            warnings: header.warnings,
        }
    }

    pub fn header(&self) -> SessionHeader {
        SessionHeader {
            started_at: self.started_at,
            stats: self.stats.clone(),
            warnings: self.warnings.clone(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether the start time is the ingestion time rather than device time.
    pub fn start_time_substituted(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, DataWarning::CorruptTimestamp { .. }))
    }

    pub fn points(&self) -> &[TelemetryPoint] {
        &self.points
    }

    pub fn laps(&self) -> &[LapBoundary] {
        &self.laps
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn warnings(&self) -> &[DataWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn segmentation(&self) -> Segmentation<'_> {
        segment_laps(&self.points, &self.laps)
    }

    pub fn lap_stats(&self, config: &AnalysisConfig) -> Vec<LapStats> {
        self.segmentation()
            .laps()
            .iter()
            .map(|segment| LapStats::from_segment(segment, config.max_segment_distance_m))
            .collect()
    }

    pub fn theoretical_best(&self, config: &AnalysisConfig) -> TheoreticalBest {
        theoretical_best(
            self.segmentation().laps(),
            config.sector_count,
            config.theoretical_best_method,
        )
    }
}

/// Reads and ingests an export file, picking the parser by extension.
pub fn load_export(path: &Path, config: &AnalysisConfig) -> Result<Session, LapsightError> {
    let read_error = |e| LapsightError::ExportReadError {
        path: format!("{:?}", path),
        source: e,
    };
    match ExportFormat::from_path(path) {
        ExportFormat::Gpx => {
            let file = File::open(path).map_err(read_error)?;
            Ok(Session::ingest_gpx(BufReader::new(file), config))
        }
        ExportFormat::Csv => {
            let raw = std::fs::read_to_string(path).map_err(read_error)?;
            Ok(Session::ingest_csv(&raw, config))
        }
    }
}
