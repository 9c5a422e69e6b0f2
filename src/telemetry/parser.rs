// Line classifier for CSV-like device exports

use log::debug;
use serde::{Deserialize, Serialize};

use super::{LapBoundary, TelemetryPoint};
use crate::errors::DataWarning;

/// Leading token of lap control records
pub const LAP_RECORD_TAG: &str = "LAP";
/// time, lat, lng, speed, rpm
pub const MIN_DATA_FIELDS: usize = 5;

/// Positions of the optional fields carried by a particular export variant.
///
/// The first five fields are fixed by the wire format. Anything after them is
/// device specific, so each variant declares where it keeps altitude and lean.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportSchema {
    pub altitude_field: Option<usize>,
    pub lean_angle_field: Option<usize>,
}

impl ExportSchema {
    /// Only the five mandatory fields
    pub const BASIC: Self = Self {
        altitude_field: None,
        lean_angle_field: None,
    };

    /// Motorcycle loggers append altitude and lean after rpm
    pub const WITH_ALTITUDE_AND_LEAN: Self = Self {
        altitude_field: Some(5),
        lean_angle_field: Some(6),
    };
}

/// Classification of a single export line.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Point(TelemetryPoint),
    Lap {
        lap_number: u32,
        lap_time_s: f64,
        valid: bool,
    },
    Ignored,
}

/// Classifies one line of export text. Never fails, malformed input is `Ignored`.
pub fn classify_line(line: &str, schema: &ExportSchema) -> Record {
    let line = line.trim();
    if line.is_empty() {
        return Record::Ignored;
    }
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();

    if fields[0] == LAP_RECORD_TAG && fields.len() > 1 {
        return classify_lap(&fields);
    }

    if fields.len() < MIN_DATA_FIELDS || parse_finite(fields[0]).is_none() {
        return Record::Ignored;
    }

    let (Some(lat), Some(lng), Some(speed), Some(rpm)) = (
        parse_finite(fields[1]),
        parse_finite(fields[2]),
        parse_finite(fields[3]),
        parse_finite(fields[4]),
    ) else {
        return Record::Ignored;
    };

    let optional = |position: Option<usize>| {
        position
            .and_then(|idx| fields.get(idx))
            .and_then(|value| parse_finite(value))
    };

    Record::Point(TelemetryPoint {
        time: fields[0].to_string(),
        lat,
        lng,
        speed,
        rpm,
        altitude: optional(schema.altitude_field),
        lean_angle: optional(schema.lean_angle_field),
    })
}

fn classify_lap(fields: &[&str]) -> Record {
    if fields.len() < 3 {
        return Record::Ignored;
    }
    let Ok(lap_number) = fields[1].parse::<u32>() else {
        return Record::Ignored;
    };
    let Some(lap_time_ms) = parse_finite(fields[2]).filter(|ms| *ms >= 0.) else {
        return Record::Ignored;
    };
    let valid = match fields.get(3) {
        Some(flag) => !matches!(flag.to_ascii_lowercase().as_str(), "0" | "false"),
        None => true,
    };
    Record::Lap {
        lap_number,
        lap_time_s: lap_time_ms / 1000.,
        valid,
    }
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Points and lap boundaries collected from one export, in encounter order.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ParsedExport {
    pub points: Vec<TelemetryPoint>,
    pub laps: Vec<LapBoundary>,
    pub warnings: Vec<DataWarning>,
}

impl ParsedExport {
    /// Appends a classified record. Lap records are anchored to the last
    /// point collected so far.
    pub fn push(&mut self, record: Record) {
        match record {
            Record::Point(point) => self.points.push(point),
            Record::Lap {
                lap_number,
                lap_time_s,
                valid,
            } => match self.points.len().checked_sub(1) {
                Some(point_index) => self.laps.push(LapBoundary {
                    lap_number,
                    lap_time_s,
                    point_index,
                    valid,
                }),
                None => {
                    debug!("Dropping lap {} recorded before any data point", lap_number);
                    self.warnings
                        .push(DataWarning::OrphanLapBoundary { lap_number });
                }
            },
            Record::Ignored => {}
        }
    }
}

/// Parses a whole export in a single ordered pass.
pub fn parse_export(raw: &str, schema: &ExportSchema) -> ParsedExport {
    raw.lines()
        .map(|line| classify_line(line, schema))
        .fold(ParsedExport::default(), |mut parsed, record| {
            parsed.push(record);
            parsed
        })
}
