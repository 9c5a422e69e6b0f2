pub mod gpx_parser;
pub mod parser;
pub mod timestamp;

use serde::{Deserialize, Serialize};

pub use gpx_parser::parse_gpx;
pub use parser::{ExportSchema, ParsedExport, Record, classify_line, parse_export};

/// A single sampled instant from a recording device.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TelemetryPoint {
    /// Time token as supplied by the device (epoch millis or RFC 3339)
    pub time: String,
    /// Latitude in decimal degrees, 0 when the device had no fix
    pub lat: f64,
    /// Longitude in decimal degrees, 0 when the device had no fix
    pub lng: f64,
    /// Speed in km/h
    pub speed: f64,
    /// Engine RPM
    pub rpm: f64,
    /// Altitude in meters
    pub altitude: Option<f64>,
    /// Lean angle in raw device units
    pub lean_angle: Option<f64>,
}

impl TelemetryPoint {
    pub fn has_fix(&self) -> bool {
        self.lat != 0. || self.lng != 0.
    }

    /// Absolute lean angle in degrees given the device encoding scale.
    pub fn lean_degrees(&self, scale: f64) -> Option<f64> {
        if scale == 0. {
            return None;
        }
        self.lean_angle.map(|raw| raw.abs() / scale)
    }
}

/// Device-emitted control record closing a lap.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LapBoundary {
    /// 1-based lap number
    pub lap_number: u32,
    /// Device measured lap time in seconds
    pub lap_time_s: f64,
    /// Index of the last point belonging to this lap
    pub point_index: usize,
    /// False for laps the device flagged as aborted or out laps
    pub valid: bool,
}
