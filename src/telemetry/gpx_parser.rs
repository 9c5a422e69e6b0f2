// GPX track ingestion, sharing the downstream contract of the CSV parser

use std::io::Read;

use log::{debug, warn};

use super::{ParsedExport, Record, TelemetryPoint};

/// Parses GPX track points into telemetry points.
///
/// GPX carries no engine data and no lap records, so speed and rpm stay at 0
/// and the result has no lap boundaries. A document that cannot be parsed
/// produces an empty export.
pub fn parse_gpx<R: Read>(reader: R) -> ParsedExport {
    let gpx = match gpx::read(reader) {
        Ok(gpx) => gpx,
        Err(e) => {
            warn!("Could not parse GPX export, ingesting it as empty: {}", e);
            return ParsedExport::default();
        }
    };

    let mut parsed = ParsedExport::default();
    for track in gpx.tracks {
        for segment in track.segments {
            for waypoint in segment.points {
                let time = match waypoint.time.map(|t| t.format()) {
                    Some(Ok(formatted)) => formatted,
                    Some(Err(e)) => {
                        debug!("Could not format GPX time: {}", e);
                        String::new()
                    }
                    None => String::new(),
                };
                let position = waypoint.point();
                parsed.push(Record::Point(TelemetryPoint {
                    time,
                    lat: position.y(),
                    lng: position.x(),
                    speed: 0.,
                    rpm: 0.,
                    altitude: waypoint.elevation,
                    lean_angle: None,
                }));
            }
        }
    }
    parsed
}
