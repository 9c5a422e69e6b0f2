use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    LapsightError,
    session::{Session, SessionHeader},
    telemetry::{LapBoundary, TelemetryPoint},
};

/// One line of a persisted session file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum SessionRecord {
    Header(SessionHeader),
    Point(TelemetryPoint),
    Lap(LapBoundary),
}

/// Writes a session as JSON lines: the header first, then points, then laps.
pub fn write_session(file: &Path, session: &Session) -> Result<(), LapsightError> {
    let session_file = File::create(file).map_err(|e| LapsightError::WriterError { source: e })?;
    let mut session_file_writer = BufWriter::new(session_file);

    let records = std::iter::once(SessionRecord::Header(session.header()))
        .chain(session.points().iter().cloned().map(SessionRecord::Point))
        .chain(session.laps().iter().cloned().map(SessionRecord::Lap));
    for record in records {
        let line = serde_json::to_string(&record).map_err(|e| LapsightError::InvalidSessionFile {
            reason: format!("Could not serialize session record: {}", e),
        })?;
        writeln!(session_file_writer, "{}", line)
            .map_err(|e| LapsightError::WriterError { source: e })?;
    }
    session_file_writer
        .flush()
        .map_err(|e| LapsightError::WriterError { source: e })?;
    Ok(())
}

pub fn load_session(source_file: &Path) -> Result<Session, LapsightError> {
    let records = serde_jsonlines::json_lines(source_file)
        .map_err(|e| LapsightError::SessionLoaderError { source: e })?
        .collect::<Result<Vec<SessionRecord>, std::io::Error>>()
        .map_err(|e| LapsightError::SessionLoaderError { source: e })?;

    let mut header: Option<SessionHeader> = None;
    let mut points = Vec::new();
    let mut laps = Vec::new();
    for record in records {
        match record {
            SessionRecord::Header(session_header) => {
                if header.is_some() {
                    return Err(LapsightError::InvalidSessionFile {
                        reason: "more than one session header".to_string(),
                    });
                }
                header = Some(session_header);
            }
            SessionRecord::Point(point) => points.push(point),
            SessionRecord::Lap(lap) => laps.push(lap),
        }
    }
    let header = header.ok_or_else(|| LapsightError::InvalidSessionFile {
        reason: "missing session header".to_string(),
    })?;

    info!(
        "Loaded {:?}, found {} points and {} laps",
        source_file,
        points.len(),
        laps.len()
    );
    Ok(Session::restore(header, points, laps))
}
