// Storage implementation for session persistence

use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::errors::LapsightError;
use crate::session::Session;
use crate::writer::{load_session, write_session};

const SESSION_FILE_EXTENSION: &str = "jsonl";

/// Trait defining the interface for session persistence
pub trait SessionStore {
    /// Save a fully assembled session and return its identifier
    fn save_session(&mut self, session: &Session) -> Result<String, LapsightError>;

    /// Load a session by identifier
    fn load_session(&self, session_id: &str) -> Result<Option<Session>, LapsightError>;

    /// List the identifiers of all stored sessions
    fn list_sessions(&self) -> Result<Vec<String>, LapsightError>;
}

/// One JSON-lines file per session inside a directory
pub struct FileSessionStore {
    storage_path: PathBuf,
}

impl FileSessionStore {
    pub fn new(storage_path: PathBuf) -> Result<Self, LapsightError> {
        if !storage_path.exists() {
            fs::create_dir_all(&storage_path)
                .map_err(|e| LapsightError::ConfigIOError { source: e })?;
        }
        Ok(Self { storage_path })
    }

    /// Create storage in the default application data directory
    pub fn new_default() -> Result<Self, LapsightError> {
        let app_data_dir = dirs::data_dir().ok_or(LapsightError::NoConfigDir)?;
        Self::new(app_data_dir.join("lapsight").join("sessions"))
    }

    fn file_path_for_session(&self, session_id: &str) -> PathBuf {
        self.storage_path
            .join(format!("{}.{}", session_id, SESSION_FILE_EXTENSION))
    }

    /// Session ids are the start time in epoch millis, suffixed when taken
    fn next_session_id(&self, session: &Session) -> String {
        let base = session.started_at().timestamp_millis().to_string();
        if !self.file_path_for_session(&base).exists() {
            return base;
        }
        (1..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !self.file_path_for_session(candidate).exists())
            .unwrap_or(base)
    }

    fn is_valid_session_id(session_id: &str) -> bool {
        !session_id.is_empty()
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl SessionStore for FileSessionStore {
    fn save_session(&mut self, session: &Session) -> Result<String, LapsightError> {
        let session_id = self.next_session_id(session);
        let file_path = self.file_path_for_session(&session_id);
        write_session(&file_path, session)?;
        debug!("Saved session {} to {:?}", session_id, file_path);
        Ok(session_id)
    }

    fn load_session(&self, session_id: &str) -> Result<Option<Session>, LapsightError> {
        if !Self::is_valid_session_id(session_id) {
            return Err(LapsightError::SessionStorageError {
                reason: format!("Invalid session id: {:?}", session_id),
            });
        }
        let file_path = self.file_path_for_session(session_id);
        if !file_path.exists() {
            return Ok(None);
        }
        load_session(&file_path).map(Some)
    }

    fn list_sessions(&self) -> Result<Vec<String>, LapsightError> {
        let entries =
            fs::read_dir(&self.storage_path).map_err(|e| LapsightError::SessionStorageError {
                reason: format!("Cannot read storage directory: {}", e),
            })?;

        let mut sessions: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().and_then(|ext| ext.to_str()) == Some(SESSION_FILE_EXTENSION)
            })
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .collect();
        sessions.sort();
        Ok(sessions)
    }
}
