// Library interface for lapsight
// This allows integration tests and benches to access internal modules

pub mod analysis;
pub mod config;
pub mod errors;
pub mod playback;
pub mod session;
pub mod storage;
pub mod telemetry;
pub mod writer;

// Re-export commonly used types
pub use analysis::{CoachingInsight, LapStats, SessionStats, TheoreticalBest, coach_session};
pub use config::AnalysisConfig;
pub use errors::{DataWarning, LapsightError};
pub use playback::{PlaybackCommand, PlaybackFrame, PlaybackSynchronizer};
pub use session::{Session, load_export};
pub use storage::{FileSessionStore, SessionStore};
pub use telemetry::{LapBoundary, TelemetryPoint};
