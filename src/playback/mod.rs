// Playback index synchronizer shared by chart, map and gauge views

use std::{
    ops::Range,
    sync::mpsc::{Receiver, Sender, TryRecvError},
    thread,
    time::Duration,
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{LapsightError, analysis::segmenter::lap_ranges, telemetry::LapBoundary};

/// 10 Hz playback at 1x speed
pub const TICK_INTERVAL_MS: u64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// What every playback view renders from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackFrame {
    pub current_index: usize,
    /// Offset from the start of the active range
    pub relative_index: usize,
    pub is_playing: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Stop,
    /// `None` clears the lap filter
    SelectLap(Option<usize>),
    Seek(usize),
    SetSpeed(f64),
}

/// Single authoritative playback cursor over a session's points.
#[derive(Clone, Debug)]
pub struct PlaybackSynchronizer {
    point_count: usize,
    lap_ranges: Vec<Range<usize>>,
    selected_lap: Option<usize>,
    current_index: usize,
    state: PlaybackState,
    speed_multiplier: f64,
    tick_interval: Duration,
}

impl PlaybackSynchronizer {
    pub fn new(point_count: usize, laps: &[LapBoundary]) -> Self {
        let (lap_ranges, _) = lap_ranges(point_count, laps);
        Self {
            point_count,
            lap_ranges,
            selected_lap: None,
            current_index: 0,
            state: PlaybackState::Stopped,
            speed_multiplier: 1.,
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn selected_lap(&self) -> Option<usize> {
        self.selected_lap
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    fn lap_bounds(&self, lap: usize) -> Option<(usize, usize)> {
        self.lap_ranges
            .get(lap)
            .filter(|range| !range.is_empty())
            .map(|range| (range.start, range.end - 1))
    }

    /// Inclusive bounds the cursor may move in, `None` when there is nothing to play.
    pub fn active_range(&self) -> Option<(usize, usize)> {
        match self.selected_lap {
            Some(lap) => self.lap_bounds(lap),
            None if self.point_count > 0 => Some((0, self.point_count - 1)),
            None => None,
        }
    }

    pub fn relative_index(&self) -> usize {
        let start = self.active_range().map(|(start, _)| start).unwrap_or(0);
        self.current_index.saturating_sub(start)
    }

    /// Index in another lap at the same elapsed offset, clamped to that lap's end.
    pub fn aligned_index(&self, lap: usize) -> Option<usize> {
        self.lap_bounds(lap)
            .map(|(start, end)| (start + self.relative_index()).min(end))
    }

    pub fn frame(&self) -> PlaybackFrame {
        PlaybackFrame {
            current_index: self.current_index,
            relative_index: self.relative_index(),
            is_playing: self.is_playing(),
        }
    }

    /// Starts playback unless already at the end of the active range.
    pub fn play(&mut self) {
        match self.active_range() {
            Some((_, end)) if self.current_index < end => self.state = PlaybackState::Playing,
            _ => debug!("Nothing left to play at index {}", self.current_index),
        }
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    /// Stops and rewinds to the start of the active range.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.current_index = self.active_range().map(|(start, _)| start).unwrap_or(0);
    }

    /// Advances one sample while playing. Reaching the end of the active
    /// range stops playback.
    pub fn tick(&mut self) -> PlaybackFrame {
        if self.is_playing() {
            match self.active_range() {
                Some((_, end)) => {
                    if self.current_index < end {
                        self.current_index += 1;
                    }
                    if self.current_index >= end {
                        self.state = PlaybackState::Stopped;
                    }
                }
                None => self.state = PlaybackState::Stopped,
            }
        }
        self.frame()
    }

    /// Restricts playback to one lap, or the whole session with `None`, and
    /// moves the cursor to the start of the new range. Unknown laps and laps
    /// without points are ignored.
    pub fn select_lap(&mut self, lap: Option<usize>) -> bool {
        if let Some(lap_idx) = lap {
            if self.lap_bounds(lap_idx).is_none() {
                warn!("Ignoring selection of lap index {} with no points", lap_idx);
                return false;
            }
        }
        self.selected_lap = lap;
        match self.active_range() {
            Some((start, _)) => self.current_index = start,
            None => {
                self.current_index = 0;
                self.state = PlaybackState::Stopped;
            }
        }
        true
    }

    /// Moves the cursor, clamped into the active range.
    pub fn seek(&mut self, index: usize) {
        if let Some((start, end)) = self.active_range() {
            self.current_index = index.clamp(start, end);
            if self.current_index >= end {
                self.state = PlaybackState::Stopped;
            }
        }
    }

    pub fn set_speed(&mut self, multiplier: f64) -> Result<(), LapsightError> {
        if !multiplier.is_finite() || multiplier <= 0. {
            return Err(LapsightError::InvalidPlaybackSpeed { multiplier });
        }
        self.speed_multiplier = multiplier;
        Ok(())
    }

    /// Tick interval scaled by the speed multiplier.
    pub fn effective_interval(&self) -> Duration {
        self.tick_interval.div_f64(self.speed_multiplier)
    }

    pub fn apply(&mut self, command: PlaybackCommand) -> Result<(), LapsightError> {
        match command {
            PlaybackCommand::Play => self.play(),
            PlaybackCommand::Pause => self.pause(),
            PlaybackCommand::Stop => self.stop(),
            PlaybackCommand::SelectLap(lap) => {
                self.select_lap(lap);
            }
            PlaybackCommand::Seek(index) => self.seek(index),
            PlaybackCommand::SetSpeed(multiplier) => self.set_speed(multiplier)?,
        }
        Ok(())
    }
}

/// Drives the synchronizer from a single tick source until the command
/// channel closes while stopped.
///
/// Commands are applied between ticks, never during one. While stopped the
/// loop blocks on the next command instead of ticking. A frame is sent after
/// every tick and after every command applied while stopped.
pub fn run_playback(
    mut synchronizer: PlaybackSynchronizer,
    commands: Receiver<PlaybackCommand>,
    frames: Sender<PlaybackFrame>,
) -> Result<PlaybackSynchronizer, LapsightError> {
    loop {
        if synchronizer.is_playing() {
            loop {
                match commands.try_recv() {
                    Ok(command) => apply_logged(&mut synchronizer, command),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }
            if !synchronizer.is_playing() {
                frames.send(synchronizer.frame())?;
                continue;
            }
            thread::sleep(synchronizer.effective_interval());
            frames.send(synchronizer.tick())?;
        } else {
            match commands.recv() {
                Ok(command) => {
                    apply_logged(&mut synchronizer, command);
                    frames.send(synchronizer.frame())?;
                }
                Err(_) => return Ok(synchronizer),
            }
        }
    }
}

fn apply_logged(synchronizer: &mut PlaybackSynchronizer, command: PlaybackCommand) {
    if let Err(e) = synchronizer.apply(command) {
        warn!("Ignoring playback command: {}", e);
    }
}
