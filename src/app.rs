//! Application state and per-frame update logic.

use crate::config::WireframeMode;
use crate::data::{SwwReader, TimeSeriesKind};
use crate::error::{Result, SwwError};

/// Default playback rate in timesteps per second.
pub const DEFAULT_TPS: f32 = 10.0;

/// Playback direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Increasing timesteps.
    #[default]
    Forward,
    /// Decreasing timesteps.
    Backward,
}

impl Direction {
    /// Get the opposite direction.
    pub fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    /// Get the direction name.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

/// Maps wall-clock time onto a timestep index.
#[derive(Debug, Clone)]
pub struct Playback {
    tps: f32,
    ntimesteps: usize,
    timestep: usize,
    direction: Direction,
    paused: bool,
    prev_time: Option<f64>,
    carry: f64,
}

impl Playback {
    /// Create a paused playback over `ntimesteps` at `tps` timesteps per second.
    ///
    /// A non-positive or non-finite rate falls back to [`DEFAULT_TPS`].
    pub fn new(ntimesteps: usize, tps: f32) -> Self {
        let tps = if tps.is_finite() && tps > 0.0 {
            tps
        } else {
            DEFAULT_TPS
        };
        Self {
            tps,
            ntimesteps,
            timestep: 0,
            direction: Direction::Forward,
            paused: true,
            prev_time: None,
            carry: 0.0,
        }
    }

    /// Current timestep.
    pub fn timestep(&self) -> usize {
        self.timestep
    }

    /// Number of timesteps played over.
    pub fn ntimesteps(&self) -> usize {
        self.ntimesteps
    }

    /// Timesteps per second.
    pub fn tps(&self) -> f32 {
        self.tps
    }

    /// Current direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether playback is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        self.carry = 0.0;
    }

    /// Flip between paused and playing.
    pub fn toggle_paused(&mut self) {
        self.set_paused(!self.paused);
    }

    /// Reverse the playback direction.
    pub fn reverse(&mut self) {
        self.direction = self.direction.reverse();
    }

    /// Change the playback rate; non-positive rates are ignored.
    pub fn set_tps(&mut self, tps: f32) {
        if tps.is_finite() && tps > 0.0 {
            self.tps = tps;
        }
    }

    /// Jump to `timestep`, clamped to the last timestep.
    pub fn set_timestep(&mut self, timestep: usize) {
        self.timestep = timestep.min(self.ntimesteps.saturating_sub(1));
    }

    /// Update the timestep count after a reload, clamping the current timestep.
    pub fn set_ntimesteps(&mut self, ntimesteps: usize) {
        self.ntimesteps = ntimesteps;
        self.set_timestep(self.timestep);
    }

    /// Step one timestep forwards, wrapping to the first.
    pub fn step_forward(&mut self) {
        self.step(1);
    }

    /// Step one timestep backwards, wrapping to the last.
    pub fn step_backward(&mut self) {
        self.step(-1);
    }

    fn step(&mut self, delta: i64) {
        if self.ntimesteps == 0 {
            return;
        }
        let n = self.ntimesteps as i64;
        self.timestep = (self.timestep as i64 + delta).rem_euclid(n) as usize;
    }

    /// Advance to wall-clock `time` (seconds) and return the current timestep.
    pub fn set_time(&mut self, time: f64) -> usize {
        let elapsed = self.prev_time.map(|prev| time - prev).unwrap_or(0.0);
        self.prev_time = Some(time);

        if self.paused || elapsed <= 0.0 {
            return self.timestep;
        }

        self.carry += elapsed * f64::from(self.tps);
        let whole = self.carry.floor();
        self.carry -= whole;

        let delta = match self.direction {
            Direction::Forward => whole as i64,
            Direction::Backward => -(whole as i64),
        };
        self.step(delta);
        self.timestep
    }
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(0, DEFAULT_TPS)
    }
}

/// Receives status messages from the update driver.
pub trait StatusSink: std::fmt::Debug {
    /// Set a named status line, e.g. `("culling", "on")`.
    fn set_status(&mut self, key: &str, value: &str);

    /// Report the simulation time of the frame on display.
    fn set_time(&mut self, _seconds: f32) {}
}

/// [`StatusSink`] that forwards to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn set_status(&mut self, key: &str, value: &str) {
        tracing::info!("{}: {}", key, value);
    }
}

/// [`StatusSink`] that keeps every message, most recent last.
#[derive(Debug, Default, Clone)]
pub struct StatusLog {
    /// Recorded `(key, value)` pairs.
    pub entries: Vec<(String, String)>,
    /// Last reported simulation time.
    pub time: Option<f32>,
}

impl StatusLog {
    /// Most recent value for `key`.
    pub fn last(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl StatusSink for StatusLog {
    fn set_status(&mut self, key: &str, value: &str) {
        self.entries.push((key.to_string(), value.to_string()));
    }

    fn set_time(&mut self, seconds: f32) {
        self.time = Some(seconds);
    }
}

/// Application state.
#[derive(Debug)]
pub struct App<S: StatusSink> {
    /// Reader for the open file.
    pub reader: SwwReader,
    /// Playback clock.
    pub playback: Playback,
    /// Wireframe display mode.
    pub wireframe: WireframeMode,
    /// Status message receiver.
    pub status: S,
    /// Whether the bed is drawn with its texture.
    pub texture_enabled: bool,
    dirty: bool,
}

impl<S: StatusSink> App<S> {
    /// Create a new application instance around an opened reader.
    pub fn new(reader: SwwReader, tps: f32, status: S) -> Self {
        let playback = Playback::new(reader.number_of_timesteps(), tps);
        let texture_enabled = reader.has_bedslope_texture();
        let mut app = Self {
            reader,
            playback,
            wireframe: WireframeMode::default(),
            status,
            texture_enabled,
            dirty: true,
        };
        let valid = app.reader.is_valid();
        app.status
            .set_status("file", if valid { "loaded" } else { "invalid" });
        app
    }

    /// Run one update cycle at wall-clock `time` and return the timestep shown.
    ///
    /// Refreshes the file first, then rebuilds the bed (animated elevation or
    /// nothing loaded yet) and finally the water surface. On failure the last
    /// good frames stay in the reader.
    pub fn update(&mut self, time: f64) -> Result<usize> {
        let was_valid = self.reader.is_valid();
        if let Err(e) = self.reader.refresh() {
            self.status.set_status("file", "invalid");
            return Err(e);
        }
        if !self.reader.is_valid() {
            return Err(SwwError::NotLoaded("file is not valid"));
        }
        // a reload drops the stage frame
        if !was_valid || self.reader.stage_frame().is_none() {
            self.playback.set_ntimesteps(self.reader.number_of_timesteps());
            self.status.set_status("file", "loaded");
            self.dirty = true;
        }

        let timestep = self.playback.set_time(time);

        let bed_stale = self
            .reader
            .bedslope_frame()
            .map(|f| f.timestep != timestep)
            .unwrap_or(true);
        let bed_needed =
            self.reader.is_elevation_animated() || self.reader.bedslope_frame().is_none();
        if bed_stale && bed_needed {
            self.reader.load_bedslope(timestep)?;
            self.dirty = true;
        }

        let stage_stale = self
            .reader
            .stage_frame()
            .map(|f| f.timestep != timestep)
            .unwrap_or(true);
        if stage_stale || self.dirty {
            self.reader.load_stage(timestep)?;
            self.dirty = false;
        }

        self.status.set_time(self.reader.time(timestep));
        Ok(timestep)
    }

    /// Flip steep-triangle culling.
    pub fn toggle_culling(&mut self) {
        self.reader.toggle_culling();
        self.dirty = true;
        let culling = self.reader.culling();
        self.status
            .set_status("culling", if culling { "on" } else { "off" });
    }

    /// Cycle to the next wireframe mode.
    pub fn cycle_wireframe(&mut self) {
        self.wireframe = self.wireframe.next();
        self.status.set_status("wireframe", self.wireframe.name());
    }

    /// Show or hide the bed texture.
    pub fn toggle_texture(&mut self) {
        self.texture_enabled = !self.texture_enabled;
        self.status
            .set_status("texture", if self.texture_enabled { "on" } else { "off" });
    }

    /// Pause or resume playback.
    pub fn toggle_paused(&mut self) {
        self.playback.toggle_paused();
        let state = if self.playback.is_paused() {
            "paused"
        } else {
            "playing"
        };
        self.status.set_status("playback", state);
    }

    /// Time series for the selected triangle.
    ///
    /// Stage while the texture is shown, momentum magnitude otherwise.
    pub fn select_triangle(&mut self, triangle: usize) -> Result<Vec<f32>> {
        let kind = if self.texture_enabled {
            TimeSeriesKind::Stage
        } else {
            TimeSeriesKind::MomentumMagnitude
        };
        let series = self.reader.time_series(triangle, kind)?;
        self.status.set_status("series", kind.name());
        Ok(series)
    }
}
