//! Reader configuration: transfer function, culling and paths.
//!
//! The configuration is owned by the reader and only mutated between frames.

use std::path::PathBuf;

/// Environment variable naming the directory holding viewer resources.
pub const ROOT_DIR_ENV: &str = "SWOLLEN_BINDIR";

/// Height → alpha transfer function control points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferFunction {
    /// Alpha at `height_min`.
    pub alpha_min: f32,
    /// Alpha clamp value.
    pub alpha_max: f32,
    /// Height below which water is fully transparent.
    pub height_min: f32,
    /// Height at which alpha reaches `alpha_max`.
    pub height_max: f32,
}

impl Default for TransferFunction {
    fn default() -> Self {
        Self {
            alpha_min: 0.8,
            alpha_max: 1.0,
            height_min: 0.0,
            height_max: 1.0,
        }
    }
}

impl TransferFunction {
    /// Alpha for a water depth `h` (stage minus bed, normalized units).
    ///
    /// Zero below `height_min`, otherwise a linear ramp from `alpha_min`
    /// clamped above at `alpha_max`. An empty height span jumps straight to
    /// `alpha_max`.
    pub fn alpha(&self, h: f32) -> f32 {
        if h < self.height_min {
            return 0.0;
        }

        let span = self.height_max - self.height_min;
        if span <= 0.0 {
            return self.alpha_max;
        }

        let slope = (self.alpha_max - self.alpha_min) / span;
        let alpha = slope * (h - self.height_min) + self.alpha_min;
        if alpha > self.alpha_max {
            self.alpha_max
        } else {
            alpha
        }
    }
}

/// Steep-triangle culling settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullingConfig {
    /// Triangles steeper than this many degrees are culled.
    pub angle: f32,
    /// Culling on or off.
    pub enabled: bool,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            angle: 85.0,
            enabled: false,
        }
    }
}

impl CullingConfig {
    /// Threshold on `|normal · up|` below which a triangle counts as steep.
    pub fn threshold(&self) -> f32 {
        self.angle.to_radians().cos()
    }

    /// Flip culling on/off.
    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }
}

/// Combined reader configuration.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Alpha transfer function.
    pub transfer: TransferFunction,
    /// Steepness culling.
    pub culling: CullingConfig,
    /// Bedslope texture image, if any.
    pub bedslope_texture: Option<PathBuf>,
    /// Directory holding viewer resources.
    pub root_directory: PathBuf,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            transfer: TransferFunction::default(),
            culling: CullingConfig::default(),
            bedslope_texture: None,
            root_directory: root_directory_from_env(),
        }
    }
}

/// Resource directory from `SWOLLEN_BINDIR`, or the current directory.
pub fn root_directory_from_env() -> PathBuf {
    std::env::var_os(ROOT_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Which parts of the scene are drawn as wireframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireframeMode {
    /// Normal rendering.
    #[default]
    None,
    /// Water only.
    Water,
    /// Bed surface only.
    Bed,
    /// All geometry.
    Both,
}

impl WireframeMode {
    /// Get the next mode in the cycle.
    pub fn next(self) -> Self {
        match self {
            Self::None => Self::Water,
            Self::Water => Self::Bed,
            Self::Bed => Self::Both,
            Self::Both => Self::None,
        }
    }

    /// Whether the water surface is drawn as wireframe.
    pub fn shows_water(self) -> bool {
        matches!(self, Self::Water | Self::Both)
    }

    /// Whether the bed is drawn as wireframe.
    pub fn shows_bed(self) -> bool {
        matches!(self, Self::Bed | Self::Both)
    }

    /// Get display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Water => "Water",
            Self::Bed => "Bed",
            Self::Both => "Both",
        }
    }
}
