//! Names and shapes of the SWW container schema.

/// Triangle count dimension.
pub const DIM_VOLUMES: &str = "number_of_volumes";
/// Vertices per triangle dimension (always 3).
pub const DIM_VERTICES: &str = "number_of_vertices";
/// Unique point count dimension.
pub const DIM_POINTS: &str = "number_of_points";
/// Timestep count dimension.
pub const DIM_TIMESTEPS: &str = "number_of_timesteps";

/// Point x coordinates.
pub const VAR_X: &str = "x";
/// Point y coordinates.
pub const VAR_Y: &str = "y";
/// Bed elevation.
pub const VAR_ELEVATION: &str = "elevation";
/// Bed elevation in files written before `elevation` was introduced.
pub const VAR_ELEVATION_LEGACY: &str = "z";
/// Triangle vertex indices.
pub const VAR_VOLUMES: &str = "volumes";
/// Simulation time of each timestep.
pub const VAR_TIME: &str = "time";
/// Water surface height per timestep.
pub const VAR_STAGE: &str = "stage";
/// Momentum along x per timestep.
pub const VAR_XMOMENTUM: &str = "xmomentum";
/// Momentum along y per timestep.
pub const VAR_YMOMENTUM: &str = "ymomentum";

/// Bedslope image filename attribute.
pub const ATTR_TEXTURE: &str = "texture";
/// Georeference x offset attribute.
pub const ATTR_XLLCORNER: &str = "xllcorner";
/// Georeference y offset attribute.
pub const ATTR_YLLCORNER: &str = "yllcorner";

/// Vertices per triangle.
pub const VERTICES_PER_VOLUME: usize = 3;

/// Whether the bed elevation is stored once or per timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElevationKind {
    /// One row of `Np` values.
    #[default]
    Static,
    /// `Nt × Np` values, the bed deforms over time.
    Animated,
}

impl ElevationKind {
    /// Classify an elevation variable by its rank.
    pub fn from_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Self::Static),
            2 => Some(Self::Animated),
            _ => None,
        }
    }

    /// Check if the elevation changes per timestep.
    pub fn is_animated(self) -> bool {
        self == Self::Animated
    }
}
