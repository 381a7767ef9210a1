//! SWW data access and geometry.
//!
//! This module handles reading SWW (NetCDF) files and deriving normalized
//! triangle-mesh geometry from them, one timestep at a time.

mod connectivity;
mod container;
mod frame;
mod mesh;
mod normalize;
mod reader;
pub mod schema;
mod timeseries;

pub use connectivity::Connectivity;
pub use container::{Batch, Container, Slab};
pub use frame::{
    read_stage_row, triangle_normal, BedslopeFrame, GeometryBuilder, StageFrame, StageRow,
};
pub use mesh::{resolve_texture, Mesh};
pub use normalize::Normalization;
pub use reader::SwwReader;
pub use schema::ElevationKind;
pub use timeseries::{extract as extract_time_series, TimeSeriesKind};
