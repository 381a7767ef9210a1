//! swwview - reader and geometry engine for SWW shallow-water simulation output.
//!
//! An SWW file is a NetCDF container holding a triangle mesh, a bed elevation
//! (static or per timestep) and per-timestep water stage and momentum. This
//! crate reads those files and derives normalized, render-ready geometry for
//! one timestep at a time, watching the file so that a simulation still
//! writing its output can be followed live.
//!
//! # Features
//!
//! - Schema discovery with legacy elevation fallback
//! - Aspect-preserving normalization into a unit cube
//! - Per-triangle normals, per-vertex normals and depth/momentum colouring
//! - Steep-triangle culling
//! - Point time series of stage or momentum magnitude
//! - On-disk change detection and reload
//!
//! # Example
//!
//! ```ignore
//! use swwview::data::SwwReader;
//!
//! let mut reader = SwwReader::open("flood.sww");
//! reader.load_stage(0)?;
//! println!(
//!     "{} vertices, {} visible",
//!     reader.number_of_vertices(),
//!     reader.stage_frame().map(|f| f.visible_vertices()).unwrap_or(0)
//! );
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]
#![deny(unsafe_code)]

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod texture;
pub mod util;
pub mod watch;

pub use data::SwwReader;
pub use error::{Result, SwwError};
