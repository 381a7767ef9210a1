//! Utility functions.
//!
//! This module provides colour mapping for the water surface and number
//! formatting for command-line output.

pub mod colormaps;
pub mod formatters;

pub use formatters::{format_number, format_value, format_vec3};
