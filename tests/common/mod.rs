//! SWW fixture files for integration tests.
//!
//! The default fixture is a 5 × 4 grid of points over the unit square, split
//! into 24 triangles, with three timesteps at t = 0, 0.5, 1. The bed is the
//! inclined plane z = (1 - x + y) / 3 and the water sits `0.1 + 0.2·t` above it.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Points along y.
pub const NY: usize = 4;

/// Unit normal of the fixture's bed plane.
pub const PLANE_NORMAL: [f32; 3] = [0.301511, -0.301511, 0.904534];

/// Builder for SWW fixture files.
#[derive(Debug, Clone)]
pub struct Fixture {
    /// Points along x; x = ix / 4.
    pub nx: usize,
    /// Simulation times.
    pub times: Vec<f32>,
    /// Write elevation as `Nt × Np`, eroding by 0.05 per timestep.
    pub animated: bool,
    /// Write `xmomentum = 3t`, `ymomentum = 4t`.
    pub momentum: bool,
    /// Name the bed variable `z` instead of `elevation`.
    pub legacy_z: bool,
    /// Replace the second index of triangle 3 with -1.
    pub bad_index: bool,
    /// Variable to leave out.
    pub skip: Option<&'static str>,
    /// Dimension to leave out, along with every variable using it.
    pub skip_dimension: Option<&'static str>,
    /// Length of `number_of_vertices`; any other value than 3 writes zero indices.
    pub vertices: usize,
    /// Give animated elevation a third `number_of_layers` axis of length 1.
    pub elevation_layers: bool,
    /// `texture` global attribute.
    pub texture: Option<&'static str>,
    /// `xllcorner`/`yllcorner` global attributes.
    pub corner: Option<(f64, f64)>,
    /// Raise the water at this point by 10.
    pub spike: Option<usize>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            nx: 5,
            times: vec![0.0, 0.5, 1.0],
            animated: false,
            momentum: false,
            legacy_z: false,
            bad_index: false,
            skip: None,
            skip_dimension: None,
            vertices: 3,
            elevation_layers: false,
            texture: None,
            corner: None,
            spike: None,
        }
    }
}

/// Bed elevation of the fixture plane.
pub fn bed_elevation(x: f32, y: f32) -> f32 {
    (1.0 - x + y) / 3.0
}

/// Water depth above the bed at timestep `t`.
pub fn depth(t: usize) -> f32 {
    0.1 + 0.2 * t as f32
}

impl Fixture {
    /// Number of points.
    pub fn npoints(&self) -> usize {
        self.nx * NY
    }

    /// Number of triangles.
    pub fn nvolumes(&self) -> usize {
        (self.nx - 1) * (NY - 1) * 2
    }

    /// Raw point coordinates.
    pub fn points(&self) -> (Vec<f32>, Vec<f32>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for ix in 0..self.nx {
            for iy in 0..NY {
                x.push(ix as f32 / 4.0);
                y.push(iy as f32 / 3.0);
            }
        }
        (x, y)
    }

    /// Flat triangle index list.
    pub fn indices(&self) -> Vec<i32> {
        let mut indices = Vec::new();
        for ix in 0..(self.nx - 1) as i32 {
            for iy in 0..(NY - 1) as i32 {
                let a = NY as i32 * ix + iy;
                let b = NY as i32 * (ix + 1) + iy;
                indices.extend([b, b + 1, a, a + 1, a, b + 1]);
            }
        }
        if self.bad_index {
            indices[3 * 3 + 1] = -1;
        }
        indices
    }

    /// Write the fixture to `path`.
    pub fn write(&self, path: &Path) -> Result<(), netcdf::Error> {
        let np = self.npoints();
        let nt = self.times.len();
        let (x, y) = self.points();
        let bed: Vec<f32> = x
            .iter()
            .zip(&y)
            .map(|(&x, &y)| bed_elevation(x, y))
            .collect();

        let mut file = netcdf::create(path)?;
        for (name, len) in [
            ("number_of_volumes", self.nvolumes()),
            ("number_of_vertices", self.vertices),
            ("number_of_points", np),
            ("number_of_timesteps", nt),
        ] {
            if self.skip_dimension != Some(name) {
                file.add_dimension(name, len)?;
            }
        }
        if self.elevation_layers {
            file.add_dimension("number_of_layers", 1)?;
        }

        if let Some(texture) = self.texture {
            file.add_attribute("texture", texture)?;
        }
        if let Some((xll, yll)) = self.corner {
            file.add_attribute("xllcorner", xll)?;
            file.add_attribute("yllcorner", yll)?;
        }

        self.put(&mut file, "x", &["number_of_points"], &x)?;
        self.put(&mut file, "y", &["number_of_points"], &y)?;
        self.put(&mut file, "time", &["number_of_timesteps"], &self.times)?;

        let volume_dims = ["number_of_volumes", "number_of_vertices"];
        if self.skip != Some("volumes") && !self.skips_any(&volume_dims) {
            let indices = if self.vertices == 3 {
                self.indices()
            } else {
                vec![0; self.nvolumes() * self.vertices]
            };
            let mut var = file.add_variable::<i32>("volumes", &volume_dims)?;
            var.put_values(indices.as_slice(), ..)?;
        }

        let elevation = if self.legacy_z { "z" } else { "elevation" };
        if self.elevation_layers {
            let values: Vec<f32> = (0..nt).flat_map(|_| bed.iter().copied()).collect();
            self.put(
                &mut file,
                elevation,
                &["number_of_timesteps", "number_of_points", "number_of_layers"],
                &values,
            )?;
        } else if self.animated {
            let values: Vec<f32> = (0..nt)
                .flat_map(|t| bed.iter().map(move |z| z - 0.05 * t as f32))
                .collect();
            self.put(
                &mut file,
                elevation,
                &["number_of_timesteps", "number_of_points"],
                &values,
            )?;
        } else {
            self.put(&mut file, elevation, &["number_of_points"], &bed)?;
        }

        let stage: Vec<f32> = (0..nt)
            .flat_map(|t| {
                bed.iter().enumerate().map(move |(p, z)| {
                    let spike = if self.spike == Some(p) { 10.0 } else { 0.0 };
                    z + depth(t) + spike
                })
            })
            .collect();
        self.put(
            &mut file,
            "stage",
            &["number_of_timesteps", "number_of_points"],
            &stage,
        )?;

        if self.momentum {
            let xmom: Vec<f32> = (0..nt)
                .flat_map(|t| std::iter::repeat(3.0 * t as f32).take(np))
                .collect();
            let ymom: Vec<f32> = (0..nt)
                .flat_map(|t| std::iter::repeat(4.0 * t as f32).take(np))
                .collect();
            let dims = ["number_of_timesteps", "number_of_points"];
            self.put(&mut file, "xmomentum", &dims, &xmom)?;
            self.put(&mut file, "ymomentum", &dims, &ymom)?;
        }

        Ok(())
    }

    /// Replace the file at `path` in one step, the way a simulation rewrites its output.
    pub fn write_over(&self, path: &Path) -> Result<(), netcdf::Error> {
        let tmp = path.with_extension("sww.tmp");
        self.write(&tmp)?;
        fs::rename(&tmp, path).unwrap();
        Ok(())
    }

    fn put(
        &self,
        file: &mut netcdf::FileMut,
        name: &str,
        dims: &[&str],
        values: &[f32],
    ) -> Result<(), netcdf::Error> {
        if self.skip == Some(name) || self.skips_any(dims) {
            return Ok(());
        }
        let mut var = file.add_variable::<f32>(name, dims)?;
        var.put_values(values, ..)?;
        Ok(())
    }

    fn skips_any(&self, dims: &[&str]) -> bool {
        self.skip_dimension
            .map(|skipped| dims.contains(&skipped))
            .unwrap_or(false)
    }
}

/// Write `fixture` into a fresh temporary directory as `flood.sww`.
pub fn write_temp(fixture: &Fixture) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flood.sww");
    fixture.write(&path).unwrap();
    (dir, path)
}

/// Approximate equality of two 3-vectors.
pub fn close3(a: glam::Vec3, b: [f32; 3]) -> bool {
    (a - glam::Vec3::from(b)).length() < 1e-4
}
