//! Static mesh data read once per load.

use super::container::{Batch, Container};
use super::schema::{self, ElevationKind};
use crate::error::{Result, SwwError};
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// Schema, point coordinates, triangles and times of an SWW file.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Number of unique points (`Np`).
    pub npoints: usize,
    /// Number of timesteps (`Nt`).
    pub ntimesteps: usize,
    /// Raw x coordinates.
    pub x: Vec<f32>,
    /// Raw y coordinates.
    pub y: Vec<f32>,
    /// `Nv × 3` point indices.
    pub volumes: Array2<u32>,
    /// Simulation time of each timestep, in seconds.
    pub time: Vec<f32>,
    /// Name of the elevation variable (`elevation` or legacy `z`).
    pub elevation: &'static str,
    /// Static or animated elevation.
    pub elevation_kind: ElevationKind,
    /// Whether both momentum components are present.
    pub has_momentum: bool,
    /// Bedslope image named by the file, resolved against its directory.
    pub texture: Option<PathBuf>,
    /// Georeference x offset.
    pub xllcorner: f32,
    /// Georeference y offset.
    pub yllcorner: f32,
}

impl Mesh {
    /// Discover the schema and read the static arrays.
    pub fn load(container: &Container) -> Result<Self> {
        // dimensions
        let mut batch = Batch::new();
        let nvolumes = batch.push(container.dimension_len(schema::DIM_VOLUMES));
        let nvertices = batch.push(container.dimension_len(schema::DIM_VERTICES));
        let npoints = batch.push(container.dimension_len(schema::DIM_POINTS));
        let ntimesteps = batch.push(container.dimension_len(schema::DIM_TIMESTEPS));
        batch.finish()?;

        if nvertices != schema::VERTICES_PER_VOLUME {
            return Err(SwwError::VertexCount { found: nvertices });
        }

        // variables
        let (elevation, elevation_kind) = container.resolve_elevation()?;
        let mut batch = Batch::new();
        for name in [
            schema::VAR_X,
            schema::VAR_Y,
            schema::VAR_VOLUMES,
            schema::VAR_TIME,
            schema::VAR_STAGE,
        ] {
            if !container.has_variable(name) {
                batch.check::<()>(Err(SwwError::missing_variable(name)));
            }
        }
        batch.finish()?;

        let has_momentum = container.has_variable(schema::VAR_XMOMENTUM)
            && container.has_variable(schema::VAR_YMOMENTUM);
        if !has_momentum {
            tracing::info!("No momentum data found");
        }

        // static arrays
        let mut batch = Batch::new();
        let x = batch.push(container.read_full(schema::VAR_X));
        let y = batch.push(container.read_full(schema::VAR_Y));
        let time = batch.push(container.read_full(schema::VAR_TIME));
        let indices = batch.push(container.read_indices(schema::VAR_VOLUMES));
        batch.finish()?;

        check_len(schema::VAR_X, x.len(), npoints)?;
        check_len(schema::VAR_Y, y.len(), npoints)?;
        check_len(schema::VAR_TIME, time.len(), ntimesteps)?;
        check_len(schema::VAR_VOLUMES, indices.len(), nvolumes * nvertices)?;

        let volumes = Array2::from_shape_vec((nvolumes, nvertices), indices)
            .map_err(|e| SwwError::NetCDF(format!("Invalid volumes shape: {}", e)))?;

        tracing::info!("number of volumes: {}", nvolumes);
        tracing::info!("number of vertices: {}", nvertices);
        tracing::info!("number of points: {}", npoints);
        tracing::info!("number of timesteps: {}", ntimesteps);

        let texture = container
            .global_text(schema::ATTR_TEXTURE)
            .filter(|name| !name.is_empty())
            .map(|name| resolve_texture(container.path(), &name));
        if let Some(ref path) = texture {
            tracing::info!("embedded image filename: {}", path.display());
        }

        let (xllcorner, yllcorner) = match (
            container.global_float(schema::ATTR_XLLCORNER),
            container.global_float(schema::ATTR_YLLCORNER),
        ) {
            (Some(x), Some(y)) => {
                tracing::info!("xllcorner: {}, yllcorner: {}", x, y);
                (x, y)
            },
            _ => (0.0, 0.0),
        };

        let mesh = Self {
            npoints,
            ntimesteps,
            x,
            y,
            volumes,
            time,
            elevation,
            elevation_kind,
            has_momentum,
            texture,
            xllcorner,
            yllcorner,
        };
        mesh.validate()?;

        Ok(mesh)
    }

    /// Number of triangles (`Nv`).
    pub fn nvolumes(&self) -> usize {
        self.volumes.nrows()
    }

    /// Flat `3·Nv` index list.
    pub fn indices(&self) -> Vec<u32> {
        self.volumes.iter().copied().collect()
    }

    /// Point indices of a triangle, rejecting any index `>= Np`.
    pub fn triangle(&self, index: usize) -> Result<[usize; 3]> {
        if index >= self.nvolumes() {
            return Err(SwwError::TriangleOutOfRange {
                index,
                count: self.nvolumes(),
            });
        }
        let row = self.volumes.row(index);

        let mut vertices = [0usize; 3];
        for (slot, &v) in vertices.iter_mut().zip(row.iter()) {
            if v as usize >= self.npoints {
                return Err(SwwError::IndexOutOfBounds {
                    triangle: index,
                    index: v,
                    npoints: self.npoints,
                });
            }
            *slot = v as usize;
        }

        Ok(vertices)
    }

    /// Check that every triangle only references existing points.
    pub fn validate(&self) -> Result<()> {
        for triangle in 0..self.nvolumes() {
            self.triangle(triangle)?;
        }
        Ok(())
    }
}

fn check_len(name: &str, found: usize, expected: usize) -> Result<()> {
    if found != expected {
        return Err(SwwError::NetCDF(format!(
            "Variable '{}' has {} values, expected {}",
            name, found, expected
        )));
    }
    Ok(())
}

/// Resolve a texture filename relative to the directory holding the SWW file.
pub fn resolve_texture(sww_path: &Path, name: &str) -> PathBuf {
    let texture = PathBuf::from(name);
    if texture.is_absolute() {
        return texture;
    }

    match sww_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(texture),
        _ => texture,
    }
}
