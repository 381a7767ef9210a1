//! Per-timestep geometry: bedslope and water-surface frames.
//!
//! Frames are rebuilt on every timestep request and never cached across
//! timesteps. A failed request leaves the previously built frames in place so
//! the caller can keep showing the last good frame.

use super::connectivity::Connectivity;
use super::container::{Batch, Container};
use super::mesh::Mesh;
use super::normalize::Normalization;
use super::schema;
use crate::config::ReaderConfig;
use crate::error::{Result, SwwError};
use crate::util::colormaps;
use glam::{Vec3, Vec4};
use std::path::Path;

/// Unit normal of triangle `(v1, v2, v3)` from `(v2 - v1) × (v3 - v2)`.
///
/// Zero-area triangles get a zero normal, which makes them count as steep.
pub fn triangle_normal(v1: Vec3, v2: Vec3, v3: Vec3) -> Vec3 {
    let normal = (v2 - v1).cross(v3 - v2).normalize_or_zero();
    if normal == Vec3::ZERO {
        tracing::debug!("Degenerate triangle {} {} {}", v1, v2, v3);
    }
    normal
}

/// Normalized bed geometry at one timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct BedslopeFrame {
    /// Timestep the frame was built for.
    pub timestep: usize,
    /// Normalized point positions (`Np`).
    pub vertices: Vec<Vec3>,
    /// Per-triangle unit normals (`Nv`).
    pub normals: Vec<Vec3>,
    /// Per-triangle centroids (`Nv`).
    pub centroids: Vec<Vec3>,
}

impl BedslopeFrame {
    /// Build a bedslope frame from one row of elevations.
    pub fn build(mesh: &Mesh, norm: &Normalization, z: &[f32], timestep: usize) -> Result<Self> {
        let vertices = norm.positions(&mesh.x, &mesh.y, z);

        let mut normals = Vec::with_capacity(mesh.nvolumes());
        let mut centroids = Vec::with_capacity(mesh.nvolumes());
        for triangle in 0..mesh.nvolumes() {
            let [i1, i2, i3] = mesh.triangle(triangle)?;
            let (v1, v2, v3) = (vertices[i1], vertices[i2], vertices[i3]);
            normals.push(triangle_normal(v1, v2, v3));
            centroids.push((v1 + v2 + v3) / 3.0);
        }

        Ok(Self {
            timestep,
            vertices,
            normals,
            centroids,
        })
    }
}

/// One timestep of water data as read from the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageRow {
    /// Timestep index.
    pub timestep: usize,
    /// Water surface height per point.
    pub stage: Vec<f32>,
    /// `(xmomentum, ymomentum)` per point, when present.
    pub momentum: Option<(Vec<f32>, Vec<f32>)>,
}

/// Normalized water surface at one timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFrame {
    /// Timestep the frame was built for.
    pub timestep: usize,
    /// Normalized point positions (`Np`).
    pub vertices: Vec<Vec3>,
    /// Per-triangle unit normals (`Nv`).
    pub primitive_normals: Vec<Vec3>,
    /// Per-vertex normals averaged over adjacent triangles (`Np`).
    pub vertex_normals: Vec<Vec3>,
    /// Per-vertex RGBA; alpha encodes depth, RGB encodes momentum.
    pub colors: Vec<Vec4>,
    /// Triangles steeper than the cull angle.
    pub steep: Vec<u32>,
}

impl StageFrame {
    /// Build a stage frame against the current bedslope vertices.
    pub fn build(
        mesh: &Mesh,
        connectivity: &Connectivity,
        norm: &Normalization,
        bed: &[Vec3],
        row: &StageRow,
        config: &ReaderConfig,
    ) -> Result<Self> {
        let vertices = norm.positions(&mesh.x, &mesh.y, &row.stage);

        // primitive normals, steep triangles
        let cull_threshold = config.culling.threshold();
        let mut primitive_normals = Vec::with_capacity(mesh.nvolumes());
        let mut steep = Vec::new();
        for triangle in 0..mesh.nvolumes() {
            let [i1, i2, i3] = mesh.triangle(triangle)?;
            let nrm = triangle_normal(vertices[i1], vertices[i2], vertices[i3]);
            primitive_normals.push(nrm);

            if nrm.dot(Vec3::Z).abs() < cull_threshold {
                steep.push(triangle as u32);
            }
        }

        // depth above bed as alpha, momentum as colour
        let mut colors = Vec::with_capacity(mesh.npoints);
        for (iv, (stage, bed)) in vertices.iter().zip(bed).enumerate() {
            let alpha = config.transfer.alpha(stage.z - bed.z);
            let color = match &row.momentum {
                Some((xmom, ymom)) => colormaps::momentum_color(xmom[iv], ymom[iv], alpha),
                None => colormaps::plain_color(alpha),
            };
            colors.push(color);
        }

        // last write wins across triangles sharing a vertex
        if config.culling.enabled {
            for &triangle in &steep {
                for v in mesh.volumes.row(triangle as usize) {
                    colors[*v as usize] = colormaps::plain_color(0.0);
                }
            }
        }

        let vertex_normals = connectivity
            .iter()
            .map(|triangles| {
                if triangles.is_empty() {
                    return Vec3::ZERO;
                }
                let sum: Vec3 = triangles
                    .iter()
                    .map(|&t| primitive_normals[t as usize])
                    .sum();
                (sum / triangles.len() as f32).normalize_or_zero()
            })
            .collect();

        Ok(Self {
            timestep: row.timestep,
            vertices,
            primitive_normals,
            vertex_normals,
            colors,
            steep,
        })
    }

    /// Number of vertices with non-zero alpha.
    pub fn visible_vertices(&self) -> usize {
        self.colors.iter().filter(|c| c.w > 0.0).count()
    }
}

/// Normalization state plus the most recently built frames.
#[derive(Debug, Clone, Default)]
pub struct GeometryBuilder {
    normalization: Option<Normalization>,
    bedslope: Option<BedslopeFrame>,
    stage: Option<StageFrame>,
}

impl GeometryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalization computed by the first bedslope pass.
    pub fn normalization(&self) -> Option<&Normalization> {
        self.normalization.as_ref()
    }

    /// Last good bedslope frame.
    pub fn bedslope(&self) -> Option<&BedslopeFrame> {
        self.bedslope.as_ref()
    }

    /// Last good stage frame.
    pub fn stage(&self) -> Option<&StageFrame> {
        self.stage.as_ref()
    }

    /// Drop all frames and the normalization.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Bedslope pass: read elevations for `timestep` and rebuild the bed frame.
    ///
    /// The normalization is computed on the first successful call only and
    /// reused afterwards so the unit-cube mapping is stable across frames.
    pub fn load_bedslope(&mut self, path: &Path, mesh: &Mesh, timestep: usize) -> Result<()> {
        if mesh.elevation_kind.is_animated() {
            check_timestep(mesh, timestep)?;
        }

        let container = Container::open(path)?;
        check_point_count(&container, mesh)?;

        let mut batch = Batch::new();
        let mut z = if mesh.elevation_kind.is_animated() {
            batch.push(container.read_row(mesh.elevation, timestep))
        } else {
            batch.push(container.read_full(mesh.elevation))
        };
        container.close();
        batch.finish()?;
        fit_row(mesh.elevation, &mut z, mesh.npoints)?;

        let norm = match self.normalization {
            Some(norm) => norm,
            None => Normalization::from_points(&mesh.x, &mesh.y, &z)
                .ok_or(SwwError::NotLoaded("mesh has no points"))?,
        };

        let frame = BedslopeFrame::build(mesh, &norm, &z, timestep)?;
        tracing::debug!(
            "Bedslope timestep {}: {} vertices, {} triangles",
            timestep,
            frame.vertices.len(),
            frame.normals.len()
        );

        self.normalization = Some(norm);
        self.bedslope = Some(frame);
        Ok(())
    }

    /// Stage pass: read water data for `timestep` and rebuild the water frame.
    pub fn load_stage(
        &mut self,
        path: &Path,
        mesh: &Mesh,
        connectivity: &Connectivity,
        config: &ReaderConfig,
        timestep: usize,
    ) -> Result<()> {
        check_timestep(mesh, timestep)?;
        let (Some(norm), Some(bedslope)) = (self.normalization.as_ref(), self.bedslope.as_ref())
        else {
            return Err(SwwError::NotLoaded("bedslope must be loaded before stage"));
        };

        let row = read_stage_row(path, mesh, timestep)?;
        let frame = StageFrame::build(mesh, connectivity, norm, &bedslope.vertices, &row, config)?;
        tracing::debug!(
            "Stage timestep {}: {} steep triangles, {} visible vertices",
            timestep,
            frame.steep.len(),
            frame.visible_vertices()
        );

        self.stage = Some(frame);
        Ok(())
    }
}

/// Read one timestep of stage (and momentum, if present).
pub fn read_stage_row(path: &Path, mesh: &Mesh, timestep: usize) -> Result<StageRow> {
    let container = Container::open(path)?;
    check_point_count(&container, mesh)?;

    let mut batch = Batch::new();
    let mut stage = batch.push(container.read_row(schema::VAR_STAGE, timestep));
    let mut momentum = if mesh.has_momentum {
        let xmom = batch.push(container.read_row(schema::VAR_XMOMENTUM, timestep));
        let ymom = batch.push(container.read_row(schema::VAR_YMOMENTUM, timestep));
        Some((xmom, ymom))
    } else {
        None
    };
    container.close();
    batch.finish()?;

    fit_row(schema::VAR_STAGE, &mut stage, mesh.npoints)?;
    if let Some((xmom, ymom)) = momentum.as_mut() {
        fit_row(schema::VAR_XMOMENTUM, xmom, mesh.npoints)?;
        fit_row(schema::VAR_YMOMENTUM, ymom, mesh.npoints)?;
    }

    Ok(StageRow {
        timestep,
        stage,
        momentum,
    })
}

/// Fail if the point dimension shrank since the mesh was loaded.
pub(crate) fn check_point_count(container: &Container, mesh: &Mesh) -> Result<()> {
    let found = container.dimension_len(schema::DIM_POINTS)?;
    if found < mesh.npoints {
        tracing::error!("File changes have made it invalid! Please wait.");
        return Err(SwwError::PointCountShrunk {
            expected: mesh.npoints,
            found,
        });
    }
    Ok(())
}

fn check_timestep(mesh: &Mesh, timestep: usize) -> Result<()> {
    if timestep >= mesh.ntimesteps {
        return Err(SwwError::TimestepOutOfRange {
            index: timestep,
            count: mesh.ntimesteps,
        });
    }
    Ok(())
}

fn fit_row(name: &str, row: &mut Vec<f32>, npoints: usize) -> Result<()> {
    if row.len() < npoints {
        return Err(SwwError::NetCDF(format!(
            "Variable '{}' returned {} values, expected {}",
            name,
            row.len(),
            npoints
        )));
    }
    row.truncate(npoints);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::ElevationKind;
    use ndarray::Array2;

    const EPS: f32 = 1e-5;

    /// 5 × 4 grid of points over the unit square, 24 triangles.
    fn grid_mesh() -> Mesh {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for ix in 0..5 {
            for iy in 0..4 {
                x.push(ix as f32 / 4.0);
                y.push(iy as f32 / 3.0);
            }
        }

        let mut indices = Vec::new();
        for ix in 0..4u32 {
            for iy in 0..3u32 {
                let a = 4 * ix + iy;
                let b = 4 * (ix + 1) + iy;
                indices.extend([b, b + 1, a, a + 1, a, b + 1]);
            }
        }

        Mesh {
            npoints: 20,
            ntimesteps: 3,
            x,
            y,
            volumes: Array2::from_shape_vec((24, 3), indices).unwrap(),
            time: vec![0.0, 0.5, 1.0],
            elevation: schema::VAR_ELEVATION,
            elevation_kind: ElevationKind::Static,
            has_momentum: false,
            texture: None,
            xllcorner: 0.0,
            yllcorner: 0.0,
        }
    }

    /// Inclined plane z = (1 - x + y) / 3.
    fn bed_z(mesh: &Mesh) -> Vec<f32> {
        mesh.x
            .iter()
            .zip(&mesh.y)
            .map(|(x, y)| (1.0 - x + y) / 3.0)
            .collect()
    }

    fn bedslope(mesh: &Mesh) -> (Normalization, BedslopeFrame) {
        let z = bed_z(mesh);
        let norm = Normalization::from_points(&mesh.x, &mesh.y, &z).unwrap();
        let frame = BedslopeFrame::build(mesh, &norm, &z, 0).unwrap();
        (norm, frame)
    }

    fn stage_row(mesh: &Mesh, depth: impl Fn(usize) -> f32) -> StageRow {
        let stage = bed_z(mesh)
            .into_iter()
            .enumerate()
            .map(|(i, z)| z + depth(i))
            .collect();
        StageRow {
            timestep: 1,
            stage,
            momentum: None,
        }
    }

    #[test]
    fn test_bedslope_vertices() {
        let mesh = grid_mesh();
        let (_, frame) = bedslope(&mesh);

        assert_eq!(frame.vertices.len(), 20);
        assert!((frame.vertices[0] - Vec3::new(-0.5, -0.5, 0.333333)).length() < EPS);
        assert!((frame.vertices[5] - Vec3::new(-0.25, -0.166667, 0.361111)).length() < EPS);
        assert!((frame.vertices[16] - Vec3::new(0.5, -0.5, 0.0)).length() < EPS);
        assert!((frame.vertices[19] - Vec3::new(0.5, 0.5, 0.333333)).length() < EPS);
    }

    #[test]
    fn test_bedslope_normals_of_plane() {
        let mesh = grid_mesh();
        let (_, frame) = bedslope(&mesh);

        let expected = Vec3::new(0.301511, -0.301511, 0.904534);
        assert_eq!(frame.normals.len(), 24);
        for n in &frame.normals {
            assert!((*n - expected).length() < EPS);
        }
    }

    #[test]
    fn test_bedslope_centroid() {
        let mesh = grid_mesh();
        let (_, frame) = bedslope(&mesh);

        let v = &frame.vertices;
        assert!((frame.centroids[0] - (v[4] + v[5] + v[0]) / 3.0).length() < EPS);
    }

    #[test]
    fn test_bedslope_rejects_bad_index() {
        let mut mesh = grid_mesh();
        mesh.volumes[[3, 1]] = 20;
        let z = bed_z(&mesh);
        let norm = Normalization::from_points(&mesh.x, &mesh.y, &z).unwrap();

        match BedslopeFrame::build(&mesh, &norm, &z, 0) {
            Err(SwwError::IndexOutOfBounds {
                triangle, index, ..
            }) => {
                assert_eq!(triangle, 3);
                assert_eq!(index, 20);
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_stage_alpha_from_depth() {
        let mesh = grid_mesh();
        let connectivity = Connectivity::build(&mesh.volumes, mesh.npoints);
        let (norm, bed) = bedslope(&mesh);
        let row = stage_row(&mesh, |i| if i < 4 { -0.1 } else { 0.5 });

        let frame = StageFrame::build(
            &mesh,
            &connectivity,
            &norm,
            &bed.vertices,
            &row,
            &ReaderConfig::default(),
        )
        .unwrap();

        // below height_min: fully transparent
        for c in &frame.colors[..4] {
            assert_eq!(*c, Vec4::new(1.0, 1.0, 1.0, 0.0));
        }
        // 0.8 + 0.2 * 0.5
        for c in &frame.colors[4..] {
            assert!((c.w - 0.9).abs() < EPS);
            assert_eq!(c.x, 1.0);
        }
    }

    #[test]
    fn test_stage_vertex_normals_on_plane() {
        let mesh = grid_mesh();
        let connectivity = Connectivity::build(&mesh.volumes, mesh.npoints);
        let (norm, bed) = bedslope(&mesh);
        let row = stage_row(&mesh, |_| 0.25);

        let frame = StageFrame::build(
            &mesh,
            &connectivity,
            &norm,
            &bed.vertices,
            &row,
            &ReaderConfig::default(),
        )
        .unwrap();

        let expected = Vec3::new(0.301511, -0.301511, 0.904534);
        assert_eq!(frame.vertex_normals.len(), 20);
        for n in &frame.vertex_normals {
            assert!((*n - expected).length() < 1e-4);
        }
        assert!(frame.steep.is_empty());
    }

    #[test]
    fn test_culling_hides_steep_triangles() {
        let mesh = grid_mesh();
        let connectivity = Connectivity::build(&mesh.volumes, mesh.npoints);
        let (norm, bed) = bedslope(&mesh);
        // spike at interior point 5
        let row = stage_row(&mesh, |i| if i == 5 { 10.0 } else { 0.2 });

        let mut config = ReaderConfig::default();
        let open =
            StageFrame::build(&mesh, &connectivity, &norm, &bed.vertices, &row, &config).unwrap();

        config.culling.enabled = true;
        let culled =
            StageFrame::build(&mesh, &connectivity, &norm, &bed.vertices, &row, &config).unwrap();

        assert_eq!(open.steep, culled.steep);
        let spiked = connectivity.triangles(5).unwrap();
        for t in spiked {
            assert!(culled.steep.contains(t));
        }
        assert!(culled.visible_vertices() <= open.visible_vertices());
        assert_eq!(culled.colors[5], Vec4::new(1.0, 1.0, 1.0, 0.0));
        assert_eq!(open.visible_vertices(), 20);
        assert!(culled.visible_vertices() < 20);
    }

    #[test]
    fn test_momentum_colors() {
        let mesh = grid_mesh();
        let connectivity = Connectivity::build(&mesh.volumes, mesh.npoints);
        let (norm, bed) = bedslope(&mesh);
        let mut row = stage_row(&mesh, |_| 0.5);
        row.momentum = Some((vec![0.0; 20], vec![4.0; 20]));

        let frame = StageFrame::build(
            &mesh,
            &connectivity,
            &norm,
            &bed.vertices,
            &row,
            &ReaderConfig::default(),
        )
        .unwrap();

        for c in &frame.colors {
            assert!((c.truncate() - Vec3::new(0.0, 0.0, 1.0)).length() < EPS);
            assert!((c.w - 0.9).abs() < EPS);
        }
    }

    #[test]
    fn test_degenerate_triangle_normal() {
        let a = Vec3::new(0.1, 0.2, 0.3);
        assert_eq!(triangle_normal(a, a, a), Vec3::ZERO);
        // collinear
        let n = triangle_normal(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert_eq!(n, Vec3::ZERO);
        assert!(!n.is_nan());
    }

    #[test]
    fn test_degenerate_triangle_is_steep() {
        let mut mesh = grid_mesh();
        // collapse triangle 0 onto point 0
        mesh.volumes[[0, 0]] = 0;
        mesh.volumes[[0, 1]] = 0;
        let connectivity = Connectivity::build(&mesh.volumes, mesh.npoints);
        let (norm, bed) = bedslope(&mesh);
        let row = stage_row(&mesh, |_| 0.25);

        let frame = StageFrame::build(
            &mesh,
            &connectivity,
            &norm,
            &bed.vertices,
            &row,
            &ReaderConfig::default(),
        )
        .unwrap();

        assert_eq!(frame.primitive_normals[0], Vec3::ZERO);
        assert_eq!(frame.steep, vec![0]);
        for n in &frame.vertex_normals {
            assert!(!n.is_nan());
        }
        let expected = Vec3::new(0.301511, -0.301511, 0.904534);
        assert!((frame.vertex_normals[0] - expected).length() < 1e-4);
    }

    #[test]
    fn test_fit_row() {
        let mut short = vec![1.0; 3];
        assert!(fit_row("stage", &mut short, 4).is_err());

        let mut long = vec![1.0; 6];
        fit_row("stage", &mut long, 4).unwrap();
        assert_eq!(long.len(), 4);
    }
}
