//! Mapping of raw mesh coordinates into an aspect-preserving unit cube.

use glam::{Vec2, Vec3};

/// Uniform scale plus per-axis offset and centre.
///
/// Computed once from the bedslope point cloud and reused for every later
/// bedslope and stage frame so both layers stay co-registered. Offsets do not
/// include the `xllcorner`/`yllcorner` georeference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    /// Uniform scale applied to all three axes.
    pub scale: f32,
    /// `1 / xrange`, used for decal texture coordinates.
    pub xscale: f32,
    /// `1 / yrange`, used for decal texture coordinates.
    pub yscale: f32,
    /// `1 / zrange`, or 1 for a flat bed.
    pub zscale: f32,
    /// Per-axis minimum subtracted before scaling.
    pub offset: Vec3,
    /// Per-axis centre subtracted after scaling.
    pub center: Vec3,
}

impl Normalization {
    /// Compute the bounding volume of a point cloud.
    ///
    /// Returns `None` for an empty cloud or mismatched array lengths.
    pub fn from_points(x: &[f32], y: &[f32], z: &[f32]) -> Option<Self> {
        if x.is_empty() || x.len() != y.len() || x.len() != z.len() {
            return None;
        }

        let (xmin, xmax) = min_max(x);
        let (ymin, ymax) = min_max(y);
        let (zmin, zmax) = min_max(z);

        let xrange = xmax - xmin;
        let yrange = ymax - ymin;
        let zrange = zmax - zmin;
        let aspect_ratio = xrange / yrange;

        // flat bed that doesn't necessarily pass through z=0
        let zscale = if zrange == 0.0 { 1.0 } else { 1.0 / zrange };

        let mut center = Vec3::new(0.5, 0.5, 0.0);
        let scale = if aspect_ratio > 1.0 {
            center.y /= aspect_ratio;
            1.0 / xrange
        } else {
            center.x *= aspect_ratio;
            1.0 / yrange
        };

        let norm = Self {
            scale,
            xscale: 1.0 / xrange,
            yscale: 1.0 / yrange,
            zscale,
            offset: Vec3::new(xmin, ymin, zmin),
            center,
        };

        tracing::debug!(
            "Bounding volume x=[{}, {}] y=[{}, {}] z=[{}, {}]",
            xmin,
            xmax,
            ymin,
            ymax,
            zmin,
            zmax
        );
        tracing::debug!(
            "scale={} zscale={} center={:?}",
            norm.scale,
            norm.zscale,
            norm.center
        );

        Some(norm)
    }

    /// Normalize a single raw coordinate.
    pub fn apply(&self, x: f32, y: f32, z: f32) -> Vec3 {
        (Vec3::new(x, y, z) - self.offset) * self.scale - self.center
    }

    /// Normalize parallel coordinate arrays.
    pub fn positions(&self, x: &[f32], y: &[f32], z: &[f32]) -> Vec<Vec3> {
        x.iter()
            .zip(y)
            .zip(z)
            .map(|((&x, &y), &z)| self.apply(x, y, z))
            .collect()
    }

    /// Decal texture coordinate: position scaled by extents into `[0, 1]`.
    pub fn decal(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new((x - self.offset.x) * self.xscale, (y - self.offset.y) * self.yscale)
    }
}

fn min_max(values: &[f32]) -> (f32, f32) {
    values
        .iter()
        .fold((values[0], values[0]), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
