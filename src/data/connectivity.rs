//! Point → triangle adjacency.

use ndarray::Array2;

/// For every point, the triangles that reference it in discovery order.
///
/// Built once per load and used to average per-triangle normals into
/// per-vertex normals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connectivity {
    adjacency: Vec<Vec<u32>>,
}

impl Connectivity {
    /// Build adjacency lists for `npoints` points from an `Nv × 3` index array.
    ///
    /// Out-of-range vertex indices are skipped; such triangles are rejected
    /// by the geometry pass.
    pub fn build(volumes: &Array2<u32>, npoints: usize) -> Self {
        let mut adjacency = vec![Vec::new(); npoints];

        for (triangle, vertices) in volumes.outer_iter().enumerate() {
            for &v in vertices.iter() {
                if let Some(list) = adjacency.get_mut(v as usize) {
                    list.push(triangle as u32);
                }
            }
        }

        Self { adjacency }
    }

    /// Triangles sharing point `index`.
    pub fn triangles(&self, index: usize) -> Option<&[u32]> {
        self.adjacency.get(index).map(Vec::as_slice)
    }

    /// Number of points covered.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Check if no points are covered.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Total number of (point, triangle) references.
    pub fn total_references(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Iterate over every point's adjacency list.
    pub fn iter(&self) -> impl Iterator<Item = &[u32]> {
        self.adjacency.iter().map(Vec::as_slice)
    }
}
