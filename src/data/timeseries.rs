//! Full time series at a single mesh point.

use super::container::{Batch, Container};
use super::frame::check_point_count;
use super::mesh::Mesh;
use super::schema;
use crate::error::{Result, SwwError};
use crate::util::colormaps::momentum_magnitude;
use std::path::Path;

/// Quantity extracted for a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSeriesKind {
    /// Magnitude of momentum, `sqrt(xmomentum² + ymomentum²)`.
    MomentumMagnitude,
    /// Water height in absolute metres.
    #[default]
    Stage,
}

impl TimeSeriesKind {
    /// Get display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::MomentumMagnitude => "Momentum Timeseries",
            Self::Stage => "Stage Timeseries",
        }
    }
}

/// Read the series for `triangle`, using its first vertex as the sample point.
pub fn extract(path: &Path, mesh: &Mesh, triangle: usize, kind: TimeSeriesKind) -> Result<Vec<f32>> {
    let [point, _, _] = mesh.triangle(triangle)?;

    if kind == TimeSeriesKind::MomentumMagnitude && !mesh.has_momentum {
        return Err(SwwError::MomentumUnavailable);
    }

    let container = Container::open(path)?;
    check_point_count(&container, mesh)?;

    let mut batch = Batch::new();
    let mut series = match kind {
        TimeSeriesKind::Stage => batch.push(container.read_column(schema::VAR_STAGE, point)),
        TimeSeriesKind::MomentumMagnitude => {
            let xmom = batch.push(container.read_column(schema::VAR_XMOMENTUM, point));
            let ymom = batch.push(container.read_column(schema::VAR_YMOMENTUM, point));
            xmom.iter()
                .zip(&ymom)
                .map(|(&x, &y)| momentum_magnitude(x, y))
                .collect()
        },
    };
    container.close();
    batch.finish()?;

    // the file may have grown since the mesh was loaded
    series.truncate(mesh.ntimesteps);

    tracing::debug!(
        "{} at point {} (triangle {}): {} samples",
        kind.name(),
        point,
        triangle,
        series.len()
    );

    Ok(series)
}
