//! Typed access to the NetCDF container behind an SWW file.
//!
//! Every reader operation opens the file, issues a handful of reads and closes
//! it again; no handle outlives a call. Reads are grouped into a [`Batch`] so a
//! sequence of calls can be issued before a single pass/fail check.

use super::schema::{self, ElevationKind};
use crate::error::{Result, SwwError};
use netcdf::types::{FloatType, IntType, NcVariableType};
use std::path::{Path, PathBuf};

/// Which part of a time-indexed variable to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slab {
    /// Every value.
    All,
    /// One timestep: `Np` values at a fixed leading index.
    Row(usize),
    /// One point: `Nt` values at a fixed trailing index.
    Column(usize),
}

/// An open SWW container. Dropping it closes the file.
pub struct Container {
    path: PathBuf,
    file: netcdf::File,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container").field("path", &self.path).finish()
    }
}

impl Container {
    /// Open a container read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let file = netcdf::open(path).map_err(|e| SwwError::file_open(path, e.to_string()))?;
        tracing::trace!("Opened {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Close the container.
    pub fn close(self) {
        tracing::trace!("Closed {}", self.path.display());
    }

    /// Path the container was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length of a named dimension.
    pub fn dimension_len(&self, name: &str) -> Result<usize> {
        self.file
            .dimension(name)
            .map(|d| d.len())
            .ok_or_else(|| SwwError::missing_dimension(name))
    }

    /// Check whether a variable exists.
    pub fn has_variable(&self, name: &str) -> bool {
        self.file.variable(name).is_some()
    }

    /// Number of dimensions of a variable.
    pub fn variable_rank(&self, name: &str) -> Result<usize> {
        Ok(self.variable(name)?.dimensions().len())
    }

    /// Find the bed elevation variable and whether it is animated.
    ///
    /// Looks for `elevation` first and falls back to the legacy `z`.
    pub fn resolve_elevation(&self) -> Result<(&'static str, ElevationKind)> {
        let name = if self.has_variable(schema::VAR_ELEVATION) {
            schema::VAR_ELEVATION
        } else {
            tracing::warn!(
                "Variable '{}' not found, trying old format '{}' instead",
                schema::VAR_ELEVATION,
                schema::VAR_ELEVATION_LEGACY
            );
            schema::VAR_ELEVATION_LEGACY
        };

        let rank = self.variable_rank(name)?;
        let kind = ElevationKind::from_rank(rank).ok_or_else(|| SwwError::UnsupportedRank {
            name: name.to_string(),
            rank,
        })?;

        match kind {
            ElevationKind::Animated => tracing::info!("Animated elevation data found"),
            ElevationKind::Static => tracing::info!("Static elevation data only"),
        }

        Ok((name, kind))
    }

    /// Read a whole variable as `f32`.
    pub fn read_full(&self, name: &str) -> Result<Vec<f32>> {
        self.read_f32(name, Slab::All)
    }

    /// Read one timestep row of a `Nt × Np` variable.
    pub fn read_row(&self, name: &str, row: usize) -> Result<Vec<f32>> {
        self.read_f32(name, Slab::Row(row))
    }

    /// Read one point column of a `Nt × Np` variable.
    pub fn read_column(&self, name: &str, column: usize) -> Result<Vec<f32>> {
        self.read_f32(name, Slab::Column(column))
    }

    /// Read an integer index variable.
    ///
    /// Negative indices cannot address a point and are mapped to `u32::MAX`
    /// so that bounds checks reject them.
    pub fn read_indices(&self, name: &str) -> Result<Vec<u32>> {
        let var = self.variable(name)?;

        let indices = match var.vartype() {
            NcVariableType::Int(IntType::I32) => var
                .get_values::<i32, _>(..)?
                .into_iter()
                .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
                .collect(),
            NcVariableType::Int(IntType::U32) => var.get_values::<u32, _>(..)?,
            NcVariableType::Int(IntType::I64) => var
                .get_values::<i64, _>(..)?
                .into_iter()
                .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
                .collect(),
            NcVariableType::Int(IntType::U64) => var
                .get_values::<u64, _>(..)?
                .into_iter()
                .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
                .collect(),
            other => {
                return Err(SwwError::NetCDF(format!(
                    "Variable '{}' has non-integer type {:?}",
                    name, other
                )))
            },
        };

        Ok(indices)
    }

    /// Read a global text attribute.
    pub fn global_text(&self, name: &str) -> Option<String> {
        use netcdf::AttributeValue;

        match self.file.attribute(name)?.value() {
            Ok(AttributeValue::Str(s)) => Some(s.trim_end_matches('\0').to_string()),
            Ok(AttributeValue::Strs(v)) => v.into_iter().next(),
            _ => None,
        }
    }

    /// Read a global numeric attribute.
    pub fn global_float(&self, name: &str) -> Option<f32> {
        use netcdf::AttributeValue;

        match self.file.attribute(name)?.value() {
            Ok(AttributeValue::Float(v)) => Some(v),
            Ok(AttributeValue::Double(v)) => Some(v as f32),
            Ok(AttributeValue::Int(v)) => Some(v as f32),
            Ok(AttributeValue::Floats(v)) => v.first().copied(),
            Ok(AttributeValue::Doubles(v)) => v.first().map(|&x| x as f32),
            _ => None,
        }
    }

    fn variable(&self, name: &str) -> Result<netcdf::Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| SwwError::missing_variable(name))
    }

    fn read_f32(&self, name: &str, slab: Slab) -> Result<Vec<f32>> {
        let var = self.variable(name)?;

        macro_rules! read {
            ($t:ty) => {
                match slab {
                    Slab::All => var.get_values::<$t, _>(..)?,
                    Slab::Row(row) => var.get_values::<$t, _>((row, ..))?,
                    Slab::Column(column) => var.get_values::<$t, _>((.., column))?,
                }
            };
        }

        let values = match var.vartype() {
            NcVariableType::Float(FloatType::F32) => read!(f32),
            NcVariableType::Float(FloatType::F64) => {
                read!(f64).into_iter().map(|v| v as f32).collect()
            },
            NcVariableType::Int(IntType::I32) => {
                read!(i32).into_iter().map(|v| v as f32).collect()
            },
            NcVariableType::Int(IntType::I16) => {
                read!(i16).into_iter().map(|v| v as f32).collect()
            },
            other => {
                return Err(SwwError::NetCDF(format!(
                    "Variable '{}' has unsupported type {:?}",
                    name, other
                )))
            },
        };

        Ok(values)
    }
}

/// Deferred status check over a sequence of fallible container calls.
///
/// Each pushed result yields its value, or `T::default()` on failure. Values
/// are only trustworthy once [`Batch::finish`] returns `Ok`.
#[derive(Debug, Default)]
pub struct Batch {
    failures: Vec<SwwError>,
}

impl Batch {
    /// Start a new batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result, returning its value or a placeholder on failure.
    pub fn push<T: Default>(&mut self, result: Result<T>) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                self.failures.push(e);
                T::default()
            },
        }
    }

    /// Record a result whose value is not needed.
    pub fn check<T>(&mut self, result: Result<T>) {
        if let Err(e) = result {
            self.failures.push(e);
        }
    }

    /// Whether no failure has been recorded so far.
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Drain the batch, logging and returning the first failure.
    pub fn finish(self) -> Result<()> {
        let mut failures = self.failures.into_iter();
        match failures.next() {
            None => Ok(()),
            Some(first) => {
                tracing::error!("Error: {}", first);
                let rest = failures.count();
                if rest > 0 {
                    tracing::debug!("{} further failure(s) in the same batch", rest);
                }
                Err(first)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_clean() {
        let mut batch = Batch::new();
        let a: usize = batch.push(Ok(3));
        batch.check(Ok::<(), SwwError>(()));
        assert!(batch.is_ok());
        assert!(batch.finish().is_ok());
        assert_eq!(a, 3);
    }

    #[test]
    fn test_batch_reports_first_failure() {
        let mut batch = Batch::new();
        let a: usize = batch.push(Err(SwwError::missing_dimension("number_of_points")));
        let b: Vec<f32> = batch.push(Err(SwwError::missing_variable("stage")));
        let c: usize = batch.push(Ok(7));
        assert_eq!(a, 0);
        assert!(b.is_empty());
        assert_eq!(c, 7);
        assert!(!batch.is_ok());

        match batch.finish() {
            Err(SwwError::MissingDimension { name }) => assert_eq!(name, "number_of_points"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
