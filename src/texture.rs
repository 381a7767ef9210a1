//! Bedslope texture services.
//!
//! Decoding images and reading georeference metadata are collaborator
//! services: the reader only asks for them through [`ImageLoader`] and
//! [`GeoreferenceProvider`]. Default implementations are provided on top of
//! the `image` crate and ESRI world files.

use crate::data::{Mesh, Normalization};
use crate::error::{Result, SwwError};
use glam::Vec2;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA bytes.
    pub rgba: Vec<u8>,
}

/// Turns an image filename into pixel data.
pub trait ImageLoader: Debug {
    /// Decode the image at `path`.
    fn load(&self, path: &Path) -> Result<TextureImage>;
}

/// [`ImageLoader`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateLoader;

impl ImageLoader for ImageCrateLoader {
    fn load(&self, path: &Path) -> Result<TextureImage> {
        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        tracing::debug!("Decoded {} ({}x{})", path.display(), width, height);
        Ok(TextureImage {
            width,
            height,
            rgba: img.into_raw(),
        })
    }
}

/// Georeference of an image: resolution, pixel size, origin and rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Georeference {
    /// Image size in pixels.
    pub resolution: (u32, u32),
    /// Pixel size in world units; y is usually negative.
    pub pixel_size: (f64, f64),
    /// World coordinate of the top-left image corner.
    pub origin: (f64, f64),
    /// Row rotation term.
    pub rotation: f64,
}

impl Georeference {
    /// World extent covered by the image.
    pub fn range(&self) -> (f64, f64) {
        (
            self.pixel_size.0 * f64::from(self.resolution.0),
            self.pixel_size.1 * f64::from(self.resolution.1),
        )
    }

    /// Texture coordinate of a raw mesh point shifted by the file's corner offset.
    pub fn tex_coord(&self, x: f32, y: f32, xllcorner: f32, yllcorner: f32) -> Vec2 {
        let (xrange, yrange) = self.range();
        let u = (f64::from(x) + f64::from(xllcorner) - self.origin.0) / xrange;
        let v = 1.0 - (f64::from(y) + f64::from(yllcorner) - self.origin.1) / yrange;
        Vec2::new(u as f32, v as f32)
    }
}

/// Looks up georeference metadata for an image.
pub trait GeoreferenceProvider: Debug {
    /// Georeference of the image at `path`, if it has any.
    fn georeference(&self, path: &Path) -> Option<Georeference>;
}

/// Provider for images that are never georeferenced.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeoreference;

impl GeoreferenceProvider for NoGeoreference {
    fn georeference(&self, _path: &Path) -> Option<Georeference> {
        None
    }
}

/// The six affine terms of an ESRI world file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldFile {
    /// Pixel size along x.
    pub a: f64,
    /// Rotation about y.
    pub d: f64,
    /// Rotation about x.
    pub b: f64,
    /// Pixel size along y (negative for north-up images).
    pub e: f64,
    /// x of the centre of the upper-left pixel.
    pub c: f64,
    /// y of the centre of the upper-left pixel.
    pub f: f64,
}

impl WorldFile {
    /// Parse the six whitespace-separated lines of a world file.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let values = text
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SwwError::georeference(path, e.to_string()))?;

        match values.as_slice() {
            &[a, d, b, e, c, f] => Ok(Self { a, d, b, e, c, f }),
            other => Err(SwwError::georeference(
                path,
                format!("expected 6 values, found {}", other.len()),
            )),
        }
    }

    /// Convert to a corner-origin georeference for an image of `resolution`.
    pub fn to_georeference(&self, resolution: (u32, u32)) -> Georeference {
        Georeference {
            resolution,
            pixel_size: (self.a, self.e),
            origin: (
                self.c - self.a / 2.0 - self.b / 2.0,
                self.f - self.d / 2.0 - self.e / 2.0,
            ),
            rotation: self.b,
        }
    }
}

/// [`GeoreferenceProvider`] reading world-file sidecars (`.pgw`, `.jgw`, `.tfw`, `.wld`).
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldFileGeoreference;

impl WorldFileGeoreference {
    /// Sidecar filenames to try for `image`, most specific first.
    pub fn sidecar_candidates(image: &Path) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(ext) = image.extension().and_then(|e| e.to_str()) {
            if let (Some(first), Some(last)) = (ext.chars().next(), ext.chars().last()) {
                if ext.len() >= 3 {
                    candidates.push(image.with_extension(format!("{}{}w", first, last)));
                }
            }
            candidates.push(image.with_extension(format!("{}w", ext)));
        }
        candidates.push(image.with_extension("wld"));
        candidates
    }
}

impl GeoreferenceProvider for WorldFileGeoreference {
    fn georeference(&self, path: &Path) -> Option<Georeference> {
        let sidecar = Self::sidecar_candidates(path)
            .into_iter()
            .find(|p| p.is_file())?;

        let world = fs::read_to_string(&sidecar)
            .map_err(SwwError::from)
            .and_then(|text| WorldFile::parse(&text, &sidecar));
        let world = match world {
            Ok(world) => world,
            Err(e) => {
                tracing::warn!("Ignoring world file: {}", e);
                return None;
            },
        };

        let resolution = match image::image_dimensions(path) {
            Ok(dims) => dims,
            Err(e) => {
                tracing::info!("Unable to read image header {}: {}", path.display(), e);
                return None;
            },
        };

        let geo = world.to_georeference(resolution);
        tracing::info!(
            "Georeference from {}: origin={:?} pixel={:?} resolution={:?} rotation={}",
            sidecar.display(),
            geo.origin,
            geo.pixel_size,
            geo.resolution,
            geo.rotation
        );
        Some(geo)
    }
}

/// Per-point texture coordinates for the bedslope.
///
/// Uses the georeference when available, otherwise decals the image over the
/// mesh extents.
pub fn bedslope_texture_coords(
    mesh: &Mesh,
    norm: &Normalization,
    georeference: Option<&Georeference>,
) -> Vec<Vec2> {
    let points = mesh.x.iter().zip(&mesh.y);
    match georeference {
        Some(geo) => points
            .map(|(&x, &y)| geo.tex_coord(x, y, mesh.xllcorner, mesh.yllcorner))
            .collect(),
        None => points.map(|(&x, &y)| norm.decal(x, y)).collect(),
    }
}
