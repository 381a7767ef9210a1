//! SWW reader façade.
//!
//! Owns the load/clear/refresh lifecycle and the reader configuration, and
//! composes container access, connectivity, normalization and the per-frame
//! geometry passes.

use super::connectivity::Connectivity;
use super::container::Container;
use super::frame::{BedslopeFrame, GeometryBuilder, StageFrame};
use super::mesh::Mesh;
use super::timeseries::{self, TimeSeriesKind};
use crate::config::ReaderConfig;
use crate::error::{Result, SwwError};
use crate::texture::{
    self, Georeference, GeoreferenceProvider, ImageLoader, TextureImage, WorldFileGeoreference,
};
use crate::watch::FileWatcher;
use glam::{Vec2, Vec3, Vec4};
use std::path::{Path, PathBuf};

/// Reader for an SWW file.
///
/// Construction attempts a load; on failure the reader stays invalid and
/// every getter returns empty data. No file handle is kept open between
/// calls.
#[derive(Debug)]
pub struct SwwReader {
    path: PathBuf,
    config: ReaderConfig,
    watcher: FileWatcher,
    mesh: Option<Mesh>,
    connectivity: Connectivity,
    indices: Vec<u32>,
    geometry: GeometryBuilder,
    georeference_provider: Box<dyn GeoreferenceProvider>,
    georeference: Option<Georeference>,
    valid: bool,
}

impl SwwReader {
    /// Open an SWW file with default configuration.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_with(
            path,
            ReaderConfig::default(),
            Box::new(WorldFileGeoreference),
        )
    }

    /// Open an SWW file with explicit configuration and georeference service.
    pub fn open_with(
        path: impl Into<PathBuf>,
        config: ReaderConfig,
        georeference_provider: Box<dyn GeoreferenceProvider>,
    ) -> Self {
        let mut reader = Self::unloaded(path.into(), config, georeference_provider);
        if let Err(e) = reader.load() {
            tracing::warn!("Unable to load {}: {}", reader.path.display(), e);
        }
        reader
    }

    /// Open an SWW file, failing if the initial load fails.
    pub fn try_open(
        path: impl Into<PathBuf>,
        config: ReaderConfig,
        georeference_provider: Box<dyn GeoreferenceProvider>,
    ) -> Result<Self> {
        let mut reader = Self::unloaded(path.into(), config, georeference_provider);
        reader.load()?;
        Ok(reader)
    }

    fn unloaded(
        path: PathBuf,
        config: ReaderConfig,
        georeference_provider: Box<dyn GeoreferenceProvider>,
    ) -> Self {
        Self {
            watcher: FileWatcher::new(&path),
            path,
            config,
            mesh: None,
            connectivity: Connectivity::default(),
            indices: Vec::new(),
            geometry: GeometryBuilder::new(),
            georeference_provider,
            georeference: None,
            valid: false,
        }
    }

    /// Check if the file loaded successfully.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Path of the SWW file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Static mesh data, when valid.
    pub fn mesh(&self) -> Option<&Mesh> {
        self.valid_mesh().ok()
    }

    /// Check if the bed elevation changes per timestep.
    pub fn is_elevation_animated(&self) -> bool {
        self.mesh()
            .map(|m| m.elevation_kind.is_animated())
            .unwrap_or(false)
    }

    /// Reload if the file changed on disk.
    ///
    /// With no change this does no I/O and returns `Ok`. After a change the
    /// current data is released and the file loaded again; on failure the
    /// reader stays invalid until a later refresh succeeds.
    pub fn refresh(&mut self) -> Result<()> {
        if !self.watcher.is_changed() {
            return Ok(());
        }

        tracing::info!("{} changed on disk, reloading", self.path.display());
        self.clear();
        self.load()
    }

    /// Release all derived data and mark the reader invalid.
    fn clear(&mut self) {
        self.valid = false;
        self.mesh = None;
        self.connectivity = Connectivity::default();
        self.indices.clear();
        self.geometry.clear();
        self.georeference = None;
    }

    /// Read schema and static arrays, build connectivity and the first bed frame.
    fn load(&mut self) -> Result<()> {
        let container = Container::open(&self.path)?;
        let mesh = Mesh::load(&container)?;
        container.close();

        let connectivity = Connectivity::build(&mesh.volumes, mesh.npoints);
        let mut geometry = GeometryBuilder::new();
        geometry.load_bedslope(&self.path, &mesh, 0)?;

        self.indices = mesh.indices();
        self.mesh = Some(mesh);
        self.connectivity = connectivity;
        self.geometry = geometry;
        self.valid = true;
        self.update_georeference();

        Ok(())
    }

    fn valid_mesh(&self) -> Result<&Mesh> {
        loaded(&self.mesh, self.valid)
    }

    /// Load the bedslope at `timestep`.
    ///
    /// The bed may deform per timestep or stay static. On failure the previous
    /// bed frame is kept.
    pub fn load_bedslope(&mut self, timestep: usize) -> Result<()> {
        let mesh = loaded(&self.mesh, self.valid)?;
        self.geometry.load_bedslope(&self.path, mesh, timestep)
    }

    /// Load the water surface at `timestep`.
    ///
    /// On failure (including a shrunk point dimension) the previous water
    /// frame is kept and the reader stays valid; the next `refresh` picks up
    /// the change.
    pub fn load_stage(&mut self, timestep: usize) -> Result<()> {
        let mesh = loaded(&self.mesh, self.valid)?;
        self.geometry
            .load_stage(&self.path, mesh, &self.connectivity, &self.config, timestep)
    }

    /// Stage or momentum-magnitude series for a triangle's first vertex.
    pub fn time_series(&self, triangle: usize, kind: TimeSeriesKind) -> Result<Vec<f32>> {
        timeseries::extract(&self.path, self.valid_mesh()?, triangle, kind)
    }

    // bedslope

    /// Last good bedslope frame.
    pub fn bedslope_frame(&self) -> Option<&BedslopeFrame> {
        self.geometry.bedslope()
    }

    /// Normalized bedslope positions.
    pub fn bedslope_vertices(&self) -> &[Vec3] {
        self.bedslope_frame()
            .map(|f| f.vertices.as_slice())
            .unwrap_or(&[])
    }

    /// Per-triangle bedslope normals.
    pub fn bedslope_normals(&self) -> &[Vec3] {
        self.bedslope_frame()
            .map(|f| f.normals.as_slice())
            .unwrap_or(&[])
    }

    /// Per-triangle bedslope centroids.
    pub fn bedslope_centroids(&self) -> &[Vec3] {
        self.bedslope_frame()
            .map(|f| f.centroids.as_slice())
            .unwrap_or(&[])
    }

    /// Flat `3·Nv` triangle index list shared by bed and water.
    pub fn bedslope_indices(&self) -> &[u32] {
        &self.indices
    }

    /// Texture coordinates for the bedslope image.
    pub fn bedslope_texture_coords(&self) -> Vec<Vec2> {
        match (self.mesh(), self.geometry.normalization()) {
            (Some(mesh), Some(norm)) => {
                texture::bedslope_texture_coords(mesh, norm, self.georeference.as_ref())
            },
            _ => Vec::new(),
        }
    }

    /// Check if a bedslope image is configured or named by the file.
    pub fn has_bedslope_texture(&self) -> bool {
        self.bedslope_texture_path().is_some()
    }

    /// Bedslope image path: explicit configuration wins over the file's attribute.
    pub fn bedslope_texture_path(&self) -> Option<&Path> {
        self.config
            .bedslope_texture
            .as_deref()
            .or_else(|| self.mesh().and_then(|m| m.texture.as_deref()))
    }

    /// Use `path` as the bedslope image and look up its georeference.
    pub fn set_bedslope_texture(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        tracing::info!("Bedslope texture: {}", path.display());
        self.config.bedslope_texture = Some(path);
        self.update_georeference();
    }

    /// Decode the bedslope image with the given loader.
    pub fn load_bedslope_texture(&self, loader: &dyn ImageLoader) -> Result<Option<TextureImage>> {
        self.bedslope_texture_path()
            .map(|path| loader.load(path))
            .transpose()
    }

    /// Georeference of the bedslope image, if any.
    pub fn georeference(&self) -> Option<&Georeference> {
        self.georeference.as_ref()
    }

    fn update_georeference(&mut self) {
        self.georeference = self
            .bedslope_texture_path()
            .and_then(|path| self.georeference_provider.georeference(path));
    }

    // stage

    /// Last good stage frame; `None` if no water frame was built yet.
    pub fn stage_frame(&self) -> Option<&StageFrame> {
        self.geometry.stage()
    }

    /// Normalized water surface positions.
    pub fn stage_vertices(&self) -> &[Vec3] {
        self.stage_frame()
            .map(|f| f.vertices.as_slice())
            .unwrap_or(&[])
    }

    /// Per-vertex water normals.
    pub fn stage_vertex_normals(&self) -> &[Vec3] {
        self.stage_frame()
            .map(|f| f.vertex_normals.as_slice())
            .unwrap_or(&[])
    }

    /// Per-vertex water colours.
    pub fn stage_colors(&self) -> &[Vec4] {
        self.stage_frame()
            .map(|f| f.colors.as_slice())
            .unwrap_or(&[])
    }

    // mesh

    /// Triangles sharing point `index`; empty if out of range.
    pub fn connectivity(&self, index: usize) -> &[u32] {
        self.connectivity.triangles(index).unwrap_or(&[])
    }

    /// Number of unique points.
    pub fn number_of_vertices(&self) -> usize {
        self.mesh().map(|m| m.npoints).unwrap_or(0)
    }

    /// Number of triangles.
    pub fn number_of_volumes(&self) -> usize {
        self.mesh().map(|m| m.nvolumes()).unwrap_or(0)
    }

    /// Number of timesteps.
    pub fn number_of_timesteps(&self) -> usize {
        self.mesh().map(|m| m.ntimesteps).unwrap_or(0)
    }

    /// Simulation time of a timestep in seconds, or 0 if unavailable.
    pub fn time(&self, index: usize) -> f32 {
        self.mesh()
            .and_then(|m| m.time.get(index).copied())
            .unwrap_or(0.0)
    }

    /// Whether the file carries momentum.
    pub fn has_momentum(&self) -> bool {
        self.mesh().map(|m| m.has_momentum).unwrap_or(false)
    }

    // configuration

    /// Current configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Mutable configuration; only change it between frames.
    pub fn config_mut(&mut self) -> &mut ReaderConfig {
        &mut self.config
    }

    /// Alpha at `height_min`.
    pub fn alpha_min(&self) -> f32 {
        self.config.transfer.alpha_min
    }

    /// Alpha clamp value.
    pub fn alpha_max(&self) -> f32 {
        self.config.transfer.alpha_max
    }

    /// Height below which water is transparent.
    pub fn height_min(&self) -> f32 {
        self.config.transfer.height_min
    }

    /// Height at which alpha reaches `alpha_max`.
    pub fn height_max(&self) -> f32 {
        self.config.transfer.height_max
    }

    /// Set alpha at `height_min`.
    pub fn set_alpha_min(&mut self, value: f32) {
        self.config.transfer.alpha_min = value;
    }

    /// Set alpha clamp value.
    pub fn set_alpha_max(&mut self, value: f32) {
        self.config.transfer.alpha_max = value;
    }

    /// Set transparent-below height.
    pub fn set_height_min(&mut self, value: f32) {
        self.config.transfer.height_min = value;
    }

    /// Set full-alpha height.
    pub fn set_height_max(&mut self, value: f32) {
        self.config.transfer.height_max = value;
    }

    /// Cull angle in degrees.
    pub fn cull_angle(&self) -> f32 {
        self.config.culling.angle
    }

    /// Set cull angle in degrees.
    pub fn set_cull_angle(&mut self, value: f32) {
        self.config.culling.angle = value;
    }

    /// Whether steep-triangle culling is on.
    pub fn culling(&self) -> bool {
        self.config.culling.enabled
    }

    /// Turn steep-triangle culling on/off.
    pub fn set_culling(&mut self, value: bool) {
        self.config.culling.enabled = value;
    }

    /// Flip steep-triangle culling.
    pub fn toggle_culling(&mut self) {
        self.config.culling.toggle();
    }

    /// Directory holding viewer resources.
    pub fn root_directory(&self) -> &Path {
        &self.config.root_directory
    }

    /// Set the resource directory.
    pub fn set_root_directory(&mut self, path: impl Into<PathBuf>) {
        self.config.root_directory = path.into();
    }
}

fn loaded(mesh: &Option<Mesh>, valid: bool) -> Result<&Mesh> {
    match (mesh, valid) {
        (Some(mesh), true) => Ok(mesh),
        _ => Err(SwwError::NotLoaded("file is not valid")),
    }
}
