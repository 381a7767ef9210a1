//! swwview - inspect and animate shallow-water simulation output (SWW files).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use swwview::app::{App, LogStatus, DEFAULT_TPS};
use swwview::config::ReaderConfig;
use swwview::data::{SwwReader, TimeSeriesKind};
use swwview::texture::WorldFileGeoreference;
use swwview::util::{format_number, format_value, format_vec3};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "swwview")]
#[command(about = "Inspect and animate SWW shallow-water simulation output", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable logging to specified file
    #[arg(long, global = true)]
    log: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the file's schema summary
    Info {
        #[command(flatten)]
        view: ViewOptions,
    },
    /// Build the bed and water geometry for one timestep
    Frame {
        #[command(flatten)]
        view: ViewOptions,

        /// Timestep to build
        #[arg(long, default_value_t = 0)]
        timestep: usize,
    },
    /// Print the time series at a triangle's first vertex
    Series {
        #[command(flatten)]
        view: ViewOptions,

        /// Triangle index
        #[arg(long)]
        triangle: usize,

        /// Quantity to extract
        #[arg(long, value_enum, default_value_t = SeriesKind::Stage)]
        kind: SeriesKind,
    },
    /// Poll the file for changes and rebuild frames while playing
    Watch {
        #[command(flatten)]
        view: ViewOptions,

        /// Polling interval in milliseconds
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,

        /// Number of update cycles to run
        #[arg(long, default_value_t = 10)]
        cycles: usize,
    },
}

#[derive(clap::Args, Debug)]
struct ViewOptions {
    /// Path to the SWW file
    file: PathBuf,

    /// Height below which water is fully transparent
    #[arg(long)]
    hmin: Option<f32>,

    /// Height at which water reaches full alpha
    #[arg(long)]
    hmax: Option<f32>,

    /// Alpha at the minimum height
    #[arg(long)]
    alphamin: Option<f32>,

    /// Maximum alpha
    #[arg(long)]
    alphamax: Option<f32>,

    /// Cull triangles steeper than this many degrees
    #[arg(long)]
    cullangle: Option<f32>,

    /// Enable steep-triangle culling
    #[arg(long)]
    cull: bool,

    /// Bedslope texture image, overriding the file's own
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Timesteps per second
    #[arg(long, default_value_t = DEFAULT_TPS)]
    tps: f32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum SeriesKind {
    Stage,
    Momentum,
}

impl From<SeriesKind> for TimeSeriesKind {
    fn from(kind: SeriesKind) -> Self {
        match kind {
            SeriesKind::Stage => TimeSeriesKind::Stage,
            SeriesKind::Momentum => TimeSeriesKind::MomentumMagnitude,
        }
    }
}

impl ViewOptions {
    fn config(&self) -> ReaderConfig {
        let mut config = ReaderConfig::default();
        if let Some(v) = self.hmin {
            config.transfer.height_min = v;
        }
        if let Some(v) = self.hmax {
            config.transfer.height_max = v;
        }
        if let Some(v) = self.alphamin {
            config.transfer.alpha_min = v;
        }
        if let Some(v) = self.alphamax {
            config.transfer.alpha_max = v;
        }
        if let Some(v) = self.cullangle {
            config.culling.angle = v;
        }
        config.culling.enabled = self.cull;
        config.bedslope_texture = self.texture.clone();
        config
    }

    fn open(&self) -> Result<SwwReader> {
        check_sww_path(&self.file)?;
        let reader = SwwReader::try_open(
            &self.file,
            self.config(),
            Box::new(WorldFileGeoreference),
        )
        .with_context(|| format!("Unable to load {}", self.file.display()))?;
        Ok(reader)
    }
}

fn check_sww_path(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("Path not found: {}", path.display());
    }
    let is_sww = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("sww"))
        .unwrap_or(false);
    if !is_sww {
        bail!("Not an SWW file: {}", path.display());
    }
    Ok(())
}

fn init_logging(log: Option<&Path>) -> Result<()> {
    match log {
        Some(log_path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(log_path)
                .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(Level::DEBUG)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        },
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        },
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.log.as_deref())?;
    tracing::info!("Starting swwview");

    match args.command {
        Command::Info { view } => info(&view)?,
        Command::Frame { view, timestep } => frame(&view, timestep)?,
        Command::Series {
            view,
            triangle,
            kind,
        } => series(&view, triangle, kind.into())?,
        Command::Watch {
            view,
            interval_ms,
            cycles,
        } => watch(&view, Duration::from_millis(interval_ms), cycles)?,
    }

    tracing::info!("swwview exited");
    Ok(())
}

fn info(view: &ViewOptions) -> Result<()> {
    let reader = view.open()?;
    let Some(mesh) = reader.mesh() else {
        bail!("No mesh loaded from {}", view.file.display());
    };

    println!("file: {}", reader.path().display());
    println!("points: {}", format_number(mesh.npoints));
    println!("triangles: {}", format_number(mesh.nvolumes()));
    println!("timesteps: {}", format_number(mesh.ntimesteps));
    if let (Some(first), Some(last)) = (mesh.time.first(), mesh.time.last()) {
        println!("time: {} .. {}", format_value(*first), format_value(*last));
    }
    println!(
        "elevation: {} ({})",
        mesh.elevation,
        if mesh.elevation_kind.is_animated() {
            "animated"
        } else {
            "static"
        }
    );
    println!("momentum: {}", if mesh.has_momentum { "yes" } else { "no" });
    match reader.bedslope_texture_path() {
        Some(path) => println!("texture: {}", path.display()),
        None => println!("texture: none"),
    }
    if let Some(geo) = reader.georeference() {
        println!("georeference: origin={:?} pixel={:?}", geo.origin, geo.pixel_size);
    }
    Ok(())
}

fn frame(view: &ViewOptions, timestep: usize) -> Result<()> {
    let mut reader = view.open()?;
    if reader.is_elevation_animated() {
        reader.load_bedslope(timestep)?;
    }
    reader.load_stage(timestep)?;

    let Some(stage) = reader.stage_frame() else {
        bail!("No water surface for timestep {}", timestep);
    };

    println!("timestep: {}", timestep);
    println!("time: {}", format_value(reader.time(timestep)));
    println!("bedslope vertices: {}", format_number(reader.bedslope_vertices().len()));
    println!("bedslope triangles: {}", format_number(reader.bedslope_normals().len()));
    println!("stage vertices: {}", format_number(stage.vertices.len()));
    println!("steep triangles: {}", format_number(stage.steep.len()));
    println!("visible vertices: {}", format_number(stage.visible_vertices()));
    println!("culling: {}", if reader.culling() { "on" } else { "off" });
    if let Some(normal) = reader.bedslope_normals().first() {
        println!("first bedslope normal: {}", format_vec3(*normal));
    }
    Ok(())
}

fn series(view: &ViewOptions, triangle: usize, kind: TimeSeriesKind) -> Result<()> {
    let reader = view.open()?;
    let values = reader.time_series(triangle, kind)?;

    println!("# {} (triangle {})", kind.name(), triangle);
    for (i, value) in values.iter().enumerate() {
        println!("{}\t{}", format_value(reader.time(i)), format_value(*value));
    }
    Ok(())
}

fn watch(view: &ViewOptions, interval: Duration, cycles: usize) -> Result<()> {
    let reader = view.open()?;
    let mut app = App::new(reader, view.tps, LogStatus);
    app.playback.set_paused(false);

    let start = Instant::now();
    for cycle in 0..cycles {
        if cycle > 0 {
            std::thread::sleep(interval);
        }
        match app.update(start.elapsed().as_secs_f64()) {
            Ok(timestep) => println!(
                "cycle {}: timestep {} time {} visible {}",
                cycle,
                timestep,
                format_value(app.reader.time(timestep)),
                app.reader
                    .stage_frame()
                    .map(|f| f.visible_vertices())
                    .unwrap_or(0)
            ),
            // keep polling; the file may still be being written
            Err(e) => println!("cycle {}: {}", cycle, e),
        }
    }
    Ok(())
}
