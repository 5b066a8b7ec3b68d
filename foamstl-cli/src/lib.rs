//! Command line front end: loads an OBJ scene, applies placement from the
//! config file and exports every object to one OpenFOAM STL file.
use anyhow::{Context, Result};
use clap::Parser;
use foamstl_core::{
    export, obj, Axis, EvalContext, EvalMode, ExportSettings, ExportSummary, MeshObject,
    Orientation,
};
use std::path::PathBuf;
use tracing::{info, warn};

pub mod config;

pub use config::{Config, ObjectConfig};

/// Export OBJ scenes as ASCII STL surfaces for OpenFOAM
#[derive(Debug, Parser)]
#[command(name = "foamstl", version, long_about = None)]
pub struct Cli {
    /// Wavefront OBJ scene to export
    pub input: PathBuf,

    /// Output file; the extension is forced to .stl
    #[arg(short, long)]
    pub output: PathBuf,

    /// Forward axis of the exported frame (X, Y, Z, -X, -Y, -Z)
    #[arg(long, allow_hyphen_values = true)]
    pub forward: Option<Axis>,

    /// Up axis of the exported frame
    #[arg(long, allow_hyphen_values = true)]
    pub up: Option<Axis>,

    /// Uniform scale factor
    #[arg(long)]
    pub scale: Option<f32>,

    /// Export base geometry without evaluating modifiers
    #[arg(long)]
    pub no_modifiers: bool,

    /// Evaluate modifiers with render visibility instead of viewport
    #[arg(long)]
    pub render: bool,

    /// Only export the named objects (repeatable)
    #[arg(long = "select", value_name = "NAME")]
    pub select: Vec<String>,

    /// TOML config with export defaults and per-object placement
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Merge config file values and command line flags; flags win
pub fn resolve_settings(cli: &Cli, config: &Config) -> Result<(ExportSettings, EvalContext)> {
    let defaults = config.export.clone().unwrap_or_default();

    let forward = cli.forward.or(defaults.forward).unwrap_or(Orientation::HOST.forward());
    let up = cli.up.or(defaults.up).unwrap_or(Orientation::HOST.up());
    let orientation = Orientation::new(forward, up)?;

    let mut settings = ExportSettings::new(&cli.output);
    settings.orientation = orientation;
    settings.global_scale = cli.scale.or(defaults.scale).unwrap_or(1.0);
    settings.use_mesh_modifiers = !cli.no_modifiers && defaults.apply_modifiers.unwrap_or(true);
    settings.use_selection = !cli.select.is_empty();
    settings.validate()?;

    let mode = if cli.render {
        EvalMode::Render
    } else {
        defaults.eval_mode.unwrap_or_default()
    };

    Ok((settings, EvalContext { mode }))
}

/// Apply config placement, modifiers and the selection to loaded objects
pub fn prepare_objects(objects: &mut [MeshObject], config: &Config, select: &[String]) {
    for entry in &config.objects {
        let Some(object) = objects.iter_mut().find(|o| o.name == entry.name) else {
            warn!(object = %entry.name, "config names an object that is not in the scene");
            continue;
        };
        object.world = entry.world_matrix();
        object.modifiers.extend(entry.modifiers.iter().cloned());
    }

    for name in select {
        if !objects.iter().any(|o| &o.name == name) {
            warn!(object = %name, "selected object is not in the scene");
        }
    }
    for object in objects.iter_mut() {
        object.selected = select.contains(&object.name);
    }
}

pub fn run(cli: &Cli) -> Result<ExportSummary> {
    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    let (settings, ctx) = resolve_settings(cli, &config)?;

    let mut objects = obj::load_obj(&cli.input)
        .with_context(|| format!("Failed to load scene {}", cli.input.display()))?;
    info!(objects = objects.len(), input = %cli.input.display(), "scene loaded");

    prepare_objects(&mut objects, &config, &cli.select);

    let summary = export(&objects, &settings, &ctx)
        .with_context(|| format!("Failed to export {}", settings.output_path().display()))?;
    Ok(summary)
}
