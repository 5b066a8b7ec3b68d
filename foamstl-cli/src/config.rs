//! TOML configuration for the `foamstl` command.
//!
//! ```toml
//! [export]
//! forward = "-Z"
//! up = "Y"
//! scale = 0.001
//! apply_modifiers = true
//! eval_mode = "render"
//!
//! [[object]]
//! name = "inlet"
//! translate = [0.0, 0.0, 1.5]
//! scale = [1.0, 1.0, 1.0]
//! modifiers = [{ type = "mirror", axis = "x" }]
//! ```

use anyhow::{Context, Result};
use foamstl_core::{Axis, EvalMode, ModifierSlot, Transform};
use nalgebra::Matrix4;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub export: Option<ExportConfig>,
    #[serde(default, rename = "object")]
    pub objects: Vec<ObjectConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    pub forward: Option<Axis>,
    pub up: Option<Axis>,
    pub scale: Option<f32>,
    pub apply_modifiers: Option<bool>,
    pub eval_mode: Option<EvalMode>,
}

/// Placement and modifier stack for one named scene object
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ObjectConfig {
    pub name: String,
    pub translate: Option<[f32; 3]>,
    pub scale: Option<[f32; 3]>,
    #[serde(default)]
    pub modifiers: Vec<ModifierSlot>,
}

impl ObjectConfig {
    /// World matrix: scale first, then translate
    pub fn world_matrix(&self) -> Matrix4<f32> {
        let [tx, ty, tz] = self.translate.unwrap_or([0.0; 3]);
        let [sx, sy, sz] = self.scale.unwrap_or([1.0; 3]);
        Transform::translation_matrix(tx, ty, tz) * Transform::scale_matrix(sx, sy, sz)
    }
}

pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).context("Failed to parse config file as TOML")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&contents)
}
