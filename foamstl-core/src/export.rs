//! Export driver: one `.stl` file, one solid block per object.
use std::path::{Path, PathBuf};

use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ExportError, ExportResult};
use crate::extract::faces_from_mesh;
use crate::scene::{EvalContext, SceneObject};
use crate::stl::write_stl_for_openfoam;
use crate::transform::{Orientation, Transform};

/// Smallest accepted scale factor
pub const MIN_SCALE: f32 = 0.000_001;

/// Per-export options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub filepath: PathBuf,
    pub orientation: Orientation,
    pub global_scale: f32,
    pub use_mesh_modifiers: bool,
    pub use_selection: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            filepath: PathBuf::from("untitled.stl"),
            orientation: Orientation::default(),
            global_scale: 1.0,
            use_mesh_modifiers: true,
            use_selection: false,
        }
    }
}

impl ExportSettings {
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ExportResult<()> {
        if !self.global_scale.is_finite() || self.global_scale < MIN_SCALE {
            return Err(ExportError::InvalidScale(self.global_scale));
        }
        Ok(())
    }

    /// Orientation remap times uniform scale
    pub fn global_matrix(&self) -> Matrix4<f32> {
        Transform::global_matrix(&self.orientation, self.global_scale)
    }

    /// Destination path with its extension forced to `.stl`
    pub fn output_path(&self) -> PathBuf {
        stl_output_path(&self.filepath)
    }
}

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub solids: usize,
    pub facets: usize,
}

/// `path` with its extension replaced by `.stl`
pub fn stl_output_path(path: &Path) -> PathBuf {
    path.with_extension("stl")
}

/// Remove a pre-existing output file so the export starts empty
pub fn prepare_output(path: &Path) -> ExportResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed previous export");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ExportError::io(path, e)),
    }
}

/// Make an object name safe to use as an STL solid token.
///
/// Anything other than ASCII alphanumerics, `_` and `-` becomes `_`.
pub fn clean_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Export `objects` to a single ASCII STL file.
///
/// The destination is truncated once, then every object (or only the
/// selected ones) is appended as its own solid block, in order. Objects
/// without mesh data produce an empty block. An I/O failure aborts the export;
/// blocks already written stay on disk.
pub fn export<'a, O, I>(
    objects: I,
    settings: &ExportSettings,
    ctx: &EvalContext,
) -> ExportResult<ExportSummary>
where
    O: SceneObject + ?Sized + 'a,
    I: IntoIterator<Item = &'a O>,
{
    settings.validate()?;

    let path = settings.output_path();
    prepare_output(&path)?;

    let global_matrix = settings.global_matrix();
    let mut summary = ExportSummary {
        path: path.clone(),
        solids: 0,
        facets: 0,
    };

    for object in objects {
        if settings.use_selection && !object.is_selected() {
            continue;
        }
        let name = clean_name(object.name());
        let faces = faces_from_mesh(object, ctx, &global_matrix, settings.use_mesh_modifiers);
        let facets = write_stl_for_openfoam(&path, &name, faces)?;

        summary.solids += 1;
        summary.facets += facets;
    }

    info!(
        path = %summary.path.display(),
        solids = summary.solids,
        facets = summary.facets,
        "STL export finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("Cube.001"), "Cube_001");
        assert_eq!(clean_name("inlet patch"), "inlet_patch");
        assert_eq!(clean_name("wall\nsolid x"), "wall_solid_x");
        assert_eq!(clean_name("héllo"), "h_llo");
        assert_eq!(clean_name(""), "_");
    }

    #[test]
    fn test_output_path_forces_stl() {
        assert_eq!(stl_output_path(Path::new("case/body.obj")), PathBuf::from("case/body.stl"));
        assert_eq!(stl_output_path(Path::new("case/body")), PathBuf::from("case/body.stl"));
        assert_eq!(stl_output_path(Path::new("body.stl")), PathBuf::from("body.stl"));
    }

    #[test]
    fn test_scale_validation() {
        let mut settings = ExportSettings::new("x.stl");
        assert!(settings.validate().is_ok());
        for bad in [0.0, -1.0, 1e-9, f32::NAN, f32::INFINITY] {
            settings.global_scale = bad;
            assert!(matches!(settings.validate(), Err(ExportError::InvalidScale(_))));
        }
        settings.global_scale = MIN_SCALE;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_prepare_output_missing_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.stl");
        assert!(prepare_output(&path).is_ok());
        std::fs::write(&path, "old").unwrap();
        prepare_output(&path).unwrap();
        assert!(!path.exists());
    }
}
