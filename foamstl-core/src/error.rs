//! Error types for STL export.

use std::path::PathBuf;
use thiserror::Error;

use crate::transform::Axis;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that abort an export or a scene load.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The destination (or a scene file) could not be opened, written or removed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File the operation was acting on.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Scale factor outside the accepted range.
    #[error("invalid scale {0}: must be a finite value >= {min}", min = crate::export::MIN_SCALE)]
    InvalidScale(f32),

    /// Forward and up axes lie on the same axis.
    #[error("forward axis {forward} and up axis {up} must be different")]
    InvalidOrientation {
        /// Requested forward axis.
        forward: Axis,
        /// Requested up axis.
        up: Axis,
    },

    /// Malformed Wavefront OBJ input.
    #[error("OBJ parse error at line {line}: {message}")]
    ObjParse {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        message: String,
    },
}

impl ExportError {
    /// Wrap an I/O error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn obj_parse(line: usize, message: impl Into<String>) -> Self {
        Self::ObjParse {
            line,
            message: message.into(),
        }
    }
}

/// Failure to materialize a mesh snapshot.
///
/// Not fatal for an export: the object simply contributes no facets.
#[derive(Debug, Error)]
#[error("cannot build mesh snapshot for {object}: {reason}")]
pub struct SnapshotError {
    /// Object name.
    pub object: String,
    /// Why the snapshot failed.
    pub reason: String,
}
