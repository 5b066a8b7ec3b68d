//! foamstl core library - mesh to ASCII STL export for OpenFOAM
//!
//! This library provides the export pipeline: extracting export-space
//! triangles from scene objects, writing them as STL solid blocks, and the
//! export driver that ties one file to a set of objects.

pub mod error;
pub mod export;
pub mod extract;
pub mod geometry;
pub mod obj;
pub mod scene;
pub mod stl;
pub mod transform;
mod triangulate;

// Re-export commonly used types
pub use error::{ExportError, ExportResult, SnapshotError};
pub use export::{clean_name, export, ExportSettings, ExportSummary};
pub use extract::{faces_from_mesh, Triangles};
pub use geometry::{PolyMesh, Triangle};
pub use scene::{
    EvalContext, EvalMode, MeshObject, Modifier, ModifierSlot, ObjectKind, ObjectMode, SceneObject,
};
pub use transform::{Axis, Orientation, Transform};
