//! Geometry extraction: scene object to export-space triangles.
//!
//! [`faces_from_mesh`] takes a snapshot of the object's geometry, moves it into
//! export space, fixes winding for mirroring transforms and triangulates it.
//! The returned [`Triangles`] iterator owns the snapshot and hands it back to
//! the object (via [`SceneObject::to_mesh_clear`]) exactly once, either right
//! after the last triangle or when the iterator is dropped.
use std::iter::FusedIterator;

use nalgebra::Matrix4;
use tracing::debug;

use crate::geometry::{PolyMesh, Triangle};
use crate::scene::{EvalContext, ObjectMode, SceneObject};
use crate::transform::Transform;

/// Export-space snapshot borrowed from a scene object; released on drop
struct Snapshot<'a, O: SceneObject + ?Sized> {
    owner: &'a O,
    mesh: PolyMesh,
    triangles: Vec<[u32; 3]>,
}

impl<O: SceneObject + ?Sized> Drop for Snapshot<'_, O> {
    fn drop(&mut self) {
        self.owner.to_mesh_clear();
    }
}

/// Lazy, non-restartable sequence of export-space triangles
pub struct Triangles<'a, O: SceneObject + ?Sized> {
    snapshot: Option<Snapshot<'a, O>>,
    next: usize,
}

impl<'a, O: SceneObject + ?Sized> Triangles<'a, O> {
    fn empty() -> Self {
        Self {
            snapshot: None,
            next: 0,
        }
    }

    /// Whether the backing snapshot is still held
    pub fn is_holding_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }
}

impl<O: SceneObject + ?Sized> Iterator for Triangles<'_, O> {
    type Item = Triangle;

    fn next(&mut self) -> Option<Triangle> {
        let snapshot = self.snapshot.as_ref()?;
        let Some(&[a, b, c]) = snapshot.triangles.get(self.next) else {
            self.snapshot = None;
            return None;
        };

        let vertices = &snapshot.mesh.vertices;
        let triangle = Triangle::new(
            vertices[a as usize],
            vertices[b as usize],
            vertices[c as usize],
        );

        self.next += 1;
        if self.next == snapshot.triangles.len() {
            self.snapshot = None;
        }
        Some(triangle)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self
            .snapshot
            .as_ref()
            .map_or(0, |s| s.triangles.len() - self.next);
        (left, Some(left))
    }
}

impl<O: SceneObject + ?Sized> ExactSizeIterator for Triangles<'_, O> {}

impl<O: SceneObject + ?Sized> FusedIterator for Triangles<'_, O> {}

/// Triangulated faces of `object` in export space.
///
/// `global_matrix` is the orientation/scale transform; it is combined with the
/// object's world matrix as `global_matrix * world`. Objects without a mesh,
/// or whose snapshot fails, yield nothing.
pub fn faces_from_mesh<'a, O: SceneObject + ?Sized>(
    object: &'a O,
    ctx: &EvalContext,
    global_matrix: &Matrix4<f32>,
    apply_modifiers: bool,
) -> Triangles<'a, O> {
    if object.mode() == ObjectMode::Edit {
        debug!(object = object.name(), "exporting live edit-mode geometry");
    }

    let mesh = match object.to_mesh(ctx, apply_modifiers) {
        Ok(Some(mesh)) => mesh,
        Ok(None) => {
            debug!(object = object.name(), "object has no mesh data");
            return Triangles::empty();
        }
        Err(e) => {
            debug!(object = object.name(), error = %e, "skipping object");
            return Triangles::empty();
        }
    };

    // Guard from here on: any early exit still releases the snapshot
    let mut snapshot = Snapshot {
        owner: object,
        mesh,
        triangles: Vec::new(),
    };

    let matrix = global_matrix * object.world_matrix();
    snapshot.mesh.transform(&matrix);
    if Transform::is_negative(&matrix) {
        snapshot.mesh.flip_normals();
    }
    snapshot.triangles = snapshot.mesh.loop_triangles();

    debug!(
        object = object.name(),
        vertices = snapshot.mesh.vertices.len(),
        triangles = snapshot.triangles.len(),
        "mesh snapshot ready"
    );

    Triangles {
        snapshot: Some(snapshot),
        next: 0,
    }
}
