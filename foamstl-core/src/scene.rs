//! Scene-side collaborators: the object trait the exporter consumes and an
//! in-memory object implementation with a modifier stack.
use std::cell::Cell;

use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::geometry::PolyMesh;

/// Interaction mode of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectMode {
    #[default]
    Object,
    /// Live editing; the edit buffer holds the current geometry
    Edit,
}

/// Which modifier visibility set is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalMode {
    #[default]
    Viewport,
    Render,
}

/// Explicit evaluation state passed into snapshot construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalContext {
    pub mode: EvalMode,
}

impl EvalContext {
    pub fn viewport() -> Self {
        Self {
            mode: EvalMode::Viewport,
        }
    }

    pub fn render() -> Self {
        Self {
            mode: EvalMode::Render,
        }
    }
}

/// What the exporter needs from a scene object.
///
/// Implemented by the host adapter. `to_mesh` hands over an owned snapshot;
/// `to_mesh_clear` is called once when the exporter is done with it.
pub trait SceneObject {
    fn name(&self) -> &str;

    fn mode(&self) -> ObjectMode {
        ObjectMode::Object
    }

    fn is_selected(&self) -> bool {
        false
    }

    fn world_matrix(&self) -> Matrix4<f32>;

    /// Build an untransformed snapshot of the object's geometry.
    ///
    /// `Ok(None)` for objects that carry no mesh.
    fn to_mesh(
        &self,
        ctx: &EvalContext,
        apply_modifiers: bool,
    ) -> Result<Option<PolyMesh>, SnapshotError>;

    /// Release resources held for the last snapshot
    fn to_mesh_clear(&self) {}
}

/// Coordinate axis used by the mirror modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorAxis {
    X,
    Y,
    Z,
}

/// Procedural deformation evaluated on snapshot construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Modifier {
    /// Translate every vertex
    Displace { offset: [f32; 3] },
    /// Per-axis scale about the local origin
    Scale { factor: [f32; 3] },
    /// Append a mirrored copy with reversed winding
    Mirror { axis: MirrorAxis },
    /// Fan-split every polygon into triangles
    Triangulate,
}

impl Modifier {
    pub fn apply(&self, mesh: &mut PolyMesh) {
        match self {
            Modifier::Displace { offset } => {
                let offset = Vector3::from(*offset);
                for v in &mut mesh.vertices {
                    *v += offset;
                }
            }
            Modifier::Scale { factor } => {
                for v in &mut mesh.vertices {
                    *v = Point3::new(v.x * factor[0], v.y * factor[1], v.z * factor[2]);
                }
            }
            Modifier::Mirror { axis } => {
                let axis = match axis {
                    MirrorAxis::X => 0,
                    MirrorAxis::Y => 1,
                    MirrorAxis::Z => 2,
                };
                let base = mesh.vertices.len() as u32;
                let mirrored: Vec<Point3<f32>> = mesh
                    .vertices
                    .iter()
                    .map(|v| {
                        let mut m = *v;
                        m[axis] = -m[axis];
                        m
                    })
                    .collect();
                let faces: Vec<Vec<u32>> = mesh
                    .faces
                    .iter()
                    .map(|face| {
                        let mut f: Vec<u32> = face.iter().map(|&i| i + base).collect();
                        if f.len() > 1 {
                            f[1..].reverse();
                        }
                        f
                    })
                    .collect();
                mesh.vertices.extend(mirrored);
                mesh.faces.extend(faces);
            }
            Modifier::Triangulate => {
                let mut faces = Vec::with_capacity(mesh.faces.len() * 2);
                for face in &mesh.faces {
                    if face.len() <= 3 {
                        faces.push(face.clone());
                        continue;
                    }
                    for i in 1..face.len() - 1 {
                        faces.push(vec![face[0], face[i], face[i + 1]]);
                    }
                }
                mesh.faces = faces;
            }
        }
    }
}

/// A modifier plus its per-evaluation-mode visibility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierSlot {
    #[serde(flatten)]
    pub modifier: Modifier,
    #[serde(default = "enabled")]
    pub show_viewport: bool,
    #[serde(default = "enabled")]
    pub show_render: bool,
}

fn enabled() -> bool {
    true
}

impl ModifierSlot {
    pub fn new(modifier: Modifier) -> Self {
        Self {
            modifier,
            show_viewport: true,
            show_render: true,
        }
    }

    pub fn is_enabled(&self, ctx: &EvalContext) -> bool {
        match ctx.mode {
            EvalMode::Viewport => self.show_viewport,
            EvalMode::Render => self.show_render,
        }
    }
}

/// Object data
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Mesh(PolyMesh),
    Empty,
    Camera,
    Light,
}

/// In-memory scene object
#[derive(Debug, Clone)]
pub struct MeshObject {
    pub name: String,
    pub kind: ObjectKind,
    pub world: Matrix4<f32>,
    pub selected: bool,
    pub mode: ObjectMode,
    /// Uncommitted geometry while in edit mode
    pub edit_buffer: Option<PolyMesh>,
    pub modifiers: Vec<ModifierSlot>,
    live_snapshots: Cell<usize>,
    released: Cell<usize>,
}

impl MeshObject {
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            world: Matrix4::identity(),
            selected: false,
            mode: ObjectMode::Object,
            edit_buffer: None,
            modifiers: Vec::new(),
            live_snapshots: Cell::new(0),
            released: Cell::new(0),
        }
    }

    pub fn mesh(name: impl Into<String>, mesh: PolyMesh) -> Self {
        Self::new(name, ObjectKind::Mesh(mesh))
    }

    pub fn with_world(mut self, world: Matrix4<f32>) -> Self {
        self.world = world;
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(ModifierSlot::new(modifier));
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Enter edit mode with the given working geometry
    pub fn begin_edit(&mut self, buffer: PolyMesh) {
        self.mode = ObjectMode::Edit;
        self.edit_buffer = Some(buffer);
    }

    /// Snapshots handed out and not yet cleared
    pub fn live_snapshots(&self) -> usize {
        self.live_snapshots.get()
    }

    /// Total number of `to_mesh_clear` calls that released a snapshot
    pub fn released_snapshots(&self) -> usize {
        self.released.get()
    }

    fn base_mesh(&self) -> Option<&PolyMesh> {
        match &self.kind {
            ObjectKind::Mesh(mesh) => match (self.mode, &self.edit_buffer) {
                (ObjectMode::Edit, Some(buffer)) => Some(buffer),
                _ => Some(mesh),
            },
            ObjectKind::Empty | ObjectKind::Camera | ObjectKind::Light => None,
        }
    }
}

impl SceneObject for MeshObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> ObjectMode {
        self.mode
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn world_matrix(&self) -> Matrix4<f32> {
        self.world
    }

    fn to_mesh(
        &self,
        ctx: &EvalContext,
        apply_modifiers: bool,
    ) -> Result<Option<PolyMesh>, SnapshotError> {
        let Some(base) = self.base_mesh() else {
            return Ok(None);
        };

        let mut mesh = base.clone();
        if let Some(&bad) = mesh
            .faces
            .iter()
            .flatten()
            .find(|&&i| i as usize >= mesh.vertices.len())
        {
            return Err(SnapshotError {
                object: self.name.clone(),
                reason: format!("face references missing vertex {bad}"),
            });
        }

        if apply_modifiers {
            for slot in self.modifiers.iter().filter(|slot| slot.is_enabled(ctx)) {
                slot.modifier.apply(&mut mesh);
            }
        }

        self.live_snapshots.set(self.live_snapshots.get() + 1);
        Ok(Some(mesh))
    }

    fn to_mesh_clear(&self) {
        let live = self.live_snapshots.get();
        if live > 0 {
            self.live_snapshots.set(live - 1);
            self.released.set(self.released.get() + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_mesh_kinds_have_no_snapshot() {
        for kind in [ObjectKind::Empty, ObjectKind::Camera, ObjectKind::Light] {
            let obj = MeshObject::new("thing", kind);
            assert!(obj.to_mesh(&EvalContext::default(), true).unwrap().is_none());
            assert_eq!(obj.live_snapshots(), 0);
        }
    }

    #[test]
    fn test_modifiers_only_when_requested() {
        let obj = MeshObject::mesh("grid", PolyMesh::grid(1, 1))
            .with_modifier(Modifier::Displace { offset: [0.0, 0.0, 3.0] });
        let ctx = EvalContext::default();

        let base = obj.to_mesh(&ctx, false).unwrap().unwrap();
        assert!(base.vertices.iter().all(|v| v.z == 0.0));

        let evaluated = obj.to_mesh(&ctx, true).unwrap().unwrap();
        assert!(evaluated.vertices.iter().all(|v| v.z == 3.0));
    }

    #[test]
    fn test_modifier_visibility_follows_context() {
        let mut obj = MeshObject::mesh("grid", PolyMesh::grid(1, 1));
        obj.modifiers.push(ModifierSlot {
            modifier: Modifier::Scale { factor: [2.0, 2.0, 2.0] },
            show_viewport: false,
            show_render: true,
        });

        let viewport = obj.to_mesh(&EvalContext::viewport(), true).unwrap().unwrap();
        let render = obj.to_mesh(&EvalContext::render(), true).unwrap().unwrap();
        assert_eq!(viewport.vertices[3], Point3::new(1.0, 1.0, 0.0));
        assert_eq!(render.vertices[3], Point3::new(2.0, 2.0, 0.0));
    }

    #[test]
    fn test_mirror_doubles_with_reversed_winding() {
        let mut mesh = PolyMesh::grid(1, 1);
        Modifier::Mirror { axis: MirrorAxis::X }.apply(&mut mesh);
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.faces, vec![vec![0, 1, 3, 2], vec![4, 6, 7, 5]]);
        assert_eq!(mesh.vertices[5], Point3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_triangulate_modifier() {
        let mut mesh = PolyMesh::cube(1.0);
        Modifier::Triangulate.apply(&mut mesh);
        assert_eq!(mesh.faces.len(), 12);
        assert!(mesh.faces.iter().all(|f| f.len() == 3));
    }

    #[test]
    fn test_edit_buffer_used_without_commit() {
        let mut obj = MeshObject::mesh("cube", PolyMesh::cube(1.0));
        obj.begin_edit(PolyMesh::grid(2, 1));

        let snapshot = obj.to_mesh(&EvalContext::default(), false).unwrap().unwrap();
        assert_eq!(snapshot.faces.len(), 2);
        assert_eq!(obj.kind, ObjectKind::Mesh(PolyMesh::cube(1.0)));
    }

    #[test]
    fn test_broken_face_is_snapshot_error() {
        let mut mesh = PolyMesh::grid(1, 1);
        mesh.add_face([0, 1, 42]);
        let obj = MeshObject::mesh("broken", mesh);
        let err = obj.to_mesh(&EvalContext::default(), false).unwrap_err();
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_clear_balances_snapshots() {
        let obj = MeshObject::mesh("grid", PolyMesh::grid(1, 1));
        let _ = obj.to_mesh(&EvalContext::default(), false).unwrap();
        assert_eq!(obj.live_snapshots(), 1);
        obj.to_mesh_clear();
        obj.to_mesh_clear();
        assert_eq!(obj.live_snapshots(), 0);
        assert_eq!(obj.released_snapshots(), 1);
    }
}
