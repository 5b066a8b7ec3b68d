//! Geometry primitives for STL export
use nalgebra::{Matrix4, Point3, Vector3};

use crate::triangulate;

/// A triangle in export space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Point3<f32>; 3],
}

impl Triangle {
    pub fn new(v0: Point3<f32>, v1: Point3<f32>, v2: Point3<f32>) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the unit face normal from the triangle's vertices.
    ///
    /// Follows the right-hand rule on `(v1 - v0) x (v2 - v0)`. Degenerate
    /// triangles get the zero vector.
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let [v0, v1, v2] = self.vertices;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        let cross = edge1.cross(&edge2);
        let len = cross.norm();
        if len > 0.0 && len.is_finite() {
            cross / len
        } else {
            Vector3::zeros()
        }
    }

    /// Same triangle with the opposite winding (first vertex kept)
    pub fn reversed(&self) -> Self {
        let [v0, v1, v2] = self.vertices;
        Self::new(v0, v2, v1)
    }
}

/// A polygon mesh: vertex positions plus faces of arbitrary arity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyMesh {
    pub vertices: Vec<Point3<f32>>,
    pub faces: Vec<Vec<u32>>,
}

impl PolyMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            faces: Vec::with_capacity(faces),
        }
    }

    /// Append a vertex and return its index
    pub fn add_vertex(&mut self, position: Point3<f32>) -> u32 {
        self.vertices.push(position);
        (self.vertices.len() - 1) as u32
    }

    pub fn add_face(&mut self, face: impl Into<Vec<u32>>) {
        self.faces.push(face.into());
    }

    /// Apply an affine transform to every vertex
    pub fn transform(&mut self, matrix: &Matrix4<f32>) {
        for v in &mut self.vertices {
            *v = matrix.transform_point(v);
        }
    }

    /// Reverse the winding of every face, keeping each face's first corner
    pub fn flip_normals(&mut self) {
        for face in &mut self.faces {
            if face.len() > 1 {
                face[1..].reverse();
            }
        }
    }

    /// Decompose every face into triangles (vertex index triples).
    ///
    /// Faces that reference missing vertices or have fewer than three corners
    /// are skipped.
    pub fn loop_triangles(&self) -> Vec<[u32; 3]> {
        let mut tris = Vec::with_capacity(self.faces.len() * 2);
        for face in &self.faces {
            if face.len() < 3
                || face
                    .iter()
                    .any(|&i| i as usize >= self.vertices.len())
            {
                continue;
            }
            tris.extend(triangulate::triangulate_polygon(&self.vertices, face));
        }
        tris
    }

    /// Create an axis-aligned cube centred on the origin, one quad per side,
    /// outward winding
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let mut mesh = Self::with_capacity(8, 6);
        for &(x, y, z) in &[
            (-h, -h, -h),
            (h, -h, -h),
            (h, h, -h),
            (-h, h, -h),
            (-h, -h, h),
            (h, -h, h),
            (h, h, h),
            (-h, h, h),
        ] {
            mesh.add_vertex(Point3::new(x, y, z));
        }

        mesh.add_face([4, 5, 6, 7]); // +Z
        mesh.add_face([0, 3, 2, 1]); // -Z
        mesh.add_face([3, 7, 6, 2]); // +Y
        mesh.add_face([0, 1, 5, 4]); // -Y
        mesh.add_face([1, 2, 6, 5]); // +X
        mesh.add_face([0, 4, 7, 3]); // -X

        mesh
    }

    /// Flat grid of `columns` x `rows` unit quads in the XY plane facing +Z
    pub fn grid(columns: u32, rows: u32) -> Self {
        let mut mesh = Self::new();
        for j in 0..=rows {
            for i in 0..=columns {
                mesh.add_vertex(Point3::new(i as f32, j as f32, 0.0));
            }
        }
        let stride = columns + 1;
        for j in 0..rows {
            for i in 0..columns {
                let a = j * stride + i;
                mesh.add_face([a, a + 1, a + stride + 1, a + stride]);
            }
        }
        mesh
    }
}
