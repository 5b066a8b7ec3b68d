//! Polygon triangulation by ear clipping.
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Split one polygon into triangles.
///
/// Triangles are returned as vertex index triples with the polygon's winding.
/// Polygons with four or more corners are ear-clipped in the plane given by
/// their Newell normal; if no ear can be found (self-intersecting or
/// degenerate input) the rest is fanned from its first corner.
pub fn triangulate_polygon(positions: &[Point3<f32>], face: &[u32]) -> Vec<[u32; 3]> {
    let n = face.len();
    if n < 3 {
        return Vec::new();
    }
    if n == 3 {
        return vec![[face[0], face[1], face[2]]];
    }

    let corners: Vec<Point3<f32>> = face.iter().map(|&i| positions[i as usize]).collect();
    let normal = newell_normal(&corners);
    let mut triangles = Vec::with_capacity(n - 2);

    if normal == Vector3::zeros() {
        fan(face, &mut triangles);
        return triangles;
    }

    let mut remaining: Vec<usize> = (0..n).collect();
    while remaining.len() > 3 {
        let len = remaining.len();
        let ear = (0..len).find(|&i| {
            let prev = remaining[(i + len - 1) % len];
            let next = remaining[(i + 1) % len];
            is_ear(&corners, &remaining, prev, remaining[i], next, &normal)
        });

        let Some(i) = ear else {
            debug!(
                corners = n,
                remaining = len,
                "no ear found, falling back to fan triangulation"
            );
            break;
        };

        let prev = remaining[(i + len - 1) % len];
        let next = remaining[(i + 1) % len];
        triangles.push([face[prev], face[remaining[i]], face[next]]);
        remaining.remove(i);
    }

    let rest: Vec<u32> = remaining.iter().map(|&i| face[i]).collect();
    fan(&rest, &mut triangles);
    triangles
}

fn fan(face: &[u32], out: &mut Vec<[u32; 3]>) {
    for i in 1..face.len().saturating_sub(1) {
        out.push([face[0], face[i], face[i + 1]]);
    }
}

/// Unnormalized polygon normal, robust for non-convex and non-planar loops
fn newell_normal(corners: &[Point3<f32>]) -> Vector3<f32> {
    let mut normal = Vector3::zeros();
    for (i, p) in corners.iter().enumerate() {
        let q = corners[(i + 1) % corners.len()];
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }
    if normal.norm() > f32::EPSILON {
        normal
    } else {
        Vector3::zeros()
    }
}

fn is_ear(
    corners: &[Point3<f32>],
    remaining: &[usize],
    prev: usize,
    curr: usize,
    next: usize,
    normal: &Vector3<f32>,
) -> bool {
    let a = corners[prev];
    let b = corners[curr];
    let c = corners[next];

    // Reflex or collinear corner
    if (b - a).cross(&(c - a)).dot(normal) <= 0.0 {
        return false;
    }

    !remaining
        .iter()
        .filter(|&&idx| idx != prev && idx != curr && idx != next)
        .any(|&idx| point_in_triangle(&corners[idx], &a, &b, &c, normal))
}

/// Inclusive containment test for a point in the triangle's plane
fn point_in_triangle(
    p: &Point3<f32>,
    a: &Point3<f32>,
    b: &Point3<f32>,
    c: &Point3<f32>,
    normal: &Vector3<f32>,
) -> bool {
    let side = |from: &Point3<f32>, to: &Point3<f32>| (to - from).cross(&(p - from)).dot(normal);
    side(a, b) >= 0.0 && side(b, c) >= 0.0 && side(c, a) >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point3<f32>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    fn signed_area_z(positions: &[Point3<f32>], tri: [u32; 3]) -> f32 {
        let [a, b, c] = tri.map(|i| positions[i as usize]);
        (b - a).cross(&(c - a)).z
    }

    #[test]
    fn test_triangle_passes_through() {
        let tris = triangulate_polygon(&square(), &[2, 0, 1]);
        assert_eq!(tris, vec![[2, 0, 1]]);
    }

    #[test]
    fn test_quad_gives_two_ccw_triangles() {
        let positions = square();
        let tris = triangulate_polygon(&positions, &[0, 1, 2, 3]);
        assert_eq!(tris.len(), 2);
        for tri in tris {
            assert!(signed_area_z(&positions, tri) > 0.0);
        }
    }

    #[test]
    fn test_reversed_quad_gives_reversed_triangles() {
        let positions = square();
        let forward = triangulate_polygon(&positions, &[0, 1, 2, 3]);
        let backward = triangulate_polygon(&positions, &[0, 3, 2, 1]);
        assert_eq!(forward.len(), backward.len());
        for (f, b) in forward.iter().zip(&backward) {
            assert_eq!([f[2], f[1], f[0]], *b);
        }
    }

    #[test]
    fn test_concave_polygon_stays_inside() {
        // L-shape; a fan from corner 0 would cover the notch
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let tris = triangulate_polygon(&positions, &[0, 1, 2, 3, 4, 5]);
        assert_eq!(tris.len(), 4);
        let total: f32 = tris.iter().map(|&t| signed_area_z(&positions, t) / 2.0).sum();
        assert!((total - 3.0).abs() < 1e-5);
        for tri in tris {
            assert!(signed_area_z(&positions, tri) > 0.0);
        }
    }

    #[test]
    fn test_degenerate_polygon_fans() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let positions = vec![p; 5];
        let tris = triangulate_polygon(&positions, &[0, 1, 2, 3, 4]);
        assert_eq!(tris, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    }

    #[test]
    fn test_deterministic() {
        let positions = square();
        assert_eq!(
            triangulate_polygon(&positions, &[0, 1, 2, 3]),
            triangulate_polygon(&positions, &[0, 1, 2, 3])
        );
    }
}
