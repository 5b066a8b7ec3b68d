//! Wavefront OBJ reader producing scene objects.
//!
//! Only geometry is read: `v` positions, `f` faces and `o` object
//! boundaries. Texture coordinates, normals, groups, materials and smoothing
//! statements are skipped. Vertex indices are global to the file, so each
//! object gets a compact copy of just the vertices its faces use.
use std::collections::HashMap;
use std::path::Path;

use nalgebra::Point3;
use nom::{
    character::complete::{char, i64 as integer, space0, space1},
    combinator::{all_consuming, opt},
    multi::separated_list1,
    number::complete::float,
    sequence::{delimited, preceded, tuple},
    IResult,
};
use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::geometry::PolyMesh;
use crate::scene::{MeshObject, ObjectKind};

/// Name given to geometry that appears before any `o` statement
pub const DEFAULT_OBJECT_NAME: &str = "default";

fn parse_vertex(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, (x, y, z, _w)) = all_consuming(delimited(
        space0,
        tuple((
            float,
            preceded(space1, float),
            preceded(space1, float),
            opt(preceded(space1, float)),
        )),
        space0,
    ))(input)?;
    Ok((input, Point3::new(x, y, z)))
}

/// One face corner: `v`, `v/vt`, `v//vn` or `v/vt/vn`; only `v` is kept
fn parse_corner(input: &str) -> IResult<&str, i64> {
    let (input, index) = integer(input)?;
    let (input, _) = opt(preceded(char('/'), opt(integer)))(input)?;
    let (input, _) = opt(preceded(char('/'), opt(integer)))(input)?;
    Ok((input, index))
}

fn parse_face(input: &str) -> IResult<&str, Vec<i64>> {
    all_consuming(delimited(space0, separated_list1(space1, parse_corner), space0))(input)
}

struct ObjectBuilder {
    name: String,
    line: usize,
    faces: Vec<(usize, Vec<i64>)>,
}

impl ObjectBuilder {
    fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
            faces: Vec::new(),
        }
    }

    fn build(self, positions: &[Point3<f32>]) -> ExportResult<MeshObject> {
        if self.faces.is_empty() {
            return Ok(MeshObject::new(self.name, ObjectKind::Empty));
        }

        let mut mesh = PolyMesh::with_capacity(0, self.faces.len());
        let mut local: HashMap<usize, u32> = HashMap::new();
        for (line, corners) in self.faces {
            let mut face = Vec::with_capacity(corners.len());
            for raw in corners {
                let global = resolve_index(raw, positions.len()).ok_or_else(|| {
                    ExportError::obj_parse(line, format!("vertex index {raw} out of range"))
                })?;
                let index = *local
                    .entry(global)
                    .or_insert_with(|| mesh.add_vertex(positions[global]));
                face.push(index);
            }
            mesh.add_face(face);
        }

        debug!(
            object = %self.name,
            line = self.line,
            vertices = mesh.vertices.len(),
            faces = mesh.faces.len(),
            "read OBJ object"
        );
        Ok(MeshObject::mesh(self.name, mesh))
    }
}

/// 1-based (or negative, relative to the end) index to a 0-based one
fn resolve_index(raw: i64, count: usize) -> Option<usize> {
    let count = i64::try_from(count).ok()?;
    let index = match raw {
        0 => return None,
        i if i > 0 => i - 1,
        i => count + i,
    };
    if (0..count).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

/// Parse OBJ text into scene objects, in file order
pub fn parse_obj(text: &str) -> ExportResult<Vec<MeshObject>> {
    let mut positions: Vec<Point3<f32>> = Vec::new();
    let mut objects = Vec::new();
    let mut current = ObjectBuilder::new(DEFAULT_OBJECT_NAME, 0);
    let mut implicit = true;

    for (i, raw_line) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

        match keyword {
            "v" => {
                let (_, p) = parse_vertex(rest)
                    .map_err(|_| ExportError::obj_parse(line_no, "malformed vertex"))?;
                positions.push(p);
            }
            "f" => {
                let (_, corners) = parse_face(rest)
                    .map_err(|_| ExportError::obj_parse(line_no, "malformed face"))?;
                if corners.len() < 3 {
                    return Err(ExportError::obj_parse(line_no, "face needs at least 3 corners"));
                }
                // Negative indices are relative to the vertices read so far
                let corners = corners
                    .into_iter()
                    .map(|c| {
                        if c < 0 {
                            resolve_index(c, positions.len())
                                .map(|g| g as i64 + 1)
                                .ok_or_else(|| {
                                    let message = format!("vertex index {c} out of range");
                                    ExportError::obj_parse(line_no, message)
                                })
                        } else {
                            Ok(c)
                        }
                    })
                    .collect::<ExportResult<Vec<i64>>>()?;
                current.faces.push((line_no, corners));
            }
            "o" => {
                let name = rest.trim();
                let name = if name.is_empty() { DEFAULT_OBJECT_NAME } else { name };
                let previous = std::mem::replace(&mut current, ObjectBuilder::new(name, line_no));
                if !(implicit && previous.faces.is_empty()) {
                    objects.push(previous);
                }
                implicit = false;
            }
            _ => {}
        }
    }

    if !(implicit && current.faces.is_empty()) {
        objects.push(current);
    }

    objects.into_iter().map(|b| b.build(&positions)).collect()
}

/// Read and parse an OBJ file
pub fn load_obj(path: impl AsRef<Path>) -> ExportResult<Vec<MeshObject>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
    parse_obj(&text)
}
