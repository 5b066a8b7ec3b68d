//! ASCII STL writer for OpenFOAM surface import
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::geometry::Triangle;

/// Format one facet (7 lines) into `buf`.
///
/// Numbers use six decimal places, the layout OpenFOAM's `surfaceFeatureExtract`
/// and `snappyHexMesh` tokenizers expect.
fn format_facet(buf: &mut String, triangle: &Triangle) {
    let n = triangle.calculate_normal();
    buf.push_str(&format!("facet normal {:.6} {:.6} {:.6}\n", n.x, n.y, n.z));
    buf.push_str("outer loop\n");
    for v in &triangle.vertices {
        buf.push_str(&format!("vertex {:.6} {:.6} {:.6}\n", v.x, v.y, v.z));
    }
    buf.push_str("endloop\nendfacet\n");
}

/// Write one complete `solid ... endsolid` block.
///
/// Returns the number of facets written.
pub fn write_solid<W, I>(writer: &mut W, name: &str, triangles: I) -> io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = Triangle>,
{
    writeln!(writer, "solid {name}")?;

    let mut facet = String::with_capacity(256);
    let mut count = 0;
    for triangle in triangles {
        facet.clear();
        format_facet(&mut facet, &triangle);
        writer.write_all(facet.as_bytes())?;
        count += 1;
    }

    writeln!(writer, "endsolid {name}")?;
    Ok(count)
}

/// Append a solid block for one object to the file at `path`.
///
/// The file is created if it does not exist. Callers that want a fresh file
/// remove it once before the first object.
pub fn write_stl_for_openfoam<I>(path: &Path, name: &str, triangles: I) -> ExportResult<usize>
where
    I: IntoIterator<Item = Triangle>,
{
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ExportError::io(path, e))?;

    let mut writer = BufWriter::new(file);
    let count = write_solid(&mut writer, name, triangles).map_err(|e| ExportError::io(path, e))?;
    writer.flush().map_err(|e| ExportError::io(path, e))?;

    debug!(path = %path.display(), solid = name, facets = count, "wrote solid");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_exact_block_layout() {
        let mut out = Vec::new();
        let count = write_solid(&mut out, "wall", [unit_triangle()]).unwrap();
        assert_eq!(count, 1);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "solid wall\n\
             facet normal 0.000000 0.000000 1.000000\n\
             outer loop\n\
             vertex 0.000000 0.000000 0.000000\n\
             vertex 1.000000 0.000000 0.000000\n\
             vertex 0.000000 1.000000 0.000000\n\
             endloop\n\
             endfacet\n\
             endsolid wall\n"
        );
    }

    #[test]
    fn test_empty_block() {
        let mut out = Vec::new();
        let count = write_solid(&mut out, "lamp", std::iter::empty()).unwrap();
        assert_eq!(count, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "solid lamp\nendsolid lamp\n");
    }

    #[test]
    fn test_degenerate_facet_has_zero_normal() {
        let p = Point3::new(0.5, 0.5, 0.5);
        let mut out = Vec::new();
        write_solid(&mut out, "d", [Triangle::new(p, p, p)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("facet normal 0.000000 0.000000 0.000000\n"));
        assert!(text.contains("vertex 0.500000 0.500000 0.500000\n"));
    }

    #[test]
    fn test_six_decimal_rounding() {
        let tri = Triangle::new(
            Point3::new(0.1234567, -2.5, 1e-7),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let mut out = Vec::new();
        write_solid(&mut out, "r", [tri]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("vertex 0.123457 -2.500000 0.000000\n"));
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.stl");
        write_stl_for_openfoam(&path, "a", [unit_triangle()]).unwrap();
        write_stl_for_openfoam(&path, "b", [unit_triangle(), unit_triangle()]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("solid a\n"));
        assert!(text.ends_with("endsolid b\n"));
        assert_eq!(text.matches("endfacet").count(), 3);
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.stl");
        let err = write_stl_for_openfoam(&path, "a", [unit_triangle()]).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
