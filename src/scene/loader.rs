//! Wavefront OBJ triangle-soup loading.
//!
//! Only geometry is consumed: `v` records and `f` records (triangulated by
//! fanning). Normals, texture coordinates, groups, and material libraries
//! are skipped — instance attributes supply shading.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glam::Vec3;

/// Errors raised while loading a single mesh file. Per-instance: the scene
/// builder logs and skips the instance rather than aborting the build.
#[derive(Debug)]
pub enum MeshLoadError {
    /// The file could not be read.
    Io {
        /// Path that failed to open.
        path: PathBuf,
        /// The underlying I/O failure.
        source: io::Error,
    },
    /// A record in the file could not be parsed.
    Parse {
        /// Path of the malformed file.
        path: PathBuf,
        /// 1-based line number of the malformed record.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

impl fmt::Display for MeshLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read '{}': {source}", path.display())
            }
            Self::Parse {
                path,
                line,
                message,
            } => {
                write!(f, "'{}' line {line}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for MeshLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { .. } => None,
        }
    }
}

/// Load the triangle soup of the OBJ file at `path`.
///
/// Returns raw (untransformed) vertex triples; the scene builder applies
/// the instance transform and shading.
///
/// # Errors
///
/// [`MeshLoadError`] when the file cannot be read or a `v`/`f` record is
/// malformed.
pub fn load_triangle_soup(path: &Path) -> Result<Vec<[Vec3; 3]>, MeshLoadError> {
    let content = fs::read_to_string(path).map_err(|source| MeshLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_obj(&content).map_err(|(line, message)| MeshLoadError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    })
}

/// Parse OBJ source text into a triangle soup.
///
/// Kept separate from the I/O so the grammar is testable without files.
fn parse_obj(src: &str) -> Result<Vec<[Vec3; 3]>, (usize, String)> {
    let mut vertices: Vec<Vec3> = Vec::new();
    let mut triangles: Vec<[Vec3; 3]> = Vec::new();

    for (i, raw) in src.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("v") => {
                let v = parse_vertex(&mut fields)
                    .ok_or_else(|| (line_no, format!("malformed vertex record '{line}'")))?;
                vertices.push(v);
            }
            Some("f") => {
                let mut corners: Vec<Vec3> = Vec::new();
                for field in fields {
                    let index = parse_face_index(field, vertices.len())
                        .ok_or_else(|| (line_no, format!("bad face index '{field}'")))?;
                    corners.push(vertices[index]);
                }
                if corners.len() < 3 {
                    return Err((
                        line_no,
                        format!("face needs at least 3 vertices, got {}", corners.len()),
                    ));
                }
                // Fan-triangulate polygons around the first corner.
                for k in 1..corners.len() - 1 {
                    triangles.push([corners[0], corners[k], corners[k + 1]]);
                }
            }
            // vn, vt, o, g, s, usemtl, mtllib, ...
            _ => {}
        }
    }

    Ok(triangles)
}

fn parse_vertex<'a>(fields: &mut impl Iterator<Item = &'a str>) -> Option<Vec3> {
    let x = fields.next()?.parse::<f32>().ok()?;
    let y = fields.next()?.parse::<f32>().ok()?;
    let z = fields.next()?.parse::<f32>().ok()?;
    Some(Vec3::new(x, y, z))
}

/// Resolve one `f`-record field (`7`, `7/2`, `7//3`, `-1`) to a 0-based
/// vertex index.
fn parse_face_index(field: &str, vertex_count: usize) -> Option<usize> {
    let vertex_part = field.split('/').next()?;
    let raw: i64 = vertex_part.parse().ok()?;
    let index = if raw > 0 {
        // 1-based.
        raw - 1
    } else if raw < 0 {
        // Relative to the end of the vertex list.
        vertex_count as i64 + raw
    } else {
        return None;
    };
    (0..vertex_count as i64)
        .contains(&index)
        .then_some(index as usize)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_single_triangle() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let triangles = parse_obj(obj).unwrap();
        assert_eq!(triangles.len(), 1);
        assert_eq!(triangles[0][0], Vec3::ZERO);
        assert_eq!(triangles[0][1], Vec3::X);
        assert_eq!(triangles[0][2], Vec3::Y);
    }

    #[test]
    fn fan_triangulates_quads() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let triangles = parse_obj(obj).unwrap();
        assert_eq!(triangles.len(), 2);
        // Both fan triangles share the first corner.
        assert_eq!(triangles[0][0], Vec3::ZERO);
        assert_eq!(triangles[1][0], Vec3::ZERO);
        assert_eq!(triangles[1][1], Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn accepts_slash_forms_and_negative_indices() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1 2//2 -1\n";
        let triangles = parse_obj(obj).unwrap();
        assert_eq!(triangles.len(), 1);
        assert_eq!(triangles[0][2], Vec3::Y);
    }

    #[test]
    fn skips_comments_and_unknown_records() {
        let obj = "# a comment\no thing\nvn 0 0 1\nv 0 0 0\nv 1 0 0\nv 0 1 0\ns off\nf 1 2 3\n";
        assert_eq!(parse_obj(obj).unwrap().len(), 1);
    }

    #[test]
    fn rejects_out_of_range_index() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n";
        let err = parse_obj(obj).unwrap_err();
        assert_eq!(err.0, 4);
        assert!(err.1.contains("face index"));
    }

    #[test]
    fn rejects_malformed_vertex() {
        let obj = "v 0 zero 0\n";
        let err = parse_obj(obj).unwrap_err();
        assert_eq!(err.0, 1);
    }

    #[test]
    fn rejects_degenerate_face() {
        let obj = "v 0 0 0\nv 1 0 0\nf 1 2\n";
        assert!(parse_obj(obj).is_err());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "v 0 0 0\nv 2 0 0\nv 0 2 0\nf 1 2 3\n").unwrap();
        let triangles = load_triangle_soup(file.path()).unwrap();
        assert_eq!(triangles.len(), 1);
        assert_eq!(triangles[0][1], Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = load_triangle_soup(Path::new("/definitely/not/here.obj")).unwrap_err();
        assert!(matches!(err, MeshLoadError::Io { .. }));
    }
}
