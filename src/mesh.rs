//! Triangle meshes loaded from ASCII PLY or Wavefront OBJ files.
//!
//! Both loaders produce the same layout: a flat vertex list whose attributes
//! use the keys from [`crate::attribute`], and an index list with three
//! entries per triangle.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::attribute::{Vertex, COLOUR, NORMAL, TEXCOORD};
use crate::math::{Vec2, Vec3, Vec4};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read mesh: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to load OBJ: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("invalid PLY header: line {line}: {detail}")]
    InvalidHeader { line: usize, detail: String },

    #[error("unsupported property type: line {line}: {ty}")]
    UnsupportedType { line: usize, ty: String },

    #[error("only triangulated meshes are supported: line {line}: face has {count} vertices")]
    NonTriangulatedFace { line: usize, count: usize },

    #[error("only triangulated meshes are supported: model {model:?} has a face with {count} vertices")]
    NonTriangulatedObj { model: String, count: u32 },

    #[error("wrong field count: line {line}: expected {expected}, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid number: line {line}: {value:?}")]
    InvalidNumber { line: usize, value: String },

    #[error("vertex index out of range: line {line}: {index} >= {len}")]
    IndexOutOfRange { line: usize, index: u32, len: usize },

    #[error("unexpected end of file after line {line}")]
    UnexpectedEof { line: usize },
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub has_normals: bool,
    pub has_colours: bool,
    pub has_uvs: bool,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Unit cube centred on the origin, coloured by corner position.
    ///
    /// Faces wind anticlockwise seen from outside.
    pub fn cube() -> Self {
        let corners = [
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        ];
        let quads: [[u32; 4]; 6] = [
            [4, 5, 6, 7], // +z
            [1, 0, 3, 2], // -z
            [5, 1, 2, 6], // +x
            [0, 4, 7, 3], // -x
            [7, 6, 2, 3], // +y
            [0, 1, 5, 4], // -y
        ];

        let vertices = corners
            .iter()
            .map(|&c| {
                Vertex::new(Vec4::from_vec3(c, 1.0)).with(COLOUR, (c + Vec3::ONE) * 0.5)
            })
            .collect();
        let indices = quads
            .iter()
            .flat_map(|q| [q[0], q[1], q[2], q[0], q[2], q[3]])
            .collect();

        Self {
            vertices,
            indices,
            has_normals: false,
            has_colours: true,
            has_uvs: false,
        }
    }

    /// Loads a mesh, picking the format from the file extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let is_obj = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("obj"));
        if is_obj {
            Self::from_obj(path)
        } else {
            Self::from_ply(path)
        }
    }

    pub fn from_ply<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let mesh = Self::parse_ply(BufReader::new(File::open(path)?))?;
        log::info!(
            "Loaded {} vertices and {} triangles from {}",
            mesh.vertices.len(),
            mesh.triangle_count(),
            path.display()
        );
        Ok(mesh)
    }

    /// Parses an ASCII PLY 1.0 stream.
    ///
    /// Only triangle faces are accepted. Colour channels stored as bytes are
    /// mapped to [0, 1]; normals are normalised.
    pub fn parse_ply<R: BufRead>(reader: R) -> Result<Self, LoadError> {
        let mut lines = NumberedLines::new(reader);
        let header = PlyHeader::parse(&mut lines)?;

        let mut mesh = Mesh {
            vertices: Vec::with_capacity(header.vertex_count.min(MAX_RESERVE)),
            indices: Vec::with_capacity(header.index_count.min(MAX_RESERVE)),
            has_normals: header.has(&[Field::Nx, Field::Ny, Field::Nz]),
            has_colours: header.has(&[Field::Red, Field::Green, Field::Blue]),
            has_uvs: header.has(&[Field::U, Field::V]),
        };

        for _ in 0..header.vertex_count {
            let (line, text) = lines.next_line()?;
            let values: Vec<&str> = text.split_whitespace().collect();
            if values.len() != header.properties.len() {
                return Err(LoadError::FieldCount {
                    line,
                    expected: header.properties.len(),
                    found: values.len(),
                });
            }

            let mut position = Vec4::point(0.0, 0.0, 0.0);
            let mut normal = Vec3::ZERO;
            let mut colour = Vec3::ZERO;
            let mut uv = Vec2::ZERO;
            for (value, property) in values.iter().zip(&header.properties) {
                let v = parse_number::<f32>(line, value)? * property.scale;
                match property.field {
                    Field::X => position.x = v,
                    Field::Y => position.y = v,
                    Field::Z => position.z = v,
                    Field::Nx => normal.x = v,
                    Field::Ny => normal.y = v,
                    Field::Nz => normal.z = v,
                    Field::Red => colour.x = v,
                    Field::Green => colour.y = v,
                    Field::Blue => colour.z = v,
                    Field::U => uv.x = v,
                    Field::V => uv.y = v,
                    Field::Other => {}
                }
            }

            let mut vertex = Vertex::new(position);
            if mesh.has_colours {
                vertex.attributes.insert(COLOUR, colour);
            }
            if mesh.has_normals {
                vertex.attributes.insert(NORMAL, normal.normalize());
            }
            if mesh.has_uvs {
                vertex.attributes.insert(TEXCOORD, uv);
            }
            mesh.vertices.push(vertex);
        }

        for _ in 0..header.face_count {
            let (line, text) = lines.next_line()?;
            let values: Vec<&str> = text.split_whitespace().collect();
            let count = match values.first() {
                Some(first) => parse_number::<usize>(line, first)?,
                None => {
                    return Err(LoadError::FieldCount {
                        line,
                        expected: 4,
                        found: 0,
                    })
                }
            };
            if count != 3 {
                return Err(LoadError::NonTriangulatedFace { line, count });
            }
            if values.len() != 4 {
                return Err(LoadError::FieldCount {
                    line,
                    expected: 4,
                    found: values.len(),
                });
            }
            for value in &values[1..] {
                let index = parse_number::<u32>(line, value)?;
                if index as usize >= mesh.vertices.len() {
                    return Err(LoadError::IndexOutOfRange {
                        line,
                        index,
                        len: mesh.vertices.len(),
                    });
                }
                mesh.indices.push(index);
            }
        }

        Ok(mesh)
    }

    /// Loads every model in an OBJ file into one mesh.
    ///
    /// Faces are not triangulated; a polygon with more than three corners is
    /// an error.
    pub fn from_obj<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let options = tobj::LoadOptions {
            triangulate: false,
            single_index: true,
            ..Default::default()
        };
        let (models, _materials) = tobj::load_obj(path, &options)?;

        let mut mesh = Mesh {
            has_normals: models.iter().any(|m| !m.mesh.normals.is_empty()),
            has_colours: models.iter().any(|m| !m.mesh.vertex_color.is_empty()),
            has_uvs: models.iter().any(|m| !m.mesh.texcoords.is_empty()),
            ..Mesh::default()
        };

        for model in &models {
            let m = &model.mesh;
            if let Some(&count) = m.face_arities.iter().find(|&&a| a != 3) {
                return Err(LoadError::NonTriangulatedObj {
                    model: model.name.clone(),
                    count,
                });
            }

            let base = mesh.vertices.len() as u32;
            for i in 0..m.positions.len() / 3 {
                let mut vertex = Vertex::new(Vec4::point(
                    m.positions[i * 3],
                    m.positions[i * 3 + 1],
                    m.positions[i * 3 + 2],
                ));
                if mesh.has_colours {
                    vertex.attributes.insert(COLOUR, vec3_at(&m.vertex_color, i));
                }
                if mesh.has_normals {
                    vertex
                        .attributes
                        .insert(NORMAL, vec3_at(&m.normals, i).normalize());
                }
                if mesh.has_uvs {
                    let uv = m
                        .texcoords
                        .get(i * 2..i * 2 + 2)
                        .map_or(Vec2::ZERO, |t| Vec2::new(t[0], t[1]));
                    vertex.attributes.insert(TEXCOORD, uv);
                }
                mesh.vertices.push(vertex);
            }
            mesh.indices.extend(m.indices.iter().map(|&i| base + i));
        }

        log::info!(
            "Loaded {} models, {} vertices and {} triangles from {}",
            models.len(),
            mesh.vertices.len(),
            mesh.triangle_count(),
            path.display()
        );
        Ok(mesh)
    }
}

/// Missing components read as zero so merged models share one attribute set.
fn vec3_at(data: &[f32], i: usize) -> Vec3 {
    data.get(i * 3..i * 3 + 3)
        .map_or(Vec3::ZERO, |c| Vec3::new(c[0], c[1], c[2]))
}

fn parse_number<T: std::str::FromStr>(line: usize, value: &str) -> Result<T, LoadError> {
    value.parse().map_err(|_| LoadError::InvalidNumber {
        line,
        value: value.to_string(),
    })
}

/// Upper bound on up-front allocation from header counts. Larger meshes
/// still load; the vectors grow as lines are read.
const MAX_RESERVE: usize = 1 << 16;

/// Line reader that tracks 1-based line numbers.
struct NumberedLines<R> {
    inner: std::io::Lines<R>,
    line: usize,
}

impl<R: BufRead> NumberedLines<R> {
    fn new(reader: R) -> Self {
        Self {
            inner: reader.lines(),
            line: 0,
        }
    }

    fn next_line(&mut self) -> Result<(usize, String), LoadError> {
        match self.inner.next() {
            Some(text) => {
                self.line += 1;
                Ok((self.line, text?))
            }
            None => Err(LoadError::UnexpectedEof { line: self.line }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    X,
    Y,
    Z,
    Nx,
    Ny,
    Nz,
    Red,
    Green,
    Blue,
    U,
    V,
    Other,
}

impl Field {
    fn from_name(name: &str) -> Self {
        match name {
            "x" => Field::X,
            "y" => Field::Y,
            "z" => Field::Z,
            "nx" => Field::Nx,
            "ny" => Field::Ny,
            "nz" => Field::Nz,
            "red" => Field::Red,
            "green" => Field::Green,
            "blue" => Field::Blue,
            "s" | "u" => Field::U,
            "t" | "v" => Field::V,
            _ => Field::Other,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Property {
    field: Field,
    scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    None,
    Vertex,
    Face,
}

#[derive(Debug)]
struct PlyHeader {
    vertex_count: usize,
    face_count: usize,
    /// `face_count * 3`, checked while parsing.
    index_count: usize,
    properties: Vec<Property>,
}

impl PlyHeader {
    fn has(&self, fields: &[Field]) -> bool {
        self.properties.iter().any(|p| fields.contains(&p.field))
    }

    fn parse<R: BufRead>(lines: &mut NumberedLines<R>) -> Result<Self, LoadError> {
        let (line, text) = lines.next_line()?;
        if !text.trim().eq_ignore_ascii_case("ply") {
            return Err(invalid_header(line, "missing `ply` magic"));
        }
        let (line, text) = lines.next_line()?;
        let format: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        if format != ["format", "ascii", "1.0"] {
            return Err(invalid_header(
                line,
                format!("unsupported format {:?}", text.trim()),
            ));
        }

        let mut header = PlyHeader {
            vertex_count: 0,
            face_count: 0,
            index_count: 0,
            properties: Vec::new(),
        };
        let mut element = Element::None;
        let mut seen_vertex = false;

        loop {
            let (line, text) = lines.next_line()?;
            let lower = text.to_lowercase();
            let words: Vec<&str> = lower.split_whitespace().collect();
            match words.as_slice() {
                [] | ["comment", ..] | ["obj_info", ..] => {}
                ["end_header"] => break,
                ["element", "vertex", count] => {
                    header.vertex_count = parse_number(line, count)?;
                    element = Element::Vertex;
                    seen_vertex = true;
                }
                ["element", "face", count] => {
                    header.face_count = parse_number(line, count)?;
                    header.index_count = header.face_count.checked_mul(3).ok_or_else(|| {
                        invalid_header(line, format!("face count {count} is too large"))
                    })?;
                    element = Element::Face;
                }
                ["element", name, ..] => {
                    return Err(invalid_header(line, format!("unknown element {name:?}")));
                }
                ["property", "list", ..] if element == Element::Face => {}
                ["property", ty, name] if element == Element::Vertex => {
                    let scale = match *ty {
                        "float" | "float32" | "double" | "float64" => 1.0,
                        "uchar" | "uint8" => 1.0 / 255.0,
                        other => {
                            return Err(LoadError::UnsupportedType {
                                line,
                                ty: other.to_string(),
                            })
                        }
                    };
                    header.properties.push(Property {
                        field: Field::from_name(name),
                        scale,
                    });
                }
                _ => {
                    return Err(invalid_header(
                        line,
                        format!("unexpected {:?}", text.trim()),
                    ))
                }
            }
        }

        if !seen_vertex {
            return Err(invalid_header(lines.line, "no vertex element"));
        }
        Ok(header)
    }
}

fn invalid_header(line: usize, detail: impl Into<String>) -> LoadError {
    LoadError::InvalidHeader {
        line,
        detail: detail.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::{Cursor, Write};

    const QUAD: &str = "ply
format ascii 1.0
comment made by hand
element vertex 4
property float x
property float y
property float z
property float nx
property float ny
property float nz
property uchar red
property uchar green
property uchar blue
property float s
property float t
element face 2
property list uchar int vertex_indices
end_header
0 0 0 0 0 2 255 0 0 0 0
1 0 0 0 0 2 0 255 0 1 0
1 1 0 0 0 2 0 0 255 1 1
0 1 0 0 0 2 51 51 51 0 1
3 0 1 2
3 0 2 3
";

    fn parse(text: &str) -> Result<Mesh, LoadError> {
        Mesh::parse_ply(Cursor::new(text))
    }

    #[test]
    fn parses_quad() {
        let mesh = parse(QUAD).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(mesh.has_normals && mesh.has_colours && mesh.has_uvs);

        let v = &mesh.vertices[3];
        assert_eq!(v.position, Vec4::point(0.0, 1.0, 0.0));
        assert_relative_eq!(v.attributes.get_vec3(COLOUR).unwrap().x, 0.2);
        assert_eq!(v.attributes.get_vec3(NORMAL).unwrap(), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(v.attributes.get_vec2(TEXCOORD).unwrap(), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn positions_only() {
        let mesh = parse(
            "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\n\
             property float z\nelement face 1\nproperty list uchar int vertex_indices\n\
             end_header\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n",
        )
        .unwrap();
        assert!(!mesh.has_colours && !mesh.has_normals && !mesh.has_uvs);
        assert!(mesh.vertices[0].attributes.is_empty());
    }

    #[test]
    fn rejects_quads_with_line_number() {
        let text = QUAD.replace("3 0 2 3", "4 0 1 2 3");
        match parse(&text) {
            Err(LoadError::NonTriangulatedFace { line, count }) => {
                assert_eq!(line, 24);
                assert_eq!(count, 4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_out_of_range_index() {
        let text = QUAD.replace("3 0 2 3", "3 0 2 9");
        assert!(matches!(
            parse(&text),
            Err(LoadError::IndexOutOfRange { line: 24, index: 9, len: 4 })
        ));
    }

    #[test]
    fn rejects_short_vertex_line() {
        let text = QUAD.replace("1 0 0 0 0 2 0 255 0 1 0", "1 0 0");
        assert!(matches!(
            parse(&text),
            Err(LoadError::FieldCount { line: 20, expected: 11, found: 3 })
        ));
    }

    #[test]
    fn rejects_bad_number() {
        let text = QUAD.replace("1 1 0 0 0 2", "1 one 0 0 0 2");
        assert!(matches!(
            parse(&text),
            Err(LoadError::InvalidNumber { line: 21, .. })
        ));
    }

    #[test]
    fn rejects_unsupported_type() {
        let text = QUAD.replace("property float s", "property int s");
        assert!(matches!(
            parse(&text),
            Err(LoadError::UnsupportedType { line: 14, .. })
        ));
    }

    #[test]
    fn rejects_binary_format() {
        let text = QUAD.replace("format ascii 1.0", "format binary_little_endian 1.0");
        assert!(matches!(
            parse(&text),
            Err(LoadError::InvalidHeader { line: 2, .. })
        ));
    }

    #[test]
    fn huge_vertex_count_fails_on_data() {
        let text = QUAD.replace("element vertex 4", &format!("element vertex {}", usize::MAX));
        assert!(matches!(
            parse(&text),
            Err(LoadError::FieldCount { line: 23, .. })
        ));
    }

    #[test]
    fn overflowing_face_count_is_header_error() {
        let text = QUAD.replace("element face 2", &format!("element face {}", usize::MAX / 2));
        assert!(matches!(
            parse(&text),
            Err(LoadError::InvalidHeader { line: 16, .. })
        ));
    }

    #[test]
    fn truncated_file() {
        let text = QUAD.replace("3 0 2 3\n", "");
        assert!(matches!(
            parse(&text),
            Err(LoadError::UnexpectedEof { line: 23 })
        ));
    }

    #[test]
    fn cube_is_closed() {
        let cube = Mesh::cube();
        assert_eq!(cube.vertices.len(), 8);
        assert_eq!(cube.triangle_count(), 12);
        // Every edge of a closed mesh is shared by exactly two triangles,
        // once in each direction.
        let mut edges = std::collections::HashMap::new();
        for t in cube.indices.chunks(3) {
            for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                *edges.entry((a, b)).or_insert(0) += 1;
            }
        }
        for (&(a, b), &n) in &edges {
            assert_eq!(n, 1);
            assert_eq!(edges.get(&(b, a)), Some(&1));
        }
    }

    #[test]
    fn loads_obj() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        writeln!(
            file,
            "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 3\nvt 0.5 0.5\nf 1/1/1 2/1/1 3/1/1"
        )
        .unwrap();

        let mesh = Mesh::from_file(file.path()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.has_normals && mesh.has_uvs);
        for v in &mesh.vertices {
            assert_eq!(v.attributes.get_vec3(NORMAL).unwrap(), Vec3::new(0.0, 0.0, 1.0));
        }
        let positions: Vec<Vec4> = mesh
            .indices
            .iter()
            .map(|&i| mesh.vertices[i as usize].position)
            .collect();
        assert!(positions.contains(&Vec4::point(1.0, 0.0, 0.0)));
    }

    #[test]
    fn obj_rejects_quads() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        writeln!(file, "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4").unwrap();
        assert!(matches!(
            Mesh::from_obj(file.path()),
            Err(LoadError::NonTriangulatedObj { count: 4, .. })
        ));
    }
}
