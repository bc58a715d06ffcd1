/// Geometry primitives and the mesh provider interface used by the shaders
use std::path::Path;

use nalgebra::{Point3, Vector2, Vector3};

use crate::error::{Error, Result};
use crate::framebuffer::Color;
use crate::texture::Texture;

/// A 3D vertex with position, normal and texture coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, uv: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Unnormalized face normal; its length is twice the triangle's area
pub fn face_normal(a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> Vector3<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    edge1.cross(&edge2)
}

/// Read access to triangle geometry, addressed per face corner.
///
/// `corner` is always 0, 1 or 2.
pub trait Geometry {
    fn vertex_count(&self) -> usize;
    fn face_count(&self) -> usize;
    fn position(&self, face: usize, corner: usize) -> Point3<f32>;
    fn normal(&self, face: usize, corner: usize) -> Vector3<f32>;

    fn uv(&self, _face: usize, _corner: usize) -> Vector2<f32> {
        Vector2::zeros()
    }

    /// Position by vertex index, for whole-mesh queries like bounding boxes
    fn vertex_position(&self, index: usize) -> Point3<f32>;

    fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points((0..self.vertex_count()).map(|i| self.vertex_position(i)))
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// Returns `None` for an empty iterator
    pub fn from_points(points: impl IntoIterator<Item = Point3<f32>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Aabb { min: first, max: first }, |b, p| Aabb {
            min: b.min.inf(&p),
            max: b.max.sup(&p),
        }))
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

/// An indexed triangle mesh with an optional diffuse map
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<[usize; 3]>,
    pub diffuse: Option<Texture>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            faces: Vec::with_capacity(faces),
            diffuse: None,
        }
    }

    /// Append a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    /// Append a face. Every index must already refer to a vertex.
    pub fn add_face(&mut self, face: [usize; 3]) {
        debug_assert!(face.iter().all(|&i| i < self.vertices.len()));
        self.faces.push(face);
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn with_diffuse(mut self, texture: Texture) -> Self {
        self.diffuse = Some(texture);
        self
    }

    /// Diffuse color at `uv`; white when the mesh has no texture
    pub fn diffuse_sample(&self, uv: &Vector2<f32>) -> Color {
        self.diffuse.as_ref().map_or(Color::WHITE, |t| t.sample(uv))
    }

    /// Replace the normals of the selected vertices with area-weighted averages
    /// of the normals of the faces that use them.
    pub fn smooth_normals(&mut self, selected: &[bool]) {
        let mut sums = vec![Vector3::zeros(); self.vertices.len()];
        for face in &self.faces {
            let [a, b, c] = face.map(|i| self.vertices[i].position);
            let n = face_normal(&a, &b, &c);
            for &i in face {
                sums[i] += n;
            }
        }
        for (i, vertex) in self.vertices.iter_mut().enumerate() {
            if selected.get(i).copied().unwrap_or(false) {
                vertex.normal = sums[i].try_normalize(f32::EPSILON).unwrap_or_else(Vector3::z);
            }
        }
    }

    /// Load a mesh, choosing the parser from the file extension.
    ///
    /// For OBJ files a sibling `<stem>_diffuse.tga` is loaded as the diffuse map
    /// when it exists.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let mesh = match extension.as_deref() {
            Some("stl") => {
                let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;
                crate::stl::parse_stl(&data)?
            }
            _ => {
                let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
                let mesh = crate::obj::parse_obj(&text)?;
                match diffuse_path(path) {
                    Some(texture_path) if texture_path.exists() => {
                        mesh.with_diffuse(Texture::load(&texture_path)?)
                    }
                    _ => {
                        log::warn!(
                            "no diffuse texture next to {}, shading untextured",
                            path.display()
                        );
                        mesh
                    }
                }
            }
        };

        log::info!(
            "loaded {}: {} vertices, {} faces",
            path.display(),
            mesh.vertices.len(),
            mesh.faces.len()
        );
        Ok(mesh)
    }
}

fn diffuse_path(mesh_path: &Path) -> Option<std::path::PathBuf> {
    let stem = mesh_path.file_stem()?.to_str()?;
    Some(mesh_path.with_file_name(format!("{}_diffuse.tga", stem)))
}

impl Geometry for Mesh {
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn position(&self, face: usize, corner: usize) -> Point3<f32> {
        self.vertices[self.faces[face][corner]].position
    }

    fn normal(&self, face: usize, corner: usize) -> Vector3<f32> {
        self.vertices[self.faces[face][corner]].normal
    }

    fn uv(&self, face: usize, corner: usize) -> Vector2<f32> {
        self.vertices[self.faces[face][corner]].uv
    }

    fn vertex_position(&self, index: usize) -> Point3<f32> {
        self.vertices[index].position
    }
}

/// Unit cube centered at the origin with flat per-side normals.
///
/// Faces come in pairs, one pair per side, in the order -Z, +X, +Z, -X, +Y, -Y.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitCube;

impl UnitCube {
    const CORNERS: [[f32; 3]; 8] = [
        [-0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5],
        [0.5, 0.5, -0.5],
        [-0.5, 0.5, -0.5],
        [-0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5],
        [0.5, 0.5, 0.5],
        [-0.5, 0.5, 0.5],
    ];

    const FACES: [[usize; 3]; 12] = [
        [0, 1, 2],
        [0, 2, 3],
        [1, 5, 6],
        [1, 6, 2],
        [5, 4, 7],
        [5, 7, 6],
        [4, 0, 3],
        [4, 3, 7],
        [3, 2, 6],
        [3, 6, 7],
        [4, 5, 1],
        [4, 1, 0],
    ];

    const SIDE_NORMALS: [[f32; 3]; 6] = [
        [0.0, 0.0, -1.0],
        [1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0],
        [-1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];
}

impl Geometry for UnitCube {
    fn vertex_count(&self) -> usize {
        Self::CORNERS.len()
    }

    fn face_count(&self) -> usize {
        Self::FACES.len()
    }

    fn position(&self, face: usize, corner: usize) -> Point3<f32> {
        self.vertex_position(Self::FACES[face][corner])
    }

    fn normal(&self, face: usize, _corner: usize) -> Vector3<f32> {
        Vector3::from(Self::SIDE_NORMALS[face / 2])
    }

    fn vertex_position(&self, index: usize) -> Point3<f32> {
        Point3::from(Self::CORNERS[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_normals_point_outwards() {
        let cube = UnitCube;
        for face in 0..cube.face_count() {
            let normal = cube.normal(face, 0);
            for corner in 0..3 {
                // Every corner of a side lies half a unit along that side's normal
                let p = cube.position(face, corner);
                assert!((p.coords.dot(&normal) - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_bounding_box() {
        let bounds = UnitCube.bounding_box().unwrap();
        assert_eq!(bounds.min, Point3::new(-0.5, -0.5, -0.5));
        assert_eq!(bounds.size(), Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(bounds.center(), Point3::origin());

        assert!(Mesh::new().bounding_box().is_none());
    }

    #[test]
    fn test_smooth_normals() {
        let mut mesh = Mesh::new();
        let uv = Vector2::zeros();
        let a = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, 0.0), Vector3::zeros(), uv));
        let b = mesh.add_vertex(Vertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::zeros(), uv));
        let c = mesh.add_vertex(Vertex::new(Point3::new(0.0, 1.0, 0.0), Vector3::zeros(), uv));
        mesh.add_face([a, b, c]);

        mesh.smooth_normals(&[true, true, false]);
        assert_eq!(mesh.vertices[a].normal, Vector3::z());
        assert_eq!(mesh.vertices[b].normal, Vector3::z());
        assert_eq!(mesh.vertices[c].normal, Vector3::zeros());
    }

    #[test]
    fn test_load_obj_with_diffuse_texture() {
        let dir = tempfile::tempdir().unwrap();
        let obj_path = dir.path().join("tri.obj");
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.5 0.5\nf 1/1 2/1 3/1\n";
        std::fs::write(&obj_path, source).unwrap();
        let texture = image::RgbImage::from_pixel(2, 2, image::Rgb([40, 80, 120]));
        texture.save(dir.path().join("tri_diffuse.tga")).unwrap();

        let mesh = Mesh::load(&obj_path).unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert!(mesh.diffuse.is_some());
        assert_eq!(mesh.diffuse_sample(&mesh.uv(0, 0)), Color::rgb(40, 80, 120));
    }

    #[test]
    fn test_load_picks_parser_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let stl_path = dir.path().join("empty.STL");
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&0u32.to_le_bytes());
        std::fs::write(&stl_path, data).unwrap();

        let mesh = Mesh::load(&stl_path).unwrap();
        assert!(mesh.is_empty());
        assert!(mesh.diffuse.is_none());

        match Mesh::load(dir.path().join("missing.obj")) {
            Err(Error::Io { path, .. }) => assert!(path.ends_with("missing.obj")),
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[test]
    fn test_untextured_mesh_samples_white() {
        assert_eq!(Mesh::new().diffuse_sample(&Vector2::new(0.3, 0.3)), Color::WHITE);
    }
}
