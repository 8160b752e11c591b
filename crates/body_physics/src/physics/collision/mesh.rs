//! Cooked mesh data shared between body setups and shapes
//!
//! Meshes are stored in model space and never modified. A shape references a
//! mesh through an `Arc` together with a per-shape scale, so rescaling a body
//! never touches the mesh itself. Each setup keeps an X-mirrored copy for
//! transforms with a negative determinant.

use crate::foundation::math::Vec3;
use super::primitives::Triangle;

/// Convex hull: vertices plus outward-wound triangular faces
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexMesh {
    /// Hull vertices in model space
    pub vertices: Vec<Vec3>,
    /// Triangulated hull faces, counter-clockwise seen from outside
    pub faces: Vec<[u32; 3]>,
}

impl ConvexMesh {
    /// Build from vertices and faces
    pub fn new(vertices: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Axis-aligned box hull, handy for tests and tools
    pub fn cuboid(half_extents: Vec3) -> Self {
        let h = half_extents;
        let vertices = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        let faces = vec![
            [0, 2, 1], [0, 3, 2], // -Z
            [4, 5, 6], [4, 6, 7], // +Z
            [0, 1, 5], [0, 5, 4], // -Y
            [3, 7, 6], [3, 6, 2], // +Y
            [0, 4, 7], [0, 7, 3], // -X
            [1, 2, 6], [1, 6, 5], // +X
        ];
        Self { vertices, faces }
    }

    /// Copy with X negated and winding flipped so faces stay outward
    #[must_use]
    pub fn mirrored_x(&self) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| Vec3::new(-v.x, v.y, v.z)).collect(),
            faces: self.faces.iter().map(|[a, b, c]| [*a, *c, *b]).collect(),
        }
    }

    /// Vertices scaled component-wise
    pub fn scaled_vertices(&self, scale: &Vec3) -> Vec<Vec3> {
        self.vertices.iter().map(|v| v.component_mul(scale)).collect()
    }

    /// Faces as scaled triangles
    pub fn scaled_faces<'a>(&'a self, scale: &'a Vec3) -> impl Iterator<Item = Triangle> + 'a {
        self.faces.iter().filter_map(move |face| {
            let v = |i: u32| self.vertices.get(i as usize).map(|p| p.component_mul(scale));
            Some(Triangle::new(v(face[0])?, v(face[1])?, v(face[2])?))
        })
    }

    /// Approximate heap size
    pub fn memory_size(&self) -> usize {
        self.vertices.len() * std::mem::size_of::<Vec3>() + self.faces.len() * std::mem::size_of::<[u32; 3]>()
    }
}

/// Triangle mesh used for complex (per-poly) collision
#[derive(Debug, Clone, PartialEq)]
pub struct TriMesh {
    /// Vertices in model space
    pub vertices: Vec<Vec3>,
    /// Triangle indices
    pub triangles: Vec<[u32; 3]>,
    /// Optional material slot per triangle
    pub material_indices: Vec<u16>,
}

impl TriMesh {
    /// Build a mesh without per-face materials
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
            material_indices: Vec::new(),
        }
    }

    /// Attach per-triangle material slots
    #[must_use]
    pub fn with_material_indices(mut self, material_indices: Vec<u16>) -> Self {
        self.material_indices = material_indices;
        self
    }

    /// Copy with X negated and winding flipped
    #[must_use]
    pub fn mirrored_x(&self) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| Vec3::new(-v.x, v.y, v.z)).collect(),
            triangles: self.triangles.iter().map(|[a, b, c]| [*a, *c, *b]).collect(),
            material_indices: self.material_indices.clone(),
        }
    }

    /// Material slot of triangle `face`, defaulting to slot 0
    pub fn material_index(&self, face: usize) -> usize {
        self.material_indices.get(face).map_or(0, |&slot| usize::from(slot))
    }

    /// Triangles in model space scaled component-wise, with their face index
    pub fn scaled_triangles<'a>(&'a self, scale: &'a Vec3) -> impl Iterator<Item = (usize, Triangle)> + 'a {
        self.triangles.iter().enumerate().filter_map(move |(face, tri)| {
            let v = |i: u32| self.vertices.get(i as usize).map(|p| p.component_mul(scale));
            Some((face, Triangle::new(v(tri[0])?, v(tri[1])?, v(tri[2])?)))
        })
    }

    /// Approximate heap size
    pub fn memory_size(&self) -> usize {
        self.vertices.len() * std::mem::size_of::<Vec3>()
            + self.triangles.len() * std::mem::size_of::<[u32; 3]>()
            + self.material_indices.len() * std::mem::size_of::<u16>()
    }
}
