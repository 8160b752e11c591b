//! Shape templates shared by every body instance of an asset
//!
//! A [`BodySetup`] is read-only once built. Bodies turn it into concrete shapes
//! for their own scale through [`BodySetup::shape_templates`], choosing the
//! mirrored hulls and meshes when the scale has a negative determinant.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Pose, Quat, Translation3, Vec3};
use super::collision::{ConvexMesh, ShapeGeometry, TriMesh};
use super::material::PhysicalMaterial;

/// How simple and complex geometry answer traces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollisionTraceFlag {
    /// Simple shapes answer simple traces, the triangle mesh answers complex ones
    #[default]
    Default,
    /// Simple shapes answer both; no triangle mesh is created
    SimpleAsComplex,
    /// The triangle mesh answers both; no simple shapes are created
    ComplexAsSimple,
}

/// Physics behavior requested by the template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PhysicsType {
    /// Follow the owner's setting
    #[default]
    Default,
    /// Always kinematic
    Kinematic,
    /// Always simulated
    Simulated,
}

/// Per-body response override used by multi-body owners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BodyCollisionResponse {
    /// Block everything before clamping to the owner's responses
    Enabled,
    /// Ignore everything
    Disabled,
    /// Use the owner's responses unchanged
    #[default]
    Default,
}

/// Sphere element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereElem {
    /// Center in body space
    pub center: Vec3,
    /// Radius
    pub radius: f32,
}

/// Box element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxElem {
    /// Center in body space
    pub center: Vec3,
    /// Orientation in body space
    pub rotation: Quat,
    /// Half size per axis
    pub half_extents: Vec3,
}

/// Capsule element along its local Z
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleElem {
    /// Center in body space
    pub center: Vec3,
    /// Orientation in body space
    pub rotation: Quat,
    /// Radius
    pub radius: f32,
    /// Half length of the cylinder part
    pub half_height: f32,
}

/// Convex element with its pre-baked mirrored hull
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexElem {
    /// Hull in body space
    pub mesh: Arc<ConvexMesh>,
    /// The hull with X negated
    pub mirrored: Arc<ConvexMesh>,
}

impl ConvexElem {
    /// Cook both hull variants
    pub fn new(mesh: ConvexMesh) -> Self {
        let mirrored = Arc::new(mesh.mirrored_x());
        Self {
            mesh: Arc::new(mesh),
            mirrored,
        }
    }
}

/// Which template element a shape was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeSource {
    /// Index into the sphere elements
    Sphere(usize),
    /// Index into the box elements
    Box(usize),
    /// Index into the capsule elements
    Capsule(usize),
    /// Index into the convex elements
    Convex(usize),
    /// The triangle mesh
    TriMesh,
}

/// A shape ready to be attached to an actor
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeTemplate {
    /// Scaled geometry
    pub geometry: ShapeGeometry,
    /// Pose relative to the actor
    pub local_pose: Pose,
    /// Template element it came from
    pub source: ShapeSource,
}

/// Template describing a body's collision geometry and defaults
#[derive(Debug, Clone)]
pub struct BodySetup {
    /// Bone or debug name
    pub name: String,
    /// Sphere elements
    pub spheres: Vec<SphereElem>,
    /// Box elements
    pub boxes: Vec<BoxElem>,
    /// Capsule elements
    pub capsules: Vec<CapsuleElem>,
    /// Convex elements
    pub convexes: Vec<ConvexElem>,
    /// Complex collision mesh
    pub tri_mesh: Option<Arc<TriMesh>>,
    /// Complex collision mesh with X negated
    pub tri_mesh_mirrored: Option<Arc<TriMesh>>,
    /// How simple and complex geometry answer traces
    pub collision_trace_flag: CollisionTraceFlag,
    /// Template physical material
    pub phys_material: Option<Arc<PhysicalMaterial>>,
    /// Requested physics behavior
    pub physics_type: PhysicsType,
    /// Per-body response override for multi-body owners
    pub collision_response: BodyCollisionResponse,
    /// Mirrored geometry was generated
    pub generate_mirrored_collision: bool,
    /// Non-mirrored geometry was generated
    pub generate_non_mirrored_collision: bool,
    /// Only created where server-only bodies are allowed
    pub server_only: bool,
}

impl Default for BodySetup {
    fn default() -> Self {
        Self::new("")
    }
}

impl BodySetup {
    /// Empty template
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spheres: Vec::new(),
            boxes: Vec::new(),
            capsules: Vec::new(),
            convexes: Vec::new(),
            tri_mesh: None,
            tri_mesh_mirrored: None,
            collision_trace_flag: CollisionTraceFlag::Default,
            phys_material: None,
            physics_type: PhysicsType::Default,
            collision_response: BodyCollisionResponse::Default,
            generate_mirrored_collision: true,
            generate_non_mirrored_collision: true,
            server_only: false,
        }
    }

    /// Add a sphere
    #[must_use]
    pub fn with_sphere(mut self, center: Vec3, radius: f32) -> Self {
        self.spheres.push(SphereElem { center, radius });
        self
    }

    /// Add an axis-aligned box
    #[must_use]
    pub fn with_box(mut self, center: Vec3, half_extents: Vec3) -> Self {
        self.boxes.push(BoxElem {
            center,
            rotation: Quat::identity(),
            half_extents,
        });
        self
    }

    /// Add a capsule along Z
    #[must_use]
    pub fn with_capsule(mut self, center: Vec3, radius: f32, half_height: f32) -> Self {
        self.capsules.push(CapsuleElem {
            center,
            rotation: Quat::identity(),
            radius,
            half_height,
        });
        self
    }

    /// Add a convex hull
    #[must_use]
    pub fn with_convex(mut self, mesh: ConvexMesh) -> Self {
        self.convexes.push(ConvexElem::new(mesh));
        self
    }

    /// Set the complex collision mesh
    #[must_use]
    pub fn with_tri_mesh(mut self, mesh: TriMesh) -> Self {
        self.tri_mesh_mirrored = Some(Arc::new(mesh.mirrored_x()));
        self.tri_mesh = Some(Arc::new(mesh));
        self
    }

    /// Set the trace flag
    #[must_use]
    pub fn with_trace_flag(mut self, flag: CollisionTraceFlag) -> Self {
        self.collision_trace_flag = flag;
        self
    }

    /// Set the template material
    #[must_use]
    pub fn with_material(mut self, material: Arc<PhysicalMaterial>) -> Self {
        self.phys_material = Some(material);
        self
    }

    /// Set the per-body response override
    #[must_use]
    pub fn with_collision_response(mut self, response: BodyCollisionResponse) -> Self {
        self.collision_response = response;
        self
    }

    /// Number of simple elements
    pub fn simple_element_count(&self) -> usize {
        self.spheres.len() + self.boxes.len() + self.capsules.len() + self.convexes.len()
    }

    /// Shapes for a body with the given signed scale.
    ///
    /// Invalid elements are logged and skipped; the caller decides what an
    /// empty result means.
    pub fn shape_templates(&self, scale: &Vec3) -> Vec<ShapeTemplate> {
        let mut out = Vec::new();

        if self.collision_trace_flag != CollisionTraceFlag::ComplexAsSimple {
            let sources = (0..self.spheres.len())
                .map(ShapeSource::Sphere)
                .chain((0..self.boxes.len()).map(ShapeSource::Box))
                .chain((0..self.capsules.len()).map(ShapeSource::Capsule))
                .chain((0..self.convexes.len()).map(ShapeSource::Convex));
            out.extend(sources.filter_map(|source| self.shape_template(source, scale)));
        }

        if self.collision_trace_flag != CollisionTraceFlag::SimpleAsComplex && self.tri_mesh.is_some() {
            out.extend(self.shape_template(ShapeSource::TriMesh, scale));
        }

        out
    }

    /// Build one shape from a template element at the given signed scale
    pub fn shape_template(&self, source: ShapeSource, scale: &Vec3) -> Option<ShapeTemplate> {
        let abs_scale = scale.abs();
        let (geometry, local_pose) = match source {
            ShapeSource::Sphere(i) => {
                let elem = self.spheres.get(i)?;
                let geometry = ShapeGeometry::Sphere {
                    radius: elem.radius * abs_scale.min(),
                };
                (geometry, translation(elem.center.component_mul(scale)))
            }
            ShapeSource::Box(i) => {
                let elem = self.boxes.get(i)?;
                let geometry = ShapeGeometry::Box {
                    half_extents: elem.half_extents.component_mul(&abs_scale),
                };
                (geometry, Pose::from_parts(Translation3::from(elem.center.component_mul(scale)), elem.rotation))
            }
            ShapeSource::Capsule(i) => {
                let elem = self.capsules.get(i)?;
                let geometry = ShapeGeometry::Capsule {
                    radius: elem.radius * abs_scale.x.max(abs_scale.y),
                    half_height: elem.half_height * abs_scale.z,
                };
                (geometry, Pose::from_parts(Translation3::from(elem.center.component_mul(scale)), elem.rotation))
            }
            ShapeSource::Convex(i) => {
                let elem = self.convexes.get(i)?;
                let (rotation, use_mirrored) = utils::mirror_compensation(scale);
                let mesh = if use_mirrored { &elem.mirrored } else { &elem.mesh };
                let geometry = ShapeGeometry::Convex {
                    mesh: Arc::clone(mesh),
                    scale: abs_scale,
                };
                (geometry, Pose::from_parts(Translation3::identity(), rotation))
            }
            ShapeSource::TriMesh => {
                let (rotation, use_mirrored) = utils::mirror_compensation(scale);
                let mesh = if use_mirrored {
                    self.tri_mesh_mirrored.as_ref()?
                } else {
                    self.tri_mesh.as_ref()?
                };
                let geometry = ShapeGeometry::TriangleMesh {
                    mesh: Arc::clone(mesh),
                    scale: abs_scale,
                };
                (geometry, Pose::from_parts(Translation3::identity(), rotation))
            }
        };

        if !geometry.is_valid() {
            log::debug!(
                "Skipping invalid {} shape in body setup '{}'",
                geometry.type_name(),
                self.name
            );
            return None;
        }

        Some(ShapeTemplate {
            geometry,
            local_pose,
            source,
        })
    }
}

fn translation(offset: Vec3) -> Pose {
    Pose::from_parts(Translation3::from(offset), Quat::identity())
}
