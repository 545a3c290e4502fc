//! Render-scene data model consumed by the renderer substrate.
//!
//! The engine owns scene structure: material records, mesh groups with an
//! orientation correction, visibility flags, and render order. Geometry
//! buffers stay behind opaque handles minted by the decoding backend; the
//! renderer walks this model each frame and resolves handles on its side.

mod aabb;

use glam::Mat4;

pub use aabb::Aabb;

/// Opaque geometry token minted by the render backend's decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u64);

/// Handle to a material record owned by a [`RenderScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(usize);

/// Handle to a mesh group owned by a [`RenderScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

// ---------------------------------------------------------------------------
// Material
// ---------------------------------------------------------------------------

/// Surface shading state for one loaded asset.
///
/// `color` is a CSS-style token (normalized `#RRGGBB`, or whatever the
/// backend passed through); parsing it is the renderer's job. Opacity and
/// the transparency flags are mutated by visibility control after the
/// initial record is created.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Display color token.
    pub color: String,
    /// Alpha in `[0, 1]`.
    pub opacity: f32,
    /// Whether the material renders on the translucent pass.
    pub transparent: bool,
    /// Whether the material writes the depth buffer.
    pub depth_write: bool,
    /// Whether the material tests against the depth buffer.
    pub depth_test: bool,
    /// Render both faces.
    pub double_sided: bool,
    /// Metalness factor in `[0, 1]`.
    pub metalness: f32,
    /// Roughness factor in `[0, 1]`.
    pub roughness: f32,
}

// ---------------------------------------------------------------------------
// Decoded objects and groups
// ---------------------------------------------------------------------------

/// One mesh of a decoded object: geometry token plus local bounds.
#[derive(Debug, Clone, Copy)]
pub struct RenderMesh {
    /// Backend geometry token.
    pub geometry: GeometryHandle,
    /// Local-space bounds of this mesh.
    pub bounds: Aabb,
}

/// A renderable object produced by a format decoder: a flat mesh list.
#[derive(Debug, Clone, Default)]
pub struct RenderObject {
    /// Meshes in decode order.
    pub meshes: Vec<RenderMesh>,
}

/// One mesh instance inside a group, with its material binding.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    /// Backend geometry token.
    pub geometry: GeometryHandle,
    /// Material record bound to this mesh.
    pub material: MaterialId,
    /// Local-space bounds of this mesh.
    pub bounds: Aabb,
    /// Compositing order; translucent groups are bumped above opaque ones.
    pub render_order: i32,
}

/// One loaded asset in the scene: a wrapper group holding the object's
/// meshes, a fixed rotation about X (orientation correction), and the
/// effective visibility flag.
#[derive(Debug, Clone)]
pub struct Group {
    /// Rotation about the X axis applied to the whole group, in radians.
    pub rotation_x: f32,
    /// Effective render visibility (folder AND item).
    pub visible: bool,
    /// Meshes with their material bindings.
    pub meshes: Vec<MeshInstance>,
}

impl Group {
    /// Bounds of all meshes before the group rotation.
    #[must_use]
    pub fn local_bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for mesh in &self.meshes {
            bounds.union(&mesh.bounds);
        }
        bounds
    }

    /// Bounds of all meshes after the group rotation.
    #[must_use]
    pub fn world_bounds(&self) -> Aabb {
        self.local_bounds()
            .transformed(&Mat4::from_rotation_x(self.rotation_x))
    }
}

// ---------------------------------------------------------------------------
// RenderScene
// ---------------------------------------------------------------------------

/// The authoritative render scene: flat material and group storage.
#[derive(Debug, Default)]
pub struct RenderScene {
    materials: Vec<Material>,
    groups: Vec<Group>,
}

impl RenderScene {
    /// Empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material record. Records are never removed within a session.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    /// Read access to a material.
    #[must_use]
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    /// Write access to a material.
    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    /// Wrap a decoded object in a group: bind `material` to every mesh,
    /// apply `rotation_x`, start visible.
    pub fn add_group(
        &mut self,
        object: RenderObject,
        material: MaterialId,
        rotation_x: f32,
    ) -> GroupId {
        let meshes = object
            .meshes
            .into_iter()
            .map(|mesh| MeshInstance {
                geometry: mesh.geometry,
                material,
                bounds: mesh.bounds,
                render_order: 0,
            })
            .collect();
        self.groups.push(Group {
            rotation_x,
            visible: true,
            meshes,
        });
        GroupId(self.groups.len() - 1)
    }

    /// Read access to a group.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0)
    }

    /// All groups in insertion order, for the renderer's frame walk.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Number of groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Set a group's effective visibility.
    pub fn set_group_visible(&mut self, id: GroupId, visible: bool) {
        if let Some(group) = self.groups.get_mut(id.0) {
            group.visible = visible;
        }
    }

    /// Set the render order of every mesh in a group.
    pub fn set_render_order(&mut self, id: GroupId, render_order: i32) {
        if let Some(group) = self.groups.get_mut(id.0) {
            for mesh in &mut group.meshes {
                mesh.render_order = render_order;
            }
        }
    }

    /// World bounds of a group (empty for unknown ids).
    #[must_use]
    pub fn world_bounds(&self, id: GroupId) -> Aabb {
        self.group(id).map_or(Aabb::EMPTY, Group::world_bounds)
    }
}
