//! Resource arenas and the typed handles that reference into them.
//!
//! The scene owns every resource exactly once, in index-stable vectors.
//! Sharing (many materials over one shader or texture) happens through the
//! handle types, never through reference counting, so teardown order is
//! simply the arena drop order.

use crate::gfx::geometry::Geometry;
use crate::gfx::material::Material;
use crate::gfx::shader::Shader;
use crate::gfx::texture::{CubeMap, Texture};

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) usize);
    };
}

arena_id!(ShaderId);
arena_id!(TextureId);
arena_id!(CubeMapId);
arena_id!(GeometryId);
arena_id!(MaterialId);
arena_id!(MeshId);

/// A render unit: exactly one geometry paired with exactly one material.
/// Carries no transform of its own; objects position it.
#[derive(Debug, Clone, Copy)]
pub struct Mesh {
    pub geometry: GeometryId,
    pub material: MaterialId,
}

/// Everything the scene owns, keyed by the id types above.
#[derive(Default)]
pub struct SceneResources {
    shaders: Vec<Shader>,
    textures: Vec<Texture>,
    cube_maps: Vec<CubeMap>,
    geometries: Vec<Geometry>,
    materials: Vec<Material>,
    meshes: Vec<Mesh>,
}

impl SceneResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_shader(&mut self, shader: Shader) -> ShaderId {
        self.shaders.push(shader);
        ShaderId(self.shaders.len() - 1)
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.push(texture);
        TextureId(self.textures.len() - 1)
    }

    pub fn add_cube_map(&mut self, cube_map: CubeMap) -> CubeMapId {
        self.cube_maps.push(cube_map);
        CubeMapId(self.cube_maps.len() - 1)
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn shader(&self, id: ShaderId) -> &Shader {
        &self.shaders[id.0]
    }

    pub fn texture(&self, id: TextureId) -> &Texture {
        &self.textures[id.0]
    }

    pub fn cube_map(&self, id: CubeMapId) -> &CubeMap {
        &self.cube_maps[id.0]
    }

    pub fn geometry(&self, id: GeometryId) -> &Geometry {
        &self.geometries[id.0]
    }

    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.meshes[id.0]
    }

    /// Shader driving the given mesh, resolved through its material.
    pub fn mesh_shader(&self, id: MeshId) -> &Shader {
        self.shader(self.material(self.mesh(id).material).shader)
    }

    pub fn triangle_count(&self) -> usize {
        self.geometries.iter().map(Geometry::triangle_count).sum()
    }
}
