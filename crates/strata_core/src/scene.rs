//! Scene context owning all geometry, materials and textures.
//!
//! Everything the renderer indexes while shading lives here and is
//! addressed by small copyable handles. The context is built once, then
//! shared by reference with every worker thread.

use std::collections::HashSet;

use strata_math::{Mat4, Vec2, Vec3};

use crate::{Material, Texture};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(usize);

        impl $name {
            /// Position of the referenced item in its owning array.
            #[inline]
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

handle!(
    /// Handle to a [`Material`] in a [`SceneContext`].
    MaterialId
);
handle!(
    /// Handle to a [`Texture`] in a [`SceneContext`].
    TextureId
);
handle!(
    /// Handle to a [`Polygon`] in a [`SceneContext`].
    PolygonId
);
handle!(
    /// Handle to a [`Mesh`] in a [`SceneContext`].
    MeshId
);

/// A triangle referencing shared vertex data by index.
#[derive(Clone, Debug)]
pub struct Polygon {
    /// Indices into the vertex array
    pub vertices: [usize; 3],
    /// Indices into the normal array, if the source had normals
    pub normals: Option<[usize; 3]>,
    /// Indices into the texture coordinate array, if mapped
    pub tex_coords: Option<[usize; 3]>,
    pub material: MaterialId,
}

impl Polygon {
    pub fn new(vertices: [usize; 3], material: MaterialId) -> Self {
        Self {
            vertices,
            normals: None,
            tex_coords: None,
            material,
        }
    }

    pub fn with_tex_coords(mut self, tex_coords: [usize; 3]) -> Self {
        self.tex_coords = Some(tex_coords);
        self
    }

    pub fn with_normals(mut self, normals: [usize; 3]) -> Self {
        self.normals = Some(normals);
        self
    }
}

/// A named run of polygons with its own transform stack.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub first_polygon: usize,
    pub polygon_count: usize,
    /// Transforms applied in order by [`SceneContext::transform_mesh`]
    pub transforms: Vec<Mat4>,
    pub materials: Vec<MaterialId>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, first_polygon: usize, polygon_count: usize) -> Self {
        Self {
            name: name.into(),
            first_polygon,
            polygon_count,
            transforms: Vec::new(),
            materials: Vec::new(),
        }
    }

    /// Range of polygon indices owned by this mesh.
    pub fn polygon_range(&self) -> std::ops::Range<usize> {
        self.first_polygon..self.first_polygon + self.polygon_count
    }
}

/// Owned scene data shared read-only with the render threads.
#[derive(Default)]
pub struct SceneContext {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    tex_coords: Vec<Vec2>,
    polygons: Vec<Polygon>,
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    textures: Vec<Texture>,
}

impl SceneContext {
    /// Create an empty scene context.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, v: Vec3) -> usize {
        self.vertices.push(v);
        self.vertices.len() - 1
    }

    pub fn add_normal(&mut self, n: Vec3) -> usize {
        self.normals.push(n);
        self.normals.len() - 1
    }

    pub fn add_tex_coord(&mut self, uv: Vec2) -> usize {
        self.tex_coords.push(uv);
        self.tex_coords.len() - 1
    }

    pub fn add_polygon(&mut self, polygon: Polygon) -> PolygonId {
        self.polygons.push(polygon);
        PolygonId(self.polygons.len() - 1)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        log::debug!(
            "Added mesh '{}' ({} polygons)",
            mesh.name,
            mesh.polygon_count
        );
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        log::debug!("Added material '{}' ({:?})", material.name, material.kind());
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        log::debug!(
            "Added texture {}x{} ({:.1} KB)",
            texture.width,
            texture.height,
            texture.size_bytes() as f32 / 1024.0
        );
        self.textures.push(texture);
        TextureId(self.textures.len() - 1)
    }

    /// Handles are only produced by this context, so lookups index directly.
    #[inline]
    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    #[inline]
    pub fn texture(&self, id: TextureId) -> &Texture {
        &self.textures[id.0]
    }

    #[inline]
    pub fn polygon(&self, id: PolygonId) -> &Polygon {
        &self.polygons[id.0]
    }

    #[inline]
    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.meshes[id.0]
    }

    #[inline]
    pub fn vertex(&self, index: usize) -> Vec3 {
        self.vertices[index]
    }

    #[inline]
    pub fn normal(&self, index: usize) -> Vec3 {
        self.normals[index]
    }

    #[inline]
    pub fn tex_coord(&self, index: usize) -> Vec2 {
        self.tex_coords[index]
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Find a material by name. Linear scan, meant for scene building only.
    pub fn material_for_name(&self, name: &str) -> Option<MaterialId> {
        self.materials
            .iter()
            .position(|m| m.name == name)
            .map(MaterialId)
    }

    /// Append a transform to a mesh's transform stack.
    pub fn add_transform(&mut self, mesh: MeshId, transform: Mat4) {
        self.meshes[mesh.0].transforms.push(transform);
    }

    /// Apply a mesh's transforms, in order, to the vertices its polygons use.
    ///
    /// Vertices shared between polygons are moved once per transform.
    pub fn transform_mesh(&mut self, mesh: MeshId) {
        let mesh = &self.meshes[mesh.0];
        let used: HashSet<usize> = self.polygons[mesh.polygon_range()]
            .iter()
            .flat_map(|p| p.vertices)
            .collect();

        for transform in &mesh.transforms {
            for &index in &used {
                self.vertices[index] = transform.transform_point3(self.vertices[index]);
            }
        }

        log::debug!(
            "Transformed mesh '{}': {} vertices, {} transforms",
            mesh.name,
            used.len(),
            mesh.transforms.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, MaterialKind};

    #[test]
    fn test_material_for_name() {
        let mut scene = SceneContext::new();
        let red = scene.add_material(Material::new("red", Color::X, 1.0));
        let glass = scene.add_material(
            Material::new("glass", Color::ONE, 0.0).with_kind(MaterialKind::Glass),
        );

        assert_eq!(scene.material_for_name("red"), Some(red));
        assert_eq!(scene.material_for_name("glass"), Some(glass));
        assert_eq!(scene.material_for_name("missing"), None);
        assert_eq!(scene.material(glass).kind(), MaterialKind::Glass);
    }

    #[test]
    fn test_transform_shared_vertices_once() {
        let mut scene = SceneContext::new();
        let mat = scene.add_material(Material::default());

        // Two triangles sharing an edge
        let a = scene.add_vertex(Vec3::ZERO);
        let b = scene.add_vertex(Vec3::X);
        let c = scene.add_vertex(Vec3::Y);
        let d = scene.add_vertex(Vec3::new(1.0, 1.0, 0.0));
        // Not part of the mesh
        let outside = scene.add_vertex(Vec3::Z);

        scene.add_polygon(Polygon::new([a, b, c], mat));
        scene.add_polygon(Polygon::new([b, d, c], mat));

        let mesh = scene.add_mesh(Mesh::new("quad", 0, 2));
        scene.add_transform(mesh, Mat4::from_translation(Vec3::new(0.0, 0.0, 2.0)));
        scene.add_transform(mesh, Mat4::from_scale(Vec3::splat(2.0)));
        scene.transform_mesh(mesh);

        // Translate then scale: (x, y, z + 2) * 2
        assert_eq!(scene.vertex(a), Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(scene.vertex(b), Vec3::new(2.0, 0.0, 4.0));
        assert_eq!(scene.vertex(d), Vec3::new(2.0, 2.0, 4.0));
        assert_eq!(scene.vertex(outside), Vec3::Z);
    }

    #[test]
    fn test_handles_index_in_order() {
        let mut scene = SceneContext::new();
        let t0 = scene.add_texture(Texture::solid_color(Vec3::ONE));
        let t1 = scene.add_texture(Texture::solid_color(Vec3::ZERO));
        assert_eq!(t0.index(), 0);
        assert_eq!(t1.index(), 1);
        assert_eq!(scene.texture(t1).width, 1);
    }
}
