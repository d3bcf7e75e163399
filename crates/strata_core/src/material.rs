//! Surface materials.
//!
//! A material's kind selects its scattering behavior. The set of kinds is
//! closed; the kind is fixed by the time the material is added to a
//! [`SceneContext`](crate::SceneContext) and cannot change afterwards.

use crate::scene::TextureId;
use crate::Color;

/// The closed set of surface kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialKind {
    /// Ideal diffuse reflector
    #[default]
    Lambertian,
    /// Mirror-like reflector with optional roughness
    Metal,
    /// Light emitter, never scatters
    Emission,
    /// Dielectric that both reflects and refracts
    Glass,
}

impl MaterialKind {
    /// Look up a kind by name as found in scene descriptions.
    ///
    /// Unknown names fall back to [`MaterialKind::Lambertian`].
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "lambertian" | "diffuse" => Self::Lambertian,
            "metal" => Self::Metal,
            "emission" | "emissive" => Self::Emission,
            "glass" | "dielectric" => Self::Glass,
            other => {
                log::warn!("Unknown material type '{}', using lambertian", other);
                Self::Lambertian
            }
        }
    }
}

/// A surface material definition.
#[derive(Clone, Debug)]
pub struct Material {
    /// Material name (used for lookups at scene-build time)
    pub name: String,

    /// Diffuse/albedo color (linear RGB)
    pub diffuse: Color,

    /// Ambient color
    pub ambient: Color,

    /// Specular color
    pub specular: Color,

    /// Emitted radiance for emission materials
    pub emission: Color,

    pub reflectivity: f32,
    pub refractivity: f32,

    /// Index of refraction (1.0 = air, 1.5 = glass)
    pub ior: f32,

    pub transparency: f32,
    pub sharpness: f32,
    pub glossiness: f32,

    /// Roughness: 0 = perfect mirror/clear glass, larger values fuzz the lobe
    pub roughness: f32,

    /// Diffuse texture, sampled through the polygon's texture coordinates
    pub texture: Option<TextureId>,

    kind: MaterialKind,
}

impl Default for Material {
    /// Gray lambertian with unit reflectivity and an IOR of 1.
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse: Color::new(0.5, 0.5, 0.5),
            ambient: Color::ZERO,
            specular: Color::ZERO,
            emission: Color::ZERO,
            reflectivity: 1.0,
            refractivity: 0.0,
            ior: 1.0,
            transparency: 0.0,
            sharpness: 0.0,
            glossiness: 0.0,
            roughness: 0.0,
            texture: None,
            kind: MaterialKind::Lambertian,
        }
    }
}

impl Material {
    /// Create a lambertian material with a name, diffuse color and reflectivity.
    pub fn new(name: impl Into<String>, diffuse: Color, reflectivity: f32) -> Self {
        Self {
            name: name.into(),
            diffuse,
            reflectivity,
            ..Default::default()
        }
    }

    /// Bright magenta lambertian, used where a material could not be found.
    pub fn warning() -> Self {
        Self {
            name: "warning".to_string(),
            diffuse: Color::new(1.0, 0.0, 0.5),
            reflectivity: 0.0,
            ..Default::default()
        }
    }

    /// Set the surface kind.
    pub fn with_kind(mut self, kind: MaterialKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the surface kind from a scene-description name.
    pub fn with_kind_name(self, name: &str) -> Self {
        self.with_kind(MaterialKind::from_name(name))
    }

    pub fn with_ior(mut self, ior: f32) -> Self {
        self.ior = ior;
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.max(0.0);
        self
    }

    pub fn with_emission(mut self, emission: Color) -> Self {
        self.emission = emission;
        self
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    /// The surface kind this material scatters as.
    #[inline]
    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    /// Check if this material uses a texture.
    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    /// Check if this material is emissive.
    pub fn is_emissive(&self) -> bool {
        self.kind == MaterialKind::Emission
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_name() {
        assert_eq!(MaterialKind::from_name("metal"), MaterialKind::Metal);
        assert_eq!(MaterialKind::from_name("Glass"), MaterialKind::Glass);
        assert_eq!(MaterialKind::from_name("emission"), MaterialKind::Emission);
        assert_eq!(MaterialKind::from_name("lambertian"), MaterialKind::Lambertian);
    }

    #[test]
    fn test_unknown_kind_falls_back_to_lambertian() {
        assert_eq!(MaterialKind::from_name("velvet"), MaterialKind::Lambertian);
        let mat = Material::default().with_kind_name("subsurface");
        assert_eq!(mat.kind(), MaterialKind::Lambertian);
    }

    #[test]
    fn test_default_material() {
        let mat = Material::default();
        assert_eq!(mat.kind(), MaterialKind::Lambertian);
        assert_eq!(mat.reflectivity, 1.0);
        assert_eq!(mat.ior, 1.0);
        assert!(!mat.has_texture());
    }

    #[test]
    fn test_warning_material() {
        let mat = Material::warning();
        assert_eq!(mat.diffuse, Color::new(1.0, 0.0, 0.5));
        assert_eq!(mat.kind(), MaterialKind::Lambertian);
    }
}
