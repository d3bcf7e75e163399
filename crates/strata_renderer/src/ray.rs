//! Light rays traced through the scene.

use strata_core::MaterialId;
use strata_math::Vec3;

/// What produced a ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RayKind {
    /// Primary ray leaving the camera
    #[default]
    Camera,
    /// Diffuse bounce
    Scattered,
    /// Mirror or glossy bounce
    Reflected,
    /// Transmission through a dielectric
    Refracted,
}

/// A ray with origin, direction, kind, carried material and bounce depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRay {
    /// Origin point of the ray
    pub origin: Vec3,
    /// Direction vector (not necessarily normalized)
    pub direction: Vec3,
    pub kind: RayKind,
    /// Material of the surface this ray left, if any
    pub material: Option<MaterialId>,
    /// Number of bounces since the camera
    pub depth: u32,
}

impl LightRay {
    /// Create a new ray.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3, kind: RayKind) -> Self {
        Self {
            origin,
            direction,
            kind,
            material: None,
            depth: 0,
        }
    }

    /// Create a primary camera ray.
    #[inline]
    pub fn camera(origin: Vec3, direction: Vec3) -> Self {
        Self::new(origin, direction, RayKind::Camera)
    }

    /// Continue a path: the new ray carries `material` and is one bounce deeper
    /// than `parent`.
    #[inline]
    pub fn bounce(
        parent: &LightRay,
        origin: Vec3,
        direction: Vec3,
        kind: RayKind,
        material: MaterialId,
    ) -> Self {
        Self {
            origin,
            direction,
            kind,
            material: Some(material),
            depth: parent.depth + 1,
        }
    }

    /// Compute a point along the ray at parameter t.
    /// P(t) = origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }
}

impl Default for LightRay {
    fn default() -> Self {
        Self::camera(Vec3::ZERO, Vec3::Z)
    }
}
