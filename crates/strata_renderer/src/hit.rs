//! Intersection records and the intersection contract.

use strata_core::{MaterialId, PolygonId};
use strata_math::{Vec2, Vec3};

use crate::LightRay;

/// Record of a ray-surface intersection.
///
/// Produced by an [`Intersector`] for every ray cast and consumed by the
/// shading code. Nothing holds on to it past the current bounce.
#[derive(Debug, Clone, Copy)]
pub struct HitRecord {
    /// Point of intersection
    pub point: Vec3,
    /// Surface normal at the hit point (unit length)
    pub normal: Vec3,
    /// The ray that produced this hit
    pub incident: LightRay,
    /// Barycentric coordinates (u, v) inside the hit polygon
    pub uv: Vec2,
    /// Distance along the incident ray
    pub t: f32,
    /// Material at the intersection point
    pub material: MaterialId,
    /// Polygon that was hit, if the surface is a mesh
    pub polygon: Option<PolygonId>,
}

impl HitRecord {
    /// Create a hit record for a surface without polygon data.
    pub fn new(incident: LightRay, t: f32, normal: Vec3, material: MaterialId) -> Self {
        Self {
            point: incident.at(t),
            normal,
            incident,
            uv: Vec2::ZERO,
            t,
            material,
            polygon: None,
        }
    }

    /// Attach the polygon and barycentric coordinates of a mesh hit.
    pub fn with_polygon(mut self, polygon: PolygonId, uv: Vec2) -> Self {
        self.polygon = Some(polygon);
        self.uv = uv;
        self
    }
}

/// Anything that can answer "what does this ray hit first".
///
/// Acceleration structures and primitive tests live behind this trait.
pub trait Intersector: Send + Sync {
    /// Closest intersection along `ray`, or `None` if it escapes.
    fn intersect(&self, ray: &LightRay) -> Option<HitRecord>;
}
