//! Reflection, refraction and Fresnel helpers shared by the shading code.

use crate::Vec3;

/// Reflect `v` about the normal `n`.
///
/// Returns: v - 2 (v . n) n
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract `incident` through a surface with normal `n` using Snell's law.
///
/// `ni_over_nt` is the ratio of the indices of refraction on the incident
/// and transmitted sides. The incident direction is normalized first.
/// Returns `None` when the discriminant is not positive (total internal
/// reflection).
pub fn refract(incident: Vec3, n: Vec3, ni_over_nt: f32) -> Option<Vec3> {
    let uv = incident.normalize();
    let dt = uv.dot(n);
    let discriminant = 1.0 - ni_over_nt * ni_over_nt * (1.0 - dt * dt);
    if discriminant > 0.0 {
        Some(ni_over_nt * (uv - n * dt) - n * discriminant.sqrt())
    } else {
        None
    }
}

/// Schlick's approximation of Fresnel reflectance.
///
/// r0 = ((1 - ior) / (1 + ior))^2, R(cos) = r0 + (1 - r0)(1 - cos)^5
#[inline]
pub fn schlick(cosine: f32, ior: f32) -> f32 {
    let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
