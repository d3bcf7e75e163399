//! Single-bounce scattering for each material kind.
//!
//! Every routine maps an intersection to an attenuation color and a
//! scattered ray. Whether to follow that ray, and for how long, is up to
//! the caller.

use rand::RngCore;
use strata_core::{Color, Material, MaterialKind, SceneContext};
use strata_math::{reflect, refract, schlick, Vec3};

use crate::sampling::{gen_f32, random_in_unit_sphere};
use crate::texturing::diffuse_color;
use crate::{HitRecord, LightRay, RayKind};

/// Outcome of scattering a ray off a surface.
#[derive(Debug, Clone, Copy)]
pub struct ScatterResult {
    /// False when the path ends here (absorbed or emitted)
    pub continues: bool,
    /// Color the scattered radiance is multiplied by
    pub attenuation: Color,
    /// The outgoing ray
    pub scattered: LightRay,
}

impl ScatterResult {
    fn absorbed() -> Self {
        Self {
            continues: false,
            attenuation: Color::ZERO,
            scattered: LightRay::default(),
        }
    }
}

/// Scattering behavior, one variant per material kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bsdf {
    Lambertian,
    Metal,
    Emissive,
    Dielectric,
}

impl From<MaterialKind> for Bsdf {
    fn from(kind: MaterialKind) -> Self {
        match kind {
            MaterialKind::Lambertian => Bsdf::Lambertian,
            MaterialKind::Metal => Bsdf::Metal,
            MaterialKind::Emission => Bsdf::Emissive,
            MaterialKind::Glass => Bsdf::Dielectric,
        }
    }
}

impl Bsdf {
    /// The behavior bound to a material.
    #[inline]
    pub fn of(material: &Material) -> Self {
        material.kind().into()
    }

    /// Scatter `hit.incident` off the surface described by `hit`.
    pub fn scatter(self, scene: &SceneContext, hit: &HitRecord, rng: &mut dyn RngCore) -> ScatterResult {
        match self {
            Bsdf::Lambertian => lambertian(scene, hit, rng),
            Bsdf::Metal => metallic(scene, hit, rng),
            Bsdf::Emissive => ScatterResult::absorbed(),
            Bsdf::Dielectric => dielectric(scene, hit, rng),
        }
    }
}

/// Scatter a hit with the behavior of the material it landed on.
pub fn scatter(scene: &SceneContext, hit: &HitRecord, rng: &mut dyn RngCore) -> ScatterResult {
    Bsdf::of(scene.material(hit.material)).scatter(scene, hit, rng)
}

fn lambertian(scene: &SceneContext, hit: &HitRecord, rng: &mut dyn RngCore) -> ScatterResult {
    let target = hit.point + hit.normal + random_in_unit_sphere(rng);
    let direction = target - hit.point;

    ScatterResult {
        continues: true,
        attenuation: diffuse_color(scene, hit),
        scattered: LightRay::bounce(&hit.incident, hit.point, direction, RayKind::Scattered, hit.material),
    }
}

fn metallic(scene: &SceneContext, hit: &HitRecord, rng: &mut dyn RngCore) -> ScatterResult {
    let roughness = scene.material(hit.material).roughness;
    let mut reflected = reflect(hit.incident.direction.normalize(), hit.normal);
    if roughness > 0.0 {
        reflected += roughness * random_in_unit_sphere(rng);
    }

    // Reflections pointing into the surface are absorbed
    ScatterResult {
        continues: reflected.dot(hit.normal) > 0.0,
        attenuation: diffuse_color(scene, hit),
        scattered: LightRay::bounce(&hit.incident, hit.point, reflected, RayKind::Reflected, hit.material),
    }
}

fn dielectric(scene: &SceneContext, hit: &HitRecord, rng: &mut dyn RngCore) -> ScatterResult {
    let material = scene.material(hit.material);
    let ior = material.ior;
    let d = hit.incident.direction;
    let d_dot_n = d.dot(hit.normal);

    // Leaving the medium when the ray travels along the normal
    let (outward_normal, ni_over_nt, cosine) = if d_dot_n > 0.0 {
        (-hit.normal, ior, ior * d_dot_n / d.length())
    } else {
        (hit.normal, 1.0 / ior, -d_dot_n / d.length())
    };

    let mut reflected = reflect(d, hit.normal);
    let (mut refracted, reflect_probability) = match refract(d, outward_normal, ni_over_nt) {
        Some(refracted) => (refracted, schlick(cosine, ior)),
        // Total internal reflection
        None => (Vec3::ZERO, 1.0),
    };

    if material.roughness > 0.0 {
        let fuzz = material.roughness * random_in_unit_sphere(rng);
        reflected += fuzz;
        refracted += fuzz;
    }

    let scattered = if gen_f32(rng) < reflect_probability {
        LightRay::bounce(&hit.incident, hit.point, reflected, RayKind::Reflected, hit.material)
    } else {
        LightRay::bounce(&hit.incident, hit.point, refracted, RayKind::Refracted, hit.material)
    };

    ScatterResult {
        continues: true,
        attenuation: diffuse_color(scene, hit),
        scattered,
    }
}
