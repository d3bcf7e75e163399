//! Surface color lookups: UV-mapped textures and procedural patterns.
//!
//! The UV lookup and the mapped checkerboard weight the polygon's texture
//! coordinates differently: `color_for_uv` pairs `u` with slot 2 and `v`
//! with slot 1, `mapped_checkerboard` pairs `u` with slot 1 and `v` with
//! slot 2. Both keep `w = 1 - u - v` on slot 0.

use strata_core::{from_srgb, Color, SceneContext};
use strata_math::Vec2;

use crate::HitRecord;

const CHECKER_DARK: Color = Color::new(0.4, 0.4, 0.4);
const CHECKER_LIGHT: Color = Color::new(1.0, 1.0, 1.0);

/// Texture coordinates of the hit polygon, if it has any.
fn polygon_tex_coords(scene: &SceneContext, hit: &HitRecord) -> Option<[Vec2; 3]> {
    let polygon = scene.polygon(hit.polygon?);
    let [t0, t1, t2] = polygon.tex_coords?;
    Some([scene.tex_coord(t0), scene.tex_coord(t1), scene.tex_coord(t2)])
}

/// Linear color of the material's texture at the hit point.
///
/// Returns `None` if the material has no texture or the hit polygon has no
/// texture coordinates.
pub fn color_for_uv(scene: &SceneContext, hit: &HitRecord) -> Option<Color> {
    let texture = scene.texture(scene.material(hit.material).texture?);
    let tc = polygon_tex_coords(scene, hit)?;

    let u = hit.uv.x;
    let v = hit.uv.y;
    let w = 1.0 - u - v;

    let texture_xy = u * tc[2] + v * tc[1] + w * tc[0];
    let x = texture_xy.x * texture.width as f32;
    let y = texture_xy.y * texture.height as f32;

    // Textures are stored gamma-encoded
    Some(from_srgb(texture.sample_filtered(x, y)))
}

/// Diffuse color at the hit point: the texture if there is one, otherwise
/// the material's flat diffuse color.
pub fn diffuse_color(scene: &SceneContext, hit: &HitRecord) -> Color {
    color_for_uv(scene, hit).unwrap_or_else(|| scene.material(hit.material).diffuse)
}

/// Barycentric coordinates as a color, handy for debugging mesh hits.
pub fn gradient(hit: &HitRecord) -> Color {
    let u = hit.uv.x;
    let v = hit.uv.y;
    Color::new(u, v, 1.0 - u - v)
}

/// Checkerboard in the polygon's texture coordinate space.
///
/// `coef` scales the pattern frequency. Returns `None` for hits without
/// texture coordinates.
pub fn mapped_checkerboard(scene: &SceneContext, hit: &HitRecord, coef: f32) -> Option<Color> {
    let tc = polygon_tex_coords(scene, hit)?;

    let u = hit.uv.x;
    let v = hit.uv.y;
    let w = 1.0 - u - v;

    let surface_xy = u * tc[1] + v * tc[2] + w * tc[0];
    let sines = (coef * surface_xy.x).sin() * (coef * surface_xy.y).sin();

    Some(if sines < 0.0 { CHECKER_DARK } else { CHECKER_LIGHT })
}

/// Axis-aligned checkerboard in world space.
pub fn checkerboard(hit: &HitRecord, coef: f32) -> Color {
    let p = hit.point;
    let sines = (coef * p.x).sin() * (coef * p.y).sin() * (coef * p.z).sin();
    if sines < 0.0 {
        CHECKER_DARK
    } else {
        CHECKER_LIGHT
    }
}
