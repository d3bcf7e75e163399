//! Tiled path tracer example.
//!
//! Renders a few spheres under an emissive light with the tile scheduler
//! and saves the result to PPM format. Render settings can be passed as a
//! JSON file: `cargo run --example tile_render -- settings.json`

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::RngCore;
use strata_renderer::{
    gen_f32, scatter, Color, Framebuffer, HitRecord, Intersector, LightRay, Material, MaterialId,
    MaterialKind, RenderConfig, RenderControlState, Renderer, SampleIntegrator, SceneContext, Vec3,
};

const WIDTH: u32 = 400;
const HEIGHT: u32 = 225;
const MAX_DEPTH: u32 = 8;

struct Sphere {
    center: Vec3,
    radius: f32,
    material: MaterialId,
}

impl Sphere {
    fn hit(&self, ray: &LightRay, t_min: f32, t_max: f32) -> Option<HitRecord> {
        let oc = self.center - ray.origin;
        let a = ray.direction.length_squared();
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        let mut root = (h - sqrtd) / a;
        if root <= t_min || root >= t_max {
            root = (h + sqrtd) / a;
            if root <= t_min || root >= t_max {
                return None;
            }
        }

        // Geometric normal; glass needs to know which side the ray is on
        let normal = (ray.at(root) - self.center) / self.radius;
        Some(HitRecord::new(*ray, root, normal, self.material))
    }
}

struct World {
    spheres: Vec<Sphere>,
}

impl Intersector for World {
    fn intersect(&self, ray: &LightRay) -> Option<HitRecord> {
        let mut closest = f32::INFINITY;
        let mut result = None;
        for sphere in &self.spheres {
            if let Some(rec) = sphere.hit(ray, 0.001, closest) {
                closest = rec.t;
                result = Some(rec);
            }
        }
        result
    }
}

/// Pinhole camera looking down -Z.
struct PathTracer<'a> {
    scene: &'a SceneContext,
    world: &'a World,
    origin: Vec3,
    background: Color,
}

impl PathTracer<'_> {
    fn ray_color(&self, ray: &LightRay, rng: &mut dyn RngCore) -> Color {
        if ray.depth >= MAX_DEPTH {
            return Color::ZERO;
        }

        let Some(rec) = self.world.intersect(ray) else {
            return self.background;
        };

        let emission = self.scene.material(rec.material).emission;
        let result = scatter(self.scene, &rec, rng);
        if result.continues {
            emission + result.attenuation * self.ray_color(&result.scattered, rng)
        } else {
            emission
        }
    }
}

impl SampleIntegrator for PathTracer<'_> {
    fn radiance(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Color {
        let aspect = WIDTH as f32 / HEIGHT as f32;
        let u = (x as f32 + gen_f32(rng)) / WIDTH as f32;
        let v = (y as f32 + gen_f32(rng)) / HEIGHT as f32;
        let direction = Vec3::new((2.0 * u - 1.0) * aspect, 1.0 - 2.0 * v, -1.5);
        self.ray_color(&LightRay::camera(self.origin, direction), rng)
    }
}

fn build_scene() -> (SceneContext, World) {
    let mut scene = SceneContext::new();

    let ground = scene.add_material(Material::new("ground", Color::splat(0.5), 1.0));
    let clay = scene.add_material(Material::new("clay", Color::new(0.7, 0.3, 0.2), 1.0));
    let chrome = scene.add_material(
        Material::new("chrome", Color::new(0.8, 0.8, 0.9), 1.0)
            .with_kind(MaterialKind::Metal)
            .with_roughness(0.05),
    );
    let glass = scene.add_material(
        Material::new("glass", Color::ONE, 0.0)
            .with_kind_name("glass")
            .with_ior(1.5),
    );
    let lamp = scene.add_material(
        Material::new("lamp", Color::ONE, 0.0)
            .with_kind(MaterialKind::Emission)
            .with_emission(Color::splat(6.0)),
    );

    let sphere = |center, radius, material| Sphere {
        center,
        radius,
        material,
    };
    let world = World {
        spheres: vec![
            sphere(Vec3::new(0.0, -100.5, -2.0), 100.0, ground),
            sphere(Vec3::new(-1.1, 0.0, -2.0), 0.5, clay),
            sphere(Vec3::new(0.0, 0.0, -2.0), 0.5, glass),
            sphere(Vec3::new(1.1, 0.0, -2.0), 0.5, chrome),
            sphere(Vec3::new(0.0, 2.5, -2.0), 1.0, lamp),
        ],
    };

    (scene, world)
}

fn load_config() -> Result<RenderConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read render settings {}", path))?;
            Ok(RenderConfig::from_json_str(&json)?)
        }
        None => Ok(RenderConfig {
            sample_count: 32,
            tile_width: 16,
            tile_height: 16,
            ..Default::default()
        }),
    }
}

/// Log worker progress until the render finishes.
fn watch_progress(state: Arc<RenderControlState>) {
    let scheduler = state.scheduler();
    while scheduler.finished_count() < scheduler.tile_count() && !state.is_aborted() {
        let progress = state.progress();
        let busy = progress.iter().filter(|p| p.tile.is_some()).count();
        log::info!(
            "{}/{} tiles done, {} threads busy",
            scheduler.finished_count(),
            scheduler.tile_count(),
            busy
        );
        std::thread::sleep(Duration::from_millis(500));
    }
}

fn save_ppm(framebuffer: &Framebuffer, filename: &str) -> Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", framebuffer.width, framebuffer.height)?;
    writeln!(writer, "255")?;

    for pixel in framebuffer.to_rgba().chunks_exact(4) {
        writeln!(writer, "{} {} {}", pixel[0], pixel[1], pixel[2])?;
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let (scene, world) = build_scene();
    let tracer = PathTracer {
        scene: &scene,
        world: &world,
        origin: Vec3::ZERO,
        background: Color::new(0.05, 0.05, 0.08),
    };

    let renderer = Renderer::new(WIDTH, HEIGHT, config)?;
    let state = renderer.state();
    let watcher = std::thread::spawn(move || watch_progress(state));

    let output = renderer.render(&tracer)?;
    if watcher.join().is_err() {
        log::warn!("Progress watcher panicked; render output is unaffected");
    }

    if output.save {
        let filename = "output.ppm";
        save_ppm(&output.framebuffer, filename)?;
        log::info!("Saved to {}", filename);
    }

    Ok(())
}
