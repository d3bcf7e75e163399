//! Strata Renderer - tile scheduling and BSDF shading.
//!
//! Splits an image into tiles, hands them out exactly once to a fixed pool
//! of worker threads and provides the single-bounce scattering rules that
//! a path tracer drives recursively. Intersection testing and the
//! recursion policy stay with the caller, see [`Intersector`] and
//! [`SampleIntegrator`].

mod bsdf;
mod config;
mod error;
mod hit;
mod ray;
mod renderer;
mod sampling;
mod state;
mod texturing;
mod tile;
mod worker;

pub use bsdf::{scatter, Bsdf, ScatterResult};
pub use config::{ConfigError, RenderConfig};
pub use error::{RenderError, RenderResult};
pub use hit::{HitRecord, Intersector};
pub use ray::{LightRay, RayKind};
pub use renderer::{color_to_rgba, Framebuffer, RenderOutput, Renderer};
pub use sampling::{gen_f32, random_in_unit_sphere, random_on_unit_sphere, thread_rng};
pub use state::{RenderControlState, ThreadProgress, ThreadState};
pub use texturing::{checkerboard, color_for_uv, diffuse_color, gradient, mapped_checkerboard};
pub use tile::{quantize, reorder, RenderOrder, Tile, TileScheduler, TileState};
pub use worker::{SampleIntegrator, TileResult};

/// Re-export common types from the core and math crates
pub use strata_core::{Color, Material, MaterialId, MaterialKind, SceneContext};
pub use strata_math::{Vec2, Vec3};
