//! Render driver.
//!
//! Builds the tile schedule, runs one worker loop per thread on a fixed
//! pool and assembles the finished tiles into a framebuffer.

use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use strata_core::{linear_to_srgb, Color};

use crate::sampling::thread_rng;
use crate::worker::run_worker;
use crate::{RenderConfig, RenderControlState, RenderResult, SampleIntegrator, TileResult, TileScheduler};

/// Clamp a value to [0, 1] range.
#[inline]
fn clamp_01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Convert a linear color to 8-bit sRGB RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let r = (255.0 * clamp_01(linear_to_srgb(color.x))).round() as u8;
    let g = (255.0 * clamp_01(linear_to_srgb(color.y))).round() as u8;
    let b = (255.0 * clamp_01(linear_to_srgb(color.z))).round() as u8;
    [r, g, b, 255]
}

/// Linear color buffer for the whole image.
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl Framebuffer {
    /// Create a new framebuffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Copy a rendered tile into place.
    pub fn blit(&mut self, result: &TileResult) {
        for ((x, y), color) in result.tile.pixels().zip(&result.pixels) {
            self.set(x, y, *color);
        }
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color));
        }
        bytes
    }
}

/// What a finished (or aborted) render produced.
pub struct RenderOutput {
    pub framebuffer: Framebuffer,
    /// Tiles that received every sample
    pub tiles_finished: usize,
    pub aborted: bool,
    /// Whether the caller should write the image out
    pub save: bool,
}

/// Drives a tiled render over a fixed pool of worker threads.
pub struct Renderer {
    width: u32,
    height: u32,
    config: RenderConfig,
    state: Arc<RenderControlState>,
}

impl Renderer {
    /// Quantize and order the tiles for a `width x height` image.
    pub fn new(width: u32, height: u32, config: RenderConfig) -> RenderResult<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let scheduler = TileScheduler::for_image(
            width,
            height,
            config.tile_width,
            config.tile_height,
            config.tile_order,
            &mut rng,
        );
        let state = Arc::new(RenderControlState::new(
            scheduler,
            config.thread_count,
            config.sample_count,
        ));

        Ok(Self {
            width,
            height,
            config,
            state,
        })
    }

    /// Shared control state, for progress displays and abort/pause input.
    pub fn state(&self) -> Arc<RenderControlState> {
        Arc::clone(&self.state)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render every tile with `integrator`, blocking until all workers
    /// have stopped.
    pub fn render<I>(self, integrator: &I) -> RenderResult<RenderOutput>
    where
        I: SampleIntegrator + ?Sized,
    {
        let threads = self.config.thread_count;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("strata-worker-{}", i))
            .build()?;

        log::info!(
            "Rendering {}x{} @ {} spp, {} tiles on {} threads",
            self.width,
            self.height,
            self.config.sample_count,
            self.state.scheduler().tile_count(),
            threads
        );

        let start = Instant::now();
        let seed = self.config.seed;
        let state = &*self.state;
        let per_thread: Vec<Vec<TileResult>> = pool.broadcast(|ctx| {
            let mut rng = thread_rng(seed, ctx.index());
            run_worker(ctx.index(), state, integrator, &mut rng)
        });

        let mut framebuffer = Framebuffer::new(self.width, self.height);
        for result in per_thread.iter().flatten() {
            framebuffer.blit(result);
        }

        let aborted = state.is_aborted();
        let tiles_finished = state.scheduler().finished_count();
        if aborted {
            log::info!(
                "Render aborted after {:?} ({}/{} tiles)",
                start.elapsed(),
                tiles_finished,
                state.scheduler().tile_count()
            );
        } else {
            log::info!("Finished render in {:?}", start.elapsed());
        }

        Ok(RenderOutput {
            framebuffer,
            tiles_finished,
            aborted,
            save: state.should_save(),
        })
    }
}
