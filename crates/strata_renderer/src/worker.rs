//! The per-thread render loop.

use rand::RngCore;
use strata_core::Color;

use crate::{RenderControlState, Tile};

/// Estimates the radiance arriving through a pixel.
///
/// Implemented by the calling tracer: it generates the camera ray, asks its
/// intersector for hits, drives [`scatter`](crate::scatter) and decides when
/// a path ends. One call produces one sample.
pub trait SampleIntegrator: Sync {
    fn radiance(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Color;
}

impl<F> SampleIntegrator for F
where
    F: Fn(u32, u32, &mut dyn RngCore) -> Color + Sync,
{
    fn radiance(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Color {
        self(x, y, rng)
    }
}

/// Pixels produced for one tile.
#[derive(Debug, Clone)]
pub struct TileResult {
    /// The tile that was rendered
    pub tile: Tile,
    /// Running-average colors in row-major order within the tile
    pub pixels: Vec<Color>,
    /// Sample passes accumulated into `pixels`
    pub samples: u32,
    /// False if the render was aborted before the tile completed
    pub finished: bool,
}

/// Pull tiles until the scheduler runs dry or the render is aborted.
///
/// Pause and abort are checked before every sample pass; a pass that has
/// started always completes.
pub(crate) fn run_worker<I>(
    thread: usize,
    state: &RenderControlState,
    integrator: &I,
    rng: &mut dyn RngCore,
) -> Vec<TileResult>
where
    I: SampleIntegrator + ?Sized,
{
    let scheduler = state.scheduler();
    let Some(thread_state) = state.thread(thread) else {
        log::error!("Render thread {} has no control state", thread);
        return Vec::new();
    };
    let sample_count = state.sample_count();
    let mut results = Vec::new();

    while !state.is_aborted() {
        let Some(mut tile) = scheduler.next_tile() else {
            break;
        };
        thread_state.begin_tile(&tile);
        log::trace!("Thread {} took tile {}", thread, tile.tile_num);

        let mut pixels = vec![Color::ZERO; tile.pixel_count()];
        let mut samples = 0;

        while state.checkpoint(thread) {
            let n = tile.completed_samples as f32;
            for ((x, y), pixel) in tile.pixels().zip(pixels.iter_mut()) {
                let sample = integrator.radiance(x, y, rng);
                *pixel = (*pixel * (n - 1.0) + sample) / n;
            }
            samples = tile.completed_samples;
            thread_state.publish_samples(samples);

            if samples >= sample_count {
                break;
            }
            tile.completed_samples += 1;
        }

        let finished = samples >= sample_count && scheduler.finish(&tile);
        thread_state.end_tile();

        if samples > 0 {
            results.push(TileResult {
                tile,
                pixels,
                samples,
                finished,
            });
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{quantize, TileScheduler, TileState};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn control(width: u32, height: u32, tile: u32, samples: u32) -> RenderControlState {
        RenderControlState::new(TileScheduler::new(quantize(width, height, tile, tile)), 1, samples)
    }

    #[test]
    fn test_constant_radiance_renders_constant() {
        let state = control(12, 7, 5, 4);
        let integrator = |_x: u32, _y: u32, _rng: &mut dyn RngCore| Color::new(0.25, 0.5, 1.0);
        let mut rng = StdRng::seed_from_u64(0);

        let results = run_worker(0, &state, &integrator, &mut rng);
        assert_eq!(results.len(), state.scheduler().tile_count());

        for result in &results {
            assert!(result.finished);
            assert_eq!(result.samples, 4);
            assert_eq!(result.tile.completed_samples, 4);
            assert_eq!(result.pixels.len(), result.tile.pixel_count());
            for p in &result.pixels {
                assert!((*p - Color::new(0.25, 0.5, 1.0)).length() < 1e-6);
            }
        }
        assert_eq!(state.scheduler().finished_count(), results.len());
        assert_eq!(state.thread(0).unwrap().current_tile(), None);
    }

    #[test]
    fn test_running_average_is_the_mean() {
        // Samples for every pixel are 1, 2, 3, 4 in pass order
        let state = control(1, 1, 1, 4);
        let pass = AtomicUsize::new(0);
        let integrator = |_x: u32, _y: u32, _rng: &mut dyn RngCore| {
            let i = pass.fetch_add(1, Ordering::Relaxed) + 1;
            Color::splat(i as f32)
        };
        let mut rng = StdRng::seed_from_u64(0);

        let results = run_worker(0, &state, &integrator, &mut rng);
        assert!((results[0].pixels[0] - Color::splat(2.5)).length() < 1e-6);
    }

    #[test]
    fn test_each_pixel_sampled_once_per_pass() {
        let state = control(9, 6, 4, 3);
        let calls = AtomicUsize::new(0);
        let integrator = |_x: u32, _y: u32, _rng: &mut dyn RngCore| {
            calls.fetch_add(1, Ordering::Relaxed);
            Color::ONE
        };
        let mut rng = StdRng::seed_from_u64(0);

        run_worker(0, &state, &integrator, &mut rng);
        assert_eq!(calls.load(Ordering::Relaxed), 9 * 6 * 3);
    }

    #[test]
    fn test_abort_before_start_renders_nothing() {
        let state = control(16, 16, 8, 4);
        state.request_abort(false);
        let integrator = |_x: u32, _y: u32, _rng: &mut dyn RngCore| Color::ONE;
        let mut rng = StdRng::seed_from_u64(0);

        let results = run_worker(0, &state, &integrator, &mut rng);
        assert!(results.is_empty());
        assert_eq!(state.scheduler().handed_out(), 0);
    }

    #[test]
    fn test_abort_mid_tile_keeps_partial_result() {
        let state = control(4, 4, 4, 10);
        let calls = AtomicUsize::new(0);
        let integrator = |_x: u32, _y: u32, _rng: &mut dyn RngCore| {
            // Abort during the second pass; that pass still completes
            if calls.fetch_add(1, Ordering::Relaxed) == 20 {
                state.request_abort(true);
            }
            Color::ONE
        };
        let mut rng = StdRng::seed_from_u64(0);

        let results = run_worker(0, &state, &integrator, &mut rng);
        assert_eq!(results.len(), 1);
        assert!(!results[0].finished);
        assert_eq!(results[0].samples, 2);
        assert_eq!(calls.load(Ordering::Relaxed), 32);
        assert_eq!(state.scheduler().tile_state(0), Some(TileState::Rendering));
        assert!(state.should_save());
    }

    #[test]
    fn test_paused_worker_waits_for_resume() {
        let state = control(8, 8, 4, 2);
        state.set_paused(0, true);
        let calls = AtomicUsize::new(0);
        let integrator = |_x: u32, _y: u32, _rng: &mut dyn RngCore| {
            calls.fetch_add(1, Ordering::Relaxed);
            Color::ONE
        };

        let results = std::thread::scope(|s| {
            let worker = s.spawn(|| {
                let mut rng = StdRng::seed_from_u64(0);
                run_worker(0, &state, &integrator, &mut rng)
            });

            // The first tile is taken but no pass runs while paused
            std::thread::sleep(Duration::from_millis(50));
            assert_eq!(calls.load(Ordering::Relaxed), 0);
            assert!(!worker.is_finished());
            assert_eq!(state.scheduler().finished_count(), 0);

            state.set_paused(0, false);
            worker.join().unwrap()
        });

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.finished));
        assert_eq!(calls.load(Ordering::Relaxed), 8 * 8 * 2);
    }

    #[test]
    fn test_unknown_thread_renders_nothing() {
        let state = control(4, 4, 4, 1);
        let integrator = |_x: u32, _y: u32, _rng: &mut dyn RngCore| Color::ONE;
        let mut rng = StdRng::seed_from_u64(0);

        assert!(run_worker(3, &state, &integrator, &mut rng).is_empty());
        assert_eq!(state.scheduler().handed_out(), 0);
    }
}
