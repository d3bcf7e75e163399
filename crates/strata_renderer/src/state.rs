//! Shared render control state.
//!
//! Workers publish progress here and poll the abort and pause flags
//! between sample passes. A progress display or UI can hold an `Arc` to
//! the state and read it at any time; the only things it writes are the
//! user-facing flags.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::{Tile, TileScheduler};

const NO_TILE: usize = usize::MAX;

/// Per-worker flags and progress.
pub struct ThreadState {
    paused: Mutex<bool>,
    resume: Condvar,
    /// tile_num of the tile being rendered, or NO_TILE
    current_tile: AtomicUsize,
    /// Sample passes finished on the current tile
    completed_samples: AtomicU32,
}

impl ThreadState {
    fn new() -> Self {
        Self {
            paused: Mutex::new(false),
            resume: Condvar::new(),
            current_tile: AtomicUsize::new(NO_TILE),
            completed_samples: AtomicU32::new(0),
        }
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.lock()
    }

    /// tile_num of the tile this worker holds, if any.
    pub fn current_tile(&self) -> Option<usize> {
        match self.current_tile.load(Ordering::Relaxed) {
            NO_TILE => None,
            n => Some(n),
        }
    }

    /// Sample passes finished on the current tile. May lag slightly behind
    /// the worker.
    pub fn completed_samples(&self) -> u32 {
        self.completed_samples.load(Ordering::Relaxed)
    }

    pub(crate) fn begin_tile(&self, tile: &Tile) {
        self.completed_samples.store(0, Ordering::Relaxed);
        self.current_tile.store(tile.tile_num, Ordering::Relaxed);
    }

    pub(crate) fn publish_samples(&self, samples: u32) {
        self.completed_samples.store(samples, Ordering::Relaxed);
    }

    pub(crate) fn end_tile(&self) {
        self.current_tile.store(NO_TILE, Ordering::Relaxed);
    }

    fn set_paused(&self, paused: bool) {
        let mut guard = self.paused.lock();
        *guard = paused;
        if !paused {
            self.resume.notify_all();
        }
    }

    fn wake(&self) {
        let _guard = self.paused.lock();
        self.resume.notify_all();
    }
}

/// Snapshot of one worker's progress for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreadProgress {
    pub thread: usize,
    pub tile: Option<Tile>,
    pub completed_samples: u32,
    /// Fraction of the tile's samples done, in [0, 1]
    pub fraction: f32,
    pub paused: bool,
}

/// Flags, per-thread progress and tiles shared by a render.
pub struct RenderControlState {
    abort: AtomicBool,
    save_on_abort: AtomicBool,
    threads: Vec<ThreadState>,
    scheduler: TileScheduler,
    sample_count: u32,
}

impl RenderControlState {
    pub fn new(scheduler: TileScheduler, thread_count: usize, sample_count: u32) -> Self {
        Self {
            abort: AtomicBool::new(false),
            save_on_abort: AtomicBool::new(false),
            threads: (0..thread_count).map(|_| ThreadState::new()).collect(),
            scheduler,
            sample_count,
        }
    }

    pub fn scheduler(&self) -> &TileScheduler {
        &self.scheduler
    }

    /// State of worker `index`, or `None` past the thread count.
    pub fn thread(&self, index: usize) -> Option<&ThreadState> {
        self.threads.get(index)
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Samples each pixel receives in a complete render.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::Acquire)
    }

    /// Whether the driver should write out the image: always after a
    /// complete render, and after an abort only if it was requested.
    pub fn should_save(&self) -> bool {
        !self.is_aborted() || self.save_on_abort.load(Ordering::Acquire)
    }

    /// Stop the render. Workers finish their in-flight sample pass and
    /// return; paused workers are woken so they can exit too.
    pub fn request_abort(&self, save: bool) {
        if save {
            log::info!("Aborting render, saving");
        } else {
            log::info!("Aborting render without saving");
        }
        self.save_on_abort.store(save, Ordering::Release);
        self.abort.store(true, Ordering::Release);
        for thread in &self.threads {
            thread.wake();
        }
    }

    /// Pause or resume one worker. Returns false for an unknown thread.
    pub fn set_paused(&self, thread: usize, paused: bool) -> bool {
        match self.threads.get(thread) {
            Some(state) => {
                state.set_paused(paused);
                true
            }
            None => {
                log::warn!("Cannot pause unknown render thread {}", thread);
                false
            }
        }
    }

    /// Flip the pause flag of every worker.
    pub fn toggle_pause_all(&self) {
        for thread in &self.threads {
            let paused = thread.is_paused();
            thread.set_paused(!paused);
        }
    }

    /// Block while `thread` is paused. Returns false if the render was
    /// aborted or the thread is unknown, meaning the worker should stop.
    pub fn checkpoint(&self, thread: usize) -> bool {
        let Some(state) = self.threads.get(thread) else {
            return false;
        };
        let mut paused = state.paused.lock();
        while *paused && !self.is_aborted() {
            state.resume.wait(&mut paused);
        }
        !self.is_aborted()
    }

    /// Best-effort progress of every worker.
    pub fn progress(&self) -> Vec<ThreadProgress> {
        self.threads
            .iter()
            .enumerate()
            .map(|(index, state)| {
                let completed_samples = state.completed_samples();
                let fraction = if self.sample_count == 0 {
                    0.0
                } else {
                    (completed_samples as f32 / self.sample_count as f32).min(1.0)
                };
                ThreadProgress {
                    thread: index,
                    tile: state.current_tile().and_then(|n| self.scheduler.tile(n)).copied(),
                    completed_samples,
                    fraction,
                    paused: state.is_paused(),
                }
            })
            .collect()
    }
}
