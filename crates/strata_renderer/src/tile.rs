//! Tile-based work distribution.
//!
//! Divides the image into tiles that are rendered independently, orders
//! them with a [`RenderOrder`] and hands each one out to exactly one
//! worker thread.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use parking_lot::Mutex;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use strata_math::UVec2;

/// Order in which tiles are handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderOrder {
    /// Scan order, left-to-right and top-to-bottom
    Normal,
    /// Reverse scan order
    TopToBottom,
    /// Shuffled
    Random,
    /// Outward from the middle of the tile list
    #[default]
    FromMiddle,
    /// Inward from both ends of the tile list
    ToMiddle,
}

/// Lifecycle of a tile. Each tile moves forward through these exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TileState {
    Pending = 0,
    Rendering = 1,
    Finished = 2,
}

impl TileState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => TileState::Pending,
            1 => TileState::Rendering,
            _ => TileState::Finished,
        }
    }
}

/// A rectangular region `[begin, end)` of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Top-left pixel (inclusive)
    pub begin: UVec2,
    /// Bottom-right pixel (exclusive), clamped to the image
    pub end: UVec2,
    /// Width of the tile in pixels, after clamping
    pub width: u32,
    /// Height of the tile in pixels, after clamping
    pub height: u32,
    /// Sample pass currently being accumulated. Starts at 1 so the running
    /// average divides by the right count.
    pub completed_samples: u32,
    /// Scan-order index assigned at quantization. Stable for the lifetime
    /// of the render and used to identify the tile in logs and state
    /// lookups; hand-out order is tracked by the scheduler.
    pub tile_num: usize,
}

impl Tile {
    /// Create a new pending tile.
    pub fn new(begin: UVec2, end: UVec2, tile_num: usize) -> Self {
        Self {
            begin,
            end,
            width: end.x - begin.x,
            height: end.y - begin.y,
            completed_samples: 1,
            tile_num,
        }
    }

    /// Get the total number of pixels in this tile.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether the pixel `(x, y)` lies inside this tile.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.begin.x && x < self.end.x && y >= self.begin.y && y < self.end.y
    }

    /// Pixel coordinates in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> {
        let (begin, end) = (self.begin, self.end);
        (begin.y..end.y).flat_map(move |y| (begin.x..end.x).map(move |x| (x, y)))
    }
}

/// Split a `width x height` image into tiles in scan order.
///
/// Tile dimensions are clamped to `[1, image dimension]`; tiles in the last
/// row and column are cut off at the image border. Aborts the process if
/// the tile array cannot be allocated.
pub fn quantize(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Vec<Tile> {
    if width == 0 || height == 0 {
        log::warn!("Nothing to quantize for a {}x{} image", width, height);
        return Vec::new();
    }

    let tile_width = tile_width.clamp(1, width);
    let tile_height = tile_height.clamp(1, height);

    let tiles_x = width.div_ceil(tile_width);
    let tiles_y = height.div_ceil(tile_height);
    let count = tiles_x as usize * tiles_y as usize;

    let mut tiles = Vec::new();
    if let Err(err) = tiles.try_reserve_exact(count) {
        log::error!("Failed to allocate {} render tiles: {}", count, err);
        std::process::abort();
    }

    for y in 0..tiles_y {
        for x in 0..tiles_x {
            let begin = UVec2::new(x * tile_width, y * tile_height);
            let end = UVec2::new(
                ((x + 1) * tile_width).min(width),
                ((y + 1) * tile_height).min(height),
            );
            let tile_num = tiles.len();
            tiles.push(Tile::new(begin, end, tile_num));
        }
    }

    log::info!(
        "Quantized image into {} tiles ({}x{})",
        tiles.len(),
        tiles_x,
        tiles_y
    );

    tiles
}

/// Permute `tiles` into the hand-out order for `order`.
///
/// Every tile appears exactly once in the result.
pub fn reorder(tiles: &mut Vec<Tile>, order: RenderOrder, rng: &mut dyn RngCore) {
    let indices = order_indices(tiles.len(), order, rng);
    *tiles = indices.into_iter().map(|i| tiles[i]).collect();
}

fn order_indices(count: usize, order: RenderOrder, rng: &mut dyn RngCore) -> Vec<usize> {
    match order {
        RenderOrder::Normal => (0..count).collect(),
        RenderOrder::TopToBottom => (0..count).rev().collect(),
        RenderOrder::Random => {
            let mut indices: Vec<usize> = (0..count).collect();
            for i in 0..count {
                let j = rng.gen_range(0..count);
                indices.swap(i, j);
            }
            indices
        }
        RenderOrder::FromMiddle => from_middle(count),
        RenderOrder::ToMiddle => to_middle(count),
    }
}

/// Alternate right then left, starting at the middle and moving outward.
/// Once one side runs out the rest come from the other.
fn from_middle(count: usize) -> Vec<usize> {
    let mut indices = Vec::with_capacity(count);
    let mut right = count.div_ceil(2);
    let mut left = right.checked_sub(1);
    let mut take_right = true;

    while indices.len() < count {
        let use_right = (take_right && right < count) || left.is_none();
        if use_right {
            indices.push(right);
            right += 1;
        } else if let Some(l) = left {
            indices.push(l);
            left = l.checked_sub(1);
        }
        take_right = !take_right;
    }
    indices
}

/// Alternate right then left, starting at both ends and meeting in the middle.
fn to_middle(count: usize) -> Vec<usize> {
    let mut indices = Vec::with_capacity(count);
    if count == 0 {
        return indices;
    }
    let mut left = 0;
    let mut right = count - 1;
    let mut take_right = true;

    while indices.len() < count {
        if take_right {
            indices.push(right);
            right = right.saturating_sub(1);
        } else {
            indices.push(left);
            left += 1;
        }
        take_right = !take_right;
    }
    indices
}

/// Hands out tiles exactly once to any number of concurrent callers.
///
/// Only the hand-out counter is behind a lock. Tile states are atomics so
/// the progress display can read them at any time.
pub struct TileScheduler {
    /// Tiles in hand-out order
    tiles: Vec<Tile>,
    /// Position in `tiles` for each tile_num
    slots: Vec<usize>,
    /// State per tile, indexed by tile_num
    states: Vec<AtomicU8>,
    handed_out: Mutex<usize>,
    finished: AtomicUsize,
}

impl TileScheduler {
    /// Create a scheduler over tiles that are already in hand-out order.
    ///
    /// The `tile_num`s must be a permutation of `0..tiles.len()`, which is
    /// what [`quantize`] followed by [`reorder`] produces.
    pub fn new(tiles: Vec<Tile>) -> Self {
        let mut slots = vec![usize::MAX; tiles.len()];
        for (slot, tile) in tiles.iter().enumerate() {
            assert!(
                tile.tile_num < tiles.len() && slots[tile.tile_num] == usize::MAX,
                "tile numbers must be a permutation of 0..{}",
                tiles.len()
            );
            slots[tile.tile_num] = slot;
        }
        let states = tiles
            .iter()
            .map(|_| AtomicU8::new(TileState::Pending as u8))
            .collect();

        Self {
            tiles,
            slots,
            states,
            handed_out: Mutex::new(0),
            finished: AtomicUsize::new(0),
        }
    }

    /// Quantize an image and order its tiles in one step.
    pub fn for_image(
        width: u32,
        height: u32,
        tile_width: u32,
        tile_height: u32,
        order: RenderOrder,
        rng: &mut dyn RngCore,
    ) -> Self {
        let mut tiles = quantize(width, height, tile_width, tile_height);
        reorder(&mut tiles, order, rng);
        log::debug!("Tile order: {:?}", order);
        Self::new(tiles)
    }

    /// Take the next tile, or `None` once every tile has been handed out.
    ///
    /// The returned tile is marked as rendering and belongs to the caller
    /// until it is passed to [`finish`](Self::finish).
    pub fn next_tile(&self) -> Option<Tile> {
        let mut handed_out = self.handed_out.lock();
        if *handed_out >= self.tiles.len() {
            return None;
        }
        let tile = self.tiles[*handed_out];
        self.states[tile.tile_num].store(TileState::Rendering as u8, Ordering::Release);
        *handed_out += 1;
        Some(tile)
    }

    /// Mark a tile returned by [`next_tile`](Self::next_tile) as finished.
    ///
    /// Only a tile that is currently rendering can finish. Returns false,
    /// leaving the tile and the finished count untouched, for a tile that
    /// is unknown, still pending or already finished.
    pub fn finish(&self, tile: &Tile) -> bool {
        let Some(state) = self.states.get(tile.tile_num) else {
            log::warn!("Cannot finish unknown tile {}", tile.tile_num);
            return false;
        };
        match state.compare_exchange(
            TileState::Rendering as u8,
            TileState::Finished as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                self.finished.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(current) => {
                log::warn!(
                    "Tile {} cannot finish from {:?}",
                    tile.tile_num,
                    TileState::from_u8(current)
                );
                false
            }
        }
    }

    /// Current state of the tile with the given scan-order number.
    pub fn tile_state(&self, tile_num: usize) -> Option<TileState> {
        self.states
            .get(tile_num)
            .map(|state| TileState::from_u8(state.load(Ordering::Acquire)))
    }

    /// Look up a tile by its scan-order number.
    pub fn tile(&self, tile_num: usize) -> Option<&Tile> {
        self.slots.get(tile_num).map(|&slot| &self.tiles[slot])
    }

    /// Tiles in hand-out order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Number of tiles handed out so far.
    pub fn handed_out(&self) -> usize {
        *self.handed_out.lock()
    }

    pub fn finished_count(&self) -> usize {
        self.finished.load(Ordering::Relaxed)
    }

    /// True once every tile has been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.handed_out() >= self.tiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn covered_exactly_once(tiles: &[Tile], width: u32, height: u32) -> bool {
        let mut hits = vec![0u8; (width * height) as usize];
        for tile in tiles {
            for (x, y) in tile.pixels() {
                hits[(y * width + x) as usize] += 1;
            }
        }
        hits.iter().all(|&h| h == 1)
    }

    #[test]
    fn test_quantize_exact_fit() {
        let tiles = quantize(400, 300, 100, 100);
        assert_eq!(tiles.len(), 12);
        assert!(tiles.iter().all(|t| t.width == 100 && t.height == 100));

        // Total pixels should equal image size
        let total: usize = tiles.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total, 400 * 300);
        assert!(covered_exactly_once(&tiles, 400, 300));
    }

    #[test]
    fn test_quantize_partial_fit() {
        let tiles = quantize(410, 300, 100, 100);
        assert_eq!(tiles.len(), 15); // 5x3 grid

        // Last column is clamped to the image border
        let last_column: Vec<&Tile> = tiles.iter().filter(|t| t.begin.x == 400).collect();
        assert_eq!(last_column.len(), 3);
        assert!(last_column.iter().all(|t| t.end.x == 410 && t.width == 10));

        let total: usize = tiles.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total, 410 * 300);
        assert!(covered_exactly_once(&tiles, 410, 300));
    }

    #[test]
    fn test_quantize_scan_order_and_defaults() {
        let tiles = quantize(30, 20, 10, 10);
        for (i, tile) in tiles.iter().enumerate() {
            assert_eq!(tile.tile_num, i);
            assert_eq!(tile.completed_samples, 1);
        }
        // Row-major: second tile is to the right of the first
        assert_eq!(tiles[1].begin, UVec2::new(10, 0));
        assert_eq!(tiles[3].begin, UVec2::new(0, 10));
    }

    #[test]
    fn test_quantize_clamps_tile_size() {
        let oversized = quantize(50, 40, 1000, 1000);
        assert_eq!(oversized.len(), 1);
        assert_eq!(oversized[0].end, UVec2::new(50, 40));

        let zero = quantize(3, 2, 0, 0);
        assert_eq!(zero.len(), 6);
        assert!(covered_exactly_once(&zero, 3, 2));
    }

    #[test]
    fn test_from_middle_order() {
        assert_eq!(from_middle(5), vec![3, 2, 4, 1, 0]);
        assert_eq!(from_middle(4), vec![2, 1, 3, 0]);
        assert_eq!(from_middle(1), vec![0]);
    }

    #[test]
    fn test_to_middle_order() {
        assert_eq!(to_middle(5), vec![4, 0, 3, 1, 2]);
        assert_eq!(to_middle(4), vec![3, 0, 2, 1]);
        assert_eq!(to_middle(1), vec![0]);
    }

    #[test]
    fn test_top_to_bottom_reverses() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut tiles = quantize(40, 10, 10, 10);
        reorder(&mut tiles, RenderOrder::TopToBottom, &mut rng);
        let nums: Vec<usize> = tiles.iter().map(|t| t.tile_num).collect();
        assert_eq!(nums, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_every_order_is_a_permutation() {
        let orders = [
            RenderOrder::Normal,
            RenderOrder::TopToBottom,
            RenderOrder::Random,
            RenderOrder::FromMiddle,
            RenderOrder::ToMiddle,
        ];
        let mut rng = StdRng::seed_from_u64(42);
        for count in 1..40 {
            for order in orders {
                let mut indices = order_indices(count, order, &mut rng);
                indices.sort_unstable();
                assert_eq!(indices, (0..count).collect::<Vec<_>>(), "{:?} x {}", order, count);
            }
        }
    }

    #[test]
    fn test_next_tile_follows_order_then_stops() {
        let mut rng = StdRng::seed_from_u64(0);
        let scheduler = TileScheduler::for_image(50, 10, 10, 10, RenderOrder::FromMiddle, &mut rng);
        assert_eq!(scheduler.tile_count(), 5);

        let nums: Vec<usize> = std::iter::from_fn(|| scheduler.next_tile())
            .map(|t| t.tile_num)
            .collect();
        assert_eq!(nums, vec![3, 2, 4, 1, 0]);

        // Exhausted calls keep returning None
        assert!(scheduler.next_tile().is_none());
        assert!(scheduler.next_tile().is_none());
        assert_eq!(scheduler.handed_out(), 5);
        assert!(scheduler.is_exhausted());
    }

    #[test]
    fn test_tile_state_transitions() {
        let scheduler = TileScheduler::new(quantize(20, 10, 10, 10));
        assert_eq!(scheduler.tile_state(0), Some(TileState::Pending));

        let tile = scheduler.next_tile().unwrap();
        assert_eq!(scheduler.tile_state(tile.tile_num), Some(TileState::Rendering));

        assert!(scheduler.finish(&tile));
        assert_eq!(scheduler.tile_state(tile.tile_num), Some(TileState::Finished));
        assert_eq!(scheduler.finished_count(), 1);
        assert_eq!(scheduler.tile(1).unwrap().begin, UVec2::new(10, 0));
        assert_eq!(scheduler.tile_state(2), None);
    }

    #[test]
    fn test_finish_only_from_rendering() {
        let scheduler = TileScheduler::new(quantize(20, 10, 10, 10));
        let tile = scheduler.next_tile().unwrap();
        assert!(scheduler.finish(&tile));

        // Finishing twice is rejected
        assert!(!scheduler.finish(&tile));

        // So is finishing a tile that was never handed out
        let pending = *scheduler.tile(1).unwrap();
        assert!(!scheduler.finish(&pending));

        assert_eq!(scheduler.finished_count(), 1);
        assert_eq!(scheduler.handed_out(), 1);
        assert_eq!(scheduler.tile_state(1), Some(TileState::Pending));

        // Unknown tile numbers are rejected too
        let stray = Tile::new(UVec2::ZERO, UVec2::ONE, 99);
        assert!(!scheduler.finish(&stray));
        assert_eq!(scheduler.finished_count(), 1);
    }

    #[test]
    fn test_concurrent_hand_out_is_exactly_once() {
        let scheduler = TileScheduler::new(quantize(320, 240, 8, 8));
        let count = scheduler.tile_count();

        let per_thread: Vec<Vec<usize>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        let mut taken = Vec::new();
                        while let Some(tile) = scheduler.next_tile() {
                            taken.push(tile.tile_num);
                            assert!(scheduler.finish(&tile));
                        }
                        // Past exhaustion every call is empty
                        assert!(scheduler.next_tile().is_none());
                        taken
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let all: Vec<usize> = per_thread.into_iter().flatten().collect();
        let unique: HashSet<usize> = all.iter().copied().collect();
        assert_eq!(all.len(), count);
        assert_eq!(unique.len(), count);
        assert_eq!(scheduler.finished_count(), count);
        assert!((0..count).all(|n| scheduler.tile_state(n) == Some(TileState::Finished)));
    }

    #[test]
    fn test_render_order_serde_names() {
        let order: RenderOrder = serde_json::from_str("\"topToBottom\"").unwrap();
        assert_eq!(order, RenderOrder::TopToBottom);
        assert_eq!(serde_json::to_string(&RenderOrder::FromMiddle).unwrap(), "\"fromMiddle\"");
    }
}
