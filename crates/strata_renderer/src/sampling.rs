//! Per-thread random streams and the sampling routines built on them.
//!
//! Every worker owns its own generator; nothing here is shared between
//! threads.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use strata_math::Vec3;

/// Create the random stream for one worker thread.
///
/// Streams are deterministic for a given `(seed, thread)` pair.
pub fn thread_rng(seed: u64, thread: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (thread as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Uniform float in [0, 1).
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Random point strictly inside the unit sphere, by rejection.
pub fn random_in_unit_sphere(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let v = Vec3::new(
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
        );
        if v.length_squared() < 1.0 {
            return v;
        }
    }
}

/// Random direction on the unit sphere.
pub fn random_on_unit_sphere(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let v = random_in_unit_sphere(rng);
        // Too short to normalize reliably
        if v.length_squared() > 1e-8 {
            return v.normalize();
        }
    }
}
