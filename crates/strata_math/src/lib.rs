// Re-export glam for convenience
pub use glam::*;

// Strata math helpers
mod optics;
pub use optics::{reflect, refract, schlick};
