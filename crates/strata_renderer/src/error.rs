//! Errors surfaced by the render driver.

use thiserror::Error;

use crate::ConfigError;

/// Errors that can occur while setting up or running a render.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to start render threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type RenderResult<T> = Result<T, RenderError>;
