//! Error type for render setup and output.

use lumen_core::LoadError;
use thiserror::Error;

/// Errors raised while preparing a render or writing its output.
///
/// Rendering itself never fails: numerical corner cases are handled by
/// branch logic inside the integrator.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("buffer is {actual:?} but the render needs {expected:?}")]
    BufferSize {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("mesh has no triangles")]
    EmptyMesh,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),

    #[error("render thread panicked")]
    WorkerPanicked,
}

pub type RenderResult<T> = Result<T, RenderError>;
