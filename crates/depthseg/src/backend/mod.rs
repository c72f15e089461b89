//! Interchangeable compute backends for the data-parallel kernels.
//!
//! The orchestration in the pipeline stages is shared; a backend only
//! decides how the per-pixel and per-point kernels are executed. Both
//! backends produce identical results for the same input.

mod sequential;

#[cfg(feature = "parallel")]
mod parallel;

pub use sequential::SequentialBackend;

#[cfg(feature = "parallel")]
pub use parallel::ParallelBackend;

use depthseg_core::{Plane, PointCloudView, SideCounts};
use log::warn;

use crate::adjacency::{AssignmentInput, PointVote};
use crate::params::SegmenterParams;

/// Kernels the pipeline dispatches to a backend.
pub trait ComputeBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_accelerated(&self) -> bool;

    /// Run the edge-point assignment kernel over every pixel. Votes come back
    /// in ascending pixel order.
    fn assign_points(&self, input: &AssignmentInput<'_>) -> Vec<PointVote>;

    /// Classify every `stride`-th point of `indices` against each plane.
    /// `None` planes get zero counts.
    fn classify_points(
        &self,
        points: &PointCloudView<'_>,
        indices: &[usize],
        stride: usize,
        planes: &[Option<Plane>],
        tolerance: f32,
    ) -> Vec<SideCounts>;

    /// Per-pixel mask of points within `tolerance` of `plane`.
    fn plane_inliers(&self, points: &PointCloudView<'_>, plane: &Plane, tolerance: f32)
        -> Vec<bool>;

    /// Write the RGB color of every label into `out` (`3 * labels.len()` bytes).
    fn colorize(&self, labels: &[u32], out: &mut [u8]);
}

/// Errors raised while bringing up the accelerated backend.
#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[cfg(feature = "parallel")]
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("accelerated backend not compiled in (enable the `parallel` feature)")]
    Unavailable,
}

/// Build the accelerated backend.
#[cfg(feature = "parallel")]
pub fn accelerated_backend(threads: usize) -> Result<Box<dyn ComputeBackend>, BackendError> {
    Ok(Box::new(ParallelBackend::new(threads)?))
}

#[cfg(not(feature = "parallel"))]
pub fn accelerated_backend(_threads: usize) -> Result<Box<dyn ComputeBackend>, BackendError> {
    Err(BackendError::Unavailable)
}

/// Pick the backend once per segmenter. A failing accelerated backend is
/// logged and replaced by the sequential one.
pub fn select_backend(params: &SegmenterParams) -> Box<dyn ComputeBackend> {
    if params.use_accelerated_backend {
        match accelerated_backend(params.accelerated_threads) {
            Ok(backend) => return backend,
            Err(err) => warn!("accelerated backend unavailable, using sequential: {err}"),
        }
    }
    Box::new(SequentialBackend)
}
