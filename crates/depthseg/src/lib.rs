//! Segmentation of organized depth point clouds into blobs.
//!
//! The pipeline turns a per-pixel 3D point cloud, an edge image marking seed
//! pixels and the raw depth image into a label image where each blob is one
//! physical object or surface:
//!
//! 1. seed pixels are grown into clusters;
//! 2. unclaimed pixels near clusters are attached to the nearest one, which
//!    also records which clusters are adjacent;
//! 3. a RANSAC test decides for every adjacent pair whether planes through
//!    one cluster leave the other on a single side ("cut-free");
//! 4. mutually cut-free clusters are grouped into blobs greedily;
//! 5. the points still unclaimed are grown into secondary clusters that
//!    merge into a neighbouring blob or stand alone.
//!
//! A single plane mode segments only the dominant plane and splits the rest
//! of the image by depth continuity.
//!
//! ```no_run
//! use depthseg::{
//!     DepthImageView, GrayImageView, PointCloudView, SegmentationInput, Segmenter,
//!     SegmenterParams,
//! };
//!
//! # fn frame() -> (usize, usize, Vec<[f32; 4]>, Vec<u8>, Vec<f32>) { unimplemented!() }
//! let (w, h, xyzw, edges, depth) = frame();
//! let segmenter = Segmenter::new(SegmenterParams::default().with_seed(7)).unwrap();
//! let input = SegmentationInput::new(
//!     PointCloudView { width: w, height: h, data: &xyzw },
//!     GrayImageView { width: w, height: h, data: &edges },
//!     DepthImageView { width: w, height: h, data: &depth },
//! );
//! let result = segmenter.segment(&input).unwrap();
//! let colored = segmenter.colorize(&result);
//! println!("{} blobs, {} bytes of color", result.num_blobs(), colored.data.len());
//! ```

mod adjacency;
mod backend;
mod composition;
mod coplanarity;
mod error;
mod io;
mod params;
mod region_grow;
mod remaining;
mod result;
mod segmenter;
mod single_plane;
mod state;

#[cfg(test)]
mod testutil;

pub use adjacency::{vote_for_point, AssignmentInput, PointVote};
pub use backend::{
    accelerated_backend, select_backend, BackendError, ComputeBackend, SequentialBackend,
};
#[cfg(feature = "parallel")]
pub use backend::ParallelBackend;
pub use coplanarity::{sample_plane, MAX_SAMPLE_ATTEMPTS};
pub use error::SegmentError;
pub use io::{SegmentIoError, SegmentationReport};
pub use params::{AmbiguousMergePolicy, ParamsError, RoiFilter, SegmenterParams};
pub use result::{SegmentationMode, SegmentationResult};
pub use segmenter::{SegmentationInput, Segmenter};

pub use depthseg_core::{
    init_with_level, label_color, BoolMatrix, DepthImageView, GrayImageView, Plane,
    PointCloudView, RgbImage, SquareMatrix,
};

#[cfg(feature = "tracing")]
pub use depthseg_core::init_tracing;
