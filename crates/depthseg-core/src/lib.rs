//! Core types for organized point-cloud segmentation.
//!
//! This crate is intentionally small and purely geometric. It holds the
//! borrowed per-pixel views the segmenter consumes, the dense square matrices
//! it uses for cluster relations, the three-point plane model and the label
//! colorizer. It does *not* know about any particular depth sensor.

mod color;
mod logger;
mod matrix;
mod plane;
mod view;

pub use matrix::{BoolMatrix, SquareMatrix};
pub use plane::{Plane, PlaneSide, SideCounts};
pub use view::{
    neighbors8, neighbors8_backward, DepthImageView, GrayImageView, PointCloudView, RgbImage,
};

pub use color::{label_color, UNLABELED_COLOR};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
