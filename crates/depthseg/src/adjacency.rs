//! Edge-point assignment and cluster adjacency.
//!
//! Every unclaimed pixel looks at the labeled pixels inside its
//! `(2r+1) x (2r+1)` window. Clusters closer than `assignment_max_distance`
//! are touched by that pixel and become pairwise adjacent; the pixel joins
//! the nearest of them. Labels are read from a snapshot, so one pass does
//! not depend on the scan order.

use depthseg_core::{BoolMatrix, PointCloudView};
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::backend::ComputeBackend;
use crate::params::SegmenterParams;
use crate::state::LabelBuffers;

/// Read-only snapshot handed to the per-pixel kernel.
#[derive(Clone, Copy, Debug)]
pub struct AssignmentInput<'a> {
    pub points: PointCloudView<'a>,
    pub elements: &'a [bool],
    pub labels: &'a [u32],
    pub radius: usize,
    pub max_distance: f32,
}

/// Outcome of the kernel for one pixel that found a cluster in range.
#[derive(Clone, Debug, PartialEq)]
pub struct PointVote {
    pub index: usize,
    /// Winning cluster id (1-based).
    pub label: u32,
    /// Every cluster id in range, ascending.
    pub touched: Vec<u32>,
}

/// Per-pixel kernel. `None` if the pixel is claimed or no cluster is in range.
///
/// Ties on distance go to the lower cluster id.
pub fn vote_for_point(input: &AssignmentInput<'_>, index: usize) -> Option<PointVote> {
    if !input.elements[index] || input.labels[index] != 0 {
        return None;
    }
    let (w, h) = (input.points.width, input.points.height);
    let (x, y) = (index % w, index / w);
    let r = input.radius;
    let p = input.points.point(index);

    let mut best: Option<(f32, u32)> = None;
    let mut touched: Vec<u32> = Vec::new();
    for ny in y.saturating_sub(r)..=(y + r).min(h - 1) {
        for nx in x.saturating_sub(r)..=(x + r).min(w - 1) {
            let j = ny * w + nx;
            let label = input.labels[j];
            if label == 0 {
                continue;
            }
            let d = (input.points.point(j) - p).norm();
            if d.is_nan() || d >= input.max_distance {
                continue;
            }
            if !touched.contains(&label) {
                touched.push(label);
            }
            let closer = match best {
                None => true,
                Some((bd, bl)) => d < bd || (d == bd && label < bl),
            };
            if closer {
                best = Some((d, label));
            }
        }
    }

    let (_, label) = best?;
    touched.sort_unstable();
    Some(PointVote {
        index,
        label,
        touched,
    })
}

/// Attach unclaimed pixels to nearby seed clusters and build the symmetric
/// adjacency matrix (diagonal set).
///
/// Newly assigned pixels are appended to their cluster in raster order.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(clusters = clusters.len()))
)]
pub(crate) fn assign_edge_points(
    backend: &dyn ComputeBackend,
    points: &PointCloudView<'_>,
    params: &SegmenterParams,
    buffers: &mut LabelBuffers,
    clusters: &mut [Vec<usize>],
) -> BoolMatrix {
    let n = clusters.len();
    let mut adjacency = BoolMatrix::new(n);
    adjacency.set_diagonal(true);
    if n == 0 {
        return adjacency;
    }

    let votes = backend.assign_points(&AssignmentInput {
        points: *points,
        elements: &buffers.elements,
        labels: &buffers.cluster,
        radius: params.assignment_radius,
        max_distance: params.assignment_max_distance,
    });

    for vote in &votes {
        for (k, &a) in vote.touched.iter().enumerate() {
            for &b in &vote.touched[k + 1..] {
                adjacency.set_symmetric(a as usize - 1, b as usize - 1, true);
            }
        }
    }
    for vote in &votes {
        buffers.claim(vote.index, vote.label);
        clusters[vote.label as usize - 1].push(vote.index);
    }

    debug!(
        "assigned {} edge points, {} adjacent cluster pairs",
        votes.len(),
        (adjacency.count_true() - n) / 2
    );
    adjacency
}
