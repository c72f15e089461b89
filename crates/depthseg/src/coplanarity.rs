//! RANSAC cut-free test between adjacent clusters.
//!
//! For an ordered pair `(a, b)`, planes are sampled from three random points
//! of `a` and the points of `b` are classified against each. A pass is
//! accepted if one side of the plane holds fewer than `ransac_tolerance`
//! points of `b`; `a` is cut-free towards `b` if accepted passes outnumber
//! rejected ones.

use depthseg_core::{BoolMatrix, Plane, PointCloudView};
use log::debug;
use rand::Rng;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::backend::ComputeBackend;
use crate::params::SegmenterParams;

/// Degenerate triples are redrawn at most this many times per pass.
pub const MAX_SAMPLE_ATTEMPTS: usize = 16;

/// Sample a plane through three random members of a cluster (with
/// replacement). Coincident or collinear draws are retried; `None` once the
/// attempts are exhausted or the cluster has fewer than three points.
pub fn sample_plane<R: Rng>(
    rng: &mut R,
    points: &PointCloudView<'_>,
    members: &[usize],
) -> Option<Plane> {
    if members.len() < 3 {
        return None;
    }
    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        let p0 = points.point(members[rng.gen_range(0..members.len())]);
        let p1 = points.point(members[rng.gen_range(0..members.len())]);
        let p2 = points.point(members[rng.gen_range(0..members.len())]);
        if let Some(plane) = Plane::from_points(&p0, &p1, &p2) {
            return Some(plane);
        }
    }
    None
}

/// Accepted and rejected RANSAC passes for one ordered pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct PairVotes {
    pub accepted: usize,
    pub rejected: usize,
}

impl PairVotes {
    pub fn is_cut_free(&self) -> bool {
        self.accepted > self.rejected
    }
}

pub(crate) fn vote_pair<R: Rng>(
    backend: &dyn ComputeBackend,
    points: &PointCloudView<'_>,
    source: &[usize],
    tested: &[usize],
    params: &SegmenterParams,
    rng: &mut R,
) -> PairVotes {
    let planes: Vec<Option<Plane>> = (0..params.ransac_passes)
        .map(|_| sample_plane(rng, points, source))
        .collect();
    let counts = backend.classify_points(
        points,
        tested,
        params.ransac_subset,
        &planes,
        params.ransac_eucl_distance,
    );
    let accepted = planes
        .iter()
        .zip(&counts)
        .filter(|(plane, c)| plane.is_some() && c.is_cut_free(params.ransac_tolerance))
        .count();
    PairVotes {
        accepted,
        rejected: planes.len() - accepted,
    }
}

/// Cut-free matrix over all clusters. Non-adjacent pairs are `false`, the
/// diagonal is `true`. Not symmetric in general.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(clusters = clusters.len()))
)]
pub(crate) fn cutfree_matrix<R: Rng>(
    backend: &dyn ComputeBackend,
    points: &PointCloudView<'_>,
    clusters: &[Vec<usize>],
    adjacency: &BoolMatrix,
    params: &SegmenterParams,
    rng: &mut R,
) -> BoolMatrix {
    let n = clusters.len();
    let mut cutfree = BoolMatrix::new(n);
    for a in 0..n {
        for b in 0..n {
            if a == b {
                cutfree.set(a, a, true);
            } else if adjacency.get(a, b) {
                let votes = vote_pair(backend, points, &clusters[a], &clusters[b], params, rng);
                cutfree.set(a, b, votes.is_cut_free());
            }
        }
    }
    debug!("cut-free ordered pairs: {}", cutfree.count_true() - n);
    cutfree
}
