//! Assignment of points no seed cluster claimed.
//!
//! Unclaimed pixels are grown into secondary clusters by 3D proximity. Each
//! secondary cluster, in creation order, then either merges into a bordering
//! blob or becomes a blob of its own:
//!
//! * no bordering blob: new blob;
//! * one bordering blob, fewer than `small_cluster_size` pixels: merge;
//! * one bordering blob, larger: merge only if at least
//!   `boundary_tolerance` boundary contacts lead outside both the cluster
//!   and that blob, otherwise the cluster is enclosed by the blob and stands
//!   on its own;
//! * several blobs: resolved by [`AmbiguousMergePolicy`].
//!
//! Bordering is decided per blob, so it does not matter how many seed
//! clusters the surrounding blob was composed from.

use std::collections::BTreeMap;

use depthseg_core::{neighbors8, DepthImageView, PointCloudView};
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::{AmbiguousMergePolicy, SegmenterParams};
use crate::state::LabelBuffers;

/// Contacts of a secondary cluster with labeled pixels around it.
#[derive(Debug, Default)]
struct Border {
    /// blob id -> number of pixel contacts
    contacts: BTreeMap<u32, usize>,
}

fn gather_border(
    points: &PointCloudView<'_>,
    depth: &DepthImageView<'_>,
    params: &SegmenterParams,
    buffers: &LabelBuffers,
    members: &[usize],
    id: u32,
) -> Border {
    let mut border = Border::default();
    for &p in members {
        for q in neighbors8(buffers.width, buffers.height, p) {
            let blob = buffers.blob[q];
            if blob == 0
                || buffers.cluster[q] == id
                || depth.value(q) == params.invalid_depth
                || points.distance(p, q) >= params.blobs_eucl_distance
            {
                continue;
            }
            *border.contacts.entry(blob).or_default() += 1;
        }
    }
    border
}

/// Count boundary contacts leading neither into cluster `id` nor into
/// `blob`, stopping at `limit`.
fn open_contacts(
    depth: &DepthImageView<'_>,
    params: &SegmenterParams,
    buffers: &LabelBuffers,
    members: &[usize],
    id: u32,
    blob: u32,
    limit: usize,
) -> usize {
    let mut count = 0;
    for &p in members {
        for q in neighbors8(buffers.width, buffers.height, p) {
            if buffers.blob[q] != blob
                && buffers.cluster[q] != id
                && depth.value(q) != params.invalid_depth
            {
                count += 1;
                if count >= limit {
                    return count;
                }
            }
        }
    }
    count
}

/// Blob the cluster should merge into, `None` for a new blob.
fn decide(
    depth: &DepthImageView<'_>,
    params: &SegmenterParams,
    buffers: &LabelBuffers,
    members: &[usize],
    id: u32,
    border: &Border,
) -> Option<u32> {
    match border.contacts.len() {
        0 => None,
        1 => {
            let blob = *border.contacts.keys().next()?;
            if members.len() < params.small_cluster_size {
                return Some(blob);
            }
            let open = open_contacts(
                depth,
                params,
                buffers,
                members,
                id,
                blob,
                params.boundary_tolerance,
            );
            (open >= params.boundary_tolerance).then_some(blob)
        }
        _ => match params.ambiguous_merge {
            AmbiguousMergePolicy::LongestSharedBoundary => {
                // BTreeMap iterates ascending, so the first maximum is the lowest id
                let mut best: Option<(u32, usize)> = None;
                for (&blob, &n) in &border.contacts {
                    if best.is_none_or(|(_, bn)| n > bn) {
                        best = Some((blob, n));
                    }
                }
                best.map(|(blob, _)| blob)
            }
            AmbiguousMergePolicy::Detach => None,
        },
    }
}

/// Grow the unclaimed pixels into secondary clusters (appended to
/// `clusters`) and attach each to a blob (appended to or created in `blobs`).
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(blobs = blobs.len()))
)]
pub(crate) fn assign_remaining_points(
    points: &PointCloudView<'_>,
    depth: &DepthImageView<'_>,
    params: &SegmenterParams,
    buffers: &mut LabelBuffers,
    clusters: &mut Vec<Vec<usize>>,
    blobs: &mut Vec<Vec<usize>>,
) {
    let (w, h) = (buffers.width, buffers.height);
    let first_secondary = clusters.len();
    let mut stack = Vec::new();
    for start in 0..buffers.len() {
        if !buffers.elements[start] {
            continue;
        }
        let id = clusters.len() as u32 + 1;
        let mut members = vec![start];
        buffers.claim(start, id);
        stack.push(start);
        while let Some(p) = stack.pop() {
            for q in neighbors8(w, h, p) {
                if buffers.elements[q] && points.distance(p, q) < params.blobs_eucl_distance {
                    buffers.claim(q, id);
                    members.push(q);
                    stack.push(q);
                }
            }
        }
        members.sort_unstable();
        clusters.push(members);
    }

    let (mut merged, mut created) = (0usize, 0usize);
    for c in first_secondary..clusters.len() {
        let id = c as u32 + 1;
        let members = &clusters[c];
        let border = gather_border(points, depth, params, buffers, members, id);
        let blob = match decide(depth, params, buffers, members, id, &border) {
            Some(blob) => {
                blobs[blob as usize - 1].push(c);
                merged += 1;
                blob
            }
            None => {
                blobs.push(vec![c]);
                created += 1;
                blobs.len() as u32
            }
        };
        for &p in members {
            buffers.blob[p] = blob;
        }
    }
    debug!(
        "remaining points: {} clusters, {} merged, {} new blobs",
        clusters.len() - first_secondary,
        merged,
        created
    );
}
