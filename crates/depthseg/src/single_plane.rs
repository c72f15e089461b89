//! Single plane mode: segment the dominant plane, then split everything
//! else by depth continuity.
//!
//! Blob 1 is the dominant plane (the largest seed cluster plus every still
//! unclaimed point near its best RANSAC plane). The rest of the image is
//! depth-grown into blobs 2, 3, ...; regions below `min_cluster_size` are
//! returned to label 0.

use depthseg_core::{neighbors8, DepthImageView, Plane, PointCloudView};
use log::{debug, warn};
use rand::Rng;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::backend::ComputeBackend;
use crate::coplanarity::sample_plane;
use crate::params::SegmenterParams;
use crate::state::LabelBuffers;

/// Index of the largest cluster, earliest on ties.
fn largest_cluster(clusters: &[Vec<usize>]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, c) in clusters.iter().enumerate() {
        if best.is_none_or(|b| c.len() > clusters[b].len()) {
            best = Some(i);
        }
    }
    best
}

/// Best of `ransac_passes` planes sampled from `members`, scored by
/// stride-subsampled members within half the RANSAC distance.
pub(crate) fn fit_dominant_plane<R: Rng>(
    backend: &dyn ComputeBackend,
    points: &PointCloudView<'_>,
    members: &[usize],
    params: &SegmenterParams,
    rng: &mut R,
) -> Option<Plane> {
    let planes: Vec<Option<Plane>> = (0..params.ransac_passes)
        .map(|_| sample_plane(rng, points, members))
        .collect();
    let counts = backend.classify_points(
        points,
        members,
        params.ransac_subset,
        &planes,
        params.ransac_eucl_distance / 2.0,
    );
    let mut best: Option<(Plane, usize)> = None;
    for (plane, c) in planes.iter().zip(&counts) {
        let Some(plane) = plane else { continue };
        if best.is_none_or(|(_, on)| c.on > on) {
            best = Some((*plane, c.on));
        }
    }
    best.map(|(plane, _)| plane)
}

/// Label the dominant plane and depth-grow the rest. Returns the plane used
/// and the number of blobs.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(clusters = clusters.len()))
)]
pub(crate) fn segment_single_plane<R: Rng>(
    backend: &dyn ComputeBackend,
    points: &PointCloudView<'_>,
    depth: &DepthImageView<'_>,
    params: &SegmenterParams,
    buffers: &mut LabelBuffers,
    clusters: &[Vec<usize>],
    rng: &mut R,
) -> (Option<Plane>, usize) {
    let mut open = buffers.valid.clone();
    buffers.blob.fill(0);

    let dominant = largest_cluster(clusters);
    let plane = dominant.and_then(|d| fit_dominant_plane(backend, points, &clusters[d], params, rng));
    match (dominant, plane) {
        (Some(d), Some(plane)) => {
            let dominant_id = d as u32 + 1;
            let inliers = backend.plane_inliers(points, &plane, params.ransac_eucl_distance);
            for i in 0..buffers.len() {
                if buffers.cluster[i] == dominant_id || (open[i] && inliers[i]) {
                    buffers.blob[i] = 1;
                    open[i] = false;
                }
            }
        }
        _ => warn!("no dominant plane found; depth-growing the whole image"),
    }

    let n = grow_by_depth(depth, params, buffers, &mut open);
    buffers.elements = open;
    debug!("single plane mode: {} blobs", n);
    (plane, n)
}

/// Depth-continuity growing of the `open` pixels into ids starting at 2.
fn grow_by_depth(
    depth: &DepthImageView<'_>,
    params: &SegmenterParams,
    buffers: &mut LabelBuffers,
    open: &mut [bool],
) -> usize {
    let (w, h) = (buffers.width, buffers.height);
    let mut next_id = 2u32;
    let mut released = Vec::new();
    let mut stack = Vec::new();
    for start in 0..open.len() {
        if !open[start] {
            continue;
        }
        let mut members = vec![start];
        open[start] = false;
        buffers.blob[start] = next_id;
        stack.push(start);
        while let Some(p) = stack.pop() {
            for q in neighbors8(w, h, p) {
                if open[q] && (depth.value(p) - depth.value(q)).abs() < params.blobs_eucl_distance {
                    open[q] = false;
                    buffers.blob[q] = next_id;
                    members.push(q);
                    stack.push(q);
                }
            }
        }
        if members.len() < params.min_cluster_size {
            for &p in &members {
                buffers.blob[p] = 0;
            }
            released.extend(members);
        } else {
            next_id += 1;
        }
    }
    for p in released {
        open[p] = true;
    }
    next_id as usize - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SequentialBackend;
    use crate::region_grow::grow_seed_clusters;
    use crate::testutil::Scene;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn run(scene: &Scene, params: &SegmenterParams) -> (LabelBuffers, Option<Plane>, usize) {
        let mut buffers = LabelBuffers::reset(&scene.points(), None);
        let clusters = grow_seed_clusters(&scene.edges(), params, &mut buffers);
        let mut rng = StdRng::seed_from_u64(9);
        let (plane, n) = segment_single_plane(
            &SequentialBackend,
            &scene.points(),
            &scene.depth(),
            params,
            &mut buffers,
            &clusters,
            &mut rng,
        );
        (buffers, plane, n)
    }

    /// Table at z = 100 with a box (z = 60) on it and a far wall strip.
    fn table_scene() -> Scene {
        Scene::new(30, 30, |u, v| {
            let z = if (10..18).contains(&u) && (10..18).contains(&v) {
                60.0
            } else if u >= 26 {
                400.0
            } else {
                100.0
            };
            [u as f32, v as f32, z]
        })
        .with_seeds(|u, v| u < 8 && v < 8)
    }

    #[test]
    fn largest_cluster_prefers_earliest() {
        let clusters = vec![vec![1, 2], vec![3, 4, 5], vec![6, 7, 8]];
        assert_eq!(largest_cluster(&clusters), Some(1));
        assert_eq!(largest_cluster(&[]), None);
    }

    #[test]
    fn plane_blob_and_depth_blobs() {
        let scene = table_scene();
        let (buffers, plane, n) = run(&scene, &SegmenterParams::default());
        let plane = plane.expect("table plane");
        assert!(plane.normal.z.abs() > 0.999);

        // table (seeded corner and the rest of the z = 100 surface)
        assert_eq!(buffers.blob[0], 1);
        assert_eq!(buffers.blob[20 * 30 + 20], 1);
        // box and wall are depth-grown separately
        let box_label = buffers.blob[14 * 30 + 14];
        let wall_label = buffers.blob[5 * 30 + 28];
        assert!(box_label >= 2 && wall_label >= 2);
        assert_ne!(box_label, wall_label);
        assert_eq!(n, 3);
    }

    #[test]
    fn undersized_depth_regions_return_to_zero() {
        let scene = table_scene();
        let params = SegmenterParams::default().with_min_cluster_size(100);
        // seeds (64 px) are below the size limit now, so there is no plane
        let (buffers, plane, n) = run(&scene, &params);
        assert!(plane.is_none());
        // box (64 px) and wall (120 px): only the wall survives, as blob 3
        // after the table surface took blob 2
        assert_eq!(buffers.blob[14 * 30 + 14], 0);
        assert!(buffers.elements[14 * 30 + 14]);
        assert_eq!(buffers.blob[0], 2);
        assert_eq!(buffers.blob[5 * 30 + 28], 3);
        assert_eq!(n, 3);
    }
}
