//! Seed clusters from the edge image.
//!
//! A seed is a pixel whose edge value equals `seed_value`. Seeds are grouped
//! into 8-connected clusters; clusters smaller than `min_cluster_size` are
//! released back to the pool once the scan is complete. Cluster ids are
//! 1-based and contiguous.

use depthseg_core::{neighbors8, neighbors8_backward, GrayImageView};
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::SegmenterParams;
use crate::state::LabelBuffers;

/// Grow seed clusters, writing cluster ids into `buffers.cluster` and
/// claiming their pixels. Returns the pixel lists of the kept clusters, each
/// in raster order.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(fast = params.use_fast_growing))
)]
pub(crate) fn grow_seed_clusters(
    edges: &GrayImageView<'_>,
    params: &SegmenterParams,
    buffers: &mut LabelBuffers,
) -> Vec<Vec<usize>> {
    let clusters = if params.use_fast_growing {
        grow_by_components(edges, params.seed_value, params.min_cluster_size, buffers)
    } else {
        grow_by_flood(edges, params.seed_value, params.min_cluster_size, buffers)
    };
    debug!(
        "seed clusters: {} (claimed {} px)",
        clusters.len(),
        clusters.iter().map(Vec::len).sum::<usize>()
    );
    clusters
}

fn grow_by_flood(
    edges: &GrayImageView<'_>,
    seed_value: u8,
    min_size: usize,
    buffers: &mut LabelBuffers,
) -> Vec<Vec<usize>> {
    let (w, h) = (buffers.width, buffers.height);
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut released = Vec::new();
    let mut stack = Vec::new();

    for start in 0..buffers.len() {
        if !buffers.elements[start] || edges.value(start) != seed_value {
            continue;
        }
        let id = clusters.len() as u32 + 1;
        let mut members = vec![start];
        buffers.claim(start, id);
        stack.push(start);
        while let Some(p) = stack.pop() {
            for q in neighbors8(w, h, p) {
                if buffers.elements[q] && edges.value(q) == seed_value {
                    buffers.claim(q, id);
                    members.push(q);
                    stack.push(q);
                }
            }
        }

        if members.len() < min_size {
            // stays claimed until the scan ends so it cannot be re-seeded
            for &p in &members {
                buffers.cluster[p] = 0;
            }
            released.extend(members);
        } else {
            members.sort_unstable();
            clusters.push(members);
        }
    }

    for p in released {
        buffers.elements[p] = true;
    }
    clusters
}

/// Union-find over the whole edge image. Pixels outside the ROI are dropped
/// from each component before the size filter.
fn grow_by_components(
    edges: &GrayImageView<'_>,
    seed_value: u8,
    min_size: usize,
    buffers: &mut LabelBuffers,
) -> Vec<Vec<usize>> {
    let n = buffers.len();
    let mut forest = DisjointSet::new(n);
    for idx in 0..n {
        if edges.value(idx) != seed_value {
            continue;
        }
        for q in neighbors8_backward(buffers.width, idx) {
            if edges.value(q) == seed_value {
                forest.union(idx, q);
            }
        }
    }

    // component per root, ordered by first raster pixel
    let mut slot_of_root = vec![usize::MAX; n];
    let mut components: Vec<Vec<usize>> = Vec::new();
    for idx in 0..n {
        if edges.value(idx) != seed_value {
            continue;
        }
        let root = forest.find(idx);
        if slot_of_root[root] == usize::MAX {
            slot_of_root[root] = components.len();
            components.push(Vec::new());
        }
        if buffers.elements[idx] {
            components[slot_of_root[root]].push(idx);
        }
    }

    let mut clusters = Vec::new();
    for members in components {
        if members.len() < min_size {
            continue;
        }
        let id = clusters.len() as u32 + 1;
        for &p in &members {
            buffers.claim(p, id);
        }
        clusters.push(members);
    }
    clusters
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// The smaller index becomes the root.
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Scene;

    fn grow(scene: &Scene, params: &SegmenterParams) -> (Vec<Vec<usize>>, LabelBuffers) {
        let mut buffers = LabelBuffers::reset(&scene.points(), params.roi.as_ref());
        let clusters = grow_seed_clusters(&scene.edges(), params, &mut buffers);
        (clusters, buffers)
    }

    fn two_blocks() -> Scene {
        Scene::flat(20, 10, 100.0).with_seeds(|u, _| u < 8 || u > 10)
    }

    #[test]
    fn separated_seed_regions_become_clusters() {
        let scene = two_blocks();
        let (clusters, buffers) = grow(&scene, &SegmenterParams::default());
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 80);
        assert_eq!(clusters[1].len(), 90);
        assert_eq!(buffers.cluster[0], 1);
        assert_eq!(buffers.cluster[19], 2);
        // gap column stays unclaimed
        assert!(buffers.elements[9]);
        assert_eq!(buffers.cluster[9], 0);
        assert!(clusters[0].windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn undersized_seed_cluster_is_released() {
        let scene = Scene::flat(20, 20, 100.0).with_seeds(|u, v| (5..8).contains(&u) && (5..8).contains(&v));
        let (clusters, buffers) = grow(&scene, &SegmenterParams::default());
        assert!(clusters.is_empty());
        assert!(buffers.elements.iter().all(|&e| e), "released pixels must be unclaimed");
        assert!(buffers.cluster.iter().all(|&c| c == 0));
    }

    #[test]
    fn discarded_cluster_does_not_consume_an_id() {
        // a 2x2 speck first in raster order, then a large block
        let scene = Scene::flat(20, 20, 100.0)
            .with_seeds(|u, v| (u < 2 && v < 2) || (u >= 10 && v >= 10));
        let (clusters, buffers) = grow(&scene, &SegmenterParams::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(buffers.cluster[10 * 20 + 10], 1);
        assert!(buffers.elements[0]);
    }

    #[test]
    fn diagonal_contact_connects_seeds() {
        let scene = Scene::flat(12, 12, 100.0)
            .with_seeds(|u, v| (u < 6 && v < 6) || (u >= 6 && v >= 6));
        let (clusters, _) = grow(&scene, &SegmenterParams::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 72);
    }

    #[test]
    fn fast_growing_matches_flood() {
        let scene = Scene::flat(30, 16, 100.0).with_seeds(|u, v| {
            (u < 9 && v < 12) || (u > 12 && u < 20) || (u > 22 && (v + u) % 3 != 0) || (u == 10 && v == 3)
        });
        let flood = SegmenterParams::default();
        let fast = SegmenterParams::default().with_fast_growing(true);
        let (a, buf_a) = grow(&scene, &flood);
        let (b, buf_b) = grow(&scene, &fast);
        assert!(!a.is_empty());
        assert_eq!(a, b);
        assert_eq!(buf_a.cluster, buf_b.cluster);
        assert_eq!(buf_a.elements, buf_b.elements);
    }

    #[test]
    fn roi_excluded_seeds_are_ignored() {
        use crate::params::RoiFilter;
        let scene = Scene::flat(20, 10, 100.0).with_seeds(|_, _| true);
        let params = SegmenterParams::default().with_roi(RoiFilter {
            x_min: 0.0,
            x_max: 9.0,
            y_min: 0.0,
            y_max: 100.0,
        });
        for params in [params.clone(), params.with_fast_growing(true)] {
            let (clusters, buffers) = grow(&scene, &params);
            assert_eq!(clusters.len(), 1);
            assert_eq!(clusters[0].len(), 100);
            assert_eq!(buffers.cluster[15], 0);
            assert!(!buffers.elements[15]);
        }
    }
}
