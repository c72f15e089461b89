use std::sync::atomic::{AtomicUsize, Ordering};

use depthseg_core::{label_color, Plane, PlaneSide, PointCloudView, SideCounts};
use rayon::prelude::*;

use super::{BackendError, ComputeBackend};
use crate::adjacency::{vote_for_point, AssignmentInput, PointVote};

/// Data-parallel backend on a dedicated rayon pool.
///
/// Assignment runs one task per pixel and the host merges the votes.
/// Plane classification runs one task per `(pass, point)` pair with atomic
/// side counters.
#[derive(Debug)]
pub struct ParallelBackend {
    pool: rayon::ThreadPool,
}

impl ParallelBackend {
    /// `threads == 0` lets rayon choose.
    pub fn new(threads: usize) -> Result<Self, BackendError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("depthseg-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

#[derive(Default)]
struct AtomicCounts {
    above: AtomicUsize,
    below: AtomicUsize,
    on: AtomicUsize,
}

impl AtomicCounts {
    fn record(&self, side: PlaneSide) {
        let slot = match side {
            PlaneSide::Above => &self.above,
            PlaneSide::Below => &self.below,
            PlaneSide::On => &self.on,
        };
        slot.fetch_add(1, Ordering::Relaxed);
    }

    fn into_counts(self) -> SideCounts {
        SideCounts {
            above: self.above.into_inner(),
            below: self.below.into_inner(),
            on: self.on.into_inner(),
        }
    }
}

impl ComputeBackend for ParallelBackend {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn is_accelerated(&self) -> bool {
        true
    }

    fn assign_points(&self, input: &AssignmentInput<'_>) -> Vec<PointVote> {
        self.pool.install(|| {
            (0..input.labels.len())
                .into_par_iter()
                .filter_map(|i| vote_for_point(input, i))
                .collect()
        })
    }

    fn classify_points(
        &self,
        points: &PointCloudView<'_>,
        indices: &[usize],
        stride: usize,
        planes: &[Option<Plane>],
        tolerance: f32,
    ) -> Vec<SideCounts> {
        let sampled: Vec<usize> = indices.iter().step_by(stride.max(1)).copied().collect();
        let passes = planes.len();
        let counters: Vec<AtomicCounts> = (0..passes).map(|_| AtomicCounts::default()).collect();

        self.pool.install(|| {
            (0..passes * sampled.len())
                .into_par_iter()
                .for_each(|id| {
                    let pass = id % passes;
                    if let Some(plane) = &planes[pass] {
                        let p = points.point(sampled[id / passes]);
                        counters[pass].record(plane.side(&p, tolerance));
                    }
                });
        });
        counters.into_iter().map(AtomicCounts::into_counts).collect()
    }

    fn plane_inliers(
        &self,
        points: &PointCloudView<'_>,
        plane: &Plane,
        tolerance: f32,
    ) -> Vec<bool> {
        self.pool.install(|| {
            (0..points.len())
                .into_par_iter()
                .map(|i| plane.side(&points.point(i), tolerance) == PlaneSide::On)
                .collect()
        })
    }

    fn colorize(&self, labels: &[u32], out: &mut [u8]) {
        self.pool.install(|| {
            out.par_chunks_exact_mut(3)
                .zip(labels.par_iter())
                .for_each(|(px, &label)| px.copy_from_slice(&label_color(label)));
        });
    }
}
