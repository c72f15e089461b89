use depthseg_core::{label_color, Plane, PlaneSide, PointCloudView, SideCounts};

use super::ComputeBackend;
use crate::adjacency::{vote_for_point, AssignmentInput, PointVote};

/// Single-threaded reference backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialBackend;

impl ComputeBackend for SequentialBackend {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn is_accelerated(&self) -> bool {
        false
    }

    fn assign_points(&self, input: &AssignmentInput<'_>) -> Vec<PointVote> {
        (0..input.labels.len())
            .filter_map(|i| vote_for_point(input, i))
            .collect()
    }

    fn classify_points(
        &self,
        points: &PointCloudView<'_>,
        indices: &[usize],
        stride: usize,
        planes: &[Option<Plane>],
        tolerance: f32,
    ) -> Vec<SideCounts> {
        planes
            .iter()
            .map(|plane| {
                let mut counts = SideCounts::default();
                if let Some(plane) = plane {
                    for &i in indices.iter().step_by(stride.max(1)) {
                        counts.record(plane.side(&points.point(i), tolerance));
                    }
                }
                counts
            })
            .collect()
    }

    fn plane_inliers(
        &self,
        points: &PointCloudView<'_>,
        plane: &Plane,
        tolerance: f32,
    ) -> Vec<bool> {
        (0..points.len())
            .map(|i| plane.side(&points.point(i), tolerance) == PlaneSide::On)
            .collect()
    }

    fn colorize(&self, labels: &[u32], out: &mut [u8]) {
        for (px, &label) in out.chunks_exact_mut(3).zip(labels) {
            px.copy_from_slice(&label_color(label));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn stride_subsamples_tested_points() {
        let data: Vec<[f32; 4]> = (0..10).map(|i| [i as f32, 0.0, i as f32, 1.0]).collect();
        let points = PointCloudView {
            width: 10,
            height: 1,
            data: &data,
        };
        let plane = Plane::from_points(
            &Vector3::new(0.0, 0.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
            &Vector3::new(0.0, 1.0, 0.0),
        );
        let indices: Vec<usize> = (0..10).collect();
        let counts =
            SequentialBackend.classify_points(&points, &indices, 3, &[plane, None], 0.5);
        // indices 0, 3, 6, 9
        assert_eq!(counts[0].total(), 4);
        assert_eq!(counts[0].on, 1);
        assert_eq!(counts[0].above + counts[0].below, 3);
        assert_eq!(counts[1], SideCounts::default());
    }

    #[test]
    fn colorize_writes_three_bytes_per_label() {
        let mut out = vec![0u8; 6];
        SequentialBackend.colorize(&[0, 1], &mut out);
        assert_eq!(&out[..3], &[128, 128, 128]);
        assert_eq!(&out[3..], &label_color(1));
    }
}
