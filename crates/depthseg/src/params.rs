use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// World-space window on the point cloud's `x`/`y` coordinates. Pixels whose
/// points fall outside it never take part in segmentation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiFilter {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl RoiFilter {
    #[inline]
    pub fn contains(&self, p: &Vector3<f32>) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }
}

/// What to do with a remaining-points cluster bordering several blobs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguousMergePolicy {
    /// Merge into the bordering blob with the most contacts; lowest blob id on ties.
    #[default]
    LongestSharedBoundary,
    /// Keep the cluster as a blob of its own.
    Detach,
}

/// Parameters of the segmentation pipeline.
///
/// Distances are in the units of the point cloud (millimetres for a Kinect
/// style sensor, which is what the defaults are tuned for).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterParams {
    /// Seed clusters smaller than this are discarded.
    pub min_cluster_size: usize,
    /// Use union-find component labeling instead of the work-list flood.
    pub use_fast_growing: bool,
    /// Edge-image value marking a seed pixel.
    pub seed_value: u8,
    /// Pixel window radius searched when attaching edge points to clusters.
    pub assignment_radius: usize,
    /// Maximum 3D distance between an edge point and a cluster point.
    pub assignment_max_distance: f32,
    /// Half-width of the "on plane" slab in the coplanarity test.
    pub ransac_eucl_distance: f32,
    /// Random planes sampled per ordered cluster pair.
    pub ransac_passes: usize,
    /// A plane is accepted if fewer than this many test points lie on one side.
    pub ransac_tolerance: usize,
    /// Only every n-th point of the tested cluster is classified.
    pub ransac_subset: usize,
    /// Connectivity distance for remaining points and for depth growing.
    pub blobs_eucl_distance: f32,
    pub roi: Option<RoiFilter>,
    /// Request the data-parallel backend.
    pub use_accelerated_backend: bool,
    /// Worker threads of the accelerated backend, 0 for the rayon default.
    pub accelerated_threads: usize,
    /// RNG seed for plane sampling. `None` draws one from OS entropy.
    pub seed: Option<u64>,
    /// Remaining-points clusters below this size merge into their only neighbour.
    pub small_cluster_size: usize,
    /// Inconsistent boundary contacts that let a large cluster merge.
    pub boundary_tolerance: usize,
    /// Depth value reported by the sensor for missing measurements.
    pub invalid_depth: f32,
    pub ambiguous_merge: AmbiguousMergePolicy,
    /// Upper bound on candidate groups enumerated during composition.
    pub max_candidate_groups: usize,
}

impl Default for SegmenterParams {
    fn default() -> Self {
        Self {
            min_cluster_size: 25,
            use_fast_growing: false,
            seed_value: 255,
            assignment_radius: 5,
            assignment_max_distance: 15.0,
            ransac_eucl_distance: 15.0,
            ransac_passes: 20,
            ransac_tolerance: 30,
            ransac_subset: 2,
            blobs_eucl_distance: 15.0,
            roi: None,
            use_accelerated_backend: true,
            accelerated_threads: 0,
            seed: None,
            small_cluster_size: 15,
            boundary_tolerance: 10,
            // raw Kinect "no reading"
            invalid_depth: 2047.0,
            ambiguous_merge: AmbiguousMergePolicy::default(),
            max_candidate_groups: 1 << 16,
        }
    }
}

/// Errors raised for parameter values the pipeline cannot run with.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("{name} must be at least 1")]
    ZeroCount { name: &'static str },
    #[error("{name} must be finite and positive (got {value})")]
    InvalidDistance { name: &'static str, value: f32 },
    #[error("invalid ROI: x [{x_min}, {x_max}], y [{y_min}, {y_max}]")]
    InvalidRoi {
        x_min: f32,
        x_max: f32,
        y_min: f32,
        y_max: f32,
    },
    #[error("invalid depth sentinel must be finite (got {0})")]
    InvalidDepthSentinel(f32),
}

impl SegmenterParams {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_min_cluster_size(mut self, size: usize) -> Self {
        self.min_cluster_size = size;
        self
    }

    #[must_use]
    pub fn with_fast_growing(mut self, enabled: bool) -> Self {
        self.use_fast_growing = enabled;
        self
    }

    /// Set the edge-point assignment window radius and distance.
    #[must_use]
    pub fn with_assignment(mut self, radius: usize, max_distance: f32) -> Self {
        self.assignment_radius = radius;
        self.assignment_max_distance = max_distance;
        self
    }

    /// Set the coplanarity test knobs.
    #[must_use]
    pub fn with_ransac(mut self, eucl_distance: f32, passes: usize, tolerance: usize) -> Self {
        self.ransac_eucl_distance = eucl_distance;
        self.ransac_passes = passes;
        self.ransac_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_blobs_distance(mut self, distance: f32) -> Self {
        self.blobs_eucl_distance = distance;
        self
    }

    #[must_use]
    pub fn with_roi(mut self, roi: RoiFilter) -> Self {
        self.roi = Some(roi);
        self
    }

    #[must_use]
    pub fn with_accelerated_backend(mut self, enabled: bool) -> Self {
        self.use_accelerated_backend = enabled;
        self
    }

    /// Reject values the pipeline cannot run with. Nothing is clamped.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let counts = [
            ("min_cluster_size", self.min_cluster_size),
            ("assignment_radius", self.assignment_radius),
            ("ransac_passes", self.ransac_passes),
            ("ransac_tolerance", self.ransac_tolerance),
            ("ransac_subset", self.ransac_subset),
            ("boundary_tolerance", self.boundary_tolerance),
            ("max_candidate_groups", self.max_candidate_groups),
        ];
        if let Some(&(name, _)) = counts.iter().find(|(_, v)| *v == 0) {
            return Err(ParamsError::ZeroCount { name });
        }

        let distances = [
            ("assignment_max_distance", self.assignment_max_distance),
            ("ransac_eucl_distance", self.ransac_eucl_distance),
            ("blobs_eucl_distance", self.blobs_eucl_distance),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value <= 0.0 {
                return Err(ParamsError::InvalidDistance { name, value });
            }
        }

        if let Some(roi) = self.roi {
            let finite = [roi.x_min, roi.x_max, roi.y_min, roi.y_max]
                .iter()
                .all(|v| v.is_finite());
            if !finite || roi.x_min > roi.x_max || roi.y_min > roi.y_max {
                return Err(ParamsError::InvalidRoi {
                    x_min: roi.x_min,
                    x_max: roi.x_max,
                    y_min: roi.y_min,
                    y_max: roi.y_max,
                });
            }
        }

        if !self.invalid_depth.is_finite() {
            return Err(ParamsError::InvalidDepthSentinel(self.invalid_depth));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let params = SegmenterParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.min_cluster_size, 25);
        assert_eq!(params.ransac_subset, 2);
        assert!(params.use_accelerated_backend);
    }

    #[test]
    fn zero_counts_are_rejected_by_name() {
        let params = SegmenterParams {
            ransac_subset: 0,
            ..Default::default()
        };
        assert_eq!(
            params.validate(),
            Err(ParamsError::ZeroCount {
                name: "ransac_subset"
            })
        );
        let params = SegmenterParams::default().with_min_cluster_size(0);
        assert!(matches!(
            params.validate(),
            Err(ParamsError::ZeroCount {
                name: "min_cluster_size"
            })
        ));
    }

    #[test]
    fn non_positive_or_nan_distances_are_rejected() {
        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let params = SegmenterParams::default().with_blobs_distance(bad);
            assert!(
                matches!(params.validate(), Err(ParamsError::InvalidDistance { .. })),
                "distance {bad} accepted"
            );
        }
    }

    #[test]
    fn inverted_roi_is_rejected() {
        let params = SegmenterParams::default().with_roi(RoiFilter {
            x_min: 10.0,
            x_max: -10.0,
            y_min: 0.0,
            y_max: 1.0,
        });
        assert!(matches!(
            params.validate(),
            Err(ParamsError::InvalidRoi { .. })
        ));
    }

    #[test]
    fn roi_bounds_are_inclusive() {
        let roi = RoiFilter {
            x_min: 0.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 1.0,
        };
        assert!(roi.contains(&Vector3::new(1.0, 0.0, 7.0)));
        assert!(!roi.contains(&Vector3::new(1.5, 0.0, 7.0)));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let params: SegmenterParams =
            serde_json::from_str(r#"{ "min_cluster_size": 40, "ambiguous_merge": "detach" }"#)
                .unwrap();
        assert_eq!(params.min_cluster_size, 40);
        assert_eq!(params.ambiguous_merge, AmbiguousMergePolicy::Detach);
        assert_eq!(params.ransac_passes, 20);
    }

    #[test]
    fn negative_count_fails_to_deserialize() {
        let res: Result<SegmenterParams, _> = serde_json::from_str(r#"{ "ransac_passes": -3 }"#);
        assert!(res.is_err());
    }
}
