use depthseg_core::{BoolMatrix, DepthImageView, GrayImageView, PointCloudView, RgbImage, SquareMatrix};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::adjacency::assign_edge_points;
use crate::backend::{select_backend, ComputeBackend};
use crate::composition::compose_blobs;
use crate::coplanarity::cutfree_matrix;
use crate::error::SegmentError;
use crate::params::{ParamsError, SegmenterParams};
use crate::region_grow::grow_seed_clusters;
use crate::remaining::assign_remaining_points;
use crate::result::{SegmentationMode, SegmentationResult};
use crate::single_plane::segment_single_plane;
use crate::state::LabelBuffers;

/// Borrowed per-frame input: the organized point cloud, the edge image that
/// marks seed pixels, and the raw depth image.
#[derive(Clone, Copy, Debug)]
pub struct SegmentationInput<'a> {
    pub points: PointCloudView<'a>,
    pub edges: GrayImageView<'a>,
    pub depth: DepthImageView<'a>,
}

impl<'a> SegmentationInput<'a> {
    pub fn new(
        points: PointCloudView<'a>,
        edges: GrayImageView<'a>,
        depth: DepthImageView<'a>,
    ) -> Self {
        Self {
            points,
            edges,
            depth,
        }
    }

    /// Check that all buffers describe the same non-empty image. Returns
    /// `(width, height)`.
    pub fn validate(&self) -> Result<(usize, usize), SegmentError> {
        let (width, height) = (self.points.width, self.points.height);
        if width == 0 || height == 0 {
            return Err(SegmentError::EmptyInput { width, height });
        }
        let expected = width * height;
        for (buffer, w, h) in [
            ("edge", self.edges.width, self.edges.height),
            ("depth", self.depth.width, self.depth.height),
        ] {
            if (w, h) != (width, height) {
                return Err(SegmentError::DimensionMismatch {
                    buffer,
                    width: w,
                    height: h,
                    expected_width: width,
                    expected_height: height,
                });
            }
        }
        for (buffer, actual) in [
            ("point", self.points.data.len()),
            ("edge", self.edges.data.len()),
            ("depth", self.depth.data.len()),
        ] {
            if actual != expected {
                return Err(SegmentError::BufferLength {
                    buffer,
                    expected,
                    actual,
                });
            }
        }
        Ok((width, height))
    }
}

/// Depth-image segmenter.
///
/// Owns validated parameters and the compute backend, chosen once at
/// construction. Every call starts from freshly reset buffers.
pub struct Segmenter {
    params: SegmenterParams,
    backend: Box<dyn ComputeBackend>,
}

impl std::fmt::Debug for Segmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segmenter")
            .field("params", &self.params)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl Segmenter {
    /// Validate `params` and select the backend they ask for.
    pub fn new(params: SegmenterParams) -> Result<Self, ParamsError> {
        params.validate()?;
        let backend = select_backend(&params);
        info!("segmenter using {} backend", backend.name());
        Ok(Self { params, backend })
    }

    /// Use an explicit backend, ignoring `use_accelerated_backend`.
    pub fn with_backend(
        params: SegmenterParams,
        backend: Box<dyn ComputeBackend>,
    ) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(Self { params, backend })
    }

    #[inline]
    pub fn params(&self) -> &SegmenterParams {
        &self.params
    }

    #[inline]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Whether the accelerated backend is actually in use.
    #[inline]
    pub fn is_accelerated(&self) -> bool {
        self.backend.is_accelerated()
    }

    fn rng(&self) -> StdRng {
        match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Full blob segmentation.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, input),
            fields(width = input.points.width, height = input.points.height)
        )
    )]
    pub fn segment(&self, input: &SegmentationInput<'_>) -> Result<SegmentationResult, SegmentError> {
        let (width, height) = input.validate()?;
        let params = &self.params;
        let backend = self.backend.as_ref();
        let mut rng = self.rng();

        let mut buffers = LabelBuffers::reset(&input.points, params.roi.as_ref());
        let mut clusters = grow_seed_clusters(&input.edges, params, &mut buffers);
        let adjacency =
            assign_edge_points(backend, &input.points, params, &mut buffers, &mut clusters);
        let cutfree = cutfree_matrix(backend, &input.points, &clusters, &adjacency, params, &mut rng);

        let composition = compose_blobs(&cutfree, params.max_candidate_groups);
        let blob_ids = composition.blob_ids();
        for (blob, &cluster) in buffers.blob.iter_mut().zip(&buffers.cluster) {
            if cluster != 0 {
                *blob = blob_ids[cluster as usize - 1];
            }
        }

        let probabilities = composition.probabilities;
        let mut blobs = composition.blobs;
        assign_remaining_points(
            &input.points,
            &input.depth,
            params,
            &mut buffers,
            &mut clusters,
            &mut blobs,
        );
        info!(
            "segmented {}x{}: {} clusters, {} blobs",
            width,
            height,
            clusters.len(),
            blobs.len()
        );

        Ok(SegmentationResult {
            mode: SegmentationMode::Blobs,
            width,
            height,
            labels: buffers.blob,
            clusters,
            blobs,
            adjacency,
            cutfree,
            probabilities,
            plane: None,
        })
    }

    /// Dominant plane plus depth-continuity blobs.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, input),
            fields(width = input.points.width, height = input.points.height)
        )
    )]
    pub fn segment_single_plane(
        &self,
        input: &SegmentationInput<'_>,
    ) -> Result<SegmentationResult, SegmentError> {
        let (width, height) = input.validate()?;
        let params = &self.params;
        let mut rng = self.rng();

        let mut buffers = LabelBuffers::reset(&input.points, params.roi.as_ref());
        let clusters = grow_seed_clusters(&input.edges, params, &mut buffers);
        let (plane, n) = segment_single_plane(
            self.backend.as_ref(),
            &input.points,
            &input.depth,
            params,
            &mut buffers,
            &clusters,
            &mut rng,
        );
        info!("single plane {}x{}: {} blobs", width, height, n);

        Ok(SegmentationResult {
            mode: SegmentationMode::SinglePlane,
            width,
            height,
            labels: buffers.blob,
            clusters,
            blobs: Vec::new(),
            adjacency: BoolMatrix::new(0),
            cutfree: BoolMatrix::new(0),
            probabilities: SquareMatrix::new(0),
            plane,
        })
    }

    /// Pseudo-color a label image on the segmenter's backend.
    pub fn colorize(&self, result: &SegmentationResult) -> RgbImage {
        self.colorize_labels(&result.labels, result.width, result.height)
    }

    pub fn colorize_labels(&self, labels: &[u32], width: usize, height: usize) -> RgbImage {
        let mut image = RgbImage::new(width, height);
        let n = labels.len().min(width * height);
        self.backend.colorize(&labels[..n], &mut image.data[..3 * n]);
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SequentialBackend;
    use crate::testutil::Scene;

    fn sequential(params: SegmenterParams) -> Segmenter {
        Segmenter::with_backend(params.with_seed(1), Box::new(SequentialBackend)).unwrap()
    }

    #[test]
    fn invalid_params_fail_construction() {
        let params = SegmenterParams {
            ransac_passes: 0,
            ..Default::default()
        };
        assert!(Segmenter::new(params).is_err());
    }

    #[test]
    fn mismatched_buffers_are_rejected_before_work() {
        let scene = Scene::flat(6, 4, 1.0);
        let short_depth = vec![0.0f32; 5];
        let mut input = scene.input();
        input.depth = DepthImageView {
            width: 6,
            height: 4,
            data: &short_depth,
        };
        let err = sequential(SegmenterParams::default()).segment(&input).unwrap_err();
        assert_eq!(
            err,
            SegmentError::BufferLength {
                buffer: "depth",
                expected: 24,
                actual: 5
            }
        );

        let mut input = scene.input();
        input.edges.width = 3;
        assert!(matches!(
            input.validate(),
            Err(SegmentError::DimensionMismatch { buffer: "edge", .. })
        ));
    }

    #[test]
    fn empty_image_is_rejected() {
        let input = SegmentationInput::new(
            PointCloudView {
                width: 0,
                height: 0,
                data: &[],
            },
            GrayImageView {
                width: 0,
                height: 0,
                data: &[],
            },
            DepthImageView {
                width: 0,
                height: 0,
                data: &[],
            },
        );
        assert!(matches!(
            input.validate(),
            Err(SegmentError::EmptyInput { .. })
        ));
    }

    #[test]
    fn labels_are_blob_ids_and_partition_valid_pixels() {
        let scene = Scene::new(30, 12, |u, v| {
            let z = if u < 15 { 100.0 } else { 180.0 };
            [u as f32, v as f32, z]
        })
        .with_seeds(|u, _| u < 13 || u > 16);
        let result = sequential(SegmenterParams::default()).segment(&scene.input()).unwrap();

        assert_eq!(result.mode, SegmentationMode::Blobs);
        assert!(result.labels.iter().all(|&l| l >= 1 && l as usize <= result.num_blobs()));
        assert_eq!(result.num_blobs(), 2);
        assert_ne!(result.label_at(0, 0), result.label_at(29, 0));
        assert_eq!(result.blob_of_cluster(0), Some(result.label_at(0, 0)));
        let hist = result.label_histogram();
        assert_eq!(hist[0], 0);
        assert_eq!(hist.iter().sum::<usize>(), 360);
    }

    #[test]
    fn colorize_matches_label_colors() {
        let segmenter = sequential(SegmenterParams::default());
        let image = segmenter.colorize_labels(&[0, 1, 2, 0], 2, 2);
        assert_eq!(image.pixel(0, 0), [128, 128, 128]);
        assert_eq!(image.pixel(1, 0), depthseg_core::label_color(1));
        assert_eq!(image.pixel(0, 1), depthseg_core::label_color(2));
    }
}
