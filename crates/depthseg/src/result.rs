use depthseg_core::{BoolMatrix, Plane, SquareMatrix};
use serde::{Deserialize, Serialize};

/// Which pipeline produced a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    Blobs,
    SinglePlane,
}

/// Output of one segmentation call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SegmentationResult {
    pub mode: SegmentationMode,
    pub width: usize,
    pub height: usize,
    /// Blob id per pixel, row-major; 0 is unlabeled.
    pub labels: Vec<u32>,
    /// Pixel indices per cluster (seed clusters first, then clusters of
    /// remaining points). Cluster `c` has id `c + 1`.
    pub clusters: Vec<Vec<usize>>,
    /// 0-based cluster indices per blob; blob `b` has label `b + 1`.
    /// Empty in single plane mode.
    pub blobs: Vec<Vec<usize>>,
    /// Seed-cluster adjacency.
    pub adjacency: BoolMatrix,
    /// `cutfree(a, b)`: planes through `a` do not cut `b`.
    pub cutfree: BoolMatrix,
    /// Pairwise composition weights.
    pub probabilities: SquareMatrix<f32>,
    /// Dominant plane of single plane mode.
    pub plane: Option<Plane>,
}

impl SegmentationResult {
    pub fn num_blobs(&self) -> usize {
        match self.mode {
            SegmentationMode::Blobs => self.blobs.len(),
            SegmentationMode::SinglePlane => self.labels.iter().copied().max().unwrap_or(0) as usize,
        }
    }

    #[inline]
    pub fn label_at(&self, x: usize, y: usize) -> u32 {
        self.labels[y * self.width + x]
    }

    /// 1-based blob label of a 0-based cluster index.
    pub fn blob_of_cluster(&self, cluster: usize) -> Option<u32> {
        self.blobs
            .iter()
            .position(|members| members.contains(&cluster))
            .map(|b| b as u32 + 1)
    }

    /// Pixel count per label, index 0 holding the unlabeled pixels.
    pub fn label_histogram(&self) -> Vec<usize> {
        let mut hist = vec![0usize; self.num_blobs() + 1];
        for &l in &self.labels {
            if let Some(slot) = hist.get_mut(l as usize) {
                *slot += 1;
            }
        }
        hist
    }
}
