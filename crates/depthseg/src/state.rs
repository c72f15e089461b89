use depthseg_core::PointCloudView;

use crate::params::RoiFilter;

/// Per-pixel working state shared by the pipeline stages.
///
/// Allocated fresh for every segmentation call, so no state leaks from one
/// frame to the next.
#[derive(Clone, Debug)]
pub(crate) struct LabelBuffers {
    pub width: usize,
    pub height: usize,
    /// Pixel passes the ROI filter. Never changes after reset.
    pub valid: Vec<bool>,
    /// Pixel is still unclaimed by any cluster.
    pub elements: Vec<bool>,
    /// 1-based cluster id, 0 for none. Seed clusters come first, clusters of
    /// remaining points are appended after them.
    pub cluster: Vec<u32>,
    /// 1-based blob id, 0 for unlabeled.
    pub blob: Vec<u32>,
}

impl LabelBuffers {
    pub fn reset(points: &PointCloudView<'_>, roi: Option<&RoiFilter>) -> Self {
        let n = points.len();
        let valid: Vec<bool> = match roi {
            Some(roi) => (0..n).map(|i| roi.contains(&points.point(i))).collect(),
            None => vec![true; n],
        };
        Self {
            width: points.width,
            height: points.height,
            elements: valid.clone(),
            valid,
            cluster: vec![0; n],
            blob: vec![0; n],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Claim pixel `idx` for cluster `id`.
    #[inline]
    pub fn claim(&mut self, idx: usize, id: u32) {
        self.elements[idx] = false;
        self.cluster[idx] = id;
    }
}
