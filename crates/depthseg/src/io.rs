//! JSON configuration and report helpers.

use std::{fs, path::Path};

use depthseg_core::Plane;
use serde::{Deserialize, Serialize};

use crate::{SegmentationMode, SegmentationResult, Segmenter, SegmenterParams};

#[derive(thiserror::Error, Debug)]
pub enum SegmentIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SegmenterParams {
    /// Load parameters from a JSON file. Missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SegmentIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write parameters to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SegmentIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Summary of one segmentation run, for offline inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationReport {
    pub mode: SegmentationMode,
    pub width: usize,
    pub height: usize,
    pub backend: String,
    pub params: SegmenterParams,
    pub num_clusters: usize,
    pub cluster_sizes: Vec<usize>,
    pub num_blobs: usize,
    /// 0-based cluster indices per blob.
    pub blobs: Vec<Vec<usize>>,
    /// Pixels per label, index 0 unlabeled.
    pub label_histogram: Vec<usize>,
    /// Adjacent seed-cluster pairs `(a, b)` with `a < b`.
    pub adjacent_pairs: Vec<[usize; 2]>,
    #[serde(default)]
    pub plane: Option<Plane>,
}

impl SegmentationReport {
    pub fn from_result(result: &SegmentationResult, segmenter: &Segmenter) -> Self {
        let n = result.adjacency.size();
        let adjacent_pairs = (0..n)
            .flat_map(|a| (a + 1..n).map(move |b| [a, b]))
            .filter(|&[a, b]| result.adjacency.get(a, b))
            .collect();
        Self {
            mode: result.mode,
            width: result.width,
            height: result.height,
            backend: segmenter.backend_name().to_string(),
            params: segmenter.params().clone(),
            num_clusters: result.clusters.len(),
            cluster_sizes: result.clusters.iter().map(Vec::len).collect(),
            num_blobs: result.num_blobs(),
            blobs: result.blobs.clone(),
            label_histogram: result.label_histogram(),
            adjacent_pairs,
            plane: result.plane,
        }
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SegmentIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SegmentIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
