//! Synthetic organized point clouds for unit tests.

use depthseg_core::{DepthImageView, GrayImageView, PointCloudView};

use crate::segmenter::SegmentationInput;

pub(crate) struct Scene {
    pub width: usize,
    pub height: usize,
    pub points: Vec<[f32; 4]>,
    pub edges: Vec<u8>,
    pub depth: Vec<f32>,
}

impl Scene {
    /// Scene whose pixel `(u, v)` holds the point `f(u, v)`; depth is `z` and
    /// no pixel is a seed.
    pub fn new(width: usize, height: usize, f: impl Fn(usize, usize) -> [f32; 3]) -> Self {
        let mut points = Vec::with_capacity(width * height);
        for v in 0..height {
            for u in 0..width {
                let [x, y, z] = f(u, v);
                points.push([x, y, z, 1.0]);
            }
        }
        let depth = points.iter().map(|p| p[2]).collect();
        Self {
            width,
            height,
            points,
            edges: vec![0; width * height],
            depth,
        }
    }

    /// Flat grid at depth `z` with unit spacing.
    pub fn flat(width: usize, height: usize, z: f32) -> Self {
        Self::new(width, height, |u, v| [u as f32, v as f32, z])
    }

    /// Mark every pixel with `pred(u, v)` as a seed (edge value 255).
    pub fn with_seeds(mut self, pred: impl Fn(usize, usize) -> bool) -> Self {
        for v in 0..self.height {
            for u in 0..self.width {
                if pred(u, v) {
                    self.edges[v * self.width + u] = 255;
                }
            }
        }
        self
    }

    pub fn points(&self) -> PointCloudView<'_> {
        PointCloudView {
            width: self.width,
            height: self.height,
            data: &self.points,
        }
    }

    pub fn edges(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.edges,
        }
    }

    pub fn depth(&self) -> DepthImageView<'_> {
        DepthImageView {
            width: self.width,
            height: self.height,
            data: &self.depth,
        }
    }

    pub fn input(&self) -> SegmentationInput<'_> {
        SegmentationInput::new(self.points(), self.edges(), self.depth())
    }
}
