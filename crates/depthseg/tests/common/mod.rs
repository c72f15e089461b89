#![allow(dead_code)]

use depthseg::{DepthImageView, GrayImageView, PointCloudView, SegmentationInput};

/// Synthetic organized point cloud with its edge and depth images.
pub struct Scene {
    pub width: usize,
    pub height: usize,
    pub points: Vec<[f32; 4]>,
    pub edges: Vec<u8>,
    pub depth: Vec<f32>,
}

impl Scene {
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

    pub fn with_seeds(mut self, pred: impl Fn(usize, usize) -> bool) -> Self {
        for v in 0..self.height {
            for u in 0..self.width {
                self.edges[v * self.width + u] = if pred(u, v) { 255 } else { 0 };
            }
        }
        self
    }

    pub fn input(&self) -> SegmentationInput<'_> {
        SegmentationInput::new(
            PointCloudView {
                width: self.width,
                height: self.height,
                data: &self.points,
            },
            GrayImageView {
                width: self.width,
                height: self.height,
                data: &self.edges,
            },
            DepthImageView {
                width: self.width,
                height: self.height,
                data: &self.depth,
            },
        )
    }
}

/// Flat grid at constant depth with unit spacing and no seeds.
pub fn flat_plane(width: usize, height: usize, z: f32) -> Scene {
    Scene::new(width, height, |u, v| [u as f32, v as f32, z])
}

/// Two planes meeting at a crease between columns 19 and 20.
///
/// Columns `u < 20` lie on `z = 100`; columns `u >= 20` lie on the plane
/// `x = 30`, receding in depth. Columns 19 and 20 are not seeds.
pub fn crease_scene() -> Scene {
    Scene::new(40, 20, |u, v| {
        if u < 20 {
            [u as f32, v as f32, 100.0]
        } else {
            [30.0, v as f32, 100.0 + (u - 20) as f32]
        }
    })
    .with_seeds(|u, _| u != 19 && u != 20)
}

/// Table at z = 100 carrying a box whose top is at z = 80. Seeds cover the
/// table and the box top, each kept two pixels away from the box outline.
pub fn box_on_table() -> Scene {
    let in_box = |u: usize, v: usize| (15..25).contains(&u) && (10..20).contains(&v);
    let near_outline = |u: usize, v: usize| (13..27).contains(&u) && (8..22).contains(&v);
    let box_core = |u: usize, v: usize| (17..23).contains(&u) && (12..18).contains(&v);
    Scene::new(40, 30, move |u, v| {
        let z = if in_box(u, v) { 80.0 } else { 100.0 };
        [u as f32, v as f32, z]
    })
    .with_seeds(move |u, v| !near_outline(u, v) || box_core(u, v))
}
