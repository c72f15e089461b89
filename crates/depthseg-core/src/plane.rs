//! Three-point plane model used by the coplanarity test and the single
//! plane mode.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Cross products shorter than this fraction of `|p1 - p0| * |p2 - p0|` are
/// treated as collinear.
const COLLINEAR_EPS: f32 = 1e-6;

/// Plane `normal . p = offset` with unit `normal`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vector3<f32>,
    pub offset: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneSide {
    Above,
    Below,
    On,
}

/// Per-plane tally of test points on each side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideCounts {
    pub above: usize,
    pub below: usize,
    pub on: usize,
}

impl Plane {
    /// Plane through three points, oriented by `(p1 - p0) x (p2 - p0)`.
    ///
    /// Returns `None` for coincident or collinear points and for non-finite
    /// input.
    pub fn from_points(p0: &Vector3<f32>, p1: &Vector3<f32>, p2: &Vector3<f32>) -> Option<Self> {
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let cross = e1.cross(&e2);
        let len = cross.norm();
        if !len.is_finite() || len <= COLLINEAR_EPS * e1.norm() * e2.norm() {
            return None;
        }
        let normal = cross / len;
        Some(Self {
            normal,
            offset: normal.dot(p0),
        })
    }

    #[inline]
    pub fn signed_distance(&self, p: &Vector3<f32>) -> f32 {
        self.normal.dot(p) - self.offset
    }

    /// Classify `p` against a slab of half-width `tolerance`. Points exactly
    /// on the slab boundary count as on the plane.
    #[inline]
    pub fn side(&self, p: &Vector3<f32>, tolerance: f32) -> PlaneSide {
        let s = self.signed_distance(p);
        if s > tolerance {
            PlaneSide::Above
        } else if s < -tolerance {
            PlaneSide::Below
        } else {
            PlaneSide::On
        }
    }
}

impl SideCounts {
    #[inline]
    pub fn record(&mut self, side: PlaneSide) {
        match side {
            PlaneSide::Above => self.above += 1,
            PlaneSide::Below => self.below += 1,
            PlaneSide::On => self.on += 1,
        }
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.above + self.below + self.on
    }

    /// A plane does not cut the tested points if fewer than `tolerance` of
    /// them lie on one of its sides.
    #[inline]
    pub fn is_cut_free(&self, tolerance: usize) -> bool {
        self.above < tolerance || self.below < tolerance
    }
}
