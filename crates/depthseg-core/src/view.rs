use nalgebra::Vector3;

/// Row-major 8-bit image view. The segmenter reads its edge map through it.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl<'a> GrayImageView<'a> {
    #[inline]
    pub fn value(&self, idx: usize) -> u8 {
        self.data[idx]
    }

    #[cfg(feature = "image")]
    pub fn from_image(img: &'a ::image::GrayImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            data: img.as_raw(),
        }
    }
}

/// Organized point cloud with one homogeneous `[x, y, z, w]` point per pixel.
///
/// Only the first three components are read; `w` is carried so sensor
/// buffers can be borrowed without repacking.
#[derive(Clone, Copy, Debug)]
pub struct PointCloudView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [[f32; 4]], // row-major, len = w*h
}

impl PointCloudView<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn point(&self, idx: usize) -> Vector3<f32> {
        let [x, y, z, _] = self.data[idx];
        Vector3::new(x, y, z)
    }

    /// Euclidean 3D distance between the points at two pixel indices.
    #[inline]
    pub fn distance(&self, a: usize, b: usize) -> f32 {
        (self.point(a) - self.point(b)).norm()
    }
}

/// Row-major depth image view, in raw sensor units.
#[derive(Clone, Copy, Debug)]
pub struct DepthImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [f32],
}

impl DepthImageView<'_> {
    #[inline]
    pub fn value(&self, idx: usize) -> f32 {
        self.data[idx]
    }
}

/// Owned interleaved RGB image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>, // row-major, len = 3*w*h
}

impl RgbImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = 3 * (y * self.width + x);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Convert into an `image::RgbImage`. `None` if the buffer length does not
    /// match the declared size.
    #[cfg(feature = "image")]
    pub fn into_image(self) -> Option<::image::RgbImage> {
        ::image::RgbImage::from_raw(self.width as u32, self.height as u32, self.data)
    }
}

const OFFSETS_8: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// In-bounds 8-neighbours of pixel `idx` in a `width x height` grid.
#[inline]
pub fn neighbors8(width: usize, height: usize, idx: usize) -> impl Iterator<Item = usize> {
    let x = (idx % width) as isize;
    let y = (idx / width) as isize;
    OFFSETS_8.iter().filter_map(move |&(dx, dy)| {
        let (nx, ny) = (x + dx, y + dy);
        (nx >= 0 && ny >= 0 && (nx as usize) < width && (ny as usize) < height)
            .then(|| ny as usize * width + nx as usize)
    })
}

/// Neighbours of `idx` already visited by a raster scan: left, upper-left,
/// upper and upper-right.
#[inline]
pub fn neighbors8_backward(width: usize, idx: usize) -> impl Iterator<Item = usize> {
    let x = idx % width;
    let has_up = idx >= width;
    let left = (x > 0).then(|| idx - 1);
    let up_left = (has_up && x > 0).then(|| idx - width - 1);
    let up = has_up.then(|| idx - width);
    let up_right = (has_up && x + 1 < width).then(|| idx - width + 1);
    left.into_iter().chain(up_left).chain(up).chain(up_right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_pixel_has_three_neighbours() {
        let n: Vec<_> = neighbors8(4, 3, 0).collect();
        assert_eq!(n, vec![1, 4, 5]);
        let n: Vec<_> = neighbors8(4, 3, 11).collect();
        assert_eq!(n, vec![6, 7, 10]);
    }

    #[test]
    fn interior_pixel_has_eight_neighbours_without_row_wrap() {
        let n: Vec<_> = neighbors8(4, 3, 5).collect();
        assert_eq!(n, vec![0, 1, 2, 4, 6, 8, 9, 10]);
        // right edge must not wrap to the next row's first column
        let n: Vec<_> = neighbors8(4, 3, 7).collect();
        assert_eq!(n, vec![2, 3, 6, 10, 11]);
    }

    #[test]
    fn backward_neighbours_respect_borders() {
        assert_eq!(neighbors8_backward(4, 0).count(), 0);
        assert_eq!(neighbors8_backward(4, 4).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(neighbors8_backward(4, 5).collect::<Vec<_>>(), vec![4, 0, 1, 2]);
        assert_eq!(neighbors8_backward(4, 7).collect::<Vec<_>>(), vec![6, 2, 3]);
    }

    #[test]
    fn point_distance_ignores_homogeneous_component() {
        let data = [[0.0, 0.0, 0.0, 1.0], [3.0, 4.0, 0.0, 7.0]];
        let view = PointCloudView {
            width: 2,
            height: 1,
            data: &data,
        };
        assert!((view.distance(0, 1) - 5.0).abs() < 1e-6);
    }
}
