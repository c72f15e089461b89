/// Errors returned for malformed segmentation input.
///
/// Raised before any buffer is touched.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("input image is empty ({width}x{height})")]
    EmptyInput { width: usize, height: usize },
    #[error("{buffer} buffer has {actual} elements, expected {expected}")]
    BufferLength {
        buffer: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{buffer} image is {width}x{height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        buffer: &'static str,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },
}
