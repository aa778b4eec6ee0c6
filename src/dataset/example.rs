use ndarray::{Array1, Array3};

/// A single raw sample, as delivered by a `DatasetSource`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExample {
    /// Pixels laid out as `(height, width, channels)`.
    pub image: Array3<u8>,
    pub label: usize,
}

impl RawExample {
    pub fn new(image: Array3<u8>, label: usize) -> Self {
        Self { image, label }
    }
}

/// A normalized, flattened and one-hot encoded sample.
///
/// Has no identity of its own, it's recomputed from its `RawExample` on every pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    /// Normalized pixels in row-major order, length `H·W·C`.
    pub image: Array1<f32>,
    /// One-hot label, length `num_classes`.
    pub label: Array1<f32>,
}
