//! The per-example transform: normalize, flatten and one-hot encode.

use ndarray::{Array1, Array3};
use rayon::prelude::*;

use crate::{
    dataset::{Example, ImageShape, Metadata, RawExample},
    PipelineErr, Result,
};

/// The value every pixel is divided by.
pub const PIXEL_SCALE: f32 = 255.0;

/// Maps every pixel from `[0, 255]` into `[0.0, 1.0]`.
pub fn normalize(image: &Array3<u8>) -> Array3<f32> {
    image.mapv(|p| p as f32 / PIXEL_SCALE)
}

/// Flattens an image into a vector in row-major order.
pub fn flatten(image: &Array3<f32>) -> Array1<f32> {
    // `iter` walks the logical order, whatever the memory layout is.
    image.iter().copied().collect()
}

/// Reshapes a flattened vector back into an image of `shape`.
///
/// # Returns
/// An error if the vector's length isn't `H·W·C`.
pub fn unflatten(flat: &Array1<f32>, shape: ImageShape) -> Result<Array3<f32>> {
    Array3::from_shape_vec(shape.dims(), flat.to_vec()).map_err(|_| PipelineErr::InvalidShape {
        got: vec![flat.len()],
        expected: shape,
    })
}

/// Encodes `label` as a vector of `num_classes` zeros with a single one at `label`.
///
/// # Returns
/// An error if `label` isn't in `[0, num_classes)`.
pub fn one_hot(label: usize, num_classes: usize) -> Result<Array1<f32>> {
    if label >= num_classes {
        return Err(PipelineErr::InvalidLabel { label, num_classes });
    }

    Ok(encode_label(label, num_classes))
}

/// `label` must be lower than `num_classes`.
fn encode_label(label: usize, num_classes: usize) -> Array1<f32> {
    let mut encoded = Array1::zeros(num_classes);
    encoded[label] = 1.0;
    encoded
}

/// The transform from a `RawExample` into an `Example`.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    shape: ImageShape,
    num_classes: usize,
    parallel: bool,
}

impl Transform {
    /// Creates a new `Transform`.
    ///
    /// # Arguments
    /// * `shape` - The shape every image must have.
    /// * `num_classes` - The amount of classes, labels must be lower.
    /// * `parallel` - Whether `apply_all` runs on the rayon thread pool.
    pub fn new(shape: ImageShape, num_classes: usize, parallel: bool) -> Self {
        Self {
            shape,
            num_classes,
            parallel,
        }
    }

    /// Creates a `Transform` for the examples described by `metadata`.
    pub fn for_metadata(metadata: &Metadata, parallel: bool) -> Self {
        Self::new(metadata.image_shape(), metadata.num_classes(), parallel)
    }

    #[inline]
    pub fn shape(&self) -> ImageShape {
        self.shape
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Checks that `raw` has the expected image shape and a valid label.
    pub fn validate(&self, raw: &RawExample) -> Result<()> {
        if !self.shape.matches(raw.image.shape()) {
            return Err(PipelineErr::InvalidShape {
                got: raw.image.shape().to_vec(),
                expected: self.shape,
            });
        }

        if raw.label >= self.num_classes {
            return Err(PipelineErr::InvalidLabel {
                label: raw.label,
                num_classes: self.num_classes,
            });
        }

        Ok(())
    }

    /// Transforms a single example.
    pub fn apply(&self, raw: &RawExample) -> Result<Example> {
        self.validate(raw)?;

        Ok(Example {
            image: flatten(&normalize(&raw.image)),
            label: encode_label(raw.label, self.num_classes),
        })
    }

    /// Transforms every example, keeping their order.
    ///
    /// # Returns
    /// The first error found, if any.
    pub fn apply_all<'a, I>(&self, raws: I) -> Result<Vec<Example>>
    where
        I: IntoIterator<Item = &'a RawExample>,
    {
        let raws: Vec<_> = raws.into_iter().collect();

        if self.parallel {
            raws.into_par_iter().map(|raw| self.apply(raw)).collect()
        } else {
            raws.into_iter().map(|raw| self.apply(raw)).collect()
        }
    }
}
