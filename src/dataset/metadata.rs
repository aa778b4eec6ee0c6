use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::{PipelineErr, Result};

/// The fixed `height x width x channels` shape of every image in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ImageShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl ImageShape {
    /// Creates a new `ImageShape`.
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// The amount of values in an image of this shape, `H·W·C`.
    ///
    /// Shapes held by a `Metadata` are known not to overflow.
    pub const fn size(&self) -> usize {
        self.height * self.width * self.channels
    }

    /// Like `size`, but `None` if `H·W·C` doesn't fit in a `usize`.
    pub fn checked_size(&self) -> Option<usize> {
        self.height
            .checked_mul(self.width)?
            .checked_mul(self.channels)
    }

    /// The shape as an `(H, W, C)` tuple, the form `ndarray` expects.
    pub const fn dims(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    /// Whether `dims` describes exactly this shape.
    pub fn matches(&self, dims: &[usize]) -> bool {
        dims == [self.height, self.width, self.channels]
    }
}

impl Display for ImageShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

/// Descriptive information shipped alongside a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    class_names: Vec<String>,
    image_shape: ImageShape,
}

impl Metadata {
    /// Creates a new `Metadata`.
    ///
    /// # Arguments
    /// * `class_names` - The name of every class, indexed by label.
    /// * `image_shape` - The shape shared by every image.
    ///
    /// # Returns
    /// An error if there are no classes, or the image shape has a zero
    /// dimension or too many values to address.
    pub fn new(class_names: Vec<String>, image_shape: ImageShape) -> Result<Self> {
        if class_names.is_empty() {
            return Err(PipelineErr::InvalidConfig(
                "a dataset must have at least one class".into(),
            ));
        }

        match image_shape.checked_size() {
            Some(0) => {
                return Err(PipelineErr::InvalidConfig(format!(
                    "image shape {image_shape} has a zero dimension"
                )))
            }
            None => {
                return Err(PipelineErr::InvalidConfig(format!(
                    "image shape {image_shape} is too large"
                )))
            }
            Some(_) => {}
        }

        Ok(Self {
            class_names,
            image_shape,
        })
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    #[inline]
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    #[inline]
    pub fn image_shape(&self) -> ImageShape {
        self.image_shape
    }

    /// Returns the name of the class for `label`, or `None` if it's out of range.
    pub fn class_name(&self, label: usize) -> Option<&str> {
        self.class_names.get(label).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_size_and_dims() {
        let shape = ImageShape::new(96, 96, 3);
        assert_eq!(shape.size(), 27648);
        assert_eq!(shape.dims(), (96, 96, 3));
        assert!(shape.matches(&[96, 96, 3]));
        assert!(!shape.matches(&[96, 3, 96]));
        assert!(!shape.matches(&[96, 96]));
    }

    #[test]
    fn metadata_requires_classes() {
        let shape = ImageShape::new(2, 2, 1);
        assert!(Metadata::new(vec![], shape).is_err());
        assert!(Metadata::new(vec!["a".into()], ImageShape::new(0, 2, 1)).is_err());

        let huge = ImageShape::new(usize::MAX / 2, 4, 3);
        assert_eq!(huge.checked_size(), None);
        assert!(matches!(
            Metadata::new(vec!["a".into()], huge),
            Err(PipelineErr::InvalidConfig(_))
        ));

        let meta = Metadata::new(vec!["cat".into(), "dog".into()], shape).unwrap();
        assert_eq!(meta.num_classes(), 2);
        assert_eq!(meta.class_name(1), Some("dog"));
        assert_eq!(meta.class_name(2), None);
    }
}
