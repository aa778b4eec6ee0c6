use std::{
    fs::{self, File},
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use log::{debug, info};
use ndarray::Array3;

use super::{DatasetSource, ImageShape, Metadata, RawExample, RawExamples, SourceSplit};
use crate::{PipelineErr, Result};

/// The shape of every STL-10 image.
pub const STL10_SHAPE: ImageShape = ImageShape::new(96, 96, 3);

const CLASS_NAMES_FILE: &str = "class_names.txt";

/// Reads an extracted `stl10_binary` directory.
///
/// Layout:
/// - `{split}_X.bin`: raw `u8` pixels, one image after the other. Each image is
///   stored channel by channel and every channel in column-major order.
/// - `{split}_y.bin`: one `u8` label per image, starting at 1.
/// - `class_names.txt`: one class name per line, in label order.
#[derive(Debug, Clone)]
pub struct Stl10Source {
    dir: PathBuf,
    metadata: Metadata,
}

impl Stl10Source {
    /// Creates a new `Stl10Source` reading from `dir`.
    ///
    /// # Errors
    /// Returns an error if the class names can't be read.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_shape(dir, STL10_SHAPE)
    }

    /// Creates a source that reads the STL-10 layout with images of a different shape.
    ///
    /// # Errors
    /// Returns an error if the class names can't be read.
    pub fn with_shape(dir: impl Into<PathBuf>, shape: ImageShape) -> Result<Self> {
        let dir = dir.into();
        let class_names = read_class_names(&dir.join(CLASS_NAMES_FILE))?;
        let metadata = Metadata::new(class_names, shape)?;

        info!(
            "stl10 dataset at {} with {} classes",
            dir.display(),
            metadata.num_classes()
        );
        Ok(Self { dir, metadata })
    }

    fn paths(&self, split: SourceSplit) -> (PathBuf, PathBuf) {
        (
            self.dir.join(format!("{split}_X.bin")),
            self.dir.join(format!("{split}_y.bin")),
        )
    }
}

impl DatasetSource for Stl10Source {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn open(&self, split: SourceSplit) -> Result<RawExamples<'_>> {
        let (images_path, labels_path) = self.paths(split);
        let shape = self.metadata.image_shape();

        let images_len = fs::metadata(&images_path)?.len() as usize;
        let labels_len = fs::metadata(&labels_path)?.len() as usize;

        if images_len % shape.size() != 0 {
            return Err(PipelineErr::CorruptSource {
                path: images_path,
                reason: format!(
                    "length {images_len} is not a multiple of the image size {}",
                    shape.size()
                ),
            });
        }

        let count = images_len / shape.size();
        if labels_len != count {
            return Err(PipelineErr::CorruptSource {
                path: labels_path,
                reason: format!("holds {labels_len} labels for {count} images"),
            });
        }

        debug!("opening stl10 {split} split with {count} examples");
        let reader = Stl10Reader {
            images: BufReader::new(File::open(&images_path)?),
            labels: BufReader::new(File::open(&labels_path)?),
            remaining: count,
            shape,
            num_classes: self.metadata.num_classes(),
        };

        Ok(Box::new(reader))
    }
}

struct Stl10Reader {
    images: BufReader<File>,
    labels: BufReader<File>,
    remaining: usize,
    shape: ImageShape,
    num_classes: usize,
}

impl Stl10Reader {
    fn read_example(&mut self) -> Result<RawExample> {
        let mut pixels = vec![0; self.shape.size()];
        self.images.read_exact(&mut pixels)?;

        let mut label = [0];
        self.labels.read_exact(&mut label)?;

        let image = to_hwc(pixels, self.shape)?;
        let label = to_zero_based(label[0], self.num_classes)?;
        Ok(RawExample::new(image, label))
    }
}

impl Iterator for Stl10Reader {
    type Item = Result<RawExample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let example = self.read_example();
        // A failed read leaves the readers misaligned, there's nothing left to yield.
        self.remaining = if example.is_ok() { self.remaining - 1 } else { 0 };
        Some(example)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Converts a channel-major, column-major image into `(height, width, channels)`.
fn to_hwc(pixels: Vec<u8>, shape: ImageShape) -> Result<Array3<u8>> {
    let (h, w, c) = shape.dims();
    let stored = Array3::from_shape_vec((c, w, h), pixels).map_err(|_| {
        PipelineErr::InvalidShape {
            got: vec![c, w, h],
            expected: shape,
        }
    })?;

    Ok(stored.permuted_axes([2, 1, 0]).as_standard_layout().into_owned())
}

fn to_zero_based(stored: u8, num_classes: usize) -> Result<usize> {
    (stored as usize)
        .checked_sub(1)
        .filter(|&label| label < num_classes)
        .ok_or(PipelineErr::InvalidLabel {
            label: stored as usize,
            num_classes,
        })
}

fn read_class_names(path: &Path) -> Result<Vec<String>> {
    let names = fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_major_channels_become_hwc() {
        // 2x3 image, 2 channels. Stored as channel 0 then channel 1,
        // each one column by column.
        let shape = ImageShape::new(2, 3, 2);
        let mut pixels = Vec::new();
        for c in 0..2u8 {
            for x in 0..3u8 {
                for y in 0..2u8 {
                    pixels.push(100 * c + 10 * y + x);
                }
            }
        }

        let image = to_hwc(pixels, shape).unwrap();
        assert_eq!(image.dim(), (2, 3, 2));
        for y in 0..2 {
            for x in 0..3 {
                for c in 0..2 {
                    assert_eq!(image[[y, x, c]] as usize, 100 * c + 10 * y + x);
                }
            }
        }
        assert!(image.is_standard_layout());
    }

    #[test]
    fn labels_are_shifted_to_zero() {
        assert_eq!(to_zero_based(1, 10).unwrap(), 0);
        assert_eq!(to_zero_based(10, 10).unwrap(), 9);
        assert!(matches!(
            to_zero_based(0, 10),
            Err(PipelineErr::InvalidLabel { label: 0, .. })
        ));
        assert!(to_zero_based(11, 10).is_err());
    }
}
