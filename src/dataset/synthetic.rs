use ndarray::Array3;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{
    stl10::STL10_SHAPE, DatasetSource, ImageShape, Metadata, RawExample, RawExamples,
    SourceSplit,
};
use crate::{PipelineErr, Result};

const STL10_CLASSES: [&str; 10] = [
    "airplane", "bird", "car", "cat", "deer", "dog", "horse", "monkey", "ship", "truck",
];

/// A source of uniformly random images and labels.
///
/// The data of every split is derived from the seed, so reopening a split
/// yields exactly the same examples.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    metadata: Metadata,
    train_size: usize,
    test_size: usize,
    seed: u64,
}

impl SyntheticSource {
    /// Creates a new `SyntheticSource`.
    ///
    /// # Arguments
    /// * `metadata` - The metadata the generated examples conform to.
    /// * `train_size` - The amount of examples in the train split.
    /// * `test_size` - The amount of examples in the test split.
    /// * `seed` - The seed every split is generated from.
    pub fn new(metadata: Metadata, train_size: usize, test_size: usize, seed: u64) -> Self {
        Self {
            metadata,
            train_size,
            test_size,
            seed,
        }
    }

    /// Creates a source with `num_classes` classes named `class_0`, `class_1`, ...
    pub fn with_classes(
        shape: ImageShape,
        num_classes: usize,
        train_size: usize,
        test_size: usize,
        seed: u64,
    ) -> Result<Self> {
        let names = (0..num_classes).map(|i| format!("class_{i}")).collect();
        let metadata = Metadata::new(names, shape)?;
        Ok(Self::new(metadata, train_size, test_size, seed))
    }

    /// Creates a source shaped like STL-10: 96x96x3 images, its ten classes,
    /// 5000 train and 8000 test examples.
    pub fn stl10_like(seed: u64) -> Result<Self> {
        let names = STL10_CLASSES.iter().map(|&name| name.to_owned()).collect();
        let metadata = Metadata::new(names, STL10_SHAPE)?;
        Ok(Self::new(metadata, 5000, 8000, seed))
    }

    fn size(&self, split: SourceSplit) -> usize {
        match split {
            SourceSplit::Train => self.train_size,
            SourceSplit::Test => self.test_size,
        }
    }
}

impl DatasetSource for SyntheticSource {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn open(&self, split: SourceSplit) -> Result<RawExamples<'_>> {
        let shape = self.metadata.image_shape();
        let num_classes = self.metadata.num_classes();
        let mut rng = StdRng::seed_from_u64(self.seed ^ split as u64);

        let examples = (0..self.size(split)).map(move |_| -> Result<RawExample> {
            let pixels = (0..shape.size()).map(|_| rng.random::<u8>()).collect();
            let image = Array3::from_shape_vec(shape.dims(), pixels).map_err(|_| {
                PipelineErr::InvalidShape {
                    got: vec![shape.size()],
                    expected: shape,
                }
            })?;
            let label = rng.random_range(0..num_classes);
            Ok(RawExample::new(image, label))
        });

        Ok(Box::new(examples))
    }
}
