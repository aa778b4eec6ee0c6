//! The complete preprocessing pipeline.
//!
//! `source -> transform -> shuffle -> split -> batch`. Raw examples are read and
//! validated once, the transform runs lazily per batch so normalized data only
//! lives as long as the batch that holds it.

use std::{mem, num::NonZeroUsize, slice};

use log::{debug, info, warn};

use crate::{
    batch::{batch_count, batches, Batch, Batches, RemainderPolicy},
    config::PipelineConfig,
    dataset::{DatasetSource, Metadata, RawExample, SourceSplit},
    shuffle::Shuffler,
    split::{split, Split},
    transform::Transform,
    Result,
};

/// A dataset split shuffled and partitioned into validation and training examples.
///
/// The partitions are fixed when the pipeline is built. Only the order of the
/// training partition changes, once per epoch, when reshuffling is enabled.
#[derive(Debug)]
pub struct Pipeline {
    metadata: Metadata,
    transform: Transform,
    examples: Vec<RawExample>,
    validation: Vec<usize>,
    training: Vec<usize>,
    shuffler: Shuffler,
    batch_size: NonZeroUsize,
    remainder: RemainderPolicy,
    epoch: usize,
}

impl Pipeline {
    /// Reads `split` from `source` and builds a pipeline over it.
    ///
    /// # Errors
    /// Fails on the first example with an invalid shape or label, if the
    /// validation partition doesn't fit in the split, or if reading fails.
    pub fn from_source<S>(source: &S, split: SourceSplit, config: &PipelineConfig) -> Result<Self>
    where
        S: DatasetSource + ?Sized,
    {
        config.validate()?;

        let metadata = source.metadata().clone();
        let transform = Transform::for_metadata(&metadata, config.parallel);

        info!("reading {split} split");
        let examples = source
            .open(split)?
            .map(|raw| -> Result<RawExample> {
                let raw = raw?;
                transform.validate(&raw)?;
                Ok(raw)
            })
            .collect::<Result<Vec<_>>>()?;

        Self::build(metadata, transform, examples, config)
    }

    /// Builds a pipeline over examples already in memory.
    ///
    /// # Errors
    /// Same as `from_source`.
    pub fn new(
        metadata: Metadata,
        examples: Vec<RawExample>,
        config: &PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;

        let transform = Transform::for_metadata(&metadata, config.parallel);
        examples.iter().try_for_each(|raw| transform.validate(raw))?;

        Self::build(metadata, transform, examples, config)
    }

    fn build(
        metadata: Metadata,
        transform: Transform,
        examples: Vec<RawExample>,
        config: &PipelineConfig,
    ) -> Result<Self> {
        let total = examples.len();
        let validation = config.validation.resolve(total)?;

        if config.shuffle_buffer.get() < total {
            warn!(
                "shuffle buffer ({}) is smaller than the dataset ({total}), \
                 the order will only be partially randomized",
                config.shuffle_buffer
            );
        }

        let mut shuffler = Shuffler::new(
            config.shuffle_buffer,
            config.reshuffle_each_iteration,
            config.seed,
        );
        let order: Vec<usize> = shuffler.shuffle(0..total).collect();
        let Split {
            validation,
            training,
        } = split(order, validation)?;

        info!(
            "{total} examples of shape {}: {} validation, {} training, batches of {}",
            metadata.image_shape(),
            validation.len(),
            training.len(),
            config.batch_size
        );

        Ok(Self {
            metadata,
            transform,
            examples,
            validation,
            training,
            shuffler,
            batch_size: config.batch_size,
            remainder: config.remainder,
            epoch: 0,
        })
    }

    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// The amount of training epochs started so far.
    #[inline]
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Indices of the validation examples, in the order they're batched.
    #[inline]
    pub fn validation_indices(&self) -> &[usize] {
        &self.validation
    }

    /// Indices of the training examples, in the order of the current epoch.
    #[inline]
    pub fn training_indices(&self) -> &[usize] {
        &self.training
    }

    /// Returns the raw example at `index`.
    pub fn raw(&self, index: usize) -> Option<&RawExample> {
        self.examples.get(index)
    }

    /// The amount of batches a partition of `len` examples yields.
    pub fn batch_count(&self, len: usize) -> usize {
        batch_count(len, self.batch_size, self.remainder)
    }

    /// The validation batches. Their order never changes.
    pub fn validation_batches(&self) -> EpochBatches<'_> {
        self.batches_of(&self.validation)
    }

    /// Starts a new epoch and returns its training batches.
    ///
    /// From the second epoch on, the training partition is reshuffled first if
    /// reshuffling is enabled.
    pub fn training_batches(&mut self) -> EpochBatches<'_> {
        if self.epoch > 0 && self.shuffler.reshuffles() {
            let previous = mem::take(&mut self.training);
            self.training = self.shuffler.shuffle(previous).collect();
        }

        self.epoch += 1;
        debug!("starting epoch {}", self.epoch);
        self.batches_of(&self.training)
    }

    /// Counts the examples of every class in each partition, indexed by label.
    pub fn class_counts(&self) -> Split<usize> {
        let count = |indices: &[usize]| {
            let mut counts = vec![0; self.metadata.num_classes()];
            for &i in indices {
                counts[self.examples[i].label] += 1;
            }
            counts
        };

        Split {
            validation: count(&self.validation),
            training: count(&self.training),
        }
    }

    fn batches_of<'p>(&'p self, indices: &'p [usize]) -> EpochBatches<'p> {
        EpochBatches {
            examples: &self.examples,
            transform: self.transform,
            remaining: self.batch_count(indices.len()),
            batches: batches(indices.iter(), self.batch_size, self.remainder),
        }
    }
}

/// The batches of one pass over a partition.
///
/// Every batch is transformed when it's requested.
pub struct EpochBatches<'p> {
    examples: &'p [RawExample],
    transform: Transform,
    remaining: usize,
    batches: Batches<slice::Iter<'p, usize>>,
}

impl Iterator for EpochBatches<'_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self.batches.next()?;
        self.remaining = self.remaining.saturating_sub(1);

        let examples = self.examples;
        let raws = indices.into_iter().map(|&i| &examples[i]);
        let batch = self
            .transform
            .apply_all(raws)
            .and_then(|examples| Batch::stack(&examples));

        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EpochBatches<'_> {}
