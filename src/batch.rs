//! Grouping examples into fixed-size batches.

use std::num::NonZeroUsize;

use ndarray::{stack, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::{dataset::Example, PipelineErr, Result};

/// What happens to a final batch with fewer items than the batch size.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Yield it as a short final batch.
    #[default]
    Keep,
    /// Discard it.
    Drop,
}

/// Returns the amount of batches a sequence of `len` items is grouped into.
pub fn batch_count(len: usize, batch_size: NonZeroUsize, policy: RemainderPolicy) -> usize {
    let size = batch_size.get();
    match policy {
        RemainderPolicy::Keep => len.div_ceil(size),
        RemainderPolicy::Drop => len / size,
    }
}

/// Groups the items of `inner` into consecutive batches of `batch_size`.
pub fn batches<I: IntoIterator>(
    inner: I,
    batch_size: NonZeroUsize,
    policy: RemainderPolicy,
) -> Batches<I::IntoIter> {
    Batches {
        inner: inner.into_iter(),
        batch_size,
        policy,
    }
}

/// Iterator over consecutive groups of items, preserving their order.
#[derive(Debug, Clone)]
pub struct Batches<I> {
    inner: I,
    batch_size: NonZeroUsize,
    policy: RemainderPolicy,
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let size = self.batch_size.get();
        let batch: Vec<_> = self.inner.by_ref().take(size).collect();

        let short = batch.len() < size;
        if batch.is_empty() || (short && self.policy == RemainderPolicy::Drop) {
            return None;
        }

        Some(batch)
    }
}

/// A group of transformed examples stacked row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Flattened images, shape `[N, H·W·C]`.
    pub images: Array2<f32>,
    /// One-hot labels, shape `[N, num_classes]`.
    pub labels: Array2<f32>,
}

impl Batch {
    /// Stacks `examples` into a batch, keeping their order.
    ///
    /// # Returns
    /// An error if there are no examples or their lengths differ.
    pub fn stack(examples: &[Example]) -> Result<Self> {
        if examples.is_empty() {
            return Err(PipelineErr::InvalidConfig(
                "a batch must hold at least one example".into(),
            ));
        }

        let images: Vec<ArrayView1<'_, f32>> = examples.iter().map(|e| e.image.view()).collect();
        let labels: Vec<ArrayView1<'_, f32>> = examples.iter().map(|e| e.label.view()).collect();

        Ok(Self {
            images: stack(Axis(0), &images)?,
            labels: stack(Axis(0), &labels)?,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.images.nrows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the `(image, label)` rows of the `i`-th example.
    pub fn get(&self, i: usize) -> Option<(ArrayView1<'_, f32>, ArrayView1<'_, f32>)> {
        if i >= self.len() {
            return None;
        }

        Some((self.images.row(i), self.labels.row(i)))
    }
}
