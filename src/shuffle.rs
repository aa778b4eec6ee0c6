//! Bounded-buffer shuffling.

use std::num::NonZeroUsize;

use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Shuffles finite sequences through a bounded buffer.
///
/// Every call to `shuffle` is a pass. When reshuffling is enabled each pass
/// draws a new order, otherwise every pass replays the order of the first one.
#[derive(Debug, Clone)]
pub struct Shuffler {
    capacity: NonZeroUsize,
    reshuffle_each_iteration: bool,
    rng: StdRng,
    first_seed: u64,
    passes: usize,
}

impl Shuffler {
    /// Creates a new `Shuffler`.
    ///
    /// # Arguments
    /// * `capacity` - The maximum amount of items held in the buffer.
    /// * `reshuffle_each_iteration` - Whether every pass draws a new order.
    /// * `seed` - Makes every pass reproducible, or `None` to seed from the OS.
    pub fn new(capacity: NonZeroUsize, reshuffle_each_iteration: bool, seed: Option<u64>) -> Self {
        let mut rng = generate_rng(seed);
        let first_seed = rng.random();

        Self {
            capacity,
            reshuffle_each_iteration,
            rng,
            first_seed,
            passes: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    #[inline]
    pub fn reshuffles(&self) -> bool {
        self.reshuffle_each_iteration
    }

    /// Starts a new pass over `items`.
    pub fn shuffle<I: IntoIterator>(&mut self, items: I) -> ShuffleIter<I::IntoIter> {
        let seed = if self.passes > 0 && self.reshuffle_each_iteration {
            self.rng.random()
        } else {
            self.first_seed
        };
        self.passes += 1;

        debug!("shuffle pass {} with buffer {}", self.passes, self.capacity);
        ShuffleIter::new(items.into_iter(), self.capacity, StdRng::seed_from_u64(seed))
    }
}

fn generate_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// A single shuffled pass over a sequence.
///
/// Fills a buffer with up to `capacity` items, then repeatedly yields a
/// uniformly chosen buffered item and refills its slot from the input. Once
/// the input runs out the buffer is drained in random order.
pub struct ShuffleIter<I: Iterator> {
    inner: I,
    buffer: Vec<I::Item>,
    capacity: usize,
    exhausted: bool,
    rng: StdRng,
}

impl<I: Iterator> ShuffleIter<I> {
    fn new(inner: I, capacity: NonZeroUsize, rng: StdRng) -> Self {
        let capacity = capacity.get();
        let prealloc = capacity.min(inner.size_hint().0.max(1));

        Self {
            inner,
            buffer: Vec::with_capacity(prealloc),
            capacity,
            exhausted: false,
            rng,
        }
    }

    fn fill(&mut self) {
        while !self.exhausted && self.buffer.len() < self.capacity {
            match self.inner.next() {
                Some(item) => self.buffer.push(item),
                None => self.exhausted = true,
            }
        }
    }
}

impl<I: Iterator> Iterator for ShuffleIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.fill();
        if self.buffer.is_empty() {
            return None;
        }

        let idx = self.rng.random_range(0..self.buffer.len());
        let incoming = if self.exhausted {
            None
        } else {
            self.inner.next()
        };

        let item = match incoming {
            Some(incoming) => std::mem::replace(&mut self.buffer[idx], incoming),
            None => {
                self.exhausted = true;
                self.buffer.swap_remove(idx)
            }
        };

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let buffered = self.buffer.len();
        if self.exhausted {
            return (buffered, Some(buffered));
        }

        let (low, high) = self.inner.size_hint();
        (
            low.saturating_add(buffered),
            high.and_then(|h| h.checked_add(buffered)),
        )
    }
}
