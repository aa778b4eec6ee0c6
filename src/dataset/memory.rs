use std::collections::HashMap;

use super::{DatasetSource, Metadata, RawExample, RawExamples, SourceSplit};
use crate::{PipelineErr, Result};

/// A dataset source whose splits are held in memory.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    metadata: Metadata,
    splits: HashMap<SourceSplit, Vec<RawExample>>,
}

impl InMemorySource {
    /// Creates a new source without any split.
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            splits: HashMap::new(),
        }
    }

    /// Sets the examples of `split`, replacing any previous ones.
    pub fn with_split(mut self, split: SourceSplit, examples: Vec<RawExample>) -> Self {
        self.splits.insert(split, examples);
        self
    }

    /// Returns the amount of examples in `split`, zero if it's missing.
    pub fn len(&self, split: SourceSplit) -> usize {
        self.splits.get(&split).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, split: SourceSplit) -> bool {
        self.len(split) == 0
    }
}

impl DatasetSource for InMemorySource {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn open(&self, split: SourceSplit) -> Result<RawExamples<'_>> {
        let examples = self
            .splits
            .get(&split)
            .ok_or_else(|| PipelineErr::InvalidConfig(format!("split {split} is not available")))?;

        Ok(Box::new(examples.iter().cloned().map(Ok)))
    }
}
