use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use super::{Metadata, RawExample};
use crate::Result;

/// The named partitions a dataset is distributed with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSplit {
    #[default]
    Train,
    Test,
}

impl Display for SourceSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSplit::Train => f.write_str("train"),
            SourceSplit::Test => f.write_str("test"),
        }
    }
}

/// A lazy, finite sequence of raw examples.
pub type RawExamples<'a> = Box<dyn Iterator<Item = Result<RawExample>> + 'a>;

/// A provider of labeled images.
///
/// A source is only responsible for *delivering* samples, it doesn't normalize,
/// shuffle or batch them.
pub trait DatasetSource {
    /// Returns the metadata shared by every split of this source.
    fn metadata(&self) -> &Metadata;

    /// Opens `split` from the beginning.
    ///
    /// Every call reopens the underlying storage, so the returned sequence can
    /// be restarted by calling `open` again.
    ///
    /// # Errors
    /// Returns an error if the split can't be opened. Errors found while reading
    /// individual examples are yielded by the iterator.
    fn open(&self, split: SourceSplit) -> Result<RawExamples<'_>>;
}
