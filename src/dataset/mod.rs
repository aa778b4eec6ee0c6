//! Dataset sources and the samples they deliver.

mod example;
mod memory;
mod metadata;
mod source;
mod stl10;
mod synthetic;

pub use example::{Example, RawExample};
pub use memory::InMemorySource;
pub use metadata::{ImageShape, Metadata};
pub use source::{DatasetSource, RawExamples, SourceSplit};
pub use stl10::{Stl10Source, STL10_SHAPE};
pub use synthetic::SyntheticSource;
