//! Preprocessing for image classification datasets: normalize, flatten and
//! one-hot encode examples, then shuffle, split and batch them.

pub mod batch;
pub mod config;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod shuffle;
pub mod split;
pub mod transform;

pub use batch::{Batch, RemainderPolicy};
pub use config::{Config, DatasetConfig, PipelineConfig};
pub use error::{PipelineErr, Result};
pub use pipeline::{EpochBatches, Pipeline};
