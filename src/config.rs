//! JSON configuration for the pipeline and the dataset it reads.

use std::{fs, num::NonZeroUsize, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    batch::RemainderPolicy,
    dataset::{DatasetSource, ImageShape, SourceSplit, Stl10Source, SyntheticSource, STL10_SHAPE},
    split::ValidationSize,
    PipelineErr, Result,
};

const DEFAULT_SHUFFLE_BUFFER: NonZeroUsize = nonzero(5000);
const DEFAULT_BATCH_SIZE: NonZeroUsize = nonzero(32);
const DEFAULT_EPOCHS: NonZeroUsize = nonzero(1);

const fn nonzero(n: usize) -> NonZeroUsize {
    match NonZeroUsize::new(n) {
        Some(n) => n,
        None => panic!("value must be non-zero"),
    }
}

/// How the examples of a split are shuffled, partitioned and batched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub shuffle_buffer: NonZeroUsize,
    pub reshuffle_each_iteration: bool,
    pub validation: ValidationSize,
    pub batch_size: NonZeroUsize,
    pub remainder: RemainderPolicy,
    /// Run the per-example transform on the rayon thread pool.
    pub parallel: bool,
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            shuffle_buffer: DEFAULT_SHUFFLE_BUFFER,
            reshuffle_each_iteration: true,
            validation: ValidationSize::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            remainder: RemainderPolicy::default(),
            parallel: true,
            seed: None,
        }
    }
}

impl PipelineConfig {
    /// Checks the values that can be validated without knowing the dataset.
    pub fn validate(&self) -> Result<()> {
        if let ValidationSize::Fraction(fraction) = self.validation {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(PipelineErr::InvalidConfig(format!(
                    "validation fraction {fraction} is not in [0, 1]"
                )));
            }
        }

        Ok(())
    }
}

/// Where the raw examples come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum DatasetConfig {
    /// An extracted `stl10_binary` directory.
    Stl10 { path: PathBuf },
    /// Randomly generated images.
    Synthetic {
        #[serde(default = "default_train_size")]
        train_size: usize,
        #[serde(default = "default_test_size")]
        test_size: usize,
        #[serde(default = "default_shape")]
        shape: ImageShape,
        #[serde(default = "default_num_classes")]
        num_classes: usize,
        #[serde(default)]
        seed: u64,
    },
}

fn default_train_size() -> usize {
    5000
}

fn default_test_size() -> usize {
    8000
}

fn default_shape() -> ImageShape {
    STL10_SHAPE
}

fn default_num_classes() -> usize {
    10
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self::Synthetic {
            train_size: default_train_size(),
            test_size: default_test_size(),
            shape: default_shape(),
            num_classes: default_num_classes(),
            seed: 0,
        }
    }
}

impl DatasetConfig {
    /// Builds the source this config describes.
    pub fn build(&self) -> Result<Box<dyn DatasetSource>> {
        match self {
            DatasetConfig::Stl10 { path } => Ok(Box::new(Stl10Source::new(path.clone())?)),
            DatasetConfig::Synthetic {
                train_size,
                test_size,
                shape,
                num_classes,
                seed,
            } => {
                let source = if *shape == STL10_SHAPE && *num_classes == 10 {
                    let stl10 = SyntheticSource::stl10_like(*seed)?;
                    SyntheticSource::new(stl10.metadata().clone(), *train_size, *test_size, *seed)
                } else {
                    SyntheticSource::with_classes(
                        *shape,
                        *num_classes,
                        *train_size,
                        *test_size,
                        *seed,
                    )?
                };

                Ok(Box::new(source))
            }
        }
    }
}

/// The complete configuration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub split: SourceSplit,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default = "default_epochs")]
    pub epochs: NonZeroUsize,
}

fn default_epochs() -> NonZeroUsize {
    DEFAULT_EPOCHS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            split: SourceSplit::default(),
            pipeline: PipelineConfig::default(),
            epochs: DEFAULT_EPOCHS,
        }
    }
}

impl Config {
    /// Parses and validates a config from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config from a JSON file.
    pub fn from_json_file(path: impl Into<PathBuf>) -> Result<Self> {
        let json = fs::read_to_string(path.into())?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_reference_defaults() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config, Config::default());

        let pipeline = config.pipeline;
        assert_eq!(pipeline.shuffle_buffer.get(), 5000);
        assert!(pipeline.reshuffle_each_iteration);
        assert_eq!(pipeline.validation, ValidationSize::Count(1000));
        assert_eq!(pipeline.batch_size.get(), 32);
        assert_eq!(pipeline.remainder, RemainderPolicy::Keep);
        assert_eq!(config.split, SourceSplit::Train);
    }

    #[test]
    fn full_config_parses() {
        let json = r#"{
            "dataset": { "stl10": { "path": "data/stl10_binary" } },
            "split": "test",
            "pipeline": {
                "shuffle_buffer": 100,
                "reshuffle_each_iteration": false,
                "validation": { "fraction": 0.2 },
                "batch_size": 16,
                "remainder": "drop",
                "parallel": false,
                "seed": 7
            },
            "epochs": 3
        }"#;

        let config = Config::from_json_str(json).unwrap();
        assert_eq!(
            config.dataset,
            DatasetConfig::Stl10 {
                path: "data/stl10_binary".into()
            }
        );
        assert_eq!(config.split, SourceSplit::Test);
        assert_eq!(config.pipeline.validation, ValidationSize::Fraction(0.2));
        assert_eq!(config.pipeline.remainder, RemainderPolicy::Drop);
        assert_eq!(config.pipeline.seed, Some(7));
        assert_eq!(config.epochs.get(), 3);
    }

    #[test]
    fn partial_synthetic_config_fills_defaults() {
        let json = r#"{ "dataset": { "synthetic": { "train_size": 10, "num_classes": 3 } } }"#;
        let config = Config::from_json_str(json).unwrap();

        let DatasetConfig::Synthetic {
            train_size,
            shape,
            num_classes,
            ..
        } = config.dataset
        else {
            panic!("expected a synthetic dataset");
        };
        assert_eq!(train_size, 10);
        assert_eq!(num_classes, 3);
        assert_eq!(shape, STL10_SHAPE);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            Config::from_json_str(r#"{ "pipeline": { "batch_size": 0 } }"#),
            Err(PipelineErr::Json(_))
        ));
        assert!(matches!(
            Config::from_json_str(r#"{ "pipeline": { "validation": { "fraction": 2.0 } } }"#),
            Err(PipelineErr::InvalidConfig(_))
        ));
    }

    #[test]
    fn misspelled_keys_are_rejected() {
        let misspelled = [
            r#"{ "dataset": { "synthetic": { "size": 100 } } }"#,
            r#"{ "dataset": { "stl10": { "path": "data", "dir": "data" } } }"#,
            r#"{ "pipeline": { "batchsize": 16 } }"#,
            r#"{ "epoch": 2 }"#,
            r#"{ "dataset": { "synthetic": { "shape": { "height": 2, "width": 2, "channel": 1 } } } }"#,
        ];

        for json in misspelled {
            assert!(
                matches!(Config::from_json_str(json), Err(PipelineErr::Json(_))),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn oversized_synthetic_shape_fails_to_build() {
        let json = r#"{ "dataset": { "synthetic": {
            "shape": { "height": 4294967296, "width": 4294967296, "channels": 2 }
        } } }"#;
        let config = Config::from_json_str(json).unwrap();

        assert!(matches!(
            config.dataset.build(),
            Err(PipelineErr::InvalidConfig(_))
        ));
    }

    #[test]
    fn synthetic_dataset_builds() {
        let config = DatasetConfig::Synthetic {
            train_size: 4,
            test_size: 2,
            shape: ImageShape::new(2, 2, 1),
            num_classes: 3,
            seed: 1,
        };

        let source = config.build().unwrap();
        assert_eq!(source.metadata().num_classes(), 3);
        assert_eq!(source.open(SourceSplit::Train).unwrap().count(), 4);
        assert_eq!(source.open(SourceSplit::Test).unwrap().count(), 2);
    }
}
