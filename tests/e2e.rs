use std::{collections::HashSet, num::NonZeroUsize};

use image_pipeline::{
    dataset::{DatasetSource, ImageShape, SourceSplit, SyntheticSource},
    split::ValidationSize,
    Batch, Config, Pipeline, PipelineConfig, RemainderPolicy,
};

fn reference_config(seed: u64) -> PipelineConfig {
    PipelineConfig {
        shuffle_buffer: NonZeroUsize::new(5000).unwrap(),
        reshuffle_each_iteration: true,
        validation: ValidationSize::Count(1000),
        batch_size: NonZeroUsize::new(32).unwrap(),
        remainder: RemainderPolicy::Keep,
        parallel: true,
        seed: Some(seed),
    }
}

fn small_stl10(seed: u64) -> SyntheticSource {
    SyntheticSource::with_classes(ImageShape::new(4, 4, 3), 10, 5000, 0, seed).unwrap()
}

fn collect(batches: impl Iterator<Item = image_pipeline::Result<Batch>>) -> Vec<Batch> {
    batches.map(|b| b.unwrap()).collect()
}

#[test]
fn reference_scenario_batch_layout() {
    let source = small_stl10(1);
    let mut pipeline =
        Pipeline::from_source(&source, SourceSplit::Train, &reference_config(5)).unwrap();
    assert_eq!(pipeline.len(), 5000);

    let validation = collect(pipeline.validation_batches());
    assert_eq!(validation.len(), 32);
    assert!(validation[..31].iter().all(|b| b.len() == 32));
    assert_eq!(validation[31].len(), 8);
    assert_eq!(validation.iter().map(Batch::len).sum::<usize>(), 1000);

    let training = collect(pipeline.training_batches());
    assert_eq!(training.len(), 125);
    assert!(training.iter().all(|b| b.len() == 32));

    for batch in validation.iter().chain(&training) {
        assert_eq!(batch.images.ncols(), 4 * 4 * 3);
        assert_eq!(batch.labels.ncols(), 10);
        assert!(batch.images.iter().all(|&p| (0.0..=1.0).contains(&p)));
        for row in batch.labels.rows() {
            assert_eq!(row.sum(), 1.0);
            assert_eq!(row.iter().filter(|&&v| v == 1.0).count(), 1);
        }
    }
}

#[test]
fn batches_carry_the_examples_of_their_partition() {
    let source = small_stl10(2);
    let mut pipeline =
        Pipeline::from_source(&source, SourceSplit::Train, &reference_config(8)).unwrap();

    let validation = collect(pipeline.validation_batches());
    let first = pipeline.raw(pipeline.validation_indices()[0]).unwrap();
    let expected: Vec<f32> = first.image.iter().map(|&p| p as f32 / 255.0).collect();
    assert_eq!(validation[0].images.row(0).to_vec(), expected);
    assert_eq!(validation[0].labels.row(0)[first.label], 1.0);

    let validation: HashSet<_> = pipeline.validation_indices().iter().copied().collect();
    let _ = pipeline.training_batches();
    let training: HashSet<_> = pipeline.training_indices().iter().copied().collect();
    assert!(validation.is_disjoint(&training));
    assert_eq!(validation.len() + training.len(), 5000);
}

#[test]
fn epochs_reshuffle_training_but_not_validation() {
    let source = small_stl10(3);
    let mut pipeline =
        Pipeline::from_source(&source, SourceSplit::Train, &reference_config(13)).unwrap();

    let validation_before = collect(pipeline.validation_batches());
    let epoch_1 = collect(pipeline.training_batches());
    let epoch_2 = collect(pipeline.training_batches());
    let validation_after = collect(pipeline.validation_batches());

    assert_eq!(pipeline.epoch(), 2);
    assert_ne!(epoch_1, epoch_2);
    assert_eq!(validation_before, validation_after);
}

#[test]
fn same_seed_same_batches() {
    let source = small_stl10(4);
    let config = reference_config(21);

    let mut a = Pipeline::from_source(&source, SourceSplit::Train, &config).unwrap();
    let mut b = Pipeline::from_source(&source, SourceSplit::Train, &config).unwrap();

    assert_eq!(a.validation_indices(), b.validation_indices());
    for _ in 0..2 {
        assert_eq!(
            collect(a.training_batches()),
            collect(b.training_batches())
        );
    }
}

#[test]
fn config_driven_run() {
    let json = r#"{
        "dataset": {
            "synthetic": {
                "train_size": 100,
                "shape": { "height": 2, "width": 2, "channels": 1 },
                "num_classes": 4,
                "seed": 3
            }
        },
        "pipeline": {
            "shuffle_buffer": 100,
            "validation": { "fraction": 0.2 },
            "batch_size": 16,
            "parallel": false,
            "seed": 1
        }
    }"#;

    let config = Config::from_json_str(json).unwrap();
    let source = config.dataset.build().unwrap();
    assert_eq!(source.metadata().num_classes(), 4);

    let mut pipeline =
        Pipeline::from_source(source.as_ref(), config.split, &config.pipeline).unwrap();
    assert_eq!(pipeline.validation_indices().len(), 20);
    assert_eq!(pipeline.validation_batches().len(), 2);
    assert_eq!(pipeline.training_batches().len(), 5);
    assert_eq!(pipeline.batch_count(80), 5);
}
