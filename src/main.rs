use std::env;

use anyhow::Context;
use log::{debug, info};

use image_pipeline::{Config, EpochBatches, Pipeline};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match env::args().nth(1) {
        Some(path) => Config::from_json_file(path.as_str())
            .with_context(|| format!("failed to load config from {path}"))?,
        None => {
            info!("no config given, using a synthetic stl10-shaped dataset");
            Config::default()
        }
    };

    let source = config.dataset.build().context("failed to open the dataset")?;
    let mut pipeline = Pipeline::from_source(source.as_ref(), config.split, &config.pipeline)
        .context("failed to build the pipeline")?;

    let counts = pipeline.class_counts();
    for (label, name) in pipeline.metadata().class_names().iter().enumerate() {
        info!(
            "{name}: {} validation, {} training",
            counts.validation[label], counts.training[label]
        );
    }

    let (batches, examples) = drain(pipeline.validation_batches())?;
    info!("validation: {batches} batches, {examples} examples");

    for _ in 0..config.epochs.get() {
        let (batches, examples) = drain(pipeline.training_batches())?;
        info!(
            "epoch {}: {batches} training batches, {examples} examples",
            pipeline.epoch()
        );
    }

    Ok(())
}

/// Consumes every batch of a pass, returning how many batches and examples it had.
fn drain(batches: EpochBatches<'_>) -> image_pipeline::Result<(usize, usize)> {
    let mut count = 0;
    let mut examples = 0;

    for batch in batches {
        let batch = batch?;
        debug!(
            "batch {count}: images {:?}, labels {:?}",
            batch.images.dim(),
            batch.labels.dim()
        );
        count += 1;
        examples += batch.len();
    }

    Ok((count, examples))
}
