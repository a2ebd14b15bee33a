//! Fits a linear model on a labeled table and persists it.

use crate::helpers::tracing::format_elapsed;
use crate::opts::TrainOpts;
use crate::prelude::*;
use crate::trainer::dataset::{Columns, Dataset};

pub mod dataset;
pub mod regression;

#[instrument(skip_all, fields(dataset = %opts.dataset.display()))]
pub fn run(opts: TrainOpts) -> Result {
    let start_instant = Instant::now();
    let columns = Columns {
        observed: &opts.observed,
        features: &opts.features,
        n_fields: opts.n_fields,
    };
    let dataset = Dataset::read(&opts.dataset, &columns)?;
    info!(
        n_examples = dataset.examples.len(),
        n_features = dataset.feature_names.len(),
        observed = dataset.observed_name.as_str(),
        "loaded the dataset",
    );

    let fit = regression::fit(&dataset)?;
    info!(r_squared = fit.r_squared, formula = %fit.model, "fitted");
    println!("\nRegression Formula:\n{}\n", fit.model);

    fit.model.write(&opts.output)?;
    info!(
        path = %opts.output.display(),
        elapsed = %format_elapsed(start_instant),
        "saved the model",
    );
    Ok(())
}
