//! Evaluates a linear model against observations.

use thiserror::Error;

use crate::helpers::tracing::format_elapsed;
use crate::model::Model;
use crate::observation::{Codec, Observation};
use crate::opts::PredictOpts;
use crate::predictor::batch::Batch;
use crate::prelude::*;

pub mod batch;

#[instrument(skip_all)]
pub fn run(opts: PredictOpts) -> Result {
    let start_instant = Instant::now();
    let model = Model::read(&opts.model)?;
    info!(n_coefficients = model.coefficients.len(), formula = %model, "loaded the model");

    let batch = Batch::new(&model, Codec::new(opts.prediction_field)?, opts.on_error);
    let summary = batch.process_directory(&opts.input_dir, &opts.output_dir)?;
    info!(
        summary.n_predicted,
        summary.n_failed,
        elapsed = %format_elapsed(start_instant),
        "finished",
    );

    match summary.n_failed {
        0 => Ok(()),
        n_failed => Err(anyhow!(
            "{} of {} observations failed",
            n_failed,
            n_failed + summary.n_predicted,
        )),
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PredictionError {
    #[error("expected a value for variable `{0}`")]
    MissingVariable(String),
}

/// Model prepared for repeated evaluation.
///
/// Coefficients are staged into a name-keyed map, where the last duplicate wins,
/// and into an ordered list of unique names, where the first occurrence defines the position.
/// Iteration follows the list, so error reporting and rounding are reproducible.
pub struct Predictor<'a> {
    intercept: f64,
    coefficients: AHashMap<&'a str, f64>,
    names: Vec<&'a str>,
}

impl<'a> Predictor<'a> {
    pub fn new(model: &'a Model) -> Self {
        let mut coefficients =
            AHashMap::with_capacity_and_hasher(model.coefficients.len(), Default::default());
        let mut names = Vec::with_capacity(model.coefficients.len());
        for coefficient in &model.coefficients {
            if coefficients
                .insert(coefficient.name.as_str(), coefficient.coefficient)
                .is_none()
            {
                names.push(coefficient.name.as_str());
            }
        }
        Self {
            intercept: model.intercept,
            coefficients,
            names,
        }
    }

    /// Computes the prediction without touching the observation.
    ///
    /// If the observation repeats a variable, its last value is used.
    /// Variables without a coefficient are ignored.
    pub fn predict(&self, observation: &Observation) -> StdResult<f64, PredictionError> {
        let values: AHashMap<&str, f64> = observation
            .independent_variables
            .iter()
            .map(|variable| (variable.name.as_str(), variable.value))
            .collect();

        let mut prediction = self.intercept;
        for name in &self.names {
            let value = values
                .get(*name)
                .ok_or_else(|| PredictionError::MissingVariable(name.to_string()))?;
            prediction += self.coefficients[*name] * value;
        }
        Ok(prediction)
    }

    /// Computes the prediction and stores it in the observation.
    pub fn apply(&self, observation: &mut Observation) -> StdResult<f64, PredictionError> {
        let prediction = self.predict(observation)?;
        observation.set_prediction(prediction);
        Ok(prediction)
    }
}

#[allow(dead_code)]
pub fn predict(model: &Model, observation: &Observation) -> StdResult<f64, PredictionError> {
    Predictor::new(model).predict(observation)
}
