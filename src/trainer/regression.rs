//! Ordinary least squares fit, solved by SVD of the design matrix.

use nalgebra::{DMatrix, DVector};
use statrs::statistics::Statistics;

use crate::model::{Coefficient, Model};
use crate::prelude::*;
use crate::trainer::dataset::Dataset;

pub struct Fit {
    pub model: Model,

    /// Coefficient of determination on the training examples.
    pub r_squared: f64,
}

#[instrument(level = "debug", skip_all)]
pub fn fit(dataset: &Dataset) -> Result<Fit> {
    let n_examples = dataset.examples.len();
    let n_parameters = dataset.feature_names.len() + 1;
    if n_examples <= dataset.feature_names.len() {
        bail!(
            "{} examples are not enough to fit {} features",
            n_examples,
            dataset.feature_names.len(),
        );
    }
    if let Some((observed, features)) = dataset
        .examples
        .iter()
        .find(|(_, features)| features.len() != dataset.feature_names.len())
    {
        bail!("example with observed value {} has {} features", observed, features.len());
    }

    // Leading column of ones is the intercept.
    let x = DMatrix::from_fn(n_examples, n_parameters, |i, j| match j {
        0 => 1.0,
        _ => dataset.examples[i].1[j - 1],
    });
    let y = DVector::from_iterator(n_examples, dataset.examples.iter().map(|(observed, _)| *observed));

    let svd = x.clone().svd(true, true);
    let max_singular_value = svd.singular_values.iter().copied().fold(0.0, f64::max);
    let tolerance = max_singular_value * n_examples.max(n_parameters) as f64 * f64::EPSILON;
    let rank = svd.rank(tolerance);
    if rank < n_parameters {
        warn!(rank, n_parameters, "the features are linearly dependent");
    }
    let beta = svd
        .solve(&y, tolerance)
        .map_err(|error| anyhow!("failed to solve the least squares problem: {}", error))?;
    if !beta.iter().all(|value| value.is_finite()) {
        bail!("the least squares solution is not finite");
    }

    let residuals = &y - &x * &beta;
    let r_squared = 1.0 - residuals.iter().population_variance() / y.iter().population_variance();
    debug!(r_squared, "fitted");

    let model = Model {
        intercept: beta[0],
        coefficients: dataset
            .feature_names
            .iter()
            .zip(beta.iter().skip(1))
            .map(|(name, coefficient)| Coefficient {
                name: name.clone(),
                coefficient: *coefficient,
            })
            .collect(),
    };
    Ok(Fit { model, r_squared })
}
