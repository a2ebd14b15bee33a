//! Linear model shared by the trainer and the predictor.

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::helpers::serde::to_vec_pretty;
use crate::prelude::*;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("malformed model")]
    Malformed(#[from] serde_json::Error),

    #[error("`{0}` is not finite and cannot be persisted")]
    NonFinite(String),
}

/// Fitted intercept and named coefficients.
///
/// Coefficients keep the training column order, so that the serialized model is reproducible.
/// The predictor looks them up by name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Model {
    pub intercept: f64,

    #[serde(default)]
    pub coefficients: Vec<Coefficient>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Coefficient {
    pub name: String,
    pub coefficient: f64,
}

impl Model {
    /// Parses the JSON representation.
    ///
    /// Duplicate coefficient names are accepted here, see [`crate::predictor::Predictor`]
    /// for how they are evaluated.
    pub fn load(bytes: &[u8]) -> StdResult<Self, ModelError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Produces the pretty-printed JSON representation.
    pub fn save(&self) -> StdResult<Vec<u8>, ModelError> {
        if !self.intercept.is_finite() {
            return Err(ModelError::NonFinite("intercept".to_string()));
        }
        if let Some(coefficient) = self
            .coefficients
            .iter()
            .find(|coefficient| !coefficient.coefficient.is_finite())
        {
            return Err(ModelError::NonFinite(coefficient.name.clone()));
        }
        Ok(to_vec_pretty(self)?)
    }

    #[instrument(level = "debug")]
    pub fn read(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read the model from `{}`", path.display()))?;
        let model = Self::load(&bytes).with_context(|| format!("failed to load `{}`", path.display()))?;
        debug!(n_coefficients = model.coefficients.len(), "loaded");
        Ok(model)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn write(&self, path: &Path) -> Result {
        let bytes = self.save()?;
        fs::write(path, bytes)
            .with_context(|| format!("failed to write the model to `{}`", path.display()))
    }
}

/// Regression formula, for example: `Predicted = 152.1335 + bmi*949.4353`.
impl Display for Model {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "Predicted = {:.4}", self.intercept)?;
        for coefficient in &self.coefficients {
            write!(formatter, " + {}*{:.4}", coefficient.name, coefficient.coefficient)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coefficient(name: &str, coefficient: f64) -> Coefficient {
        Coefficient {
            name: name.to_string(),
            coefficient,
        }
    }

    #[test]
    fn load_ok() -> Result {
        let model = Model::load(
            // language=JSON
            br#"{"intercept": 152.5, "coefficients": [{"name": "bmi", "coefficient": 949}]}"#,
        )?;
        assert_eq!(model.intercept, 152.5);
        assert_eq!(model.coefficients, vec![coefficient("bmi", 949.0)]);
        Ok(())
    }

    #[test]
    fn load_missing_coefficients_ok() -> Result {
        // language=JSON
        let model = Model::load(br#"{"intercept": 1.0}"#)?;
        assert!(model.coefficients.is_empty());
        Ok(())
    }

    #[test]
    fn load_duplicate_names_ok() -> Result {
        let model = Model::load(
            // language=JSON
            br#"{"intercept": 0, "coefficients": [{"name": "x", "coefficient": 1}, {"name": "x", "coefficient": 2}]}"#,
        )?;
        assert_eq!(model.coefficients.len(), 2);
        Ok(())
    }

    #[test]
    fn load_missing_intercept_fails() {
        // language=JSON
        let result = Model::load(br#"{"coefficients": []}"#);
        assert!(matches!(result, Err(ModelError::Malformed(_))));
    }

    #[test]
    fn load_wrong_intercept_type_fails() {
        // language=JSON
        let result = Model::load(br#"{"intercept": "10", "coefficients": []}"#);
        assert!(matches!(result, Err(ModelError::Malformed(_))));
    }

    #[test]
    fn load_missing_coefficient_name_fails() {
        // language=JSON
        let result = Model::load(br#"{"intercept": 1, "coefficients": [{"coefficient": 2}]}"#);
        assert!(matches!(result, Err(ModelError::Malformed(_))));
    }

    #[test]
    fn load_missing_coefficient_value_fails() {
        // language=JSON
        let result = Model::load(br#"{"intercept": 1, "coefficients": [{"name": "bmi"}]}"#);
        assert!(matches!(result, Err(ModelError::Malformed(_))));
    }

    #[test]
    fn load_garbage_fails() {
        assert!(matches!(Model::load(b"intercept = 1"), Err(ModelError::Malformed(_))));
    }

    #[test]
    fn save_round_trip_ok() -> Result {
        let model = Model {
            intercept: 152.13348416289614,
            coefficients: vec![
                coefficient("bmi", 949.4352603840384),
                coefficient("ltg", 0.1 + 0.2),
                coefficient("bp", -1e-300),
            ],
        };
        assert_eq!(Model::load(&model.save()?)?, model);
        Ok(())
    }

    #[test]
    fn save_layout_ok() -> Result {
        let model = Model {
            intercept: 10.0,
            coefficients: vec![coefficient("bmi", 5.0)],
        };
        assert_eq!(
            String::from_utf8(model.save()?)?,
            r#"{
    "intercept": 10.0,
    "coefficients": [
        {
            "name": "bmi",
            "coefficient": 5.0
        }
    ]
}"#,
        );
        Ok(())
    }

    #[test]
    fn save_non_finite_fails() {
        let model = Model {
            intercept: 1.0,
            coefficients: vec![coefficient("bmi", f64::NAN)],
        };
        assert!(matches!(model.save(), Err(ModelError::NonFinite(name)) if name == "bmi"));

        let model = Model {
            intercept: f64::INFINITY,
            coefficients: Vec::new(),
        };
        assert!(matches!(model.save(), Err(ModelError::NonFinite(name)) if name == "intercept"));
    }

    #[test]
    fn formula_ok() {
        let model = Model {
            intercept: 152.13348,
            coefficients: vec![coefficient("bmi", 949.43526), coefficient("ltg", -2.0)],
        };
        assert_eq!(model.to_string(), "Predicted = 152.1335 + bmi*949.4353 + ltg*-2.0000");
    }
}
