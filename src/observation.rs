//! Observations to be scored, and their JSON codec.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::helpers::serde::to_vec_pretty;
use crate::prelude::*;

pub const DEFAULT_PREDICTION_FIELD: &str = "predicted_diabetes_progression";
pub const INDEPENDENT_VARIABLES_FIELD: &str = "independent_variables";

#[derive(Error, Debug)]
pub enum ObservationError {
    #[error("malformed observation")]
    Malformed(#[from] serde_json::Error),

    #[error("`{0}` is expected to be a number")]
    InvalidPredictionField(String),

    #[error("the observation has not been predicted yet")]
    NotPredicted,

    #[error("the prediction {0} is not finite")]
    NonFinite(f64),

    #[error("the prediction field name is empty")]
    EmptyPredictionField,

    #[error("`{0}` is reserved and cannot be the prediction field")]
    ReservedPredictionField(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IndependentVariable {
    pub name: String,
    pub value: f64,
}

impl IndependentVariable {
    #[allow(dead_code)]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub independent_variables: Vec<IndependentVariable>,

    prediction: Option<f64>,

    /// Unrecognised top-level fields, written back as is.
    extra: Map<String, Value>,
}

impl Observation {
    #[allow(dead_code)]
    pub fn new(independent_variables: Vec<IndependentVariable>) -> Self {
        Self {
            independent_variables,
            prediction: None,
            extra: Map::new(),
        }
    }

    #[allow(dead_code)]
    pub const fn prediction(&self) -> Option<f64> {
        self.prediction
    }

    pub fn set_prediction(&mut self, prediction: f64) {
        debug_assert!(self.prediction.is_none(), "the prediction is already set");
        self.prediction = Some(prediction);
    }
}

#[derive(Deserialize)]
struct RawObservation {
    independent_variables: Vec<IndependentVariable>,

    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// Reads and writes observation records with a configurable prediction field name.
#[derive(Debug, Clone)]
pub struct Codec {
    prediction_field: String,
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            prediction_field: DEFAULT_PREDICTION_FIELD.to_string(),
        }
    }
}

impl Codec {
    /// The field must be non-empty and must not clash with `independent_variables`.
    pub fn new(prediction_field: impl Into<String>) -> StdResult<Self, ObservationError> {
        let prediction_field = prediction_field.into();
        if prediction_field.is_empty() {
            return Err(ObservationError::EmptyPredictionField);
        }
        if prediction_field == INDEPENDENT_VARIABLES_FIELD {
            return Err(ObservationError::ReservedPredictionField(prediction_field));
        }
        Ok(Self { prediction_field })
    }

    /// Parses an input record. A prediction already present in the input is discarded.
    pub fn decode(&self, bytes: &[u8]) -> StdResult<Observation, ObservationError> {
        let raw: RawObservation = serde_json::from_slice(bytes)?;
        let mut extra = Map::new();
        for (key, value) in raw.fields {
            if key != self.prediction_field {
                extra.insert(key, value);
            } else if !(value.is_number() || value.is_null()) {
                return Err(ObservationError::InvalidPredictionField(key));
            }
        }
        Ok(Observation {
            independent_variables: raw.independent_variables,
            prediction: None,
            extra,
        })
    }

    /// Writes the prediction field first, then the independent variables and the rest.
    pub fn encode(&self, observation: &Observation) -> StdResult<Vec<u8>, ObservationError> {
        let prediction = observation.prediction.ok_or(ObservationError::NotPredicted)?;
        if !prediction.is_finite() {
            return Err(ObservationError::NonFinite(prediction));
        }

        let mut object = Map::with_capacity(observation.extra.len() + 2);
        object.insert(self.prediction_field.clone(), Value::from(prediction));
        object.insert(
            INDEPENDENT_VARIABLES_FIELD.to_string(),
            serde_json::to_value(&observation.independent_variables)?,
        );
        for (key, value) in &observation.extra {
            object.insert(key.clone(), value.clone());
        }
        Ok(to_vec_pretty(&Value::Object(object))?)
    }
}
