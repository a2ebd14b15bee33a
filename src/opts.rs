//! CLI options.

use std::path::PathBuf;

use clap::Parser;

use crate::observation::DEFAULT_PREDICTION_FIELD;
use crate::predictor::batch::ErrorPolicy;

pub mod parsers;

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Opts {
    /// Sentry DSN
    #[arg(long, env = "LINREG_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    #[command(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(clap::Subcommand)]
pub enum Subcommand {
    Train(TrainOpts),
    Predict(PredictOpts),
}

/// Fits a linear model on a labeled table
#[derive(clap::Args)]
pub struct TrainOpts {
    /// Comma-separated table with a header row
    #[arg(long, env = "LINREG_DATASET", default_value = "data/diabetes.csv")]
    pub dataset: PathBuf,

    /// Header name of the observed (dependent) column
    #[arg(long, env = "LINREG_OBSERVED", value_parser = parsers::column_name)]
    pub observed: String,

    /// Header name of an independent variable column, in the model order
    #[arg(
        long = "feature",
        env = "LINREG_FEATURES",
        value_delimiter = ',',
        required = true,
        value_parser = parsers::column_name,
    )]
    pub features: Vec<String>,

    /// Expected number of fields in every record, defaults to the header width
    #[arg(long = "columns", env = "LINREG_COLUMNS", value_parser = parsers::non_zero_usize)]
    pub n_fields: Option<usize>,

    /// Path to write the model to
    #[arg(short, long, env = "LINREG_MODEL", default_value = "model.json")]
    pub output: PathBuf,
}

/// Applies a trained model to every observation file of a directory
#[derive(clap::Args)]
pub struct PredictOpts {
    /// Path to the trained model
    #[arg(short, long, env = "LINREG_MODEL", default_value = "model.json")]
    pub model: PathBuf,

    /// Directory with the observation files
    #[arg(long, env = "LINREG_INPUT_DIR", default_value = "data/test")]
    pub input_dir: PathBuf,

    /// Directory to write the predicted observations to, under the same file names
    #[arg(long, env = "LINREG_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Name of the output field holding the prediction
    #[arg(
        long,
        env = "LINREG_PREDICTION_FIELD",
        default_value = DEFAULT_PREDICTION_FIELD,
        value_parser = parsers::prediction_field,
    )]
    pub prediction_field: String,

    /// What to do when an observation file cannot be predicted
    #[arg(long, env = "LINREG_ON_ERROR", value_enum, default_value_t = ErrorPolicy::Skip)]
    pub on_error: ErrorPolicy,
}
