use clap::Parser;

use crate::opts::{Opts, Subcommand};
use crate::prelude::*;

mod helpers;
mod model;
mod observation;
mod opts;
mod predictor;
mod prelude;
mod trainer;

fn main() -> Result {
    let opts = Opts::parse();
    let _sentry_guard = helpers::tracing::init(opts.sentry_dsn)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting…");

    let result = match opts.subcommand {
        Subcommand::Train(opts) => trainer::run(opts),
        Subcommand::Predict(opts) => predictor::run(opts),
    };
    if let Err(error) = &result {
        sentry::integrations::anyhow::capture_anyhow(error);
    }
    result
}
