//! Applies a model to every observation file of a directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::model::Model;
use crate::observation::Codec;
use crate::predictor::Predictor;
use crate::prelude::*;

/// What to do when a single observation file cannot be predicted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ErrorPolicy {
    /// Stop at the first failing file, later files are not opened.
    FailFast,

    /// Log the failing file and continue with the rest.
    Skip,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub n_predicted: usize,
    pub n_failed: usize,
}

pub struct Batch<'a> {
    predictor: Predictor<'a>,
    codec: Codec,
    policy: ErrorPolicy,
}

impl<'a> Batch<'a> {
    pub fn new(model: &'a Model, codec: Codec, policy: ErrorPolicy) -> Self {
        Self {
            predictor: Predictor::new(model),
            codec,
            policy,
        }
    }

    /// Predicts every file of `input_dir` in file name order.
    /// Each output is written to `output_dir` under the input file name.
    #[instrument(skip(self), fields(policy = ?self.policy))]
    pub fn process_directory(&self, input_dir: &Path, output_dir: &Path) -> Result<Summary> {
        let paths = list_files(input_dir)?;
        info!(n_files = paths.len(), "listed");
        fs::create_dir_all(output_dir)
            .with_context(|| format!("failed to create `{}`", output_dir.display()))?;

        let mut summary = Summary::default();
        for path in paths {
            match self.process_file(&path, output_dir) {
                Ok(prediction) => {
                    debug!(path = %path.display(), prediction, "predicted");
                    summary.n_predicted += 1;
                }
                Err(error) if self.policy == ErrorPolicy::Skip => {
                    // The tracing layer reports this to Sentry.
                    error!(path = %path.display(), "skipped: {:#}", error);
                    summary.n_failed += 1;
                }
                Err(error) => return Err(error),
            }
        }
        Ok(summary)
    }

    fn process_file(&self, path: &Path, output_dir: &Path) -> Result<f64> {
        let bytes = fs::read(path).with_context(|| format!("failed to read `{}`", path.display()))?;
        let mut observation = self
            .codec
            .decode(&bytes)
            .with_context(|| format!("failed to decode `{}`", path.display()))?;
        let prediction = self
            .predictor
            .apply(&mut observation)
            .with_context(|| format!("failed to predict `{}`", path.display()))?;

        let file_name = path
            .file_name()
            .ok_or_else(|| anyhow!("`{}` has no file name", path.display()))?;
        let output_path = output_dir.join(file_name);
        let bytes = self.codec.encode(&observation)?;
        fs::write(&output_path, bytes)
            .with_context(|| format!("failed to write `{}`", output_path.display()))?;
        Ok(prediction)
    }
}

/// Lists the non-directory entries, sorted by path.
fn list_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(directory)
        .with_context(|| format!("failed to list `{}`", directory.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        // Unreadable metadata is reported when the file itself is opened.
        if !matches!(fs::metadata(&path), Ok(metadata) if metadata.is_dir()) {
            paths.push(path);
        }
    }
    paths.sort_unstable();
    Ok(paths)
}
