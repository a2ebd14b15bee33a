use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use itertools::Itertools;

use crate::prelude::*;

/// Columns to pick from the table, by their header names.
#[derive(Debug)]
pub struct Columns<'a> {
    pub observed: &'a str,
    pub features: &'a [String],

    /// Fixed number of fields per record, defaults to the header width.
    pub n_fields: Option<usize>,
}

/// Labeled training examples.
#[derive(Debug, PartialEq)]
pub struct Dataset {
    pub observed_name: String,
    pub feature_names: Vec<String>,

    /// Observed value and feature vector of each example, in the table order.
    pub examples: Vec<(f64, Vec<f64>)>,
}

impl Dataset {
    #[instrument(level = "debug")]
    pub fn read(path: &Path, columns: &Columns) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
        let dataset = Self::from_reader(file, columns)
            .with_context(|| format!("failed to read the dataset from `{}`", path.display()))?;
        debug!(n_examples = dataset.examples.len(), "read");
        Ok(dataset)
    }

    /// Reads a comma-separated table. The first row is the header.
    pub fn from_reader<R: Read>(reader: R, columns: &Columns) -> Result<Self> {
        if columns.features.is_empty() {
            bail!("at least one feature column is required");
        }
        if let Some(name) = columns.features.iter().duplicates().next() {
            bail!("feature `{}` is selected more than once", name);
        }
        if columns.features.iter().any(|name| name == columns.observed) {
            bail!("`{}` is the observed column and cannot be a feature", columns.observed);
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let n_fields = columns.n_fields.unwrap_or(headers.len());
        if headers.len() != n_fields {
            bail!("the header has {} fields, expected {}", headers.len(), n_fields);
        }

        let observed_index = find_column(&headers, columns.observed)?;
        let feature_indices = columns
            .features
            .iter()
            .map(|name| find_column(&headers, name))
            .collect::<Result<Vec<usize>>>()?;

        let mut examples = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |position| position.line());
            if record.len() != n_fields {
                bail!("line {} has {} fields, expected {}", line, record.len(), n_fields);
            }
            let observed = parse_field(&headers, &record, observed_index, line)?;
            let features = feature_indices
                .iter()
                .map(|index| parse_field(&headers, &record, *index, line))
                .collect::<Result<Vec<f64>>>()?;
            examples.push((observed, features));
        }
        if examples.is_empty() {
            bail!("the dataset has no examples");
        }

        Ok(Self {
            observed_name: columns.observed.to_string(),
            feature_names: columns.features.to_vec(),
            examples,
        })
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header.trim() == name)
        .ok_or_else(|| anyhow!("column `{}` is not found in the header", name))
}

/// Parses a finite number, `NaN` and infinities are rejected.
fn parse_field(headers: &StringRecord, record: &StringRecord, index: usize, line: u64) -> Result<f64> {
    let field = &record[index];
    let value: f64 = field
        .trim()
        .parse()
        .with_context(|| format!("line {}, column `{}`: `{}` is not a number", line, &headers[index], field))?;
    if !value.is_finite() {
        bail!("line {}, column `{}`: `{}` is not finite", line, &headers[index], field);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "age,sex,bmi,bp,y\n0.038,0.05,0.0617,0.0219,151\n-0.0019,-0.0446, -0.0515,-0.0263,75\n";

    fn features(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn from_reader_ok() -> Result {
        let features = features(&["bmi", "age"]);
        let columns = Columns {
            observed: "y",
            features: &features,
            n_fields: Some(5),
        };
        let dataset = Dataset::from_reader(TABLE.as_bytes(), &columns)?;
        assert_eq!(dataset.observed_name, "y");
        assert_eq!(dataset.feature_names, ["bmi", "age"]);
        assert_eq!(
            dataset.examples,
            vec![(151.0, vec![0.0617, 0.038]), (75.0, vec![-0.0515, -0.0019])],
        );
        Ok(())
    }

    #[test]
    fn from_reader_wrong_field_count_fails() {
        let features = features(&["bmi"]);
        let columns = Columns {
            observed: "y",
            features: &features,
            n_fields: None,
        };
        let error = Dataset::from_reader("bmi,y\n1,2\n3,4,5\n".as_bytes(), &columns).unwrap_err();
        assert_eq!(error.to_string(), "line 3 has 3 fields, expected 2");
    }

    #[test]
    fn from_reader_wrong_header_width_fails() {
        let features = features(&["bmi"]);
        let columns = Columns {
            observed: "y",
            features: &features,
            n_fields: Some(11),
        };
        assert!(Dataset::from_reader(TABLE.as_bytes(), &columns).is_err());
    }

    #[test]
    fn from_reader_unknown_column_fails() {
        let features = features(&["weight"]);
        let columns = Columns {
            observed: "y",
            features: &features,
            n_fields: None,
        };
        let error = Dataset::from_reader(TABLE.as_bytes(), &columns).unwrap_err();
        assert_eq!(error.to_string(), "column `weight` is not found in the header");
    }

    #[test]
    fn from_reader_not_a_number_fails() {
        let features = features(&["bmi"]);
        let columns = Columns {
            observed: "y",
            features: &features,
            n_fields: None,
        };
        let error = Dataset::from_reader("bmi,y\n1,2\nn/a,4\n".as_bytes(), &columns).unwrap_err();
        assert_eq!(error.to_string(), "line 3, column `bmi`: `n/a` is not a number");
    }

    #[test]
    fn from_reader_non_finite_fails() {
        let features = features(&["bmi"]);
        let columns = Columns {
            observed: "y",
            features: &features,
            n_fields: None,
        };
        let error = Dataset::from_reader("bmi,y\n1,2\nNaN,4\n".as_bytes(), &columns).unwrap_err();
        assert_eq!(error.to_string(), "line 3, column `bmi`: `NaN` is not finite");
        let error = Dataset::from_reader("bmi,y\n1,inf\n".as_bytes(), &columns).unwrap_err();
        assert_eq!(error.to_string(), "line 2, column `y`: `inf` is not finite");
        let error = Dataset::from_reader("bmi,y\n-infinity,2\n".as_bytes(), &columns).unwrap_err();
        assert_eq!(error.to_string(), "line 2, column `bmi`: `-infinity` is not finite");
    }

    #[test]
    fn from_reader_duplicate_feature_fails() {
        let features = features(&["bmi", "bp", "bmi"]);
        let columns = Columns {
            observed: "y",
            features: &features,
            n_fields: None,
        };
        assert!(Dataset::from_reader(TABLE.as_bytes(), &columns).is_err());
    }

    #[test]
    fn from_reader_observed_feature_fails() {
        let features = features(&["y"]);
        let columns = Columns {
            observed: "y",
            features: &features,
            n_fields: None,
        };
        assert!(Dataset::from_reader(TABLE.as_bytes(), &columns).is_err());
    }

    #[test]
    fn from_reader_empty_fails() {
        let features = features(&["bmi"]);
        let columns = Columns {
            observed: "y",
            features: &features,
            n_fields: None,
        };
        assert!(Dataset::from_reader("bmi,y\n".as_bytes(), &columns).is_err());
    }
}
