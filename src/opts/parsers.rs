use std::str::FromStr;

use crate::observation::Codec;
use crate::prelude::*;

pub fn non_zero_usize(value: &str) -> Result<usize> {
    match FromStr::from_str(value)? {
        value if value >= 1 => Ok(value),
        _ => Err(anyhow!("expected a positive number")),
    }
}

pub fn column_name(value: &str) -> Result<String> {
    match value.trim() {
        "" => Err(anyhow!("expected a non-empty column name")),
        value => Ok(value.to_string()),
    }
}

pub fn prediction_field(value: &str) -> Result<String> {
    Codec::new(value)?;
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_zero_usize_ok() -> Result {
        assert_eq!(non_zero_usize("11")?, 11);
        assert!(non_zero_usize("0").is_err());
        assert!(non_zero_usize("-1").is_err());
        Ok(())
    }

    #[test]
    fn column_name_ok() -> Result {
        assert_eq!(column_name(" bmi ")?, "bmi");
        assert!(column_name("  ").is_err());
        Ok(())
    }

    #[test]
    fn prediction_field_ok() -> Result {
        assert_eq!(prediction_field("price")?, "price");
        assert!(prediction_field("").is_err());
        assert!(prediction_field("independent_variables").is_err());
        Ok(())
    }
}
