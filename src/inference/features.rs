//! Tabular feature vectors for the crop recommendation model

use std::collections::HashMap;

use crate::inference::tensor::InputTensor;
use crate::utils::error::{CropSightError, Result};

/// Soil and weather features in training column order
pub const CROP_FEATURES: [&str; 7] = ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"];

/// Build a `(1, n)` tensor taking values in `names` order.
///
/// Unknown keys in `values` are ignored; a missing or non-finite value is an
/// input validation error.
pub fn encode_features<S: AsRef<str>>(names: &[S], values: &HashMap<String, f64>) -> Result<InputTensor> {
    let mut vector = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref();
        let value = values.get(name).ok_or_else(|| {
            CropSightError::InputValidation(format!("Missing required feature: {}", name))
        })?;
        if !value.is_finite() {
            return Err(CropSightError::InputValidation(format!(
                "Feature '{}' must be a finite number",
                name
            )));
        }
        vector.push(*value as f32);
    }
    Ok(InputTensor::from_features(&vector))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HashMap<String, f64> {
        [
            ("rainfall", 202.9),
            ("N", 90.0),
            ("P", 42.0),
            ("K", 43.0),
            ("temperature", 20.8),
            ("humidity", 82.0),
            ("ph", 6.5),
            ("extra", 1.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[test]
    fn test_encodes_in_declared_order() {
        let tensor = encode_features(&CROP_FEATURES, &sample()).unwrap();
        assert_eq!(tensor.shape(), &[1, 7]);
        assert_eq!(tensor.data()[0], 90.0);
        assert!((tensor.data()[6] - 202.9).abs() < 1e-3);
    }

    #[test]
    fn test_missing_feature_rejected() {
        let mut values = sample();
        values.remove("ph");
        let err = encode_features(&CROP_FEATURES, &values).unwrap_err();
        assert_eq!(err.to_string(), "Missing required feature: ph");
    }
}
