//! Case-insensitive attribute maps read from the project file.
//!
//! Atlas and analysis entries arrive as loosely typed key/value maps. A
//! [`RawSpec`] lower-cases every key once, checks the entry against the
//! declared field sets of its variant and then hands typed values out.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_yaml::Value;

use crate::errors::{ErrorInfo, RoiError};

/// Attribute map exactly as it appears in the project file.
pub type RawAttributes = IndexMap<String, Value>;

/// Normalised attribute map with lower-case keys.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSpec {
    entries: BTreeMap<String, Value>,
}

impl RawSpec {
    /// Lower-cases every key; two keys that differ only by case are rejected.
    pub fn normalize(attributes: &RawAttributes) -> Result<Self, RoiError> {
        let mut entries = BTreeMap::new();
        for (key, value) in attributes {
            let lowered = key.trim().to_ascii_lowercase();
            if entries.insert(lowered.clone(), value.clone()).is_some() {
                return Err(RoiError::Config(
                    ErrorInfo::new("duplicate_field", "field given twice")
                        .with_context("field", lowered),
                ));
            }
        }
        Ok(Self { entries })
    }

    /// Fails on the first missing required field, then on the first unexpected one.
    pub fn check_fields(&self, required: &[&str], optional: &[&str]) -> Result<(), RoiError> {
        for field in required {
            if !self.entries.contains_key(*field) {
                return Err(RoiError::missing_field(field));
            }
        }
        let allowed: BTreeSet<&str> = required.iter().chain(optional).copied().collect();
        for key in self.entries.keys() {
            if !allowed.contains(key.as_str()) {
                return Err(RoiError::unexpected_field(key));
            }
        }
        Ok(())
    }

    /// Deserialises a required field.
    pub fn require<T: DeserializeOwned>(&self, field: &str) -> Result<T, RoiError> {
        let value = self
            .entries
            .get(field)
            .ok_or_else(|| RoiError::missing_field(field))?;
        decode(field, value)
    }

    /// Deserialises an optional field.
    pub fn optional<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>, RoiError> {
        self.entries
            .get(field)
            .map(|value| decode(field, value))
            .transpose()
    }

    /// Reads a required scalar as a trimmed string, accepting numbers too.
    pub fn require_str(&self, field: &str) -> Result<String, RoiError> {
        let value = self
            .entries
            .get(field)
            .ok_or_else(|| RoiError::missing_field(field))?;
        scalar_string(field, value)
    }

    /// Optional counterpart of [`RawSpec::require_str`].
    pub fn optional_str(&self, field: &str) -> Result<Option<String>, RoiError> {
        self.entries
            .get(field)
            .map(|value| scalar_string(field, value))
            .transpose()
    }
}

fn decode<T: DeserializeOwned>(field: &str, value: &Value) -> Result<T, RoiError> {
    serde_yaml::from_value(value.clone()).map_err(|err| {
        RoiError::Config(
            ErrorInfo::new("invalid_field", "field has an invalid value")
                .with_context("field", field)
                .with_hint(err.to_string()),
        )
    })
}

fn scalar_string(field: &str, value: &Value) -> Result<String, RoiError> {
    match value {
        Value::String(text) => Ok(text.trim().to_string()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        _ => Err(RoiError::Config(
            ErrorInfo::new("invalid_field", "expected a scalar value").with_context("field", field),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> RawAttributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn keys_are_case_insensitive() {
        let spec = RawSpec::normalize(&attrs(&[("Source", "mask"), ("MANIFOLD", "volume")]))
            .expect("normalize");
        spec.check_fields(&["source", "manifold"], &[]).expect("fields");
        assert_eq!(spec.require_str("source").expect("source"), "mask");
    }

    #[test]
    fn case_collisions_are_rejected() {
        let err = RawSpec::normalize(&attrs(&[("hemi", "lh"), ("HEMI", "rh")])).unwrap_err();
        assert_eq!(err.info().code, "duplicate_field");
    }

    #[test]
    fn missing_is_reported_before_unexpected() {
        let spec = RawSpec::normalize(&attrs(&[("colour", "red")])).expect("normalize");
        let err = spec.check_fields(&["source"], &[]).unwrap_err();
        assert_eq!(err.info().message, "missing field");
        let spec = RawSpec::normalize(&attrs(&[("source", "mask"), ("colour", "red")]))
            .expect("normalize");
        let err = spec.check_fields(&["source"], &["lut"]).unwrap_err();
        assert_eq!(err.info().message, "unexpected field");
        assert_eq!(err.info().context.get("field").map(String::as_str), Some("colour"));
    }
}
