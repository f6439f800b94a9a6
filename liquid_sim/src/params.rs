//! Flat key/value parameter loading.
//!
//! Parameters come from three layers, later layers winning: a preset
//! scenario, a JSON parameter file, and `key=value` overrides from the
//! command line. The merged map is handed to
//! [`ModelConfig::from_params`], which owns validation.

use crate::error::SimError;
use liquid_core::ModelConfig;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Section name accepted as a wrapper object in parameter files.
pub const MODEL_ARGS_SECTION: &str = "model_args";

/// An ordered set of raw model parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSet {
    values: BTreeMap<String, String>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses a JSON object of parameters.
    ///
    /// The object may be wrapped in a `model_args` section. Strings and
    /// numbers are kept as text; `null` leaves the key absent.
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let root: Value = serde_json::from_str(json)?;
        let object = match root {
            Value::Object(mut map) => match map.remove(MODEL_ARGS_SECTION) {
                Some(Value::Object(section)) => section,
                Some(_) => {
                    return Err(SimError::format(format!(
                        "'{}' must be an object",
                        MODEL_ARGS_SECTION
                    )))
                }
                None => map,
            },
            _ => return Err(SimError::format("parameter file must hold a JSON object")),
        };

        let mut params = Self::new();
        for (key, value) in object {
            match value {
                Value::Null => {}
                Value::String(s) => params.set(key, s),
                Value::Number(n) => params.set(key, n.to_string()),
                other => {
                    return Err(SimError::format(format!(
                        "parameter '{}' has unsupported value {}",
                        key, other
                    )))
                }
            }
        }
        Ok(params)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Overlays `other` on top of `self`.
    pub fn merge(&mut self, other: &ParamSet) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    /// Applies `key=value` overrides in order.
    pub fn apply_overrides<S: AsRef<str>>(&mut self, overrides: &[S]) -> Result<(), SimError> {
        for raw in overrides {
            let (key, value) = parse_override(raw.as_ref())?;
            self.set(key, value);
        }
        Ok(())
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn to_config(&self) -> Result<ModelConfig, SimError> {
        Ok(ModelConfig::from_params(&self.values)?)
    }
}

/// Splits `key=value`, trimming both halves.
pub fn parse_override(raw: &str) -> Result<(String, String), SimError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(SimError::format(format!(
            "expected key=value, got '{}'",
            raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquid_core::{GraphType, LiquidError, Limit};

    #[test]
    fn test_json_numbers_and_strings() {
        let params = ParamSet::from_json_str(
            r#"{
                "total_voters": 25,
                "competence_mean": 0.5,
                "competence_sd": "0.2",
                "connect_probability": 0.3,
                "threshold_diff": 0.1,
                "weight_limit": null,
                "graph_type": 2
            }"#,
        )
        .unwrap();

        assert_eq!(params.get("total_voters"), Some("25"));
        assert_eq!(params.get("competence_sd"), Some("0.2"));
        assert_eq!(params.get("weight_limit"), None);

        let config = params.to_config().unwrap();
        assert_eq!(config.graph_type, GraphType::PreferentialAttachment);
        assert_eq!(config.weight_limit, Limit::Unbounded);
    }

    #[test]
    fn test_model_args_section() {
        let params = ParamSet::from_json_str(r#"{"model_args": {"total_voters": "10"}}"#).unwrap();
        assert_eq!(params.get("total_voters"), Some("10"));

        assert!(ParamSet::from_json_str(r#"{"model_args": 3}"#).is_err());
        assert!(ParamSet::from_json_str("[1, 2]").is_err());
        assert!(ParamSet::from_json_str(r#"{"total_voters": true}"#).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut params = ParamSet::from_pairs([("total_voters", "25"), ("threshold_diff", "0.1")]);
        params
            .apply_overrides(&["threshold_diff = 0.2", "weight_limit=3"])
            .unwrap();

        assert_eq!(params.get("threshold_diff"), Some("0.2"));
        assert_eq!(params.get("weight_limit"), Some("3"));
        assert!(params.apply_overrides(&["novalue"]).is_err());
        assert!(params.apply_overrides(&["=3"]).is_err());
    }

    #[test]
    fn test_merge_layers() {
        let mut base = ParamSet::from_pairs([("a", "1"), ("b", "2")]);
        base.merge(&ParamSet::from_pairs([("b", "3"), ("c", "4")]));

        assert_eq!(base.get("a"), Some("1"));
        assert_eq!(base.get("b"), Some("3"));
        assert_eq!(base.get("c"), Some("4"));
    }

    #[test]
    fn test_missing_parameter_surfaces() {
        let err = ParamSet::from_pairs([("total_voters", "25")])
            .to_config()
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::Engine(LiquidError::MissingParameter { .. })
        ));
    }
}
