//! Simulation parameters.
//!
//! A `ModelConfig` is built once per population from a flat key/value map
//! and is read-only afterwards. Values arrive as strings; a missing key and
//! the literal `None` are both treated as "not supplied".

use crate::error::{LiquidError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default bound on degree-enforcement rounds.
pub const DEFAULT_MAX_RESOLUTION_ROUNDS: usize = 10_000;

/// An upper bound that may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Limit {
    Bounded(usize),
    Unbounded,
}

impl Limit {
    /// Returns true if `value` does not exceed the limit.
    pub fn allows(&self, value: usize) -> bool {
        match self {
            Limit::Bounded(max) => value <= *max,
            Limit::Unbounded => true,
        }
    }

    /// Returns true if `value` is strictly above the limit.
    pub fn exceeded_by(&self, value: usize) -> bool {
        !self.allows(value)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Bounded(max) => write!(f, "{}", max),
            Limit::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Social-network generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphType {
    /// Every pair connected independently with `connect_probability`
    ErdosRenyi,

    /// Barabási–Albert style growth, new voters favour well-connected ones
    PreferentialAttachment,
}

impl GraphType {
    /// Numeric code used by parameter files.
    pub fn code(&self) -> u8 {
        match self {
            GraphType::ErdosRenyi => 1,
            GraphType::PreferentialAttachment => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GraphType::ErdosRenyi => "erdos_renyi",
            GraphType::PreferentialAttachment => "preferential_attachment",
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for GraphType {
    type Err = LiquidError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "erdos_renyi" | "erdosrenyi" => Ok(GraphType::ErdosRenyi),
            "2" | "preferential_attachment" | "preferentialattachment" => {
                Ok(GraphType::PreferentialAttachment)
            }
            _ => Err(LiquidError::UnsupportedGraphType(s.to_string())),
        }
    }
}

/// How a voter picks among its eligible delegates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DelegationRule {
    /// Highest competence, first occurrence wins ties
    MostCompetent,

    /// Uniform choice
    Random,
}

impl DelegationRule {
    pub fn code(&self) -> u8 {
        match self {
            DelegationRule::MostCompetent => 1,
            DelegationRule::Random => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DelegationRule::MostCompetent => "most_competent",
            DelegationRule::Random => "random",
        }
    }
}

impl fmt::Display for DelegationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DelegationRule {
    type Err = LiquidError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "most_competent" | "mostcompetent" => Ok(DelegationRule::MostCompetent),
            "2" | "random" => Ok(DelegationRule::Random),
            _ => Err(LiquidError::UnsupportedDelegationRule(s.to_string())),
        }
    }
}

/// Parameters for one simulated population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of voters
    pub total_voters: usize,

    /// Mean of the competence distribution
    pub competence_mean: f64,

    /// Standard deviation of the competence distribution
    pub competence_sd: f64,

    /// Edge probability (Erdos–Renyi only)
    pub connect_probability: f64,

    /// Chance that an otherwise eligible neighbor is considered at all
    pub delegate_probability: f64,

    /// Competence margin a delegate must exceed
    pub threshold_diff: f64,

    /// Maximum weight a chain root may accumulate
    pub weight_limit: Limit,

    /// Maximum hops a vote may travel
    pub delegation_degree: Limit,

    pub graph_type: GraphType,

    pub delegation_rule: DelegationRule,

    /// Seed size `m` for preferential attachment
    pub attachment_size: usize,

    /// Retry bound for degree enforcement
    pub max_resolution_rounds: usize,
}

impl ModelConfig {
    /// Builds a config from a flat key/value map.
    ///
    /// # Errors
    /// Returns a configuration error for any missing required key, any value
    /// that fails to parse or is out of range, and unknown enum codes.
    pub fn from_params(params: &BTreeMap<String, String>) -> Result<Self> {
        let reader = ParamReader { params };

        let graph_type = match reader.get("graph_type") {
            Some(raw) => raw.parse()?,
            None => GraphType::ErdosRenyi,
        };
        let delegation_rule = match reader.get("delegation_rule") {
            Some(raw) => raw.parse()?,
            None => DelegationRule::MostCompetent,
        };

        let total_voters: usize = reader.require_parsed("total_voters")?;
        if total_voters == 0 {
            return Err(LiquidError::invalid("total_voters", 0, "must be positive"));
        }

        let competence_mean: f64 = reader.require_parsed("competence_mean")?;
        if !competence_mean.is_finite() {
            return Err(LiquidError::invalid(
                "competence_mean",
                competence_mean,
                "must be finite",
            ));
        }

        let competence_sd: f64 = reader.require_parsed("competence_sd")?;
        if !competence_sd.is_finite() || competence_sd < 0.0 {
            return Err(LiquidError::invalid(
                "competence_sd",
                competence_sd,
                "must be finite and non-negative",
            ));
        }

        let connect_probability = match graph_type {
            GraphType::ErdosRenyi => reader.require_parsed("connect_probability")?,
            GraphType::PreferentialAttachment => {
                reader.optional_parsed("connect_probability")?.unwrap_or(0.0)
            }
        };
        check_probability("connect_probability", connect_probability)?;

        let delegate_probability = reader
            .optional_parsed("delegate_probability")?
            .unwrap_or(1.0);
        check_probability("delegate_probability", delegate_probability)?;

        let threshold_diff: f64 = reader.require_parsed("threshold_diff")?;
        if !threshold_diff.is_finite() || threshold_diff < 0.0 {
            return Err(LiquidError::invalid(
                "threshold_diff",
                threshold_diff,
                "must be finite and non-negative",
            ));
        }

        let weight_limit = reader.limit("weight_limit")?;
        let delegation_degree = reader.limit("delegation_degree")?;

        let attachment_size = match reader.optional_parsed::<usize>("attachment_size")? {
            Some(0) => {
                return Err(LiquidError::invalid("attachment_size", 0, "must be positive"))
            }
            Some(m) => m,
            None => default_attachment_size(total_voters),
        };

        let max_resolution_rounds = reader
            .optional_parsed("max_resolution_rounds")?
            .unwrap_or(DEFAULT_MAX_RESOLUTION_ROUNDS);

        Ok(Self {
            total_voters,
            competence_mean,
            competence_sd,
            connect_probability,
            delegate_probability,
            threshold_diff,
            weight_limit,
            delegation_degree,
            graph_type,
            delegation_rule,
            attachment_size,
            max_resolution_rounds,
        })
    }

    /// Convenience constructor with every optional field at its default.
    pub fn erdos_renyi(
        total_voters: usize,
        competence_mean: f64,
        competence_sd: f64,
        connect_probability: f64,
        threshold_diff: f64,
    ) -> Self {
        Self {
            total_voters,
            competence_mean,
            competence_sd,
            connect_probability,
            delegate_probability: 1.0,
            threshold_diff,
            weight_limit: Limit::Unbounded,
            delegation_degree: Limit::Unbounded,
            graph_type: GraphType::ErdosRenyi,
            delegation_rule: DelegationRule::MostCompetent,
            attachment_size: default_attachment_size(total_voters),
            max_resolution_rounds: DEFAULT_MAX_RESOLUTION_ROUNDS,
        }
    }

    pub fn with_graph_type(mut self, graph_type: GraphType) -> Self {
        self.graph_type = graph_type;
        self
    }

    pub fn with_delegation_rule(mut self, rule: DelegationRule) -> Self {
        self.delegation_rule = rule;
        self
    }

    pub fn with_weight_limit(mut self, limit: Limit) -> Self {
        self.weight_limit = limit;
        self
    }

    pub fn with_delegation_degree(mut self, limit: Limit) -> Self {
        self.delegation_degree = limit;
        self
    }

    pub fn with_max_resolution_rounds(mut self, rounds: usize) -> Self {
        self.max_resolution_rounds = rounds;
        self
    }
}

/// `m = total_voters / 5`, at least 1.
pub fn default_attachment_size(total_voters: usize) -> usize {
    (total_voters / 5).max(1)
}

fn check_probability(name: &str, p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(LiquidError::invalid(name, p, "must lie in [0, 1]"));
    }
    Ok(())
}

struct ParamReader<'a> {
    params: &'a BTreeMap<String, String>,
}

impl<'a> ParamReader<'a> {
    fn get(&self, name: &str) -> Option<&'a str> {
        self.params
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty() && *v != "None")
    }

    fn optional_parsed<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(name) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e: T::Err| LiquidError::invalid(name, raw, e.to_string())),
            None => Ok(None),
        }
    }

    fn require_parsed<T>(&self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional_parsed(name)?
            .ok_or_else(|| LiquidError::missing(name))
    }

    fn limit(&self, name: &str) -> Result<Limit> {
        match self.get(name) {
            None => Ok(Limit::Unbounded),
            Some(raw) if raw.eq_ignore_ascii_case("unbounded") || raw.eq_ignore_ascii_case("inf") => {
                Ok(Limit::Unbounded)
            }
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) => Err(LiquidError::invalid(name, raw, "must be positive")),
                Ok(n) => Ok(Limit::Bounded(n)),
                Err(e) => Err(LiquidError::invalid(name, raw, e.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn baseline() -> BTreeMap<String, String> {
        params(&[
            ("total_voters", "25"),
            ("competence_mean", "0.5"),
            ("competence_sd", "0.2"),
            ("connect_probability", "0.3"),
            ("threshold_diff", "0.1"),
        ])
    }

    #[test]
    fn test_defaults_applied() {
        let config = ModelConfig::from_params(&baseline()).unwrap();

        assert_eq!(config.total_voters, 25);
        assert_eq!(config.graph_type, GraphType::ErdosRenyi);
        assert_eq!(config.delegation_rule, DelegationRule::MostCompetent);
        assert_eq!(config.weight_limit, Limit::Unbounded);
        assert_eq!(config.delegation_degree, Limit::Unbounded);
        assert_eq!(config.delegate_probability, 1.0);
        assert_eq!(config.attachment_size, 5);
        assert_eq!(config.max_resolution_rounds, DEFAULT_MAX_RESOLUTION_ROUNDS);
        assert_eq!(config, ModelConfig::erdos_renyi(25, 0.5, 0.2, 0.3, 0.1));
    }

    #[test]
    fn test_missing_required_parameter() {
        let mut p = baseline();
        p.remove("competence_sd");

        let err = ModelConfig::from_params(&p).unwrap_err();
        assert_eq!(err, LiquidError::missing("competence_sd"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_none_literal_counts_as_absent() {
        let mut p = baseline();
        p.insert("weight_limit".into(), "None".into());
        p.insert("threshold_diff".into(), "None".into());

        let err = ModelConfig::from_params(&p).unwrap_err();
        assert_eq!(err, LiquidError::missing("threshold_diff"));

        p.insert("threshold_diff".into(), "0.1".into());
        let config = ModelConfig::from_params(&p).unwrap();
        assert_eq!(config.weight_limit, Limit::Unbounded);
    }

    #[test]
    fn test_enum_codes() {
        let mut p = baseline();
        p.insert("graph_type".into(), "2".into());
        p.insert("delegation_rule".into(), "2".into());
        let config = ModelConfig::from_params(&p).unwrap();
        assert_eq!(config.graph_type, GraphType::PreferentialAttachment);
        assert_eq!(config.delegation_rule, DelegationRule::Random);

        p.insert("graph_type".into(), "3".into());
        assert!(matches!(
            ModelConfig::from_params(&p),
            Err(LiquidError::UnsupportedGraphType(_))
        ));

        p.insert("graph_type".into(), "1".into());
        p.insert("delegation_rule".into(), "7".into());
        assert!(matches!(
            ModelConfig::from_params(&p),
            Err(LiquidError::UnsupportedDelegationRule(_))
        ));
    }

    #[test]
    fn test_connect_probability_optional_for_preferential_attachment() {
        let mut p = baseline();
        p.remove("connect_probability");
        assert_eq!(
            ModelConfig::from_params(&p).unwrap_err(),
            LiquidError::missing("connect_probability")
        );

        p.insert("graph_type".into(), "preferential_attachment".into());
        let config = ModelConfig::from_params(&p).unwrap();
        assert_eq!(config.connect_probability, 0.0);
    }

    #[test]
    fn test_limits_parse() {
        let mut p = baseline();
        p.insert("weight_limit".into(), "4".into());
        p.insert("delegation_degree".into(), "unbounded".into());
        let config = ModelConfig::from_params(&p).unwrap();
        assert_eq!(config.weight_limit, Limit::Bounded(4));
        assert_eq!(config.delegation_degree, Limit::Unbounded);

        p.insert("delegation_degree".into(), "0".into());
        assert!(matches!(
            ModelConfig::from_params(&p),
            Err(LiquidError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for (key, value) in [
            ("total_voters", "0"),
            ("total_voters", "-3"),
            ("competence_sd", "-0.1"),
            ("connect_probability", "1.5"),
            ("threshold_diff", "-1"),
            ("delegate_probability", "2"),
            ("attachment_size", "0"),
            ("competence_mean", "abc"),
        ] {
            let mut p = baseline();
            p.insert(key.into(), value.into());
            let err = ModelConfig::from_params(&p).unwrap_err();
            assert!(err.is_configuration(), "{}={} gave {:?}", key, value, err);
        }
    }

    #[test]
    fn test_limit_semantics() {
        assert!(Limit::Bounded(3).allows(3));
        assert!(Limit::Bounded(3).exceeded_by(4));
        assert!(Limit::Unbounded.allows(usize::MAX));
        assert_eq!(Limit::Bounded(2).to_string(), "2");
        assert_eq!(Limit::Unbounded.to_string(), "unbounded");
    }

    #[test]
    fn test_default_attachment_size() {
        assert_eq!(default_attachment_size(1), 1);
        assert_eq!(default_attachment_size(9), 1);
        assert_eq!(default_attachment_size(25), 5);
    }
}
