//! Preset parameter sets.

use crate::params::ParamSet;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// 25 voters, Erdos–Renyi, most-competent delegation, no limits
    Baseline,

    /// Votes may travel a single hop
    SingleHop,

    /// No root may carry more than three votes
    CappedWeight,

    /// Preferential-attachment network
    ScaleFree,

    /// Delegates picked uniformly among eligible neighbors
    RandomRule,

    /// Large competence margin and imperfect awareness of neighbors
    Skeptical,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Baseline,
            ScenarioId::SingleHop,
            ScenarioId::CappedWeight,
            ScenarioId::ScaleFree,
            ScenarioId::RandomRule,
            ScenarioId::Skeptical,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "baseline",
            ScenarioId::SingleHop => "single_hop",
            ScenarioId::CappedWeight => "capped_weight",
            ScenarioId::ScaleFree => "scale_free",
            ScenarioId::RandomRule => "random_rule",
            ScenarioId::Skeptical => "skeptical",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "25 voters, p=0.3, threshold 0.1, unbounded weight and degree",
            ScenarioId::SingleHop => "baseline with delegation_degree=1",
            ScenarioId::CappedWeight => "baseline with weight_limit=3",
            ScenarioId::ScaleFree => "baseline on a preferential-attachment network",
            ScenarioId::RandomRule => "baseline with uniformly random delegate choice",
            ScenarioId::Skeptical => "threshold 0.3, each eligible neighbor noticed with p=0.5",
        }
    }

    /// Raw parameters for this scenario.
    pub fn params(&self) -> ParamSet {
        let mut params = ParamSet::from_pairs([
            ("total_voters", "25"),
            ("competence_mean", "0.5"),
            ("competence_sd", "0.2"),
            ("connect_probability", "0.3"),
            ("threshold_diff", "0.1"),
            ("graph_type", "1"),
            ("delegation_rule", "1"),
        ]);

        match self {
            ScenarioId::Baseline => {}
            ScenarioId::SingleHop => params.set("delegation_degree", "1"),
            ScenarioId::CappedWeight => params.set("weight_limit", "3"),
            ScenarioId::ScaleFree => params.set("graph_type", "2"),
            ScenarioId::RandomRule => params.set("delegation_rule", "2"),
            ScenarioId::Skeptical => {
                params.set("threshold_diff", "0.3");
                params.set("delegate_probability", "0.5");
            }
        }

        params
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" => Ok(ScenarioId::Baseline),
            "single_hop" | "singlehop" => Ok(ScenarioId::SingleHop),
            "capped_weight" | "cappedweight" => Ok(ScenarioId::CappedWeight),
            "scale_free" | "scalefree" => Ok(ScenarioId::ScaleFree),
            "random_rule" | "randomrule" => Ok(ScenarioId::RandomRule),
            "skeptical" => Ok(ScenarioId::Skeptical),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquid_core::{DelegationRule, GraphType, Limit};

    #[test]
    fn test_every_scenario_builds_a_config() {
        for scenario in ScenarioId::all() {
            let config = scenario.params().to_config().unwrap();
            assert_eq!(config.total_voters, 25, "{}", scenario);
        }
    }

    #[test]
    fn test_scenario_overrides() {
        let single = ScenarioId::SingleHop.params().to_config().unwrap();
        assert_eq!(single.delegation_degree, Limit::Bounded(1));

        let capped = ScenarioId::CappedWeight.params().to_config().unwrap();
        assert_eq!(capped.weight_limit, Limit::Bounded(3));

        let scale_free = ScenarioId::ScaleFree.params().to_config().unwrap();
        assert_eq!(scale_free.graph_type, GraphType::PreferentialAttachment);

        let random = ScenarioId::RandomRule.params().to_config().unwrap();
        assert_eq!(random.delegation_rule, DelegationRule::Random);
    }

    #[test]
    fn test_parse_roundtrip() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
        }
        assert!("nonsense".parse::<ScenarioId>().is_err());
    }
}
