//! One election trial, end to end.

use crate::delegation::DelegationResolver;
use crate::enforcer::{DegreeConstraintEnforcer, DelegationForest};
use crate::error::Result;
use crate::graph::{GraphBuilder, SocialGraph};
use crate::model::ModelConfig;
use crate::tally::{PathStats, Tally, VoteTally};
use crate::voter::{Voter, VoterId};
use rand::Rng;
use tracing::debug;

/// Everything a finished trial exposes. Read-only by convention.
#[derive(Debug, Clone)]
pub struct ElectionOutcome {
    pub voters: Vec<Voter>,
    pub graph: SocialGraph,
    pub forest: DelegationForest,

    /// Liquid-democracy result
    pub weighted: Tally,

    /// Direct-democracy baseline
    pub direct: Tally,

    /// Resolver passes needed to satisfy degree limits
    pub resolution_rounds: usize,

    pub invalidated: Vec<VoterId>,
}

impl ElectionOutcome {
    pub fn path_stats(&self) -> PathStats {
        PathStats::from_forest(&self.forest)
    }

    /// Final delegate edges `(voter, delegate)`.
    pub fn delegate_edges(&self) -> Vec<(VoterId, VoterId)> {
        self.voters
            .iter()
            .filter_map(|v| v.delegate.map(|d| (v.id, d)))
            .collect()
    }

    /// Voters that kept their own vote.
    pub fn roots(&self) -> Vec<VoterId> {
        self.forest.paths.iter().map(|p| p.root).collect()
    }
}

/// Runs trials for a fixed configuration.
pub struct Election {
    config: ModelConfig,
    resolver: DelegationResolver,
    enforcer: DegreeConstraintEnforcer,
}

impl Election {
    pub fn new(config: ModelConfig) -> Self {
        let resolver = DelegationResolver::new(&config);
        let enforcer = DegreeConstraintEnforcer::from_config(&config);
        Self {
            config,
            resolver,
            enforcer,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Builds a population from `rng`, stabilizes delegation and tallies.
    pub fn run<R: Rng>(&self, rng: &mut R) -> Result<ElectionOutcome> {
        let population = GraphBuilder::new(&self.config).build(rng)?;
        let mut voters = population.voters;

        let stabilized = self.enforcer.stabilize(&mut voters, &self.resolver, rng)?;

        let tally = VoteTally::new(&voters, &stabilized.forest);
        let weighted = tally.weighted();
        let direct = tally.direct();
        debug!(
            weighted = ?weighted.to_map(),
            direct = ?direct.to_map(),
            rounds = stabilized.rounds,
            "election tallied"
        );

        Ok(ElectionOutcome {
            voters,
            graph: population.graph,
            forest: stabilized.forest,
            weighted,
            direct,
            resolution_rounds: stabilized.rounds,
            invalidated: stabilized.invalidated,
        })
    }
}
