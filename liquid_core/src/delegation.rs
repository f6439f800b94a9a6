//! Delegate selection and weight propagation.
//!
//! A resolver pass visits voters in id order. Each voter collects the
//! neighbors it may delegate to, lets the configured [`DelegationStrategy`]
//! pick one, and pushes its accumulated weight up the chosen delegate's
//! chain so that every hop, and finally the chain root, carries it.
//!
//! Chains are walked iteratively over voter indices with a visited set, so
//! a cycle surfaces as an error instead of unbounded recursion.

use crate::error::{LiquidError, Result};
use crate::model::{DelegationRule, ModelConfig};
use crate::voter::{Voter, VoterId, VoterStatus};
use rand::{Rng, RngCore};
use std::collections::BTreeSet;

/// (voter, delegate) pairs a voter may no longer choose.
pub type ForbiddenDelegations = BTreeSet<(VoterId, VoterId)>;

/// Follows delegate pointers from `start` to the chain root.
///
/// Returns the chain `[start, .., root]`, or `Err(voter)` naming a voter on
/// the cycle. An acyclic chain visits each voter at most once, so a walk
/// longer than the population has looped.
pub fn chain_from(voters: &[Voter], start: VoterId) -> std::result::Result<Vec<VoterId>, VoterId> {
    let mut chain = vec![start];
    let mut current = start;

    while let Some(next) = voters[current].delegate {
        if chain.len() >= voters.len() {
            return Err(next);
        }
        chain.push(next);
        current = next;
    }

    Ok(chain)
}

/// Root reached from `start`, or `None` if the walk passes `avoid` or loops.
fn root_avoiding(voters: &[Voter], start: VoterId, avoid: VoterId) -> Option<VoterId> {
    let mut current = start;
    for _ in 0..voters.len() {
        if current == avoid {
            return None;
        }
        match voters[current].delegate {
            Some(next) => current = next,
            None => return Some(current),
        }
    }
    None
}

/// Current root of the chain containing `start`.
pub fn find_root(voters: &[Voter], start: VoterId) -> Result<VoterId> {
    chain_from(voters, start)
        .map(|chain| chain[chain.len() - 1])
        .map_err(|voter| LiquidError::DelegationCycle { voter })
}

/// Picks one delegate from a non-empty eligible set.
pub trait DelegationStrategy {
    fn name(&self) -> &'static str;

    /// Returns `None` only when `eligible` is empty.
    fn choose(&self, voters: &[Voter], eligible: &[VoterId], rng: &mut dyn RngCore) -> Option<VoterId>;
}

/// Highest competence; the first of equals wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostCompetent;

impl DelegationStrategy for MostCompetent {
    fn name(&self) -> &'static str {
        "most_competent"
    }

    fn choose(&self, voters: &[Voter], eligible: &[VoterId], _rng: &mut dyn RngCore) -> Option<VoterId> {
        let mut best: Option<VoterId> = None;
        for &candidate in eligible {
            match best {
                Some(b) if voters[candidate].competence <= voters[b].competence => {}
                _ => best = Some(candidate),
            }
        }
        best
    }
}

/// Uniform over the eligible set.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomChoice;

impl DelegationStrategy for RandomChoice {
    fn name(&self) -> &'static str {
        "random"
    }

    fn choose(&self, _voters: &[Voter], eligible: &[VoterId], rng: &mut dyn RngCore) -> Option<VoterId> {
        if eligible.is_empty() {
            return None;
        }
        Some(eligible[rng.gen_range(0..eligible.len())])
    }
}

/// Strategy table: one rule implementation per [`DelegationRule`].
pub fn strategy_for(rule: DelegationRule) -> Box<dyn DelegationStrategy> {
    match rule {
        DelegationRule::MostCompetent => Box::new(MostCompetent),
        DelegationRule::Random => Box::new(RandomChoice),
    }
}

/// Outcome counts of one resolver pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionPass {
    pub delegated: usize,
    pub roots: usize,
}

/// Assigns a delegate, or root status, to every voter.
pub struct DelegationResolver {
    strategy: Box<dyn DelegationStrategy>,
    threshold_diff: f64,
    delegate_probability: f64,
}

impl DelegationResolver {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            strategy: strategy_for(config.delegation_rule),
            threshold_diff: config.threshold_diff,
            delegate_probability: config.delegate_probability,
        }
    }

    /// Replaces the selection strategy.
    pub fn with_strategy(mut self, strategy: Box<dyn DelegationStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Neighbors `voter` may currently delegate to, in neighbor order.
    ///
    /// A neighbor qualifies when it is more competent than `voter` by more
    /// than `threshold_diff`, its chain root can absorb `voter`'s weight
    /// within that root's weight limit, the pair is not forbidden, and
    /// accepting would not close a cycle.
    pub fn eligible_delegates(
        &self,
        voters: &[Voter],
        voter: VoterId,
        forbidden: &ForbiddenDelegations,
        rng: &mut dyn RngCore,
    ) -> Vec<VoterId> {
        let me = &voters[voter];
        let mut eligible = Vec::new();

        for &neighbor in &me.neighbors {
            if forbidden.contains(&(voter, neighbor)) {
                continue;
            }
            if voters[neighbor].competence <= me.competence + self.threshold_diff {
                continue;
            }

            let root = match root_avoiding(voters, neighbor, voter) {
                Some(root) => &voters[root],
                None => continue,
            };
            if !root.weight_limit.allows(root.current_weight + me.current_weight) {
                continue;
            }

            if self.delegate_probability < 1.0 {
                let draw: f64 = rng.gen();
                if draw >= self.delegate_probability {
                    continue;
                }
            }

            eligible.push(neighbor);
        }

        eligible
    }

    /// Resolves a single voter and propagates its weight.
    pub fn assign(
        &self,
        voters: &mut [Voter],
        voter: VoterId,
        forbidden: &ForbiddenDelegations,
        rng: &mut dyn RngCore,
    ) -> Result<Option<VoterId>> {
        let eligible = self.eligible_delegates(voters, voter, forbidden, rng);
        let chosen = self.strategy.choose(voters, &eligible, rng);
        voters[voter].eligible_delegates = eligible;

        match chosen {
            Some(delegate) => {
                let weight = voters[voter].current_weight;
                add_weight_to_chain(voters, delegate, weight)?;
                voters[voter].delegate = Some(delegate);
                voters[voter].status = VoterStatus::Delegated;
            }
            None => {
                voters[voter].delegate = None;
                voters[voter].status = VoterStatus::Root;
            }
        }

        Ok(chosen)
    }

    /// Full pass: resets every voter, then resolves them in id order.
    pub fn resolve_all(
        &self,
        voters: &mut [Voter],
        forbidden: &ForbiddenDelegations,
        rng: &mut dyn RngCore,
    ) -> Result<ResolutionPass> {
        for voter in voters.iter_mut() {
            voter.reset_delegation();
        }

        let mut pass = ResolutionPass::default();
        for id in 0..voters.len() {
            match self.assign(voters, id, forbidden, rng)? {
                Some(_) => pass.delegated += 1,
                None => pass.roots += 1,
            }
        }

        Ok(pass)
    }
}

/// Adds `weight` to `start` and every voter above it up to the root.
fn add_weight_to_chain(voters: &mut [Voter], start: VoterId, weight: usize) -> Result<()> {
    let chain = chain_from(voters, start).map_err(|voter| LiquidError::DelegationCycle { voter })?;
    for id in chain {
        voters[id].current_weight += weight;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Limit;
    use crate::voter::Candidate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Builds voters with the given competences and undirected edges.
    fn population(config: &ModelConfig, competences: &[f64], edges: &[(usize, usize)]) -> Vec<Voter> {
        let mut voters: Vec<Voter> = competences
            .iter()
            .enumerate()
            .map(|(id, &c)| Voter::new(id, c, Candidate::Correct, config))
            .collect();
        for &(a, b) in edges {
            voters[a].neighbors.push(b);
            voters[b].neighbors.push(a);
        }
        for voter in voters.iter_mut() {
            voter.neighbors.sort_unstable();
        }
        voters
    }

    fn config() -> ModelConfig {
        ModelConfig::erdos_renyi(4, 0.5, 0.2, 0.3, 0.1)
    }

    #[test]
    fn test_most_competent_neighbor_chosen() {
        let config = config();
        let mut voters = population(&config, &[0.2, 0.5, 0.9, 0.7], &[(0, 1), (0, 2), (0, 3)]);
        let resolver = DelegationResolver::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let chosen = resolver
            .assign(&mut voters, 0, &ForbiddenDelegations::new(), &mut rng)
            .unwrap();

        assert_eq!(chosen, Some(2));
        assert_eq!(voters[0].eligible_delegates, vec![1, 2, 3]);
        assert_eq!(voters[2].current_weight, 2);
        assert_eq!(voters[0].status, VoterStatus::Delegated);
    }

    #[test]
    fn test_most_competent_tie_keeps_first() {
        let config = config();
        let voters = population(&config, &[0.1, 0.8, 0.8], &[]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(MostCompetent.choose(&voters, &[2, 1], &mut rng), Some(2));
        assert_eq!(MostCompetent.choose(&voters, &[], &mut rng), None);
    }

    #[test]
    fn test_threshold_is_strict() {
        let config = config();
        // A margin of exactly threshold_diff does not qualify
        let mut voters = population(&config, &[0.5, 0.6, 0.61], &[(0, 1), (0, 2)]);
        voters[1].competence = voters[0].competence + 0.1;
        let resolver = DelegationResolver::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let eligible = resolver.eligible_delegates(&voters, 0, &ForbiddenDelegations::new(), &mut rng);
        assert_eq!(eligible, vec![2]);
    }

    #[test]
    fn test_no_eligible_neighbor_makes_root() {
        let config = config();
        let mut voters = population(&config, &[0.9, 0.3], &[(0, 1)]);
        let resolver = DelegationResolver::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let pass = resolver
            .resolve_all(&mut voters, &ForbiddenDelegations::new(), &mut rng)
            .unwrap();

        assert!(voters[0].is_root());
        assert_eq!(voters[0].status, VoterStatus::Root);
        assert_eq!(voters[1].delegate, Some(0));
        assert_eq!(pass, ResolutionPass { delegated: 1, roots: 1 });
    }

    #[test]
    fn test_weight_accumulates_at_chain_root() {
        let config = config();
        // 2 -> 1 first gives 1 weight 2; then 1 -> 0 carries that weight to 0.
        // Voter 3 then delegates to 2, adding to 2, 1 and 0.
        let mut voters = population(&config, &[0.9, 0.6, 0.4, 0.1], &[(0, 1), (1, 2), (2, 3)]);
        let resolver = DelegationResolver::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let forbidden = ForbiddenDelegations::new();

        resolver.assign(&mut voters, 2, &forbidden, &mut rng).unwrap();
        resolver.assign(&mut voters, 1, &forbidden, &mut rng).unwrap();
        assert_eq!(voters[0].current_weight, 3);

        resolver.assign(&mut voters, 3, &forbidden, &mut rng).unwrap();
        assert_eq!(voters[2].current_weight, 2);
        assert_eq!(voters[1].current_weight, 3);
        assert_eq!(voters[0].current_weight, 4);
        assert_eq!(find_root(&voters, 3).unwrap(), 0);
    }

    #[test]
    fn test_weight_limit_checked_at_root() {
        let config = config().with_weight_limit(Limit::Bounded(2));
        // 1 -> 0 fills root 0 to its limit; 2 may not join via 1.
        let mut voters = population(&config, &[0.9, 0.5, 0.1], &[(0, 1), (1, 2)]);
        let resolver = DelegationResolver::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        resolver
            .resolve_all(&mut voters, &ForbiddenDelegations::new(), &mut rng)
            .unwrap();

        assert_eq!(voters[1].delegate, Some(0));
        assert!(voters[2].is_root());
        assert_eq!(voters[0].current_weight, 2);
    }

    #[test]
    fn test_forbidden_pair_skipped() {
        let config = config();
        let mut voters = population(&config, &[0.1, 0.5, 0.9], &[(0, 1), (0, 2)]);
        let resolver = DelegationResolver::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let forbidden = ForbiddenDelegations::from([(0, 2)]);

        resolver.resolve_all(&mut voters, &forbidden, &mut rng).unwrap();

        assert_eq!(voters[0].delegate, Some(1));
    }

    #[test]
    fn test_random_rule_stays_in_eligible_set() {
        let config = config().with_delegation_rule(DelegationRule::Random);
        let resolver = DelegationResolver::new(&config);
        assert_eq!(resolver.strategy_name(), "random");

        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut seen = BTreeSet::new();
        for _ in 0..200 {
            let mut voters = population(&config, &[0.1, 0.5, 0.7, 0.9], &[(0, 1), (0, 2), (0, 3)]);
            resolver
                .assign(&mut voters, 0, &ForbiddenDelegations::new(), &mut rng)
                .unwrap();
            seen.insert(voters[0].delegate.unwrap());
        }
        assert_eq!(seen, BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn test_zero_delegate_probability_blocks_everyone() {
        let mut config = config();
        config.delegate_probability = 0.0;
        let mut voters = population(&config, &[0.1, 0.9], &[(0, 1)]);
        let resolver = DelegationResolver::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        resolver
            .resolve_all(&mut voters, &ForbiddenDelegations::new(), &mut rng)
            .unwrap();
        assert!(voters.iter().all(Voter::is_root));
    }

    #[test]
    fn test_chain_walk_detects_cycle() {
        let config = config();
        let mut voters = population(&config, &[0.1, 0.2, 0.3], &[]);
        voters[0].delegate = Some(1);
        voters[1].delegate = Some(2);
        voters[2].delegate = Some(0);

        assert_eq!(chain_from(&voters, 0), Err(0));
        assert_eq!(
            find_root(&voters, 1).unwrap_err(),
            LiquidError::DelegationCycle { voter: 1 }
        );
    }

    #[test]
    fn test_root_walk_rejects_loops_and_self() {
        let config = config();
        let mut voters = population(&config, &[0.1, 0.2, 0.3, 0.4], &[]);
        voters[1].delegate = Some(2);
        voters[2].delegate = Some(3);

        assert_eq!(root_avoiding(&voters, 1, 0), Some(3));
        assert_eq!(root_avoiding(&voters, 1, 2), None);
        assert_eq!(root_avoiding(&voters, 3, 0), Some(3));

        voters[3].delegate = Some(1);
        assert_eq!(root_avoiding(&voters, 1, 0), None);
    }

    #[test]
    fn test_long_chain_resolves_without_cycle() {
        let config = ModelConfig::erdos_renyi(300, 0.5, 0.2, 0.3, 0.0);
        let n = config.total_voters;
        let competences: Vec<f64> = (0..n).map(|i| i as f64 / n as f64).collect();
        let edges: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
        let mut voters = population(&config, &competences, &edges);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let pass = DelegationResolver::new(&config)
            .resolve_all(&mut voters, &ForbiddenDelegations::new(), &mut rng)
            .unwrap();

        assert_eq!(pass.roots, 1);
        assert_eq!(chain_from(&voters, 0).unwrap().len(), n);
        assert_eq!(find_root(&voters, 0).unwrap(), n - 1);
        assert_eq!(voters[n - 1].current_weight, n);
    }

    #[test]
    fn test_resolve_all_resets_previous_state() {
        let config = config();
        let mut voters = population(&config, &[0.1, 0.9], &[(0, 1)]);
        let resolver = DelegationResolver::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for _ in 0..3 {
            resolver
                .resolve_all(&mut voters, &ForbiddenDelegations::new(), &mut rng)
                .unwrap();
        }

        assert_eq!(voters[1].current_weight, 2);
        assert_eq!(voters[0].current_weight, 1);
    }
}
