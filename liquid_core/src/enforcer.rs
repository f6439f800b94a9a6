//! Delegation-degree enforcement and path reconstruction.
//!
//! After a resolver pass the delegate pointers are inverted into a
//! follower graph and walked breadth-first from every root. Each walk
//! yields a [`DelegationPath`]: the root plus every voter whose vote
//! resolves to it, tagged with its hop distance. The first voter found
//! further from its root than its `delegation_degree` allows loses its
//! delegate, the (voter, delegate) pair is forbidden, and the whole
//! population is resolved again. The loop stops when a walk finds no
//! violation, or fails once `max_rounds` re-resolutions have been spent.

use crate::delegation::{DelegationResolver, ForbiddenDelegations};
use crate::error::{LiquidError, Result};
use crate::model::ModelConfig;
use crate::voter::{Voter, VoterId, VoterStatus};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// A root and every voter whose vote resolves to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationPath {
    pub root: VoterId,

    /// `(voter, hops from root)` in breadth-first order, root first at 0
    pub members: Vec<(VoterId, usize)>,
}

impl DelegationPath {
    /// Number of voters, root included.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Largest hop distance in this path.
    pub fn depth(&self) -> usize {
        self.members.iter().map(|&(_, d)| d).max().unwrap_or(0)
    }
}

/// Partition of the population into root-anchored paths.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DelegationForest {
    pub paths: Vec<DelegationPath>,
}

impl DelegationForest {
    /// Rebuilds paths from the current delegate pointers.
    ///
    /// Roots are visited in id order and followers in id order, so the
    /// result is a deterministic function of `voters`.
    ///
    /// # Errors
    /// `DelegationCycle` if some voter is reachable from no root.
    pub fn from_voters(voters: &[Voter]) -> Result<Self> {
        let followers = follower_lists(voters);
        let mut seen = vec![false; voters.len()];
        let mut paths = Vec::new();

        for root in voters.iter().filter(|v| v.is_root()).map(|v| v.id) {
            let mut members = Vec::new();
            let mut queue = VecDeque::from([(root, 0usize)]);
            seen[root] = true;

            while let Some((voter, distance)) = queue.pop_front() {
                members.push((voter, distance));
                for &follower in &followers[voter] {
                    if !seen[follower] {
                        seen[follower] = true;
                        queue.push_back((follower, distance + 1));
                    }
                }
            }

            paths.push(DelegationPath { root, members });
        }

        if let Some(stranded) = seen.iter().position(|&s| !s) {
            return Err(LiquidError::DelegationCycle { voter: stranded });
        }

        Ok(Self { paths })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Total voters across all paths.
    pub fn total_members(&self) -> usize {
        self.paths.iter().map(DelegationPath::len).sum()
    }

    /// Largest hop distance anywhere in the forest.
    pub fn max_distance(&self) -> usize {
        self.paths.iter().map(DelegationPath::depth).max().unwrap_or(0)
    }

    /// Every `(voter, distance)` pair in root-then-breadth order.
    pub fn members(&self) -> impl Iterator<Item = (VoterId, usize)> + '_ {
        self.paths.iter().flat_map(|p| p.members.iter().copied())
    }

    /// First voter whose distance exceeds its own degree limit.
    pub fn first_violation(&self, voters: &[Voter]) -> Option<(VoterId, usize)> {
        self.members()
            .find(|&(voter, distance)| voters[voter].delegation_degree.exceeded_by(distance))
    }
}

/// Delegate → followers, each list ascending.
fn follower_lists(voters: &[Voter]) -> Vec<Vec<VoterId>> {
    let mut followers = vec![Vec::new(); voters.len()];
    for voter in voters {
        if let Some(delegate) = voter.delegate {
            followers[delegate].push(voter.id);
        }
    }
    followers
}

/// Result of driving resolution to its fixpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stabilized {
    pub forest: DelegationForest,

    /// Resolver passes run, the first included
    pub rounds: usize,

    /// Voters invalidated along the way, in order
    pub invalidated: Vec<VoterId>,
}

/// Keeps every vote within its delegation-degree limit.
#[derive(Debug, Clone, Copy)]
pub struct DegreeConstraintEnforcer {
    max_rounds: usize,
}

impl DegreeConstraintEnforcer {
    pub fn new(max_rounds: usize) -> Self {
        Self { max_rounds }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.max_resolution_rounds)
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Resolves, checks degrees, and re-resolves until no voter violates.
    ///
    /// # Errors
    /// `ResolutionDiverged` once more than `max_rounds` re-resolutions
    /// would be needed; errors from the resolver are passed through.
    pub fn stabilize(
        &self,
        voters: &mut [Voter],
        resolver: &DelegationResolver,
        rng: &mut dyn RngCore,
    ) -> Result<Stabilized> {
        let mut forbidden = ForbiddenDelegations::new();
        let mut invalidated = Vec::new();

        resolver.resolve_all(voters, &forbidden, rng)?;
        let mut rounds = 1;

        loop {
            let forest = DelegationForest::from_voters(voters)?;

            let (voter, distance) = match forest.first_violation(voters) {
                None => {
                    debug!(rounds, paths = forest.len(), "delegation stabilized");
                    return Ok(Stabilized {
                        forest,
                        rounds,
                        invalidated,
                    });
                }
                Some(found) => found,
            };

            if rounds > self.max_rounds {
                warn!(rounds, voter, distance, "degree enforcement did not converge");
                return Err(LiquidError::ResolutionDiverged { iterations: rounds - 1 });
            }

            if let Some(delegate) = voters[voter].delegate.take() {
                forbidden.insert((voter, delegate));
            }
            voters[voter].status = VoterStatus::Invalidated;
            invalidated.push(voter);
            debug!(
                voter,
                distance,
                limit = %voters[voter].delegation_degree,
                "delegation degree exceeded"
            );

            resolver.resolve_all(voters, &forbidden, rng)?;
            rounds += 1;
        }
    }
}
