//! Per-voter state and sampling.

use crate::model::{Limit, ModelConfig};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable voter index, `0..total_voters`.
pub type VoterId = usize;

/// One of the two candidates on the ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Candidate {
    /// Candidate 0
    Incorrect,

    /// Candidate 1, the objectively correct choice
    Correct,
}

impl Candidate {
    pub const ALL: [Candidate; 2] = [Candidate::Incorrect, Candidate::Correct];

    /// Ballot index (0 or 1).
    pub fn index(&self) -> usize {
        match self {
            Candidate::Incorrect => 0,
            Candidate::Correct => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Candidate::Incorrect),
            1 => Some(Candidate::Correct),
            _ => None,
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Where a voter sits in the resolution procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoterStatus {
    /// Not yet visited by a resolver pass
    Unassigned,

    /// Holds a delegate
    Delegated,

    /// Votes with its own preference
    Root,

    /// Delegation dropped for exceeding the degree limit; the next resolver
    /// pass moves it back to `Delegated` or `Root`
    Invalidated,
}

/// A voter in the simulated population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voter {
    pub id: VoterId,

    /// Probability of voting for the correct candidate, in [0, 1]
    pub competence: f64,

    pub preferred_vote: Candidate,

    /// Social-network neighbors, ascending
    pub neighbors: Vec<VoterId>,

    /// Voter this one has handed its vote to
    pub delegate: Option<VoterId>,

    /// Weight held by this voter, itself included
    pub current_weight: usize,

    /// Working set for the current resolver pass
    pub eligible_delegates: Vec<VoterId>,

    pub weight_limit: Limit,

    pub delegation_degree: Limit,

    pub status: VoterStatus,
}

impl Voter {
    /// Creates a voter with fixed competence and preference.
    ///
    /// Competence is clamped into [0, 1].
    pub fn new(id: VoterId, competence: f64, preferred_vote: Candidate, config: &ModelConfig) -> Self {
        Self {
            id,
            competence: competence.clamp(0.0, 1.0),
            preferred_vote,
            neighbors: Vec::new(),
            delegate: None,
            current_weight: 1,
            eligible_delegates: Vec::new(),
            weight_limit: config.weight_limit,
            delegation_degree: config.delegation_degree,
            status: VoterStatus::Unassigned,
        }
    }

    /// Samples competence then preferred vote from `rng`.
    pub fn sample<R: Rng + ?Sized>(
        id: VoterId,
        config: &ModelConfig,
        competence_dist: &Normal<f64>,
        rng: &mut R,
    ) -> Self {
        let competence = sample_competence(competence_dist, rng);
        let vote = sample_vote(competence, rng);
        Self::new(id, competence, vote, config)
    }

    /// A voter without a delegate is a root.
    pub fn is_root(&self) -> bool {
        self.delegate.is_none()
    }

    /// Clears delegation state ahead of a resolver pass.
    pub fn reset_delegation(&mut self) {
        self.delegate = None;
        self.current_weight = 1;
        self.eligible_delegates.clear();
        self.status = VoterStatus::Unassigned;
    }
}

impl fmt::Display for Voter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.delegate {
            Some(d) => write!(
                f,
                "voter {} (competence {:.3}, vote {}) -> {}",
                self.id, self.competence, self.preferred_vote, d
            ),
            None => write!(
                f,
                "voter {} (competence {:.3}, vote {}) root",
                self.id, self.competence, self.preferred_vote
            ),
        }
    }
}

/// Draws a competence from `dist`, clamped to [0, 1].
pub fn sample_competence<R: Rng + ?Sized>(dist: &Normal<f64>, rng: &mut R) -> f64 {
    dist.sample(rng).clamp(0.0, 1.0)
}

/// Votes correctly with probability exactly `competence`.
pub fn sample_vote<R: Rng + ?Sized>(competence: f64, rng: &mut R) -> Candidate {
    let draw: f64 = rng.gen();
    if draw < competence {
        Candidate::Correct
    } else {
        Candidate::Incorrect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config() -> ModelConfig {
        ModelConfig::erdos_renyi(10, 0.5, 0.2, 0.3, 0.1)
    }

    #[test]
    fn test_new_voter_is_unassigned_root() {
        let voter = Voter::new(3, 0.7, Candidate::Correct, &config());

        assert!(voter.is_root());
        assert_eq!(voter.current_weight, 1);
        assert_eq!(voter.status, VoterStatus::Unassigned);
        assert_eq!(voter.weight_limit, Limit::Unbounded);
    }

    #[test]
    fn test_new_voter_clamps_competence() {
        assert_eq!(Voter::new(0, 1.7, Candidate::Correct, &config()).competence, 1.0);
        assert_eq!(Voter::new(0, -0.2, Candidate::Correct, &config()).competence, 0.0);
    }

    #[test]
    fn test_vote_extremes() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(sample_vote(1.0, &mut rng), Candidate::Correct);
            assert_eq!(sample_vote(0.0, &mut rng), Candidate::Incorrect);
        }
    }

    #[test]
    fn test_vote_frequency_tracks_competence() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let trials = 20_000;
        let correct = (0..trials)
            .filter(|_| sample_vote(0.3, &mut rng) == Candidate::Correct)
            .count();
        let share = correct as f64 / trials as f64;
        assert!((share - 0.3).abs() < 0.02, "share was {}", share);
    }

    #[test]
    fn test_reset_returns_invalidated_voter_to_unassigned() {
        let mut voter = Voter::new(0, 0.5, Candidate::Correct, &config());
        voter.delegate = Some(4);
        voter.current_weight = 3;
        voter.status = VoterStatus::Invalidated;

        voter.reset_delegation();

        assert!(voter.is_root());
        assert_eq!(voter.current_weight, 1);
        assert_eq!(voter.status, VoterStatus::Unassigned);
    }

    #[test]
    fn test_candidate_index_roundtrip() {
        for candidate in Candidate::ALL {
            assert_eq!(Candidate::from_index(candidate.index()), Some(candidate));
        }
        assert_eq!(Candidate::from_index(2), None);
    }

    proptest! {
        #[test]
        fn competence_stays_in_unit_interval(
            mean in -50.0f64..50.0,
            sd in 0.0f64..100.0,
            seed in any::<u64>(),
        ) {
            let dist = Normal::new(mean, sd).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for id in 0..32 {
                let voter = Voter::sample(id, &config(), &dist, &mut rng);
                prop_assert!((0.0..=1.0).contains(&voter.competence));
            }
        }
    }
}
