//! Vote counting over a stabilized delegation forest.

use crate::enforcer::{DelegationForest, DelegationPath};
use crate::voter::{Candidate, Voter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-candidate totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tally {
    counts: [usize; 2],
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `weight` votes for `candidate`.
    pub fn add(&mut self, candidate: Candidate, weight: usize) {
        self.counts[candidate.index()] += weight;
    }

    pub fn count(&self, candidate: Candidate) -> usize {
        self.counts[candidate.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Share of votes on the correct candidate; 0 for an empty tally.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.count(Candidate::Correct) as f64 / total as f64
    }

    /// Majority winner, `None` on a tie.
    pub fn winner(&self) -> Option<Candidate> {
        let correct = self.count(Candidate::Correct);
        let incorrect = self.count(Candidate::Incorrect);
        match correct.cmp(&incorrect) {
            std::cmp::Ordering::Greater => Some(Candidate::Correct),
            std::cmp::Ordering::Less => Some(Candidate::Incorrect),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// `{0: n0, 1: n1}`.
    pub fn to_map(&self) -> BTreeMap<usize, usize> {
        Candidate::ALL
            .iter()
            .map(|c| (c.index(), self.count(*c)))
            .collect()
    }
}

/// Shape of the delegation forest.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PathStats {
    pub count: usize,
    pub mean_size: f64,
    /// Population standard deviation of path sizes
    pub sd_size: f64,
    pub max_size: usize,
    pub max_distance: usize,
}

impl PathStats {
    pub fn from_forest(forest: &DelegationForest) -> Self {
        let sizes: Vec<usize> = forest.paths.iter().map(DelegationPath::len).collect();
        let count = sizes.len();
        if count == 0 {
            return Self::default();
        }

        let mean_size = sizes.iter().sum::<usize>() as f64 / count as f64;
        let variance = sizes
            .iter()
            .map(|&s| (s as f64 - mean_size).powi(2))
            .sum::<f64>()
            / count as f64;

        Self {
            count,
            mean_size,
            sd_size: variance.sqrt(),
            max_size: sizes.iter().copied().max().unwrap_or(0),
            max_distance: forest.max_distance(),
        }
    }
}

/// Counts votes for one stabilized population.
pub struct VoteTally<'a> {
    voters: &'a [Voter],
    forest: &'a DelegationForest,
}

impl<'a> VoteTally<'a> {
    pub fn new(voters: &'a [Voter], forest: &'a DelegationForest) -> Self {
        Self { voters, forest }
    }

    /// Every path's size goes to its root's preferred candidate.
    pub fn weighted(&self) -> Tally {
        let mut tally = Tally::new();
        for path in &self.forest.paths {
            tally.add(self.voters[path.root].preferred_vote, path.len());
        }
        tally
    }

    /// Direct-democracy baseline: one vote per voter, delegation ignored.
    pub fn direct(&self) -> Tally {
        direct_tally(self.voters)
    }

    pub fn path_count(&self) -> usize {
        self.forest.len()
    }

    pub fn stats(&self) -> PathStats {
        PathStats::from_forest(self.forest)
    }
}

/// One vote per voter for its own preference.
pub fn direct_tally(voters: &[Voter]) -> Tally {
    let mut tally = Tally::new();
    for voter in voters {
        tally.add(voter.preferred_vote, 1);
    }
    tally
}
