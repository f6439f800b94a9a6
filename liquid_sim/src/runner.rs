//! Trial runner - executes independent elections for one configuration.

use crate::context::TrialContext;
use crate::error::SimError;
use crate::stats::Summary;

use liquid_core::{Candidate, Election, ElectionOutcome, ModelConfig, PathStats, Tally};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How liquid democracy fared against direct democracy in one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    /// Only the delegated election elected the correct candidate
    DelegationBetter,

    /// Both or neither elected the correct candidate
    Tied,

    /// Only the direct election elected the correct candidate
    DirectBetter,
}

/// Results from running one trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    /// Trial index within the run
    pub trial: u64,

    /// Seed of this trial's random stream
    pub seed: u64,

    /// Liquid-democracy totals
    pub weighted: Tally,

    /// Direct-democracy totals
    pub direct: Tally,

    pub path_stats: PathStats,

    /// Resolver passes needed
    pub resolution_rounds: usize,
}

impl TrialResult {
    fn from_outcome(trial: u64, seed: u64, outcome: &ElectionOutcome) -> Self {
        Self {
            trial,
            seed,
            weighted: outcome.weighted,
            direct: outcome.direct,
            path_stats: outcome.path_stats(),
            resolution_rounds: outcome.resolution_rounds,
        }
    }

    pub fn delegated_accuracy(&self) -> f64 {
        self.weighted.accuracy()
    }

    pub fn direct_accuracy(&self) -> f64 {
        self.direct.accuracy()
    }

    pub fn comparison(&self) -> Comparison {
        let delegated = self.weighted.winner() == Some(Candidate::Correct);
        let direct = self.direct.winner() == Some(Candidate::Correct);
        match (delegated, direct) {
            (true, false) => Comparison::DelegationBetter,
            (false, true) => Comparison::DirectBetter,
            _ => Comparison::Tied,
        }
    }
}

/// A trial that aborted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialFailure {
    pub trial: u64,
    pub seed: u64,
    pub reason: String,
}

/// Aggregates over all completed trials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub trials: usize,
    pub completed: usize,
    pub failed: usize,
    pub delegated_accuracy: Summary,
    pub direct_accuracy: Summary,
    pub path_count: Summary,
    pub mean_path_size: Summary,
    pub max_path_size: Summary,
    pub max_distance: Summary,
    pub resolution_rounds: Summary,
    pub delegation_better: usize,
    pub tied: usize,
    pub direct_better: usize,
}

impl RunSummary {
    pub fn from_results(trials: usize, results: &[TrialResult], failed: usize) -> Self {
        let summarize = |f: &dyn Fn(&TrialResult) -> f64| Summary::of(results.iter().map(f));
        let count = |c: Comparison| results.iter().filter(|r| r.comparison() == c).count();

        Self {
            trials,
            completed: results.len(),
            failed,
            delegated_accuracy: summarize(&|r| r.delegated_accuracy()),
            direct_accuracy: summarize(&|r| r.direct_accuracy()),
            path_count: summarize(&|r| r.path_stats.count as f64),
            mean_path_size: summarize(&|r| r.path_stats.mean_size),
            max_path_size: summarize(&|r| r.path_stats.max_size as f64),
            max_distance: summarize(&|r| r.path_stats.max_distance as f64),
            resolution_rounds: summarize(&|r| r.resolution_rounds as f64),
            delegation_better: count(Comparison::DelegationBetter),
            tied: count(Comparison::Tied),
            direct_better: count(Comparison::DirectBetter),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Master seed
    pub seed: u64,
    pub config: ModelConfig,
    pub results: Vec<TrialResult>,
    pub failures: Vec<TrialFailure>,
    pub summary: RunSummary,
}

/// Runs independent election trials.
pub struct TrialRunner {
    election: Election,

    /// Seed source
    context: TrialContext,

    /// Number of trials
    trials: usize,

    /// Abort the run on the first failed trial
    fail_fast: bool,
}

impl TrialRunner {
    /// Creates a new trial runner.
    pub fn new(config: ModelConfig, seed: u64) -> Self {
        Self {
            election: Election::new(config),
            context: TrialContext::new(seed),
            trials: 1,
            fail_fast: false,
        }
    }

    /// Sets the number of trials.
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Stops at the first failing trial instead of skipping it.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn context(&self) -> &TrialContext {
        &self.context
    }

    /// Runs trial `index` and returns the full outcome.
    pub fn run_outcome(&self, index: u64) -> Result<ElectionOutcome, SimError> {
        let mut rng = self.context.trial_rng(index);
        Ok(self.election.run(&mut rng)?)
    }

    /// Runs every trial and aggregates the results.
    ///
    /// # Errors
    /// With fail-fast, the first trial error. Otherwise only
    /// `AllTrialsFailed` when no trial completed.
    pub fn run(&self) -> Result<RunReport, SimError> {
        info!(
            seed = self.context.seed(),
            trials = self.trials,
            voters = self.election.config().total_voters,
            "Starting run"
        );

        let mut results = Vec::with_capacity(self.trials);
        let mut failures = Vec::new();

        for index in 0..self.trials as u64 {
            let seed = self.context.trial_seed(index);
            match self.run_outcome(index) {
                Ok(outcome) => {
                    let result = TrialResult::from_outcome(index, seed, &outcome);
                    debug!(
                        trial = index,
                        weighted = ?result.weighted.to_map(),
                        direct = ?result.direct.to_map(),
                        paths = result.path_stats.count,
                        "trial complete"
                    );
                    results.push(result);
                }
                Err(e) if self.fail_fast => return Err(e),
                Err(e) => {
                    warn!(trial = index, seed, "trial skipped: {}", e);
                    failures.push(TrialFailure {
                        trial: index,
                        seed,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if results.is_empty() && self.trials > 0 {
            return Err(SimError::AllTrialsFailed(self.trials));
        }

        let summary = RunSummary::from_results(self.trials, &results, failures.len());
        Ok(RunReport {
            seed: self.context.seed(),
            config: self.election.config().clone(),
            results,
            failures,
            summary,
        })
    }
}
