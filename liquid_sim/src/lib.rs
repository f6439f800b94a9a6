//! Liquid-democracy simulation harness.
//!
//! Runs many independent election trials over one configuration and
//! reports how delegation changed accuracy relative to direct democracy.
//!
//! # Determinism
//!
//! Every trial draws from its own ChaCha8 stream derived from the master
//! seed and the trial index, so a failing trial is reproducible from
//! `(seed, index)` alone and trials never disturb each other.
//!
//! # Usage
//!
//! ```
//! use liquid_sim::{ScenarioId, TrialRunner};
//!
//! let config = ScenarioId::Baseline.params().to_config().unwrap();
//! let report = TrialRunner::new(config, 42).with_trials(3).run().unwrap();
//! assert_eq!(report.summary.completed, 3);
//! ```

mod context;
mod error;
mod exporter;
mod params;
mod runner;
mod stats;
pub mod scenarios;

pub use context::TrialContext;
pub use error::SimError;
pub use exporter::{color_for, GraphExport, PathRecord, VoterRecord};
pub use params::{parse_override, ParamSet};
pub use runner::{Comparison, RunReport, RunSummary, TrialFailure, TrialResult, TrialRunner};
pub use scenarios::ScenarioId;
pub use stats::Summary;
