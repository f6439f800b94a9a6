//! Liquid-democracy election engine.
//!
//! Simulates a two-candidate election over a synthetic social network in
//! which voters of latent competence may hand their vote to a more
//! competent neighbor, directly or transitively:
//! 1. **Population**: competence ~ N(mean, sd) clamped to [0, 1], votes
//!    correct with probability equal to competence, neighbors from an
//!    Erdos–Renyi or preferential-attachment generator
//! 2. **Delegation**: per-voter delegate choice with weight propagated to
//!    the chain root and capped by a weight limit
//! 3. **Degree enforcement**: re-resolution until no vote travels more hops
//!    than allowed
//! 4. **Tally**: root-anchored paths vote as their root does, compared with
//!    the direct-democracy baseline
//!
//! # Example
//!
//! ```
//! use liquid_core::{Election, ModelConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let config = ModelConfig::erdos_renyi(25, 0.5, 0.2, 0.3, 0.1);
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let outcome = Election::new(config).run(&mut rng).unwrap();
//! assert_eq!(outcome.weighted.total(), 25);
//! ```

pub mod delegation;
pub mod election;
pub mod enforcer;
pub mod error;
pub mod graph;
pub mod model;
pub mod tally;
pub mod voter;

// Re-export key types for convenience
pub use delegation::{DelegationResolver, DelegationStrategy, ForbiddenDelegations};
pub use election::{Election, ElectionOutcome};
pub use enforcer::{DegreeConstraintEnforcer, DelegationForest, DelegationPath, Stabilized};
pub use error::{LiquidError, Result};
pub use graph::{GraphBuilder, GraphGenerator, Population, SocialGraph};
pub use model::{DelegationRule, GraphType, Limit, ModelConfig};
pub use tally::{PathStats, Tally, VoteTally};
pub use voter::{Candidate, Voter, VoterId, VoterStatus};
