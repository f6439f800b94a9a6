//! Population and social-network construction.
//!
//! The generator is chosen from a small strategy table keyed by
//! [`GraphType`]; each strategy produces a symmetric, loop-free
//! [`SocialGraph`] over voter ids `0..n`.

use crate::error::{LiquidError, Result};
use crate::model::{GraphType, ModelConfig};
use crate::voter::{Voter, VoterId};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Exp1, Normal};
use std::collections::BTreeSet;

/// Undirected social network stored as per-voter neighbor sets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SocialGraph {
    adjacency: Vec<BTreeSet<VoterId>>,
}

impl SocialGraph {
    /// Creates a graph with `n` isolated voters.
    pub fn empty(n: usize) -> Self {
        Self {
            adjacency: vec![BTreeSet::new(); n],
        }
    }

    /// Number of voters.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Adds the undirected edge `a`–`b`.
    ///
    /// Self-loops are never stored. Returns true if the edge is new.
    pub fn add_edge(&mut self, a: VoterId, b: VoterId) -> bool {
        if a == b {
            return false;
        }
        let inserted = self.adjacency[a].insert(b);
        self.adjacency[b].insert(a);
        inserted
    }

    pub fn adjacent(&self, a: VoterId, b: VoterId) -> bool {
        self.adjacency
            .get(a)
            .map(|set| set.contains(&b))
            .unwrap_or(false)
    }

    /// Neighbors of `id` in ascending order.
    pub fn neighbors(&self, id: VoterId) -> impl Iterator<Item = VoterId> + '_ {
        self.adjacency[id].iter().copied()
    }

    pub fn degree(&self, id: VoterId) -> usize {
        self.adjacency[id].len()
    }

    /// Sum of degrees / 2.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Each undirected edge once, as `(low, high)`.
    pub fn edges(&self) -> Vec<(VoterId, VoterId)> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(a, set)| set.range(a + 1..).map(move |&b| (a, b)))
            .collect()
    }
}

/// A social-network generator.
pub trait GraphGenerator {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Rejects inputs the generator cannot handle.
    fn validate(&self, n: usize) -> Result<()>;

    /// Builds a graph over `n` voters.
    fn generate(&self, n: usize, rng: &mut dyn RngCore) -> Result<SocialGraph>;
}

/// Independent edges with fixed probability.
#[derive(Debug, Clone, Copy)]
pub struct ErdosRenyi {
    pub connect_probability: f64,
}

impl GraphGenerator for ErdosRenyi {
    fn name(&self) -> &'static str {
        "erdos_renyi"
    }

    fn validate(&self, _n: usize) -> Result<()> {
        if !(0.0..=1.0).contains(&self.connect_probability) {
            return Err(LiquidError::invalid(
                "connect_probability",
                self.connect_probability,
                "must lie in [0, 1]",
            ));
        }
        Ok(())
    }

    fn generate(&self, n: usize, rng: &mut dyn RngCore) -> Result<SocialGraph> {
        self.validate(n)?;
        let mut graph = SocialGraph::empty(n);

        // One coin per unordered pair, row-major over the upper triangle
        for i in 0..n {
            for j in (i + 1)..n {
                let draw: f64 = rng.gen();
                if draw < self.connect_probability {
                    graph.add_edge(i, j);
                }
            }
        }

        Ok(graph)
    }
}

/// Barabási–Albert style growth from a complete seed of `attachment_size` voters.
#[derive(Debug, Clone, Copy)]
pub struct PreferentialAttachment {
    pub attachment_size: usize,
}

impl GraphGenerator for PreferentialAttachment {
    fn name(&self) -> &'static str {
        "preferential_attachment"
    }

    fn validate(&self, n: usize) -> Result<()> {
        if self.attachment_size == 0 {
            return Err(LiquidError::GraphConstruction(
                "attachment size must be positive".into(),
            ));
        }
        if n <= self.attachment_size {
            return Err(LiquidError::GraphConstruction(format!(
                "preferential attachment needs more than {} voters, got {}",
                self.attachment_size, n
            )));
        }
        Ok(())
    }

    fn generate(&self, n: usize, rng: &mut dyn RngCore) -> Result<SocialGraph> {
        self.validate(n)?;
        let m = self.attachment_size;
        let mut graph = SocialGraph::empty(n);

        for i in 0..m {
            for j in (i + 1)..m {
                graph.add_edge(i, j);
            }
        }

        for newcomer in m..n {
            // Weighted sampling without replacement: key = Exp(1) / degree,
            // keep the m smallest. Zero-degree voters sort last.
            let mut keyed: Vec<(f64, VoterId)> = (0..newcomer)
                .map(|candidate| {
                    let variate: f64 = Exp1.sample(&mut *rng);
                    let degree = graph.degree(candidate);
                    let key = if degree == 0 {
                        f64::INFINITY
                    } else {
                        variate / degree as f64
                    };
                    (key, candidate)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            for &(_, chosen) in keyed.iter().take(m) {
                graph.add_edge(newcomer, chosen);
            }
        }

        Ok(graph)
    }
}

/// Strategy table: one generator per [`GraphType`].
pub fn generator_for(config: &ModelConfig) -> Box<dyn GraphGenerator> {
    match config.graph_type {
        GraphType::ErdosRenyi => Box::new(ErdosRenyi {
            connect_probability: config.connect_probability,
        }),
        GraphType::PreferentialAttachment => Box::new(PreferentialAttachment {
            attachment_size: config.attachment_size,
        }),
    }
}

/// Voters plus the network connecting them.
#[derive(Debug, Clone)]
pub struct Population {
    pub voters: Vec<Voter>,
    pub graph: SocialGraph,
}

/// Builds the voter population and its social network.
pub struct GraphBuilder<'a> {
    config: &'a ModelConfig,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(config: &'a ModelConfig) -> Self {
        Self { config }
    }

    /// Samples every voter, then generates the network.
    ///
    /// Generator inputs are validated before any randomness is consumed.
    pub fn build<R: Rng>(&self, rng: &mut R) -> Result<Population> {
        let config = self.config;
        let generator = generator_for(config);
        generator.validate(config.total_voters)?;

        let competence_dist = Normal::new(config.competence_mean, config.competence_sd)
            .map_err(|e| LiquidError::invalid("competence_sd", config.competence_sd, e.to_string()))?;

        let mut voters = Vec::with_capacity(config.total_voters);
        for id in 0..config.total_voters {
            voters.push(Voter::sample(id, config, &competence_dist, rng));
        }

        let graph = generator.generate(config.total_voters, rng)?;
        for voter in voters.iter_mut() {
            voter.neighbors = graph.neighbors(voter.id).collect();
        }

        tracing::debug!(
            generator = generator.name(),
            voters = voters.len(),
            edges = graph.edge_count(),
            "population built"
        );

        Ok(Population { voters, graph })
    }
}
