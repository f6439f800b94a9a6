//! JSON exporter for graph visualization.
//!
//! Exports one finished trial: voters, social edges, final delegate edges
//! and per-path colors. Reads the outcome only.

use liquid_core::{Candidate, ElectionOutcome, VoterId};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

pub const GREEN: &str = "#2e7d32";
pub const LIGHT_GREEN: &str = "#8ee58b";
pub const RED: &str = "#c62828";
pub const LIGHT_RED: &str = "#ffbcbc";

/// Display color: roots darker than their followers.
pub fn color_for(vote: Candidate, is_root: bool) -> &'static str {
    match (vote, is_root) {
        (Candidate::Correct, true) => GREEN,
        (Candidate::Correct, false) => LIGHT_GREEN,
        (Candidate::Incorrect, true) => RED,
        (Candidate::Incorrect, false) => LIGHT_RED,
    }
}

/// One voter as drawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterRecord {
    pub id: VoterId,
    pub competence: f64,
    pub preferred_vote: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegate: Option<VoterId>,
    pub root: VoterId,
    pub distance: usize,
    pub color: String,
}

/// One root-anchored path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRecord {
    pub root: VoterId,
    pub root_vote: usize,
    pub size: usize,
    pub members: Vec<VoterId>,
}

/// Complete trial export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    /// Scenario name, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,

    /// Trial seed
    pub seed: u64,

    pub voters: Vec<VoterRecord>,

    /// Undirected social edges `(low, high)`
    pub social_edges: Vec<(VoterId, VoterId)>,

    /// Directed `(voter, delegate)` edges
    pub delegate_edges: Vec<(VoterId, VoterId)>,

    pub paths: Vec<PathRecord>,

    /// Weighted result `{0: n0, 1: n1}`
    pub weighted: std::collections::BTreeMap<usize, usize>,

    /// Direct result `{0: n0, 1: n1}`
    pub direct: std::collections::BTreeMap<usize, usize>,
}

impl GraphExport {
    /// Builds an export from a finished trial.
    pub fn from_outcome(outcome: &ElectionOutcome, seed: u64, scenario: Option<&str>) -> Self {
        let n = outcome.voters.len();
        let mut placement = vec![(0, 0); n];
        let mut paths = Vec::with_capacity(outcome.forest.len());

        for path in &outcome.forest.paths {
            for &(voter, distance) in &path.members {
                placement[voter] = (path.root, distance);
            }
            paths.push(PathRecord {
                root: path.root,
                root_vote: outcome.voters[path.root].preferred_vote.index(),
                size: path.len(),
                members: path.members.iter().map(|&(v, _)| v).collect(),
            });
        }

        let voters = outcome
            .voters
            .iter()
            .map(|v| {
                let (root, distance) = placement[v.id];
                let root_vote = outcome.voters[root].preferred_vote;
                VoterRecord {
                    id: v.id,
                    competence: v.competence,
                    preferred_vote: v.preferred_vote.index(),
                    delegate: v.delegate,
                    root,
                    distance,
                    color: color_for(root_vote, v.is_root()).to_string(),
                }
            })
            .collect();

        Self {
            scenario: scenario.map(str::to_string),
            seed,
            voters,
            social_edges: outcome.graph.edges(),
            delegate_edges: outcome.delegate_edges(),
            paths,
            weighted: outcome.weighted.to_map(),
            direct: outcome.direct.to_map(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
