mod heuristic;

use serde::{Deserialize, Serialize};

pub use heuristic::HeuristicCoref;

/// A span of the input text, as byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// All mentions of one entity, `main` being the most representative one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub main: Mention,
    pub mentions: Vec<Mention>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorefOutput {
    /// Input text with references replaced by their cluster's main mention.
    pub resolved: String,
    pub clusters: Vec<Cluster>,
}

/// Coreference resolution over a whole chapter of clean text.
pub trait CorefEngine {
    fn resolve(&self, text: &str) -> anyhow::Result<CorefOutput>;
}
