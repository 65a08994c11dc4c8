//! Vote tallies as read back from a contract.

use serde::{Deserialize, Serialize};

/// One candidate together with the number of votes it has received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub candidate: String,
    pub votes: u64,
}

impl TallyEntry {
    pub fn new(candidate: impl Into<String>, votes: u64) -> Self {
        Self {
            candidate: candidate.into(),
            votes,
        }
    }
}

/// Sum of all votes in a tally.
pub fn total_votes(tally: &[TallyEntry]) -> u64 {
    tally.iter().map(|e| e.votes).sum()
}

/// Entries holding the highest vote count. Empty when nobody voted.
pub fn leaders(tally: &[TallyEntry]) -> Vec<&TallyEntry> {
    let top = tally.iter().map(|e| e.votes).max().unwrap_or(0);
    if top == 0 {
        return Vec::new();
    }
    tally.iter().filter(|e| e.votes == top).collect()
}
