//! Question candidate scoring.
//!
//! Every (pair, direction) gets a smoothed wrong-to-right ratio:
//!
//! ratio = (wrong + 1) / (right + 1)
//!
//! so a pair with no history scores 1 and a pair answered wrongly more often
//! than rightly scores above 1. Candidates are ranked by ratio, highest
//! first, keeping pair insertion order between equal ratios.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::gateway::Gateway;
use crate::model::{Direction, Pair, PairId, ResultTally, Verdict};

/// Graded answer counts for one (pair, direction).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub wrong: u64,
    pub right: u64,
}

impl Counts {
    pub fn ratio(self) -> Ratio {
        Ratio {
            numerator: self.wrong + 1,
            denominator: self.right + 1,
        }
    }
}

/// An exact, smoothed wrong-to-right ratio. Never has a zero denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    numerator: u64,
    denominator: u64,
}

impl Ratio {
    pub fn numerator(self) -> u64 {
        self.numerator
    }

    pub fn denominator(self) -> u64 {
        self.denominator
    }

    pub fn value(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> Ordering {
        // a/b vs c/d  <=>  a*d vs c*b
        let lhs = u128::from(self.numerator) * u128::from(other.denominator);
        let rhs = u128::from(other.numerator) * u128::from(self.denominator);
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// One (pair, direction) that may be asked in a new test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub pair: PairId,
    pub direction: Direction,
    pub counts: Counts,
    pub ratio: Ratio,
}

/// Fold tallies into per-(pair, direction) counts.
pub fn aggregate_counts(tallies: &[ResultTally]) -> HashMap<(PairId, Direction), Counts> {
    let mut counts: HashMap<(PairId, Direction), Counts> = HashMap::new();
    for tally in tallies {
        let entry = counts.entry((tally.pair, tally.direction)).or_default();
        match tally.verdict {
            Verdict::Incorrect => entry.wrong += tally.count,
            Verdict::Correct => entry.right += tally.count,
        }
    }
    counts
}

/// Rank every (pair, direction) by descending ratio.
///
/// `pairs` must be in insertion order; that order, with the normal direction
/// before the inverted one, breaks ties.
pub fn rank_candidates(pairs: &[Pair], tallies: &[ResultTally]) -> Vec<Candidate> {
    let counts = aggregate_counts(tallies);

    let mut candidates: Vec<Candidate> = pairs
        .iter()
        .flat_map(|pair| {
            Direction::ALL.into_iter().map(move |direction| (pair.id, direction))
        })
        .map(|(pair, direction)| {
            let counts = counts.get(&(pair, direction)).copied().unwrap_or_default();
            Candidate {
                pair,
                direction,
                counts,
                ratio: counts.ratio(),
            }
        })
        .collect();

    // sort_by is stable
    candidates.sort_by(|a, b| b.ratio.cmp(&a.ratio));
    candidates
}

/// Load pairs and history from the gateway and rank them.
pub fn rank_from_gateway<G: Gateway + ?Sized>(gateway: &G) -> Result<Vec<Candidate>, StoreError> {
    let pairs = gateway.pairs()?;
    let tallies = gateway.result_tallies()?;
    let candidates = rank_candidates(&pairs, &tallies);
    tracing::debug!(
        pairs = pairs.len(),
        candidates = candidates.len(),
        "ranked question candidates"
    );
    Ok(candidates)
}
