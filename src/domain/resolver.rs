//! Merging detector output into one non-overlapping match list.
//!
//! Candidates are accepted greedily in precedence order: lower
//! [`Priority`] first, then the earlier start, then the longer span. A
//! candidate that overlaps an already accepted span is dropped, so a
//! higher-priority detection is never shadowed by a lower-priority one,
//! whatever their positions. The accepted set is returned sorted by start.

use super::PiiMatch;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Accepted spans keyed by start, used for overlap checks.
#[derive(Debug, Default)]
struct Occupancy {
    spans: BTreeMap<usize, usize>,
}

impl Occupancy {
    /// Since accepted spans never overlap, only the last span starting
    /// before `end` can intersect `[start, end)`.
    fn is_free(&self, start: usize, end: usize) -> bool {
        match self.spans.range(..end).next_back() {
            Some((_, &taken_end)) => taken_end <= start,
            None => true,
        }
    }

    fn claim(&mut self, start: usize, end: usize) {
        self.spans.insert(start, end);
    }
}

/// Resolves candidates from every detector of one segment.
pub fn resolve(mut candidates: Vec<PiiMatch>) -> Vec<PiiMatch> {
    candidates.retain(|m| !m.is_empty());
    candidates.sort_by_key(|m| (m.priority, m.start, Reverse(m.len())));

    let mut occupancy = Occupancy::default();
    let mut accepted = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        if occupancy.is_free(candidate.start, candidate.end) {
            occupancy.claim(candidate.start, candidate.end);
            accepted.push(candidate);
        }
    }

    accepted.sort_by_key(|m| m.start);
    accepted
}
