//! Candidate generation with prefix, size and position filtering.
use hashbrown::HashMap;

use crate::measure::SimMeasure;
use crate::position_index::{PositionIndex, RecordId};
use crate::token_ordering::Rank;

// Overlap value marking a candidate that can no longer reach the threshold.
const PRUNED: usize = 0;

/// Candidates of one probe record with lower bounds of their overlaps.
#[derive(Clone, Debug, Default)]
pub struct CandidateOverlaps {
    overlaps: HashMap<RecordId, usize>,
}

impl CandidateOverlaps {
    /// Gets the overlap lower bound of a candidate.
    pub fn get(&self, id: RecordId) -> Option<usize> {
        self.overlaps.get(&id).copied()
    }

    /// Gets the number of candidates.
    pub fn len(&self) -> usize {
        self.overlaps.len()
    }

    /// Checks if there is no candidate.
    pub fn is_empty(&self) -> bool {
        self.overlaps.is_empty()
    }

    /// Converts into pairs of candidate ids and overlaps, sorted by id.
    pub fn into_sorted_vec(self) -> Vec<(RecordId, usize)> {
        let mut candidates: Vec<_> = self.overlaps.into_iter().collect();
        candidates.sort_unstable_by_key(|&(id, _)| id);
        candidates
    }
}

/// Position filter for a similarity measure and threshold.
///
/// A candidate is a record sharing a token with the probe in both prefixes. While the prefix
/// of the probe is scanned, candidates whose size is out of range, or whose overlap can no
/// longer reach the required overlap given the positions of the shared token, are dropped.
#[derive(Clone, Copy, Debug)]
pub struct PositionFilter {
    measure: SimMeasure,
    threshold: f64,
}

impl PositionFilter {
    /// Creates an instance.
    pub const fn new(measure: SimMeasure, threshold: f64) -> Self {
        Self { measure, threshold }
    }

    /// Finds the candidates of a probe record in the index.
    ///
    /// `probe` must be ordered by the same [`TokenOrdering`](crate::TokenOrdering) the index
    /// was built with. Every indexed record whose similarity to the probe reaches the threshold
    /// is returned, with an overlap that does not exceed the actual one.
    pub fn find_candidates(&self, probe: &[Rank], index: &PositionIndex) -> CandidateOverlaps {
        let probe_size = probe.len();
        let size_lower_bound = self
            .measure
            .size_lower_bound(probe_size, self.threshold)
            .max(index.min_size());
        let size_upper_bound = self
            .measure
            .size_upper_bound(probe_size, self.threshold)
            .min(index.max_size());
        if probe_size == 0 || size_upper_bound < size_lower_bound {
            return CandidateOverlaps::default();
        }

        let overlap_thresholds: Vec<_> = (size_lower_bound..=size_upper_bound)
            .map(|size| {
                self.measure
                    .overlap_threshold(size, probe_size, self.threshold)
            })
            .collect();

        let prefix_length = self.measure.prefix_length(probe_size, self.threshold);
        let mut overlaps = HashMap::new();

        for (probe_pos, &rank) in probe[..prefix_length].iter().enumerate() {
            for &(cand, cand_pos) in index.postings(rank) {
                let current = overlaps.get(&cand).copied();
                if current == Some(PRUNED) {
                    continue;
                }
                let cand_size = match index.size(cand) {
                    Some(size) if (size_lower_bound..=size_upper_bound).contains(&size) => size,
                    _ => continue,
                };
                let current = current.unwrap_or(0);
                let remaining = (probe_size - probe_pos).min(cand_size - cand_pos);
                let required = overlap_thresholds[cand_size - size_lower_bound];
                let next = if current + remaining >= required {
                    current + 1
                } else {
                    PRUNED
                };
                overlaps.insert(cand, next);
            }
        }

        overlaps.retain(|_, &mut overlap| overlap != PRUNED);
        CandidateOverlaps { overlaps }
    }
}
