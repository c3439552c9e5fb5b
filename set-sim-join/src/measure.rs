//! Similarity measures and the size/overlap bounds used for filtering.
use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, SetSimJoinError};
use crate::simfunc;

/// Slack used when rounding bounds, so that floating-point noise can only loosen them.
const EPS: f64 = 1e-9;

/// Set-similarity measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimMeasure {
    /// `|x ∩ y| / |x ∪ y|`.
    Jaccard,
    /// `|x ∩ y| / sqrt(|x| * |y|)`.
    Cosine,
    /// `2 * |x ∩ y| / (|x| + |y|)`.
    Dice,
    /// `|x ∩ y|`.
    Overlap,
}

impl FromStr for SimMeasure {
    type Err = SetSimJoinError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jaccard" => Ok(Self::Jaccard),
            "cosine" => Ok(Self::Cosine),
            "dice" => Ok(Self::Dice),
            "overlap" => Ok(Self::Overlap),
            _ => Err(SetSimJoinError::UnknownMeasure(s.to_string())),
        }
    }
}

impl fmt::Display for SimMeasure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Jaccard => "jaccard",
            Self::Cosine => "cosine",
            Self::Dice => "dice",
            Self::Overlap => "overlap",
        };
        f.write_str(name)
    }
}

impl SimMeasure {
    /// Checks if the measure is normalized into `[0,1]`.
    pub const fn is_normalized(self) -> bool {
        !matches!(self, Self::Overlap)
    }

    /// Checks that `threshold` lies in the domain of the measure:
    /// `[0,1]` for normalized measures and `[0,∞)` for [`SimMeasure::Overlap`].
    pub fn validate_threshold(self, threshold: f64) -> Result<()> {
        let valid = if self.is_normalized() {
            (0. ..=1.).contains(&threshold)
        } else {
            threshold.is_finite() && threshold >= 0.
        };
        if valid {
            Ok(())
        } else {
            Err(SetSimJoinError::InvalidThreshold {
                measure: self,
                threshold,
            })
        }
    }

    /// Resolves the scoring function of the measure.
    ///
    /// Inputs must be sorted and free of duplicates.
    pub fn sim_fn<T: Ord>(self) -> fn(&[T], &[T]) -> f64 {
        match self {
            Self::Jaccard => simfunc::jaccard,
            Self::Cosine => simfunc::cosine,
            Self::Dice => simfunc::dice,
            Self::Overlap => simfunc::overlap,
        }
    }

    /// Computes the similarity of two sorted token sets.
    pub fn score<T: Ord>(self, x: &[T], y: &[T]) -> f64 {
        self.sim_fn()(x, y)
    }

    /// Gets the number of leading tokens of a record with `num_tokens` tokens that must contain
    /// a token shared with any record reaching `threshold`.
    pub fn prefix_length(self, num_tokens: usize, threshold: f64) -> usize {
        if num_tokens == 0 {
            return 0;
        }
        let n = num_tokens as f64;
        let required = match self {
            Self::Jaccard => lenient_ceil(threshold * n),
            Self::Cosine => lenient_ceil(threshold * threshold * n),
            Self::Dice => lenient_ceil(threshold / (2. - threshold) * n),
            Self::Overlap => lenient_ceil(threshold),
        };
        (num_tokens + 1).saturating_sub(required).min(num_tokens)
    }

    /// Gets the smallest size of a record that can reach `threshold` against a record of
    /// `num_tokens` tokens.
    pub fn size_lower_bound(self, num_tokens: usize, threshold: f64) -> usize {
        let n = num_tokens as f64;
        match self {
            Self::Jaccard => lenient_ceil(threshold * n),
            Self::Cosine => lenient_ceil(threshold * threshold * n),
            Self::Dice => lenient_ceil(threshold / (2. - threshold) * n),
            Self::Overlap => lenient_ceil(threshold),
        }
    }

    /// Gets the largest size of a record that can reach `threshold` against a record of
    /// `num_tokens` tokens. Returns [`usize::MAX`] when there is no upper bound.
    pub fn size_upper_bound(self, num_tokens: usize, threshold: f64) -> usize {
        if threshold <= 0. {
            return usize::MAX;
        }
        let n = num_tokens as f64;
        match self {
            Self::Jaccard => lenient_floor(n / threshold),
            Self::Cosine => lenient_floor(n / (threshold * threshold)),
            Self::Dice => lenient_floor((2. - threshold) * n / threshold),
            Self::Overlap => usize::MAX,
        }
    }

    /// Gets the minimum overlap two records of sizes `lhs_size` and `rhs_size` must share to
    /// reach `threshold`.
    pub fn overlap_threshold(self, lhs_size: usize, rhs_size: usize, threshold: f64) -> usize {
        let (m, n) = (lhs_size as f64, rhs_size as f64);
        match self {
            Self::Jaccard => lenient_ceil(threshold / (1. + threshold) * (m + n)),
            Self::Cosine => lenient_ceil(threshold * (m * n).sqrt()),
            Self::Dice => lenient_ceil(threshold / 2. * (m + n)),
            Self::Overlap => lenient_ceil(threshold),
        }
    }
}

#[inline(always)]
fn lenient_ceil(x: f64) -> usize {
    // `as` saturates, so infinities map onto the usize range.
    (x - EPS).ceil().max(0.) as usize
}

#[inline(always)]
fn lenient_floor(x: f64) -> usize {
    (x + EPS).floor().max(0.) as usize
}
