//! Global token ordering by ascending document frequency.
use hashbrown::{HashMap, HashSet};

/// Rank of a token in a [`TokenOrdering`].
pub type Rank = u32;

/// Immutable map from tokens to ranks, where rarer tokens get smaller ranks.
///
/// Each token is counted at most once per record. Tokens with the same frequency are
/// ranked in the order they are first seen, so the ordering is a deterministic function
/// of the input records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenOrdering {
    ranks: HashMap<String, Rank>,
}

#[derive(Default)]
struct TokenCounter<'a> {
    ids: HashMap<&'a str, usize>,
    // (token, frequency) in first-seen order.
    counts: Vec<(&'a str, usize)>,
    dedup: HashSet<&'a str>,
}

impl<'a> TokenCounter<'a> {
    fn add(&mut self, tokens: &'a [String]) {
        self.dedup.clear();
        for token in tokens {
            let token = token.as_str();
            if !self.dedup.insert(token) {
                continue;
            }
            match self.ids.get(token) {
                Some(&id) => self.counts[id].1 += 1,
                None => {
                    self.ids.insert(token, self.counts.len());
                    self.counts.push((token, 1));
                }
            }
        }
    }
}

impl TokenOrdering {
    /// Builds the ordering from the token sequences of all records on both sides of a join.
    ///
    /// # Examples
    ///
    /// ```
    /// use set_sim_join::TokenOrdering;
    ///
    /// let records = vec![
    ///     vec!["data".to_string(), "science".to_string()],
    ///     vec!["data".to_string(), "analytics".to_string()],
    /// ];
    /// let ordering = TokenOrdering::build(records.iter().map(|r| r.as_slice()));
    /// assert_eq!(ordering.rank("science"), Some(0));
    /// assert_eq!(ordering.rank("analytics"), Some(1));
    /// assert_eq!(ordering.rank("data"), Some(2));
    /// ```
    pub fn build<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let mut counter = TokenCounter::default();
        for tokens in records {
            counter.add(tokens);
        }
        let mut counts = counter.counts;
        // Stable, so ties keep the first-seen order.
        counts.sort_by_key(|&(_, freq)| freq);
        let ranks = counts
            .into_iter()
            .enumerate()
            .map(|(rank, (token, _))| (token.to_string(), rank as Rank))
            .collect();
        Self { ranks }
    }

    /// Gets the rank of a token.
    pub fn rank(&self, token: &str) -> Option<Rank> {
        self.ranks.get(token).copied()
    }

    /// Converts tokens into their ranks sorted in ascending order, removing duplicates
    /// and tokens absent from the ordering.
    pub fn order<I, S>(&self, tokens: I) -> Vec<Rank>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ranks: Vec<_> = tokens
            .into_iter()
            .filter_map(|t| self.rank(t.as_ref()))
            .collect();
        ranks.sort_unstable();
        ranks.dedup();
        ranks
    }

    /// Gets the number of distinct tokens.
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// Checks if the ordering is empty.
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}
