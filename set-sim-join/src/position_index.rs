//! Inverted index over record prefixes, keeping the position of each prefix token.
use hashbrown::HashMap;

use crate::errors::Result;
use crate::measure::SimMeasure;
use crate::token_ordering::{Rank, TokenOrdering};

/// Identifier of a record, i.e., its row index in the indexed table.
pub type RecordId = usize;

/// Entry of a postings list, the record and the position of the token in its ordered tokens.
pub type Posting = (RecordId, usize);

/// Position index built on one side of a join.
///
/// For every record, the first [`SimMeasure::prefix_length`] tokens of its ordered tokens are
/// indexed. The index also keeps the ordered tokens of all records, so that similarities can be
/// verified without tokenizing again, and the records with no tokens.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionIndex {
    measure: SimMeasure,
    threshold: f64,
    // Indexed by rank.
    postings: Vec<Vec<Posting>>,
    tokens: HashMap<RecordId, Vec<Rank>>,
    empty_records: Vec<RecordId>,
    min_size: usize,
    max_size: usize,
}

impl PositionIndex {
    /// Builds the index.
    ///
    /// # Arguments
    ///
    /// * `records` - Pairs of record ids and their tokens. Records are indexed in this order.
    /// * `measure` - Similarity measure of the join.
    /// * `threshold` - Threshold of the join (must be valid for `measure`).
    /// * `ordering` - Global token ordering, which must cover the tokens of `records`.
    pub fn build<'a, I>(
        records: I,
        measure: SimMeasure,
        threshold: f64,
        ordering: &TokenOrdering,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (RecordId, &'a [String])>,
    {
        measure.validate_threshold(threshold)?;

        let mut postings = vec![vec![]; ordering.len()];
        let mut tokens = HashMap::new();
        let mut empty_records = vec![];
        let mut min_size = usize::MAX;
        let mut max_size = 0;

        for (id, raw_tokens) in records {
            let ordered = ordering.order(raw_tokens);
            let size = ordered.len();
            min_size = min_size.min(size);
            max_size = max_size.max(size);
            if size == 0 {
                empty_records.push(id);
            } else {
                let prefix_length = measure.prefix_length(size, threshold);
                for (position, &rank) in ordered[..prefix_length].iter().enumerate() {
                    postings[rank as usize].push((id, position));
                }
            }
            tokens.insert(id, ordered);
        }

        Ok(Self {
            measure,
            threshold,
            postings,
            tokens,
            empty_records,
            min_size,
            max_size,
        })
    }

    /// Gets the postings list of a token rank, empty if no prefix contains the token.
    pub fn postings(&self, rank: Rank) -> &[Posting] {
        self.postings
            .get(rank as usize)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Gets the ordered tokens of an indexed record.
    pub fn ordered_tokens(&self, id: RecordId) -> Option<&[Rank]> {
        self.tokens.get(&id).map(|t| t.as_slice())
    }

    /// Gets the number of distinct tokens of an indexed record.
    pub fn size(&self, id: RecordId) -> Option<usize> {
        self.tokens.get(&id).map(|t| t.len())
    }

    /// Gets the ids of the records with no tokens, in insertion order.
    pub fn empty_records(&self) -> &[RecordId] {
        &self.empty_records
    }

    /// Gets the smallest record size, or [`usize::MAX`] if no record is indexed.
    pub const fn min_size(&self) -> usize {
        self.min_size
    }

    /// Gets the largest record size.
    pub const fn max_size(&self) -> usize {
        self.max_size
    }

    /// Gets the number of indexed records, including empty ones.
    pub fn num_records(&self) -> usize {
        self.tokens.len()
    }

    /// Gets the total number of postings.
    pub fn num_postings(&self) -> usize {
        self.postings.iter().map(|list| list.len()).sum()
    }

    /// Gets the measure the prefixes were computed for.
    pub const fn measure(&self) -> SimMeasure {
        self.measure
    }

    /// Gets the threshold the prefixes were computed for.
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Gets the memory usage in bytes.
    pub fn memory_in_bytes(&self) -> usize {
        let postings = self.num_postings() * std::mem::size_of::<Posting>()
            + self.postings.len() * std::mem::size_of::<Vec<Posting>>();
        let tokens = self.tokens.values().map(|t| t.len()).sum::<usize>()
            * std::mem::size_of::<Rank>()
            + self.tokens.len() * std::mem::size_of::<(RecordId, Vec<Rank>)>();
        postings + tokens + self.empty_records.len() * std::mem::size_of::<RecordId>()
    }
}
