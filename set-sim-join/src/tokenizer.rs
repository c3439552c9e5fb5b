//! Tokenizers turning join-attribute strings into token sequences.
//!
//! Tokens are kept as a sequence; duplicates are removed later, when the tokens are
//! ordered by [`TokenOrdering`](crate::TokenOrdering), since all measures work on sets.
use crate::errors::{Result, SetSimJoinError, TokenizeError};

/// Capability to split a string into tokens.
///
/// Implementations must be deterministic, and the same tokenizer must be used for both
/// sides of a join.
pub trait Tokenizer {
    /// Splits `text` into tokens.
    fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError>;
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Result<Vec<String>, TokenizeError>,
{
    fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        self(text)
    }
}

/// Splits on Unicode whitespace.
#[derive(Clone, Copy, Debug, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        Ok(text.split_whitespace().map(|t| t.to_string()).collect())
    }
}

/// Splits on any of the given delimiter characters, dropping empty pieces.
#[derive(Clone, Debug)]
pub struct DelimiterTokenizer {
    delimiters: Vec<char>,
}

impl DelimiterTokenizer {
    /// Creates an instance.
    ///
    /// # Arguments
    ///
    /// * `delimiters` - Characters separating tokens (must not be empty).
    pub fn new<I>(delimiters: I) -> Result<Self>
    where
        I: IntoIterator<Item = char>,
    {
        let delimiters: Vec<_> = delimiters.into_iter().collect();
        if delimiters.is_empty() {
            return Err(SetSimJoinError::InvalidTokenizer(
                "At least one delimiter must be given.".to_string(),
            ));
        }
        Ok(Self { delimiters })
    }
}

impl Tokenizer for DelimiterTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        Ok(text
            .split(|c: char| self.delimiters.contains(&c))
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect())
    }
}

const PREFIX_PAD: char = '#';
const SUFFIX_PAD: char = '$';

/// Produces character q-grams with a sliding window.
///
/// With padding, `q-1` copies of `#` are prepended and `q-1` copies of `$` appended,
/// so that the first and last characters also start and end a q-gram.
#[derive(Clone, Copy, Debug)]
pub struct QgramTokenizer {
    qval: usize,
    padding: bool,
}

impl QgramTokenizer {
    /// Creates an instance.
    ///
    /// # Arguments
    ///
    /// * `qval` - Window size (must be more than 0).
    /// * `padding` - Pads both ends of the input?
    pub fn new(qval: usize, padding: bool) -> Result<Self> {
        if qval == 0 {
            return Err(SetSimJoinError::InvalidTokenizer(
                "qval must not be 0.".to_string(),
            ));
        }
        Ok(Self { qval, padding })
    }

    /// Gets the window size.
    pub const fn qval(&self) -> usize {
        self.qval
    }
}

impl Tokenizer for QgramTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        if text.is_empty() {
            return Ok(vec![]);
        }
        let mut chars = Vec::with_capacity(text.len() + 2 * (self.qval - 1));
        if self.padding {
            chars.extend(std::iter::repeat(PREFIX_PAD).take(self.qval - 1));
        }
        chars.extend(text.chars());
        if self.padding {
            chars.extend(std::iter::repeat(SUFFIX_PAD).take(self.qval - 1));
        }
        Ok(chars
            .windows(self.qval)
            .map(|w| w.iter().collect())
            .collect())
    }
}
