//! Exact set-similarity joins on tokenized strings.
//!
//! Given two tables, this library finds all pairs of records whose join attributes are similar
//! under the Jaccard, cosine, Dice, or overlap measure. Pairs are searched with prefix
//! filtering on a global token ordering, extended with the size and position filters of
//! PPJoin (Xiao et al., WWW 2008), and candidates are verified with the exact similarity.
//!
//! # Examples
//!
//! ```
//! use set_sim_join::{jaccard_join, SideSpec, Table};
//! use set_sim_join::tokenizer::WhitespaceTokenizer;
//!
//! let mut ltable = Table::new(["id", "name"]).unwrap();
//! ltable.add_row([Some("a1"), Some("apple iphone 13 pro")]).unwrap();
//! ltable.add_row([Some("a2"), Some("samsung galaxy s21")]).unwrap();
//! let mut rtable = Table::new(["id", "name"]).unwrap();
//! rtable.add_row([Some("b1"), Some("iphone 13 pro apple")]).unwrap();
//! rtable.add_row([Some("b2"), Some("galaxy s21 ultra")]).unwrap();
//!
//! let output = jaccard_join(
//!     &ltable,
//!     &SideSpec::left("id", "name"),
//!     &rtable,
//!     &SideSpec::right("id", "name"),
//!     &WhitespaceTokenizer,
//!     0.5,
//! )
//! .unwrap();
//! assert_eq!(output.key_pairs(), vec![("a1", "b1"), ("a2", "b2")]);
//! ```
#![deny(missing_docs)]

pub mod comp_op;
pub mod errors;
pub mod join;
pub mod measure;
pub mod output;
pub mod position_filter;
pub mod position_index;
pub mod simfunc;
pub mod table;
pub mod token_ordering;
pub mod tokenizer;

pub use comp_op::CompOp;
pub use errors::{Result, SetSimJoinError};
pub use join::{
    cosine_join, dice_join, jaccard_join, overlap_join, JoinConfig, SetSimJoiner,
    TokenizeErrorPolicy,
};
pub use measure::SimMeasure;
pub use output::{JoinOutput, OutputRow, SideSpec};
pub use position_filter::{CandidateOverlaps, PositionFilter};
pub use position_index::PositionIndex;
pub use table::Table;
pub use token_ordering::TokenOrdering;
