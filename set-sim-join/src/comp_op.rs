//! Comparison operators applied between a similarity score and the threshold.
use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, SetSimJoinError};

/// Comparison operator of `score <op> threshold`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompOp {
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `=`
    Eq,
}

impl FromStr for CompOp {
    type Err = SetSimJoinError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            "=" | "==" => Ok(Self::Eq),
            _ => Err(SetSimJoinError::UnknownCompOp(s.to_string())),
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let op = match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
        };
        f.write_str(op)
    }
}

impl CompOp {
    /// Resolves the predicate `(score, threshold) -> bool`.
    pub fn comp_fn(self) -> fn(f64, f64) -> bool {
        match self {
            Self::Gt => |s, t| s > t,
            Self::Ge => |s, t| s >= t,
            Self::Lt => |s, t| s < t,
            Self::Le => |s, t| s <= t,
            #[allow(clippy::float_cmp)]
            Self::Eq => |s, t| s == t,
        }
    }

    /// Checks `score <op> threshold`.
    pub fn apply(self, score: f64, threshold: f64) -> bool {
        self.comp_fn()(score, threshold)
    }

    /// Checks if the operator only accepts scores at or above the threshold,
    /// in which case the prefix filter finds every matching pair.
    pub const fn is_lower_bounded(self) -> bool {
        matches!(self, Self::Gt | Self::Ge | Self::Eq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        for op in [CompOp::Gt, CompOp::Ge, CompOp::Lt, CompOp::Le, CompOp::Eq] {
            assert_eq!(op.to_string().parse::<CompOp>().unwrap(), op);
        }
        assert_eq!("==".parse::<CompOp>().unwrap(), CompOp::Eq);
        assert!(matches!(
            "!=".parse::<CompOp>(),
            Err(SetSimJoinError::UnknownCompOp(_))
        ));
    }

    #[test]
    fn test_apply() {
        assert!(CompOp::Gt.apply(0.6, 0.5));
        assert!(!CompOp::Gt.apply(0.5, 0.5));
        assert!(CompOp::Ge.apply(0.5, 0.5));
        assert!(CompOp::Lt.apply(0.4, 0.5));
        assert!(!CompOp::Lt.apply(0.5, 0.5));
        assert!(CompOp::Le.apply(0.5, 0.5));
        assert!(CompOp::Eq.apply(0.5, 0.5));
        assert!(!CompOp::Eq.apply(0.6, 0.5));
    }
}
