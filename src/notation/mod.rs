//! Bracket/arrow notation for binary search tree fragments
//!
//! A text such as `[5<10>15][5>7]` is a sequence of clauses, each naming a
//! value with an optional left child before `<` and an optional right child
//! after `>`. Clauses are compiled into [`Triplet`]s:
//!
//! - `[5<10>15]` → left 5, value 10, right 15
//! - `[<10>]`    → value 10 alone
//! - `[5>7]`     → value 5, right 7
//! - `[13<15]`   → left 13, value 15
//!
//! Ordering is checked per clause: a left child must be lesser and a
//! right child greater than the value.

mod parser;
mod token;

pub use parser::{parse, parse_all, State};
pub use token::{next_token, Token, TokenKind, Tokens};

use std::fmt;

use thiserror::Error;

/// One parsed clause
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct Triplet {
    /// Left child value
    pub left: Option<i64>,

    /// Clause value
    pub value: i64,

    /// Right child value
    pub right: Option<i64>,
}

impl Triplet {
    /// Triplet with both children
    pub fn new(left: Option<i64>, value: i64, right: Option<i64>) -> Self {
        Self { left, value, right }
    }

    /// Triplet naming a value without children
    pub fn leaf(value: i64) -> Self {
        Self {
            left: None,
            value,
            right: None,
        }
    }

    /// Check binary-search-tree ordering
    pub fn validate(&self) -> Result<(), NotationError> {
        if let Some(left) = self.left {
            if left >= self.value {
                return Err(NotationError::LeftNotLesser {
                    left,
                    value: self.value,
                });
            }
        }
        if let Some(right) = self.right {
            if right <= self.value {
                return Err(NotationError::RightNotGreater {
                    right,
                    value: self.value,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        if let Some(left) = self.left {
            write!(f, "{left}")?;
        }
        write!(f, "<{}>", self.value)?;
        if let Some(right) = self.right {
            write!(f, "{right}")?;
        }
        f.write_str("]")
    }
}

/// Errors raised while parsing notation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    /// No transition for the current state and token
    #[error("unable to parse `{input}` at offset {offset} (remaining `{remaining}`): unexpected {token} in state {state}")]
    UnexpectedToken {
        /// Full input text
        input: String,
        /// Input left after the offending token
        remaining: String,
        /// Byte offset of the offending token
        offset: usize,
        /// State the machine was in
        state: State,
        /// Kind of the offending token
        token: TokenKind,
    },

    /// Left child is not lesser than the value
    #[error("the left node must have a lesser value: {left} is not less than {value}")]
    LeftNotLesser {
        /// Offending left child
        left: i64,
        /// Clause value
        value: i64,
    },

    /// Right child is not greater than the value
    #[error("the right node must have a greater value: {right} is not greater than {value}")]
    RightNotGreater {
        /// Offending right child
        right: i64,
        /// Clause value
        value: i64,
    },
}
