//! Stage-driven extraction of fields from fixed-shape paths
//!
//! A [`MiniParser`] is a list of stages fed one character at a time:
//!   skip(n)   – ignore everything up to and including the n-th `/`
//!   text()    – collect characters up to the next `/`
//!   integer() – collect decimal digits up to the next `/`
//!
//! The query path `/tree/{id}/common-ancestor/{v1}/{v2}` is
//! `skip(2) text() skip(1) integer() integer()`.

use std::str::FromStr;

use thiserror::Error;

const SEPARATOR: char = '/';

/// Errors raised for paths that do not fit the template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    /// Path ended before every field was read
    #[error("path ended before field {field} was read")]
    Incomplete {
        /// Index of the missing field
        field: usize,
    },

    /// A field was present but empty
    #[error("field {field} is empty")]
    EmptyField {
        /// Index of the empty field
        field: usize,
    },

    /// Non-digit inside a numeric field
    #[error("expected a digit at offset {offset}, found {found:?}")]
    NotANumber {
        /// Byte offset of the character
        offset: usize,
        /// Offending character
        found: char,
    },

    /// Numeric field does not fit `i64`
    #[error("number at offset {offset} is too large")]
    Overflow {
        /// Byte offset where the field overflowed
        offset: usize,
    },

    /// Characters after the last stage
    #[error("unexpected input after the last field at offset {offset}")]
    Trailing {
        /// Byte offset of the first extra character
        offset: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Skip(usize),
    Text,
    Integer,
}

/// Extracted field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// Raw path segment
    Text(String),
    /// Decimal segment
    Integer(i64),
}

/// Reusable path template
#[derive(Debug, Clone, Default)]
pub struct MiniParser {
    stages: Vec<Stage>,
}

/// Per-parse cursor over the stage list
struct Run<'p> {
    stages: &'p [Stage],
    stage: usize,
    skipped: usize,
    text: String,
    number: Option<i64>,
    fields: Vec<Field>,
}

impl Run<'_> {
    fn advance(&mut self) {
        self.stage += 1;
        self.skipped = 0;
    }

    /// Publish the pending field of the current stage
    fn publish(&mut self) -> Result<(), UriError> {
        let field = match self.stages.get(self.stage).copied() {
            Some(Stage::Text) if !self.text.is_empty() => Field::Text(std::mem::take(&mut self.text)),
            Some(Stage::Integer) => match self.number.take() {
                Some(number) => Field::Integer(number),
                None => {
                    return Err(UriError::EmptyField {
                        field: self.fields.len(),
                    })
                }
            },
            Some(Stage::Text) => {
                return Err(UriError::EmptyField {
                    field: self.fields.len(),
                })
            }
            Some(Stage::Skip(_)) | None => return Ok(()),
        };
        self.fields.push(field);
        self.advance();
        Ok(())
    }

    fn feed(&mut self, offset: usize, c: char) -> Result<(), UriError> {
        match self.stages.get(self.stage).copied() {
            None => Err(UriError::Trailing { offset }),
            Some(Stage::Skip(count)) => {
                if c == SEPARATOR {
                    self.skipped += 1;
                    if self.skipped == count {
                        self.advance();
                    }
                }
                Ok(())
            }
            Some(Stage::Text) => {
                if c == SEPARATOR {
                    self.publish()
                } else {
                    self.text.push(c);
                    Ok(())
                }
            }
            Some(Stage::Integer) => {
                if c == SEPARATOR {
                    return self.publish();
                }
                let digit = c
                    .to_digit(10)
                    .ok_or(UriError::NotANumber { offset, found: c })?;
                let number = self
                    .number
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(i64::from(digit)))
                    .ok_or(UriError::Overflow { offset })?;
                self.number = Some(number);
                Ok(())
            }
        }
    }

    fn finish(mut self) -> Result<Vec<Field>, UriError> {
        // A field may run to the end of input
        let pending = !self.text.is_empty() || self.number.is_some();
        if pending || self.stage + 1 == self.stages.len() {
            self.publish()?;
        }
        if self.stage < self.stages.len() {
            return Err(UriError::Incomplete {
                field: self.fields.len(),
            });
        }
        Ok(self.fields)
    }
}

impl MiniParser {
    /// Empty template
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore input up to and including the `separators`-th `/`
    pub fn skip(mut self, separators: usize) -> Self {
        if separators > 0 {
            self.stages.push(Stage::Skip(separators));
        }
        self
    }

    /// Read a non-empty text segment
    pub fn text(mut self) -> Self {
        self.stages.push(Stage::Text);
        self
    }

    /// Read a non-empty decimal segment
    pub fn integer(mut self) -> Self {
        self.stages.push(Stage::Integer);
        self
    }

    /// Run the template over `input`
    pub fn parse(&self, input: &str) -> Result<Vec<Field>, UriError> {
        let mut run = Run {
            stages: &self.stages,
            stage: 0,
            skipped: 0,
            text: String::new(),
            number: None,
            fields: Vec::new(),
        };
        for (offset, c) in input.char_indices() {
            run.feed(offset, c)?;
        }
        run.finish()
    }
}

/// Fields of a `/tree/{id}/common-ancestor/{v1}/{v2}` path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorQuery {
    /// Encoded tree identity
    pub tree: String,
    /// First value
    pub first: i64,
    /// Second value
    pub second: i64,
}

impl AncestorQuery {
    /// Template matching the common-ancestor path
    pub fn template() -> MiniParser {
        MiniParser::new().skip(2).text().skip(1).integer().integer()
    }

    /// Extract the query from a request path
    pub fn from_uri(uri: &str) -> Result<Self, UriError> {
        match Self::template().parse(uri)?.as_slice() {
            [Field::Text(tree), Field::Integer(first), Field::Integer(second)] => Ok(Self {
                tree: tree.clone(),
                first: *first,
                second: *second,
            }),
            fields => Err(UriError::Incomplete {
                field: fields.len(),
            }),
        }
    }
}

impl FromStr for AncestorQuery {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uri(s)
    }
}
