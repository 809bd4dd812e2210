//! Tokenizer for the bracket/arrow notation
//!
//! Tokens are produced on demand from the remaining input:
//!   `[` → OpenNode, `]` → CloseNode, `<` → LeftArrow, `>` → RightArrow,
//!   a run of decimal digits → Value, anything else → Invalid.
//!
//! Whitespace is not skipped.

use std::fmt;

/// Single lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// `[`
    OpenNode,

    /// Unsigned decimal integer
    Value(i64),

    /// `<`
    LeftArrow,

    /// `>`
    RightArrow,

    /// `]`
    CloseNode,

    /// Input exhausted
    EndOfFile,

    /// Unrecognized character (or a number that does not fit `i64`)
    Invalid,
}

/// Token kind without payload, used for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `[`
    OpenNode,
    /// Integer literal
    Value,
    /// `<`
    LeftArrow,
    /// `>`
    RightArrow,
    /// `]`
    CloseNode,
    /// End of input
    EndOfFile,
    /// Unrecognized input
    Invalid,
}

impl Token {
    /// Kind of this token
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::OpenNode => TokenKind::OpenNode,
            Token::Value(_) => TokenKind::Value,
            Token::LeftArrow => TokenKind::LeftArrow,
            Token::RightArrow => TokenKind::RightArrow,
            Token::CloseNode => TokenKind::CloseNode,
            Token::EndOfFile => TokenKind::EndOfFile,
            Token::Invalid => TokenKind::Invalid,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::OpenNode => "'['",
            TokenKind::Value => "value",
            TokenKind::LeftArrow => "'<'",
            TokenKind::RightArrow => "'>'",
            TokenKind::CloseNode => "']'",
            TokenKind::EndOfFile => "end of input",
            TokenKind::Invalid => "invalid character",
        };
        f.write_str(name)
    }
}

/// Read one token from the front of `text`
///
/// Returns the token and the unconsumed remainder. Consumption never
/// backtracks: the remainder is always a suffix of `text`.
pub fn next_token(text: &str) -> (Token, &str) {
    let bytes = text.as_bytes();
    let Some(&first) = bytes.first() else {
        return (Token::EndOfFile, text);
    };

    if first.is_ascii_digit() {
        let len = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
        let token = bytes[..len]
            .iter()
            .try_fold(0i64, |acc, &digit| {
                acc.checked_mul(10)?.checked_add(i64::from(digit - b'0'))
            })
            .map_or(Token::Invalid, Token::Value);
        return (token, &text[len..]);
    }

    let token = match first {
        b'[' => Token::OpenNode,
        b']' => Token::CloseNode,
        b'<' => Token::LeftArrow,
        b'>' => Token::RightArrow,
        _ => Token::Invalid,
    };

    // Skip a whole character so the remainder stays on a UTF-8 boundary
    let width = text.chars().next().map_or(1, char::len_utf8);
    (token, &text[width..])
}

/// Lazy token sequence over a notation string
///
/// Yields `EndOfFile` exactly once, then stops.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a str,
    finished: bool,
}

impl<'a> Tokens<'a> {
    /// Start tokenizing `text`
    pub fn new(text: &'a str) -> Self {
        Self {
            rest: text,
            finished: false,
        }
    }

    /// Input not yet consumed
    pub fn remaining(&self) -> &'a str {
        self.rest
    }
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let (token, rest) = next_token(self.rest);
        self.rest = rest;
        self.finished = token == Token::EndOfFile;
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_characters() {
        assert_eq!(next_token("["), (Token::OpenNode, ""));
        assert_eq!(next_token("]x"), (Token::CloseNode, "x"));
        assert_eq!(next_token("<>"), (Token::LeftArrow, ">"));
        assert_eq!(next_token(">"), (Token::RightArrow, ""));
        assert_eq!(next_token(""), (Token::EndOfFile, ""));
    }

    #[test]
    fn test_digits_accumulate() {
        assert_eq!(next_token("1234<"), (Token::Value(1234), "<"));
        assert_eq!(next_token("007]"), (Token::Value(7), "]"));
    }

    #[test]
    fn test_whitespace_is_invalid() {
        assert_eq!(next_token(" [").0, Token::Invalid);
        assert_eq!(next_token("\n").0, Token::Invalid);
        assert_eq!(next_token("-5").0, Token::Invalid);
    }

    #[test]
    fn test_overflow_is_invalid() {
        let (token, rest) = next_token("99999999999999999999]");
        assert_eq!(token, Token::Invalid);
        assert_eq!(rest, "]");
    }

    #[test]
    fn test_multibyte_character_is_one_invalid_token() {
        let (token, rest) = next_token("é[");
        assert_eq!(token, Token::Invalid);
        assert_eq!(rest, "[");
    }

    #[test]
    fn test_token_stream() {
        let kinds: Vec<TokenKind> = Tokens::new("[5<10>]").map(|t| t.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::OpenNode,
                TokenKind::Value,
                TokenKind::LeftArrow,
                TokenKind::Value,
                TokenKind::RightArrow,
                TokenKind::CloseNode,
                TokenKind::EndOfFile,
            ]
        );
    }
}
