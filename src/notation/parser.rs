//! Finite state machine turning tokens into triplets
//!
//! Each bracketed clause walks the machine from `Initial` to `Emit`.
//! Every `(state, token)` pair is either a listed transition or an error;
//! there is no fallthrough.

use std::fmt;

use super::token::{Token, Tokens};
use super::{NotationError, Triplet};

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Between clauses
    Initial,
    /// After `[`: either a leading value or `<`
    LeftOrValue,
    /// After `[n`: the number is a left child or the clause value
    PostLeftOrValue,
    /// After `<`: expecting the clause value
    InValue,
    /// After the clause value: `]` or `>`
    PostInValue,
    /// After `>`: right child digits or `]`
    InRight,
    /// Clause complete
    Emit,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Initial => "initial",
            State::LeftOrValue => "left-or-value",
            State::PostLeftOrValue => "post-left-or-value",
            State::InValue => "in-value",
            State::PostInValue => "post-in-value",
            State::InRight => "in-right",
            State::Emit => "emit",
        };
        f.write_str(name)
    }
}

/// Apply one token to the machine
///
/// Returns `None` when the pair has no transition.
fn transition(state: State, token: Token, draft: &mut Triplet) -> Option<State> {
    use Token::*;

    match state {
        State::Initial => match token {
            OpenNode => {
                *draft = Triplet::default();
                Some(State::LeftOrValue)
            }
            Value(_) | LeftArrow | RightArrow | CloseNode | EndOfFile | Invalid => None,
        },
        State::LeftOrValue => match token {
            Value(v) => {
                draft.left = Some(v);
                Some(State::PostLeftOrValue)
            }
            LeftArrow => {
                draft.left = None;
                Some(State::InValue)
            }
            OpenNode | RightArrow | CloseNode | EndOfFile | Invalid => None,
        },
        State::PostLeftOrValue => match token {
            CloseNode => {
                if let Some(v) = draft.left.take() {
                    draft.value = v;
                }
                draft.right = None;
                Some(State::Emit)
            }
            // The leading number stays in `left`
            LeftArrow => Some(State::InValue),
            RightArrow => {
                if let Some(v) = draft.left.take() {
                    draft.value = v;
                }
                Some(State::InRight)
            }
            OpenNode | Value(_) | EndOfFile | Invalid => None,
        },
        State::InValue => match token {
            Value(v) => {
                draft.value = v;
                Some(State::PostInValue)
            }
            OpenNode | LeftArrow | RightArrow | CloseNode | EndOfFile | Invalid => None,
        },
        State::PostInValue => match token {
            CloseNode => {
                draft.right = None;
                Some(State::Emit)
            }
            RightArrow => Some(State::InRight),
            OpenNode | Value(_) | LeftArrow | EndOfFile | Invalid => None,
        },
        State::InRight => match token {
            // Last value wins
            Value(v) => {
                draft.right = Some(v);
                Some(State::InRight)
            }
            CloseNode => Some(State::Emit),
            OpenNode | LeftArrow | RightArrow | EndOfFile | Invalid => None,
        },
        // Emit is consumed by the driver before the next token is read
        State::Emit => None,
    }
}

/// Parse `text`, handing every clause to `on_triplet` in textual order
///
/// Parsing stops at the first error, whether it comes from the notation
/// or from the callback. Triplets already handed out stay handed out.
pub fn parse<F, E>(text: &str, mut on_triplet: F) -> Result<(), E>
where
    F: FnMut(Triplet) -> Result<(), E>,
    E: From<NotationError>,
{
    let mut tokens = Tokens::new(text);
    let mut state = State::Initial;
    let mut draft = Triplet::default();

    loop {
        let offset = text.len() - tokens.remaining().len();
        let Some(token) = tokens.next() else {
            return Ok(());
        };
        if token == Token::EndOfFile && state == State::Initial {
            return Ok(());
        }

        state = transition(state, token, &mut draft).ok_or_else(|| {
            NotationError::UnexpectedToken {
                input: text.to_string(),
                remaining: tokens.remaining().to_string(),
                offset,
                state,
                token: token.kind(),
            }
        })?;

        if state == State::Emit {
            draft.validate()?;
            on_triplet(draft)?;
            state = State::Initial;
        }
    }
}

/// Parse `text` into a vector of triplets
pub fn parse_all(text: &str) -> Result<Vec<Triplet>, NotationError> {
    let mut triplets = Vec::new();
    parse(text, |triplet| {
        triplets.push(triplet);
        Ok::<_, NotationError>(())
    })?;
    Ok(triplets)
}
