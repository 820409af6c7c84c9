//! Raw response decoder.
//!
//! `ipmi-raw` prints the response bytes of a command as whitespace-separated
//! two-digit hex tokens, optionally preceded by a `rcvd:` marker:
//!
//! ```text
//! rcvd: 0C 00 01
//! ```
//!
//! The decoder only guarantees a well-formed token sequence. How many octets
//! a response must have and what they mean is up to the collector that asked
//! for it.

use std::fmt;

use crate::error::DecodeError;

/// Marker `ipmi-raw` prints in front of the response bytes.
const RECEIVED_MARKER: &str = "rcvd:";

/// Unparsed stdout of one command execution for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResult {
    output: String,
}

impl RawResult {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.output
    }
}

impl From<&str> for RawResult {
    fn from(output: &str) -> Self {
        Self::new(output)
    }
}

/// Ordered, well-formed octet tokens of a raw response.
///
/// Tokens stay string-coded (upper-case, two hex digits) so collectors can
/// classify them by exact match before any numeric interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Octets {
    tokens: Vec<String>,
}

impl Octets {
    /// Validate and normalize a sequence of tokens.
    ///
    /// Fails on the first token that is not exactly two hex digits, or when
    /// there are no tokens at all.
    pub fn from_tokens<'a, I>(tokens: I) -> Result<Self, DecodeError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tokens = tokens
            .into_iter()
            .enumerate()
            .map(|(position, token)| {
                if is_octet(token) {
                    Ok(token.to_ascii_uppercase())
                } else {
                    Err(DecodeError::InvalidToken {
                        position,
                        token: token.to_string(),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if tokens.is_empty() {
            return Err(DecodeError::Empty);
        }
        Ok(Self { tokens })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token at `index`, e.g. `"0C"`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    /// Numeric value of the token at `index`.
    pub fn byte(&self, index: usize) -> Option<u8> {
        self.get(index).and_then(|t| u8::from_str_radix(t, 16).ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

impl fmt::Display for Octets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.tokens.join(" "))
    }
}

fn is_octet(token: &str) -> bool {
    token.len() == 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Decode the raw output of one command into its octets.
pub fn decode_raw_octets(raw: &RawResult) -> Result<Octets, DecodeError> {
    let mut tokens = raw.as_str().split_whitespace().peekable();
    if tokens
        .peek()
        .is_some_and(|t| t.eq_ignore_ascii_case(RECEIVED_MARKER))
    {
        tokens.next();
    }
    Octets::from_tokens(tokens)
}
