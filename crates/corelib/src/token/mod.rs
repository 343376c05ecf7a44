//! Ring coordinates.
//!
//! A [`Token`] is a signed integer of up to 128 bits stored as a sign plus a
//! magnitude of 32-bit words, most significant word first. Node tokens are
//! parsed from operator-supplied decimal strings; key tokens are built from a
//! 32-bit hash with [`Token::from_u32`].

mod parse;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Maximum number of 32-bit words in a token magnitude.
pub const MAX_WORDS: usize = 4;

/// Errors that can occur when parsing a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// No digits were supplied.
    #[error("empty token")]
    Empty,
    /// The string contains something other than an optional `-` and digits.
    #[error("malformed token {0:?}")]
    Malformed(String),
    /// The value does not fit in 128 bits.
    #[error("token does not fit in {} bits", MAX_WORDS * 32)]
    Overflow,
}

/// A position on the ring.
///
/// The representation is kept normalized: `length` is the number of
/// significant words (at least one), unused words are zero and a zero
/// magnitude always has `signum == 0`. Derived equality therefore agrees with
/// the ordering below.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    signum: i8,
    length: u32,
    mag: [u32; MAX_WORDS],
}

impl Token {
    /// The zero token.
    pub const ZERO: Token = Token {
        signum: 0,
        length: 1,
        mag: [0; MAX_WORDS],
    };

    /// Parses a base-10 token, optionally prefixed with `-`.
    pub fn parse(s: &str) -> Result<Self, TokenError> {
        parse::parse_decimal(s)
    }

    /// Token for a hashed key. Key tokens are always a single word.
    pub fn from_u32(hash: u32) -> Self {
        Token {
            signum: i8::from(hash > 0),
            length: 1,
            mag: [hash, 0, 0, 0],
        }
    }

    /// Builds a token from a sign and a little-endian word accumulator.
    pub(crate) fn from_le_words(negative: bool, acc: [u32; MAX_WORDS]) -> Self {
        let length = acc.iter().rposition(|w| *w != 0).map_or(1, |i| i + 1);
        let mut mag = [0; MAX_WORDS];
        for (i, word) in mag.iter_mut().take(length).enumerate() {
            *word = acc[length - 1 - i];
        }
        let signum = if acc.iter().all(|w| *w == 0) {
            0
        } else if negative {
            -1
        } else {
            1
        };
        Token {
            signum,
            length: length as u32,
            mag,
        }
    }

    /// -1, 0 or 1.
    pub fn signum(&self) -> i8 {
        self.signum
    }

    /// Number of significant magnitude words.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Significant magnitude words, most significant first.
    pub fn words(&self) -> &[u32] {
        &self.mag[..self.length as usize]
    }

    /// The magnitude as an unsigned integer.
    pub fn magnitude(&self) -> u128 {
        self.words()
            .iter()
            .fold(0u128, |acc, w| (acc << 32) | u128::from(*w))
    }
}

impl Default for Token {
    fn default() -> Self {
        Token::ZERO
    }
}

/// Orders by sign, then by magnitude. Negative tokens are not mirrored, so
/// `-5` sorts above `-4`.
impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.signum.cmp(&other.signum) {
            Ordering::Equal => {}
            ord => return ord,
        }
        self.length
            .cmp(&other.length)
            .then_with(|| self.words().cmp(other.words()))
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Token::parse(s)
    }
}

impl From<u32> for Token {
    fn from(hash: u32) -> Self {
        Token::from_u32(hash)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.signum < 0 {
            f.write_str("-")?;
        }
        write!(f, "{}", self.magnitude())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self)
    }
}
