//! Decimal token parsing.
//!
//! Digits are consumed in groups of nine and folded into a little-endian word
//! buffer with a radix multiply-add, so values wider than one word parse
//! without an intermediate wide integer.

use super::{Token, TokenError, MAX_WORDS};

const DIGITS_PER_WORD: usize = 9;
const WORD_RADIX: u64 = 1_000_000_000;

pub(super) fn parse_decimal(s: &str) -> Result<Token, TokenError> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if digits.is_empty() {
        return Err(TokenError::Empty);
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TokenError::Malformed(s.to_owned()));
    }

    let mut acc = [0u32; MAX_WORDS];
    let digits = digits.as_bytes();
    let mut first = digits.len() % DIGITS_PER_WORD;
    if first == 0 {
        first = DIGITS_PER_WORD;
    }
    add_next_word(&mut acc, group_value(&digits[..first]))?;
    for group in digits[first..].chunks(DIGITS_PER_WORD) {
        add_next_word(&mut acc, group_value(group))?;
    }

    Ok(Token::from_le_words(negative, acc))
}

/// Value of at most nine ASCII digits.
fn group_value(group: &[u8]) -> u32 {
    group
        .iter()
        .fold(0u32, |value, b| value * 10 + u32::from(b - b'0'))
}

/// `acc = acc * 10^9 + next`, failing if the result needs a fifth word.
fn add_next_word(acc: &mut [u32; MAX_WORDS], next: u32) -> Result<(), TokenError> {
    let mut carry = u64::from(next);
    for word in acc.iter_mut() {
        let product = u64::from(*word) * WORD_RADIX + carry;
        *word = product as u32;
        carry = product >> 32;
    }
    if carry != 0 {
        return Err(TokenError::Overflow);
    }
    Ok(())
}
