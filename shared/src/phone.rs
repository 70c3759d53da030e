//! Phone numbers entered through the `+(999) 99 999-99-99` input mask.

use thiserror::Error;

/// Length of a fully typed masked number, e.g. `+(998) 90 123-45-67`.
pub const MASKED_PHONE_LEN: usize = 19;

/// Prefix the input mask starts with before the user types anything.
pub const DEFAULT_PHONE_PREFIX: &str = "+(998)";

const PHONE_DIGITS: usize = 12;

/// Why a phone number was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    /// The mask is not filled in.
    #[error("phone number is incomplete")]
    Incomplete,
    /// Wrong number of digits after stripping the mask.
    #[error("phone number has {0} digits, expected {PHONE_DIGITS}")]
    DigitCount(usize),
}

/// Whether every position of the mask has been typed.
pub fn is_complete(masked: &str) -> bool {
    masked.chars().count() >= MASKED_PHONE_LEN
}

/// `+(998) 90 123-45-67` -> `+998901234567`. Already-normalized input is
/// accepted as-is.
pub fn normalize(input: &str) -> Result<String, PhoneError> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(PhoneError::Incomplete);
    }
    if digits.len() != PHONE_DIGITS {
        return Err(PhoneError::DigitCount(digits.len()));
    }
    Ok(format!("+{digits}"))
}

/// Inverse of [`normalize`], used to prefill the masked input.
pub fn to_masked(normalized: &str) -> Option<String> {
    let digits: Vec<char> = normalized.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != PHONE_DIGITS {
        return None;
    }
    let part = |range: std::ops::Range<usize>| digits[range].iter().collect::<String>();
    Some(format!(
        "+({}) {} {}-{}-{}",
        part(0..3),
        part(3..5),
        part(5..8),
        part(8..10),
        part(10..12)
    ))
}

/// Compares two numbers regardless of masking.
pub fn same_number(a: &str, b: &str) -> bool {
    let digits = |s: &str| s.chars().filter(char::is_ascii_digit).collect::<String>();
    digits(a) == digits(b)
}
