//! Conversion between user-entered decimal amount text and integer cents.
//!
//! Amounts are always stored as a whole number of cents. The sign of an
//! amount is never taken from the text the user typed, it is decided by the
//! caller from the transaction type.

use std::fmt::Display;

use serde::{Serialize, Serializer};

use crate::Error;

/// Characters that are dropped from amount text before it is parsed.
const IGNORED_CHARACTERS: [char; 3] = [',', '+', '-'];

/// Normalize raw amount text before validation.
///
/// Surrounding and embedded whitespace, thousands separators and sign
/// characters are removed, and a run of consecutive decimal points is
/// collapsed into one, e.g. `" 1,234..5 "` becomes `"1234.5"`.
///
/// The result may still be invalid, use [validate_amount_text] to check it.
pub fn clean_amount_text(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());

    for character in input.trim().chars() {
        if character.is_whitespace() || IGNORED_CHARACTERS.contains(&character) {
            continue;
        }

        if character == '.' && cleaned.ends_with('.') {
            continue;
        }

        cleaned.push(character);
    }

    cleaned
}

/// Check that cleaned amount text only contains digits and at most one
/// decimal point.
///
/// # Errors
///
/// Returns:
/// - [Error::EmptyAmount] if `cleaned` is empty or just a decimal point.
/// - [Error::InvalidAmount] if `cleaned` contains any other character, or
///   more than one decimal point.
pub fn validate_amount_text(cleaned: &str) -> Result<(), Error> {
    if cleaned.is_empty() || cleaned == "." {
        return Err(Error::EmptyAmount);
    }

    let mut decimal_points = 0;

    for character in cleaned.chars() {
        match character {
            '0'..='9' => {}
            '.' => decimal_points += 1,
            _ => return Err(Error::InvalidAmount),
        }
    }

    if decimal_points > 1 {
        return Err(Error::InvalidAmount);
    }

    Ok(())
}

/// Parse amount text into a non-negative number of cents.
///
/// Only the third fractional digit is used for rounding: `"1.234"` is 123
/// cents, `"1.235"` is 124 cents, and `"1.2349"` is still 123 cents.
///
/// # Errors
///
/// Returns [Error::EmptyAmount] or [Error::InvalidAmount] if the cleaned text
/// is not a number, and [Error::InvalidAmount] if the amount does not fit in
/// a 64-bit integer.
pub fn parse_to_cents(raw: &str) -> Result<i64, Error> {
    let cleaned = clean_amount_text(raw);
    validate_amount_text(&cleaned)?;

    let (integer_part, fractional_part) = match cleaned.split_once('.') {
        Some((integer_part, fractional_part)) => (integer_part, fractional_part),
        None => (cleaned.as_str(), ""),
    };
    let integer_part = if integer_part.is_empty() {
        "0"
    } else {
        integer_part
    };

    let round_up = matches!(fractional_part.as_bytes().get(2), Some(b'5'..=b'9'));
    let fractional_part = format!("{:0<2}", fractional_part.get(..2).unwrap_or(fractional_part));

    let cents: i64 = format!("{integer_part}{fractional_part}")
        .parse()
        .map_err(|_| Error::InvalidAmount)?;

    if round_up {
        cents.checked_add(1).ok_or(Error::InvalidAmount)
    } else {
        Ok(cents)
    }
}

/// Render cents as decimal text with exactly two fractional digits.
///
/// Negative amounts always carry a leading minus sign, so `-5` is rendered as
/// `"-0.05"`.
pub fn cents_to_display_text(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let magnitude = cents.unsigned_abs();

    format!("{sign}{}.{:02}", magnitude / 100, magnitude % 100)
}

/// An exact amount of money stored as a whole number of cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    /// Create an amount from a known number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Parse user-entered text into a non-negative amount.
    ///
    /// # Errors
    ///
    /// See [parse_to_cents].
    pub fn parse_unsigned(text: &str) -> Result<Self, Error> {
        parse_to_cents(text).map(Self)
    }

    /// The amount in cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// The amount without its sign.
    ///
    /// Saturates at [i64::MAX] for [i64::MIN] cents.
    pub fn abs(&self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// The amount with its sign flipped.
    pub fn negate(&self) -> Self {
        Self(self.0.saturating_neg())
    }

    /// Whether the amount is exactly zero cents.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&cents_to_display_text(self.0))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod clean_amount_text_tests {
    use super::clean_amount_text;

    #[test]
    fn trims_whitespace() {
        assert_eq!(clean_amount_text(" 123.45 "), "123.45");
        assert_eq!(clean_amount_text("\t123.45\n"), "123.45");
    }

    #[test]
    fn removes_thousands_separators_and_spaces() {
        assert_eq!(clean_amount_text("1,234.56"), "1234.56");
        assert_eq!(clean_amount_text("1 234 567.89"), "1234567.89");
    }

    #[test]
    fn removes_sign_characters() {
        assert_eq!(clean_amount_text("+123.45"), "123.45");
        assert_eq!(clean_amount_text("-123.45"), "123.45");
        assert_eq!(clean_amount_text("-+-"), "");
    }

    #[test]
    fn collapses_consecutive_decimal_points() {
        assert_eq!(clean_amount_text("123..45"), "123.45");
        assert_eq!(clean_amount_text("123...45"), "123.45");
    }

    #[test]
    fn keeps_separated_decimal_points_for_validation() {
        assert_eq!(clean_amount_text("12.34.56"), "12.34.56");
    }

    #[test]
    fn keeps_leading_zeros() {
        assert_eq!(clean_amount_text("000123.45"), "000123.45");
    }

    #[test]
    fn empty_and_lone_point_pass_through() {
        assert_eq!(clean_amount_text(""), "");
        assert_eq!(clean_amount_text("."), ".");
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "",
            ".",
            "..",
            " 1,234..5 ",
            "-+12 . . 3",
            "12.34.56",
            "abc",
            "1,,2..3..4",
            "  -0.05",
            "9 9 9 . 9 9 9",
        ];

        for input in inputs {
            let once = clean_amount_text(input);
            let twice = clean_amount_text(&once);

            assert_eq!(once, twice, "cleaning {input:?} is not idempotent");
        }
    }
}



#[cfg(test)]
mod cents_to_display_text_tests {
    use super::{Amount, cents_to_display_text};

    #[test]
    fn renders_two_fractional_digits() {
        assert_eq!(cents_to_display_text(12345), "123.45");
        assert_eq!(cents_to_display_text(0), "0.00");
        assert_eq!(cents_to_display_text(5), "0.05");
        assert_eq!(cents_to_display_text(50), "0.50");
        assert_eq!(cents_to_display_text(123456789), "1234567.89");
    }

    #[test]
    fn negative_amounts_keep_their_sign() {
        assert_eq!(cents_to_display_text(-12345), "-123.45");
        assert_eq!(cents_to_display_text(-5), "-0.05");
        assert_eq!(cents_to_display_text(-99), "-0.99");
        assert_eq!(cents_to_display_text(-100), "-1.00");
    }

    #[test]
    fn handles_extreme_values() {
        assert_eq!(cents_to_display_text(i64::MAX), "92233720368547758.07");
        assert_eq!(cents_to_display_text(i64::MIN), "-92233720368547758.08");
    }

    #[test]
    fn amount_displays_and_serializes_as_text() {
        let amount = Amount::from_cents(-2220);

        assert_eq!(amount.to_string(), "-22.20");
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"-22.20\"");
    }
}
