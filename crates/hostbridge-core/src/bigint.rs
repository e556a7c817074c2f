//! Arbitrary-precision signed integers.
//!
//! [`BigInt::set_string`] keeps its historical contract: unparsable input is
//! ignored and the value stays as it was. Callers that need to know use
//! [`BigInt::parse`].

use num_bigint::{BigUint, Sign};
use num_traits::{Signed, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

use crate::error::{CoreError, Result};

/// A signed big integer.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BigInt(num_bigint::BigInt);

impl BigInt {
    /// Create from a signed 64-bit integer.
    pub fn new(x: i64) -> Self {
        Self(num_bigint::BigInt::from(x))
    }

    /// Create from an unsigned 64-bit integer.
    pub fn from_u64(x: u64) -> Self {
        Self(num_bigint::BigInt::from(x))
    }

    /// Parse `text` in `base`, reporting failure.
    ///
    /// Accepts an optional leading sign. Base 0 selects the radix from the
    /// prefix (`0x`, `0o`, `0b`, a bare leading `0` for octal, otherwise
    /// decimal) and allows `_` separators. Supported explicit bases are 2..=36.
    pub fn parse(text: &str, base: u32) -> Result<Self> {
        parse_radix(text, base)
            .map(Self)
            .ok_or_else(|| CoreError::InvalidNumber {
                text: text.to_string(),
                base,
            })
    }

    /// Big-endian magnitude, without sign. Zero yields an empty vector.
    pub fn bytes(&self) -> Vec<u8> {
        if self.0.is_zero() {
            return Vec::new();
        }
        self.0.magnitude().to_bytes_be()
    }

    /// Interpret `buf` as a big-endian unsigned magnitude.
    pub fn set_bytes(&mut self, buf: &[u8]) {
        self.0 = num_bigint::BigInt::from_bytes_be(Sign::Plus, buf);
    }

    /// Low 64 bits of the magnitude with the sign applied, wrapping.
    pub fn get_int64(&self) -> i64 {
        let low = self.low_u64() as i64;
        if self.0.is_negative() {
            low.wrapping_neg()
        } else {
            low
        }
    }

    pub fn set_int64(&mut self, x: i64) {
        self.0 = num_bigint::BigInt::from(x);
    }

    /// Low 64 bits of the magnitude, ignoring the sign.
    pub fn low_u64(&self) -> u64 {
        self.0.magnitude().iter_u64_digits().next().unwrap_or(0)
    }

    /// -1, 0 or 1.
    pub fn sign(&self) -> i32 {
        match self.0.sign() {
            Sign::Minus => -1,
            Sign::NoSign => 0,
            Sign::Plus => 1,
        }
    }

    /// Parse `text` in `base`; on failure the value is left unchanged.
    pub fn set_string(&mut self, text: &str, base: u32) {
        if let Some(value) = parse_radix(text, base) {
            self.0 = value;
        }
    }

    /// Format in `base` (2..=36), lower-case digits, `-` for negatives.
    pub fn get_string(&self, base: u32) -> Result<String> {
        if !(2..=36).contains(&base) {
            return Err(CoreError::InvalidBase(base));
        }
        Ok(self.0.to_str_radix(base))
    }

    /// Borrow the underlying integer.
    pub fn as_inner(&self) -> &num_bigint::BigInt {
        &self.0
    }
}

fn parse_radix(text: &str, base: u32) -> Option<num_bigint::BigInt> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = match base {
        0 => {
            let (radix, digits, prefixed) = detect_radix(body);
            (radix, strip_separators(digits, prefixed)?)
        }
        _ if body.contains('_') => return None,
        _ => (base, Cow::Borrowed(body)),
    };
    if !(2..=36).contains(&radix) || digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = BigUint::parse_bytes(digits.as_bytes(), radix)?;
    let sign = if negative { Sign::Minus } else { Sign::Plus };
    Some(num_bigint::BigInt::from_biguint(sign, magnitude))
}

/// Radix, remaining digits, and whether a base prefix was consumed.
fn detect_radix(body: &str) -> (u32, &str, bool) {
    let lower = body.get(..2).map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("0x") => (16, &body[2..], true),
        Some("0o") => (8, &body[2..], true),
        Some("0b") => (2, &body[2..], true),
        _ if body.len() > 1 && body.starts_with('0') => (8, &body[1..], true),
        _ => (10, body, false),
    }
}

/// Drop `_` separators. Each must sit between two digits, or right after a
/// base prefix.
fn strip_separators(digits: &str, prefixed: bool) -> Option<Cow<'_, str>> {
    if !digits.contains('_') {
        return Some(Cow::Borrowed(digits));
    }
    if digits.ends_with('_') {
        return None;
    }
    let mut after_digit = prefixed;
    let mut out = String::with_capacity(digits.len());
    for c in digits.chars() {
        if c == '_' {
            if !after_digit {
                return None;
            }
            after_digit = false;
        } else {
            out.push(c);
            after_digit = true;
        }
    }
    Some(Cow::Owned(out))
}

impl From<i64> for BigInt {
    fn from(x: i64) -> Self {
        Self::new(x)
    }
}

impl From<num_bigint::BigInt> for BigInt {
    fn from(x: num_bigint::BigInt) -> Self {
        Self(x)
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigInt({})", self.0)
    }
}

impl Serialize for BigInt {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_str_radix(10))
    }
}

impl<'de> Deserialize<'de> for BigInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text, 10).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bytes_are_unsigned_magnitude() {
        assert_eq!(BigInt::new(0).bytes(), Vec::<u8>::new());
        assert_eq!(BigInt::new(256).bytes(), vec![0x01, 0x00]);
        assert_eq!(BigInt::new(-256).bytes(), vec![0x01, 0x00]);
    }

    #[test]
    fn test_set_bytes() {
        let mut x = BigInt::new(-7);
        x.set_bytes(&[0xff, 0xff]);
        assert_eq!(x.get_int64(), 65535);
        assert_eq!(x.sign(), 1);
        x.set_bytes(&[]);
        assert_eq!(x.sign(), 0);
    }

    #[test]
    fn test_sign() {
        assert_eq!(BigInt::new(-3).sign(), -1);
        assert_eq!(BigInt::new(0).sign(), 0);
        assert_eq!(BigInt::new(3).sign(), 1);
    }

    #[test]
    fn test_set_string_bad_input_is_noop() {
        let mut x = BigInt::new(42);
        x.set_string("not a number", 10);
        assert_eq!(x.get_int64(), 42);
        x.set_string("ff", 10);
        assert_eq!(x.get_int64(), 42);
        x.set_string("ff", 99);
        assert_eq!(x.get_int64(), 42);
        x.set_string("ff", 16);
        assert_eq!(x.get_int64(), 255);
    }

    #[test]
    fn test_parse_reports_failure() {
        assert!(matches!(
            BigInt::parse("12a", 10),
            Err(CoreError::InvalidNumber { base: 10, .. })
        ));
        assert!(BigInt::parse("", 10).is_err());
        assert!(BigInt::parse("-", 10).is_err());
        assert!(BigInt::parse("--1", 10).is_err());
        assert!(BigInt::parse("1_000", 10).is_err());
    }

    #[test]
    fn test_parse_base_zero_prefixes() {
        assert_eq!(BigInt::parse("0x1F", 0).unwrap().get_int64(), 31);
        assert_eq!(BigInt::parse("0b101", 0).unwrap().get_int64(), 5);
        assert_eq!(BigInt::parse("0o17", 0).unwrap().get_int64(), 15);
        assert_eq!(BigInt::parse("017", 0).unwrap().get_int64(), 15);
        assert_eq!(BigInt::parse("-1_000", 0).unwrap().get_int64(), -1000);
        assert_eq!(BigInt::parse("0", 0).unwrap().sign(), 0);
    }

    #[test]
    fn test_base_zero_separators() {
        assert_eq!(BigInt::parse("0x_1f", 0).unwrap().get_int64(), 31);
        assert_eq!(BigInt::parse("0_17", 0).unwrap().get_int64(), 15);
        assert_eq!(BigInt::parse("1_000_000", 0).unwrap().get_int64(), 1_000_000);
        for bad in ["1__2", "1_", "_1", "0x_", "0x__1", "0b1_"] {
            assert!(BigInt::parse(bad, 0).is_err(), "{bad}");
        }

        let mut x = BigInt::new(5);
        x.set_string("1__2", 0);
        assert_eq!(x.get_int64(), 5);
        x.set_string("0x_1f", 0);
        assert_eq!(x.get_int64(), 31);
        x.set_string("1_2", 10);
        assert_eq!(x.get_int64(), 31);
    }

    #[test]
    fn test_get_string_radix() {
        let x = BigInt::new(-255);
        assert_eq!(x.get_string(16).unwrap(), "-ff");
        assert_eq!(x.get_string(10).unwrap(), "-255");
        assert_eq!(BigInt::new(5).get_string(2).unwrap(), "101");
        assert!(matches!(x.get_string(1), Err(CoreError::InvalidBase(1))));
        assert!(matches!(x.get_string(37), Err(CoreError::InvalidBase(37))));
    }

    #[test]
    fn test_get_int64_wraps_large_values() {
        let mut x = BigInt::default();
        x.set_string("18446744073709551617", 10); // 2^64 + 1
        assert_eq!(x.get_int64(), 1);
        assert_eq!(x.low_u64(), 1);

        let mut y = BigInt::default();
        y.set_string("-18446744073709551615", 10); // -(2^64 - 1)
        assert_eq!(y.low_u64(), u64::MAX);
        assert_eq!(y.get_int64(), 1);
    }

    #[test]
    fn test_serde_decimal_string() {
        let x = BigInt::parse("-123456789012345678901234567890", 10).unwrap();
        let json = serde_json::to_string(&x).unwrap();
        assert_eq!(json, "\"-123456789012345678901234567890\"");
        let back: BigInt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, x);
    }

    proptest! {
        #[test]
        fn int64_roundtrip(x in any::<i64>()) {
            prop_assert_eq!(BigInt::new(x).get_int64(), x);
        }

        #[test]
        fn decimal_string_roundtrip(x in 0i64..=i64::MAX) {
            let text = BigInt::new(x).get_string(10).unwrap();
            let mut parsed = BigInt::default();
            parsed.set_string(&text, 10);
            prop_assert_eq!(parsed.get_int64(), x);
        }
    }
}
