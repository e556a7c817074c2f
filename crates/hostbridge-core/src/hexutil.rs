//! `0x`-prefixed hex helpers for variable-length byte strings.

use crate::error::{CoreError, Result};

/// Encode bytes as lower-case hex with a `0x` prefix.
pub fn encode_to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode `0x`-prefixed hex. The prefix is mandatory; `"0x"` alone is empty.
pub fn decode_from_hex(text: &str) -> Result<Vec<u8>> {
    if text.is_empty() {
        return Err(CoreError::EmptyHex);
    }
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .ok_or(CoreError::MissingHexPrefix)?;
    if digits.len() % 2 != 0 {
        return Err(CoreError::OddHexLength);
    }
    Ok(hex::decode(digits)?)
}

/// Strip an optional `0x` from lower-cased text and decode exactly `N` bytes.
pub(crate) fn decode_fixed<const N: usize>(kind: &'static str, text: &str) -> Result<[u8; N]> {
    let lowered = text.to_lowercase();
    let digits = lowered.strip_prefix("0x").unwrap_or(&lowered);
    if digits.len() != 2 * N {
        return Err(CoreError::InvalidHexLength {
            kind,
            expected: 2 * N,
            actual: digits.len(),
        });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out)?;
    Ok(out)
}

/// Serde adapter storing byte vectors as `0x` hex strings.
pub mod serde_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_to_hex(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::decode_from_hex(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_to_hex() {
        assert_eq!(encode_to_hex(&[]), "0x");
        assert_eq!(encode_to_hex(&[0xde, 0xad, 0xBE, 0xef]), "0xdeadbeef");
    }

    #[test]
    fn test_decode_from_hex() {
        assert_eq!(decode_from_hex("0x").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_from_hex("0X0aFF").unwrap(), vec![0x0a, 0xff]);
        assert!(matches!(decode_from_hex(""), Err(CoreError::EmptyHex)));
        assert!(matches!(decode_from_hex("abcd"), Err(CoreError::MissingHexPrefix)));
        assert!(matches!(decode_from_hex("0xabc"), Err(CoreError::OddHexLength)));
        assert!(matches!(
            decode_from_hex("0xzz"),
            Err(CoreError::InvalidHexEncoding(_))
        ));
    }

    #[test]
    fn test_decode_fixed_prefix_optional() {
        let a: [u8; 2] = decode_fixed("test", "0xABcd").unwrap();
        let b: [u8; 2] = decode_fixed("test", "abcd").unwrap();
        assert_eq!(a, [0xab, 0xcd]);
        assert_eq!(a, b);
    }
}
