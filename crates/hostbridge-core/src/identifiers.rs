//! Fixed-length identifiers.
//!
//! Every identifier is a byte array of a domain-mandated length. Construction
//! and in-place mutation validate the length; a failed mutation leaves the
//! previous value untouched.
//!
//! Hex output is always lower-case with a `0x` prefix. Hex input is
//! case-insensitive and the prefix is optional.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::hexutil::decode_fixed;

macro_rules! fixed_identifier {
    ($(#[$meta:meta])* $name:ident, $len:expr, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Length in bytes.
            pub const LENGTH: usize = $len;

            /// The all-zero value.
            pub const ZERO: Self = Self([0u8; $len]);

            /// Construct from a byte slice of exactly [`Self::LENGTH`] bytes.
            pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
                let mut out = Self::ZERO;
                out.set_bytes(bytes)?;
                Ok(out)
            }

            /// Construct from hex text, `0x` optional.
            pub fn from_hex(text: &str) -> Result<Self> {
                let mut out = Self::ZERO;
                out.set_hex(text)?;
                Ok(out)
            }

            /// Overwrite from a byte slice of exactly [`Self::LENGTH`] bytes.
            pub fn set_bytes(&mut self, bytes: &[u8]) -> Result<()> {
                if bytes.len() != $len {
                    return Err(CoreError::InvalidLength {
                        kind: $label,
                        expected: $len,
                        actual: bytes.len(),
                    });
                }
                self.0.copy_from_slice(bytes);
                Ok(())
            }

            /// Overwrite from hex text, `0x` optional.
            pub fn set_hex(&mut self, text: &str) -> Result<()> {
                self.0 = decode_fixed::<$len>($label, text)?;
                Ok(())
            }

            /// Copy of the raw bytes.
            pub fn bytes(&self) -> Vec<u8> {
                self.0.to_vec()
            }

            /// Borrow the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// `0x`-prefixed lower-case hex.
            pub fn hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ZERO
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let hex = self.hex();
                write!(f, "{}({}..)", stringify!($name), &hex[..hex.len().min(18)])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.hex())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self> {
                Self::from_hex(s)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = CoreError;

            fn try_from(slice: &[u8]) -> Result<Self> {
                Self::from_bytes(slice)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                Self::from_hex(&text).map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_identifier!(
    /// A 32-byte hash.
    Hash, 32, "hash"
);

fixed_identifier!(
    /// A 20-byte account address.
    Address, 20, "address"
);

fixed_identifier!(
    /// An 8-byte block nonce.
    Nonce, 8, "nonce"
);

fixed_identifier!(
    /// A 256-byte (2048-bit) log bloom filter.
    Bloom, 256, "bloom"
);
