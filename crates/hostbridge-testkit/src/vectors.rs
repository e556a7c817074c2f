//! Golden vectors for value conversions.
//!
//! These pin the exact hex forms and the silent narrowing behaviour hosts
//! rely on, so a change to either shows up as a failing vector.

use hostbridge_core::{BigInt, BigInts, CoreError, Hash, Interface};

/// A hex decoding case for [`Hash::from_hex`].
#[derive(Debug, Clone)]
pub struct HexVector {
    pub name: &'static str,
    pub input: &'static str,
    /// Canonical output, or `None` if decoding must fail.
    pub expected: Option<&'static str>,
}

/// Hex vectors for 32-byte hashes.
pub fn hex_vectors() -> Vec<HexVector> {
    vec![
        HexVector {
            name: "prefixed lower-case",
            input: "0x00000000000000000000000000000000000000000000000000000000000000ff",
            expected: Some("0x00000000000000000000000000000000000000000000000000000000000000ff"),
        },
        HexVector {
            name: "unprefixed upper-case",
            input: "DEADBEEF00000000000000000000000000000000000000000000000000000000",
            expected: Some("0xdeadbeef00000000000000000000000000000000000000000000000000000000"),
        },
        HexVector {
            name: "upper-case prefix",
            input: "0XABCDEF0000000000000000000000000000000000000000000000000000000000",
            expected: Some("0xabcdef0000000000000000000000000000000000000000000000000000000000"),
        },
        HexVector {
            name: "too short",
            input: "0xabcd",
            expected: None,
        },
        HexVector {
            name: "too long",
            input: "0x0000000000000000000000000000000000000000000000000000000000000000aa",
            expected: None,
        },
        HexVector {
            name: "non-hex digit",
            input: "0xzz000000000000000000000000000000000000000000000000000000000000",
            expected: None,
        },
    ]
}

/// A narrowing case: a decimal value stored through a fixed-width setter.
#[derive(Debug, Clone)]
pub struct NarrowingVector {
    pub name: &'static str,
    pub decimal: &'static str,
    pub width: u32,
    pub signed: bool,
    /// The value read back, widened to a decimal string.
    pub expected: &'static str,
}

/// Narrowing vectors. Unsigned setters keep the low bits of the magnitude;
/// signed sequence setters keep the low bits of the wrapped `i64`.
pub fn narrowing_vectors() -> Vec<NarrowingVector> {
    vec![
        NarrowingVector {
            name: "uint8 wraps at 256",
            decimal: "256",
            width: 8,
            signed: false,
            expected: "0",
        },
        NarrowingVector {
            name: "uint8 keeps low byte",
            decimal: "300",
            width: 8,
            signed: false,
            expected: "44",
        },
        NarrowingVector {
            name: "uint16 ignores sign",
            decimal: "-1",
            width: 16,
            signed: false,
            expected: "1",
        },
        NarrowingVector {
            name: "uint64 drops bits above 64",
            decimal: "18446744073709551617",
            width: 64,
            signed: false,
            expected: "1",
        },
        NarrowingVector {
            name: "int8 wraps to negative",
            decimal: "128",
            width: 8,
            signed: true,
            expected: "-128",
        },
        NarrowingVector {
            name: "int16 keeps negative",
            decimal: "-2",
            width: 16,
            signed: true,
            expected: "-2",
        },
        NarrowingVector {
            name: "int32 wraps large magnitude",
            decimal: "4294967297",
            width: 32,
            signed: true,
            expected: "1",
        },
    ]
}

/// Store `vector.decimal` through the matching setter and read it back.
pub fn apply_narrowing(vector: &NarrowingVector) -> Result<String, CoreError> {
    let value = BigInt::parse(vector.decimal, 10)?;
    let mut iface = Interface::new();
    let read = if vector.signed {
        let seq = BigInts::from(vec![value]);
        match vector.width {
            8 => iface.set_int8s(&seq),
            16 => iface.set_int16s(&seq),
            32 => iface.set_int32s(&seq),
            _ => iface.set_int64s(&seq),
        }
        let widened = match vector.width {
            8 => iface.get_int8s()?,
            16 => iface.get_int16s()?,
            32 => iface.get_int32s()?,
            _ => iface.get_int64s()?,
        };
        widened.get(0)?
    } else {
        match vector.width {
            8 => iface.set_uint8(&value),
            16 => iface.set_uint16(&value),
            32 => iface.set_uint32(&value),
            _ => iface.set_uint64(&value),
        }
        match vector.width {
            8 => iface.get_uint8()?,
            16 => iface.get_uint16()?,
            32 => iface.get_uint32()?,
            _ => iface.get_uint64()?,
        }
    };
    read.get_string(10)
}

/// Check every vector, returning the names of those that failed.
pub fn verify_all_vectors() -> Vec<&'static str> {
    let mut failed = Vec::new();
    for v in hex_vectors() {
        let actual = Hash::from_hex(v.input).ok().map(|h| h.hex());
        if actual.as_deref() != v.expected {
            failed.push(v.name);
        }
    }
    for v in narrowing_vectors() {
        if apply_narrowing(&v).ok().as_deref() != Some(v.expected) {
            failed.push(v.name);
        }
    }
    failed
}
