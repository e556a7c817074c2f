//! Dynamic values for call arguments and results.
//!
//! An [`Interface`] boxes exactly one value from a closed set of kinds. The
//! caller tracks what it stored: a getter for a different kind returns
//! [`CoreError::TypeMismatch`] instead of reinterpreting the box.
//!
//! Narrowing setters (`set_uint8` from a [`BigInt`], `set_int8s` from
//! [`BigInts`], ...) keep only the low bits and never report overflow.
//! Existing callers depend on that wraparound bit for bit.

use std::fmt;

use crate::bigint::BigInt;
use crate::error::{CoreError, Result};
use crate::identifiers::{Address, Hash};
use crate::sequence::{check_index, Addresses, BigInts, Binaries, Bools, Hashes, Strings};

/// The stored payload of an [`Interface`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Unset,
    Bool(bool),
    Bools(Vec<bool>),
    String(String),
    Strings(Vec<String>),
    Binary(Vec<u8>),
    Binaries(Vec<Vec<u8>>),
    Address(Address),
    Addresses(Vec<Address>),
    Hash(Hash),
    Hashes(Vec<Hash>),
    Int8(i8),
    Int8s(Vec<i8>),
    Int16(i16),
    Int16s(Vec<i16>),
    Int32(i32),
    Int32s(Vec<i32>),
    Int64(i64),
    Int64s(Vec<i64>),
    Uint8(u8),
    Uint8s(Vec<u8>),
    Uint16(u16),
    Uint16s(Vec<u16>),
    Uint32(u32),
    Uint32s(Vec<u32>),
    Uint64(u64),
    Uint64s(Vec<u64>),
    BigInt(BigInt),
    BigInts(Vec<BigInt>),
}

/// The logical kind of a [`Value`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Unset,
    Bool,
    Bools,
    String,
    Strings,
    Binary,
    Binaries,
    Address,
    Addresses,
    Hash,
    Hashes,
    Int8,
    Int8s,
    Int16,
    Int16s,
    Int32,
    Int32s,
    Int64,
    Int64s,
    Uint8,
    Uint8s,
    Uint16,
    Uint16s,
    Uint32,
    Uint32s,
    Uint64,
    Uint64s,
    BigInt,
    BigInts,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Unset => "unset",
            ValueKind::Bool => "bool",
            ValueKind::Bools => "bool[]",
            ValueKind::String => "string",
            ValueKind::Strings => "string[]",
            ValueKind::Binary => "bytes",
            ValueKind::Binaries => "bytes[]",
            ValueKind::Address => "address",
            ValueKind::Addresses => "address[]",
            ValueKind::Hash => "hash",
            ValueKind::Hashes => "hash[]",
            ValueKind::Int8 => "int8",
            ValueKind::Int8s => "int8[]",
            ValueKind::Int16 => "int16",
            ValueKind::Int16s => "int16[]",
            ValueKind::Int32 => "int32",
            ValueKind::Int32s => "int32[]",
            ValueKind::Int64 => "int64",
            ValueKind::Int64s => "int64[]",
            ValueKind::Uint8 => "uint8",
            ValueKind::Uint8s => "uint8[]",
            ValueKind::Uint16 => "uint16",
            ValueKind::Uint16s => "uint16[]",
            ValueKind::Uint32 => "uint32",
            ValueKind::Uint32s => "uint32[]",
            ValueKind::Uint64 => "uint64",
            ValueKind::Uint64s => "uint64[]",
            ValueKind::BigInt => "bigint",
            ValueKind::BigInts => "bigint[]",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Unset => ValueKind::Unset,
            Value::Bool(_) => ValueKind::Bool,
            Value::Bools(_) => ValueKind::Bools,
            Value::String(_) => ValueKind::String,
            Value::Strings(_) => ValueKind::Strings,
            Value::Binary(_) => ValueKind::Binary,
            Value::Binaries(_) => ValueKind::Binaries,
            Value::Address(_) => ValueKind::Address,
            Value::Addresses(_) => ValueKind::Addresses,
            Value::Hash(_) => ValueKind::Hash,
            Value::Hashes(_) => ValueKind::Hashes,
            Value::Int8(_) => ValueKind::Int8,
            Value::Int8s(_) => ValueKind::Int8s,
            Value::Int16(_) => ValueKind::Int16,
            Value::Int16s(_) => ValueKind::Int16s,
            Value::Int32(_) => ValueKind::Int32,
            Value::Int32s(_) => ValueKind::Int32s,
            Value::Int64(_) => ValueKind::Int64,
            Value::Int64s(_) => ValueKind::Int64s,
            Value::Uint8(_) => ValueKind::Uint8,
            Value::Uint8s(_) => ValueKind::Uint8s,
            Value::Uint16(_) => ValueKind::Uint16,
            Value::Uint16s(_) => ValueKind::Uint16s,
            Value::Uint32(_) => ValueKind::Uint32,
            Value::Uint32s(_) => ValueKind::Uint32s,
            Value::Uint64(_) => ValueKind::Uint64,
            Value::Uint64s(_) => ValueKind::Uint64s,
            Value::BigInt(_) => ValueKind::BigInt,
            Value::BigInts(_) => ValueKind::BigInts,
        }
    }

    /// The zero value of `kind`, used for output placeholders.
    pub fn zero(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Unset => Value::Unset,
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Bools => Value::Bools(Vec::new()),
            ValueKind::String => Value::String(String::new()),
            ValueKind::Strings => Value::Strings(Vec::new()),
            ValueKind::Binary => Value::Binary(Vec::new()),
            ValueKind::Binaries => Value::Binaries(Vec::new()),
            ValueKind::Address => Value::Address(Address::ZERO),
            ValueKind::Addresses => Value::Addresses(Vec::new()),
            ValueKind::Hash => Value::Hash(Hash::ZERO),
            ValueKind::Hashes => Value::Hashes(Vec::new()),
            ValueKind::Int8 => Value::Int8(0),
            ValueKind::Int8s => Value::Int8s(Vec::new()),
            ValueKind::Int16 => Value::Int16(0),
            ValueKind::Int16s => Value::Int16s(Vec::new()),
            ValueKind::Int32 => Value::Int32(0),
            ValueKind::Int32s => Value::Int32s(Vec::new()),
            ValueKind::Int64 => Value::Int64(0),
            ValueKind::Int64s => Value::Int64s(Vec::new()),
            ValueKind::Uint8 => Value::Uint8(0),
            ValueKind::Uint8s => Value::Uint8s(Vec::new()),
            ValueKind::Uint16 => Value::Uint16(0),
            ValueKind::Uint16s => Value::Uint16s(Vec::new()),
            ValueKind::Uint32 => Value::Uint32(0),
            ValueKind::Uint32s => Value::Uint32s(Vec::new()),
            ValueKind::Uint64 => Value::Uint64(0),
            ValueKind::Uint64s => Value::Uint64s(Vec::new()),
            ValueKind::BigInt => Value::BigInt(BigInt::default()),
            ValueKind::BigInts => Value::BigInts(Vec::new()),
        }
    }
}

/// Unbox the payload of `$variant`, cloning it, or report a mismatch.
macro_rules! unbox {
    ($self:ident, $variant:ident) => {
        match &$self.value {
            Value::$variant(v) => Ok(v.clone()),
            other => Err(CoreError::TypeMismatch {
                requested: ValueKind::$variant,
                stored: other.kind(),
            }),
        }
    };
}

macro_rules! default_setters {
    ($($fn_name:ident => $kind:ident),* $(,)?) => {
        $(
            pub fn $fn_name(&mut self) {
                self.value = Value::zero(ValueKind::$kind);
            }
        )*
    };
}

/// A boxed dynamic value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Interface {
    value: Value,
}

impl Interface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Mutable access for a callee filling an output placeholder.
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Setters
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_bool(&mut self, b: bool) {
        self.value = Value::Bool(b);
    }

    pub fn set_bools(&mut self, bools: &Bools) {
        self.value = Value::Bools(bools.as_slice().to_vec());
    }

    pub fn set_string(&mut self, s: &str) {
        self.value = Value::String(s.to_string());
    }

    pub fn set_strings(&mut self, strings: &Strings) {
        self.value = Value::Strings(strings.as_slice().to_vec());
    }

    pub fn set_binary(&mut self, binary: &[u8]) {
        self.value = Value::Binary(binary.to_vec());
    }

    pub fn set_binaries(&mut self, binaries: &Binaries) {
        self.value = Value::Binaries(binaries.as_slice().to_vec());
    }

    pub fn set_address(&mut self, address: &Address) {
        self.value = Value::Address(*address);
    }

    pub fn set_addresses(&mut self, addresses: &Addresses) {
        self.value = Value::Addresses(addresses.as_slice().to_vec());
    }

    pub fn set_hash(&mut self, hash: &Hash) {
        self.value = Value::Hash(*hash);
    }

    pub fn set_hashes(&mut self, hashes: &Hashes) {
        self.value = Value::Hashes(hashes.as_slice().to_vec());
    }

    pub fn set_int8(&mut self, n: i8) {
        self.value = Value::Int8(n);
    }

    pub fn set_int16(&mut self, n: i16) {
        self.value = Value::Int16(n);
    }

    pub fn set_int32(&mut self, n: i32) {
        self.value = Value::Int32(n);
    }

    pub fn set_int64(&mut self, n: i64) {
        self.value = Value::Int64(n);
    }

    pub fn set_int8s(&mut self, bigints: &BigInts) {
        self.value = Value::Int8s(bigints.iter().map(|b| b.get_int64() as i8).collect());
    }

    pub fn set_int16s(&mut self, bigints: &BigInts) {
        self.value = Value::Int16s(bigints.iter().map(|b| b.get_int64() as i16).collect());
    }

    pub fn set_int32s(&mut self, bigints: &BigInts) {
        self.value = Value::Int32s(bigints.iter().map(|b| b.get_int64() as i32).collect());
    }

    pub fn set_int64s(&mut self, bigints: &BigInts) {
        self.value = Value::Int64s(bigints.iter().map(BigInt::get_int64).collect());
    }

    pub fn set_uint8(&mut self, bigint: &BigInt) {
        self.value = Value::Uint8(bigint.low_u64() as u8);
    }

    pub fn set_uint16(&mut self, bigint: &BigInt) {
        self.value = Value::Uint16(bigint.low_u64() as u16);
    }

    pub fn set_uint32(&mut self, bigint: &BigInt) {
        self.value = Value::Uint32(bigint.low_u64() as u32);
    }

    pub fn set_uint64(&mut self, bigint: &BigInt) {
        self.value = Value::Uint64(bigint.low_u64());
    }

    pub fn set_uint8s(&mut self, bigints: &BigInts) {
        self.value = Value::Uint8s(bigints.iter().map(|b| b.low_u64() as u8).collect());
    }

    pub fn set_uint16s(&mut self, bigints: &BigInts) {
        self.value = Value::Uint16s(bigints.iter().map(|b| b.low_u64() as u16).collect());
    }

    pub fn set_uint32s(&mut self, bigints: &BigInts) {
        self.value = Value::Uint32s(bigints.iter().map(|b| b.low_u64() as u32).collect());
    }

    pub fn set_uint64s(&mut self, bigints: &BigInts) {
        self.value = Value::Uint64s(bigints.iter().map(BigInt::low_u64).collect());
    }

    pub fn set_bigint(&mut self, bigint: &BigInt) {
        self.value = Value::BigInt(bigint.clone());
    }

    pub fn set_bigints(&mut self, bigints: &BigInts) {
        self.value = Value::BigInts(bigints.as_slice().to_vec());
    }

    default_setters! {
        set_default_bool => Bool,
        set_default_bools => Bools,
        set_default_string => String,
        set_default_strings => Strings,
        set_default_binary => Binary,
        set_default_binaries => Binaries,
        set_default_address => Address,
        set_default_addresses => Addresses,
        set_default_hash => Hash,
        set_default_hashes => Hashes,
        set_default_int8 => Int8,
        set_default_int8s => Int8s,
        set_default_int16 => Int16,
        set_default_int16s => Int16s,
        set_default_int32 => Int32,
        set_default_int32s => Int32s,
        set_default_int64 => Int64,
        set_default_int64s => Int64s,
        set_default_uint8 => Uint8,
        set_default_uint8s => Uint8s,
        set_default_uint16 => Uint16,
        set_default_uint16s => Uint16s,
        set_default_uint32 => Uint32,
        set_default_uint32s => Uint32s,
        set_default_uint64 => Uint64,
        set_default_uint64s => Uint64s,
        set_default_bigint => BigInt,
        set_default_bigints => BigInts,
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Getters
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_bool(&self) -> Result<bool> {
        unbox!(self, Bool)
    }

    pub fn get_bools(&self) -> Result<Bools> {
        unbox!(self, Bools).map(Bools::from)
    }

    pub fn get_string(&self) -> Result<String> {
        unbox!(self, String)
    }

    pub fn get_strings(&self) -> Result<Strings> {
        unbox!(self, Strings).map(Strings::from)
    }

    pub fn get_binary(&self) -> Result<Vec<u8>> {
        unbox!(self, Binary)
    }

    pub fn get_binaries(&self) -> Result<Binaries> {
        unbox!(self, Binaries).map(Binaries::from)
    }

    pub fn get_address(&self) -> Result<Address> {
        unbox!(self, Address)
    }

    pub fn get_addresses(&self) -> Result<Addresses> {
        unbox!(self, Addresses).map(Addresses::from)
    }

    pub fn get_hash(&self) -> Result<Hash> {
        unbox!(self, Hash)
    }

    pub fn get_hashes(&self) -> Result<Hashes> {
        unbox!(self, Hashes).map(Hashes::from)
    }

    pub fn get_int8(&self) -> Result<i8> {
        unbox!(self, Int8)
    }

    pub fn get_int16(&self) -> Result<i16> {
        unbox!(self, Int16)
    }

    pub fn get_int32(&self) -> Result<i32> {
        unbox!(self, Int32)
    }

    pub fn get_int64(&self) -> Result<i64> {
        unbox!(self, Int64)
    }

    pub fn get_int8s(&self) -> Result<BigInts> {
        unbox!(self, Int8s).map(|v| v.into_iter().map(|n| BigInt::new(n.into())).collect())
    }

    pub fn get_int16s(&self) -> Result<BigInts> {
        unbox!(self, Int16s).map(|v| v.into_iter().map(|n| BigInt::new(n.into())).collect())
    }

    pub fn get_int32s(&self) -> Result<BigInts> {
        unbox!(self, Int32s).map(|v| v.into_iter().map(|n| BigInt::new(n.into())).collect())
    }

    pub fn get_int64s(&self) -> Result<BigInts> {
        unbox!(self, Int64s).map(|v| v.into_iter().map(BigInt::new).collect())
    }

    pub fn get_uint8(&self) -> Result<BigInt> {
        unbox!(self, Uint8).map(|n| BigInt::from_u64(n.into()))
    }

    pub fn get_uint16(&self) -> Result<BigInt> {
        unbox!(self, Uint16).map(|n| BigInt::from_u64(n.into()))
    }

    pub fn get_uint32(&self) -> Result<BigInt> {
        unbox!(self, Uint32).map(|n| BigInt::from_u64(n.into()))
    }

    pub fn get_uint64(&self) -> Result<BigInt> {
        unbox!(self, Uint64).map(BigInt::from_u64)
    }

    pub fn get_uint8s(&self) -> Result<BigInts> {
        unbox!(self, Uint8s).map(|v| v.into_iter().map(|n| BigInt::from_u64(n.into())).collect())
    }

    pub fn get_uint16s(&self) -> Result<BigInts> {
        unbox!(self, Uint16s).map(|v| v.into_iter().map(|n| BigInt::from_u64(n.into())).collect())
    }

    pub fn get_uint32s(&self) -> Result<BigInts> {
        unbox!(self, Uint32s).map(|v| v.into_iter().map(|n| BigInt::from_u64(n.into())).collect())
    }

    pub fn get_uint64s(&self) -> Result<BigInts> {
        unbox!(self, Uint64s).map(|v| v.into_iter().map(BigInt::from_u64).collect())
    }

    pub fn get_bigint(&self) -> Result<BigInt> {
        unbox!(self, BigInt)
    }

    pub fn get_bigints(&self) -> Result<BigInts> {
        unbox!(self, BigInts).map(BigInts::from)
    }
}

impl From<Value> for Interface {
    fn from(value: Value) -> Self {
        Self { value }
    }
}

/// A fixed-size argument or result list.
///
/// Arity and per-slot kinds come from an external schema such as a contract
/// method signature.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Interfaces {
    slots: Vec<Interface>,
}

impl Interfaces {
    /// `size` unset slots.
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![Interface::default(); size],
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Copy of the slot at `index`.
    pub fn get(&self, index: isize) -> Result<Interface> {
        let i = check_index(index, self.slots.len())?;
        Ok(self.slots[i].clone())
    }

    /// Overwrite the slot at `index` with a copy of `iface`.
    pub fn set(&mut self, index: isize, iface: &Interface) -> Result<()> {
        let i = check_index(index, self.slots.len())?;
        self.slots[i] = iface.clone();
        Ok(())
    }

    /// In-place access to a slot, for callees populating outputs.
    pub fn slot_mut(&mut self, index: isize) -> Result<&mut Interface> {
        let i = check_index(index, self.slots.len())?;
        Ok(&mut self.slots[i])
    }

    /// Kinds of all slots, in order.
    pub fn kinds(&self) -> Vec<ValueKind> {
        self.slots.iter().map(Interface::kind).collect()
    }

    pub fn as_slice(&self) -> &[Interface] {
        &self.slots
    }

    pub fn as_mut_slice(&mut self) -> &mut [Interface] {
        &mut self.slots
    }
}

impl From<Vec<Interface>> for Interfaces {
    fn from(slots: Vec<Interface>) -> Self {
        Self { slots }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip() {
        let addr = Address::from_bytes(&[0x5a; 20]).unwrap();
        let mut iface = Interface::new();
        iface.set_address(&addr);
        assert_eq!(iface.kind(), ValueKind::Address);
        assert_eq!(iface.get_address().unwrap(), addr);
    }

    #[test]
    fn test_type_mismatch() {
        let mut iface = Interface::new();
        iface.set_string("hello");
        let err = iface.get_bool().unwrap_err();
        assert!(matches!(
            err,
            CoreError::TypeMismatch {
                requested: ValueKind::Bool,
                stored: ValueKind::String
            }
        ));
        assert_eq!(err.to_string(), "type mismatch: requested bool, stored string");
    }

    #[test]
    fn test_unset_getter_fails() {
        let iface = Interface::new();
        assert!(matches!(
            iface.get_hash(),
            Err(CoreError::TypeMismatch {
                stored: ValueKind::Unset,
                ..
            })
        ));
    }

    #[test]
    fn test_uint_setters_truncate() {
        let mut iface = Interface::new();
        iface.set_uint8(&BigInt::new(256));
        assert_eq!(iface.get_uint8().unwrap().get_int64(), 0);

        iface.set_uint8(&BigInt::new(257));
        assert_eq!(iface.get_uint8().unwrap().get_int64(), 1);

        iface.set_uint16(&BigInt::new(70_000));
        assert_eq!(iface.get_uint16().unwrap().get_int64(), 70_000 - 65_536);

        // Magnitude is used, the sign is dropped.
        iface.set_uint32(&BigInt::new(-5));
        assert_eq!(iface.get_uint32().unwrap().get_int64(), 5);

        let mut big = BigInt::default();
        big.set_string("18446744073709551621", 10); // 2^64 + 5
        iface.set_uint64(&big);
        assert_eq!(iface.get_uint64().unwrap().get_int64(), 5);
    }

    #[test]
    fn test_int_sequence_setters_truncate() {
        let ints: BigInts = vec![BigInt::new(127), BigInt::new(128), BigInt::new(-129)].into();
        let mut iface = Interface::new();
        iface.set_int8s(&ints);
        assert_eq!(iface.value(), &Value::Int8s(vec![127, -128, 127]));

        let widened = iface.get_int8s().unwrap();
        assert_eq!(widened.size(), 3);
        assert_eq!(widened.get(1).unwrap().get_int64(), -128);
    }

    #[test]
    fn test_uint_sequence_roundtrip() {
        let ints: BigInts = vec![BigInt::new(1), BigInt::new(65_537)].into();
        let mut iface = Interface::new();
        iface.set_uint16s(&ints);
        let back = iface.get_uint16s().unwrap();
        assert_eq!(back.get(0).unwrap().get_int64(), 1);
        assert_eq!(back.get(1).unwrap().get_int64(), 1);
    }

    #[test]
    fn test_setters_copy_collections() {
        let mut binaries = Binaries::new(1);
        binaries.set(0, &[1u8, 2][..]).unwrap();
        let mut iface = Interface::new();
        iface.set_binaries(&binaries);
        binaries.set(0, &[9u8][..]).unwrap();
        assert_eq!(iface.get_binaries().unwrap().get(0).unwrap(), vec![1, 2]);

        let mut bytes = vec![1u8, 2, 3];
        iface.set_binary(&bytes);
        bytes[0] = 0;
        assert_eq!(iface.get_binary().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_defaults_are_zero_values() {
        let mut iface = Interface::new();
        iface.set_default_bigint();
        assert_eq!(iface.get_bigint().unwrap().sign(), 0);
        iface.set_default_address();
        assert_eq!(iface.get_address().unwrap(), Address::ZERO);
        iface.set_default_strings();
        assert_eq!(iface.get_strings().unwrap().size(), 0);
        iface.set_default_uint64();
        assert_eq!(iface.kind(), ValueKind::Uint64);
    }

    #[test]
    fn test_default_placeholder_populated_in_place() {
        let mut out = Interfaces::new(2);
        out.slot_mut(0).unwrap().set_default_uint64();
        out.slot_mut(1).unwrap().set_default_string();
        assert_eq!(out.kinds(), vec![ValueKind::Uint64, ValueKind::String]);

        *out.slot_mut(0).unwrap().value_mut() = Value::Uint64(99);
        out.slot_mut(1).unwrap().set_string("filled");

        assert_eq!(out.get(0).unwrap().get_uint64().unwrap().get_int64(), 99);
        assert_eq!(out.get(1).unwrap().get_string().unwrap(), "filled");
    }

    #[test]
    fn test_interfaces_bounds() {
        let mut args = Interfaces::new(1);
        let mut iface = Interface::new();
        iface.set_bool(true);
        assert!(matches!(
            args.set(1, &iface),
            Err(CoreError::IndexOutOfBounds { index: 1, size: 1 })
        ));
        assert!(args.get(-1).is_err());
        assert_eq!(args.get(0).unwrap().kind(), ValueKind::Unset);
        args.set(0, &iface).unwrap();
        assert!(args.get(0).unwrap().get_bool().unwrap());
    }

    #[test]
    fn test_get_returns_independent_copy() {
        let mut args = Interfaces::new(1);
        let mut iface = Interface::new();
        iface.set_int32(7);
        args.set(0, &iface).unwrap();
        let mut fetched = args.get(0).unwrap();
        fetched.set_int32(8);
        assert_eq!(args.get(0).unwrap().get_int32().unwrap(), 7);
    }
}
