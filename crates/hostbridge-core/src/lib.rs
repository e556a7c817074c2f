//! # Hostbridge Core
//!
//! The typed value bridge: everything a host without generics, big integers
//! or native collections needs to build call arguments and read call results.
//!
//! This crate contains no I/O and no background state. Every type is plain
//! owned data; mutation needs `&mut`, so a single instance is never mutated
//! from two threads at once.
//!
//! ## Key Types
//!
//! - [`Hash`], [`Address`], [`Nonce`], [`Bloom`] - fixed-length identifiers
//! - [`BigInt`] - arbitrary-precision signed integer
//! - [`Sequence`] - bounds-checked homogeneous container ([`Hashes`], [`Binaries`], ...)
//! - [`Interface`] / [`Interfaces`] - closed-set dynamic values for call arguments
//!
//! ## Ownership
//!
//! Values are copied on the way into a container and on the way out. A host
//! mutating something it fetched can never reach back into the container.

pub mod bigint;
pub mod enode;
pub mod error;
pub mod filter;
pub mod hexutil;
pub mod identifiers;
pub mod records;
pub mod sequence;
pub mod value;
pub mod whisper;

pub use bigint::BigInt;
pub use enode::Enode;
pub use error::{CoreError, Result};
pub use filter::FilterQuery;
pub use hexutil::{decode_from_hex, encode_to_hex};
pub use identifiers::{Address, Bloom, Hash, Nonce};
pub use records::{Block, Header, Log, Receipt, SyncProgress, Transaction};
pub use sequence::{
    Addresses, BigInts, Binaries, Bools, Enodes, Growable, Hashes, Headers, Logs, Messages,
    Sequence, Strings, Transactions,
};
pub use value::{Interface, Interfaces, Value, ValueKind};
pub use whisper::{Criteria, Message, NewMessage, Topic};
