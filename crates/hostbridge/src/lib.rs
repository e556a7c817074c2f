//! # Hostbridge
//!
//! The host-facing API: lets an environment without generics, big integers
//! or async primitives build call arguments, read call results, and consume
//! push-style event feeds through synchronous callbacks.
//!
//! ## Overview
//!
//! - **Values**: [`Interface`] / [`Interfaces`] carry dynamically-typed call
//!   arguments and results; [`BigInt`], [`Hash`], [`Address`] and the
//!   sequence types marshal the rest.
//! - **Queries**: [`ChainClient`] answers block, transaction, receipt,
//!   balance and log lookups synchronously.
//! - **Subscriptions**: [`ChainClient`] and [`WhisperClient`] turn chain
//!   heads, log matches and whisper envelopes into handler callbacks.
//!   Handlers run off the async workers, so they may call back into the
//!   bridge.
//! - **Calls**: [`BoundContract::call`] fills pre-allocated output slots.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hostbridge::{Bridge, BridgeConfig, Context, Header, MemoryChain, NewHeadHandler};
//!
//! struct Printer;
//!
//! impl NewHeadHandler for Printer {
//!     fn on_new_head(&self, header: Header) { println!("#{}", header.number); }
//!     fn on_error(&self, failure: String) { eprintln!("{failure}"); }
//! }
//!
//! let bridge = Bridge::new(BridgeConfig::default()).unwrap();
//! let chain = Arc::new(MemoryChain::new());
//! let client = bridge.chain_client(chain.clone());
//!
//! let ctx = Context::background().with_cancel();
//! let sub = client.subscribe_new_head(&ctx, Arc::new(Printer), Some(16)).unwrap();
//! bridge.block_on(chain.publish_head(Header::default()));
//!
//! ctx.cancel();
//! bridge.block_on(sub.terminated());
//! ```
//!
//! ## Re-exports
//!
//! - `hostbridge::core` - the typed value bridge
//! - `hostbridge::sub` - contexts and the subscription pump

pub mod bridge;
pub mod chain;
pub mod config;
pub mod contract;
pub mod error;
mod feed;
pub mod handlers;
pub mod logging;
pub mod whisper;

// Re-export component crates
pub use hostbridge_core as core;
pub use hostbridge_sub as sub;

pub use bridge::Bridge;
pub use chain::{ChainBackend, ChainClient, MemoryChain};
pub use config::BridgeConfig;
pub use contract::{BoundContract, CallOpts, ContractCaller};
pub use error::{BridgeError, Result};
pub use handlers::{FilterLogsHandler, NewHeadHandler, NewMessageHandler};
pub use whisper::{MemoryWhisper, WhisperBackend, WhisperClient};

// Re-export commonly used types
pub use hostbridge_core::{
    Address, BigInt, BigInts, Block, Criteria, FilterQuery, Hash, Hashes, Header, Interface,
    Interfaces, Log, Logs, Message, NewMessage, Receipt, SyncProgress, Topic, Transaction, Value,
    ValueKind,
};
pub use hostbridge_sub::{Context, ContextError, PumpState, Subscription};
