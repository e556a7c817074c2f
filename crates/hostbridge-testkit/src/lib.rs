//! # Hostbridge Testkit
//!
//! Testing utilities for hostbridge.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Pinned hex forms and narrowing results
//! - **Generators**: Proptest strategies for identifiers, big integers and records
//! - **Fixtures**: Recording handlers, a chain-free contract and sample records
//!
//! ## Golden Vectors
//!
//! ```rust
//! use hostbridge_testkit::vectors::verify_all_vectors;
//!
//! assert!(verify_all_vectors().is_empty());
//! ```
//!
//! ## Recording Handlers
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use hostbridge::{Bridge, BridgeConfig, Context, Header, MemoryChain};
//! use hostbridge_testkit::fixtures::{sample_header, Recorder};
//!
//! let bridge = Bridge::new(BridgeConfig::default()).unwrap();
//! let chain = Arc::new(MemoryChain::new());
//! let recorder = Arc::new(Recorder::<Header>::new());
//! let _sub = bridge
//!     .chain_client(chain.clone())
//!     .subscribe_new_head(&Context::background(), recorder.clone(), None)
//!     .unwrap();
//!
//! bridge.block_on(chain.publish_head(sample_header(1)));
//! assert!(bridge.block_on(recorder.wait_for(1, Duration::from_secs(1))));
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{sample_header, sample_log, sample_message, Callback, EchoContract, Recorder};
pub use vectors::{hex_vectors, narrowing_vectors, verify_all_vectors};
