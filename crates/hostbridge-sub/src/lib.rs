//! # Hostbridge Sub
//!
//! The subscription bridge: turns a native push-stream into synchronous
//! host callbacks.
//!
//! ## Overview
//!
//! A [`SubscriptionPump`] owns one bounded channel and one relay task. The
//! native source pushes events into the channel; the relay invokes
//! [`EventHandler::on_event`] once per event, in order, and at most one
//! [`EventHandler::on_error`] when the source fails. Cancelling the
//! [`Context`] stops the relay silently.
//!
//! ```text
//!  source ──send──> [ bounded channel ] ──recv──> relay ──> on_event
//!     │                                             │
//!     └──────── error channel (once) ───────────────┴────> on_error
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hostbridge_sub::{Context, EventHandler, EventSource, SubscriptionPump};
//!
//! struct Printer;
//!
//! impl EventHandler<u64> for Printer {
//!     fn on_event(&self, n: u64) { println!("head {n}"); }
//!     fn on_error(&self, e: String) { eprintln!("failed: {e}"); }
//! }
//!
//! async fn example(source: &dyn EventSource<u64>) {
//!     let ctx = Context::background().with_cancel();
//!     let pump = SubscriptionPump::new(&ctx, Arc::new(Printer), 16);
//!     let sub = pump.attach(source).await.unwrap();
//!     ctx.cancel();
//!     sub.terminated().await;
//! }
//! ```

pub mod context;
pub mod error;
pub mod pump;
pub mod source;

pub use context::Context;
pub use error::{ContextError, Result, SubscriptionError};
pub use pump::{PumpState, Subscription, SubscriptionPump};
pub use source::{EventHandler, EventSource, NativeSubscription, SubscriptionCloser};
