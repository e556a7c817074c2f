//! Error types for the host-facing bridge.

use hostbridge_core::CoreError;
use hostbridge_sub::{ContextError, SubscriptionError};
use thiserror::Error;

/// Errors that can occur during bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Value construction or access failed.
    #[error("value error: {0}")]
    Core(#[from] CoreError),

    /// Subscription registration failed.
    #[error("subscription error: {0}")]
    Subscription(#[from] SubscriptionError),

    /// The call context was cancelled or timed out.
    #[error("{0}")]
    ContextDone(#[from] ContextError),

    /// The remote contract call failed.
    #[error("contract call failed: {0}")]
    Contract(#[from] anyhow::Error),

    /// The backend has no record for the query.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend refused a submitted transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// An outgoing message was rejected.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Configuration could not be loaded.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The async runtime could not be built.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
