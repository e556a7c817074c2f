//! Error types for the subscription bridge.

use thiserror::Error;

/// Why a [`Context`](crate::Context) is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Errors that can occur while registering a subscription.
///
/// Delivery errors never surface here; they reach the host once through
/// `on_error`.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// The event source rejected the registration.
    #[error("subscription registration failed: {0}")]
    RegistrationFailure(String),

    /// The caller's context was already done.
    #[error("{0}")]
    ContextDone(#[from] ContextError),
}

/// Result type for subscription operations.
pub type Result<T> = std::result::Result<T, SubscriptionError>;
