//! The two sides of a subscription: the host's callback capability and the
//! native push-stream that feeds it.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, watch};

use crate::context::Context;
use crate::error::Result;

/// Host-implemented callback object.
///
/// Both methods run on the runtime's blocking pool, one call at a time per
/// subscription, so they may block or call back into the bridge. A slow
/// callback backpressures the source.
pub trait EventHandler<T>: Send + Sync + 'static {
    fn on_event(&self, event: T);

    fn on_error(&self, message: String);
}

/// A native push-stream that delivers `T` into a bounded sink.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventSource<T: Send + 'static>: Send + Sync {
    /// Start pushing events into `sink`.
    ///
    /// Returns the native subscription whose error channel ends the stream.
    async fn subscribe(&self, ctx: &Context, sink: mpsc::Sender<T>) -> Result<NativeSubscription>;
}

/// The consumer half of a native subscription.
///
/// Its error channel fires at most once: `Some(message)` for a failure,
/// `None` for a clean close. A dropped [`SubscriptionCloser`] counts as a
/// clean close.
#[derive(Debug)]
pub struct NativeSubscription {
    pub(crate) errors: oneshot::Receiver<Option<String>>,
    pub(crate) unsubscribe: watch::Sender<bool>,
}

impl NativeSubscription {
    /// Create a linked closer/subscription pair. The source keeps the closer.
    pub fn channel() -> (SubscriptionCloser, NativeSubscription) {
        let (err_tx, err_rx) = oneshot::channel();
        let (unsub_tx, unsub_rx) = watch::channel(false);
        (
            SubscriptionCloser {
                errors: err_tx,
                unsubscribed: unsub_rx,
            },
            NativeSubscription {
                errors: err_rx,
                unsubscribe: unsub_tx,
            },
        )
    }
}

/// The producer half of a native subscription.
#[derive(Debug)]
pub struct SubscriptionCloser {
    errors: oneshot::Sender<Option<String>>,
    unsubscribed: watch::Receiver<bool>,
}

impl SubscriptionCloser {
    /// End the stream without an error.
    pub fn close(self) {
        let _ = self.errors.send(None);
    }

    /// End the stream with `message`, delivered once through `on_error`.
    pub fn fail(self, message: impl Into<String>) {
        let _ = self.errors.send(Some(message.into()));
    }

    /// Whether the consumer asked to stop or went away.
    pub fn is_unsubscribed(&self) -> bool {
        let requested = *self.unsubscribed.borrow();
        requested || self.errors.is_closed() || self.unsubscribed.has_changed().is_err()
    }

    /// Resolves once the consumer asks to stop or goes away.
    pub async fn unsubscribed(&mut self) {
        loop {
            let requested = *self.unsubscribed.borrow_and_update();
            if requested || self.errors.is_closed() {
                return;
            }
            if self.unsubscribed.changed().await.is_err() {
                return;
            }
        }
    }
}
