//! The subscription pump: one native stream, one bounded channel, one relay
//! task, one host callback.
//!
//! ## Relay order
//!
//! On every wakeup the relay checks, in priority order:
//!
//! 1. context cancellation or an explicit unsubscribe (stop silently),
//! 2. the error channel: close the buffer, deliver what it already held,
//!    then `on_error` for a failure and stop,
//! 3. a buffered event (`on_event`).
//!
//! Events already buffered when the source fails are therefore delivered
//! before the error. A source that keeps sending after it failed cannot hold
//! the relay open; anything it sends once the buffer is closed is dropped.
//!
//! ## Callbacks
//!
//! Handlers run on the runtime's blocking pool, one call at a time, and the
//! relay waits for each to return. A handler may block or call back into
//! the bridge (for example to resubscribe from `on_error`).

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::Result;
use crate::source::{EventHandler, EventSource, NativeSubscription};

/// Lifecycle of a pump. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PumpState {
    Created,
    Active,
    Terminated,
}

struct Shared {
    state: watch::Sender<PumpState>,
    unsubscribe: watch::Sender<bool>,
}

/// Bridges one native event source to one host callback.
pub struct SubscriptionPump<T> {
    ctx: Context,
    handler: Arc<dyn EventHandler<T>>,
    buffer: usize,
    state: watch::Sender<PumpState>,
}

impl<T: Send + 'static> SubscriptionPump<T> {
    /// A pump in the `Created` state. A `buffer` of 0 is served as a single
    /// slot.
    pub fn new(ctx: &Context, handler: Arc<dyn EventHandler<T>>, buffer: usize) -> Self {
        let (state, _) = watch::channel(PumpState::Created);
        Self {
            ctx: ctx.clone(),
            handler,
            buffer,
            state,
        }
    }

    pub fn state(&self) -> PumpState {
        *self.state.borrow()
    }

    /// Register with `source` and start relaying.
    pub async fn attach<S>(self, source: &S) -> Result<Subscription>
    where
        S: EventSource<T> + ?Sized,
    {
        self.start(|ctx, sink| async move { source.subscribe(&ctx, sink).await })
            .await
    }

    /// Open the channel, hand its sender to `register`, and spawn the relay.
    ///
    /// A registration error is returned as-is and no task is started. Must be
    /// called from within a tokio runtime.
    pub async fn start<F, Fut>(self, register: F) -> Result<Subscription>
    where
        F: FnOnce(Context, mpsc::Sender<T>) -> Fut,
        Fut: Future<Output = Result<NativeSubscription>>,
    {
        let (sink, events) = mpsc::channel(self.buffer.max(1));
        let native = match register(self.ctx.clone(), sink).await {
            Ok(native) => native,
            Err(e) => {
                debug!(error = %e, "subscription registration failed");
                return Err(e);
            }
        };

        let NativeSubscription {
            errors,
            unsubscribe,
        } = native;
        let unsubscribed = unsubscribe.subscribe();
        self.state.send_replace(PumpState::Active);
        let shared = Arc::new(Shared {
            state: self.state,
            unsubscribe,
        });

        debug!(buffer = self.buffer, "subscription relay started");
        tokio::spawn(relay(
            self.ctx,
            self.handler,
            events,
            errors,
            unsubscribed,
            Arc::clone(&shared),
        ));

        Ok(Subscription { shared })
    }
}

async fn relay<T>(
    ctx: Context,
    handler: Arc<dyn EventHandler<T>>,
    mut events: mpsc::Receiver<T>,
    mut errors: oneshot::Receiver<Option<String>>,
    mut unsubscribed: watch::Receiver<bool>,
    shared: Arc<Shared>,
) where
    T: Send + 'static,
{
    let mut events_open = true;
    let mut delivered = 0u64;

    loop {
        tokio::select! {
            biased;

            _ = ctx.done() => {
                debug!(delivered, cause = ?ctx.err(), "context done, relay stopping");
                break;
            }
            _ = unsubscribed.changed() => {
                debug!(delivered, "unsubscribed, relay stopping");
                break;
            }
            signal = &mut errors => {
                events.close();
                let mut stopped = false;
                while let Ok(event) = events.try_recv() {
                    if ctx.is_done() || *unsubscribed.borrow() {
                        stopped = true;
                        break;
                    }
                    let handler = Arc::clone(&handler);
                    dispatch(move || handler.on_event(event)).await;
                    delivered += 1;
                }
                match signal {
                    Ok(Some(message)) if !stopped => {
                        warn!(delivered, error = %message, "subscription failed");
                        let handler = Arc::clone(&handler);
                        dispatch(move || handler.on_error(message)).await;
                    }
                    Ok(Some(message)) => {
                        debug!(delivered, error = %message, "stopped before reporting failure");
                    }
                    Ok(None) | Err(_) => debug!(delivered, "subscription closed"),
                }
                break;
            }
            event = events.recv(), if events_open => match event {
                Some(event) => {
                    let handler = Arc::clone(&handler);
                    dispatch(move || handler.on_event(event)).await;
                    delivered += 1;
                }
                None => events_open = false,
            },
        }
    }

    events.close();
    shared.unsubscribe.send_replace(true);
    shared.state.send_replace(PumpState::Terminated);
}

/// Run one host callback on the blocking pool and wait for it.
async fn dispatch<F>(callback: F)
where
    F: FnOnce() + Send + 'static,
{
    if let Err(e) = tokio::task::spawn_blocking(callback).await {
        warn!(error = %e, "subscription callback panicked");
    }
}

/// Host handle for a running subscription.
#[derive(Clone)]
pub struct Subscription {
    shared: Arc<Shared>,
}

impl Subscription {
    pub fn state(&self) -> PumpState {
        *self.shared.state.borrow()
    }

    pub fn is_terminated(&self) -> bool {
        self.state() == PumpState::Terminated
    }

    /// Ask the source to stop and end the relay without an error callback.
    pub fn unsubscribe(&self) {
        self.shared.unsubscribe.send_replace(true);
    }

    /// Resolves once the relay has stopped.
    pub async fn terminated(&self) {
        let mut state = self.shared.state.subscribe();
        let _ = state.wait_for(|s| *s == PumpState::Terminated).await;
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("state", &self.state())
            .finish()
    }
}
