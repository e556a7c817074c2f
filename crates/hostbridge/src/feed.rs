//! One-to-many in-process event feed backing the memory backends.

use parking_lot::Mutex;
use tokio::sync::mpsc;

use hostbridge_sub::{NativeSubscription, SubscriptionCloser};

struct Subscriber<T, F> {
    filter: F,
    sink: mpsc::Sender<T>,
    closer: SubscriptionCloser,
}

/// Subscribers carry a filter `F`; each sent value goes to those it matches.
pub(crate) struct Feed<T, F> {
    subscribers: Mutex<Vec<Subscriber<T, F>>>,
}

impl<T: Clone + Send + 'static, F> Feed<T, F> {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self, filter: F, sink: mpsc::Sender<T>) -> NativeSubscription {
        let (closer, native) = NativeSubscription::channel();
        self.subscribers.lock().push(Subscriber {
            filter,
            sink,
            closer,
        });
        native
    }

    /// Deliver `value` to every live subscriber whose filter accepts it,
    /// waiting for buffer space. Returns the number of deliveries.
    pub(crate) async fn send(&self, value: &T, accept: impl Fn(&F, &T) -> bool) -> usize {
        let targets: Vec<mpsc::Sender<T>> = {
            let mut subscribers = self.subscribers.lock();
            subscribers.retain(|s| !s.closer.is_unsubscribed());
            subscribers
                .iter()
                .filter(|s| accept(&s.filter, value))
                .map(|s| s.sink.clone())
                .collect()
        };

        let mut delivered = 0;
        for sink in targets {
            if sink.send(value.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// End every subscription: with `error` through `on_error`, or cleanly.
    pub(crate) fn close_all(&self, error: Option<&str>) {
        let subscribers = std::mem::take(&mut *self.subscribers.lock());
        for subscriber in subscribers {
            match error {
                Some(message) => subscriber.closer.fail(message),
                None => subscriber.closer.close(),
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|s| !s.closer.is_unsubscribed());
        subscribers.len()
    }
}
