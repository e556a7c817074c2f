//! Cancellable execution contexts.
//!
//! A [`Context`] is a cheap, clonable handle. Contexts form a tree: a child
//! is done when it is cancelled, when its deadline passes, or when any
//! ancestor is done. Deadlines are checked lazily against the wall clock, so
//! no timer task is needed to expire them.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime};
use tokio::sync::watch;

use crate::error::ContextError;

struct Inner {
    state: watch::Sender<Option<ContextError>>,
    deadline: Option<SystemTime>,
    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn new(deadline: Option<SystemTime>) -> Arc<Self> {
        let (state, _) = watch::channel(None);
        Arc::new(Self {
            state,
            deadline,
            children: Mutex::new(Vec::new()),
        })
    }

    /// First cause wins; descendants inherit it.
    fn finish(&self, cause: ContextError) {
        let changed = self.state.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(cause);
            true
        });
        if !changed {
            return;
        }
        let children = std::mem::take(&mut *self.children.lock());
        for child in children.iter().filter_map(Weak::upgrade) {
            child.finish(cause);
        }
    }

    fn err(&self) -> Option<ContextError> {
        if let Some(cause) = *self.state.borrow() {
            return Some(cause);
        }
        match self.deadline {
            Some(deadline) if SystemTime::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }
}

/// A cancellation scope shared between the host and the relay tasks it
/// starts.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// A root context with no deadline.
    pub fn background() -> Self {
        Self {
            inner: Inner::new(None),
        }
    }

    /// A child that can be cancelled independently of `self`.
    pub fn with_cancel(&self) -> Self {
        self.child(self.inner.deadline)
    }

    /// A child that is done at `deadline` or at the parent's deadline,
    /// whichever comes first.
    pub fn with_deadline(&self, deadline: SystemTime) -> Self {
        let deadline = match self.inner.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        self.child(Some(deadline))
    }

    /// A child that is done after `timeout` elapses.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(SystemTime::now() + timeout)
    }

    fn child(&self, deadline: Option<SystemTime>) -> Self {
        let inner = Inner::new(deadline);
        {
            let mut children = self.inner.children.lock();
            children.retain(|c| c.strong_count() > 0);
            children.push(Arc::downgrade(&inner));
        }
        // Parent may have been cancelled before the child was registered.
        let parent_cause = *self.inner.state.borrow();
        if let Some(cause) = parent_cause {
            inner.finish(cause);
        }
        Self { inner }
    }

    /// Cancel this context and every descendant. Idempotent.
    pub fn cancel(&self) {
        self.inner.finish(ContextError::Canceled);
    }

    pub fn deadline(&self) -> Option<SystemTime> {
        self.inner.deadline
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// `None` while the context is live.
    pub fn err(&self) -> Option<ContextError> {
        self.inner.err()
    }

    /// Resolves once the context is done.
    pub async fn done(&self) {
        let mut state = self.inner.state.subscribe();
        loop {
            if self.is_done() {
                return;
            }
            let remaining = self
                .inner
                .deadline
                .map(|d| d.duration_since(SystemTime::now()).unwrap_or_default());
            match remaining {
                Some(wait) => {
                    tokio::select! {
                        _ = state.changed() => {}
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
                None => {
                    // The sender lives in `self.inner`, so this only errors
                    // if the watch is closed, which cannot happen here.
                    let _ = state.changed().await;
                }
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("err", &self.err())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_live() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert_eq!(ctx.err(), None);
        assert_eq!(ctx.deadline(), None);
    }

    #[test]
    fn test_cancel_propagates_to_descendants() {
        let root = Context::background();
        let child = root.with_cancel();
        let grandchild = child.with_cancel();
        let sibling = root.with_cancel();

        child.cancel();
        assert_eq!(child.err(), Some(ContextError::Canceled));
        assert!(grandchild.is_done());
        assert!(!root.is_done());
        assert!(!sibling.is_done());

        root.cancel();
        assert!(sibling.is_done());
    }

    #[test]
    fn test_child_of_cancelled_parent_is_done() {
        let root = Context::background();
        root.cancel();
        assert_eq!(root.with_cancel().err(), Some(ContextError::Canceled));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let ctx = Context::background().with_timeout(Duration::from_secs(60));
        ctx.cancel();
        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }

    #[test]
    fn test_deadline_never_exceeds_parent() {
        let now = SystemTime::now();
        let parent = Context::background().with_deadline(now + Duration::from_secs(10));
        let child = parent.with_deadline(now + Duration::from_secs(100));
        assert_eq!(child.deadline(), Some(now + Duration::from_secs(10)));

        let tighter = parent.with_deadline(now + Duration::from_secs(1));
        assert_eq!(tighter.deadline(), Some(now + Duration::from_secs(1)));
        assert_eq!(parent.with_cancel().deadline(), parent.deadline());
    }

    #[test]
    fn test_past_deadline_is_exceeded() {
        let ctx = Context::background().with_deadline(SystemTime::UNIX_EPOCH);
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_done_resolves_on_cancel() {
        let ctx = Context::background().with_cancel();
        let waiter = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.done().await })
        };
        ctx.cancel();
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_done_resolves_on_timeout() {
        let ctx = Context::background().with_timeout(Duration::from_millis(20));
        tokio::time::timeout(Duration::from_secs(5), ctx.done())
            .await
            .unwrap();
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }
}
