//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

use hostbridge::{
    Address, BigInt, CallOpts, ContractCaller, FilterLogsHandler, Hash, Header, Interface, Log,
    Message, NewHeadHandler, NewMessageHandler, Topic,
};
use hostbridge_sub::EventHandler;

/// One callback observed by a [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Callback<T> {
    Event(T),
    Error(String),
}

/// A handler that records every callback in order.
///
/// Implements the pump's [`EventHandler`] and the host handler trait that
/// matches its event type.
pub struct Recorder<T> {
    calls: Mutex<Vec<Callback<T>>>,
    notify: Notify,
}

impl<T: Clone> Recorder<T> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            notify: Notify::new(),
        }
    }

    fn push(&self, call: Callback<T>) {
        self.calls.lock().push(call);
        self.notify.notify_waiters();
    }

    pub fn calls(&self) -> Vec<Callback<T>> {
        self.calls.lock().clone()
    }

    pub fn events(&self) -> Vec<T> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Callback::Event(e) => Some(e.clone()),
                Callback::Error(_) => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Callback::Error(e) => Some(e.clone()),
                Callback::Event(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until at least `count` callbacks arrived. False on timeout.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            if self.len() >= count {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.len() >= count;
            }
        }
    }
}

impl<T: Clone> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> EventHandler<T> for Recorder<T> {
    fn on_event(&self, event: T) {
        self.push(Callback::Event(event));
    }

    fn on_error(&self, message: String) {
        self.push(Callback::Error(message));
    }
}

impl NewHeadHandler for Recorder<Header> {
    fn on_new_head(&self, header: Header) {
        self.push(Callback::Event(header));
    }

    fn on_error(&self, failure: String) {
        self.push(Callback::Error(failure));
    }
}

impl FilterLogsHandler for Recorder<Log> {
    fn on_filter_logs(&self, log: Log) {
        self.push(Callback::Event(log));
    }

    fn on_error(&self, failure: String) {
        self.push(Callback::Error(failure));
    }
}

impl NewMessageHandler for Recorder<Message> {
    fn on_new_message(&self, message: Message) {
        self.push(Callback::Event(message));
    }

    fn on_error(&self, failure: String) {
        self.push(Callback::Error(failure));
    }
}

/// A contract whose methods need no chain:
///
/// - `echo`: copies each argument into the output slot at the same index
/// - `add`: sums two bigint arguments into one bigint output
/// - `revert`: fails
pub struct EchoContract;

#[async_trait]
impl ContractCaller for EchoContract {
    async fn call(
        &self,
        _opts: &CallOpts,
        _contract: &Address,
        method: &str,
        args: &[Interface],
        out: &mut [Interface],
    ) -> anyhow::Result<()> {
        match method {
            "echo" => {
                anyhow::ensure!(
                    args.len() == out.len(),
                    "echo arity: {} args, {} outputs",
                    args.len(),
                    out.len()
                );
                for (slot, arg) in out.iter_mut().zip(args) {
                    anyhow::ensure!(
                        slot.kind() == arg.kind(),
                        "output kind {} does not match argument kind {}",
                        slot.kind(),
                        arg.kind()
                    );
                    *slot = arg.clone();
                }
                Ok(())
            }
            "add" => {
                let a = args[0].get_bigint()?;
                let b = args[1].get_bigint()?;
                let sum = BigInt::from(a.as_inner() + b.as_inner());
                out[0].set_bigint(&sum);
                Ok(())
            }
            "revert" => anyhow::bail!("execution reverted"),
            other => anyhow::bail!("method {other} not found"),
        }
    }
}

/// A header at `number` whose parent is the header at `number - 1`.
pub fn sample_header(number: u64) -> Header {
    let parent_hash = match number {
        0 => Hash::ZERO,
        n => sample_header(n - 1).hash(),
    };
    Header {
        parent_hash,
        number,
        difficulty: BigInt::new(131_072),
        gas_limit: 8_000_000,
        time: 1_700_000_000 + number * 12,
        ..Header::default()
    }
}

/// A log emitted by the address filled with `emitter`, topics filled with
/// each byte of `topics`.
pub fn sample_log(emitter: u8, topics: &[u8], block_number: u64) -> Log {
    Log {
        address: Address([emitter; 20]),
        topics: topics.iter().map(|t| Hash([*t; 32])).collect(),
        data: vec![emitter; 4],
        block_number,
        ..Log::default()
    }
}

/// A whisper envelope on `topic` carrying `payload`.
pub fn sample_message(topic: &[u8], payload: &[u8]) -> Message {
    Message {
        ttl: 60,
        topic: Topic::from_bytes(topic),
        payload: payload.to_vec(),
        pow: 1.0,
        ..Message::default()
    }
}
