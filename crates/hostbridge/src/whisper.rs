//! Whisper message subscriptions and posting.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

use hostbridge_core::{encode_to_hex, Criteria, Message, NewMessage};
use hostbridge_sub::{Context, NativeSubscription, Subscription, SubscriptionPump};

use crate::error::{BridgeError, Result};
use crate::feed::Feed;
use crate::handlers::{NewMessageHandler, NewMessages};

/// A native whisper node.
#[async_trait]
pub trait WhisperBackend: Send + Sync {
    /// Push every envelope matching `criteria` into `sink`.
    async fn subscribe_messages(
        &self,
        ctx: &Context,
        criteria: Criteria,
        sink: mpsc::Sender<Message>,
    ) -> hostbridge_sub::Result<NativeSubscription>;

    /// Post `message`, returning the envelope hash.
    async fn post(&self, ctx: &Context, message: NewMessage) -> Result<Vec<u8>>;
}

/// Synchronous host surface over a [`WhisperBackend`].
#[derive(Clone)]
pub struct WhisperClient {
    backend: Arc<dyn WhisperBackend>,
    runtime: Handle,
    default_buffer: usize,
}

impl WhisperClient {
    pub(crate) fn new(backend: Arc<dyn WhisperBackend>, runtime: Handle, default_buffer: usize) -> Self {
        Self {
            backend,
            runtime,
            default_buffer,
        }
    }

    pub fn subscribe_messages(
        &self,
        ctx: &Context,
        criteria: &Criteria,
        handler: Arc<dyn NewMessageHandler>,
        buffer: Option<usize>,
    ) -> Result<Subscription> {
        let buffer = buffer.unwrap_or(self.default_buffer);
        let pump = SubscriptionPump::new(ctx, Arc::new(NewMessages(handler)), buffer);
        let backend = Arc::clone(&self.backend);
        let criteria = criteria.clone();
        let sub = self.runtime.block_on(pump.start(|ctx, sink| async move {
            backend.subscribe_messages(&ctx, criteria, sink).await
        }))?;
        Ok(sub)
    }

    /// Post a message; returns the envelope hash as `0x` hex.
    pub fn post(&self, ctx: &Context, message: &NewMessage) -> Result<String> {
        if let Some(cause) = ctx.err() {
            return Err(cause.into());
        }
        let hash = self
            .runtime
            .block_on(self.backend.post(ctx, message.clone()))?;
        Ok(encode_to_hex(&hash))
    }
}

/// In-process whisper node: posted messages loop back to local subscribers.
pub struct MemoryWhisper {
    feed: Feed<Message, Criteria>,
}

impl MemoryWhisper {
    pub fn new() -> Self {
        Self { feed: Feed::new() }
    }

    /// Deliver a received envelope to matching subscribers.
    pub async fn deliver(&self, message: Message) -> usize {
        self.feed
            .send(&message, |criteria, message| criteria.matches(message))
            .await
    }

    pub fn fail_all(&self, message: &str) {
        self.feed.close_all(Some(message));
    }

    pub fn subscriber_count(&self) -> usize {
        self.feed.len()
    }

    fn seal(message: NewMessage) -> Message {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or_default();
        let mut hasher = blake3::Hasher::new();
        hasher.update(&message.topic.0);
        hasher.update(&message.ttl.to_be_bytes());
        hasher.update(&timestamp.to_be_bytes());
        hasher.update(&message.payload);
        Message {
            sig: Vec::new(),
            ttl: message.ttl,
            timestamp,
            topic: message.topic,
            payload: message.payload,
            pow: message.pow_target,
            hash: hasher.finalize().as_bytes().to_vec(),
            dst: message.public_key,
        }
    }
}

impl Default for MemoryWhisper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WhisperBackend for MemoryWhisper {
    async fn subscribe_messages(
        &self,
        ctx: &Context,
        criteria: Criteria,
        sink: mpsc::Sender<Message>,
    ) -> hostbridge_sub::Result<NativeSubscription> {
        if let Some(cause) = ctx.err() {
            return Err(cause.into());
        }
        debug!(topics = criteria.topics.len(), "message subscription");
        Ok(self.feed.subscribe(criteria, sink))
    }

    async fn post(&self, _ctx: &Context, message: NewMessage) -> Result<Vec<u8>> {
        if message.sym_key_id.is_empty() && message.public_key.is_empty() {
            return Err(BridgeError::InvalidMessage(
                "specify either a symmetric or an asymmetric key".into(),
            ));
        }
        if !message.sym_key_id.is_empty() && !message.public_key.is_empty() {
            return Err(BridgeError::InvalidMessage(
                "specify either a symmetric or an asymmetric key, not both".into(),
            ));
        }
        let envelope = Self::seal(message);
        let hash = envelope.hash.clone();
        let delivered = self.deliver(envelope).await;
        debug!(delivered, "message posted");
        Ok(hash)
    }
}
