//! Whisper envelopes, outgoing messages and subscription criteria.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::hexutil::{decode_fixed, serde_hex};
use crate::records::record_codecs;

/// A 4-byte message topic.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(pub [u8; 4]);

impl Topic {
    pub const LENGTH: usize = 4;

    /// Copy up to the first four bytes of `buf`; shorter input is zero-padded
    /// on the right.
    pub fn from_bytes(buf: &[u8]) -> Self {
        let mut topic = [0u8; 4];
        let n = buf.len().min(Self::LENGTH);
        topic[..n].copy_from_slice(&buf[..n]);
        Self(topic)
    }

    pub fn from_hex(text: &str) -> Result<Self> {
        decode_fixed::<4>("topic", text).map(Self)
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic({})", hex::encode(self.0))
    }
}

impl Serialize for Topic {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

impl<'de> Deserialize<'de> for Topic {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// A received whisper envelope.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(with = "serde_hex")]
    pub sig: Vec<u8>,
    pub ttl: u32,
    pub timestamp: u32,
    pub topic: Topic,
    #[serde(with = "serde_hex")]
    pub payload: Vec<u8>,
    pub pow: f64,
    #[serde(with = "serde_hex")]
    pub hash: Vec<u8>,
    #[serde(with = "serde_hex")]
    pub dst: Vec<u8>,
}

impl Message {
    pub fn sig(&self) -> Vec<u8> {
        self.sig.clone()
    }

    pub fn payload(&self) -> Vec<u8> {
        self.payload.clone()
    }

    pub fn hash(&self) -> Vec<u8> {
        self.hash.clone()
    }

    pub fn dst(&self) -> Vec<u8> {
        self.dst.clone()
    }
}

/// An outgoing message to be posted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub sym_key_id: String,
    #[serde(with = "serde_hex")]
    pub public_key: Vec<u8>,
    pub sig: String,
    pub ttl: u32,
    #[serde(with = "serde_hex")]
    pub payload: Vec<u8>,
    pub pow_time: u32,
    pub pow_target: f64,
    pub target_peer: String,
    pub topic: Topic,
}

impl NewMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_payload(&mut self, payload: &[u8]) {
        self.payload = payload.to_vec();
    }

    pub fn set_public_key(&mut self, key: &[u8]) {
        self.public_key = key.to_vec();
    }

    pub fn set_topic(&mut self, topic: &[u8]) {
        self.topic = Topic::from_bytes(topic);
    }
}

/// Filter applied to incoming envelopes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    pub sym_key_id: String,
    pub private_key_id: String,
    #[serde(with = "serde_hex")]
    pub sig: Vec<u8>,
    pub min_pow: f64,
    pub topics: Vec<Topic>,
    pub allow_p2p: bool,
}

impl Criteria {
    /// Criteria matching a single topic.
    pub fn new(topic: &[u8]) -> Self {
        Self {
            topics: vec![Topic::from_bytes(topic)],
            ..Self::default()
        }
    }

    /// Whether `message` passes the topic, PoW and signature checks.
    ///
    /// Empty topic and signature lists match anything.
    pub fn matches(&self, message: &Message) -> bool {
        if !self.topics.is_empty() && !self.topics.contains(&message.topic) {
            return false;
        }
        if message.pow < self.min_pow {
            return false;
        }
        self.sig.is_empty() || self.sig == message.sig
    }
}

record_codecs!(Message, NewMessage, Criteria);
