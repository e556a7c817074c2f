//! Chain records carried by sequences and subscriptions.
//!
//! Records are immutable snapshots. Byte fields are copied out by their
//! accessors. Each record has a JSON form and a compact CBOR form; the
//! record hash is a Blake3 digest over a fixed field order.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::bigint::BigInt;
use crate::error::{CoreError, Result};
use crate::hexutil::serde_hex;
use crate::identifiers::{Address, Bloom, Hash, Nonce};
use crate::sequence::{Hashes, Headers, Logs, Transactions};

/// Domain tags for record hashing.
mod domain {
    pub const HEADER: &[u8] = b"hostbridge-header-v0:";
    pub const TRANSACTION: &[u8] = b"hostbridge-tx-v0:";
}

pub(crate) fn to_json<T: Serialize>(record: &T) -> Result<String> {
    serde_json::to_string(record).map_err(|e| CoreError::EncodingError(e.to_string()))
}

pub(crate) fn from_json<T: DeserializeOwned>(data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| CoreError::DecodingError(e.to_string()))
}

pub(crate) fn to_cbor<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(record, &mut buf).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(buf)
}

pub(crate) fn from_cbor<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    ciborium::from_reader(data).map_err(|e| CoreError::DecodingError(e.to_string()))
}

/// Adds `from_json`, `encode_json`, `from_binary` and `encode_binary`.
macro_rules! record_codecs {
    ($($name:ident),*) => {
        $(
            impl $name {
                pub fn from_json(data: &str) -> $crate::error::Result<Self> {
                    $crate::records::from_json(data)
                }

                pub fn encode_json(&self) -> $crate::error::Result<String> {
                    $crate::records::to_json(self)
                }

                pub fn from_binary(data: &[u8]) -> $crate::error::Result<Self> {
                    $crate::records::from_cbor(data)
                }

                pub fn encode_binary(&self) -> $crate::error::Result<Vec<u8>> {
                    $crate::records::to_cbor(self)
                }
            }
        )*
    };
}
pub(crate) use record_codecs;

/// A block header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub parent_hash: Hash,
    pub uncle_hash: Hash,
    pub coinbase: Address,
    pub root: Hash,
    pub tx_hash: Hash,
    pub receipt_hash: Hash,
    pub bloom: Bloom,
    pub difficulty: BigInt,
    pub number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub time: u64,
    #[serde(with = "serde_hex")]
    pub extra: Vec<u8>,
    pub mix_digest: Hash,
    pub nonce: Nonce,
}

impl Header {
    /// Blake3 over the header fields in declaration order.
    pub fn hash(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain::HEADER);
        hasher.update(self.parent_hash.as_ref());
        hasher.update(self.uncle_hash.as_ref());
        hasher.update(self.coinbase.as_ref());
        hasher.update(self.root.as_ref());
        hasher.update(self.tx_hash.as_ref());
        hasher.update(self.receipt_hash.as_ref());
        hasher.update(self.bloom.as_ref());
        let difficulty = self.difficulty.bytes();
        hasher.update(&(difficulty.len() as u64).to_be_bytes());
        hasher.update(&difficulty);
        hasher.update(&self.number.to_be_bytes());
        hasher.update(&self.gas_limit.to_be_bytes());
        hasher.update(&self.gas_used.to_be_bytes());
        hasher.update(&self.time.to_be_bytes());
        hasher.update(&(self.extra.len() as u64).to_be_bytes());
        hasher.update(&self.extra);
        hasher.update(self.mix_digest.as_ref());
        hasher.update(self.nonce.as_ref());
        Hash(*hasher.finalize().as_bytes())
    }

    pub fn extra(&self) -> Vec<u8> {
        self.extra.clone()
    }
}

/// A transaction. `to` is `None` for contract creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub nonce: u64,
    pub to: Option<Address>,
    pub value: BigInt,
    pub gas: u64,
    pub gas_price: BigInt,
    #[serde(with = "serde_hex")]
    pub data: Vec<u8>,
}

impl Transaction {
    pub fn new(
        nonce: u64,
        to: Option<&Address>,
        amount: &BigInt,
        gas_limit: u64,
        gas_price: &BigInt,
        data: &[u8],
    ) -> Self {
        Self {
            nonce,
            to: to.copied(),
            value: amount.clone(),
            gas: gas_limit,
            gas_price: gas_price.clone(),
            data: data.to_vec(),
        }
    }

    pub fn contract_creation(
        nonce: u64,
        amount: &BigInt,
        gas_limit: u64,
        gas_price: &BigInt,
        data: &[u8],
    ) -> Self {
        Self::new(nonce, None, amount, gas_limit, gas_price, data)
    }

    pub fn hash(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain::TRANSACTION);
        hasher.update(&self.nonce.to_be_bytes());
        match &self.to {
            Some(to) => {
                hasher.update(&[1]);
                hasher.update(to.as_ref());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        for amount in [&self.value, &self.gas_price] {
            let bytes = amount.bytes();
            hasher.update(&(bytes.len() as u64).to_be_bytes());
            hasher.update(&bytes);
        }
        hasher.update(&self.gas.to_be_bytes());
        hasher.update(&(self.data.len() as u64).to_be_bytes());
        hasher.update(&self.data);
        Hash(*hasher.finalize().as_bytes())
    }

    pub fn data(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// `gas * gas_price + value`.
    pub fn cost(&self) -> BigInt {
        let fee = self.gas_price.as_inner() * num_bigint::BigInt::from(self.gas);
        BigInt::from(fee + self.value.as_inner())
    }
}

/// A contract event log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<Hash>,
    #[serde(with = "serde_hex")]
    pub data: Vec<u8>,
    pub block_number: u64,
    pub tx_hash: Hash,
    pub tx_index: u32,
    pub block_hash: Hash,
    pub index: u32,
    #[serde(default)]
    pub removed: bool,
}

impl Log {
    pub fn topics(&self) -> Hashes {
        Hashes::from(self.topics.clone())
    }

    pub fn data(&self) -> Vec<u8> {
        self.data.clone()
    }
}

/// A transaction receipt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub status: u64,
    pub cumulative_gas_used: u64,
    pub bloom: Bloom,
    pub logs: Vec<Log>,
    pub tx_hash: Hash,
    pub contract_address: Address,
    pub gas_used: u64,
}

impl Receipt {
    pub fn logs(&self) -> Logs {
        Logs::from(self.logs.clone())
    }
}

/// A block: header, body transactions and uncle headers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
    pub uncles: Vec<Header>,
}

impl Block {
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn header(&self) -> Header {
        self.header.clone()
    }

    pub fn uncles(&self) -> Headers {
        Headers::from(self.uncles.clone())
    }

    pub fn transactions(&self) -> Transactions {
        Transactions::from(self.transactions.clone())
    }

    /// Look up a body transaction by hash.
    pub fn transaction(&self, hash: &Hash) -> Option<Transaction> {
        self.transactions.iter().find(|tx| tx.hash() == *hash).cloned()
    }
}

/// Progress of a node that is still catching up with the chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    pub starting_block: u64,
    pub current_block: u64,
    pub highest_block: u64,
    pub pulled_states: u64,
    pub known_states: u64,
}

impl SyncProgress {
    /// Blocks still to import before the node reaches `highest_block`.
    pub fn remaining(&self) -> u64 {
        self.highest_block.saturating_sub(self.current_block)
    }
}

record_codecs!(Header, Transaction, Log, Receipt, Block, SyncProgress);

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header(number: u64) -> Header {
        Header {
            parent_hash: Hash([0x01; 32]),
            coinbase: Address([0x02; 20]),
            difficulty: BigInt::new(131_072),
            number,
            gas_limit: 8_000_000,
            time: 1_700_000_000,
            extra: b"bridge".to_vec(),
            ..Header::default()
        }
    }

    #[test]
    fn test_header_json_roundtrip() {
        let header = sample_header(7);
        let json = header.encode_json().unwrap();
        assert!(json.contains("\"difficulty\":\"131072\""));
        assert!(json.contains("\"extra\":\"0x627269646765\""));
        assert_eq!(Header::from_json(&json).unwrap(), header);
    }

    #[test]
    fn test_header_binary_roundtrip() {
        let header = sample_header(9);
        let bytes = header.encode_binary().unwrap();
        assert_eq!(Header::from_binary(&bytes).unwrap(), header);
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            Header::from_json("{not json"),
            Err(CoreError::DecodingError(_))
        ));
        assert!(matches!(
            Log::from_binary(&[0x01]),
            Err(CoreError::DecodingError(_))
        ));
    }

    #[test]
    fn test_header_hash_depends_on_fields() {
        assert_eq!(sample_header(1).hash(), sample_header(1).hash());
        assert_ne!(sample_header(1).hash(), sample_header(2).hash());
    }

    #[test]
    fn test_block_sequences() {
        let tx = Transaction::new(
            3,
            Some(&Address([0x09; 20])),
            &BigInt::new(10),
            21_000,
            &BigInt::new(2),
            b"\x01\x02",
        );
        let block = Block {
            header: sample_header(5),
            transactions: vec![tx.clone()],
            uncles: vec![sample_header(4)],
        };
        assert_eq!(block.transactions().size(), 1);
        assert_eq!(block.uncles().get(0).unwrap().number, 4);
        assert_eq!(block.transaction(&tx.hash()), Some(tx.clone()));
        assert_eq!(block.transaction(&Hash::ZERO), None);
        assert_eq!(tx.cost().get_int64(), 21_000 * 2 + 10);
    }

    #[test]
    fn test_contract_creation_has_no_recipient() {
        let tx = Transaction::contract_creation(0, &BigInt::new(0), 100_000, &BigInt::new(1), &[]);
        assert!(tx.to.is_none());
        let with_to = Transaction::new(0, Some(&Address::ZERO), &BigInt::new(0), 100_000, &BigInt::new(1), &[]);
        assert_ne!(tx.hash(), with_to.hash());
    }

    #[test]
    fn test_sync_progress_remaining() {
        let progress = SyncProgress {
            starting_block: 10,
            current_block: 40,
            highest_block: 100,
            ..SyncProgress::default()
        };
        assert_eq!(progress.remaining(), 60);
        let json = progress.encode_json().unwrap();
        assert_eq!(SyncProgress::from_json(&json).unwrap(), progress);
        assert_eq!(SyncProgress::default().remaining(), 0);
    }

    #[test]
    fn test_receipt_logs() {
        let receipt = Receipt {
            logs: vec![Log {
                topics: vec![Hash([0xaa; 32])],
                ..Log::default()
            }],
            ..Receipt::default()
        };
        let logs = receipt.logs();
        assert_eq!(logs.size(), 1);
        assert_eq!(logs.get(0).unwrap().topics().get(0).unwrap(), Hash([0xaa; 32]));
    }
}
