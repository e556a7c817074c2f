//! Log filter queries.

use serde::{Deserialize, Serialize};

use crate::identifiers::{Address, Hash};
use crate::records::{record_codecs, Log};
use crate::sequence::{Addresses, Hashes};

/// Selects logs by block range, emitting contract and topics.
///
/// `topics` is positional: entry `i` lists the alternatives accepted at topic
/// position `i`, and an empty entry accepts anything there. A log with fewer
/// topics than the query has positions never matches.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterQuery {
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    pub addresses: Vec<Address>,
    pub topics: Vec<Vec<Hash>>,
}

impl FilterQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_from_block(&mut self, number: u64) {
        self.from_block = Some(number);
    }

    pub fn set_to_block(&mut self, number: u64) {
        self.to_block = Some(number);
    }

    pub fn set_addresses(&mut self, addresses: &Addresses) {
        self.addresses = addresses.as_slice().to_vec();
    }

    /// Append one topic position with its accepted alternatives.
    pub fn add_topics(&mut self, alternatives: &Hashes) {
        self.topics.push(alternatives.as_slice().to_vec());
    }

    pub fn matches(&self, log: &Log) -> bool {
        if self.from_block.is_some_and(|from| log.block_number < from) {
            return false;
        }
        if self.to_block.is_some_and(|to| log.block_number > to) {
            return false;
        }
        if !self.addresses.is_empty() && !self.addresses.contains(&log.address) {
            return false;
        }
        if self.topics.len() > log.topics.len() {
            return false;
        }
        self.topics
            .iter()
            .zip(&log.topics)
            .all(|(alternatives, topic)| alternatives.is_empty() || alternatives.contains(topic))
    }
}

record_codecs!(FilterQuery);

#[cfg(test)]
mod tests {
    use super::*;

    fn log(address: u8, topics: &[u8], block: u64) -> Log {
        Log {
            address: Address([address; 20]),
            topics: topics.iter().map(|t| Hash([*t; 32])).collect(),
            block_number: block,
            ..Log::default()
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(FilterQuery::new().matches(&log(1, &[], 0)));
        assert!(FilterQuery::new().matches(&log(2, &[1, 2], 99)));
    }

    #[test]
    fn test_address_filter() {
        let mut query = FilterQuery::new();
        query.set_addresses(&Addresses::from(vec![Address([1; 20])]));
        assert!(query.matches(&log(1, &[], 0)));
        assert!(!query.matches(&log(2, &[], 0)));
    }

    #[test]
    fn test_positional_topics() {
        let mut query = FilterQuery::new();
        query.add_topics(&Hashes::new_empty());
        query.add_topics(&Hashes::from(vec![Hash([7; 32]), Hash([8; 32])]));

        assert!(query.matches(&log(0, &[1, 7], 0)));
        assert!(query.matches(&log(0, &[2, 8, 9], 0)));
        assert!(!query.matches(&log(0, &[7, 1], 0)));
        assert!(!query.matches(&log(0, &[1], 0)));
    }

    #[test]
    fn test_block_range() {
        let mut query = FilterQuery::new();
        query.set_from_block(10);
        query.set_to_block(20);
        assert!(!query.matches(&log(0, &[], 9)));
        assert!(query.matches(&log(0, &[], 10)));
        assert!(query.matches(&log(0, &[], 20)));
        assert!(!query.matches(&log(0, &[], 21)));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut query = FilterQuery::new();
        query.set_from_block(1);
        query.add_topics(&Hashes::from(vec![Hash([3; 32])]));
        let json = query.encode_json().unwrap();
        assert_eq!(FilterQuery::from_json(&json).unwrap(), query);
    }
}
