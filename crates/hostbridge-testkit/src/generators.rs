//! Proptest generators for property-based testing.

use proptest::prelude::*;

use hostbridge_core::{Address, BigInt, Bloom, Hash, Header, Log, Nonce, Topic};

/// Generate a random Hash.
pub fn hash() -> impl Strategy<Value = Hash> {
    any::<[u8; 32]>().prop_map(Hash)
}

/// Generate a random Address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address)
}

/// Generate a random Nonce.
pub fn nonce() -> impl Strategy<Value = Nonce> {
    any::<[u8; 8]>().prop_map(Nonce)
}

/// Generate a sparse Bloom with up to eight bits set.
pub fn bloom() -> impl Strategy<Value = Bloom> {
    prop::collection::vec(0usize..2048, 0..8).prop_map(|bits| {
        let mut bloom = [0u8; 256];
        for bit in bits {
            bloom[bit / 8] |= 1 << (bit % 8);
        }
        Bloom(bloom)
    })
}

/// Generate a random whisper topic.
pub fn topic() -> impl Strategy<Value = Topic> {
    any::<[u8; 4]>().prop_map(Topic)
}

/// Generate a signed big integer of up to `max_bytes` magnitude bytes.
pub fn bigint(max_bytes: usize) -> impl Strategy<Value = BigInt> {
    (any::<bool>(), prop::collection::vec(any::<u8>(), 0..=max_bytes)).prop_map(
        |(negative, magnitude)| {
            let mut x = BigInt::default();
            x.set_bytes(&magnitude);
            if negative && x.sign() != 0 {
                let text = format!("-{}", x);
                x.set_string(&text, 10);
            }
            x
        },
    )
}

/// Generate binary blobs of up to `max_len` bytes.
pub fn binary(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a header with random linkage and counters.
pub fn header() -> impl Strategy<Value = Header> {
    (
        hash(),
        address(),
        bigint(8),
        any::<u64>(),
        any::<u64>(),
        binary(32),
        nonce(),
    )
        .prop_map(
            |(parent_hash, coinbase, difficulty, number, time, extra, nonce)| Header {
                parent_hash,
                coinbase,
                difficulty,
                number,
                time,
                extra,
                nonce,
                ..Header::default()
            },
        )
}

/// Generate a log with up to four topics.
pub fn log() -> impl Strategy<Value = Log> {
    (
        address(),
        prop::collection::vec(hash(), 0..=4),
        binary(64),
        any::<u64>(),
    )
        .prop_map(|(address, topics, data, block_number)| Log {
            address,
            topics,
            data,
            block_number,
            ..Log::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn bigint_sign_matches_magnitude(x in bigint(16)) {
            prop_assert_eq!(x.sign() == 0, x.bytes().is_empty());
        }

        #[test]
        fn header_hash_is_deterministic(h in header()) {
            prop_assert_eq!(h.hash(), h.clone().hash());
        }
    }
}
