//! Module: hash
//! Responsibility: stable, deterministic hashing helpers used for
//! diagnostics (observability payloads) independent of `std`'s randomized
//! `HashMap` hasher.
//! Does not own: the `Hash`/`Eq` impls that back `DistinctIndex`'s map
//! itself — those come from the row key's own derive.
//! Boundary: pure functions over bytes; no I/O, no allocation beyond input.

use xxhash_rust::xxh3::Xxh3;

/// Stable 64-bit digest, deterministic across process restarts and
/// platforms. Used only for diagnostics (event payloads, test assertions);
/// never for map bucketing, which uses `std`'s `Hash`/`Eq` directly.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct StableHash(pub u64);

impl StableHash {
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Hash an ordered sequence of byte slices (e.g. a row key's canonical
/// encoding) into one stable digest. Order-sensitive: swapping two slices
/// changes the result, matching row-key prefix semantics.
#[must_use]
pub fn stable_hash_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> StableHash {
    let mut hasher = Xxh3::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_be_bytes());
        hasher.update(part);
    }

    StableHash(hasher.digest())
}

/// FNV-1a 64-bit hash (compile-time safe).
///
/// Used only for small static identifiers where `const fn` evaluation
/// matters; not used for row-key hashing, which goes through
/// [`stable_hash_parts`].
#[must_use]
#[allow(clippy::unreadable_literal)]
pub const fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    let mut i = 0;

    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(0x1000_0000_1b3);
        i += 1;
    }

    hash
}
