//! Hashes that truncate a wider digest to 32 bits.

use std::hash::Hasher;

use md5::{Digest, Md5};
use siphasher::sip::SipHasher13;

/// First four bytes of the MD5 digest, little-endian.
pub fn hash_md5(key: &[u8]) -> u32 {
    let digest = Md5::digest(key);
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Low 32 bits of XXH3-64.
pub fn hash_xxh3(key: &[u8]) -> u32 {
    xxhash_rust::xxh3::xxh3_64(key) as u32
}

/// Low 32 bits of SipHash-1-3 with zero keys.
pub fn hash_siphash(key: &[u8]) -> u32 {
    let mut hasher = SipHasher13::new();
    hasher.write(key);
    hasher.finish() as u32
}
