//! Fowler-Noll-Vo hashes, truncated to 32 bits.

const FNV_64_INIT: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_64_PRIME: u64 = 0x0000_0100_0000_01b3;
const FNV_32_INIT: u32 = 2_166_136_261;
const FNV_32_PRIME: u32 = 16_777_619;

pub fn hash_fnv1_64(key: &[u8]) -> u32 {
    let hash = key.iter().fold(FNV_64_INIT, |hash, &b| {
        hash.wrapping_mul(FNV_64_PRIME) ^ u64::from(b)
    });
    hash as u32
}

/// FNV-1a with the 64-bit constants, computed in 32 bits. The low word of a
/// multiplication depends only on the low words of its operands, so this is
/// the low half of the full 64-bit FNV-1a.
pub fn hash_fnv1a_64(key: &[u8]) -> u32 {
    key.iter().fold(FNV_64_INIT as u32, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV_64_PRIME as u32)
    })
}

pub fn hash_fnv1_32(key: &[u8]) -> u32 {
    key.iter().fold(FNV_32_INIT, |hash, &b| {
        hash.wrapping_mul(FNV_32_PRIME) ^ u32::from(b)
    })
}

pub fn hash_fnv1a_32(key: &[u8]) -> u32 {
    key.iter().fold(FNV_32_INIT, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV_32_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv_32() {
        assert_eq!(hash_fnv1_32(b""), 0x811c_9dc5);
        assert_eq!(hash_fnv1_32(b"a"), 0x050c_5d7e);
        assert_eq!(hash_fnv1a_32(b""), 0x811c_9dc5);
        assert_eq!(hash_fnv1a_32(b"a"), 0xe40c_292c);
    }

    #[test]
    fn test_fnv_64_low_word() {
        // FNV-1 64 of "a" is 0xaf63bd4c8601b7be, FNV-1a 64 is 0xaf63dc4c8601ec8c.
        assert_eq!(hash_fnv1_64(b"a"), 0x8601_b7be);
        assert_eq!(hash_fnv1a_64(b"a"), 0x8601_ec8c);
    }
}
