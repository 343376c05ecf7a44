//! Paul Hsieh's SuperFastHash.

fn get16bits(bytes: &[u8]) -> u32 {
    u32::from(bytes[0]) | (u32::from(bytes[1]) << 8)
}

pub fn hash_hsieh(key: &[u8]) -> u32 {
    if key.is_empty() {
        return 0;
    }

    let mut hash: u32 = 0;
    let mut blocks = key.chunks_exact(4);
    for block in &mut blocks {
        hash = hash.wrapping_add(get16bits(&block[0..2]));
        let tmp = (get16bits(&block[2..4]) << 11) ^ hash;
        hash = (hash << 16) ^ tmp;
        hash = hash.wrapping_add(hash >> 11);
    }

    let tail = blocks.remainder();
    match tail.len() {
        3 => {
            hash = hash.wrapping_add(get16bits(&tail[0..2]));
            hash ^= hash << 16;
            hash ^= u32::from(tail[2]) << 18;
            hash = hash.wrapping_add(hash >> 11);
        }
        2 => {
            hash = hash.wrapping_add(get16bits(&tail[0..2]));
            hash ^= hash << 11;
            hash = hash.wrapping_add(hash >> 17);
        }
        1 => {
            hash = hash.wrapping_add(u32::from(tail[0]));
            hash ^= hash << 10;
            hash = hash.wrapping_add(hash >> 1);
        }
        _ => {}
    }

    // Force "avalanching" of final 127 bits.
    hash ^= hash << 3;
    hash = hash.wrapping_add(hash >> 5);
    hash ^= hash << 4;
    hash = hash.wrapping_add(hash >> 17);
    hash ^= hash << 25;
    hash.wrapping_add(hash >> 6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_zero() {
        assert_eq!(hash_hsieh(b""), 0);
    }

    #[test]
    fn test_every_tail_length_contributes() {
        let keys: [&[u8]; 4] = [b"abcd", b"abcde", b"abcdef", b"abcdefg"];
        let hashes: std::collections::HashSet<u32> = keys.iter().map(|k| hash_hsieh(k)).collect();
        assert_eq!(hashes.len(), keys.len());
    }
}
