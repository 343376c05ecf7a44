//! CRC based hashes.

/// CRC-16/XMODEM (polynomial 0x1021, zero initial value).
pub fn hash_crc16(key: &[u8]) -> u32 {
    let crc = key.iter().fold(0u16, |mut crc, &b| {
        crc ^= u16::from(b) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
        crc
    });
    u32::from(crc)
}

/// Fifteen bits taken from the upper half of the IEEE CRC-32.
pub fn hash_crc32(key: &[u8]) -> u32 {
    (crc32fast::hash(key) >> 16) & 0x7fff
}

/// The full IEEE CRC-32.
pub fn hash_crc32a(key: &[u8]) -> u32 {
    crc32fast::hash(key)
}
