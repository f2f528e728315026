const NIBBLE_MASK: u8 = 0x0F;
const MAX_COUNTER_BYTES: usize = 8;

/// Pack two 4-bit values into one byte, `high` in bits 7..4
pub fn compose_nibbles(high: u8, low: u8) -> u8 {
    ((high & NIBBLE_MASK) << 4) | (low & NIBBLE_MASK)
}

pub fn low_nibble(value: u8) -> u8 {
    value & NIBBLE_MASK
}

/// Encode `counter` little-endian into `width` bytes.
///
/// Positions past the eighth byte stay zero.
pub fn encode_le_counter(counter: u64, width: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; width];
    let used = width.min(MAX_COUNTER_BYTES);
    bytes[..used].copy_from_slice(&counter.to_le_bytes()[..used]);
    bytes
}

/// Decode a little-endian counter, ignoring bytes past the eighth.
pub fn decode_le_counter(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; MAX_COUNTER_BYTES];
    let used = bytes.len().min(MAX_COUNTER_BYTES);
    buf[..used].copy_from_slice(&bytes[..used]);
    u64::from_le_bytes(buf)
}

/// Copy `low` over the first bytes of `template`.
pub fn overlay_low_bytes(template: &mut [u8], low: &[u8]) {
    let len = template.len().min(low.len());
    template[..len].copy_from_slice(&low[..len]);
}
