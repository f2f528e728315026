use crc::{Crc, CRC_8_AUTOSAR};

/// CRC-8H2F used by E2E Profile 2.
///
/// Polynomial 0x2F, MSB first, init 0xFF, final XOR 0xFF. The lookup table is
/// built at compile time and shared by every profile instance.
pub const CRC8_H2F: Crc<u8> = Crc::<u8>::new(&CRC_8_AUTOSAR);

/// Compute CRC-8H2F over the concatenation of `segments`
pub fn compute_crc8_h2f(segments: &[&[u8]]) -> u8 {
    let mut digest = CRC8_H2F.digest();
    for segment in segments {
        digest.update(segment);
    }
    digest.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Table built the long way: MSB first, shift 8 times, xor 0x2F on carry.
    fn reference_table() -> [u8; 256] {
        let mut table = [0u8; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut crc = i as u8;
            for _ in 0..8 {
                crc = if crc & 0x80 != 0 {
                    (crc << 1) ^ 0x2F
                } else {
                    crc << 1
                };
            }
            *entry = crc;
        }
        table
    }

    fn reference_crc(data: &[u8]) -> u8 {
        let table = reference_table();
        let crc = data
            .iter()
            .fold(0xFFu8, |crc, &byte| table[(crc ^ byte) as usize]);
        !crc
    }

    #[test]
    fn test_crc8_h2f_check_value() {
        assert_eq!(compute_crc8_h2f(&[&b"123456789"[..]]), 0xDF);
    }

    #[test]
    fn test_reference_table_shape() {
        let table = reference_table();
        assert_eq!(table[0], 0x00);
        assert_eq!(table[1], 0x2F);
        assert_eq!(table[2], 0x5E);
        assert_eq!(table[255], 0x42);
    }

    #[test]
    fn test_matches_table_driven_reference() {
        let inputs: [&[u8]; 4] = [
            &[0x12, 0x34, 0x11, 0x34, 0xAA, 0xBB],
            &[0x00],
            &[0xFF; 64],
            b"AUTOSAR E2E profile 2",
        ];
        for input in inputs {
            assert_eq!(compute_crc8_h2f(&[input]), reference_crc(input));
        }
    }

    #[test]
    fn test_segments_are_concatenated() {
        let whole: [u8; 6] = [0x12, 0x34, 0x11, 0x34, 0xAA, 0xBB];
        let split = compute_crc8_h2f(&[&whole[..2], &whole[2..4], &whole[4..]]);
        let whole = compute_crc8_h2f(&[&whole[..]]);
        assert_eq!(whole, split);
        assert_eq!(whole, 0x93);
    }
}
