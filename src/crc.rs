//! CRC16 engine
//!
//! The ROC protocol protects every frame with CRC-16/ARC (polynomial 0x8005
//! reflected, initial value 0x0000), transmitted low byte first. The same
//! table-driven algorithm ships in the `crc` crate registry.

use crc::{Crc, CRC_16_ARC};

/// CRC calculator for ROC frames
const CRC_ROC: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// Compute the ROC CRC16 over a byte sequence.
///
/// Returns the two trailer bytes in wire order (low byte first). Pure and
/// deterministic; the empty sequence is a valid input.
#[inline]
pub fn crc16(data: &[u8]) -> [u8; 2] {
    CRC_ROC.checksum(data).to_le_bytes()
}

/// Check a frame's CRC trailer against the bytes preceding it.
///
/// `frame` must include the 2-byte trailer; shorter inputs fail the check.
pub fn check_crc(frame: &[u8]) -> bool {
    if frame.len() < 2 {
        return false;
    }
    let (body, trailer) = frame.split_at(frame.len() - 2);
    crc16(body) == [trailer[0], trailer[1]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_crc16_known_vectors() {
        // CRC-16/ARC check value from the algorithm registry.
        assert_eq!(crc16(b"123456789"), 0xBB3Du16.to_le_bytes());
        assert_eq!(crc16(&[]), [0x00, 0x00]);
    }

    #[test]
    fn test_check_crc_roundtrip() {
        let mut frame = vec![1, 2, 3, 1, 180, 0];
        frame.extend_from_slice(&crc16(&[1, 2, 3, 1, 180, 0]));
        assert!(check_crc(&frame));

        frame[0] ^= 0x01;
        assert!(!check_crc(&frame));
    }

    #[test]
    fn test_check_crc_short_input() {
        assert!(!check_crc(&[]));
        assert!(!check_crc(&[0x12]));
    }

    proptest! {
        #[test]
        fn prop_crc_deterministic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            prop_assert_eq!(crc16(&data), crc16(&data));
        }

        #[test]
        fn prop_crc_single_bit_flip_detected(
            data in proptest::collection::vec(any::<u8>(), 1..128),
            bit in 0usize..8,
            idx_seed in any::<usize>(),
        ) {
            let mut frame = data.clone();
            frame.extend_from_slice(&crc16(&data));
            prop_assert!(check_crc(&frame));

            // Flip one bit anywhere in body or trailer; CRC-16 detects all
            // single-bit errors.
            let idx = idx_seed % frame.len();
            frame[idx] ^= 1 << bit;
            prop_assert!(!check_crc(&frame));
        }
    }
}
