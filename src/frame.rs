//! # ROC Frame Handling
//!
//! Frame construction, stream deframing and response validation.
//!
//! A ROC frame is a 6-byte header (destination pair, source pair, opcode,
//! length-or-subcode), a variable payload, and a CRC16 trailer. Frames are
//! not delimited by the transport; the [`Deframer`] reconstructs them from
//! the byte stream using the length byte at header offset 5.

use bytes::BytesMut;

use crate::constants::{
    CRC_LEN, ERROR_CODE_OFFSET, ERROR_OPCODE_OFFSET, HEADER_LEN, OFFSET_LENGTH, OPCODE_ERROR,
};
use crate::crc::{check_crc, crc16};
use crate::error::{RocError, RocResult};
use crate::tlp::Tlp;

/// An (address, group) pair identifying one protocol endpoint.
///
/// The host pair identifies this client and is fixed at construction; the
/// device pair identifies the addressed remote controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub address: u8,
    pub group: u8,
}

impl Address {
    /// Create an address pair.
    #[inline]
    pub const fn new(address: u8, group: u8) -> Self {
        Self { address, group }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.address, self.group)
    }
}

impl From<(u8, u8)> for Address {
    fn from((address, group): (u8, u8)) -> Self {
        Self::new(address, group)
    }
}

// ============================================================================
// Frame Builder
// ============================================================================

/// Assemble an outbound frame: header, payload, CRC16 trailer.
///
/// The 6th header byte carries either a literal payload length or an
/// opcode-specific subcode; the caller decides which, per opcode. Payload
/// content is not validated here.
pub fn build_frame(
    device: Address,
    host: Address,
    opcode: u8,
    len_or_subcode: u8,
    payload: &[u8],
) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len() + CRC_LEN);
    frame.push(device.address);
    frame.push(device.group);
    frame.push(host.address);
    frame.push(host.group);
    frame.push(opcode);
    frame.push(len_or_subcode);
    frame.extend_from_slice(payload);

    let crc = crc16(&frame);
    frame.extend_from_slice(&crc);
    frame
}

// ============================================================================
// Stream Deframer
// ============================================================================

/// Incremental frame reconstruction from a continuous byte stream.
///
/// Bytes are fed in as they arrive, in chunks of any size; once the first
/// six header bytes are buffered the total frame length is fixed at
/// `6 + length_byte + 2` and the frame is released when complete. Partial
/// delivery across many reads is the expected case.
#[derive(Debug, Default)]
pub struct Deframer {
    buf: BytesMut,
    expected: Option<usize>,
}

impl Deframer {
    /// Create an empty deframer.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
            expected: None,
        }
    }

    /// Feed received bytes; returns a frame once one is complete.
    ///
    /// Bytes beyond the frame boundary stay buffered for the next frame.
    pub fn extend(&mut self, data: &[u8]) -> Option<Vec<u8>> {
        self.buf.extend_from_slice(data);
        self.try_extract()
    }

    /// Total frame length, once known from the header length byte.
    pub fn frame_len(&self) -> Option<usize> {
        self.expected
    }

    /// Number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop any buffered bytes and forget the in-progress frame.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.expected = None;
    }

    fn try_extract(&mut self) -> Option<Vec<u8>> {
        if self.expected.is_none() && self.buf.len() >= HEADER_LEN {
            let payload_len = self.buf[OFFSET_LENGTH] as usize;
            self.expected = Some(HEADER_LEN + payload_len + CRC_LEN);
        }

        match self.expected {
            Some(total) if self.buf.len() >= total => {
                let frame = self.buf.split_to(total).to_vec();
                self.expected = None;
                Some(frame)
            }
            _ => None,
        }
    }
}

// ============================================================================
// Frame Validator
// ============================================================================

/// Validate a response frame and strip it to its payload.
///
/// Checks, in order: CRC trailer, host pair echo (positions 0-1), device
/// pair echo (positions 2-3), opcode. Opcode 255 is the device's universal
/// error signal; the error code and failed opcode sit at fixed payload
/// offsets, and for TLP-bearing requests the code maps back to the
/// originating request TLP without re-querying the device.
///
/// On success returns the payload slice, header and trailer removed.
pub fn validate_response<'a>(
    frame: &'a [u8],
    host: Address,
    device: Address,
    expected_opcode: u8,
    request_tlps: &[Tlp],
) -> RocResult<&'a [u8]> {
    if frame.len() < HEADER_LEN + CRC_LEN {
        return Err(RocError::ShortRead {
            received: frame.len(),
            expected: HEADER_LEN + CRC_LEN,
        });
    }

    if !check_crc(frame) {
        let body = &frame[..frame.len() - CRC_LEN];
        return Err(RocError::ChecksumMismatch {
            computed: crc16(body),
            received: [frame[frame.len() - 2], frame[frame.len() - 1]],
        });
    }

    if frame[0] != host.address || frame[1] != host.group {
        return Err(RocError::HostAddressMismatch {
            expected_address: host.address,
            expected_group: host.group,
            actual_address: frame[0],
            actual_group: frame[1],
        });
    }

    if frame[2] != device.address || frame[3] != device.group {
        return Err(RocError::DeviceAddressMismatch {
            expected_address: device.address,
            expected_group: device.group,
            actual_address: frame[2],
            actual_group: frame[3],
        });
    }

    let opcode = frame[4];
    if opcode == OPCODE_ERROR {
        let code = frame.get(ERROR_CODE_OFFSET).copied().unwrap_or(0);
        let failed_opcode = frame
            .get(ERROR_OPCODE_OFFSET)
            .copied()
            .unwrap_or(expected_opcode);
        // Error code N implicates the Nth request field, when one exists.
        let tlp = (code as usize)
            .checked_sub(1)
            .and_then(|i| request_tlps.get(i))
            .copied();
        return Err(RocError::DeviceError {
            opcode: failed_opcode,
            code,
            tlp,
        });
    }
    if opcode != expected_opcode {
        return Err(RocError::OpcodeMismatch {
            expected: expected_opcode,
            actual: opcode,
        });
    }

    let payload_len = frame[OFFSET_LENGTH] as usize;
    let end = HEADER_LEN + payload_len;
    if frame.len() < end + CRC_LEN {
        return Err(RocError::invalid_data(format!(
            "frame length {} inconsistent with length byte {}",
            frame.len(),
            payload_len
        )));
    }

    Ok(&frame[HEADER_LEN..end])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HOST: Address = Address::new(1, 3);
    const DEVICE: Address = Address::new(240, 240);

    /// A response frame as the device would send it: addressed back to the
    /// host, source set to the device.
    fn response_frame(opcode: u8, payload: &[u8]) -> Vec<u8> {
        build_frame(HOST, DEVICE, opcode, payload.len() as u8, payload)
    }

    #[test]
    fn test_build_frame_layout() {
        let frame = build_frame(DEVICE, HOST, 120, 0, &[]);
        assert_eq!(frame.len(), HEADER_LEN + CRC_LEN);
        assert_eq!(&frame[..6], &[240, 240, 1, 3, 120, 0]);
        assert!(check_crc(&frame));
    }

    #[test]
    fn test_build_frame_with_payload() {
        let frame = build_frame(DEVICE, HOST, 180, 4, &[1, 12, 0, 5]);
        assert_eq!(frame.len(), 6 + 4 + 2);
        assert_eq!(frame[5], 4);
        assert_eq!(&frame[6..10], &[1, 12, 0, 5]);
        assert!(check_crc(&frame));
    }

    #[test]
    fn test_deframer_whole_frame() {
        let frame = response_frame(120, &[0u8; 26]);
        let mut deframer = Deframer::new();
        assert_eq!(deframer.extend(&frame), Some(frame));
    }

    #[test]
    fn test_deframer_byte_at_a_time() {
        let frame = response_frame(180, &[1, 12, 0, 5, 7]);
        let mut deframer = Deframer::new();

        for &b in &frame[..frame.len() - 1] {
            assert_eq!(deframer.extend(&[b]), None);
        }
        assert_eq!(
            deframer.extend(&[frame[frame.len() - 1]]),
            Some(frame.clone())
        );
        assert_eq!(deframer.buffered(), 0);
    }

    #[test]
    fn test_deframer_length_discovery() {
        let frame = response_frame(17, &[1, 2, 3]);
        let mut deframer = Deframer::new();
        deframer.extend(&frame[..5]);
        assert_eq!(deframer.frame_len(), None);
        deframer.extend(&frame[5..6]);
        assert_eq!(deframer.frame_len(), Some(frame.len()));
    }

    #[test]
    fn test_deframer_keeps_excess_bytes() {
        let first = response_frame(17, &[]);
        let second = response_frame(120, &[0u8; 26]);
        let mut stream = first.clone();
        stream.extend_from_slice(&second);

        let mut deframer = Deframer::new();
        assert_eq!(deframer.extend(&stream), Some(first));
        assert_eq!(deframer.buffered(), second.len());
        assert_eq!(deframer.extend(&[]), Some(second));
    }

    #[test]
    fn test_validate_success_strips_payload() {
        let frame = response_frame(180, &[1, 12, 0, 5, 7]);
        let payload = validate_response(&frame, HOST, DEVICE, 180, &[]).unwrap();
        assert_eq!(payload, &[1, 12, 0, 5, 7]);
    }

    #[test]
    fn test_validate_crc_mismatch() {
        let mut frame = response_frame(180, &[1]);
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        assert!(matches!(
            validate_response(&frame, HOST, DEVICE, 180, &[]),
            Err(RocError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_swapped_addresses_rejected() {
        // Host and device pairs swapped; the frame is otherwise valid.
        let frame = build_frame(DEVICE, HOST, 180, 0, &[]);
        assert!(matches!(
            validate_response(&frame, HOST, DEVICE, 180, &[]),
            Err(RocError::HostAddressMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_device_mismatch() {
        let frame = build_frame(HOST, Address::new(241, 240), 180, 0, &[]);
        assert!(matches!(
            validate_response(&frame, HOST, DEVICE, 180, &[]),
            Err(RocError::DeviceAddressMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_opcode_mismatch() {
        let frame = response_frame(120, &[0u8; 26]);
        assert!(matches!(
            validate_response(&frame, HOST, DEVICE, 180, &[]),
            Err(RocError::OpcodeMismatch {
                expected: 180,
                actual: 120
            })
        ));
    }

    #[test]
    fn test_validate_device_error_maps_tlp_context() {
        // Opcode 255 with error code 2: the second request TLP is at fault.
        let tlps = [Tlp::new(12, 0, 5), Tlp::new(10, 1, 3), Tlp::new(17, 0, 9)];
        let frame = response_frame(OPCODE_ERROR, &[2, 180]);

        match validate_response(&frame, HOST, DEVICE, 180, &tlps) {
            Err(RocError::DeviceError { opcode, code, tlp }) => {
                assert_eq!(opcode, 180);
                assert_eq!(code, 2);
                assert_eq!(tlp, Some(Tlp::new(10, 1, 3)));
            }
            other => panic!("expected DeviceError, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_device_error_without_tlp_context() {
        let frame = response_frame(OPCODE_ERROR, &[9, 17]);
        match validate_response(&frame, HOST, DEVICE, 17, &[]) {
            Err(RocError::DeviceError { opcode, code, tlp }) => {
                assert_eq!(opcode, 17);
                assert_eq!(code, 9);
                assert_eq!(tlp, None);
            }
            other => panic!("expected DeviceError, got {:?}", other),
        }
    }

    proptest! {
        /// Fragmentation invariance: any chunking of a valid frame yields
        /// the same frame as delivering it whole.
        #[test]
        fn prop_deframer_fragmentation(
            payload in proptest::collection::vec(any::<u8>(), 0..64),
            cuts in proptest::collection::vec(1usize..8, 0..32),
        ) {
            let frame = response_frame(180, &payload);

            let mut deframer = Deframer::new();
            let mut result = None;
            let mut pos = 0;
            for cut in cuts {
                if pos >= frame.len() {
                    break;
                }
                let end = (pos + cut).min(frame.len());
                if let Some(f) = deframer.extend(&frame[pos..end]) {
                    result = Some(f);
                }
                pos = end;
            }
            if pos < frame.len() {
                if let Some(f) = deframer.extend(&frame[pos..]) {
                    result = Some(f);
                }
            }

            prop_assert_eq!(result, Some(frame));
        }
    }
}
