//! ROC protocol constants
//!
//! Frame layout, opcode numbers and payload offsets for the Fisher ROC
//! serial/TCP protocol. Offsets are relative to the start of the frame
//! unless noted otherwise.

// ============================================================================
// Frame Layout Constants
// ============================================================================

/// ROC frame header length
/// Format: Dest Addr(1) + Dest Group(1) + Src Addr(1) + Src Group(1) +
/// Opcode(1) + Length-or-Subcode(1) = 6 bytes
pub const HEADER_LEN: usize = 6;

/// CRC16 trailer length
pub const CRC_LEN: usize = 2;

/// Header offset of the destination address byte
pub const OFFSET_DEST_ADDRESS: usize = 0;

/// Header offset of the destination group byte
pub const OFFSET_DEST_GROUP: usize = 1;

/// Header offset of the source address byte
pub const OFFSET_SRC_ADDRESS: usize = 2;

/// Header offset of the source group byte
pub const OFFSET_SRC_GROUP: usize = 3;

/// Header offset of the opcode byte
pub const OFFSET_OPCODE: usize = 4;

/// Header offset of the payload-length-or-subcode byte
///
/// The deframer reads the literal payload length here; for read/write TLP
/// requests the same slot carries an opcode-specific count instead.
pub const OFFSET_LENGTH: usize = 5;

/// Maximum payload length encodable in the single length byte
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Maximum total frame size: header + max payload + CRC = 263 bytes
pub const MAX_FRAME_SIZE: usize = HEADER_LEN + MAX_PAYLOAD_LEN + CRC_LEN;

// ============================================================================
// Opcodes
// ============================================================================

/// Set real-time clock
pub const OPCODE_SET_CLOCK: u8 = 8;

/// Operator login
pub const OPCODE_LOGIN: u8 = 17;

/// Read alarm/event/history pointers
pub const OPCODE_READ_POINTERS: u8 = 120;

/// Read one hour of minute history for a point
pub const OPCODE_MINUTE_HISTORY: u8 = 126;

/// Read a daily history value for a point/day/month
pub const OPCODE_DAILY_HISTORY: u8 = 128;

/// Read parameters by TLP
pub const OPCODE_READ_TLP: u8 = 180;

/// Write parameters by TLP
pub const OPCODE_WRITE_TLP: u8 = 181;

/// Universal device-reported error opcode
pub const OPCODE_ERROR: u8 = 255;

// ============================================================================
// Error Response Layout
// ============================================================================

/// Frame offset of the error code in an opcode-255 response
pub const ERROR_CODE_OFFSET: usize = 6;

/// Frame offset of the failed opcode in an opcode-255 response
pub const ERROR_OPCODE_OFFSET: usize = 7;

// ============================================================================
// Operation Payload Layout
// ============================================================================

/// Size of the TLP address on the wire: type + location + parameter
pub const TLP_LEN: usize = 3;

/// Byte count of the opcode 120 pointer table (frame offsets 6..32)
pub const POINTER_TABLE_LEN: usize = 26;

/// Number of slots in a minute-history response
pub const MINUTE_HISTORY_SLOTS: usize = 60;

/// Payload offset of the single float value in a daily-history response
/// (frame offset 109)
pub const DAILY_HISTORY_VALUE_OFFSET: usize = 103;

/// Default login operator ID ("LOI")
pub const DEFAULT_OPERATOR_ID: [u8; 3] = *b"LOI";

/// Default login password
pub const DEFAULT_PASSWORD: u16 = 1000;

/// Default ROC TCP port
pub const DEFAULT_TCP_PORT: u16 = 4000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        assert_eq!(HEADER_LEN, 6);
        assert_eq!(MAX_FRAME_SIZE, 263);
        assert_eq!(OFFSET_LENGTH, HEADER_LEN - 1);
    }

    #[test]
    fn test_daily_history_offset() {
        // The value sits at frame offset 109; payload offsets are
        // frame offsets minus the 6-byte header.
        assert_eq!(DAILY_HISTORY_VALUE_OFFSET + HEADER_LEN, 109);
    }

    #[test]
    fn test_default_login_bytes() {
        // Wire form of the default credentials: "LOI" + password big-endian.
        let mut payload = DEFAULT_OPERATOR_ID.to_vec();
        payload.extend_from_slice(&DEFAULT_PASSWORD.to_be_bytes());
        assert_eq!(payload, [76, 79, 73, 3, 232]);
    }
}
