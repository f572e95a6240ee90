//! Core error types and result handling
//!
//! Every protocol failure is surfaced as a distinct [`RocError`] variant
//! carrying enough structured context (opcode, expected vs. actual addresses,
//! offending TLP) for a caller to diagnose without re-parsing raw bytes.

use crate::tlp::Tlp;

/// Result type used throughout the crate.
pub type RocResult<T> = Result<T, RocError>;

/// Error type covering transport, framing and protocol failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RocError {
    /// Recomputed CRC16 over the frame body disagrees with the trailer.
    #[error("CRC mismatch: computed {computed:02X?}, received {received:02X?}")]
    ChecksumMismatch {
        computed: [u8; 2],
        received: [u8; 2],
    },

    /// Response source pair does not match this client's host pair.
    #[error(
        "incorrect host address in response: expected {expected_address}/{expected_group}, \
         got {actual_address}/{actual_group}"
    )]
    HostAddressMismatch {
        expected_address: u8,
        expected_group: u8,
        actual_address: u8,
        actual_group: u8,
    },

    /// Response destination pair does not match the addressed device.
    #[error(
        "incorrect device address in response: expected {expected_address}/{expected_group}, \
         got {actual_address}/{actual_group}"
    )]
    DeviceAddressMismatch {
        expected_address: u8,
        expected_group: u8,
        actual_address: u8,
        actual_group: u8,
    },

    /// Response opcode is neither the requested opcode nor the error opcode.
    #[error("incorrect opcode in response: expected {expected}, got {actual}")]
    OpcodeMismatch { expected: u8, actual: u8 },

    /// Echoed TLP in a read/write response differs from the requested TLP.
    ///
    /// A strong signal of a desynchronized or corrupted exchange.
    #[error("TLP received is not TLP requested at field {index}: expected {expected}, got {actual}")]
    TlpMismatch {
        index: usize,
        expected: Tlp,
        actual: Tlp,
    },

    /// Format tag is not one of the recognized numeric/string kinds.
    #[error("unsupported format tag: {tag:?}")]
    UnsupportedFormatTag { tag: String },

    /// Device answered with the universal error opcode (255).
    ///
    /// `tlp` is the originating TLP of a multi-field request when the device's
    /// error code implicates one, mapped locally from the request field list.
    #[error("device error: opcode {opcode}, error code {code}, tlp {tlp:?}")]
    DeviceError {
        opcode: u8,
        code: u8,
        tlp: Option<Tlp>,
    },

    /// Operation exceeded the configured deadline.
    #[error("operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Transport closed before a complete frame arrived.
    #[error("short read: connection closed after {received} of {expected} bytes")]
    ShortRead { received: usize, expected: usize },

    /// Connection establishment or I/O failure.
    #[error("connection error: {message}")]
    Connection { message: String },

    /// Invalid configuration parameter.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Malformed or inconsistent data.
    #[error("invalid data: {message}")]
    InvalidData { message: String },
}

impl RocError {
    /// Create a connection error.
    pub fn connection<S: Into<String>>(message: S) -> Self {
        RocError::Connection {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        RocError::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        RocError::InvalidData {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout<S: Into<String>>(operation: S, timeout_ms: u64) -> Self {
        RocError::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// True for timeout and short-read failures, where the transport state
    /// is suspect and the caller may want to reconnect.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            RocError::Timeout { .. } | RocError::ShortRead { .. } | RocError::Connection { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RocError::OpcodeMismatch {
            expected: 180,
            actual: 120,
        };
        assert_eq!(
            err.to_string(),
            "incorrect opcode in response: expected 180, got 120"
        );

        let err = RocError::timeout("read frame", 5000);
        assert_eq!(err.to_string(), "operation 'read frame' timed out after 5000ms");
    }

    #[test]
    fn test_device_error_context() {
        let err = RocError::DeviceError {
            opcode: 180,
            code: 2,
            tlp: Some(Tlp::new(12, 0, 4)),
        };
        assert!(err.to_string().contains("error code 2"));
    }

    #[test]
    fn test_is_transport_error() {
        assert!(RocError::timeout("x", 1).is_transport_error());
        assert!(RocError::ShortRead {
            received: 3,
            expected: 10
        }
        .is_transport_error());
        assert!(!RocError::ChecksumMismatch {
            computed: [0, 0],
            received: [1, 1]
        }
        .is_transport_error());
    }
}
