//! # ROC Master - Fisher ROC Protocol Client Library
//!
//! **License:** MIT
//!
//! A master-side implementation of the Fisher ROC serial/TCP protocol in
//! pure Rust, for polling ROC-family flow computers and remote operations
//! controllers over TCP serial gateways.
//!
//! ## Features
//!
//! - **Async I/O**: Tokio-based TCP transport with lazy connect and
//!   transparent reconnection
//! - **TLP Parameter Access**: Read and write device parameters addressed
//!   by (type, logical, parameter) with per-field format tags
//! - **History Retrieval**: Minute and daily history with device-clock
//!   anchored timestamps
//! - **Robust Framing**: Incremental deframing tolerant of TCP
//!   fragmentation, CRC16 verification on every frame
//! - **Built-in Monitoring**: Transport statistics and hex packet logging
//!
//! ## Supported Opcodes
//!
//! | Opcode | Operation | Client |
//! |--------|-----------|--------|
//! | 8 | Set Real-Time Clock | ✅ |
//! | 17 | Operator Login | ✅ |
//! | 120 | Read Alarm/Event/History Pointers | ✅ |
//! | 126 | Read Minute History | ✅ |
//! | 128 | Read Daily History | ✅ |
//! | 180 | Read Parameters by TLP | ✅ |
//! | 181 | Write Parameters by TLP | ✅ |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roc_master::{Address, FormatTag, RocResult, RocTcpClient, Tlp};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> RocResult<()> {
//!     // Connect to a ROC device behind a TCP serial gateway
//!     let mut client = RocTcpClient::from_address("192.168.1.10:4000", Duration::from_secs(5))?;
//!     let device = Address::new(240, 240);
//!
//!     client.login(device).await?;
//!
//!     // Read a float parameter and the clock's day-of-month
//!     let values = client
//!         .read_tlp(
//!             device,
//!             &[Tlp::new(7, 1, 0), Tlp::new(12, 0, 3)],
//!             &[FormatTag::Float32, FormatTag::Int8],
//!         )
//!         .await?;
//!     println!("values: {:?}", values);
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Core error types and result handling
pub mod error;

/// ROC protocol constants: frame layout, opcodes, payload offsets
pub mod constants;

/// CRC16 frame checksum
pub mod crc;

/// TLP addresses, format tags and typed parameter values
pub mod tlp;

/// Payload encoding and decoding for each opcode
pub mod codec;

/// Frame construction, stream deframing and response validation
pub mod frame;

/// Network transport layer for TCP communication
pub mod transport;

/// ROC client implementations
pub mod client;

// ============================================================================
// Public API re-exports
// ============================================================================

pub use client::{GenericRocClient, RocTcpClient, DEFAULT_HOST};
pub use codec::{
    decode_daily_history, decode_minute_history, decode_pointer_table, decode_tlp_fields,
    encode_tlp_fields, DeviceClock, EncodedFields, HistoryRecord, PointerTable,
};
pub use constants::{DEFAULT_OPERATOR_ID, DEFAULT_PASSWORD, DEFAULT_TCP_PORT};
pub use crc::{check_crc, crc16};
pub use error::{RocError, RocResult};
pub use frame::{build_frame, validate_response, Address, Deframer};
pub use tlp::{FormatTag, RocValue, Tlp};
pub use transport::{RocTransport, TcpTransport, TransportStats, DEFAULT_TIMEOUT_MS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
