//! High-level ROC client implementations
//!
//! This module provides the user-facing master-side interface for ROC
//! communication, abstracting away frame construction and validation.
//!
//! # Architecture
//!
//! Every ROC operation is the same exchange: build a frame, send it, read
//! one frame back, validate the echoed addresses and opcode, decode the
//! payload. [`GenericRocClient`] implements that pipeline once over any
//! [`RocTransport`]; each opcode method supplies only its payload encoding
//! and response decoding. [`RocTcpClient`] binds the generic client to TCP.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use roc_master::{Address, FormatTag, RocResult, RocTcpClient, Tlp};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> RocResult<()> {
//!     let mut client = RocTcpClient::from_address("192.168.1.10:4000", Duration::from_secs(5))?;
//!     let device = Address::new(240, 240);
//!
//!     client.login(device).await?;
//!
//!     // Read the clock's 2-digit year, TLP (12, 0, 5).
//!     let values = client
//!         .read_tlp(device, &[Tlp::new(12, 0, 5)], &[FormatTag::Int8])
//!         .await?;
//!     println!("year: {}", values[0]);
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use tracing::debug;

use crate::codec::{
    decode_daily_history, decode_minute_history, decode_pointer_table, decode_tlp_fields,
    encode_tlp_fields, DeviceClock, HistoryRecord, PointerTable,
};
use crate::constants::{
    DEFAULT_OPERATOR_ID, DEFAULT_PASSWORD, MAX_PAYLOAD_LEN, OPCODE_DAILY_HISTORY, OPCODE_LOGIN,
    OPCODE_MINUTE_HISTORY, OPCODE_READ_POINTERS, OPCODE_READ_TLP, OPCODE_SET_CLOCK,
    OPCODE_WRITE_TLP, TLP_LEN,
};
use crate::error::{RocError, RocResult};
use crate::frame::{build_frame, validate_response, Address};
use crate::tlp::{FormatTag, RocValue, Tlp};
use crate::transport::{RocTransport, TcpTransport, TransportStats};

/// Default host pair a master identifies itself with.
pub const DEFAULT_HOST: Address = Address::new(1, 3);

/// Subcode selecting the minute-history table in an opcode 126 request.
const MINUTE_HISTORY_SUBCODE: u8 = 1;

/// The four clock parameters on the real-time clock point, most significant
/// first: year, month, day, hour.
const CLOCK_TLPS: [Tlp; 4] = [
    Tlp::new(12, 0, 5),
    Tlp::new(12, 0, 4),
    Tlp::new(12, 0, 3),
    Tlp::new(12, 0, 2),
];

// ============================================================================
// Generic Client
// ============================================================================

/// ROC master client over an arbitrary transport.
///
/// Holds the fixed host pair this client answers to; the device pair is an
/// argument to every operation so one client can poll several controllers
/// behind the same gateway.
pub struct GenericRocClient<T: RocTransport> {
    transport: T,
    host: Address,
}

impl<T: RocTransport> GenericRocClient<T> {
    /// Create a client over an existing transport.
    pub fn new(transport: T, host: Address) -> Self {
        Self { transport, host }
    }

    /// The host pair this client identifies itself with.
    pub fn host(&self) -> Address {
        self.host
    }

    /// Snapshot of the transport counters.
    pub fn get_stats(&self) -> TransportStats {
        self.transport.get_stats()
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> RocResult<()> {
        self.transport.close().await
    }

    /// One request/response exchange.
    ///
    /// `context_tlps` are the TLP addresses carried by the request, used to
    /// name the offending field when the device answers with opcode 255.
    async fn execute(
        &mut self,
        device: Address,
        opcode: u8,
        len_or_subcode: u8,
        payload: &[u8],
        context_tlps: &[Tlp],
    ) -> RocResult<Vec<u8>> {
        let request = build_frame(device, self.host, opcode, len_or_subcode, payload);
        self.transport.send_frame(&request).await?;

        let response = self.transport.read_frame().await?;
        let body = validate_response(&response, self.host, device, opcode, context_tlps)?;
        Ok(body.to_vec())
    }

    // ========================================================================
    // Session Operations
    // ========================================================================

    /// Log in with the default operator ID and password.
    pub async fn login(&mut self, device: Address) -> RocResult<()> {
        self.login_with(device, DEFAULT_OPERATOR_ID, DEFAULT_PASSWORD)
            .await
    }

    /// Log in with explicit credentials (opcode 17).
    ///
    /// The password travels big-endian, unlike data values. Devices with
    /// security disabled accept any credentials; a rejection arrives as a
    /// [`RocError::DeviceError`].
    pub async fn login_with(
        &mut self,
        device: Address,
        operator_id: [u8; 3],
        password: u16,
    ) -> RocResult<()> {
        let mut payload = operator_id.to_vec();
        payload.extend_from_slice(&password.to_be_bytes());

        self.execute(device, OPCODE_LOGIN, payload.len() as u8, &payload, &[])
            .await?;
        debug!("Logged in to device {}", device);
        Ok(())
    }

    /// Set the device real-time clock (opcode 8).
    ///
    /// `year` is the 2-digit year, 2000-based, matching the clock point's
    /// own representation.
    #[allow(clippy::too_many_arguments)]
    pub async fn set_clock(
        &mut self,
        device: Address,
        second: u8,
        minute: u8,
        hour: u8,
        day: u8,
        month: u8,
        year: u8,
    ) -> RocResult<()> {
        let payload = [second, minute, hour, day, month, year];
        let body = self
            .execute(device, OPCODE_SET_CLOCK, payload.len() as u8, &payload, &[])
            .await?;
        if !body.is_empty() {
            return Err(RocError::invalid_data(format!(
                "set clock acknowledgement carries {} unexpected bytes",
                body.len()
            )));
        }
        Ok(())
    }

    /// Read the device clock as year/month/day/hour.
    ///
    /// Issues an opcode 180 read of the four clock parameters. The result
    /// anchors history timestamps; see [`read_minute_history`].
    ///
    /// [`read_minute_history`]: Self::read_minute_history
    pub async fn read_clock(&mut self, device: Address) -> RocResult<DeviceClock> {
        let tags = [FormatTag::Int8; 4];
        let values = self.read_tlp(device, &CLOCK_TLPS, &tags).await?;

        let mut parts = [0u8; 4];
        for (slot, value) in parts.iter_mut().zip(&values) {
            let raw = value.as_i64();
            *slot = u8::try_from(raw).map_err(|_| {
                RocError::invalid_data(format!("clock component out of range: {}", raw))
            })?;
        }

        Ok(DeviceClock {
            year: parts[0],
            month: parts[1],
            day: parts[2],
            hour: parts[3],
        })
    }

    // ========================================================================
    // Parameter Operations
    // ========================================================================

    /// Read parameters by TLP address (opcode 180).
    ///
    /// `tlps` and `tags` run in parallel: one format tag per requested
    /// parameter, in request order. The device echoes each TLP ahead of its
    /// value; a mismatched echo fails the whole read.
    pub async fn read_tlp(
        &mut self,
        device: Address,
        tlps: &[Tlp],
        tags: &[FormatTag],
    ) -> RocResult<Vec<RocValue>> {
        if tlps.is_empty() {
            return Err(RocError::configuration("no TLPs requested"));
        }
        if tlps.len() != tags.len() {
            return Err(RocError::configuration(format!(
                "{} TLPs but {} format tags",
                tlps.len(),
                tags.len()
            )));
        }
        // The header length slot is one byte; the request payload is the
        // count byte plus 3 bytes per TLP, so 84 TLPs is the ceiling.
        let payload_len = 1 + tlps.len() * TLP_LEN;
        if payload_len > MAX_PAYLOAD_LEN {
            return Err(RocError::configuration(format!(
                "{} TLPs need a {}-byte payload, exceeding the one-byte length slot",
                tlps.len(),
                payload_len
            )));
        }
        let count = tlps.len() as u8;

        let mut payload = Vec::with_capacity(1 + tlps.len() * TLP_LEN);
        payload.push(count);
        for tlp in tlps {
            payload.extend_from_slice(&tlp.to_bytes());
        }

        let body = self
            .execute(device, OPCODE_READ_TLP, payload.len() as u8, &payload, tlps)
            .await?;

        if body.first() != Some(&count) {
            return Err(RocError::invalid_data(format!(
                "read response reports {:?} parameters, requested {}",
                body.first(),
                count
            )));
        }
        decode_tlp_fields(&body[1..], tlps, tags)
    }

    /// Write parameters by TLP address (opcode 181).
    ///
    /// `tlps`, `tags` and `values` run in parallel. Success is a bare
    /// acknowledgement frame with an empty payload.
    pub async fn write_tlp(
        &mut self,
        device: Address,
        tlps: &[Tlp],
        tags: &[FormatTag],
        values: &[RocValue],
    ) -> RocResult<()> {
        let encoded = encode_tlp_fields(tlps, tags, values)?;

        let mut payload = Vec::with_capacity(1 + encoded.bytes.len());
        payload.push(encoded.field_count);
        payload.extend_from_slice(&encoded.bytes);

        let body = self
            .execute(device, OPCODE_WRITE_TLP, encoded.data_len, &payload, tlps)
            .await?;

        if !body.is_empty() {
            return Err(RocError::invalid_data(format!(
                "write acknowledgement carries {} unexpected bytes",
                body.len()
            )));
        }
        Ok(())
    }

    // ========================================================================
    // History Operations
    // ========================================================================

    /// Read the alarm/event/history pointer table (opcode 120).
    pub async fn read_pointers(&mut self, device: Address) -> RocResult<PointerTable> {
        let body = self
            .execute(device, OPCODE_READ_POINTERS, 0, &[], &[])
            .await?;
        decode_pointer_table(&body)
    }

    /// Read the last hour of minute history for a point (opcode 126).
    ///
    /// Reads the device clock first, then timestamps the 60 slots against
    /// it. Use [`read_minute_history_at`] to supply a clock already in hand.
    ///
    /// [`read_minute_history_at`]: Self::read_minute_history_at
    pub async fn read_minute_history(
        &mut self,
        device: Address,
        point: u8,
    ) -> RocResult<Vec<HistoryRecord>> {
        let clock = self.read_clock(device).await?;
        self.read_minute_history_at(device, point, &clock).await
    }

    /// Read the last hour of minute history, timestamped against a clock
    /// reading supplied by the caller.
    pub async fn read_minute_history_at(
        &mut self,
        device: Address,
        point: u8,
        clock: &DeviceClock,
    ) -> RocResult<Vec<HistoryRecord>> {
        let body = self
            .execute(
                device,
                OPCODE_MINUTE_HISTORY,
                MINUTE_HISTORY_SUBCODE,
                &[point],
                &[],
            )
            .await?;
        decode_minute_history(&body, point, clock)
    }

    /// Read one daily history value for a point and date (opcode 128).
    pub async fn read_daily_history(
        &mut self,
        device: Address,
        point: u8,
        day: u8,
        month: u8,
    ) -> RocResult<f32> {
        let payload = [point, day, month];
        let body = self
            .execute(
                device,
                OPCODE_DAILY_HISTORY,
                payload.len() as u8,
                &payload,
                &[],
            )
            .await?;
        decode_daily_history(&body, day, month)
    }
}

// ============================================================================
// TCP Client
// ============================================================================

/// ROC master client over TCP.
///
/// Thin wrapper binding [`GenericRocClient`] to a [`TcpTransport`]. The
/// connection is established lazily on first use and replaced once,
/// transparently, if the gateway drops it.
pub struct RocTcpClient {
    inner: GenericRocClient<TcpTransport>,
}

impl RocTcpClient {
    /// Create a client for the given socket address with the default host
    /// pair.
    pub fn new(address: SocketAddr, timeout: Duration) -> Self {
        Self::from_transport(TcpTransport::new(address, timeout), DEFAULT_HOST)
    }

    /// Create a client from a string address like `"192.168.1.10:4000"`.
    pub fn from_address(address: &str, timeout: Duration) -> RocResult<Self> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| RocError::configuration(format!("invalid address '{}': {}", address, e)))?;
        Ok(Self::new(addr, timeout))
    }

    /// Create a client over a prepared transport with an explicit host pair.
    pub fn from_transport(transport: TcpTransport, host: Address) -> Self {
        Self {
            inner: GenericRocClient::new(transport, host),
        }
    }

    /// The host pair this client identifies itself with.
    pub fn host(&self) -> Address {
        self.inner.host()
    }

    /// Snapshot of the transport counters.
    pub fn get_stats(&self) -> TransportStats {
        self.inner.get_stats()
    }

    /// Close the connection.
    pub async fn close(&mut self) -> RocResult<()> {
        self.inner.close().await
    }

    /// Log in with the default operator ID and password.
    pub async fn login(&mut self, device: Address) -> RocResult<()> {
        self.inner.login(device).await
    }

    /// Log in with explicit credentials.
    pub async fn login_with(
        &mut self,
        device: Address,
        operator_id: [u8; 3],
        password: u16,
    ) -> RocResult<()> {
        self.inner.login_with(device, operator_id, password).await
    }

    /// Set the device real-time clock.
    #[allow(clippy::too_many_arguments)]
    pub async fn set_clock(
        &mut self,
        device: Address,
        second: u8,
        minute: u8,
        hour: u8,
        day: u8,
        month: u8,
        year: u8,
    ) -> RocResult<()> {
        self.inner
            .set_clock(device, second, minute, hour, day, month, year)
            .await
    }

    /// Read the device clock.
    pub async fn read_clock(&mut self, device: Address) -> RocResult<DeviceClock> {
        self.inner.read_clock(device).await
    }

    /// Read parameters by TLP address.
    pub async fn read_tlp(
        &mut self,
        device: Address,
        tlps: &[Tlp],
        tags: &[FormatTag],
    ) -> RocResult<Vec<RocValue>> {
        self.inner.read_tlp(device, tlps, tags).await
    }

    /// Write parameters by TLP address.
    pub async fn write_tlp(
        &mut self,
        device: Address,
        tlps: &[Tlp],
        tags: &[FormatTag],
        values: &[RocValue],
    ) -> RocResult<()> {
        self.inner.write_tlp(device, tlps, tags, values).await
    }

    /// Read the alarm/event/history pointer table.
    pub async fn read_pointers(&mut self, device: Address) -> RocResult<PointerTable> {
        self.inner.read_pointers(device).await
    }

    /// Read the last hour of minute history for a point.
    pub async fn read_minute_history(
        &mut self,
        device: Address,
        point: u8,
    ) -> RocResult<Vec<HistoryRecord>> {
        self.inner.read_minute_history(device, point).await
    }

    /// Read the last hour of minute history against a supplied clock.
    pub async fn read_minute_history_at(
        &mut self,
        device: Address,
        point: u8,
        clock: &DeviceClock,
    ) -> RocResult<Vec<HistoryRecord>> {
        self.inner
            .read_minute_history_at(device, point, clock)
            .await
    }

    /// Read one daily history value for a point and date.
    pub async fn read_daily_history(
        &mut self,
        device: Address,
        point: u8,
        day: u8,
        month: u8,
    ) -> RocResult<f32> {
        self.inner.read_daily_history(device, point, day, month).await
    }
}

// ============================================================================
// Tests
// ============================================================================
