//! # Transport Layer
//!
//! TCP transport for ROC communication, plus the trait that lets the client
//! run over any frame-capable byte pipe.
//!
//! ROC devices typically sit behind a serial-to-Ethernet gateway listening
//! on port 4000. The transport owns reconnection: a dead socket is replaced
//! once, transparently, on the next send.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::constants::MAX_FRAME_SIZE;
use crate::error::{RocError, RocResult};
use crate::frame::Deframer;

/// Default exchange timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

// ============================================================================
// Transport Statistics
// ============================================================================

/// Counters accumulated over the life of a transport.
#[derive(Debug, Clone, Default)]
pub struct TransportStats {
    pub requests_sent: u64,
    pub responses_received: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl TransportStats {
    /// Success rate as a percentage of requests sent.
    pub fn success_rate(&self) -> f64 {
        if self.requests_sent == 0 {
            return 0.0;
        }
        (self.responses_received as f64 / self.requests_sent as f64) * 100.0
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Abstract frame transport.
///
/// One exchange is in flight at a time: the client sends a frame, then reads
/// exactly one frame back. Implementations deliver whole frames; stream
/// reassembly is their concern, not the caller's.
pub trait RocTransport: Send {
    /// Send one complete frame.
    fn send_frame(
        &mut self,
        frame: &[u8],
    ) -> impl std::future::Future<Output = RocResult<()>> + Send;

    /// Read one complete frame, waiting up to the configured timeout.
    fn read_frame(&mut self) -> impl std::future::Future<Output = RocResult<Vec<u8>>> + Send;

    /// Whether the underlying connection is currently established.
    fn is_connected(&self) -> bool;

    /// Close the connection.
    fn close(&mut self) -> impl std::future::Future<Output = RocResult<()>> + Send;

    /// Snapshot of the transport counters.
    fn get_stats(&self) -> TransportStats;
}

// ============================================================================
// TCP Transport
// ============================================================================

/// TCP transport to a ROC device or serial gateway.
pub struct TcpTransport {
    stream: Option<TcpStream>,
    /// Remote address of the device or gateway
    pub address: SocketAddr,
    timeout: Duration,
    stats: TransportStats,
    packet_logging: bool,
}

impl TcpTransport {
    /// Create a transport for the given address. No connection is made
    /// until the first send.
    pub fn new(address: SocketAddr, timeout: Duration) -> Self {
        Self {
            stream: None,
            address,
            timeout,
            stats: TransportStats::default(),
            packet_logging: false,
        }
    }

    /// Create a transport with hex packet logging enabled.
    pub fn with_packet_logging(address: SocketAddr, timeout: Duration) -> Self {
        let mut transport = Self::new(address, timeout);
        transport.packet_logging = true;
        transport
    }

    /// Enable or disable hex packet logging.
    pub fn set_packet_logging(&mut self, enabled: bool) {
        self.packet_logging = enabled;
    }

    /// Change the exchange timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Establish the TCP connection, replacing any existing one.
    pub async fn connect(&mut self) -> RocResult<()> {
        debug!("Connecting to ROC device at {}", self.address);
        let stream = timeout(self.timeout, TcpStream::connect(self.address))
            .await
            .map_err(|_| RocError::timeout("connect", self.timeout.as_millis() as u64))?
            .map_err(|e| RocError::connection(format!("connect to {}: {}", self.address, e)))?;
        stream
            .set_nodelay(true)
            .map_err(|e| RocError::connection(format!("set nodelay: {}", e)))?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Drop the current socket and establish a fresh one.
    async fn reconnect(&mut self) -> RocResult<()> {
        warn!("Reconnecting to ROC device at {}", self.address);
        self.stream = None;
        self.connect().await
    }

    /// Discard any unread bytes left over from a previous exchange.
    ///
    /// A failure here means the peer closed the socket; the caller decides
    /// whether to reconnect.
    fn drain_stale(&mut self) -> RocResult<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };
        let mut scratch = [0u8; 256];
        loop {
            match stream.try_read(&mut scratch) {
                Ok(0) => {
                    return Err(RocError::connection("peer closed connection"));
                }
                Ok(n) => {
                    debug!("Discarded {} stale bytes", n);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => {
                    return Err(RocError::connection(format!("drain: {}", e)));
                }
            }
        }
    }

    fn log_packet(&self, direction: &str, data: &[u8]) {
        if self.packet_logging {
            let hex: String = data
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" ");
            debug!("{} ({} bytes): {}", direction, data.len(), hex);
        }
    }
}

impl RocTransport for TcpTransport {
    async fn send_frame(&mut self, frame: &[u8]) -> RocResult<()> {
        if self.stream.is_none() {
            self.connect().await?;
        }

        // A gateway that silently dropped the session shows up here as a
        // closed socket. Replace it once and carry on with the same frame.
        if self.drain_stale().is_err() {
            self.reconnect().await?;
        }

        self.log_packet("TX", frame);

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| RocError::connection("not connected"))?;

        let result = timeout(self.timeout, stream.write_all(frame)).await;
        match result {
            Ok(Ok(())) => {
                self.stats.requests_sent += 1;
                self.stats.bytes_sent += frame.len() as u64;
                Ok(())
            }
            Ok(Err(e)) => {
                self.stats.errors += 1;
                self.stream = None;
                Err(RocError::connection(format!("send: {}", e)))
            }
            Err(_) => {
                self.stats.timeouts += 1;
                self.stream = None;
                Err(RocError::timeout("send", self.timeout.as_millis() as u64))
            }
        }
    }

    async fn read_frame(&mut self) -> RocResult<Vec<u8>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| RocError::connection("not connected"))?;

        let mut deframer = Deframer::new();
        let mut chunk = [0u8; MAX_FRAME_SIZE];
        let deadline = tokio::time::Instant::now() + self.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                self.stats.timeouts += 1;
                return Err(RocError::timeout(
                    "read_frame",
                    self.timeout.as_millis() as u64,
                ));
            }

            let n = match timeout(remaining, stream.read(&mut chunk)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    self.stats.errors += 1;
                    self.stream = None;
                    return Err(RocError::connection(format!("read: {}", e)));
                }
                Err(_) => {
                    self.stats.timeouts += 1;
                    return Err(RocError::timeout(
                        "read_frame",
                        self.timeout.as_millis() as u64,
                    ));
                }
            };

            if n == 0 {
                self.stats.errors += 1;
                self.stream = None;
                return Err(RocError::ShortRead {
                    received: deframer.buffered(),
                    expected: deframer.frame_len().unwrap_or(crate::constants::HEADER_LEN),
                });
            }

            self.stats.bytes_received += n as u64;
            if let Some(frame) = deframer.extend(&chunk[..n]) {
                self.log_packet("RX", &frame);
                self.stats.responses_received += 1;
                return Ok(frame);
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn close(&mut self) -> RocResult<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        Ok(())
    }

    fn get_stats(&self) -> TransportStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_success_rate() {
        let mut stats = TransportStats::default();
        assert_eq!(stats.success_rate(), 0.0);

        stats.requests_sent = 4;
        stats.responses_received = 3;
        assert_eq!(stats.success_rate(), 75.0);
    }

    #[test]
    fn test_transport_starts_disconnected() {
        let transport = TcpTransport::new("127.0.0.1:4000".parse().unwrap(), Duration::from_secs(1));
        assert!(!transport.is_connected());
        assert_eq!(transport.get_stats().requests_sent, 0);
    }

    #[tokio::test]
    async fn test_read_frame_without_connection() {
        let mut transport =
            TcpTransport::new("127.0.0.1:4000".parse().unwrap(), Duration::from_secs(1));
        let err = transport.read_frame().await.unwrap_err();
        assert!(matches!(err, RocError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_read_frame_timeout_on_silent_peer() {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Peer accepts the connection but never answers.
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let mut transport = TcpTransport::new(addr, Duration::from_millis(100));
        let request = crate::frame::build_frame(
            crate::frame::Address::new(240, 240),
            crate::frame::Address::new(1, 3),
            120,
            0,
            &[],
        );
        transport.send_frame(&request).await.unwrap();

        let err = transport.read_frame().await.unwrap_err();
        assert!(matches!(err, RocError::Timeout { .. }));
        assert_eq!(transport.get_stats().timeouts, 1);

        server.abort();
    }

    #[tokio::test]
    async fn test_exchange_over_local_socket() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Echo peer: read one request, answer with a canned reply split
        // across two writes to exercise reassembly.
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0);

            let reply = crate::frame::build_frame(
                crate::frame::Address::new(1, 3),
                crate::frame::Address::new(240, 240),
                17,
                0,
                &[],
            );
            socket.write_all(&reply[..4]).await.unwrap();
            socket.flush().await.unwrap();
            socket.write_all(&reply[4..]).await.unwrap();
            reply
        });

        let mut transport = TcpTransport::new(addr, Duration::from_secs(2));
        let request = crate::frame::build_frame(
            crate::frame::Address::new(240, 240),
            crate::frame::Address::new(1, 3),
            17,
            5,
            &[76, 79, 73, 3, 232],
        );
        transport.send_frame(&request).await.unwrap();
        let frame = transport.read_frame().await.unwrap();

        let expected = server.await.unwrap();
        assert_eq!(frame, expected);

        let stats = transport.get_stats();
        assert_eq!(stats.requests_sent, 1);
        assert_eq!(stats.responses_received, 1);
        assert_eq!(stats.bytes_sent, request.len() as u64);

        transport.close().await.unwrap();
        assert!(!transport.is_connected());
    }
}
