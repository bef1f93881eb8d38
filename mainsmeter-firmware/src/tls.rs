//! TLS transport over the embassy-net TCP stack
//!
//! Implements the core's [`SecureChannel`] contract with `embedded-tls`.
//! The channel owns no buffers itself; it borrows them from a
//! [`TlsBuffers`] allocation that outlives each poll cycle, so a fresh
//! channel can be built per cycle without re-reserving RAM.
//!
//! Certificate checking is not wired up: the handshake completes without
//! a verifier, so `verify_peer` always reports the connection as
//! unverified and the core logs it. The fetched value is public data,
//! integrity of the session still comes from the TLS record layer.

use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::Stack;
use embassy_rp::clocks::RoscRng;
use embassy_time::Duration;
use embedded_tls::{
    Aes128GcmSha256, TlsConfig, TlsConnection, TlsContext, TlsError, UnsecureProvider,
};

use mainsmeter_core::traits::{FetchError, ReadEvent, SecureChannel, VerifyOutcome};

/// TCP socket buffer sizes; the response body is small, the request tiny
const TCP_RX_SIZE: usize = 4096;
const TCP_TX_SIZE: usize = 1024;

/// embedded-tls needs room for one full TLS record plus overhead
const TLS_RECORD_SIZE: usize = 16640;

/// Idle timeout on the underlying socket
const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

/// Buffers backing one TLS session, allocated once at boot
pub struct TlsBuffers {
    tcp_rx: [u8; TCP_RX_SIZE],
    tcp_tx: [u8; TCP_TX_SIZE],
    tls_rx: [u8; TLS_RECORD_SIZE],
    tls_tx: [u8; TLS_RECORD_SIZE],
}

impl TlsBuffers {
    pub const fn new() -> Self {
        Self {
            tcp_rx: [0; TCP_RX_SIZE],
            tcp_tx: [0; TCP_TX_SIZE],
            tls_rx: [0; TLS_RECORD_SIZE],
            tls_tx: [0; TLS_RECORD_SIZE],
        }
    }
}

enum ChannelState<'d> {
    Idle,
    Connected(TcpSocket<'d>),
    Established(TlsConnection<'d, TcpSocket<'d>, Aes128GcmSha256>),
    Closed,
}

/// One-shot TLS channel; build it, run a fetch, let it close
pub struct TlsChannel<'d> {
    stack: Stack<'d>,
    rng: RoscRng,
    config: TlsConfig<'static>,
    tcp_rx: Option<&'d mut [u8]>,
    tcp_tx: Option<&'d mut [u8]>,
    tls_rx: Option<&'d mut [u8]>,
    tls_tx: Option<&'d mut [u8]>,
    state: ChannelState<'d>,
}

impl<'d> TlsChannel<'d> {
    /// `server_name` is sent as SNI and must match the host being fetched
    pub fn new(
        stack: Stack<'d>,
        rng: RoscRng,
        server_name: &'static str,
        bufs: &'d mut TlsBuffers,
    ) -> Self {
        Self {
            stack,
            rng,
            config: TlsConfig::new().with_server_name(server_name),
            tcp_rx: Some(&mut bufs.tcp_rx),
            tcp_tx: Some(&mut bufs.tcp_tx),
            tls_rx: Some(&mut bufs.tls_rx),
            tls_tx: Some(&mut bufs.tls_tx),
            state: ChannelState::Idle,
        }
    }
}

impl SecureChannel for TlsChannel<'_> {
    async fn connect(&mut self, host: &str, port: u16) -> Result<(), FetchError> {
        let addrs = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|_| FetchError::ConnectFailed)?;
        let addr = addrs.first().copied().ok_or(FetchError::ConnectFailed)?;

        let (rx, tx) = match (self.tcp_rx.take(), self.tcp_tx.take()) {
            (Some(rx), Some(tx)) => (rx, tx),
            // Buffers already spent; this channel is one-shot
            _ => return Err(FetchError::ConnectFailed),
        };

        let mut socket = TcpSocket::new(self.stack, rx, tx);
        socket.set_timeout(Some(SOCKET_TIMEOUT));
        socket
            .connect((addr, port))
            .await
            .map_err(|_| FetchError::ConnectFailed)?;

        self.state = ChannelState::Connected(socket);
        Ok(())
    }

    async fn handshake(&mut self) -> Result<(), FetchError> {
        let socket = match core::mem::replace(&mut self.state, ChannelState::Idle) {
            ChannelState::Connected(socket) => socket,
            other => {
                self.state = other;
                return Err(FetchError::HandshakeFailed);
            }
        };

        let (rx, tx) = match (self.tls_rx.take(), self.tls_tx.take()) {
            (Some(rx), Some(tx)) => (rx, tx),
            _ => return Err(FetchError::HandshakeFailed),
        };

        let mut tls = TlsConnection::new(socket, rx, tx);
        tls.open(TlsContext::new(
            &self.config,
            UnsecureProvider::new::<Aes128GcmSha256>(self.rng),
        ))
        .await
        .map_err(|_| FetchError::HandshakeFailed)?;

        self.state = ChannelState::Established(tls);
        Ok(())
    }

    fn verify_peer(&mut self) -> VerifyOutcome {
        // No verifier is configured for the handshake
        VerifyOutcome::Unverified
    }

    async fn send(&mut self, data: &[u8]) -> Result<usize, FetchError> {
        match &mut self.state {
            ChannelState::Established(tls) => {
                let written = tls.write(data).await.map_err(|_| FetchError::WriteFailed)?;
                tls.flush().await.map_err(|_| FetchError::WriteFailed)?;
                Ok(written)
            }
            _ => Err(FetchError::WriteFailed),
        }
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<ReadEvent, FetchError> {
        match &mut self.state {
            ChannelState::Established(tls) => match tls.read(buf).await {
                Ok(0) => Ok(ReadEvent::Closed),
                Ok(n) => Ok(ReadEvent::Data(n)),
                Err(TlsError::ConnectionClosed) => Ok(ReadEvent::Closed),
                Err(_) => Err(FetchError::ReadFailed),
            },
            _ => Err(FetchError::ReadFailed),
        }
    }

    async fn close(&mut self) {
        match core::mem::replace(&mut self.state, ChannelState::Closed) {
            ChannelState::Established(tls) => {
                // Send close_notify if we can; reclaim and close the socket
                // either way
                match tls.close().await {
                    Ok(mut socket) | Err((mut socket, _)) => socket.close(),
                }
            }
            ChannelState::Connected(mut socket) => socket.close(),
            ChannelState::Idle | ChannelState::Closed => {}
        }
    }
}
