//! Secure channel trait for the fetch client
//!
//! Abstracts one encrypted transport connection at the granularity the
//! fetch client sequences it: connect, handshake, verify, send, receive,
//! close. Implementations map their underlying transport/TLS errors onto
//! the step-specific [`FetchError`] variants.

/// Errors from the secure fetch pipeline, one variant per protocol step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchError {
    /// Remote unreachable or connection refused
    ConnectFailed,
    /// TLS handshake hard failure
    HandshakeFailed,
    /// Hard write error while sending the request
    WriteFailed,
    /// Hard read error while streaming the response
    ReadFailed,
}

/// Result of peer identity verification
///
/// `Unverified` is a degraded-but-accepted outcome, not an error: the
/// device logs a warning and continues (deliberate weak-security policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VerifyOutcome {
    /// Peer certificate chain verified against the trust bundle
    Verified,
    /// Verification failed or was not performed
    Unverified,
}

/// Outcome of one read from an established channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadEvent {
    /// `n` bytes were received into the caller's buffer
    Data(usize),
    /// The peer closed the connection cleanly
    Closed,
}

/// One encrypted transport connection, driven step by step
///
/// The fetch client calls these in a fixed order: `connect`, `handshake`,
/// `verify_peer`, then `send`/`recv`, then `close`. `close` must be safe
/// to call from any state; implementations release all transport resources
/// there.
pub trait SecureChannel {
    /// Open the underlying transport connection to `host:port`
    async fn connect(&mut self, host: &str, port: u16) -> Result<(), FetchError>;

    /// Run the TLS handshake to completion
    async fn handshake(&mut self) -> Result<(), FetchError>;

    /// Report the peer verification result for the established session
    fn verify_peer(&mut self) -> VerifyOutcome;

    /// Send bytes, returning how many were accepted (may be partial)
    async fn send(&mut self, data: &[u8]) -> Result<usize, FetchError>;

    /// Receive into `buf`, distinguishing data from a clean peer close
    async fn recv(&mut self, buf: &mut [u8]) -> Result<ReadEvent, FetchError>;

    /// Close the session and release the transport resource
    async fn close(&mut self);
}
