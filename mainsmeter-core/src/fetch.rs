//! Secure fetch client
//!
//! Drives one encrypted session per call: connect, handshake, optional
//! peer verification, request write, then a bounded chunked read loop.
//! The session is owned by the call and closed on every exit path, so no
//! transport state can leak into the next poll cycle.

use crate::config::RESPONSE_BUFFER_SIZE;
use crate::traits::{FetchError, ReadEvent, SecureChannel, VerifyOutcome};

/// Lifecycle state of one secure session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    Closed,
    Connecting,
    Handshaking,
    Established,
    Closing,
    Failed,
}

/// One secure session, scoped to a single fetch call
///
/// Send/receive are only attempted in `Established`; any step failure
/// parks the session in `Failed`, where the only remaining operation is
/// `close`.
pub struct Session<C> {
    channel: C,
    state: SessionState,
}

impl<C: SecureChannel> Session<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            state: SessionState::Closed,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Connect and handshake, leaving the session established
    async fn establish(&mut self, host: &str, port: u16) -> Result<(), FetchError> {
        self.state = SessionState::Connecting;
        #[cfg(feature = "defmt")]
        defmt::info!("Connecting to {}:{}...", host, port);
        self.channel.connect(host, port).await.map_err(|e| {
            self.state = SessionState::Failed;
            e
        })?;

        self.state = SessionState::Handshaking;
        #[cfg(feature = "defmt")]
        defmt::info!("Performing the TLS handshake...");
        self.channel.handshake().await.map_err(|e| {
            self.state = SessionState::Failed;
            e
        })?;

        // Verification-optional policy: warn and continue on failure
        match self.channel.verify_peer() {
            VerifyOutcome::Verified => {
                #[cfg(feature = "defmt")]
                defmt::info!("Peer certificate verified");
            }
            VerifyOutcome::Unverified => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Peer certificate not verified, continuing");
            }
        }

        self.state = SessionState::Established;
        Ok(())
    }

    /// Send the whole request, resuming across partial writes
    async fn send_all(&mut self, request: &[u8]) -> Result<(), FetchError> {
        if self.state != SessionState::Established {
            return Err(FetchError::WriteFailed);
        }

        let mut written = 0;
        while written < request.len() {
            let n = self.channel.send(&request[written..]).await.map_err(|e| {
                self.state = SessionState::Failed;
                e
            })?;
            written += n;
        }
        Ok(())
    }

    /// Receive one chunk into `buf`
    async fn recv(&mut self, buf: &mut [u8]) -> Result<ReadEvent, FetchError> {
        if self.state != SessionState::Established {
            return Err(FetchError::ReadFailed);
        }

        self.channel.recv(buf).await.map_err(|e| {
            self.state = SessionState::Failed;
            e
        })
    }

    /// Close the session and release the transport resource
    ///
    /// Safe to call from any state, including `Failed`.
    async fn close(&mut self) {
        self.state = SessionState::Closing;
        self.channel.close().await;
        self.state = SessionState::Closed;
    }
}

/// Fetch the response for one fixed request, streaming chunks to `on_chunk`
///
/// The produced chunk sequence is finite and not restartable: a clean peer
/// close ends it normally, a hard error ends it with the step's error.
/// The session is closed exactly once before returning, on every path.
/// No retry is performed here; the orchestrator decides whether to try
/// again on the next poll cycle.
pub async fn fetch_response<C, F>(
    channel: C,
    host: &str,
    port: u16,
    request: &[u8],
    mut on_chunk: F,
) -> Result<(), FetchError>
where
    C: SecureChannel,
    F: FnMut(&[u8]),
{
    let mut session = Session::new(channel);
    let result = exchange(&mut session, host, port, request, &mut on_chunk).await;
    session.close().await;
    result
}

/// The fallible part of a fetch, separated so the caller can close
/// unconditionally afterwards
async fn exchange<C, F>(
    session: &mut Session<C>,
    host: &str,
    port: u16,
    request: &[u8],
    on_chunk: &mut F,
) -> Result<(), FetchError>
where
    C: SecureChannel,
    F: FnMut(&[u8]),
{
    session.establish(host, port).await?;
    session.send_all(request).await?;

    // One bounded buffer, overwritten on every read
    let mut buf = [0u8; RESPONSE_BUFFER_SIZE];
    loop {
        match session.recv(&mut buf).await? {
            ReadEvent::Closed => return Ok(()),
            ReadEvent::Data(0) => continue,
            ReadEvent::Data(n) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("{} bytes read", n);
                on_chunk(&buf[..n]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    /// What the mock channel does at each step
    #[derive(Clone, Copy)]
    enum FailAt {
        Nowhere,
        Connect,
        Handshake,
        Send,
        Recv,
    }

    /// Scripted channel double recording the call sequence
    struct MockChannel {
        fail_at: FailAt,
        chunks: &'static [&'static [u8]],
        next_chunk: usize,
        sent: heapless::Vec<u8, 256>,
        /// Cap on bytes accepted per send call (exercises partial writes)
        send_cap: usize,
        closes: usize,
        connected: bool,
        handshaken: bool,
    }

    impl MockChannel {
        fn new(fail_at: FailAt, chunks: &'static [&'static [u8]]) -> Self {
            Self {
                fail_at,
                chunks,
                next_chunk: 0,
                sent: heapless::Vec::new(),
                send_cap: usize::MAX,
                closes: 0,
                connected: false,
                handshaken: false,
            }
        }
    }

    impl SecureChannel for &mut MockChannel {
        async fn connect(&mut self, _host: &str, _port: u16) -> Result<(), FetchError> {
            if matches!(self.fail_at, FailAt::Connect) {
                return Err(FetchError::ConnectFailed);
            }
            self.connected = true;
            Ok(())
        }

        async fn handshake(&mut self) -> Result<(), FetchError> {
            assert!(self.connected, "handshake before connect");
            if matches!(self.fail_at, FailAt::Handshake) {
                return Err(FetchError::HandshakeFailed);
            }
            self.handshaken = true;
            Ok(())
        }

        fn verify_peer(&mut self) -> VerifyOutcome {
            VerifyOutcome::Unverified
        }

        async fn send(&mut self, data: &[u8]) -> Result<usize, FetchError> {
            assert!(self.handshaken, "send before handshake");
            if matches!(self.fail_at, FailAt::Send) {
                return Err(FetchError::WriteFailed);
            }
            let n = data.len().min(self.send_cap);
            self.sent.extend_from_slice(&data[..n]).unwrap();
            Ok(n)
        }

        async fn recv(&mut self, buf: &mut [u8]) -> Result<ReadEvent, FetchError> {
            assert!(self.handshaken, "recv before handshake");
            if matches!(self.fail_at, FailAt::Recv) {
                return Err(FetchError::ReadFailed);
            }
            if self.next_chunk >= self.chunks.len() {
                return Ok(ReadEvent::Closed);
            }
            let chunk = self.chunks[self.next_chunk];
            self.next_chunk += 1;
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(ReadEvent::Data(chunk.len()))
        }

        async fn close(&mut self) {
            self.closes += 1;
        }
    }

    const REQUEST: &[u8] = b"GET / HTTP/1.0\r\n\r\n";

    #[test]
    fn streams_all_chunks_then_closes_once() {
        let mut channel = MockChannel::new(FailAt::Nowhere, &[b"first", b"second"]);
        let mut seen: heapless::Vec<u8, 64> = heapless::Vec::new();

        let result = block_on(fetch_response(&mut channel, "host", 443, REQUEST, |c| {
            seen.extend_from_slice(c).unwrap();
        }));

        assert_eq!(result, Ok(()));
        assert_eq!(seen.as_slice(), b"firstsecond");
        assert_eq!(channel.sent.as_slice(), REQUEST);
        assert_eq!(channel.closes, 1);
    }

    #[test]
    fn partial_writes_are_resumed() {
        let mut channel = MockChannel::new(FailAt::Nowhere, &[]);
        channel.send_cap = 5;

        let result = block_on(fetch_response(&mut channel, "host", 443, REQUEST, |_| {}));

        assert_eq!(result, Ok(()));
        // The full request arrived despite the 5-byte cap per write
        assert_eq!(channel.sent.as_slice(), REQUEST);
    }

    #[test]
    fn connect_failure_still_closes_the_session() {
        let mut channel = MockChannel::new(FailAt::Connect, &[]);
        let mut chunks = 0;

        let result = block_on(fetch_response(&mut channel, "host", 443, REQUEST, |_| {
            chunks += 1;
        }));

        assert_eq!(result, Err(FetchError::ConnectFailed));
        assert_eq!(chunks, 0);
        assert_eq!(channel.closes, 1);
    }

    #[test]
    fn handshake_failure_maps_to_its_own_variant() {
        let mut channel = MockChannel::new(FailAt::Handshake, &[]);
        let result = block_on(fetch_response(&mut channel, "host", 443, REQUEST, |_| {}));
        assert_eq!(result, Err(FetchError::HandshakeFailed));
        assert_eq!(channel.closes, 1);
    }

    #[test]
    fn read_error_ends_the_stream_with_read_failed() {
        let mut channel = MockChannel::new(FailAt::Recv, &[b"never delivered"]);
        let mut chunks = 0;

        let result = block_on(fetch_response(&mut channel, "host", 443, REQUEST, |_| {
            chunks += 1;
        }));

        assert_eq!(result, Err(FetchError::ReadFailed));
        assert_eq!(chunks, 0);
        assert_eq!(channel.closes, 1);
    }

    #[test]
    fn session_tracks_state_transitions() {
        let mut channel = MockChannel::new(FailAt::Handshake, &[]);
        {
            let mut session = Session::new(&mut channel);
            assert_eq!(session.state(), SessionState::Closed);
            let err = block_on(session.establish("host", 443));
            assert_eq!(err, Err(FetchError::HandshakeFailed));
            assert_eq!(session.state(), SessionState::Failed);

            // No I/O outside Established
            assert_eq!(
                block_on(session.send_all(REQUEST)),
                Err(FetchError::WriteFailed)
            );

            block_on(session.close());
            assert_eq!(session.state(), SessionState::Closed);
        }
        assert_eq!(channel.sent.len(), 0);
    }
}
