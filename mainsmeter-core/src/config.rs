//! Compile-time configuration for the MainsMeter pipeline
//!
//! The device polls a single fixed host with a single fixed request line;
//! none of this is configurable at runtime.

/// Measurement server hostname (also used for TLS SNI)
pub const WEB_HOST: &str = "www.mainsfrequency.com";

/// Measurement server TLS port
pub const WEB_PORT: u16 = 443;

/// Fixed HTTP/1.0 request, sent verbatim once per connection
///
/// HTTP/1.0 keeps the exchange simple: no chunked transfer, and the
/// server closes the connection after the response, which is what ends
/// the read loop.
pub const REQUEST: &str = concat!(
    "GET / HTTP/1.0\r\n",
    "Host: www.mainsfrequency.com\r\n",
    "User-Agent: mainsmeter/1.0\r\n",
    "\r\n",
);

/// Capacity of the response chunk buffer (bytes per read)
pub const RESPONSE_BUFFER_SIZE: usize = 2048;

/// Debounce sampling interval in milliseconds
pub const DEBOUNCE_INTERVAL_MS: u32 = 10;

/// Consecutive identical readings required for a stable level
pub const DEBOUNCE_MIN_STABLE: u16 = 20;

/// Render ticks per poll cycle (one blink toggle per tick)
pub const BLINK_TICKS: u16 = 60;

/// Interval between render ticks in milliseconds
pub const BLINK_INTERVAL_MS: u32 = 1000;
