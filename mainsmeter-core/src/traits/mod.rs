//! Hardware and transport abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware/network-specific implementations.

pub mod channel;
pub mod display;
pub mod input;

pub use channel::{FetchError, ReadEvent, SecureChannel, VerifyOutcome};
pub use display::{DisplayError, SegmentDisplay};
pub use input::{DigitalInput, Level};
