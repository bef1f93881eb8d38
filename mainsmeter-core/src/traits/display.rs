//! Segment display driver trait
//!
//! Abstracts a 4-cell 7-segment LED display (TM1637 or similar) at the
//! level of raw per-cell segment writes plus a global brightness level.
//! All character/digit encoding happens above this trait, in the renderer.

/// Number of character cells on the display
pub const CELL_COUNT: usize = 4;

/// Maximum brightness level accepted by [`SegmentDisplay::set_brightness`]
pub const MAX_BRIGHTNESS: u8 = 7;

/// Errors that can occur when talking to the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Bus-level failure (missing ACK, pin fault)
    Bus,
    /// Caller violated the call contract (cell index or level out of range,
    /// string not exactly 4 characters)
    InvalidArgument,
}

/// Trait for raw writes to a 4-cell segment display
///
/// Implementations own the wire protocol; they do not interpret the
/// segment bytes. Bit 7 of a segment byte is the auxiliary dot segment.
pub trait SegmentDisplay {
    /// Set the display brightness (0..=[`MAX_BRIGHTNESS`])
    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError>;

    /// Write a raw segment pattern to one cell (0..[`CELL_COUNT`])
    fn set_cell_raw(&mut self, cell: u8, segments: u8) -> Result<(), DisplayError>;
}
