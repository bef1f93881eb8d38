//! Display renderer
//!
//! Maps characters, numeric values, and status messages onto raw segment
//! writes for a 4-cell 7-segment display. Owns the persistent display
//! state (cells, brightness, dot mask) so blink updates do not require
//! recomputing the digits.

use embedded_hal_async::delay::DelayNs;

use crate::traits::display::{CELL_COUNT, MAX_BRIGHTNESS};
use crate::traits::{DisplayError, SegmentDisplay};

/// Auxiliary dot segment bit within a raw segment byte
const DOT_SEGMENT: u8 = 0x80;

/// Status messages the device can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    /// Unrecoverable fault
    Error,
    /// Waiting for provisioning
    Provisioning,
    /// Network association complete
    Connected,
    /// Firmware booted and running
    Running,
    /// Wi-Fi activity
    Wifi,
    /// Forward-compatibility fallback
    Unknown,
}

impl Message {
    /// Fixed 4-character text for each message
    fn text(self) -> &'static str {
        match self {
            Message::Error => "ERR_",
            Message::Provisioning => "PROV",
            Message::Connected => "Conn",
            Message::Running => "On__",
            Message::Wifi => "UiFi",
            Message::Unknown => "inv-",
        }
    }
}

/// 7-segment patterns (gfedcba order) for ASCII `'0'..='_'`
///
/// Lower-case input is folded to upper case before lookup; codes outside
/// the table render blank. Unsupported punctuation inside the range maps
/// to 0x00 (all segments off).
#[rustfmt::skip]
const SEGMENT_TABLE: [u8; 48] = [
    /* 0     1     2     3     4     5     6     7     8     9  */
    0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F,
    /* :     ;     <     =     >     ?     @  */
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    /* A     B     C     D     E     F     G     H     I     J  */
    0x77, 0x7C, 0x39, 0x5E, 0x79, 0x71, 0x3D, 0x76, 0x30, 0x1E,
    /* K     L     M     N     O     P     Q     R     S     T  */
    0x75, 0x38, 0x55, 0x54, 0x5C, 0x73, 0x67, 0x50, 0x6D, 0x78,
    /* U     V     W     X     Y     Z  */
    0x3E, 0x1C, 0x1D, 0x64, 0x6E, 0x5B,
    /* [     \     ]     ^     _  */
    0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Decode one ASCII character to its segment pattern
///
/// Case-insensitive; anything outside the supported range is blank.
fn decode_segments(ch: u8) -> u8 {
    let folded = if ch.is_ascii_lowercase() { ch - 0x20 } else { ch };
    if !(b'0'..=b'_').contains(&folded) {
        return 0x00;
    }
    SEGMENT_TABLE[(folded - b'0') as usize]
}

/// Persistent display state, mutated only by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayState {
    /// Raw segment pattern per cell, without dot bits
    cells: [u8; CELL_COUNT],
    /// Current brightness level
    brightness: u8,
    /// Fixed decimal point after the second digit (frequency mode)
    lead_dot: bool,
    /// Per-cell blinkable dot bits (bit i = cell i)
    dot_mask: u8,
}

impl DisplayState {
    const fn new() -> Self {
        Self {
            cells: [0; CELL_COUNT],
            brightness: MAX_BRIGHTNESS,
            lead_dot: false,
            dot_mask: 0,
        }
    }
}

/// Renderer for a 4-cell segment display
///
/// Display-write failures propagate unchanged; no retry at this layer.
pub struct Renderer<D> {
    display: D,
    state: DisplayState,
}

impl<D: SegmentDisplay> Renderer<D> {
    pub fn new(display: D) -> Self {
        Self {
            display,
            state: DisplayState::new(),
        }
    }

    /// Show a 4-character string at maximum brightness
    ///
    /// Fails with `InvalidArgument` unless the input is exactly 4 bytes.
    pub fn render_text(&mut self, text: &str) -> Result<(), DisplayError> {
        let bytes = text.as_bytes();
        if bytes.len() != CELL_COUNT {
            return Err(DisplayError::InvalidArgument);
        }

        self.state.brightness = MAX_BRIGHTNESS;
        self.state.lead_dot = false;
        self.state.dot_mask = 0;
        for (cell, &ch) in self.state.cells.iter_mut().zip(bytes) {
            *cell = decode_segments(ch);
        }

        self.flush()
    }

    /// Show a frequency in Hz with two implied decimal digits
    ///
    /// The value is scaled by 100 and truncated, so 49.50 renders as the
    /// digits 4950 with a fixed decimal point after the second digit.
    /// `blinking` sets the per-cell dot mask all-on or all-off; callers
    /// toggle it across successive renders to blink the dots without
    /// touching digits or brightness.
    pub fn render_frequency(&mut self, freq_hz: f32, blinking: bool) -> Result<(), DisplayError> {
        let scaled = (freq_hz * 100.0) as u16;

        self.state.brightness = MAX_BRIGHTNESS;
        self.state.lead_dot = true;
        self.state.dot_mask = if blinking { 0x0F } else { 0x00 };

        let mut rest = scaled;
        for cell in self.state.cells.iter_mut().rev() {
            *cell = decode_segments(b'0' + (rest % 10) as u8);
            rest /= 10;
        }

        self.flush()
    }

    /// Show a fixed status message
    pub fn render_message(&mut self, message: Message) -> Result<(), DisplayError> {
        self.state.lead_dot = false;
        self.state.dot_mask = 0;
        self.render_text(message.text())
    }

    /// Startup animation: 8888 swept through every brightness level
    pub async fn startup_animation<T: DelayNs>(
        &mut self,
        delay: &mut T,
    ) -> Result<(), DisplayError> {
        self.state.lead_dot = false;
        self.state.dot_mask = 0;
        self.state.cells = [decode_segments(b'8'); CELL_COUNT];

        for level in 0..=MAX_BRIGHTNESS {
            self.state.brightness = level;
            self.flush()?;
            delay.delay_ms(250).await;
        }

        Ok(())
    }

    /// Current display state (for inspection)
    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Release the wrapped display driver
    pub fn release(self) -> D {
        self.display
    }

    /// Write the full state out to the display
    fn flush(&mut self) -> Result<(), DisplayError> {
        self.display.set_brightness(self.state.brightness)?;
        for (i, &pattern) in self.state.cells.iter().enumerate() {
            let mut segments = pattern;
            if (self.state.dot_mask >> i) & 1 != 0 {
                segments |= DOT_SEGMENT;
            }
            // The fixed decimal point sits after the second digit
            if self.state.lead_dot && i == 1 {
                segments |= DOT_SEGMENT;
            }
            self.display.set_cell_raw(i as u8, segments)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Display double that records the last write per cell
    struct RecordingDisplay {
        cells: [u8; CELL_COUNT],
        brightness: u8,
        writes: usize,
    }

    impl RecordingDisplay {
        fn new() -> Self {
            Self {
                cells: [0; CELL_COUNT],
                brightness: 0,
                writes: 0,
            }
        }
    }

    impl SegmentDisplay for RecordingDisplay {
        fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
            self.brightness = level;
            Ok(())
        }

        fn set_cell_raw(&mut self, cell: u8, segments: u8) -> Result<(), DisplayError> {
            self.cells[cell as usize] = segments;
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn text_mapping_is_case_insensitive() {
        let mut lower = Renderer::new(RecordingDisplay::new());
        let mut upper = Renderer::new(RecordingDisplay::new());

        lower.render_text("abcd").unwrap();
        upper.render_text("ABCD").unwrap();

        assert_eq!(lower.display.cells, upper.display.cells);
        assert_eq!(lower.display.brightness, MAX_BRIGHTNESS);
    }

    #[test]
    fn out_of_range_characters_render_blank() {
        let mut r = Renderer::new(RecordingDisplay::new());
        // '{' is above 'z'; '-' and ' ' are below '0'
        r.render_text("{- 8").unwrap();
        assert_eq!(r.display.cells, [0x00, 0x00, 0x00, 0x7F]);
    }

    #[test]
    fn wrong_length_text_is_rejected() {
        let mut r = Renderer::new(RecordingDisplay::new());
        assert_eq!(r.render_text("abc"), Err(DisplayError::InvalidArgument));
        assert_eq!(r.render_text("abcde"), Err(DisplayError::InvalidArgument));
        // Nothing was written
        assert_eq!(r.display.writes, 0);
    }

    #[test]
    fn frequency_renders_digits_with_fixed_decimal_point() {
        let mut r = Renderer::new(RecordingDisplay::new());
        r.render_frequency(49.50, false).unwrap();

        // Digits 4 9 5 0, decimal point on the second cell, no blink dots
        assert_eq!(
            r.display.cells,
            [0x66, 0x6F | DOT_SEGMENT, 0x6D, 0x3F]
        );
        assert_eq!(r.display.brightness, MAX_BRIGHTNESS);
    }

    #[test]
    fn blinking_sets_all_dot_bits() {
        let mut r = Renderer::new(RecordingDisplay::new());
        r.render_frequency(49.50, true).unwrap();

        for &cell in &r.display.cells {
            assert_ne!(cell & DOT_SEGMENT, 0);
        }

        // Toggling blink off clears every blinkable dot again
        r.render_frequency(49.50, false).unwrap();
        assert_eq!(r.display.cells[0] & DOT_SEGMENT, 0);
        assert_eq!(r.display.cells[2] & DOT_SEGMENT, 0);
        assert_eq!(r.display.cells[3] & DOT_SEGMENT, 0);
    }

    #[test]
    fn messages_map_to_fixed_strings() {
        let mut r = Renderer::new(RecordingDisplay::new());

        r.render_message(Message::Error).unwrap();
        let err_cells = r.display.cells;
        r.render_text("ERR_").unwrap();
        assert_eq!(r.display.cells, err_cells);

        // The fallback variant renders rather than failing
        r.render_message(Message::Unknown).unwrap();
        let inv_cells = r.display.cells;
        r.render_text("inv-").unwrap();
        assert_eq!(r.display.cells, inv_cells);
    }
}
