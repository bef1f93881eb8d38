//! Digital input trait for the mode-select button

/// Logic level of a digital input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

/// A single GPIO-style digital input
///
/// Reading a level never fails; a flaky input simply produces unstable
/// readings, which the debouncer rides out.
pub trait DigitalInput {
    /// Sample the current logic level
    fn level(&mut self) -> Level;
}
