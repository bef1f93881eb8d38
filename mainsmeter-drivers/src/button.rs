//! Mode-select button input
//!
//! Adapts an `embedded-hal` input pin to the core's infallible
//! [`DigitalInput`] trait. The button is wired active-low with the
//! internal pull-up enabled, so the idle level is high.

use embedded_hal::digital::InputPin;
use mainsmeter_core::traits::{DigitalInput, Level};

/// Pulled-up button on a single GPIO
pub struct Button<P> {
    pin: P,
}

impl<P: InputPin> Button<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// True while the button is held (active-low)
    pub fn is_pressed(&mut self) -> bool {
        matches!(self.level(), Level::Low)
    }
}

impl<P: InputPin> DigitalInput for Button<P> {
    fn level(&mut self) -> Level {
        // A pin read fault reads as the pulled-up idle level
        match self.pin.is_high() {
            Ok(true) | Err(_) => Level::High,
            Ok(false) => Level::Low,
        }
    }
}
