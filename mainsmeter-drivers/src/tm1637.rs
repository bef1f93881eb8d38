//! TM1637 4-digit LED display driver
//!
//! The TM1637 speaks a two-wire protocol similar to I2C but without
//! addressing: a start condition, bytes sent LSB-first with an ACK clock
//! after each, and a stop condition. Both lines are open-drain with
//! external pull-ups.
//!
//! # Commands
//!
//! - `0x44` data command, fixed addressing
//! - `0xC0 | cell` address command, followed by one segment byte
//! - `0x88 | level` display control, display on at brightness `level`

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use mainsmeter_core::traits::display::{CELL_COUNT, MAX_BRIGHTNESS};
use mainsmeter_core::traits::{DisplayError, SegmentDisplay};

/// Data command: write with fixed addressing
const CMD_DATA_FIXED_ADDR: u8 = 0x44;
/// Address command base (low bits select the cell)
const CMD_SET_ADDRESS: u8 = 0xC0;
/// Display control: on, brightness in the low 3 bits
const CMD_DISPLAY_ON: u8 = 0x88;

/// Half-bit time; the TM1637 tops out around 250 kHz
const BIT_DELAY_US: u32 = 5;

/// Bit-banged TM1637 driver over two GPIO lines
///
/// `DIO` must be readable so the controller's ACK can be sampled; wire it
/// as an open-drain output.
pub struct Tm1637<CLK, DIO, D> {
    clk: CLK,
    dio: DIO,
    delay: D,
}

impl<CLK, DIO, D> Tm1637<CLK, DIO, D>
where
    CLK: OutputPin,
    DIO: OutputPin + InputPin,
    D: DelayNs,
{
    /// Create a driver; both lines should idle high
    pub fn new(clk: CLK, dio: DIO, delay: D) -> Self {
        Self { clk, dio, delay }
    }

    fn bit_delay(&mut self) {
        self.delay.delay_us(BIT_DELAY_US);
    }

    fn clk_high(&mut self) -> Result<(), DisplayError> {
        self.clk.set_high().map_err(|_| DisplayError::Bus)
    }

    fn clk_low(&mut self) -> Result<(), DisplayError> {
        self.clk.set_low().map_err(|_| DisplayError::Bus)
    }

    fn dio_high(&mut self) -> Result<(), DisplayError> {
        self.dio.set_high().map_err(|_| DisplayError::Bus)
    }

    fn dio_low(&mut self) -> Result<(), DisplayError> {
        self.dio.set_low().map_err(|_| DisplayError::Bus)
    }

    /// Start condition: DIO falls while CLK is high
    fn start(&mut self) -> Result<(), DisplayError> {
        self.dio_high()?;
        self.clk_high()?;
        self.bit_delay();
        self.dio_low()?;
        self.bit_delay();
        Ok(())
    }

    /// Stop condition: DIO rises while CLK is high
    fn stop(&mut self) -> Result<(), DisplayError> {
        self.clk_low()?;
        self.bit_delay();
        self.dio_low()?;
        self.bit_delay();
        self.clk_high()?;
        self.bit_delay();
        self.dio_high()?;
        self.bit_delay();
        Ok(())
    }

    /// Clock out one byte LSB-first, then sample the ACK slot
    fn write_byte(&mut self, byte: u8) -> Result<(), DisplayError> {
        let mut data = byte;
        for _ in 0..8 {
            self.clk_low()?;
            self.bit_delay();
            if data & 0x01 != 0 {
                self.dio_high()?;
            } else {
                self.dio_low()?;
            }
            data >>= 1;
            self.bit_delay();
            self.clk_high()?;
            self.bit_delay();
        }

        // Ninth clock: release DIO and let the controller pull it low
        self.clk_low()?;
        self.dio_high()?;
        self.bit_delay();
        self.clk_high()?;
        self.bit_delay();
        let acked = self.dio.is_low().map_err(|_| DisplayError::Bus)?;
        self.clk_low()?;
        self.bit_delay();

        if acked {
            Ok(())
        } else {
            Err(DisplayError::Bus)
        }
    }

    /// One framed transmission; the stop condition runs even after a NACK
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.start()?;
        let result = bytes.iter().try_for_each(|&b| self.write_byte(b));
        self.stop()?;
        result
    }
}

impl<CLK, DIO, D> SegmentDisplay for Tm1637<CLK, DIO, D>
where
    CLK: OutputPin,
    DIO: OutputPin + InputPin,
    D: DelayNs,
{
    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        if level > MAX_BRIGHTNESS {
            return Err(DisplayError::InvalidArgument);
        }
        self.transmit(&[CMD_DISPLAY_ON | level])
    }

    fn set_cell_raw(&mut self, cell: u8, segments: u8) -> Result<(), DisplayError> {
        if cell as usize >= CELL_COUNT {
            return Err(DisplayError::InvalidArgument);
        }
        self.transmit(&[CMD_DATA_FIXED_ADDR])?;
        self.transmit(&[CMD_SET_ADDRESS | cell, segments])
    }
}
