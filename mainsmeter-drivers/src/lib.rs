//! Hardware driver implementations for the MainsMeter display device
//!
//! Drivers are generic over `embedded-hal` 1.0 traits and implement the
//! abstraction traits from `mainsmeter-core`:
//!
//! - TM1637 4-digit 7-segment LED controller (bit-banged two-wire bus)
//! - Pulled-up push button input

#![no_std]
#![deny(unsafe_code)]

pub mod button;
pub mod tm1637;

pub use button::Button;
pub use tm1637::Tm1637;
