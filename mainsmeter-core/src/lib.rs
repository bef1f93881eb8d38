//! Board-agnostic core logic for the MainsMeter grid frequency display
//!
//! This crate contains all application logic that does not depend on
//! specific hardware or network implementations:
//!
//! - Hardware/transport abstraction traits (display, input, secure channel)
//! - Secure fetch client (one TLS session per poll cycle)
//! - Frequency extractor (label scan + leading float parse)
//! - Display renderer (7-segment encoding, brightness, dot mask)
//! - Digital input debouncer
//! - Poll orchestrator (fetch -> extract -> render cycle)

#![no_std]
#![deny(unsafe_code)]
#![allow(async_fn_in_trait)]

pub mod config;
pub mod debounce;
pub mod extract;
pub mod fetch;
pub mod poll;
pub mod render;
pub mod traits;
