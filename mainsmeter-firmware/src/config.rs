//! Board-level configuration
//!
//! Wi-Fi credentials are compiled in; edit and rebuild to match your
//! network. Pin assignments live next to the peripheral setup in
//! `main.rs`.

/// Network SSID to associate with
pub const WIFI_SSID: &str = "mainsmeter";

/// WPA2 passphrase; replace before flashing
pub const WIFI_PASS: &str = "change-me";
