//! Decode a live usbmon capture of one USB device into a line per transfer; a minimal USB sniffer.
//!
//! Events for the device pass through a [`decoder::Decoder`] which suppresses the GET_DESCRIPTOR(DEVICE)
//! exchange made when a capture starts, labels each transfer and hex encodes its payload. The resulting
//! [`display::Output`] lines are written to the console and optionally a log file by a
//! [`display::DisplayWriter`].
#![warn(missing_docs)]
use simple_logger::SimpleLogger;

#[cfg(target_os = "linux")]
pub mod capture;
pub mod config;
pub mod decoder;
pub mod device;
pub mod display;
pub mod error;
pub mod urb;
pub mod usb;

/// Set usbsniff module and binary log level
pub fn set_log_level(debug: u8) -> crate::error::Result<()> {
    match debug {
        // just use env if not passed
        0 => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Error.to_level_filter())
            .env(),
        1 => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Info.to_level_filter()),
        2 => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Debug.to_level_filter()),
        _ => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Trace.to_level_filter()),
    }
    .init()
    .map_err(|e| {
        crate::error::Error::new(
            crate::error::ErrorKind::Other("simple_logger"),
            &format!("Failed to set log level: {}", e),
        )
    })?;

    Ok(())
}
