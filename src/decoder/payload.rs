//! Payload hex encoding with a size ceiling
use std::fmt::Write;

use crate::error::{Error, ErrorKind, Result};

/// Largest payload that is hex encoded; longer ones are omitted
pub const MAX_PAYLOAD_SIZE: usize = 4096;

/// Encoded payload of one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Zero length; no record is produced
    Empty,
    /// Lowercase hex, two digits per byte and no separators
    Hex(String),
    /// Length exceeded the ceiling
    Omitted,
}

/// Encode `data` whose reported length is `len`, omitting it when `len` exceeds `max_size`
///
/// `data` can be shorter than `len` when the capture cut the packet; what is available is encoded.
pub fn encode(data: &[u8], len: usize, max_size: usize) -> Payload {
    if len == 0 {
        Payload::Empty
    } else if len > max_size {
        Payload::Omitted
    } else {
        Payload::Hex(to_hex(data))
    }
}

/// Lowercase hex string of `data`
///
/// ```
/// use usbsniff::decoder::payload::to_hex;
///
/// assert_eq!(to_hex(&[0x00, 0xab, 0x10]), "00ab10");
/// assert_eq!(to_hex(&[]), "");
/// ```
pub fn to_hex(data: &[u8]) -> String {
    data.iter()
        .fold(String::with_capacity(data.len() * 2), |mut s, b| {
            // writing to a String cannot fail
            let _ = write!(s, "{:02x}", b);
            s
        })
}

/// Bytes from a hex string as produced by [`to_hex`]
pub fn from_hex(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        return Err(Error::new(
            ErrorKind::Parsing,
            &format!("Odd number of hex digits: {}", s.len()),
        ));
    }

    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .ok_or_else(|| Error::new(ErrorKind::Parsing, "Non-ASCII hex string"))
                .and_then(|pair| u8::from_str_radix(pair, 16).map_err(Error::from))
        })
        .collect()
}
