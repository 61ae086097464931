//! Captured USB Request Block (URB) events and parsing of the Linux usbmon binary header
//!
//! usbmon delivers each URB submission and completion as a fixed header followed by the payload. The
//! header is in host byte order:
//!
//! ```text
//! Offset  Size  Field
//! 0       8     id (URB tag, shared by submission and completion)
//! 8       1     event type ('S', 'C', 'E')
//! 9       1     transfer type (0=iso, 1=int, 2=ctrl, 3=bulk)
//! 10      1     endpoint address (bit 7 = IN)
//! 11      1     device address
//! 12      2     bus number
//! 14      1     setup flag (0 = setup packet present)
//! 15      1     data flag
//! 16      8     timestamp seconds
//! 24      4     timestamp microseconds
//! 28      4     status
//! 32      4     urb length
//! 36      4     data length (payload bytes attached to this event)
//! 40      8     setup packet / iso info
//! -- mmapped header only --
//! 48      4     interval
//! 52      4     start frame
//! 56      4     transfer flags
//! 60      4     number of iso descriptors
//! ```
use std::fmt;

use crate::error::{Error, ErrorKind, Result};
use crate::usb::{SetupPacket, TransferType};

/// Length of the header for the `DLT_USB_LINUX` link type
pub const USBMON_HEADER_LEN: usize = 48;
/// Length of the header for the `DLT_USB_LINUX_MMAPPED` link type
pub const USBMON_MMAPPED_HEADER_LEN: usize = 64;
/// Size of each isochronous descriptor following the mmapped header
const USBMON_ISO_DESCRIPTOR_LEN: usize = 16;

/// Absolute capture timestamp
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Seconds since the epoch
    pub sec: i64,
    /// Microseconds within the second
    pub usec: i32,
}

impl Timestamp {
    /// New timestamp from seconds and microseconds
    pub fn new(sec: i64, usec: i32) -> Self {
        Timestamp { sec, usec }
    }

    /// Timestamp as total microseconds
    pub fn as_micros(&self) -> i64 {
        self.sec * 1_000_000 + self.usec as i64
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:06}", self.sec, self.usec)
    }
}

/// Kind of usbmon event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// URB submitted to the host controller
    Submission,
    /// URB completed by the host controller
    Completion,
    /// URB submission error
    Error,
    /// Event type byte not known
    Other(u8),
}

impl From<u8> for EventType {
    fn from(b: u8) -> Self {
        match b {
            b'S' => EventType::Submission,
            b'C' => EventType::Completion,
            b'E' => EventType::Error,
            o => EventType::Other(o),
        }
    }
}

/// One observed USB bus transaction
///
/// Borrows the payload from the captured packet; it is consumed once by the [`crate::decoder::Decoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEvent<'a> {
    /// URB identifier; submission and completion of the same URB share it
    pub id: u64,
    /// Submission, completion or error
    pub event_type: EventType,
    /// Raw transfer type code, see [`TransferType`]
    pub transfer_type: u8,
    /// Endpoint address including direction bit
    pub endpoint: u8,
    /// Device address on the bus
    pub device_address: u8,
    /// Bus number
    pub bus: u16,
    /// Setup packet, only for control transfers that carry one
    pub setup: Option<SetupPacket>,
    /// Payload length reported by the header
    pub data_len: u32,
    /// Payload bytes captured; may be fewer than `data_len` if the capture snap length cut it
    pub data: &'a [u8],
    /// Absolute capture time
    pub timestamp: Timestamp,
}

impl<'a> CaptureEvent<'a> {
    /// Parse a usbmon packet with a header of `header_len` bytes: [`USBMON_HEADER_LEN`] or [`USBMON_MMAPPED_HEADER_LEN`]
    pub fn from_usbmon(raw: &'a [u8], header_len: usize) -> Result<Self> {
        if header_len != USBMON_HEADER_LEN && header_len != USBMON_MMAPPED_HEADER_LEN {
            return Err(Error::new(
                ErrorKind::InvalidArg,
                &format!("Unsupported usbmon header length {}", header_len),
            ));
        }
        if raw.len() < header_len {
            return Err(Error::new(
                ErrorKind::Decoding,
                &format!(
                    "Captured packet too short for usbmon header. Expected: {}, Got: {}",
                    header_len,
                    raw.len()
                ),
            ));
        }

        let id = u64::from_ne_bytes(array_at(raw, 0));
        let transfer_type = raw[9];
        let setup_flag = raw[14];
        let data_len = u32::from_ne_bytes(array_at(raw, 36));

        let setup = if transfer_type == TransferType::Control as u8 && setup_flag == 0 {
            Some(SetupPacket::from_bytes(&array_at(raw, 40)))
        } else {
            None
        };

        let mut data_start = header_len;
        if header_len == USBMON_MMAPPED_HEADER_LEN {
            let ndesc = u32::from_ne_bytes(array_at(raw, 60)) as usize;
            data_start += ndesc.saturating_mul(USBMON_ISO_DESCRIPTOR_LEN);
        }
        let available = raw.len().saturating_sub(data_start);
        let take = available.min(data_len as usize);
        let data = if take > 0 {
            &raw[data_start..data_start + take]
        } else {
            &raw[..0]
        };

        Ok(CaptureEvent {
            id,
            event_type: EventType::from(raw[8]),
            transfer_type,
            endpoint: raw[10],
            device_address: raw[11],
            bus: u16::from_ne_bytes(array_at(raw, 12)),
            setup,
            data_len,
            data,
            timestamp: Timestamp::new(
                i64::from_ne_bytes(array_at(raw, 16)),
                i32::from_ne_bytes(array_at(raw, 24)),
            ),
        })
    }

    /// Whether the captured payload is shorter than the header length reports
    pub fn is_truncated(&self) -> bool {
        (self.data.len() as u64) < self.data_len as u64
    }
}

/// Fixed size array at `offset`; caller has checked `raw` covers the header
fn array_at<const N: usize>(raw: &[u8], offset: usize) -> [u8; N] {
    let mut ret = [0u8; N];
    ret.copy_from_slice(&raw[offset..offset + N]);
    ret
}
