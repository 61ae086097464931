//! Defines for USB, mainly those covered at [usb.org](https://www.usb.org) and needed to label captured transfers
use std::fmt;

use crate::error::{Error, ErrorKind, Result};

/// Direction bit of the endpoint address; set for device to host
pub const ENDPOINT_DIR_IN: u8 = 0x80;
/// Mask of the endpoint address giving the endpoint number
pub const ENDPOINT_NUMBER_MASK: u8 = 0x7f;
/// bRequest of a standard GET_DESCRIPTOR
pub const REQUEST_GET_DESCRIPTOR: u8 = 0x06;
/// bmRequestType of a standard device to host request with device recipient
pub const REQUEST_TYPE_IN_STANDARD_DEVICE: u8 = 0x80;

/// USB transfer type as reported by the host controller
///
/// Display is the four character label used in output records
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter,
)]
#[repr(u8)]
pub enum TransferType {
    /// Isochronous transfer
    #[strum(serialize = "ISOC")]
    Isochronous = 0,
    /// Interrupt transfer
    #[strum(serialize = "INTR")]
    Interrupt = 1,
    /// Control transfer
    #[strum(serialize = "CTRL")]
    Control = 2,
    /// Bulk transfer
    #[strum(serialize = "BULK")]
    Bulk = 3,
}

impl TryFrom<u8> for TransferType {
    type Error = Error;

    fn try_from(b: u8) -> Result<Self> {
        match b {
            0 => Ok(TransferType::Isochronous),
            1 => Ok(TransferType::Interrupt),
            2 => Ok(TransferType::Control),
            3 => Ok(TransferType::Bulk),
            _ => Err(Error::new(
                ErrorKind::Decoding,
                &format!("Unknown transfer type 0x{:02x}", b),
            )),
        }
    }
}

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Direction {
    /// Host to device
    #[strum(serialize = "OUT")]
    Out,
    /// Device to host
    #[strum(serialize = "IN")]
    In,
}

/// Direction from endpoint address byte
impl From<u8> for Direction {
    fn from(endpoint: u8) -> Self {
        if endpoint & ENDPOINT_DIR_IN != 0 {
            Direction::In
        } else {
            Direction::Out
        }
    }
}

/// Endpoint number of an endpoint address with the direction bit removed
///
/// ```
/// use usbsniff::usb::endpoint_number;
///
/// assert_eq!(endpoint_number(0x81), 1);
/// assert_eq!(endpoint_number(0x02), 2);
/// assert_eq!(endpoint_number(0x80), 0);
/// ```
pub fn endpoint_number(endpoint: u8) -> u8 {
    endpoint & ENDPOINT_NUMBER_MASK
}

/// Classify a raw transfer type code and endpoint address into the labels used for output
///
/// Unknown transfer type codes are an [`ErrorKind::Decoding`] error rather than a default label.
///
/// ```
/// use usbsniff::usb::{classify, Direction, TransferType};
///
/// assert_eq!(classify(2, 0x80).unwrap(), (TransferType::Control, Direction::In));
/// assert_eq!(classify(3, 0x02).unwrap(), (TransferType::Bulk, Direction::Out));
/// assert!(classify(7, 0x81).is_err());
/// ```
pub fn classify(transfer_type: u8, endpoint: u8) -> Result<(TransferType, Direction)> {
    Ok((
        TransferType::try_from(transfer_type)?,
        Direction::from(endpoint),
    ))
}

/// Control transfer setup packet
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SetupPacket {
    /// bmRequestType: direction, type, recipient
    pub request_type: u8,
    /// bRequest: specific request code
    pub request: u8,
    /// wValue: request-specific value
    pub value: u16,
    /// wIndex: interface or endpoint
    pub index: u16,
    /// wLength: data length
    pub length: u16,
}

impl SetupPacket {
    /// Setup packet from the 8 bytes as transmitted on the wire (little endian words)
    pub fn from_bytes(b: &[u8; 8]) -> Self {
        SetupPacket {
            request_type: b[0],
            request: b[1],
            value: u16::from_le_bytes([b[2], b[3]]),
            index: u16::from_le_bytes([b[4], b[5]]),
            length: u16::from_le_bytes([b[6], b[7]]),
        }
    }

    /// Standard GET_DESCRIPTOR, device to host with device recipient
    pub fn is_device_get_descriptor(&self) -> bool {
        self.request_type == REQUEST_TYPE_IN_STANDARD_DEVICE
            && self.request == REQUEST_GET_DESCRIPTOR
    }
}

/// Setup fields as colon separated hex: `rt:rq:vvvv:iiii:`
impl fmt::Display for SetupPacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:04x}:{:04x}:",
            self.request_type, self.request, self.value, self.index
        )
    }
}
