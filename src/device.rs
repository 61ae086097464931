//! Resolve the target USB device from vendor and product ID to the bus and address used to filter captures
//!
//! The lookup is based on the feature enabled, either `libusb` or `nusb`.
//!
//! ```no_run
//! use usbsniff::device::{self, VidPid};
//!
//! let vidpid: VidPid = "1d50:6018".parse().unwrap();
//! let location = device::find_device(&vidpid).unwrap();
//! println!("bus {} address {}", location.bus, location.address);
//! ```
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

#[cfg(feature = "libusb")]
pub mod libusb;
#[cfg(feature = "nusb")]
pub mod nusb;

/// Vendor and product ID of the target device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VidPid {
    /// idVendor
    pub vendor_id: u16,
    /// idProduct
    pub product_id: u16,
}

impl VidPid {
    /// New from IDs
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        VidPid {
            vendor_id,
            product_id,
        }
    }
}

/// Parse hexadecimal `VID:PID`, each part optionally prefixed with `0x`
///
/// ```
/// use usbsniff::device::VidPid;
///
/// assert_eq!("1d50:6018".parse::<VidPid>().unwrap(), VidPid::new(0x1d50, 0x6018));
/// assert_eq!("0x05ac:0x12A8".parse::<VidPid>().unwrap(), VidPid::new(0x05ac, 0x12a8));
/// assert!("1d50".parse::<VidPid>().is_err());
/// assert!("1d50:zz".parse::<VidPid>().is_err());
/// ```
impl FromStr for VidPid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (vid, pid) = s.split_once(':').ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidArg,
                &format!("Expected <vid>:<pid> in hexadecimal, got '{}'", s),
            )
        })?;

        let parse = |v: &str| {
            u16::from_str_radix(v.trim().trim_start_matches("0x"), 16).map_err(|e| {
                Error::new(
                    ErrorKind::InvalidArg,
                    &format!("Invalid hexadecimal ID '{}' in '{}': {}", v, s, e),
                )
            })
        };

        Ok(VidPid::new(parse(vid)?, parse(pid)?))
    }
}

impl fmt::Display for VidPid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Where a device sits on the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceLocation {
    /// Bus number, also the usbmon interface number
    pub bus: u8,
    /// Device address on the bus
    pub address: u8,
}

/// OS level USB access able to list attached devices
pub(crate) trait Resolver: fmt::Debug {
    /// IDs and location of every attached device
    fn list(&self) -> Result<Vec<(VidPid, DeviceLocation)>>;

    /// Location of the first device matching `vidpid`
    fn find(&self, vidpid: &VidPid) -> Result<DeviceLocation> {
        first_match(self.list()?, vidpid).ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                &format!("Unable to find USB device {}", vidpid),
            )
        })
    }
}

/// First device location in `devices` with `vidpid`
pub(crate) fn first_match<I>(devices: I, vidpid: &VidPid) -> Option<DeviceLocation>
where
    I: IntoIterator<Item = (VidPid, DeviceLocation)>,
{
    devices
        .into_iter()
        .find(|(id, _)| id == vidpid)
        .map(|(_, location)| location)
}

/// Find the bus and address of the first attached device with `vidpid`
pub fn find_device(vidpid: &VidPid) -> Result<DeviceLocation> {
    #[cfg(all(feature = "libusb", not(feature = "nusb")))]
    {
        libusb::LibUsbResolver.find(vidpid)
    }
    #[cfg(feature = "nusb")]
    {
        nusb::NusbResolver.find(vidpid)
    }

    #[cfg(all(not(feature = "libusb"), not(feature = "nusb")))]
    {
        let _ = vidpid;
        Err(Error::new(
            ErrorKind::Unsupported,
            "nusb or libusb feature is required to do this, install with `cargo install --features nusb/libusb`",
        ))
    }
}
