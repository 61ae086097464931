//! Live capture of URBs from a Linux usbmon interface using libpcap
//!
//! The session only delivers events; decoding and filtering are left to the handler passed to
//! [`CaptureSession::run`], which is called for one event at a time.
use std::process::Command;

use crate::config::Config;
use crate::error::{Error, ErrorKind, Result};
use crate::urb::{CaptureEvent, USBMON_HEADER_LEN, USBMON_MMAPPED_HEADER_LEN};

/// Capture interface name for `bus`: `usbmon3`; bus 0 captures all buses
///
/// ```
/// use usbsniff::capture::interface_name;
///
/// assert_eq!(interface_name("usbmon", 3), "usbmon3");
/// assert_eq!(interface_name("usbmon", 0), "usbmon0");
/// ```
pub fn interface_name(prefix: &str, bus: u8) -> String {
    format!("{}{}", prefix, bus)
}

/// usbmon header length for the capture link type
pub fn header_len(linktype: pcap::Linktype) -> Result<usize> {
    match linktype {
        l if l == pcap::Linktype::USB_LINUX => Ok(USBMON_HEADER_LEN),
        l if l == pcap::Linktype::USB_LINUX_MMAPPED => Ok(USBMON_MMAPPED_HEADER_LEN),
        l => Err(Error::new(
            ErrorKind::Capture,
            &format!(
                "Interface link type {} is not usbmon; check the interface name",
                l.0
            ),
        )),
    }
}

/// Names of all capture interfaces libpcap can open
pub fn list_interfaces() -> Result<Vec<String>> {
    Ok(pcap::Device::list()?.into_iter().map(|d| d.name).collect())
}

/// Load the usbmon kernel module
pub fn load_usbmon() -> Result<()> {
    let status = Command::new("modprobe").arg("usbmon").status()?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::Capture,
            &format!("modprobe usbmon failed: {}", status),
        ))
    }
}

/// Open live capture on one usbmon interface
pub struct CaptureSession {
    capture: pcap::Capture<pcap::Active>,
    interface: String,
    header_len: usize,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("interface", &self.interface)
            .field("header_len", &self.header_len)
            .finish()
    }
}

impl CaptureSession {
    /// Open `interface` for live capture with snap length and timeout from `config`
    pub fn open(interface: &str, config: &Config) -> Result<Self> {
        let open_err = |e: pcap::Error| {
            Error::new(
                ErrorKind::Capture,
                &format!("Couldn't open device {}: {}", interface, e),
            )
        };

        let capture = pcap::Capture::from_device(interface)
            .map_err(open_err)?
            .promisc(true)
            .snaplen(config.snaplen)
            .timeout(config.timeout_ms)
            .open()
            .map_err(open_err)?;

        let linktype = capture.get_datalink();
        let header_len = header_len(linktype)?;
        log::debug!(
            "Opened {} link type {} header {} bytes",
            interface,
            linktype.0,
            header_len
        );

        Ok(CaptureSession {
            capture,
            interface: interface.to_string(),
            header_len,
        })
    }

    /// Deliver every captured event to `handler` until the capture ends or `handler` errors
    ///
    /// Packets that cannot be parsed are logged and skipped.
    pub fn run<F>(&mut self, mut handler: F) -> Result<()>
    where
        F: FnMut(&CaptureEvent) -> Result<()>,
    {
        loop {
            match self.capture.next_packet() {
                Ok(packet) => match CaptureEvent::from_usbmon(packet.data, self.header_len) {
                    Ok(event) => handler(&event)?,
                    Err(e) => log::warn!("Skipping packet: {:#}", e),
                },
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(pcap::Error::NoMorePackets) => break,
                Err(e) => return Err(e.into()),
            }
        }

        log::info!("Capture on {} ended", self.interface);
        Ok(())
    }
}
