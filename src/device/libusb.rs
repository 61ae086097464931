//! Uses rusb (upto date libusb fork) to list system USB devices. Requires 'libusb' feature.
use super::*;
use rusb as libusb;

#[derive(Debug)]
pub(crate) struct LibUsbResolver;

impl Resolver for LibUsbResolver {
    fn list(&self) -> Result<Vec<(VidPid, DeviceLocation)>> {
        let mut ret = Vec::new();
        for device in libusb::devices()?.iter() {
            let device_desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(e) => {
                    log::warn!("Failed to get descriptor for {:?}: {}", device, e);
                    continue;
                }
            };

            ret.push((
                VidPid::new(device_desc.vendor_id(), device_desc.product_id()),
                DeviceLocation {
                    bus: device.bus_number(),
                    address: device.address(),
                },
            ));
        }

        Ok(ret)
    }
}
