//! Uses nusb (pure Rust) to list system USB devices. Requires 'nusb' feature.
use super::*;
use ::nusb;

#[derive(Debug)]
pub(crate) struct NusbResolver;

impl Resolver for NusbResolver {
    fn list(&self) -> Result<Vec<(VidPid, DeviceLocation)>> {
        let devices = nusb::list_devices()
            .map_err(|e| Error::new(ErrorKind::Nusb, &format!("Failed to list devices: {}", e)))?;

        Ok(devices
            .map(|device_info| {
                log::trace!("{:?}", device_info);
                (
                    VidPid::new(device_info.vendor_id(), device_info.product_id()),
                    DeviceLocation {
                        bus: device_info.bus_number(),
                        address: device_info.device_address(),
                    },
                )
            })
            .collect())
    }
}
