//! Device discovery.
//!
//! The core consumes an enumeration of devices and nothing else from the
//! GPU layer; [`DeviceSource`] is that boundary. The NVML-backed
//! implementation lives in [`nvml`]. A source is also the keep-alive for
//! whatever driver handles back the enumerated devices, so the manager
//! owns it for its whole lifetime and drops it last.

pub mod nvml;

use crate::core::device::DeviceDescriptor;

pub use nvml::NvmlDeviceSource;

/// Enumerates the devices of the first available platform.
pub trait DeviceSource: Send + Sync + 'static {
    /// Device list, empty when no platform or no devices are present.
    /// Discovery problems are logged, never raised.
    fn enumerate(&self) -> Vec<DeviceDescriptor>;
}

/// Fixed device inventory, for hosts without a discoverable GPU stack and
/// for tests.
pub struct StaticDeviceSource {
    devices: Vec<DeviceDescriptor>,
}

impl StaticDeviceSource {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        Self { devices }
    }
}

impl DeviceSource for StaticDeviceSource {
    fn enumerate(&self) -> Vec<DeviceDescriptor> {
        self.devices.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::device::{DeviceHandle, DeviceType};

    #[test]
    fn static_source_returns_its_inventory() {
        let source = StaticDeviceSource::new(vec![DeviceDescriptor {
            handle: DeviceHandle(0),
            name: "Fake GPU".to_string(),
            vendor: "Acme".to_string(),
            version: "1.0".to_string(),
            device_type: DeviceType::GPU,
            total_memory: 1024,
        }]);

        let devices = source.enumerate();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Fake GPU");
    }
}
