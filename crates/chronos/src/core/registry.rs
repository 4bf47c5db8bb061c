//! Immutable device registry built once at startup.

use tracing::{info, warn};

use super::device::{DeviceDescriptor, DeviceHandle};
use crate::gpu::DeviceSource;

/// The devices this manager coordinates.
///
/// Built once from a [`DeviceSource`] and never mutated; the per-device
/// available-memory counters live in the guarded manager state.
pub struct DeviceRegistry {
    devices: Vec<DeviceDescriptor>,
}

impl DeviceRegistry {
    /// Enumerate devices and log the startup banner. An empty enumeration
    /// produces a permanently empty registry (every device-index argument
    /// will fail validation) and a warning, not an error.
    pub fn discover(source: &dyn DeviceSource) -> Self {
        let devices = source.enumerate();

        if devices.is_empty() {
            warn!("No GPU platforms or devices found; registry is empty");
            return Self { devices };
        }

        info!("Found {} device(s)", devices.len());
        for (idx, device) in devices.iter().enumerate() {
            info!(
                "Device {idx}: {} | type: {}| vendor: {} | version: {} | total memory: {} MB",
                device.name,
                device.device_type.type_string(),
                device.vendor,
                device.version,
                device.total_memory / (1024 * 1024),
            );
        }

        Self { devices }
    }

    pub fn get(&self, device_idx: usize) -> Option<&DeviceDescriptor> {
        self.devices.get(device_idx)
    }

    /// Index of the device with the given handle, as assigned at discovery.
    pub fn index_of(&self, handle: DeviceHandle) -> Option<usize> {
        self.devices.iter().position(|d| d.handle == handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceDescriptor> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Initial available-memory counters: one full device each.
    pub fn initial_available(&self) -> Vec<u64> {
        self.devices.iter().map(|d| d.total_memory).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::device::DeviceType;
    use crate::gpu::StaticDeviceSource;

    fn descriptor(handle: u64, total: u64) -> DeviceDescriptor {
        DeviceDescriptor {
            handle: DeviceHandle(handle),
            name: format!("GPU {handle}"),
            vendor: "Acme".to_string(),
            version: "1.2".to_string(),
            device_type: DeviceType::GPU,
            total_memory: total,
        }
    }

    #[test]
    fn discover_assigns_indices_in_enumeration_order() {
        let source = StaticDeviceSource::new(vec![descriptor(10, 100), descriptor(20, 200)]);
        let registry = DeviceRegistry::discover(&source);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(0).unwrap().handle, DeviceHandle(10));
        assert_eq!(registry.get(1).unwrap().handle, DeviceHandle(20));
        assert_eq!(registry.index_of(DeviceHandle(20)), Some(1));
        assert_eq!(registry.index_of(DeviceHandle(99)), None);
    }

    #[test]
    fn empty_enumeration_yields_empty_registry() {
        let source = StaticDeviceSource::new(Vec::new());
        let registry = DeviceRegistry::discover(&source);

        assert!(registry.is_empty());
        assert!(registry.get(0).is_none());
        assert!(registry.initial_available().is_empty());
    }

    #[test]
    fn initial_counters_equal_total_memory() {
        let source = StaticDeviceSource::new(vec![descriptor(0, 100), descriptor(1, 200)]);
        let registry = DeviceRegistry::discover(&source);
        assert_eq!(registry.initial_available(), vec![100, 200]);
    }
}
