//! NVML-backed device discovery.

use nvml_wrapper::Nvml;
use tracing::warn;

use super::DeviceSource;
use crate::core::device::{DeviceDescriptor, DeviceHandle, DeviceType};

/// Device source backed by the NVIDIA management library.
///
/// Holding this value keeps the NVML session (and with it the enumerated
/// device handles) alive.
pub struct NvmlDeviceSource {
    nvml: Option<Nvml>,
}

impl NvmlDeviceSource {
    /// Initialize NVML. A host without the driver yields a source that
    /// enumerates nothing; that is not an error here.
    pub fn init() -> Self {
        let nvml = match Nvml::init() {
            Ok(nvml) => Some(nvml),
            Err(_) => {
                warn!("Standard NVML init failed, trying with explicit library path");
                match Nvml::builder()
                    .lib_path(std::ffi::OsStr::new("libnvidia-ml.so.1"))
                    .init()
                {
                    Ok(nvml) => Some(nvml),
                    Err(e) => {
                        warn!("NVML unavailable: {e}");
                        None
                    }
                }
            }
        };

        Self { nvml }
    }
}

impl DeviceSource for NvmlDeviceSource {
    fn enumerate(&self) -> Vec<DeviceDescriptor> {
        let Some(nvml) = &self.nvml else {
            return Vec::new();
        };

        let count = match nvml.device_count() {
            Ok(count) => count,
            Err(e) => {
                warn!("Failed to count GPU devices: {e}");
                return Vec::new();
            }
        };

        let driver_version = nvml
            .sys_driver_version()
            .unwrap_or_else(|_| "Unknown".to_string());

        let mut devices = Vec::with_capacity(count as usize);
        for idx in 0..count {
            let device = match nvml.device_by_index(idx) {
                Ok(device) => device,
                Err(e) => {
                    warn!("Failed to open GPU {idx}: {e}");
                    continue;
                }
            };

            // Attribute failures degrade the field, not the device.
            let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
            let total_memory = device.memory_info().map(|m| m.total).unwrap_or(0);

            devices.push(DeviceDescriptor {
                handle: DeviceHandle(idx as u64),
                name,
                vendor: "NVIDIA".to_string(),
                version: driver_version.clone(),
                device_type: DeviceType::GPU,
                total_memory,
            });
        }

        devices
    }
}
