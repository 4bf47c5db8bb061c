//! Device records as seen by the partition manager.

use std::fmt;

/// Opaque device identity handed out by the GPU layer.
///
/// Only compared for equality; the numeric value carries no meaning to the
/// core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub u64);

/// Bitset of device type flags reported by the GPU layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceType(u32);

impl DeviceType {
    pub const CPU: DeviceType = DeviceType(1 << 0);
    pub const GPU: DeviceType = DeviceType(1 << 1);
    pub const ACCELERATOR: DeviceType = DeviceType(1 << 2);
    pub const DEFAULT: DeviceType = DeviceType(1 << 3);

    pub fn contains(self, other: DeviceType) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: DeviceType) -> DeviceType {
        DeviceType(self.0 | other.0)
    }

    /// Space-separated human tokens, `Unknown` when no flag is set.
    pub fn type_string(self) -> String {
        let mut out = String::new();
        if self.contains(Self::CPU) {
            out.push_str("CPU ");
        }
        if self.contains(Self::GPU) {
            out.push_str("GPU ");
        }
        if self.contains(Self::ACCELERATOR) {
            out.push_str("Accelerator ");
        }
        if self.contains(Self::DEFAULT) {
            out.push_str("Default ");
        }
        if out.is_empty() {
            out.push_str("Unknown");
        }
        out
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_string())
    }
}

/// Immutable device attributes queried once at startup.
///
/// The mutable available-memory counter lives in the guarded manager state,
/// not here; these fields are safe to read without the guard.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub handle: DeviceHandle,
    pub name: String,
    pub vendor: String,
    pub version: String,
    pub device_type: DeviceType,
    pub total_memory: u64,
}
