//! Text renderers for the listing and stats reports.
//!
//! Kept free of state so the exact output shape is unit-testable; the
//! manager and CLI print what these return.

use std::fmt::Write;

use super::partition::PartitionSnapshot;

/// Per-device stats snapshot taken under the guard.
#[derive(Debug, Clone)]
pub struct DeviceStats {
    pub device_idx: usize,
    pub name: String,
    pub type_string: String,
    pub vendor: String,
    pub version: String,
    pub total_memory: u64,
    pub available_memory: u64,
    pub active_partitions: usize,
}

impl DeviceStats {
    pub fn used_memory(&self) -> u64 {
        self.total_memory.saturating_sub(self.available_memory)
    }

    pub fn usage_percent(&self) -> f64 {
        if self.total_memory == 0 {
            return 0.0;
        }
        100.0 * (1.0 - self.available_memory as f64 / self.total_memory as f64)
    }
}

const MIB: u64 = 1024 * 1024;

pub fn render_partition_list(partitions: &[PartitionSnapshot]) -> String {
    if partitions.is_empty() {
        return "No active partitions\n".to_string();
    }

    let mut out = String::new();
    out.push_str("Active partitions:\n");
    out.push_str("-----------------\n");

    for p in partitions {
        let _ = writeln!(out, "ID: {}", p.partition_id);
        let _ = writeln!(out, "  Device: {} ({})", p.device_idx, p.device_name);
        let _ = writeln!(out, "  Memory: {:.2}%", f64::from(p.memory_fraction) * 100.0);
        let _ = writeln!(out, "  Time remaining: {} seconds", p.remaining_secs);
        let _ = writeln!(out, "  Owner: {} (PID: {})", p.owner, p.process_id);
        out.push('\n');
    }

    out
}

pub fn render_device_stats(devices: &[DeviceStats]) -> String {
    let mut out = String::new();
    out.push_str("Device statistics:\n");
    out.push_str("=================\n");

    for d in devices {
        let _ = writeln!(out, "Device {}: {}", d.device_idx, d.name);
        let _ = writeln!(out, "  Type: {}", d.type_string);
        let _ = writeln!(out, "  Vendor: {}", d.vendor);
        let _ = writeln!(out, "  Version: {}", d.version);
        out.push_str("  Memory:\n");
        let _ = writeln!(out, "    Total: {} MB", d.total_memory / MIB);
        let _ = writeln!(out, "    Used: {} MB", d.used_memory() / MIB);
        let _ = writeln!(out, "    Available: {} MB", d.available_memory / MIB);
        let _ = writeln!(out, "    Usage: {:.2}%", d.usage_percent());
        out.push_str("  Chronos management:\n");
        let _ = writeln!(out, "    Active partitions: {}", d.active_partitions);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::device::DeviceHandle;

    fn snapshot() -> PartitionSnapshot {
        PartitionSnapshot {
            partition_id: "partition_0001".to_string(),
            device: DeviceHandle(0),
            device_idx: 0,
            device_name: "Test GPU".to_string(),
            memory_fraction: 0.1,
            duration_secs: 5,
            remaining_secs: 4,
            started_display: "2025-01-01 00:00:00".to_string(),
            owner: "alice".to_string(),
            process_id: 1234,
        }
    }

    #[test]
    fn empty_list_renders_placeholder() {
        assert_eq!(render_partition_list(&[]), "No active partitions\n");
    }

    #[test]
    fn listing_block_shape() {
        let out = render_partition_list(&[snapshot()]);
        assert_eq!(
            out,
            "Active partitions:\n\
             -----------------\n\
             ID: partition_0001\n\
             \x20 Device: 0 (Test GPU)\n\
             \x20 Memory: 10.00%\n\
             \x20 Time remaining: 4 seconds\n\
             \x20 Owner: alice (PID: 1234)\n\
             \n"
        );
    }

    #[test]
    fn memory_percent_comes_from_the_true_fraction() {
        // Not from the rounded lock-slot bucket: 0.12345 is slot 123 but
        // must display as 12.35%.
        let mut snap = snapshot();
        snap.memory_fraction = 0.12345;
        let out = render_partition_list(&[snap]);
        assert!(out.contains("  Memory: 12.35%\n"), "got:\n{out}");
    }

    #[test]
    fn stats_block_shape() {
        let stats = DeviceStats {
            device_idx: 0,
            name: "Test GPU".to_string(),
            type_string: "GPU ".to_string(),
            vendor: "Acme".to_string(),
            version: "1.2".to_string(),
            total_memory: 1000 * MIB,
            available_memory: 400 * MIB,
            active_partitions: 2,
        };

        let out = render_device_stats(&[stats]);
        assert!(out.starts_with("Device statistics:\n=================\n"));
        assert!(out.contains("Device 0: Test GPU\n"));
        assert!(out.contains("  Type: GPU \n"));
        assert!(out.contains("    Total: 1000 MB\n"));
        assert!(out.contains("    Used: 600 MB\n"));
        assert!(out.contains("    Available: 400 MB\n"));
        assert!(out.contains("    Usage: 60.00%\n"));
        assert!(out.contains("    Active partitions: 2\n"));
        assert!(out.ends_with("\n\n"));
    }

    #[test]
    fn zero_total_memory_reports_zero_usage() {
        let stats = DeviceStats {
            device_idx: 0,
            name: "Ghost".to_string(),
            type_string: "Unknown".to_string(),
            vendor: "Unknown".to_string(),
            version: "Unknown".to_string(),
            total_memory: 0,
            available_memory: 0,
            active_partitions: 0,
        };
        assert_eq!(stats.usage_percent(), 0.0);
    }
}
