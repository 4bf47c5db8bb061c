//! Lease records held in the partition table.

use super::device::DeviceHandle;

/// One time-bounded claim on a fraction of a device's memory.
///
/// Mutated in exactly one way after admission: `active` flips to `false`
/// on expiry, early release, or shutdown. The monitor removes inactive
/// records on its next sweep.
#[derive(Debug, Clone)]
pub struct Partition {
    pub partition_id: String,
    pub device: DeviceHandle,
    pub memory_fraction: f32,
    pub duration_secs: u64,
    /// Monotonic admission instant, for expiry arithmetic.
    pub started_secs: u64,
    /// Wall-clock admission time, for display only.
    pub started_display: String,
    pub active: bool,
    pub owner: String,
    pub process_id: u32,
}

impl Partition {
    /// Whether the lease's time has elapsed at monotonic instant `now`.
    /// Inactive records count as expired.
    pub fn is_expired(&self, now_secs: u64) -> bool {
        if !self.active {
            return true;
        }
        now_secs.saturating_sub(self.started_secs) >= self.duration_secs
    }

    /// Seconds left until expiry at `now`, zero once elapsed or inactive.
    pub fn remaining_secs(&self, now_secs: u64) -> u64 {
        if !self.active {
            return 0;
        }
        self.duration_secs
            .saturating_sub(now_secs.saturating_sub(self.started_secs))
    }
}

/// Read-only view of an active partition returned by `list`.
#[derive(Debug, Clone)]
pub struct PartitionSnapshot {
    pub partition_id: String,
    pub device: DeviceHandle,
    pub device_idx: usize,
    pub device_name: String,
    pub memory_fraction: f32,
    pub duration_secs: u64,
    pub remaining_secs: u64,
    pub started_display: String,
    pub owner: String,
    pub process_id: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition(started: u64, duration: u64, active: bool) -> Partition {
        Partition {
            partition_id: "partition_0001".to_string(),
            device: DeviceHandle(0),
            memory_fraction: 0.5,
            duration_secs: duration,
            started_secs: started,
            started_display: "2025-01-01 00:00:00".to_string(),
            active,
            owner: "alice".to_string(),
            process_id: 1,
        }
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let p = partition(100, 10, true);
        assert!(!p.is_expired(109));
        assert!(p.is_expired(110));
        assert!(p.is_expired(200));
    }

    #[test]
    fn inactive_records_read_as_expired_with_no_time_left() {
        let p = partition(100, 10, false);
        assert!(p.is_expired(100));
        assert_eq!(p.remaining_secs(100), 0);
    }

    #[test]
    fn remaining_saturates_at_zero() {
        let p = partition(100, 10, true);
        assert_eq!(p.remaining_secs(100), 10);
        assert_eq!(p.remaining_secs(104), 6);
        assert_eq!(p.remaining_secs(110), 0);
        assert_eq!(p.remaining_secs(500), 0);
    }

    #[test]
    fn clock_before_start_does_not_underflow() {
        // A monotonic source never goes backwards, but the arithmetic must
        // not panic if handed a smaller instant.
        let p = partition(100, 10, true);
        assert_eq!(p.remaining_secs(50), 10);
        assert!(!p.is_expired(50));
    }
}
