//! On-disk rendezvous for per-`(device, fraction)` admission.
//!
//! Independent processes agree on who holds a slot purely through files in
//! a shared directory. The naming is deterministic, so two processes
//! asking about the same `(device, fraction)` derive the same path, and
//! creation is atomic-exclusive, so exactly one of two racing processes
//! wins. That pair of properties is the whole cross-process protocol.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::platform::Platform;

const OWNER_KEY: &str = "user: ";

/// Fraction slot granularity: thousandths of the device, rounded.
///
/// Two fractions contend for the same slot iff they round to the same
/// value here; 0.1% granularity is part of the cross-process contract.
pub fn percent_mil(memory_fraction: f32) -> u32 {
    (memory_fraction * 1000.0).round() as u32
}

/// Payload written into a lock file at admission.
#[derive(Debug, Clone)]
pub struct LockRecord {
    pub pid: u32,
    pub user: String,
    pub host: String,
    pub time: String,
    pub device_idx: usize,
    pub memory_fraction: f32,
    pub partition_id: String,
}

impl LockRecord {
    /// Exactly seven `key: value` lines, fixed order, trailing newline.
    /// Foreign processes parse this, so the shape is load-bearing.
    pub fn render(&self) -> String {
        format!(
            "pid: {}\nuser: {}\nhost: {}\ntime: {}\ndevice: {}\nfraction: {}\npartition: {}\n",
            self.pid,
            self.user,
            self.host,
            self.time,
            self.device_idx,
            self.memory_fraction,
            self.partition_id,
        )
    }
}

/// Lock-file naming and lifecycle over a [`Platform`].
pub struct LockStore<P> {
    base_path: PathBuf,
    platform: Arc<P>,
}

impl<P: Platform> LockStore<P> {
    pub fn new(base_path: PathBuf, platform: Arc<P>) -> Self {
        Self {
            base_path,
            platform,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Create the lock directory if needed. Idempotent.
    pub fn initialize_directory(&self) -> io::Result<()> {
        self.platform.create_directory(&self.base_path)
    }

    /// `<base>/gpu_<deviceIdx>_<percentMil %04>.lock`
    pub fn lock_path(&self, device_idx: usize, memory_fraction: f32) -> PathBuf {
        self.base_path.join(format!(
            "gpu_{}_{:04}.lock",
            device_idx,
            percent_mil(memory_fraction)
        ))
    }

    /// Atomically claim the slot. `ErrorKind::AlreadyExists` means another
    /// process (or an earlier partition of this one) holds it.
    pub fn create(
        &self,
        device_idx: usize,
        memory_fraction: f32,
        record: &LockRecord,
    ) -> io::Result<()> {
        let path = self.lock_path(device_idx, memory_fraction);
        self.platform.create_lock_file(&path, &record.render())
    }

    pub fn exists(&self, device_idx: usize, memory_fraction: f32) -> bool {
        self.platform
            .file_exists(&self.lock_path(device_idx, memory_fraction))
    }

    /// Username recorded in the slot's lock file, empty when the file or
    /// the `user:` line is absent.
    pub fn owner(&self, device_idx: usize, memory_fraction: f32) -> String {
        let path = self.lock_path(device_idx, memory_fraction);
        let Ok(content) = self.platform.read_file(&path) else {
            return String::new();
        };

        content
            .lines()
            .find_map(|line| line.strip_prefix(OWNER_KEY))
            .unwrap_or("")
            .to_string()
    }

    /// Free the slot. Absence counts as success: the caller only cares
    /// that the slot is no longer held.
    pub fn release(&self, device_idx: usize, memory_fraction: f32) -> io::Result<()> {
        let path = self.lock_path(device_idx, memory_fraction);
        match self.platform.delete_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPlatform;
    use crate::platform::SystemPlatform;

    fn record(user: &str, partition_id: &str) -> LockRecord {
        LockRecord {
            pid: 1234,
            user: user.to_string(),
            host: "host1".to_string(),
            time: "2025-01-01 00:00:00".to_string(),
            device_idx: 0,
            memory_fraction: 0.5,
            partition_id: partition_id.to_string(),
        }
    }

    fn mock_store() -> LockStore<MockPlatform> {
        LockStore::new(PathBuf::from("/tmp/chronos_locks"), Arc::new(MockPlatform::new()))
    }

    #[test]
    fn percent_mil_rounds_to_thousandths() {
        assert_eq!(percent_mil(1.0), 1000);
        assert_eq!(percent_mil(0.5), 500);
        assert_eq!(percent_mil(0.1), 100);
        assert_eq!(percent_mil(0.001), 1);
        // Slot collision: both round to 250.
        assert_eq!(percent_mil(0.25), percent_mil(0.2504));
    }

    #[test]
    fn lock_path_naming() {
        let store = mock_store();
        assert_eq!(
            store.lock_path(0, 0.5),
            PathBuf::from("/tmp/chronos_locks/gpu_0_0500.lock")
        );
        assert_eq!(
            store.lock_path(3, 1.0),
            PathBuf::from("/tmp/chronos_locks/gpu_3_1000.lock")
        );
        assert_eq!(
            store.lock_path(1, 0.001),
            PathBuf::from("/tmp/chronos_locks/gpu_1_0001.lock")
        );
    }

    #[test]
    fn record_renders_seven_keys_in_order() {
        let rendered = record("alice", "partition_0001").render();
        let keys: Vec<&str> = rendered
            .lines()
            .map(|l| l.split(':').next().unwrap())
            .collect();
        assert_eq!(
            keys,
            ["pid", "user", "host", "time", "device", "fraction", "partition"]
        );
        assert!(rendered.ends_with('\n'));
        assert!(rendered.contains("fraction: 0.5\n"));
    }

    #[test]
    fn create_exists_owner_release_round_trip() {
        let store = mock_store();

        assert!(!store.exists(0, 0.5));
        store.create(0, 0.5, &record("alice", "partition_0001")).unwrap();
        assert!(store.exists(0, 0.5));
        assert_eq!(store.owner(0, 0.5), "alice");

        store.release(0, 0.5).unwrap();
        assert!(!store.exists(0, 0.5));
        assert_eq!(store.owner(0, 0.5), "");
    }

    #[test]
    fn second_create_on_same_slot_loses() {
        let store = mock_store();
        store.create(0, 0.5, &record("alice", "partition_0001")).unwrap();

        let err = store
            .create(0, 0.5, &record("bob", "partition_0002"))
            .expect_err("slot already claimed");
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        // Original owner preserved.
        assert_eq!(store.owner(0, 0.5), "alice");
    }

    #[test]
    fn colliding_fractions_share_a_slot() {
        let store = mock_store();
        store.create(0, 0.25, &record("alice", "partition_0001")).unwrap();

        assert!(store.exists(0, 0.2504));
        assert!(store
            .create(0, 0.2504, &record("bob", "partition_0002"))
            .is_err());
    }

    #[test]
    fn release_of_absent_slot_is_ok() {
        let store = mock_store();
        assert!(store.release(0, 0.9).is_ok());
    }

    #[test]
    fn distinct_slots_do_not_interfere() {
        let store = mock_store();
        store.create(0, 0.1, &record("alice", "partition_0001")).unwrap();
        store.create(0, 0.2, &record("alice", "partition_0002")).unwrap();
        store.create(1, 0.1, &record("alice", "partition_0003")).unwrap();

        store.release(0, 0.1).unwrap();
        assert!(store.exists(0, 0.2));
        assert!(store.exists(1, 0.1));
    }

    #[test]
    fn on_disk_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LockStore::new(dir.path().join("locks"), Arc::new(SystemPlatform::new()));
        store.initialize_directory().unwrap();

        store.create(0, 0.5, &record("alice", "partition_0001")).unwrap();
        assert!(store.exists(0, 0.5));
        assert_eq!(store.owner(0, 0.5), "alice");

        store.release(0, 0.5).unwrap();
        assert!(!store.exists(0, 0.5));
    }

    #[test]
    fn owner_of_malformed_file_is_empty() {
        let store = mock_store();
        let path = store.lock_path(0, 0.5);
        store
            .platform
            .create_lock_file(&path, "pid: 1\nhost: h\n")
            .unwrap();
        assert_eq!(store.owner(0, 0.5), "");
    }
}
