//! Partition lifecycle engine.
//!
//! One `PartitionManager` coordinates admission, release, expiry, and
//! cross-process locking for the devices it discovered at startup. All
//! mutable state (the partition table and the per-device available-memory
//! counters) sits behind a single guard; the lock-store file operations
//! run inside that critical section so the check-then-create sequence in
//! admission is indivisible with respect to the in-process table.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::monitor;
use super::partition::{Partition, PartitionSnapshot};
use super::registry::DeviceRegistry;
use super::report::{self, DeviceStats};
use super::traits::Clock;
use super::types::{PartitionError, Result};
use crate::gpu::DeviceSource;
use crate::lock::{LockRecord, LockStore};
use crate::platform::Platform;

const MIB: u64 = 1024 * 1024;

/// Construction parameters.
pub struct ManagerConfig {
    /// Lock directory; defaults to `<temp>/chronos_locks`.
    pub lock_dir: Option<PathBuf>,
    /// Sweep period of the expiration monitor. One second nominal;
    /// expiry accuracy is ±one period by contract.
    pub monitor_period: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            lock_dir: None,
            monitor_period: Duration::from_secs(1),
        }
    }
}

/// Guarded mutable state: the partition table, the per-device
/// available-memory counters (indexed like the registry), and the id
/// counter.
pub(crate) struct TableState {
    pub(crate) available: Vec<u64>,
    pub(crate) partitions: Vec<Partition>,
    next_seq: u32,
}

impl TableState {
    /// `partition_NNNN`, counting from 1 per manager instance.
    fn next_partition_id(&mut self) -> String {
        self.next_seq += 1;
        format!("partition_{:04}", self.next_seq)
    }
}

/// State shared between the public API and the monitor task.
pub(crate) struct ManagerShared<P, C> {
    pub(crate) platform: Arc<P>,
    pub(crate) clock: C,
    pub(crate) registry: DeviceRegistry,
    pub(crate) locks: LockStore<P>,
    pub(crate) state: Mutex<TableState>,
    // Keeps driver handles alive for the registry's lifetime; dropped
    // after everything above.
    _device_source: Box<dyn DeviceSource>,
}

impl<P: Platform, C: Clock> ManagerShared<P, C> {
    /// Shared release procedure: credit the device, drop the lock file,
    /// deactivate the record. Never fails observably; a lock-delete error
    /// is logged and in-process release still proceeds.
    pub(crate) fn release_resources(&self, available: &mut [u64], partition: &mut Partition) {
        if let Some(device_idx) = self.registry.index_of(partition.device) {
            if let Some(device) = self.registry.get(device_idx) {
                let freed =
                    (device.total_memory as f64 * partition.memory_fraction as f64) as u64;
                available[device_idx] += freed;
            }
            if let Err(e) = self.locks.release(device_idx, partition.memory_fraction) {
                warn!(
                    "Failed to delete lock file for {}: {e}",
                    partition.partition_id
                );
            }
        }
        partition.active = false;
    }

    /// One monitor pass: expire due leases, then drop inactive records.
    pub(crate) async fn sweep_expired(&self) {
        let mut expired = Vec::new();
        {
            let mut state = self.state.lock().await;
            let now = self.clock.now_secs();
            let TableState {
                available,
                partitions,
                ..
            } = &mut *state;

            for partition in partitions.iter_mut() {
                if partition.active && partition.is_expired(now) {
                    self.release_resources(available, partition);
                    expired.push(partition.partition_id.clone());
                }
            }

            partitions.retain(|p| p.active);
        }

        for partition_id in expired {
            info!("Partition {partition_id} expired and released");
        }
    }
}

/// Time-bounded GPU partition manager.
///
/// Owns the device registry, the partition table, and a background
/// expiration monitor spawned at construction. Call [`shutdown`] to stop
/// the monitor and reclaim every still-active lease; dropping without it
/// cancels the monitor but leaves lock files for the next admission by
/// the same user (stale locks from a crashed process behave the same way
/// and are administrator-serviceable by deleting files under the lock
/// directory).
///
/// [`shutdown`]: PartitionManager::shutdown
pub struct PartitionManager<P: Platform, C: Clock> {
    shared: Arc<ManagerShared<P, C>>,
    cancel: CancellationToken,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl<P: Platform, C: Clock> PartitionManager<P, C> {
    /// Discover devices, prepare the lock directory, and start the
    /// expiration monitor. Must be called within a Tokio runtime.
    pub fn new(
        config: ManagerConfig,
        device_source: Box<dyn DeviceSource>,
        platform: Arc<P>,
        clock: C,
    ) -> Self {
        let lock_dir = config
            .lock_dir
            .unwrap_or_else(|| platform.temp_path().join("chronos_locks"));
        let locks = LockStore::new(lock_dir, Arc::clone(&platform));
        if let Err(e) = locks.initialize_directory() {
            warn!(
                "Failed to create lock directory {}: {e}",
                locks.base_path().display()
            );
        }

        let registry = DeviceRegistry::discover(device_source.as_ref());
        let available = registry.initial_available();

        let shared = Arc::new(ManagerShared {
            platform,
            clock,
            registry,
            locks,
            state: Mutex::new(TableState {
                available,
                partitions: Vec::new(),
                next_seq: 0,
            }),
            _device_source: device_source,
        });

        let cancel = CancellationToken::new();
        let monitor = tokio::spawn(monitor::run(
            Arc::clone(&shared),
            config.monitor_period,
            cancel.clone(),
        ));

        Self {
            shared,
            cancel,
            monitor: Mutex::new(Some(monitor)),
        }
    }

    /// Number of devices in the registry.
    pub fn device_count(&self) -> usize {
        self.shared.registry.len()
    }

    /// Claim `memory_fraction` of device `device_idx` for
    /// `duration_secs`, owned by the calling user.
    pub async fn create_partition(
        &self,
        device_idx: usize,
        memory_fraction: f32,
        duration_secs: u64,
    ) -> Result<String> {
        let owner = self.shared.platform.username();
        self.create_partition_as(device_idx, memory_fraction, duration_secs, &owner)
            .await
    }

    /// Claim a partition on behalf of an explicit owner. The lock file
    /// and the ownership check on release both carry `owner`, not the
    /// calling user.
    #[tracing::instrument(skip(self))]
    pub async fn create_partition_as(
        &self,
        device_idx: usize,
        memory_fraction: f32,
        duration_secs: u64,
        owner: &str,
    ) -> Result<String> {
        let shared = &self.shared;

        let device = shared.registry.get(device_idx).ok_or_else(|| {
            PartitionError::invalid_argument(format!("invalid device index: {device_idx}"))
        })?;
        if !(memory_fraction > 0.0 && memory_fraction <= 1.0) {
            return Err(PartitionError::invalid_argument(format!(
                "invalid memory fraction: {memory_fraction}; must be within (0, 1]"
            )));
        }
        if duration_secs == 0 {
            return Err(PartitionError::invalid_argument(
                "invalid duration: must be positive",
            ));
        }

        let mut state = shared.state.lock().await;

        let requested = (device.total_memory as f64 * memory_fraction as f64) as u64;
        let available = state.available[device_idx];
        if device.total_memory == 0 || requested > available {
            return Err(PartitionError::InsufficientMemory {
                device_idx,
                requested_mb: requested / MIB,
                available_mb: available / MIB,
            });
        }

        // A foreign owner on the slot rejects before we ever try to
        // create; a lost create race below is the cross-process case.
        if shared.locks.exists(device_idx, memory_fraction) {
            let lock_owner = shared.locks.owner(device_idx, memory_fraction);
            if lock_owner != owner {
                return Err(PartitionError::Contended { owner: lock_owner });
            }
        }

        let partition_id = state.next_partition_id();
        let process_id = shared.platform.process_id();
        let record = LockRecord {
            pid: process_id,
            user: owner.to_string(),
            host: shared.platform.hostname(),
            time: shared.platform.current_time_string(),
            device_idx,
            memory_fraction,
            partition_id: partition_id.clone(),
        };

        if let Err(e) = shared.locks.create(device_idx, memory_fraction, &record) {
            let lock_owner = shared.locks.owner(device_idx, memory_fraction);
            drop(state);
            warn!("Failed to create lock for GPU partition: {e}");
            return Err(PartitionError::Contended { owner: lock_owner });
        }

        // Memory moves only after the slot is ours; a failed lock create
        // above therefore needs no rollback.
        state.available[device_idx] -= requested;
        state.partitions.push(Partition {
            partition_id: partition_id.clone(),
            device: device.handle,
            memory_fraction,
            duration_secs,
            started_secs: shared.clock.now_secs(),
            started_display: record.time.clone(),
            active: true,
            owner: owner.to_string(),
            process_id,
        });
        drop(state);

        info!(
            "Created partition {partition_id} on device {device_idx} ({}) with {} for {}",
            device.name,
            utils::fmt::format_byte_size(requested),
            utils::fmt::format_duration(duration_secs),
        );
        info!("Locked for exclusive use by {owner} (PID: {process_id})");

        Ok(partition_id)
    }

    /// Snapshots of the active partitions. With `print_output`, also
    /// renders the listing to stdout (after the guard is released).
    pub async fn list_partitions(&self, print_output: bool) -> Vec<PartitionSnapshot> {
        let snapshots: Vec<PartitionSnapshot> = {
            let state = self.shared.state.lock().await;
            let now = self.shared.clock.now_secs();

            state
                .partitions
                .iter()
                .filter(|p| p.active)
                .filter_map(|p| {
                    let device_idx = self.shared.registry.index_of(p.device)?;
                    let device = self.shared.registry.get(device_idx)?;
                    Some(PartitionSnapshot {
                        partition_id: p.partition_id.clone(),
                        device: p.device,
                        device_idx,
                        device_name: device.name.clone(),
                        memory_fraction: p.memory_fraction,
                        duration_secs: p.duration_secs,
                        remaining_secs: p.remaining_secs(now),
                        started_display: p.started_display.clone(),
                        owner: p.owner.clone(),
                        process_id: p.process_id,
                    })
                })
                .collect()
        };

        if print_output {
            print!("{}", report::render_partition_list(&snapshots));
        }

        snapshots
    }

    /// Release a partition early. Only the recorded owner may release;
    /// anyone else gets `PermissionDenied` and the lease is untouched.
    #[tracing::instrument(skip(self))]
    pub async fn release_partition(&self, partition_id: &str) -> Result<()> {
        let current_user = self.shared.platform.username();

        {
            let mut state = self.shared.state.lock().await;
            let TableState {
                available,
                partitions,
                ..
            } = &mut *state;

            let Some(partition) = partitions
                .iter_mut()
                .find(|p| p.partition_id == partition_id && p.active)
            else {
                return Err(PartitionError::NotFound {
                    partition_id: partition_id.to_string(),
                });
            };

            if partition.owner != current_user {
                return Err(PartitionError::PermissionDenied {
                    owner: partition.owner.clone(),
                });
            }

            self.shared.release_resources(available, partition);
        }

        info!("Partition {partition_id} released");
        Ok(())
    }

    /// Per-device stats snapshot.
    pub async fn device_stats(&self) -> Vec<DeviceStats> {
        let state = self.shared.state.lock().await;

        self.shared
            .registry
            .iter()
            .enumerate()
            .map(|(device_idx, device)| DeviceStats {
                device_idx,
                name: device.name.clone(),
                type_string: device.device_type.type_string(),
                vendor: device.vendor.clone(),
                version: device.version.clone(),
                total_memory: device.total_memory,
                available_memory: state.available[device_idx],
                active_partitions: state
                    .partitions
                    .iter()
                    .filter(|p| p.active && p.device == device.handle)
                    .count(),
            })
            .collect()
    }

    /// Render the stats report to stdout.
    pub async fn show_device_stats(&self) {
        let stats = self.device_stats().await;
        print!("{}", report::render_device_stats(&stats));
    }

    /// Percentage of the device's memory not reserved through this
    /// manager, in `[0, 100]`.
    ///
    /// Reflects only this process's accounting; slots held by foreign
    /// processes show up at admission time, not here.
    pub async fn available_percentage(&self, device_idx: usize) -> Result<f32> {
        let device = self.shared.registry.get(device_idx).ok_or_else(|| {
            PartitionError::invalid_argument(format!("invalid device index: {device_idx}"))
        })?;

        let state = self.shared.state.lock().await;
        if device.total_memory == 0 {
            return Ok(0.0);
        }
        Ok((100.0 * state.available[device_idx] as f64 / device.total_memory as f64) as f32)
    }

    /// Stop the monitor, then reclaim every still-active lease under the
    /// guard. Devices (and the underlying driver session) are released
    /// when the manager drops afterwards.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.monitor.lock().await.take() {
            if let Err(e) = handle.await {
                warn!("Expiration monitor task failed to join: {e}");
            }
        }

        let mut state = self.shared.state.lock().await;
        let TableState {
            available,
            partitions,
            ..
        } = &mut *state;

        for partition in partitions.iter_mut() {
            if partition.active {
                self.shared.release_resources(available, partition);
            }
        }
        partitions.clear();
    }
}

impl<P: Platform, C: Clock> Drop for PartitionManager<P, C> {
    fn drop(&mut self) {
        // Stops the monitor if shutdown() was never awaited; active
        // leases then stay on disk until a fresh manager or an
        // administrator removes them.
        self.cancel.cancel();
    }
}
