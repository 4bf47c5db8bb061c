//! In-memory platform fake for tests.
//!
//! Several `MockPlatform` instances can share one file store, which is how
//! tests model two cooperating processes racing for the same lock slot.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::Platform;
use crate::core::traits::Clock;

/// Shared in-memory file store.
pub type SharedFiles = Arc<Mutex<HashMap<PathBuf, String>>>;

/// Platform fake with an in-memory filesystem and fixed identity.
pub struct MockPlatform {
    files: SharedFiles,
    username: Mutex<String>,
    hostname: String,
    pid: u32,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::with_shared_files(Arc::new(Mutex::new(HashMap::new())))
    }

    /// Build a fake that shares `files` with another instance, modeling a
    /// second process on the same host.
    pub fn with_shared_files(files: SharedFiles) -> Self {
        Self {
            files,
            username: Mutex::new("testuser".to_string()),
            hostname: "testhost".to_string(),
            pid: 4242,
        }
    }

    /// Handle to the underlying file store.
    pub fn files(&self) -> SharedFiles {
        Arc::clone(&self.files)
    }

    /// Change the identity subsequent calls report.
    pub fn set_username(&self, name: &str) {
        *self.username.lock().expect("mock files lock") = name.to_string();
    }

    /// Number of files currently present.
    pub fn file_count(&self) -> usize {
        self.files.lock().expect("mock files lock").len()
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for MockPlatform {
    fn create_directory(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn process_id(&self) -> u32 {
        self.pid
    }

    fn username(&self) -> String {
        self.username.lock().expect("mock files lock").clone()
    }

    fn hostname(&self) -> String {
        self.hostname.clone()
    }

    fn temp_path(&self) -> PathBuf {
        PathBuf::from("/tmp")
    }

    fn create_lock_file(&self, path: &Path, content: &str) -> io::Result<()> {
        let mut files = self.files.lock().expect("mock files lock");
        if files.contains_key(path) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "exists"));
        }
        files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        self.files
            .lock()
            .expect("mock files lock")
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.files.lock().expect("mock files lock").contains_key(path)
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        self.files
            .lock()
            .expect("mock files lock")
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    fn current_time_string(&self) -> String {
        "2025-01-01 00:00:00".to_string()
    }
}

/// Manually advanced clock for deterministic expiry tests.
#[derive(Default)]
pub struct ManualClock {
    secs: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, secs: u64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, secs: u64) {
        self.secs.store(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.secs.load(Ordering::SeqCst)
    }
}
