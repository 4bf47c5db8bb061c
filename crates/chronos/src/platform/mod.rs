//! Platform capability surface.
//!
//! Everything the partition manager needs from the host OS is expressed as
//! one trait so the core stays testable with an in-memory fake. The real
//! implementation lives in [`unix`], the fake in [`mock`].

pub mod mock;
pub mod unix;

use std::io;
use std::path::{Path, PathBuf};

pub use unix::SystemPlatform;

/// Host-OS capabilities consumed by the core.
///
/// The only primitive with non-obvious semantics is [`create_lock_file`]:
/// it must be atomic-exclusive (fail if the path already exists), because
/// cross-process admission safety rests entirely on it.
///
/// [`create_lock_file`]: Platform::create_lock_file
pub trait Platform: Send + Sync + 'static {
    /// Create a directory, succeeding if it already exists.
    fn create_directory(&self, path: &Path) -> io::Result<()>;

    /// Current process id.
    fn process_id(&self) -> u32;

    /// Name of the user running this process.
    fn username(&self) -> String;

    /// Host name of this machine.
    fn hostname(&self) -> String;

    /// Base temp directory for this platform.
    fn temp_path(&self) -> PathBuf;

    /// Atomically create a file that must not yet exist and write `content`
    /// to it. Returns `ErrorKind::AlreadyExists` when another process won
    /// the race. A file left half-written by a failed write is removed
    /// before the error is reported.
    fn create_lock_file(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Remove a file.
    fn delete_file(&self, path: &Path) -> io::Result<()>;

    /// Whether a regular file exists at `path`.
    fn file_exists(&self, path: &Path) -> bool;

    /// Read a file to a string. Absent files read as an error.
    fn read_file(&self, path: &Path) -> io::Result<String>;

    /// Local wall-clock time formatted `YYYY-MM-DD HH:MM:SS`.
    fn current_time_string(&self) -> String;
}
