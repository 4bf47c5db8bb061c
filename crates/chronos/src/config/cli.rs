use std::path::PathBuf;

use clap::{Parser, Subcommand};
use utils::version;

const AFTER_HELP: &str = "\
Examples:
  chronos create 0 0.5 3600      # Use 50% of GPU 0 for 1 hour
  chronos list                   # List all active partitions
  chronos release partition_0001 # Release partition early
  chronos stats                  # Show device statistics
  chronos available 0            # Get percentage of GPU 0 available";

#[derive(Parser)]
#[command(
    name = "chronos",
    about = "A time-based GPU partitioning utility",
    version = &**version::VERSION,
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Base directory for cross-process lock files
    #[arg(long, env = "CHRONOS_LOCK_DIR", global = true)]
    pub lock_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a time-bounded partition on a device
    Create {
        /// Device index as reported by `stats`
        device_idx: usize,
        /// Memory fraction in (0, 1]
        memory_fraction: f32,
        /// Lease duration in seconds
        duration_secs: u64,
    },
    /// List active partitions
    List,
    /// Release a partition before it expires
    Release {
        /// Id returned by `create`, e.g. partition_0001
        partition_id: String,
    },
    /// Show per-device statistics
    Stats,
    /// Print the available memory percentage of a device
    Available {
        /// Device index as reported by `stats`
        device_idx: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_arguments() {
        let cli = Cli::try_parse_from(["chronos", "create", "0", "0.5", "3600"]).unwrap();
        match cli.command {
            Commands::Create {
                device_idx,
                memory_fraction,
                duration_secs,
            } => {
                assert_eq!(device_idx, 0);
                assert_eq!(memory_fraction, 0.5);
                assert_eq!(duration_secs, 3600);
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn rejects_non_numeric_arguments() {
        assert!(Cli::try_parse_from(["chronos", "create", "zero", "0.5", "60"]).is_err());
        assert!(Cli::try_parse_from(["chronos", "available", "x"]).is_err());
    }

    #[test]
    fn rejects_unknown_command() {
        assert!(Cli::try_parse_from(["chronos", "destroy"]).is_err());
    }

    #[test]
    fn lock_dir_flag_is_global() {
        let cli = Cli::try_parse_from(["chronos", "list", "--lock-dir", "/var/lock/chronos"])
            .unwrap();
        assert_eq!(cli.lock_dir, Some(PathBuf::from("/var/lock/chronos")));
    }
}
