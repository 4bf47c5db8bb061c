use std::sync::Arc;

use clap::error::ErrorKind;
use clap::Parser;

use chronos::config::{Cli, Commands};
use chronos::gpu::NvmlDeviceSource;
use chronos::platform::SystemPlatform;
use chronos::{ManagerConfig, MonotonicClock, PartitionManager};

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() {
    setup_global_hooks();
    utils::logging::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let requested = matches!(
                e.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            );
            let _ = e.print();
            std::process::exit(if requested { 0 } else { 1 });
        }
    };

    let manager = PartitionManager::new(
        ManagerConfig {
            lock_dir: cli.lock_dir.clone(),
            ..Default::default()
        },
        Box::new(NvmlDeviceSource::init()),
        Arc::new(SystemPlatform::new()),
        MonotonicClock::new(),
    );

    let code = run_command(&manager, cli.command).await;

    manager.shutdown().await;
    std::process::exit(code);
}

async fn run_command(
    manager: &PartitionManager<SystemPlatform, MonotonicClock>,
    command: Commands,
) -> i32 {
    match command {
        Commands::Create {
            device_idx,
            memory_fraction,
            duration_secs,
        } => match manager
            .create_partition(device_idx, memory_fraction, duration_secs)
            .await
        {
            Ok(partition_id) => {
                println!("{partition_id}");
                0
            }
            Err(e) => {
                tracing::error!("Cannot create partition: {e}");
                1
            }
        },
        Commands::List => {
            manager.list_partitions(true).await;
            0
        }
        Commands::Release { partition_id } => {
            match manager.release_partition(&partition_id).await {
                Ok(()) => 0,
                Err(e) => {
                    tracing::error!("Cannot release partition: {e}");
                    1
                }
            }
        }
        Commands::Stats => {
            manager.show_device_stats().await;
            0
        }
        Commands::Available { device_idx } => {
            match manager.available_percentage(device_idx).await {
                Ok(percent) => {
                    println!("{percent:.2}");
                    0
                }
                Err(e) => {
                    tracing::error!("{e}");
                    1
                }
            }
        }
    }
}
