//! Error type for the public partition operations.

/// Failure modes of the partition lifecycle operations.
///
/// Every public operation's failure is one of these; no panics cross the
/// API boundary.
#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error(
        "not enough available memory on device {device_idx}: \
         requested {requested_mb} MB, available {available_mb} MB"
    )]
    InsufficientMemory {
        device_idx: usize,
        requested_mb: u64,
        available_mb: u64,
    },

    #[error("GPU partition is locked by user: {owner}")]
    Contended { owner: String },

    #[error("permission denied: partition owned by {owner}")]
    PermissionDenied { owner: String },

    #[error("partition not found or already released: {partition_id}")]
    NotFound { partition_id: String },

    #[error("no GPU platforms or devices available")]
    PlatformUnavailable,
}

impl PartitionError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

/// Result type for partition operations.
pub type Result<T> = std::result::Result<T, PartitionError>;
