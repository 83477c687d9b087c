use std::time::Duration;

/// Errors that can occur while configuring or running a framer.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The framer configuration violates a constraint.
    #[error("invalid framer config: {0}")]
    InvalidConfig(String),

    /// The frame queue was closed and fully drained.
    #[error("frame queue closed")]
    QueueClosed,

    /// No frame arrived before the dequeue deadline.
    #[error("no frame within {0:?}")]
    Timeout(Duration),

    /// The framer worker could not be started.
    #[error("failed to start framer worker: {0}")]
    WorkerSpawn(std::io::Error),

    /// The byte source or sink failed.
    #[error("transport error: {0}")]
    Transport(#[from] serframe_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
