//! Transport error types

use thiserror::Error;

/// Errors surfaced by the transport handle itself
///
/// Connection problems are reported as [`ChannelEvent::Error`] events;
/// this type only covers talking to the worker.
///
/// [`ChannelEvent::Error`]: super::ChannelEvent::Error
#[derive(Error, Debug)]
pub enum TransportError {
    /// The worker task has exited
    #[error("Transport worker is not running")]
    WorkerGone,
}

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
