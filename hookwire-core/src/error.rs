//! Custom error types for hookwire.
//!
//! Explicit enum error types only. No `Box<dyn Error>`, no `anyhow::Result`.
//! Buffer-local conditions (`Full`, `Empty`) stay inside [`RingError`] and the
//! push/pop errors; platform failures carry the underlying `io::Error`.

use std::path::PathBuf;

use thiserror::Error;

use crate::compat::BinaryVersion;

/// Top-level error type for hookwire.
#[derive(Debug, Error)]
pub enum HookwireError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Channel Errors
    // =========================================================================
    #[error("Invalid channel state transition: {from} -> {to}")]
    InvalidStateTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Channel is not open")]
    NotOpen,

    #[error("Attach error: {0}")]
    Attach(#[from] AttachError),

    #[error("Push error: {0}")]
    Push(#[from] PushError),

    #[error("Pop error: {0}")]
    Pop(#[from] PopError),

    #[error("Synchronization error: {0}")]
    Sync(#[from] SyncError),

    // =========================================================================
    // Producer Module Errors - Strict Version Equality
    // =========================================================================
    #[error(
        "the version of the producer module ({producer}) is not compatible with the channel ({consumer})"
    )]
    IncompatibleVersion {
        producer: BinaryVersion,
        consumer: BinaryVersion,
    },

    #[error("Failed to install producer hook: {reason}")]
    HookInstall { reason: String },

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors reject a configuration before any channel is opened.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid object name: {name:?} - {reason}")]
    InvalidName { name: String, reason: String },
}

/// Shared memory errors - critical failures with no fallback.
#[derive(Debug, Error)]
pub enum SharedMemoryError {
    #[error("Failed to create shared memory region: {name} - {source}")]
    CreateFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open shared memory region: {name} - {source}")]
    OpenFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to map shared memory region {name}: {source}")]
    MapFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Shared memory region {name} has {actual} bytes, layout requires {expected}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid shared memory request for {name}: {reason}")]
    InvalidRequest { name: String, reason: String },
}

/// Errors raised while creating or attaching to the channel's shared objects.
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("{0}")]
    SharedMemory(#[from] SharedMemoryError),

    #[error("Failed to open {object} {name}: {source}")]
    Primitive {
        object: &'static str,
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Another consumer already owns channel notification {name}")]
    ConsumerAlreadyRunning { name: String },

    #[error("Operation requires the {expected} role")]
    WrongRole { expected: &'static str },
}

/// Failures of the cross-process lock or the notifications.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to acquire lock {name}: {source}")]
    LockFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The previous holder died while holding the lock. The lock has been
    /// recovered and released; the guarded data may be half-updated.
    #[error("Lock {name} was abandoned by a process that died holding it")]
    Abandoned { name: String },

    #[error("Failed to release lock {name}: {source}")]
    ReleaseFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for channel item or stop: {source}")]
    WaitFailed {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to signal channel notification {name}: {source}")]
    SignalFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to raise stop notification: {source}")]
    StopFailed {
        #[source]
        source: std::io::Error,
    },
}

/// Buffer-local conditions of the ring itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    #[error("Ring buffer full")]
    Full,

    #[error("Ring buffer empty")]
    Empty,

    #[error("Ring header corrupted: count={count} tail={tail} capacity={capacity}")]
    Corrupted {
        count: u32,
        tail: u32,
        capacity: usize,
    },
}

/// Errors returned by `EventChannel::try_push`.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("Channel buffer is full, event rejected")]
    Full,

    #[error("Channel is not open")]
    NotOpen,

    #[error("{0}")]
    SyncFailure(#[from] SyncError),

    #[error("{0}")]
    Corrupted(RingError),
}

/// Errors returned by `EventChannel::pop_blocking`.
#[derive(Debug, Error)]
pub enum PopError {
    /// The local stop notification fired. This is the normal shutdown path.
    #[error("Stop requested")]
    Stopped,

    #[error("Channel is not open")]
    NotOpen,

    #[error("{0}")]
    SyncFailure(#[from] SyncError),

    #[error("Slot carries unknown event kind {kind}")]
    InvalidEvent { kind: u32 },

    #[error("{0}")]
    Corrupted(RingError),
}

/// Result type alias using HookwireError.
pub type HookwireResult<T> = Result<T, HookwireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_version_display() {
        let err = HookwireError::IncompatibleVersion {
            producer: BinaryVersion::new(0, 0, 2),
            consumer: BinaryVersion::new(0, 0, 1),
        };
        let msg = err.to_string();
        assert!(msg.contains("0.0.2"));
        assert!(msg.contains("0.0.1"));
    }

    #[test]
    fn test_error_chain() {
        let sync_err = SyncError::WaitFailed {
            source: std::io::Error::from_raw_os_error(libc::EBADF),
        };
        let pop_err: PopError = sync_err.into();
        assert!(matches!(pop_err, PopError::SyncFailure(_)));

        let err: HookwireError = pop_err.into();
        assert!(matches!(err, HookwireError::Pop(PopError::SyncFailure(_))));
    }

    #[test]
    fn test_os_error_code_is_preserved() {
        let err = SyncError::LockFailed {
            name: "hookwire-lock".to_string(),
            source: std::io::Error::from_raw_os_error(libc::EINVAL),
        };
        match &err {
            SyncError::LockFailed { source, .. } => {
                assert_eq!(source.raw_os_error(), Some(libc::EINVAL))
            }
            _ => unreachable!(),
        }
        assert!(err.to_string().contains("hookwire-lock"));
    }
}
