// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Process-local stop notification.

use std::fmt;
use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::sync::Arc;

use nix::errno::Errno;
use nix::sys::eventfd::{EfdFlags, EventFd};

use crate::error::{AttachError, SyncError};

/// Cloneable handle to the consumer's auto-reset stop notification.
///
/// Never shared with producers: each consumer process owns its own.
#[derive(Clone)]
pub struct StopHandle {
    fd: Arc<EventFd>,
}

impl StopHandle {
    pub fn new() -> Result<Self, AttachError> {
        let fd = EventFd::from_value_and_flags(0, EfdFlags::EFD_CLOEXEC | EfdFlags::EFD_NONBLOCK)
            .map_err(|errno| AttachError::Primitive {
                object: "stop notification",
                name: "eventfd".to_string(),
                source: io::Error::from(errno),
            })?;

        Ok(Self { fd: Arc::new(fd) })
    }

    /// Wake the consumer blocked in `pop_blocking` with `Stopped`.
    pub fn send_stop(&self) -> Result<(), SyncError> {
        match self.fd.write(1) {
            // EAGAIN means the counter is saturated, i.e. already set.
            Ok(_) | Err(Errno::EAGAIN) => {
                tracing::debug!("Stop requested");
                Ok(())
            }
            Err(errno) => Err(SyncError::StopFailed {
                source: io::Error::from(errno),
            }),
        }
    }

    /// Reset the notification, returning whether it was set.
    pub(crate) fn consume(&self) -> Result<bool, SyncError> {
        match self.fd.read() {
            Ok(_) => Ok(true),
            Err(Errno::EAGAIN) => Ok(false),
            Err(errno) => Err(SyncError::WaitFailed {
                source: io::Error::from(errno),
            }),
        }
    }
}

impl AsFd for StopHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopHandle").finish_non_exhaustive()
    }
}
