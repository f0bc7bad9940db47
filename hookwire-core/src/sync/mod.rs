// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Channel synchronization.
//!
//! A robust mutex stored in the ring's region serializes every access to the
//! shared ring, a named auto-reset notification tells the consumer the ring became non-empty, and a
//! process-local stop notification cancels the consumer's wait.

mod mutex;
mod notify;
mod stop;

use std::io;
use std::os::fd::AsFd;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use crate::error::SyncError;
use crate::shm::{SharedRing, SlotRing};

pub use mutex::RobustMutex;
pub use notify::NonEmptyNotifier;
pub use stop::StopHandle;

/// Result of waiting for the consumer's two notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The stop notification fired (wins when both are ready).
    Stopped,
    /// The non-empty notification fired.
    ItemAvailable,
}

/// Locked ring and non-empty notification of one channel.
pub struct ChannelSync<const N: usize> {
    ring: SharedRing<N>,
    notify: NonEmptyNotifier,
}

impl<const N: usize> ChannelSync<N> {
    pub fn new(ring: SharedRing<N>, notify: NonEmptyNotifier) -> Self {
        Self { ring, notify }
    }

    /// Run `f` on the ring while holding the cross-process lock.
    ///
    /// The lock is released on every exit path, unwinding included.
    /// `f` must stay short: a few ring operations at most.
    pub fn with_lock<T>(&self, f: impl FnOnce(&mut SlotRing<N>) -> T) -> Result<T, SyncError> {
        self.ring.with_lock(f)
    }

    /// Wake the consumer. Called right after a successful push.
    pub fn signal_non_empty(&self) -> Result<(), SyncError> {
        self.notify.signal()
    }

    /// Drop stale signals once the consumer has seen the ring empty.
    pub fn clear_non_empty(&self) -> Result<(), SyncError> {
        let drained = self.notify.clear()?;
        if drained > 0 {
            tracing::trace!(drained = drained, "Cleared non-empty notification");
        }
        Ok(())
    }

    /// Block until an item is signaled or `stop` fires.
    ///
    /// When both are ready `Stopped` is returned. The returned notification is
    /// reset, matching auto-reset semantics.
    pub fn wait_for_item_or_stop(&self, stop: &StopHandle) -> Result<WaitOutcome, SyncError> {
        loop {
            let (stop_ready, item_ready) = {
                let mut fds = [
                    PollFd::new(stop.as_fd(), PollFlags::POLLIN),
                    PollFd::new(self.notify.as_fd(), PollFlags::POLLIN),
                ];

                match poll(&mut fds, PollTimeout::NONE) {
                    Ok(_) => {}
                    Err(Errno::EINTR) => continue,
                    Err(errno) => {
                        return Err(SyncError::WaitFailed {
                            source: io::Error::from(errno),
                        })
                    }
                }

                (Self::is_ready(&fds[0])?, Self::is_ready(&fds[1])?)
            };

            if stop_ready && stop.consume()? {
                return Ok(WaitOutcome::Stopped);
            }

            if item_ready {
                self.notify.clear()?;
                return Ok(WaitOutcome::ItemAvailable);
            }
        }
    }

    fn is_ready(fd: &PollFd<'_>) -> Result<bool, SyncError> {
        let revents = fd.revents().unwrap_or(PollFlags::empty());
        if revents.intersects(PollFlags::POLLERR | PollFlags::POLLNVAL) {
            return Err(SyncError::WaitFailed {
                source: io::Error::other(format!("descriptor reported {:?}", revents)),
            });
        }
        Ok(revents.contains(PollFlags::POLLIN))
    }
}
