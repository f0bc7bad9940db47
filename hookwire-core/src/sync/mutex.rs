// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Robust process-shared mutex living in the channel's shared region.
//!
//! When a holder dies inside its critical section the kernel hands the
//! mutex to the next waiter with `EOWNERDEAD`. That waiter marks it
//! consistent, releases it and reports [`SyncError::Abandoned`], so no
//! process blocks forever on a dead producer.

use std::cell::UnsafeCell;
use std::io;
use std::mem::MaybeUninit;

use crate::error::SyncError;

/// A `pthread_mutex_t` with `PTHREAD_PROCESS_SHARED` and `PTHREAD_MUTEX_ROBUST`.
#[repr(transparent)]
pub struct RobustMutex(UnsafeCell<libc::pthread_mutex_t>);

fn check(rc: libc::c_int) -> io::Result<()> {
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(rc))
    }
}

impl RobustMutex {
    /// Initialize the mutex in place.
    ///
    /// # Safety
    /// `this` must point to writable memory for a `RobustMutex` that no
    /// thread or process is using yet.
    pub(crate) unsafe fn init(this: *mut Self) -> io::Result<()> {
        let mut attr = MaybeUninit::<libc::pthread_mutexattr_t>::uninit();
        check(libc::pthread_mutexattr_init(attr.as_mut_ptr()))?;

        let result = Self::init_with(this, attr.as_mut_ptr());

        libc::pthread_mutexattr_destroy(attr.as_mut_ptr());
        result
    }

    unsafe fn init_with(this: *mut Self, attr: *mut libc::pthread_mutexattr_t) -> io::Result<()> {
        check(libc::pthread_mutexattr_setpshared(
            attr,
            libc::PTHREAD_PROCESS_SHARED,
        ))?;
        check(libc::pthread_mutexattr_setrobust(
            attr,
            libc::PTHREAD_MUTEX_ROBUST,
        ))?;
        check(libc::pthread_mutex_init(this as *mut libc::pthread_mutex_t, attr))
    }

    /// Block until the mutex is held by the calling thread.
    ///
    /// `name` only labels errors. A dead previous holder yields
    /// `Abandoned` with the mutex released again.
    pub fn lock(&self, name: &str) -> Result<(), SyncError> {
        // SAFETY: initialized by `init` before the region was shared
        let rc = unsafe { libc::pthread_mutex_lock(self.0.get()) };
        match rc {
            0 => Ok(()),
            libc::EOWNERDEAD => Err(self.recover(name)),
            rc => Err(SyncError::LockFailed {
                name: name.to_string(),
                source: io::Error::from_raw_os_error(rc),
            }),
        }
    }

    /// Called while holding a mutex whose previous owner died.
    fn recover(&self, name: &str) -> SyncError {
        // SAFETY: we own the mutex after EOWNERDEAD
        let consistent = unsafe { libc::pthread_mutex_consistent(self.0.get()) };
        let unlocked = unsafe { libc::pthread_mutex_unlock(self.0.get()) };

        if let Err(source) = check(consistent).and(check(unlocked)) {
            return SyncError::LockFailed {
                name: name.to_string(),
                source,
            };
        }

        tracing::warn!(name = %name, "Lock holder died inside its critical section");
        SyncError::Abandoned {
            name: name.to_string(),
        }
    }

    /// Release the mutex.
    ///
    /// # Safety
    /// The calling thread must hold the mutex.
    pub(crate) unsafe fn unlock(&self, name: &str) -> Result<(), SyncError> {
        check(libc::pthread_mutex_unlock(self.0.get())).map_err(|source| {
            SyncError::ReleaseFailed {
                name: name.to_string(),
                source,
            }
        })
    }
}

// SAFETY: all access goes through the pthread mutex functions.
unsafe impl Send for RobustMutex {}
unsafe impl Sync for RobustMutex {}
