// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Typed view of an [`EventRing`] living in a shared memory region.
//!
//! The region starts with a robust process-shared mutex followed by the ring.
//! The ring is only reachable through a [`RingGuard`] holding that mutex.

use std::ops::{Deref, DerefMut};
use std::ptr;

use crate::error::{AttachError, SharedMemoryError, SyncError};
use crate::event::EventSlot;
use crate::shm::{EventRing, SharedMemoryRegion};
use crate::sync::RobustMutex;

/// Production ring capacity.
pub const RING_CAPACITY: usize = 256;

/// The ring as laid out in shared memory.
pub type SlotRing<const N: usize> = EventRing<EventSlot, N>;

/// Everything stored in the region, in order.
#[repr(C)]
struct ChannelLayout<const N: usize> {
    lock: RobustMutex,
    ring: SlotRing<N>,
}

/// A region holding the channel lock and one `SlotRing<N>`.
pub struct SharedRing<const N: usize> {
    region: SharedMemoryRegion,
}

impl<const N: usize> SharedRing<N> {
    /// Size in bytes of the shared layout.
    pub const LAYOUT_SIZE: usize = std::mem::size_of::<ChannelLayout<N>>();

    /// Create the region, initialize the lock and write an empty ring.
    pub fn create(name: &str) -> Result<Self, AttachError> {
        let region = SharedMemoryRegion::create(name, Self::LAYOUT_SIZE)?;
        Self::check_alignment(&region)?;

        let layout = region.as_ptr() as *mut ChannelLayout<N>;

        // SAFETY: the region was just created, is LAYOUT_SIZE bytes, aligned,
        // and no other process can have mapped it before `create` returned.
        unsafe {
            RobustMutex::init(ptr::addr_of_mut!((*layout).lock)).map_err(|source| {
                AttachError::Primitive {
                    object: "ring lock",
                    name: name.to_string(),
                    source,
                }
            })?;
            ptr::write(
                ptr::addr_of_mut!((*layout).ring),
                SlotRing::<N>::new(EventSlot::EMPTY),
            );
        }

        Ok(Self { region })
    }

    /// Map an existing ring created by the consumer.
    pub fn open(name: &str) -> Result<Self, SharedMemoryError> {
        let region = SharedMemoryRegion::open(name, Self::LAYOUT_SIZE)?;
        Self::check_alignment(&region)?;
        Ok(Self { region })
    }

    fn check_alignment(region: &SharedMemoryRegion) -> Result<(), SharedMemoryError> {
        let align = std::mem::align_of::<ChannelLayout<N>>();
        if (region.as_ptr() as usize) % align != 0 {
            return Err(SharedMemoryError::InvalidRequest {
                name: region.name().to_string(),
                reason: format!("mapping is not {}-byte aligned", align),
            });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        self.region.name()
    }

    fn layout(&self) -> *mut ChannelLayout<N> {
        self.region.as_ptr() as *mut ChannelLayout<N>
    }

    fn mutex(&self) -> &RobustMutex {
        // SAFETY: the mutex was initialized by the creator and is only
        // touched through pthread calls
        unsafe { &(*self.layout()).lock }
    }

    /// Take the channel lock.
    ///
    /// Returns `SyncError::Abandoned` when the previous holder died inside
    /// its critical section. The lock is free again after that error.
    pub fn lock(&self) -> Result<RingGuard<'_, N>, SyncError> {
        self.mutex().lock(self.name())?;
        Ok(RingGuard { owner: self })
    }

    /// Run `f` on the ring while holding the channel lock.
    ///
    /// The lock is released on every exit path, unwinding included.
    pub fn with_lock<T>(&self, f: impl FnOnce(&mut SlotRing<N>) -> T) -> Result<T, SyncError> {
        let mut guard = self.lock()?;
        let value = f(&mut guard);
        guard.unlock()?;
        Ok(value)
    }
}

/// Exclusive access to the shared ring. Dropping it releases the lock.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct RingGuard<'a, const N: usize> {
    owner: &'a SharedRing<N>,
}

impl<const N: usize> RingGuard<'_, N> {
    /// Release the lock and report a failing unlock.
    pub fn unlock(self) -> Result<(), SyncError> {
        let owner = self.owner;
        std::mem::forget(self);
        // SAFETY: the guard proves this thread holds the mutex
        unsafe { owner.mutex().unlock(owner.name()) }
    }
}

impl<const N: usize> Deref for RingGuard<'_, N> {
    type Target = SlotRing<N>;

    fn deref(&self) -> &SlotRing<N> {
        // SAFETY: the lock is held while the guard lives
        unsafe { &(*self.owner.layout()).ring }
    }
}

impl<const N: usize> DerefMut for RingGuard<'_, N> {
    fn deref_mut(&mut self) -> &mut SlotRing<N> {
        // SAFETY: the lock is held while the guard lives, and the ring field
        // does not overlap the mutex
        unsafe { &mut (*self.owner.layout()).ring }
    }
}

impl<const N: usize> Drop for RingGuard<'_, N> {
    fn drop(&mut self) {
        // SAFETY: the guard proves this thread holds the mutex
        if let Err(e) = unsafe { self.owner.mutex().unlock(self.owner.name()) } {
            tracing::error!(error = %e, "Failed to release channel lock");
        }
    }
}
