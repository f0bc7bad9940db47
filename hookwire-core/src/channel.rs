// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Event channel - the producer/consumer-facing API.
//!
//! Composes the shared ring and its synchronization handles into
//! `open`, `close`, `try_push` and `pop_blocking`. Every access to the ring
//! happens inside `ChannelSync::with_lock`.
//!
//! Failures other than the expected `Full` and `Stopped` outcomes are also
//! stored in [`crate::last_error`].
//!
//! Precondition: a channel has exactly one consumer thread. The consumer role
//! binds the notification name, so a second consumer process fails to open.

use crate::config::ChannelConfig;
use crate::error::{AttachError, HookwireError, HookwireResult, PopError, PushError, RingError};
use crate::event::{EventSlot, WindowEvent};
use crate::last_error;
use crate::shm::{SharedMemoryRegion, SharedRing, RING_CAPACITY};
use crate::state::{ChannelLifecycle, ChannelRole, ChannelState};
use crate::sync::{ChannelSync, NonEmptyNotifier, StopHandle, WaitOutcome};

/// Handles held while the channel is open.
struct OpenChannel<const N: usize> {
    sync: ChannelSync<N>,
    /// Present only in the consumer role.
    stop: Option<StopHandle>,
}

/// Cross-process event channel with `N` slots.
pub struct EventChannel<const N: usize = RING_CAPACITY> {
    config: ChannelConfig,
    role: ChannelRole,
    lifecycle: ChannelLifecycle,
    inner: Option<OpenChannel<N>>,
}

impl<const N: usize> EventChannel<N> {
    /// An unopened channel that will own the shared objects.
    pub fn consumer(config: ChannelConfig) -> Self {
        Self::new(config, ChannelRole::Consumer)
    }

    /// An unopened channel that will attach to a consumer's shared objects.
    pub fn producer(config: ChannelConfig) -> Self {
        Self::new(config, ChannelRole::Producer)
    }

    fn new(config: ChannelConfig, role: ChannelRole) -> Self {
        Self {
            config,
            role,
            lifecycle: ChannelLifecycle::new(),
            inner: None,
        }
    }

    /// Create (consumer) or attach to (producer) the shared region and primitives.
    pub fn open(&mut self) -> HookwireResult<()> {
        self.open_objects().inspect_err(|e| last_error::record(e))
    }

    fn open_objects(&mut self) -> HookwireResult<()> {
        if !self.lifecycle.can_transition_to(ChannelState::Open) {
            return self.lifecycle.transition_to(ChannelState::Open);
        }

        let inner = match self.role {
            ChannelRole::Consumer => self.create_objects()?,
            ChannelRole::Producer => self.attach_objects()?,
        };

        self.inner = Some(inner);
        self.lifecycle.transition_to(ChannelState::Open)?;

        tracing::info!(
            channel = %self.config.name,
            role = %self.role,
            capacity = N,
            "Channel opened"
        );

        Ok(())
    }

    fn create_objects(&self) -> Result<OpenChannel<N>, AttachError> {
        let ring_name = self.config.ring_name();

        // Binding first proves no other consumer is alive, so leftovers of a
        // crashed one can be removed safely.
        let notify = NonEmptyNotifier::bind(&self.config.notify_name())?;

        if SharedMemoryRegion::unlink(&ring_name)? {
            tracing::warn!(name = %ring_name, "Removed ring left by a previous consumer");
        }

        let ring = SharedRing::<N>::create(&ring_name)?;
        let stop = StopHandle::new()?;

        Ok(OpenChannel {
            sync: ChannelSync::new(ring, notify),
            stop: Some(stop),
        })
    }

    fn attach_objects(&self) -> Result<OpenChannel<N>, AttachError> {
        let ring = SharedRing::<N>::open(&self.config.ring_name())?;
        let notify = NonEmptyNotifier::connect(&self.config.notify_name())?;

        Ok(OpenChannel {
            sync: ChannelSync::new(ring, notify),
            stop: None,
        })
    }

    /// Release every handle. The consumer also removes the named objects.
    ///
    /// A closed channel cannot be opened again.
    pub fn close(&mut self) -> HookwireResult<()> {
        self.lifecycle.transition_to(ChannelState::Closed)?;
        self.inner = None;

        tracing::info!(channel = %self.config.name, role = %self.role, "Channel closed");

        Ok(())
    }

    pub fn state(&self) -> ChannelState {
        self.lifecycle.state()
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    pub fn role(&self) -> ChannelRole {
        self.role
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Handle to this consumer's stop notification.
    pub fn stop_handle(&self) -> HookwireResult<StopHandle> {
        let open = self.inner.as_ref().ok_or(HookwireError::NotOpen)?;
        open.stop.clone().ok_or_else(|| {
            AttachError::WrongRole {
                expected: ChannelRole::Consumer.name(),
            }
            .into()
        })
    }

    /// Number of queued events.
    pub fn len(&self) -> HookwireResult<usize> {
        let open = self.inner.as_ref().ok_or(HookwireError::NotOpen)?;
        let len = open.sync.with_lock(|ring| ring.len())?;
        Ok(len)
    }

    pub fn is_empty(&self) -> HookwireResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Queue an event without waiting for space.
    ///
    /// A full ring rejects the event with `PushError::Full`; nothing is overwritten.
    ///
    /// Once the slot is stored the push is committed: a failing wake-up
    /// signal is logged and `Ok` is still returned, because the consumer
    /// drains the ring on its next pop regardless.
    pub fn try_push(&self, event: &WindowEvent) -> Result<(), PushError> {
        self.push_slot(EventSlot::from(event)).inspect_err(|e| {
            if !matches!(e, PushError::Full) {
                last_error::record(e);
            }
        })
    }

    fn push_slot(&self, slot: EventSlot) -> Result<(), PushError> {
        let open = self.inner.as_ref().ok_or(PushError::NotOpen)?;

        open.sync.with_lock(|ring| match ring.push(slot) {
            Ok(()) => {
                if let Err(e) = open.sync.signal_non_empty() {
                    tracing::warn!(
                        channel = %self.config.name,
                        error = %e,
                        "Event queued but consumer wake-up failed"
                    );
                }
                Ok(())
            }
            Err(RingError::Full) => Err(PushError::Full),
            Err(e) => Err(PushError::Corrupted(e)),
        })?
    }

    /// Take the oldest event, blocking until one arrives or `stop` fires.
    pub fn pop_blocking(&self, stop: &StopHandle) -> Result<WindowEvent, PopError> {
        self.wait_and_pop(stop).inspect_err(|e| {
            if !matches!(e, PopError::Stopped) {
                last_error::record(e);
            }
        })
    }

    fn wait_and_pop(&self, stop: &StopHandle) -> Result<WindowEvent, PopError> {
        let open = self.inner.as_ref().ok_or(PopError::NotOpen)?;

        // Events that arrived between calls are returned without waiting.
        if let Some(event) = Self::pop_locked(open)? {
            return Ok(event);
        }

        loop {
            match open.sync.wait_for_item_or_stop(stop)? {
                WaitOutcome::Stopped => return Err(PopError::Stopped),
                WaitOutcome::ItemAvailable => {
                    if let Some(event) = Self::pop_locked(open)? {
                        return Ok(event);
                    }
                    tracing::trace!("Woke on a stale notification, waiting again");
                }
            }
        }
    }

    /// Pop under the lock, clearing the notification once the ring is empty.
    fn pop_locked(open: &OpenChannel<N>) -> Result<Option<WindowEvent>, PopError> {
        let slot = open.sync.with_lock(|ring| -> Result<Option<EventSlot>, PopError> {
            match ring.pop() {
                Ok(slot) => {
                    if ring.is_empty() {
                        open.sync.clear_non_empty()?;
                    }
                    Ok(Some(slot))
                }
                Err(RingError::Empty) => {
                    open.sync.clear_non_empty()?;
                    Ok(None)
                }
                Err(e) => Err(PopError::Corrupted(e)),
            }
        })??;

        slot.map(|slot| slot.decode()).transpose()
    }
}

impl<const N: usize> Drop for EventChannel<N> {
    fn drop(&mut self) {
        if self.inner.is_some() {
            tracing::debug!(
                channel = %self.config.name,
                role = %self.role,
                "Dropping open channel"
            );
        }
    }
}
