// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Producer adapter.
//!
//! Runs synchronously in the thread that receives window notifications
//! inside a foreign process. Filters to top-level windows, translates the
//! message into a [`WindowEvent`] and pushes it without ever blocking.

mod message;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::channel::EventChannel;
use crate::error::{AttachError, HookwireResult, PushError};
use crate::event::WindowEvent;
use crate::shm::RING_CAPACITY;
use crate::state::ChannelRole;
use crate::types::WindowId;
use crate::window::WindowSystem;

pub use message::{ActivationState, WindowMessage};

/// A message delivered to the hook for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub window: WindowId,
    pub message: WindowMessage,
}

impl Notification {
    pub fn new(window: WindowId, message: WindowMessage) -> Self {
        Self { window, message }
    }
}

/// What happened to one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Pushed into the ring.
    Queued,
    /// Not a top-level window, or a message without an event.
    Ignored,
    /// Ring was full.
    Dropped,
    /// Push failed for another reason.
    Failed,
}

impl Dispatch {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Ignored => "ignored",
            Self::Dropped => "dropped",
            Self::Failed => "failed",
        }
    }
}

/// Pushes translated notifications into a producer channel.
pub struct ProducerAdapter<W: WindowSystem, const N: usize = RING_CAPACITY> {
    windows: W,
    channel: EventChannel<N>,
    dropped: AtomicU64,
}

impl<W: WindowSystem, const N: usize> ProducerAdapter<W, N> {
    /// Wrap a producer-role channel. The channel may still be unopened, in
    /// which case every push fails with `NotOpen`.
    pub fn new(windows: W, channel: EventChannel<N>) -> HookwireResult<Self> {
        if channel.role() != ChannelRole::Producer {
            return Err(AttachError::WrongRole {
                expected: ChannelRole::Producer.name(),
            }
            .into());
        }

        Ok(Self {
            windows,
            channel,
            dropped: AtomicU64::new(0),
        })
    }

    /// Event for `notification`, or `None` if it is filtered out.
    pub fn translate(&self, notification: &Notification) -> Option<WindowEvent> {
        if !self.windows.style(notification.window).is_top_level() {
            return None;
        }
        notification.message.to_event(notification.window)
    }

    /// Entry point called for every hooked message.
    pub fn on_notification(&self, notification: &Notification) -> Dispatch {
        let Some(event) = self.translate(notification) else {
            return Dispatch::Ignored;
        };

        match self.channel.try_push(&event) {
            Ok(()) => Dispatch::Queued,
            Err(PushError::Full) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::trace!(event = %event, dropped = dropped, "Ring full, event dropped");
                Dispatch::Dropped
            }
            Err(e) => {
                tracing::warn!(event = %event, error = %e, "Failed to push event");
                Dispatch::Failed
            }
        }
    }

    /// Events dropped because the ring was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn channel(&self) -> &EventChannel<N> {
        &self.channel
    }

    /// Hand back the capability and the channel.
    pub fn into_inner(self) -> (W, EventChannel<N>) {
        (self.windows, self.channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;
    use crate::error::HookwireError;
    use crate::types::{ChannelName, Rect};
    use crate::window::{IconBitmap, WindowStyle};

    /// Odd ids are child windows.
    struct FakeWindows;

    impl WindowSystem for FakeWindows {
        fn style(&self, window: WindowId) -> WindowStyle {
            if window.value() % 2 == 1 {
                WindowStyle(WindowStyle::CHILD)
            } else {
                WindowStyle::TOP_LEVEL
            }
        }

        fn windows(&self) -> HookwireResult<Vec<WindowId>> {
            Ok(vec![])
        }

        fn icon(&self, _window: WindowId) -> Option<IconBitmap> {
            None
        }
    }

    fn channel_pair(tag: &str) -> (EventChannel<2>, EventChannel<2>) {
        let name = format!("hwt-prod-{}-{}", tag, std::process::id());
        let config = ChannelConfig::new(ChannelName::new(name).unwrap());
        let mut consumer = EventChannel::consumer(config.clone());
        consumer.open().unwrap();
        let mut producer = EventChannel::producer(config);
        producer.open().unwrap();
        (consumer, producer)
    }

    #[test]
    fn test_rejects_consumer_channel() {
        let channel: EventChannel<2> = EventChannel::consumer(ChannelConfig::default());
        assert!(matches!(
            ProducerAdapter::new(FakeWindows, channel),
            Err(HookwireError::Attach(AttachError::WrongRole { .. }))
        ));
    }

    #[test]
    fn test_filters_non_top_level() {
        let channel: EventChannel<2> = EventChannel::producer(ChannelConfig::default());
        let adapter = ProducerAdapter::new(FakeWindows, channel).unwrap();

        let child = Notification::new(WindowId::new(3), WindowMessage::Create);
        assert_eq!(adapter.translate(&child), None);
        assert_eq!(adapter.on_notification(&child), Dispatch::Ignored);

        let other = Notification::new(WindowId::new(4), WindowMessage::Other(0x0100));
        assert_eq!(adapter.on_notification(&other), Dispatch::Ignored);
    }

    #[test]
    fn test_unopened_channel_fails() {
        let channel: EventChannel<2> = EventChannel::producer(ChannelConfig::default());
        let adapter = ProducerAdapter::new(FakeWindows, channel).unwrap();

        let top = Notification::new(WindowId::new(4), WindowMessage::Destroy);
        assert_eq!(adapter.on_notification(&top), Dispatch::Failed);
    }

    #[test]
    fn test_queues_then_drops_when_full() {
        let (consumer, producer) = channel_pair("full");
        let adapter = ProducerAdapter::new(FakeWindows, producer).unwrap();
        let stop = consumer.stop_handle().unwrap();

        let moving = Notification::new(
            WindowId::new(2),
            WindowMessage::Moving(Rect::new(0, 0, 100, 50)),
        );
        assert_eq!(adapter.on_notification(&moving), Dispatch::Queued);
        assert_eq!(
            adapter.on_notification(&Notification::new(WindowId::new(2), WindowMessage::SetIcon)),
            Dispatch::Queued
        );
        assert_eq!(adapter.on_notification(&moving), Dispatch::Dropped);
        assert_eq!(adapter.dropped(), 1);

        assert_eq!(
            consumer.pop_blocking(&stop).unwrap(),
            WindowEvent::MoveOrResize {
                window_id: WindowId::new(2),
                rect: Rect::new(0, 0, 100, 50),
            }
        );
        assert_eq!(
            consumer.pop_blocking(&stop).unwrap(),
            WindowEvent::IconOrTitleChanged {
                window_id: WindowId::new(2)
            }
        );
    }
}
