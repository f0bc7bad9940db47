// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Consumer loop.
//!
//! Drains an open consumer channel until stop, applying the retry policy
//! for transient synchronization failures. An abandoned channel lock is one
//! such failure: the lock is usable again on the next attempt.

use std::thread::JoinHandle;

use tokio::sync::mpsc;

use crate::channel::EventChannel;
use crate::error::{HookwireError, HookwireResult, PopError};
use crate::event::{Delivery, WindowEvent};
use crate::last_error;
use crate::sync::StopHandle;

/// Default number of consecutive synchronization failures tolerated.
pub const DEFAULT_SYNC_RETRY_LIMIT: u32 = 1;

/// Receives events drained by [`ConsumerLoop::run`].
pub trait EventHandler {
    fn handle(&mut self, event: WindowEvent);
}

impl<F: FnMut(WindowEvent)> EventHandler for F {
    fn handle(&mut self, event: WindowEvent) {
        self(event)
    }
}

/// Where a [`ConsumerLoop`] takes its events from.
pub trait EventSource {
    /// Stop notification that interrupts [`pop_blocking`](Self::pop_blocking).
    fn stop_handle(&self) -> HookwireResult<StopHandle>;

    /// Oldest event, blocking until one arrives or `stop` fires.
    fn pop_blocking(&self, stop: &StopHandle) -> Result<WindowEvent, PopError>;
}

impl<const N: usize> EventSource for EventChannel<N> {
    fn stop_handle(&self) -> HookwireResult<StopHandle> {
        EventChannel::<N>::stop_handle(self)
    }

    fn pop_blocking(&self, stop: &StopHandle) -> Result<WindowEvent, PopError> {
        EventChannel::<N>::pop_blocking(self, stop)
    }
}

/// Blocking drain loop over a consumer channel.
pub struct ConsumerLoop<'a, S: EventSource + ?Sized = EventChannel> {
    source: &'a S,
    stop: StopHandle,
    retry_limit: u32,
}

impl<'a, S: EventSource + ?Sized> ConsumerLoop<'a, S> {
    /// Requires an open consumer-role channel.
    pub fn new(source: &'a S) -> HookwireResult<Self> {
        let stop = source.stop_handle()?;
        Ok(Self {
            source,
            stop,
            retry_limit: DEFAULT_SYNC_RETRY_LIMIT,
        })
    }

    /// Consecutive synchronization failures tolerated within one
    /// [`next_delivery`](Self::next_delivery). Zero makes the first one fatal.
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Handle that makes a blocked [`next_delivery`](Self::next_delivery) return `Stop`.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Block for the next event or the stop sentinel.
    pub fn next_delivery(&mut self) -> HookwireResult<Delivery> {
        let mut failures = 0;
        loop {
            match self.source.pop_blocking(&self.stop) {
                Ok(event) => return Ok(Delivery::Event(event)),
                Err(PopError::Stopped) => return Ok(Delivery::Stop),
                Err(PopError::SyncFailure(e)) if failures < self.retry_limit => {
                    failures += 1;
                    tracing::warn!(
                        error = %e,
                        attempt = failures,
                        limit = self.retry_limit,
                        "Synchronization failure while waiting, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Feed every event to `handler` until stop. Returns the number delivered.
    pub fn run<H: EventHandler>(&mut self, mut handler: H) -> HookwireResult<u64> {
        let mut delivered = 0u64;
        loop {
            match self.next_delivery() {
                Ok(Delivery::Event(event)) => {
                    tracing::trace!(event = %event, "Delivering event");
                    handler.handle(event);
                    delivered += 1;
                }
                Ok(Delivery::Stop) => {
                    tracing::info!(delivered = delivered, "Consumer loop stopped");
                    return Ok(delivered);
                }
                Err(e) => {
                    last_error::record(&e);
                    tracing::error!(error = %e, delivered = delivered, "Consumer loop failed");
                    return Err(e);
                }
            }
        }
    }
}

/// Drain `channel` on a dedicated thread into `sender`.
///
/// A final `Delivery::Stop` is always forwarded, also after a failure, and
/// the channel is closed before the thread exits. If the receiver goes away
/// the loop stops itself.
pub fn spawn_forwarder<const N: usize>(
    mut channel: EventChannel<N>,
    retry_limit: u32,
    sender: mpsc::UnboundedSender<Delivery>,
) -> HookwireResult<(StopHandle, JoinHandle<HookwireResult<u64>>)> {
    let stop = channel.stop_handle()?;
    let self_stop = stop.clone();

    let handle = std::thread::Builder::new()
        .name("hookwire-forwarder".to_string())
        .spawn(move || {
            let forward = |event: WindowEvent| {
                if sender.send(Delivery::Event(event)).is_err() {
                    tracing::debug!("Delivery receiver dropped, stopping forwarder");
                    if let Err(e) = self_stop.send_stop() {
                        tracing::error!(error = %e, "Failed to stop forwarder");
                    }
                }
            };

            let result = ConsumerLoop::new(&channel)
                .and_then(|consumer| consumer.with_retry_limit(retry_limit).run(forward));

            // The receiver may already be gone.
            let _ = sender.send(Delivery::Stop);

            if let Err(e) = channel.close() {
                tracing::error!(error = %e, "Failed to close channel after forwarding");
            }

            tracing::info!("Hook event forwarder ended");
            result
        })
        .map_err(|source| HookwireError::Io {
            context: "spawning forwarder thread",
            source,
        })?;

    Ok((stop, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;
    use crate::error::SyncError;
    use crate::types::{ChannelName, WindowId};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::time::Duration;

    /// Replays a fixed sequence of pop results, then reports `Stopped`.
    struct ScriptedSource {
        stop: StopHandle,
        script: RefCell<VecDeque<Result<WindowEvent, PopError>>>,
        pops: RefCell<u32>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<WindowEvent, PopError>>) -> Self {
            Self {
                stop: StopHandle::new().unwrap(),
                script: RefCell::new(script.into()),
                pops: RefCell::new(0),
            }
        }

        fn pops(&self) -> u32 {
            *self.pops.borrow()
        }
    }

    impl EventSource for ScriptedSource {
        fn stop_handle(&self) -> HookwireResult<StopHandle> {
            Ok(self.stop.clone())
        }

        fn pop_blocking(&self, _stop: &StopHandle) -> Result<WindowEvent, PopError> {
            *self.pops.borrow_mut() += 1;
            self.script
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(PopError::Stopped))
        }
    }

    fn sync_failure() -> Result<WindowEvent, PopError> {
        Err(PopError::SyncFailure(SyncError::WaitFailed {
            source: io::Error::from(io::ErrorKind::Interrupted),
        }))
    }

    fn abandoned() -> Result<WindowEvent, PopError> {
        Err(PopError::SyncFailure(SyncError::Abandoned {
            name: "scripted".to_string(),
        }))
    }

    fn open_consumer(tag: &str) -> EventChannel<8> {
        let name = format!("hwt-cons-{}-{}", tag, std::process::id());
        let mut channel = EventChannel::consumer(ChannelConfig::new(ChannelName::new(name).unwrap()));
        channel.open().unwrap();
        channel
    }

    fn destroyed(id: u64) -> WindowEvent {
        WindowEvent::WindowDestroyed {
            window_id: WindowId::new(id),
        }
    }

    #[test]
    fn test_requires_consumer_channel() {
        let channel: EventChannel<8> = EventChannel::consumer(ChannelConfig::default());
        assert!(matches!(
            ConsumerLoop::new(&channel),
            Err(HookwireError::NotOpen)
        ));
    }

    #[test]
    fn test_next_delivery_then_stop() {
        let channel = open_consumer("next");
        let mut consumer = ConsumerLoop::new(&channel).unwrap();

        channel.try_push(&destroyed(1)).unwrap();
        assert_eq!(
            consumer.next_delivery().unwrap(),
            Delivery::Event(destroyed(1))
        );

        consumer.stop_handle().send_stop().unwrap();
        assert_eq!(consumer.next_delivery().unwrap(), Delivery::Stop);
    }

    #[test]
    fn test_run_counts_deliveries() {
        let channel = open_consumer("run");
        for id in 1..=3 {
            channel.try_push(&destroyed(id)).unwrap();
        }

        let mut consumer = ConsumerLoop::new(&channel).unwrap();
        let stop = consumer.stop_handle();
        let mut seen = Vec::new();

        let waker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            stop.send_stop().unwrap();
        });

        let delivered = consumer.run(|event: WindowEvent| seen.push(event)).unwrap();
        waker.join().unwrap();

        assert_eq!(delivered, 3);
        assert_eq!(seen, vec![destroyed(1), destroyed(2), destroyed(3)]);
    }

    #[test]
    fn test_forwarder_always_sends_stop() {
        let channel = open_consumer("fwd");
        channel.try_push(&destroyed(5)).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let (stop, handle) = spawn_forwarder(channel, DEFAULT_SYNC_RETRY_LIMIT, tx).unwrap();

        assert_eq!(rx.blocking_recv(), Some(Delivery::Event(destroyed(5))));
        stop.send_stop().unwrap();
        assert_eq!(rx.blocking_recv(), Some(Delivery::Stop));
        assert_eq!(rx.blocking_recv(), None);

        assert_eq!(handle.join().unwrap().unwrap(), 1);
    }

    #[test]
    fn test_forwarder_stops_when_receiver_dropped() {
        let channel = open_consumer("drop");
        channel.try_push(&destroyed(6)).unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let (_stop, handle) = spawn_forwarder(channel, DEFAULT_SYNC_RETRY_LIMIT, tx).unwrap();

        assert_eq!(handle.join().unwrap().unwrap(), 1);
    }

    #[test]
    fn test_sync_failure_within_limit_is_retried() {
        let source = ScriptedSource::new(vec![sync_failure(), Ok(destroyed(1))]);
        let mut consumer = ConsumerLoop::new(&source).unwrap();

        assert_eq!(
            consumer.next_delivery().unwrap(),
            Delivery::Event(destroyed(1))
        );
        assert_eq!(source.pops(), 2);
    }

    #[test]
    fn test_sync_failure_beyond_limit_gives_up() {
        let source = ScriptedSource::new(vec![sync_failure(), abandoned(), Ok(destroyed(1))]);
        let mut consumer = ConsumerLoop::new(&source).unwrap();

        assert!(matches!(
            consumer.next_delivery(),
            Err(HookwireError::Pop(PopError::SyncFailure(SyncError::Abandoned { .. })))
        ));
        assert_eq!(source.pops(), 2);
    }

    #[test]
    fn test_zero_retry_limit_fails_on_first_sync_failure() {
        let source = ScriptedSource::new(vec![abandoned(), Ok(destroyed(1))]);
        let mut consumer = ConsumerLoop::new(&source).unwrap().with_retry_limit(0);

        assert!(matches!(
            consumer.next_delivery(),
            Err(HookwireError::Pop(PopError::SyncFailure(_)))
        ));
        assert_eq!(source.pops(), 1);
    }

    #[test]
    fn test_larger_retry_limit() {
        let source = ScriptedSource::new(vec![
            sync_failure(),
            abandoned(),
            sync_failure(),
            Ok(destroyed(4)),
        ]);
        let mut consumer = ConsumerLoop::new(&source).unwrap().with_retry_limit(3);

        assert_eq!(
            consumer.next_delivery().unwrap(),
            Delivery::Event(destroyed(4))
        );
        assert_eq!(consumer.next_delivery().unwrap(), Delivery::Stop);
    }

    #[test]
    fn test_failure_count_resets_per_delivery() {
        let source = ScriptedSource::new(vec![
            sync_failure(),
            Ok(destroyed(1)),
            sync_failure(),
            Ok(destroyed(2)),
        ]);
        let mut consumer = ConsumerLoop::new(&source).unwrap();

        assert_eq!(
            consumer.next_delivery().unwrap(),
            Delivery::Event(destroyed(1))
        );
        assert_eq!(
            consumer.next_delivery().unwrap(),
            Delivery::Event(destroyed(2))
        );
    }

    #[test]
    fn test_invalid_event_is_never_retried() {
        let source = ScriptedSource::new(vec![
            Err(PopError::InvalidEvent { kind: 99 }),
            Ok(destroyed(1)),
        ]);
        let mut consumer = ConsumerLoop::new(&source).unwrap().with_retry_limit(5);

        assert!(matches!(
            consumer.next_delivery(),
            Err(HookwireError::Pop(PopError::InvalidEvent { kind: 99 }))
        ));
        assert_eq!(source.pops(), 1);
    }

    #[test]
    fn test_run_returns_error_after_retries_exhausted() {
        let source = ScriptedSource::new(vec![Ok(destroyed(1)), abandoned(), abandoned()]);
        let mut seen = Vec::new();

        let result = ConsumerLoop::new(&source)
            .unwrap()
            .run(|event: WindowEvent| seen.push(event));

        assert!(matches!(result, Err(HookwireError::Pop(_))));
        assert_eq!(seen, vec![destroyed(1)]);
    }
}
