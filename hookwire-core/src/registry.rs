//! Thread-safe window registry using DashMap.
//!
//! Tracks the top-level windows the consumer has heard about, updated from
//! delivered events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::event::WindowEvent;
use crate::types::{Rect, WindowId};

/// What the consumer knows about one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WindowRecord {
    /// Last reported geometry, if any move or resize was seen.
    pub rect: Option<Rect>,
    pub active: bool,
    pub minimized: bool,
    /// Bumped on each icon or title change.
    pub revision: u64,
}

/// Thread-safe registry of known windows.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: DashMap<WindowId, WindowRecord>,
    /// Raw id of the last window that became active, 0 if none.
    last_active: AtomicU64,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry wrapped in an Arc for sharing across threads.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Insert windows found by enumeration. Existing records are kept.
    pub fn seed(&self, windows: impl IntoIterator<Item = WindowId>) {
        for window in windows {
            self.windows.entry(window).or_default();
        }
    }

    /// Update bookkeeping for one delivered event.
    pub fn apply(&self, event: &WindowEvent) {
        match *event {
            WindowEvent::WindowCreated { window_id } => {
                self.windows.entry(window_id).or_default();
            }
            WindowEvent::WindowDestroyed { window_id } => {
                self.windows.remove(&window_id);
                let _ = self.last_active.compare_exchange(
                    window_id.value(),
                    0,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
            }
            WindowEvent::MoveOrResize { window_id, rect } => {
                self.windows.entry(window_id).or_default().rect = Some(rect);
            }
            WindowEvent::ActivationChanged {
                window_id,
                became_inactive,
                minimized,
            } => {
                let mut record = self.windows.entry(window_id).or_default();
                record.active = !became_inactive;
                record.minimized = minimized;
                if !became_inactive {
                    self.last_active.store(window_id.value(), Ordering::Release);
                }
            }
            WindowEvent::IconOrTitleChanged { window_id } => {
                self.windows.entry(window_id).or_default().revision += 1;
            }
        }
    }

    pub fn get(&self, window: WindowId) -> Option<WindowRecord> {
        self.windows.get(&window).map(|r| r.value().clone())
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.windows.contains_key(&window)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Most recently activated window that still exists.
    pub fn last_active(&self) -> Option<WindowId> {
        match self.last_active.load(Ordering::Acquire) {
            0 => None,
            raw => Some(WindowId::new(raw)),
        }
    }

    /// Known window ids, sorted.
    pub fn window_ids(&self) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = self.windows.iter().map(|r| *r.key()).collect();
        ids.sort();
        ids
    }
}
