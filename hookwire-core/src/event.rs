// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Window events and their fixed-size wire representation.
//!
//! [`WindowEvent`] is what producers push and consumers receive.
//! [`EventSlot`] is the `#[repr(C)]` record stored in the shared ring; its
//! layout is part of the binary contract guarded by [`crate::compat`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PopError;
use crate::types::{Rect, WindowId};

/// Flag bit: the window became inactive.
const FLAG_INACTIVE: u32 = 1 << 0;
/// Flag bit: the window is minimized.
const FLAG_MINIMIZED: u32 = 1 << 1;

/// Wire kind codes. `0` is reserved for the stop sentinel and never stored.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Stop = 0,
    WindowCreated = 1,
    WindowDestroyed = 2,
    MoveOrResize = 3,
    ActivationChanged = 4,
    IconOrTitleChanged = 5,
}

impl TryFrom<u32> for EventKind {
    type Error = PopError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::WindowCreated),
            2 => Ok(Self::WindowDestroyed),
            3 => Ok(Self::MoveOrResize),
            4 => Ok(Self::ActivationChanged),
            5 => Ok(Self::IconOrTitleChanged),
            // Stop is a consumer-side outcome, a stored stop is corruption.
            _ => Err(PopError::InvalidEvent { kind: value }),
        }
    }
}

/// A window lifecycle or geometry event observed in a foreign process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WindowEvent {
    WindowCreated {
        window_id: WindowId,
    },
    WindowDestroyed {
        window_id: WindowId,
    },
    MoveOrResize {
        window_id: WindowId,
        rect: Rect,
    },
    ActivationChanged {
        window_id: WindowId,
        became_inactive: bool,
        minimized: bool,
    },
    IconOrTitleChanged {
        window_id: WindowId,
    },
}

impl WindowEvent {
    /// The window this event refers to.
    pub const fn window_id(&self) -> WindowId {
        match *self {
            Self::WindowCreated { window_id }
            | Self::WindowDestroyed { window_id }
            | Self::MoveOrResize { window_id, .. }
            | Self::ActivationChanged { window_id, .. }
            | Self::IconOrTitleChanged { window_id } => window_id,
        }
    }

    pub const fn kind(&self) -> EventKind {
        match self {
            Self::WindowCreated { .. } => EventKind::WindowCreated,
            Self::WindowDestroyed { .. } => EventKind::WindowDestroyed,
            Self::MoveOrResize { .. } => EventKind::MoveOrResize,
            Self::ActivationChanged { .. } => EventKind::ActivationChanged,
            Self::IconOrTitleChanged { .. } => EventKind::IconOrTitleChanged,
        }
    }

    /// Short name used in logs and CLI output.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::WindowCreated { .. } => "created",
            Self::WindowDestroyed { .. } => "destroyed",
            Self::MoveOrResize { .. } => "move-or-resize",
            Self::ActivationChanged { .. } => "activation-changed",
            Self::IconOrTitleChanged { .. } => "icon-or-title-changed",
        }
    }
}

impl fmt::Display for WindowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MoveOrResize { window_id, rect } => {
                write!(f, "{} {} rect={}", self.name(), window_id, rect)
            }
            Self::ActivationChanged {
                window_id,
                became_inactive,
                minimized,
            } => write!(
                f,
                "{} {} inactive={} minimized={}",
                self.name(),
                window_id,
                became_inactive,
                minimized
            ),
            _ => write!(f, "{} {}", self.name(), self.window_id()),
        }
    }
}

/// What the consumer receives from one blocking pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "delivery", rename_all = "snake_case")]
pub enum Delivery {
    Event(WindowEvent),
    /// The local stop notification fired.
    Stop,
}

/// One slot of the shared ring.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSlot {
    kind: u32,
    flags: u32,
    window_id: u64,
    rect: [i32; 4],
}

const _: () = assert!(std::mem::size_of::<EventSlot>() == 32);
const _: () = assert!(std::mem::align_of::<EventSlot>() == 8);

impl EventSlot {
    /// An unused slot.
    pub const EMPTY: Self = Self {
        kind: EventKind::Stop as u32,
        flags: 0,
        window_id: 0,
        rect: [0; 4],
    };

    /// Raw kind code stored in this slot.
    pub const fn kind_code(&self) -> u32 {
        self.kind
    }

    /// Decode the slot into an event, rejecting unknown or reserved kinds.
    pub fn decode(&self) -> Result<WindowEvent, PopError> {
        let window_id = WindowId::new(self.window_id);
        let event = match EventKind::try_from(self.kind)? {
            EventKind::WindowCreated => WindowEvent::WindowCreated { window_id },
            EventKind::WindowDestroyed => WindowEvent::WindowDestroyed { window_id },
            EventKind::MoveOrResize => WindowEvent::MoveOrResize {
                window_id,
                rect: Rect::from_array(self.rect),
            },
            EventKind::ActivationChanged => WindowEvent::ActivationChanged {
                window_id,
                became_inactive: self.flags & FLAG_INACTIVE != 0,
                minimized: self.flags & FLAG_MINIMIZED != 0,
            },
            EventKind::IconOrTitleChanged => WindowEvent::IconOrTitleChanged { window_id },
            EventKind::Stop => return Err(PopError::InvalidEvent { kind: self.kind }),
        };
        Ok(event)
    }
}

impl From<&WindowEvent> for EventSlot {
    fn from(event: &WindowEvent) -> Self {
        let mut slot = Self {
            kind: event.kind() as u32,
            window_id: event.window_id().value(),
            ..Self::EMPTY
        };
        match *event {
            WindowEvent::MoveOrResize { rect, .. } => slot.rect = rect.to_array(),
            WindowEvent::ActivationChanged {
                became_inactive,
                minimized,
                ..
            } => {
                if became_inactive {
                    slot.flags |= FLAG_INACTIVE;
                }
                if minimized {
                    slot.flags |= FLAG_MINIMIZED;
                }
            }
            _ => {}
        }
        slot
    }
}

impl Default for EventSlot {
    fn default() -> Self {
        Self::EMPTY
    }
}
