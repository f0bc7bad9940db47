// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Raw window-message decoding for the producer hook.

use crate::event::WindowEvent;
use crate::types::{Rect, WindowId};

/// Activation state carried in the low word of an activate message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Inactive,
    Active,
    ClickActive,
}

impl ActivationState {
    fn from_low_word(raw: u16) -> Self {
        match raw {
            0 => Self::Inactive,
            2 => Self::ClickActive,
            _ => Self::Active,
        }
    }
}

/// A message observed by the producer hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMessage {
    Create,
    Destroy,
    Moving(Rect),
    Sizing(Rect),
    Activate {
        state: ActivationState,
        minimized: bool,
    },
    SetIcon,
    SetText,
    Other(u32),
}

impl WindowMessage {
    pub const CREATE: u32 = 0x0001;
    pub const DESTROY: u32 = 0x0002;
    pub const ACTIVATE: u32 = 0x0006;
    pub const SET_TEXT: u32 = 0x000C;
    pub const SET_ICON: u32 = 0x0080;
    pub const SIZING: u32 = 0x0214;
    pub const MOVING: u32 = 0x0216;

    /// Decode a raw message code.
    ///
    /// `rect` is only read for moving and sizing messages.
    pub fn from_raw(code: u32, wparam: u64, rect: Rect) -> Self {
        match code {
            Self::CREATE => Self::Create,
            Self::DESTROY => Self::Destroy,
            Self::MOVING => Self::Moving(rect),
            Self::SIZING => Self::Sizing(rect),
            Self::ACTIVATE => Self::Activate {
                state: ActivationState::from_low_word((wparam & 0xFFFF) as u16),
                minimized: (wparam >> 16) & 0xFFFF != 0,
            },
            Self::SET_ICON => Self::SetIcon,
            Self::SET_TEXT => Self::SetText,
            other => Self::Other(other),
        }
    }

    /// Event this message produces for `window`, if any.
    pub fn to_event(&self, window: WindowId) -> Option<WindowEvent> {
        let event = match *self {
            Self::Create => WindowEvent::WindowCreated { window_id: window },
            Self::Destroy => WindowEvent::WindowDestroyed { window_id: window },
            Self::Moving(rect) | Self::Sizing(rect) => WindowEvent::MoveOrResize {
                window_id: window,
                rect,
            },
            Self::Activate { state, minimized } => WindowEvent::ActivationChanged {
                window_id: window,
                became_inactive: state == ActivationState::Inactive,
                minimized,
            },
            Self::SetIcon | Self::SetText => WindowEvent::IconOrTitleChanged { window_id: window },
            Self::Other(_) => return None,
        };
        Some(event)
    }
}
