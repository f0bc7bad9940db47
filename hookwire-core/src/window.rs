// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Window-system capability.
//!
//! The channel never talks to a desktop directly. Style queries, window
//! enumeration and icon bitmaps come from an injected [`WindowSystem`].

use crate::error::HookwireResult;
use crate::types::WindowId;

/// Style bits of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowStyle(pub u32);

impl WindowStyle {
    pub const CHILD: u32 = 0x4000_0000;
    pub const POPUP: u32 = 0x8000_0000;

    pub const TOP_LEVEL: Self = Self(0);

    /// Neither a child nor a popup.
    pub const fn is_top_level(&self) -> bool {
        self.0 & (Self::CHILD | Self::POPUP) == 0
    }
}

/// Icon bitmap in 32-bit BGRA, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconBitmap {
    pub width: u32,
    pub height: u32,
    pub bgra: Vec<u8>,
}

/// Desktop queries the core depends on.
pub trait WindowSystem {
    fn style(&self, window: WindowId) -> WindowStyle;

    /// All windows currently known to the desktop, top-level or not.
    fn windows(&self) -> HookwireResult<Vec<WindowId>>;

    fn icon(&self, window: WindowId) -> Option<IconBitmap>;
}

impl<W: WindowSystem + ?Sized> WindowSystem for &W {
    fn style(&self, window: WindowId) -> WindowStyle {
        (**self).style(window)
    }

    fn windows(&self) -> HookwireResult<Vec<WindowId>> {
        (**self).windows()
    }

    fn icon(&self, window: WindowId) -> Option<IconBitmap> {
        (**self).icon(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_predicate() {
        assert!(WindowStyle::TOP_LEVEL.is_top_level());
        assert!(WindowStyle(0x00CF_0000).is_top_level());
        assert!(!WindowStyle(WindowStyle::CHILD).is_top_level());
        assert!(!WindowStyle(WindowStyle::POPUP | 0x10).is_top_level());
    }
}
