// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for identifiers and validated inputs.
//!
//! All types validate their invariants at creation time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Maximum length of a channel name.
/// Keeps every derived object name well within the abstract socket address limit.
const MAX_NAME_LEN: usize = 64;

/// Opaque identifier of a top-level window.
///
/// Carries no ownership: it is only looked up through the window system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(u64);

impl WindowId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw handle value.
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for WindowId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<WindowId> for u64 {
    fn from(id: WindowId) -> Self {
        id.0
    }
}

/// Window rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Saturates instead of overflowing on extreme coordinates.
    pub const fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub const fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    pub(crate) const fn to_array(self) -> [i32; 4] {
        [self.left, self.top, self.right, self.bottom]
    }

    pub(crate) const fn from_array(raw: [i32; 4]) -> Self {
        Self::new(raw[0], raw[1], raw[2], raw[3])
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Validated base name for the channel's named OS objects.
/// Must be non-empty, ASCII alphanumeric with hyphens/underscores, max 64 chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelName(String);

impl ChannelName {
    /// Create a new ChannelName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, HardValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(HardValidationError::InvalidName {
                name,
                reason: "Name cannot be empty".to_string(),
            });
        }

        if name.len() > MAX_NAME_LEN {
            let reason = format!("Name too long: {} chars (max {})", name.len(), MAX_NAME_LEN);
            return Err(HardValidationError::InvalidName { name, reason });
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(HardValidationError::InvalidName {
                name,
                reason: "Name must contain only ASCII alphanumeric characters, hyphens, and underscores"
                    .to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the name of a sibling object, e.g. `hookwire-ring`.
    pub fn derive(&self, suffix: &str) -> String {
        format!("{}-{}", self.0, suffix)
    }
}

impl Default for ChannelName {
    fn default() -> Self {
        Self("hookwire".to_string())
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ChannelName {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChannelName> for String {
    fn from(name: ChannelName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_name_valid() {
        assert!(ChannelName::new("hookwire").is_ok());
        assert!(ChannelName::new("hook_wire-2").is_ok());
        assert!(ChannelName::new("a".repeat(64)).is_ok());
    }

    #[test]
    fn test_channel_name_invalid() {
        assert!(ChannelName::new("").is_err());
        assert!(ChannelName::new("a".repeat(65)).is_err());
        assert!(ChannelName::new("hook/wire").is_err());
        assert!(ChannelName::new("hook wire").is_err());
        assert!(ChannelName::new("hookwïre").is_err());
    }

    #[test]
    fn test_rect_extent_saturates() {
        let rect = Rect::new(0, 0, 100, 50);
        assert_eq!((rect.width(), rect.height()), (100, 50));

        let huge = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(huge.width(), i32::MAX);
        assert_eq!(huge.height(), i32::MAX);

        let inverted = Rect::new(i32::MAX, 0, i32::MIN, 0);
        assert_eq!(inverted.width(), i32::MIN);
    }

    #[test]
    fn test_channel_name_derive() {
        let name = ChannelName::new("dock").unwrap();
        assert_eq!(name.derive("ring"), "dock-ring");
        assert_eq!(ChannelName::default().derive("lock"), "hookwire-lock");
    }

    #[test]
    fn test_rect_dimensions() {
        let rect = Rect::new(10, 20, 110, 70);
        assert_eq!(rect.width(), 100);
        assert_eq!(rect.height(), 50);
        assert_eq!(Rect::from_array(rect.to_array()), rect);
    }

    #[test]
    fn test_window_id_display() {
        assert_eq!(WindowId::new(255).to_string(), "0xff");
        assert_eq!(u64::from(WindowId::from(7)), 7);
    }
}
