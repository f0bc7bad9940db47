// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Desktop collaborators used by the consumer.
//!
//! Top-level window enumeration and icon export go through the injected
//! [`WindowSystem`]. The single-instance lock is an abstract-namespace
//! socket name held until the process exits.

use std::io::{self, Cursor};
use std::os::fd::{AsRawFd, OwnedFd};
use std::sync::Mutex;

use image::{DynamicImage, ImageFormat, RgbaImage};
use nix::errno::Errno;
use nix::sys::socket::{bind, socket, AddressFamily, SockFlag, SockType, UnixAddr};

use crate::error::HookwireResult;
use crate::last_error;
use crate::types::{ChannelName, WindowId};
use crate::window::WindowSystem;

/// Call `callback` for every top-level window. Returns how many were visited.
pub fn enumerate_top_level_windows<W, F>(windows: &W, mut callback: F) -> HookwireResult<usize>
where
    W: WindowSystem + ?Sized,
    F: FnMut(WindowId),
{
    let all = windows.windows().inspect_err(|e| {
        tracing::error!(error = %e, "Window enumeration failed");
        last_error::record(e);
    })?;

    let mut visited = 0;
    for window in all {
        if windows.style(window).is_top_level() {
            callback(window);
            visited += 1;
        }
    }
    Ok(visited)
}

/// PNG-encoded icon of `window`, or `None` if it has no usable icon.
pub fn extract_window_icon<W: WindowSystem + ?Sized>(windows: &W, window: WindowId) -> Option<Vec<u8>> {
    let icon = windows.icon(window)?;

    let expected = (icon.width as usize)
        .checked_mul(icon.height as usize)
        .and_then(|pixels| pixels.checked_mul(4));
    if expected != Some(icon.bgra.len()) || icon.width == 0 || icon.height == 0 {
        tracing::warn!(
            window = %window,
            width = icon.width,
            height = icon.height,
            bytes = icon.bgra.len(),
            "Icon bitmap has inconsistent dimensions"
        );
        return None;
    }

    let mut rgba = icon.bgra;
    for pixel in rgba.chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }

    let image = RgbaImage::from_raw(icon.width, icon.height, rgba)?;
    let mut cursor = Cursor::new(Vec::new());
    if let Err(e) = DynamicImage::ImageRgba8(image).write_to(&mut cursor, ImageFormat::Png) {
        tracing::warn!(window = %window, error = %e, "Failed to encode icon");
        return None;
    }

    Some(cursor.into_inner())
}

/// Outcome of [`acquire_single_instance_lock`].
#[derive(Debug)]
pub enum InstanceLock {
    Acquired,
    AlreadyHeld,
    Failed(io::Error),
}

/// Sockets backing acquired instance locks. Never closed.
static HELD_LOCKS: Mutex<Vec<OwnedFd>> = Mutex::new(Vec::new());

/// Claim `name` for this process until it exits.
pub fn acquire_single_instance_lock(name: &ChannelName) -> InstanceLock {
    let addr = match UnixAddr::new_abstract(name.as_str().as_bytes()) {
        Ok(addr) => addr,
        Err(errno) => return InstanceLock::Failed(io::Error::from(errno)),
    };

    let fd = match socket(
        AddressFamily::Unix,
        SockType::Datagram,
        SockFlag::SOCK_CLOEXEC,
        None,
    ) {
        Ok(fd) => fd,
        Err(errno) => return InstanceLock::Failed(io::Error::from(errno)),
    };

    match bind(fd.as_raw_fd(), &addr) {
        Ok(()) => {}
        Err(Errno::EADDRINUSE) => {
            tracing::info!(name = %name, "Another instance holds the lock");
            return InstanceLock::AlreadyHeld;
        }
        Err(errno) => return InstanceLock::Failed(io::Error::from(errno)),
    }

    HELD_LOCKS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .push(fd);

    tracing::debug!(name = %name, "Single-instance lock acquired");
    InstanceLock::Acquired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{IconBitmap, WindowStyle};

    struct FakeDesktop {
        windows: Vec<(WindowId, WindowStyle)>,
        icon: Option<IconBitmap>,
    }

    impl WindowSystem for FakeDesktop {
        fn style(&self, window: WindowId) -> WindowStyle {
            self.windows
                .iter()
                .find(|(id, _)| *id == window)
                .map(|(_, style)| *style)
                .unwrap_or_default()
        }

        fn windows(&self) -> HookwireResult<Vec<WindowId>> {
            Ok(self.windows.iter().map(|(id, _)| *id).collect())
        }

        fn icon(&self, _window: WindowId) -> Option<IconBitmap> {
            self.icon.clone()
        }
    }

    #[test]
    fn test_enumerate_top_level_only() {
        let desktop = FakeDesktop {
            windows: vec![
                (WindowId::new(1), WindowStyle::TOP_LEVEL),
                (WindowId::new(2), WindowStyle(WindowStyle::CHILD)),
                (WindowId::new(3), WindowStyle(WindowStyle::POPUP)),
                (WindowId::new(4), WindowStyle::TOP_LEVEL),
            ],
            icon: None,
        };

        let mut seen = Vec::new();
        let visited = enumerate_top_level_windows(&desktop, |id| seen.push(id)).unwrap();
        assert_eq!(visited, 2);
        assert_eq!(seen, vec![WindowId::new(1), WindowId::new(4)]);
    }

    #[test]
    fn test_icon_png_roundtrip_swaps_channels() {
        // One blue pixel and one red pixel, in BGRA.
        let desktop = FakeDesktop {
            windows: vec![],
            icon: Some(IconBitmap {
                width: 2,
                height: 1,
                bgra: vec![255, 0, 0, 255, 0, 0, 255, 128],
            }),
        };

        let png = extract_window_icon(&desktop, WindowId::new(1)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded.dimensions(), (2, 1));
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(decoded.get_pixel(1, 0).0, [255, 0, 0, 128]);
    }

    #[test]
    fn test_icon_missing_or_malformed() {
        let mut desktop = FakeDesktop {
            windows: vec![],
            icon: None,
        };
        assert!(extract_window_icon(&desktop, WindowId::new(1)).is_none());

        desktop.icon = Some(IconBitmap {
            width: 4,
            height: 4,
            bgra: vec![0; 10],
        });
        assert!(extract_window_icon(&desktop, WindowId::new(1)).is_none());
    }

    #[test]
    fn test_single_instance_lock() {
        let name = ChannelName::new(format!("hwt-inst-{}", std::process::id())).unwrap();
        assert!(matches!(
            acquire_single_instance_lock(&name),
            InstanceLock::Acquired
        ));
        assert!(matches!(
            acquire_single_instance_lock(&name),
            InstanceLock::AlreadyHeld
        ));
    }
}
