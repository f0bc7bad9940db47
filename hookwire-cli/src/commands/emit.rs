// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `hookwire emit` command - Push one notification as a producer.
//!
//! Runs the notification through the same producer adapter a hook would use,
//! including the top-level filter.

use clap::ValueEnum;
use hookwire_core::producer::ActivationState;
use hookwire_core::{
    Config, Dispatch, EventChannel, HookwireResult, IconBitmap, Notification, ProducerAdapter,
    Rect, WindowId, WindowMessage, WindowStyle, WindowSystem,
};

use super::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmitKind {
    Created,
    Destroyed,
    Move,
    Activate,
    IconTitle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    TopLevel,
    Child,
    Popup,
}

impl StyleArg {
    fn style(self) -> WindowStyle {
        match self {
            Self::TopLevel => WindowStyle::TOP_LEVEL,
            Self::Child => WindowStyle(WindowStyle::CHILD),
            Self::Popup => WindowStyle(WindowStyle::POPUP),
        }
    }
}

/// Parsed arguments of `hookwire emit`.
pub struct EmitRequest {
    pub kind: EmitKind,
    pub window: u64,
    pub rect: Option<Rect>,
    pub inactive: bool,
    pub minimized: bool,
    pub style: StyleArg,
}

impl EmitRequest {
    fn message(&self) -> WindowMessage {
        match self.kind {
            EmitKind::Created => WindowMessage::Create,
            EmitKind::Destroyed => WindowMessage::Destroy,
            EmitKind::Move => WindowMessage::Moving(self.rect.unwrap_or_default()),
            EmitKind::Activate => WindowMessage::Activate {
                state: if self.inactive {
                    ActivationState::Inactive
                } else {
                    ActivationState::Active
                },
                minimized: self.minimized,
            },
            EmitKind::IconTitle => WindowMessage::SetText,
        }
    }
}

/// Window system that reports one fixed style for every window.
struct CommandLineWindows {
    style: WindowStyle,
}

impl WindowSystem for CommandLineWindows {
    fn style(&self, _window: WindowId) -> WindowStyle {
        self.style
    }

    fn windows(&self) -> HookwireResult<Vec<WindowId>> {
        Ok(Vec::new())
    }

    fn icon(&self, _window: WindowId) -> Option<IconBitmap> {
        None
    }
}

/// Parse `LEFT,TOP,RIGHT,BOTTOM`.
pub fn parse_rect(raw: &str) -> Result<Rect, CliError> {
    let parts: Vec<i32> = raw
        .split(',')
        .map(|part| part.trim().parse::<i32>())
        .collect::<Result<_, _>>()
        .map_err(|_| CliError::InvalidRect(raw.to_string()))?;

    match parts.as_slice() {
        &[left, top, right, bottom] => Ok(Rect::new(left, top, right, bottom)),
        _ => Err(CliError::InvalidRect(raw.to_string())),
    }
}

pub async fn execute(config: Config, request: EmitRequest) -> Result<(), Box<dyn std::error::Error>> {
    let mut channel: EventChannel = EventChannel::producer(config.channel.clone());
    channel.open()?;

    let windows = CommandLineWindows {
        style: request.style.style(),
    };
    let adapter = ProducerAdapter::new(windows, channel)?;
    let notification = Notification::new(WindowId::new(request.window), request.message());

    tracing::debug!(
        channel = %config.channel.name,
        window = %notification.window,
        message = ?notification.message,
        "Emitting notification"
    );

    match adapter.on_notification(&notification) {
        Dispatch::Queued => {
            println!("✓ Event queued on {}", config.channel.name);
            Ok(())
        }
        Dispatch::Ignored => {
            println!("- Notification ignored (not a top-level window)");
            Ok(())
        }
        outcome @ (Dispatch::Dropped | Dispatch::Failed) => {
            eprintln!("✗ Event {}", outcome.name());
            std::process::exit(1);
        }
    }
}
