// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Per-process last-error message.
//!
//! Callers that only see a failure flag can fetch the message of the most
//! recent failure here. Each record overwrites the previous one.

use std::fmt::Display;
use std::sync::Mutex;

/// Maximum stored message length in characters.
pub const MAX_LEN: usize = 256;

static LAST_ERROR: Mutex<String> = Mutex::new(String::new());

/// Store `error` as the most recent failure, truncated to [`MAX_LEN`] characters.
pub fn record(error: &dyn Display) {
    let message = error.to_string();

    let mut slot = LAST_ERROR.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    slot.clear();
    slot.push_str(truncate(&message));
}

/// Longest prefix of `message` with at most [`MAX_LEN`] characters.
fn truncate(message: &str) -> &str {
    match message.char_indices().nth(MAX_LEN) {
        Some((end, _)) => &message[..end],
        None => message,
    }
}

/// Most recent failure message, empty if none was recorded.
pub fn get() -> String {
    LAST_ERROR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

pub fn clear() {
    LAST_ERROR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clear();
}
