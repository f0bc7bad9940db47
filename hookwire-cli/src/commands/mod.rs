// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod emit;
pub mod info;
pub mod validate;
pub mod watch;

use hookwire_core::{Config, ConfigLoader, HookwireResult};
use thiserror::Error;

/// Failures that only exist at the command line.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid rectangle {0:?}: expected LEFT,TOP,RIGHT,BOTTOM")]
    InvalidRect(String),

    #[error("Event forwarder thread panicked")]
    ForwarderPanicked,
}

/// Load the configuration file if one was given, defaults otherwise.
pub fn load_config(path: Option<&str>) -> HookwireResult<Config> {
    match path {
        Some(path) => ConfigLoader::load_file(path),
        None => Ok(Config::default()),
    }
}
