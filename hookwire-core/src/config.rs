// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict validation.
//!
//! Every section is optional; an empty document yields the well-known
//! defaults. Any invalid field results in a HardValidationError.

use std::path::Path;

use serde::Deserialize;

use crate::error::{HardValidationError, HookwireError, HookwireResult};
use crate::types::ChannelName;

/// Upper bound for consecutive sync-failure retries in the consumer loop.
const MAX_SYNC_RETRY_LIMIT: u32 = 16;

/// Raw channel section as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawChannelConfig {
    #[serde(default = "default_channel_name")]
    name: String,
}

fn default_channel_name() -> String {
    ChannelName::default().into()
}

impl Default for RawChannelConfig {
    fn default() -> Self {
        Self {
            name: default_channel_name(),
        }
    }
}

/// Raw consumer section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConsumerConfig {
    #[serde(default = "default_sync_retry_limit")]
    sync_retry_limit: u32,
    #[serde(default = "default_instance_lock")]
    instance_lock: String,
}

fn default_sync_retry_limit() -> u32 {
    1
}

fn default_instance_lock() -> String {
    "hookwire-instance".to_string()
}

impl Default for RawConsumerConfig {
    fn default() -> Self {
        Self {
            sync_retry_limit: default_sync_retry_limit(),
            instance_lock: default_instance_lock(),
        }
    }
}

/// Raw root configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    channel: RawChannelConfig,
    #[serde(default)]
    consumer: RawConsumerConfig,
}

/// Validated channel configuration.
///
/// All named objects are derived from one base name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelConfig {
    pub name: ChannelName,
}

impl ChannelConfig {
    pub fn new(name: ChannelName) -> Self {
        Self { name }
    }

    /// Name of the shared ring region.
    pub fn ring_name(&self) -> String {
        self.name.derive("ring")
    }

    /// Name of the non-empty notification.
    pub fn notify_name(&self) -> String {
        self.name.derive("nonempty")
    }
}

/// Validated consumer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub sync_retry_limit: u32,
    pub instance_lock: ChannelName,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            sync_retry_limit: default_sync_retry_limit(),
            instance_lock: ChannelName::new(default_instance_lock())
                .unwrap_or_default(),
        }
    }
}

/// Complete validated configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub channel: ChannelConfig,
    pub consumer: ConsumerConfig,
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> HookwireResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(HookwireError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| HookwireError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> HookwireResult<Config> {
        // serde_yaml rejects an empty document for a struct, treat it as all defaults.
        if content.trim().is_empty() {
            return Self::validate(RawConfig::default());
        }

        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| HookwireError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> HookwireResult<Config> {
        let name = ChannelName::new(raw.channel.name)?;

        if raw.consumer.sync_retry_limit > MAX_SYNC_RETRY_LIMIT {
            return Err(HardValidationError::InvalidFieldValue {
                field: "sync_retry_limit",
                value: raw.consumer.sync_retry_limit.to_string(),
                reason: format!("Must not exceed {}", MAX_SYNC_RETRY_LIMIT),
            }
            .into());
        }

        let instance_lock = ChannelName::new(raw.consumer.instance_lock)?;

        if instance_lock.as_str() == name.as_str() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "instance_lock",
                value: instance_lock.to_string(),
                reason: "Must differ from the channel name".to_string(),
            }
            .into());
        }

        Ok(Config {
            channel: ChannelConfig { name },
            consumer: ConsumerConfig {
                sync_retry_limit: raw.consumer.sync_retry_limit,
                instance_lock,
            },
        })
    }
}
