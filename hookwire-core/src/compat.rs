// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Producer module compatibility guard.
//!
//! The ring layout is a binary contract between the consumer and every
//! producer module loaded into foreign processes. A module is only attached
//! when its version equals the channel version exactly.

use std::fmt;

use serde::Serialize;

use crate::channel::EventChannel;
use crate::error::{HookwireError, HookwireResult};
use crate::last_error;
use crate::shm::{SharedRing, RING_CAPACITY};
use crate::state::ChannelState;

/// Three-part binary version of the channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BinaryVersion {
    pub major: u8,
    pub minor: u8,
    pub micro: u8,
}

impl BinaryVersion {
    pub const fn new(major: u8, minor: u8, micro: u8) -> Self {
        Self {
            major,
            minor,
            micro,
        }
    }
}

impl fmt::Display for BinaryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

/// Version compiled into this build of the channel.
///
/// Covers the whole shared region: the robust process-shared
/// `pthread_mutex_t` at offset 0, then the ring's `count`/`tail` header and
/// its 32-byte slots. Any change to that layout needs a new version.
pub const CHANNEL_VERSION: BinaryVersion = BinaryVersion::new(0, 0, 1);

/// Byte size of the production region described by [`CHANNEL_VERSION`].
pub const CHANNEL_LAYOUT_SIZE: usize = SharedRing::<RING_CAPACITY>::LAYOUT_SIZE;

/// A loadable producer module.
///
/// Implementations wrap whatever mechanism places the producer hook into the
/// desktop session.
pub trait ProducerModule {
    /// Version the module was built against.
    fn version(&self) -> BinaryVersion;

    /// Start delivering notifications to the producer adapter.
    fn install_hook(&mut self) -> HookwireResult<()>;

    /// Stop delivering notifications. Must tolerate being called once after
    /// a successful install.
    fn uninstall_hook(&mut self);
}

/// Rejects producer modules built against a different channel layout.
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityGuard {
    expected: BinaryVersion,
}

impl CompatibilityGuard {
    pub fn new() -> Self {
        Self::with_expected(CHANNEL_VERSION)
    }

    pub fn with_expected(expected: BinaryVersion) -> Self {
        Self { expected }
    }

    pub fn expected(&self) -> BinaryVersion {
        self.expected
    }

    /// Exact equality of all three components.
    pub fn check(&self, producer: BinaryVersion) -> HookwireResult<()> {
        if producer != self.expected {
            return Err(HookwireError::IncompatibleVersion {
                producer,
                consumer: self.expected,
            });
        }
        Ok(())
    }

    /// Check `module` and install its hook for an open channel.
    ///
    /// The hook is never installed before the channel can receive events.
    pub fn attach<M: ProducerModule, const N: usize>(
        &self,
        mut module: M,
        channel: &EventChannel<N>,
    ) -> HookwireResult<AttachedProducer<M>> {
        if channel.state() != ChannelState::Open {
            return Err(HookwireError::NotOpen);
        }

        let version = module.version();
        if let Err(e) = self.check(version) {
            tracing::error!(producer = %version, consumer = %self.expected, "Refusing producer module");
            last_error::record(&e);
            return Err(e);
        }

        module.install_hook().inspect_err(|e| {
            tracing::error!(error = %e, "Producer hook install failed");
            last_error::record(e);
        })?;
        tracing::info!(version = %version, "Producer hook installed");

        Ok(AttachedProducer { module })
    }
}

impl Default for CompatibilityGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// A producer module whose hook is installed. Uninstalls on drop.
#[must_use = "dropping the guard uninstalls the hook"]
pub struct AttachedProducer<M: ProducerModule> {
    module: M,
}

impl<M: ProducerModule> AttachedProducer<M> {
    pub fn module(&self) -> &M {
        &self.module
    }
}

impl<M: ProducerModule> Drop for AttachedProducer<M> {
    fn drop(&mut self) {
        self.module.uninstall_hook();
        tracing::info!("Producer hook uninstalled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelConfig;
    use crate::types::ChannelName;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Hooks {
        installed: Cell<u32>,
        uninstalled: Cell<u32>,
    }

    struct FakeModule {
        version: BinaryVersion,
        hooks: Rc<Hooks>,
        fail_install: bool,
    }

    impl ProducerModule for FakeModule {
        fn version(&self) -> BinaryVersion {
            self.version
        }

        fn install_hook(&mut self) -> HookwireResult<()> {
            if self.fail_install {
                return Err(HookwireError::HookInstall {
                    reason: "no session".to_string(),
                });
            }
            self.hooks.installed.set(self.hooks.installed.get() + 1);
            Ok(())
        }

        fn uninstall_hook(&mut self) {
            self.hooks.uninstalled.set(self.hooks.uninstalled.get() + 1);
        }
    }

    fn module(version: BinaryVersion, hooks: &Rc<Hooks>) -> FakeModule {
        FakeModule {
            version,
            hooks: Rc::clone(hooks),
            fail_install: false,
        }
    }

    fn open_consumer(tag: &str) -> EventChannel<4> {
        let name = format!("hwt-compat-{}-{}", tag, std::process::id());
        let mut channel = EventChannel::consumer(ChannelConfig::new(ChannelName::new(name).unwrap()));
        channel.open().unwrap();
        channel
    }

    #[test]
    fn test_version_display() {
        assert_eq!(CHANNEL_VERSION.to_string(), "0.0.1");
    }

    #[test]
    fn test_layout_size_pinned_to_version() {
        let mutex = std::mem::size_of::<libc::pthread_mutex_t>();
        assert_eq!(CHANNEL_LAYOUT_SIZE, mutex + 8 + 256 * 32);
    }

    #[test]
    fn test_exact_match_accepted() {
        let guard = CompatibilityGuard::new();
        assert!(guard.check(BinaryVersion::new(0, 0, 1)).is_ok());
    }

    #[test]
    fn test_any_difference_rejected() {
        let guard = CompatibilityGuard::new();
        for version in [
            BinaryVersion::new(0, 0, 2),
            BinaryVersion::new(0, 1, 1),
            BinaryVersion::new(1, 0, 1),
            BinaryVersion::new(0, 0, 0),
        ] {
            assert!(matches!(
                guard.check(version),
                Err(HookwireError::IncompatibleVersion { .. })
            ));
        }
    }

    #[test]
    fn test_rejection_message() {
        let err = CompatibilityGuard::new()
            .check(BinaryVersion::new(0, 0, 2))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "the version of the producer module (0.0.2) is not compatible with the channel (0.0.1)"
        );
    }

    #[test]
    fn test_attach_requires_open_channel() {
        let hooks = Rc::new(Hooks::default());
        let channel: EventChannel<4> = EventChannel::consumer(ChannelConfig::default());

        let result = CompatibilityGuard::new().attach(module(CHANNEL_VERSION, &hooks), &channel);
        assert!(matches!(result, Err(HookwireError::NotOpen)));
        assert_eq!(hooks.installed.get(), 0);
    }

    #[test]
    fn test_attach_installs_and_uninstalls() {
        let hooks = Rc::new(Hooks::default());
        let channel = open_consumer("attach");

        let attached = CompatibilityGuard::new()
            .attach(module(CHANNEL_VERSION, &hooks), &channel)
            .unwrap();
        assert_eq!(attached.module().version(), CHANNEL_VERSION);
        assert_eq!(hooks.installed.get(), 1);
        assert_eq!(hooks.uninstalled.get(), 0);

        drop(attached);
        assert_eq!(hooks.uninstalled.get(), 1);
    }

    #[test]
    fn test_attach_rejects_mismatch_without_install() {
        let hooks = Rc::new(Hooks::default());
        let channel = open_consumer("mismatch");

        let result = CompatibilityGuard::new()
            .attach(module(BinaryVersion::new(0, 0, 2), &hooks), &channel);
        assert!(matches!(
            result,
            Err(HookwireError::IncompatibleVersion { .. })
        ));
        assert_eq!(hooks.installed.get(), 0);
    }

    #[test]
    fn test_install_failure_propagates() {
        let hooks = Rc::new(Hooks::default());
        let channel = open_consumer("fail");
        let mut failing = module(CHANNEL_VERSION, &hooks);
        failing.fail_install = true;

        let result = CompatibilityGuard::new().attach(failing, &channel);
        assert!(matches!(result, Err(HookwireError::HookInstall { .. })));
        assert_eq!(hooks.uninstalled.get(), 0);
    }
}
