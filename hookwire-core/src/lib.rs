//! Hookwire Core Library
//!
//! Cross-process window event channel: a fixed-capacity ring buffer in POSIX
//! shared memory, guarded by a robust process-shared mutex, with a non-empty notification
//! and a local stop notification for the consumer. Also provides the producer
//! adapter, the consumer loop, the module compatibility guard and the desktop
//! collaborators the consumer relies on.

pub mod channel;
pub mod compat;
pub mod config;
pub mod consumer;
pub mod desktop;
pub mod error;
pub mod event;
pub mod last_error;
pub mod producer;
pub mod registry;
pub mod shm;
pub mod state;
pub mod sync;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use channel::EventChannel;
pub use compat::{
    BinaryVersion, CompatibilityGuard, ProducerModule, CHANNEL_LAYOUT_SIZE, CHANNEL_VERSION,
};
pub use config::{ChannelConfig, Config, ConfigLoader, ConsumerConfig};
pub use consumer::{spawn_forwarder, ConsumerLoop, EventHandler, EventSource};
pub use error::{
    AttachError, HardValidationError, HookwireError, HookwireResult, PopError, PushError,
    SyncError,
};
pub use event::{Delivery, EventSlot, WindowEvent};
pub use producer::{Dispatch, Notification, ProducerAdapter, WindowMessage};
pub use registry::WindowRegistry;
pub use shm::RING_CAPACITY;
pub use state::{ChannelRole, ChannelState};
pub use sync::StopHandle;
pub use types::{ChannelName, Rect, WindowId};
pub use window::{IconBitmap, WindowStyle, WindowSystem};
