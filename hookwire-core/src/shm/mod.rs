// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Shared Memory module.
//!
//! POSIX shared memory region, the fixed-slot ring buffer placed in it,
//! and the typed view tying the two together.

mod region;
mod ring_buffer;
mod shared_ring;

pub use region::SharedMemoryRegion;
pub use ring_buffer::EventRing;
pub use shared_ring::{SharedRing, SlotRing, RING_CAPACITY};
