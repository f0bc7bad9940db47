// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `hookwire info` command - Show channel layout and object names.

use hookwire_core::shm::SharedRing;
use hookwire_core::{Config, EventSlot, CHANNEL_VERSION, RING_CAPACITY};

pub async fn execute(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let channel = &config.channel;

    println!("Channel {}", channel.name);
    println!("  Ring Region:        {}", channel.ring_name());
    println!("  Notification:       {}", channel.notify_name());
    println!("  Instance Lock:      {}", config.consumer.instance_lock);
    println!();
    println!("Layout:");
    println!("  Capacity:           {} slots", RING_CAPACITY);
    println!(
        "  Slot Size:          {} bytes",
        std::mem::size_of::<EventSlot>()
    );
    println!(
        "  Region Size:        {} bytes",
        SharedRing::<RING_CAPACITY>::LAYOUT_SIZE
    );
    println!("  Channel Version:    {}", CHANNEL_VERSION);

    Ok(())
}
