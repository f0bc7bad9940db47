// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `hookwire watch` command - Run the consumer side of the channel.
//!
//! Takes the single-instance lock, creates the channel, forwards events from
//! a dedicated thread and prints them until Ctrl-C or `--max-events`.

use hookwire_core::desktop::{acquire_single_instance_lock, InstanceLock};
use hookwire_core::{spawn_forwarder, Config, Delivery, EventChannel, WindowRegistry};
use serde::Serialize;
use tokio::sync::mpsc;

use super::CliError;

/// Summary printed once the consumer stops.
#[derive(Debug, Serialize)]
struct WatchSummary {
    channel: String,
    events: u64,
    known_windows: usize,
    last_active: Option<u64>,
}

pub async fn execute(
    config: Config,
    json: bool,
    max_events: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    match acquire_single_instance_lock(&config.consumer.instance_lock) {
        InstanceLock::Acquired => {}
        InstanceLock::AlreadyHeld => {
            eprintln!(
                "✗ Another hookwire consumer holds {}",
                config.consumer.instance_lock
            );
            std::process::exit(1);
        }
        InstanceLock::Failed(e) => return Err(e.into()),
    }

    let mut channel: EventChannel = EventChannel::consumer(config.channel.clone());
    channel.open()?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (stop, forwarder) = spawn_forwarder(channel, config.consumer.sync_retry_limit, tx)?;

    tracing::info!(channel = %config.channel.name, "Watching for window events (Ctrl-C to stop)");

    let registry = WindowRegistry::new();
    let mut printed = 0u64;

    loop {
        tokio::select! {
            delivery = rx.recv() => match delivery {
                Some(Delivery::Event(event)) => {
                    registry.apply(&event);

                    if max_events.is_some_and(|max| printed >= max) {
                        continue;
                    }
                    if json {
                        println!("{}", serde_json::to_string(&event)?);
                    } else {
                        println!("{}", event);
                    }
                    printed += 1;

                    if max_events == Some(printed) {
                        stop.send_stop()?;
                    }
                }
                Some(Delivery::Stop) | None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                stop.send_stop()?;
            }
        }
    }

    let delivered = tokio::task::spawn_blocking(move || forwarder.join())
        .await?
        .map_err(|_| CliError::ForwarderPanicked)??;

    let summary = WatchSummary {
        channel: config.channel.name.to_string(),
        events: delivered,
        known_windows: registry.len(),
        last_active: registry.last_active().map(|id| id.value()),
    };

    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!();
        println!("Channel {} stopped", summary.channel);
        println!("  Events Delivered:   {}", summary.events);
        println!("  Known Windows:      {}", summary.known_windows);
        if let Some(id) = registry.last_active() {
            println!("  Last Active:        {}", id);
        }
    }

    Ok(())
}
