// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `hookwire validate` command - Validate configuration file.

use hookwire_core::ConfigLoader;

pub async fn execute(file: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file, "Validating configuration");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Channel:");
            println!("  Name:               {}", config.channel.name);
            println!("  Ring Region:        {}", config.channel.ring_name());
            println!("  Notification:       {}", config.channel.notify_name());
            println!();
            println!("Consumer:");
            println!(
                "  Sync Retry Limit:   {}",
                config.consumer.sync_retry_limit
            );
            println!("  Instance Lock:      {}", config.consumer.instance_lock);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
