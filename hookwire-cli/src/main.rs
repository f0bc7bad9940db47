// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Hookwire CLI
//!
//! Command-line interface for the hookwire window event channel.

use clap::{Parser, Subcommand};

mod commands;

use commands::emit::{EmitKind, StyleArg};
use hookwire_core::Rect;

/// Hookwire - cross-process window event channel
#[derive(Parser)]
#[command(name = "hookwire")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults apply when omitted)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Own the channel and print every delivered event
    Watch {
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,

        /// Stop after this many events
        #[arg(long)]
        max_events: Option<u64>,
    },

    /// Attach as a producer and send one notification
    Emit {
        /// Event to emit
        #[arg(value_enum)]
        kind: EmitKind,

        /// Window identifier
        #[arg(short, long)]
        window: u64,

        /// Window rectangle as LEFT,TOP,RIGHT,BOTTOM
        #[arg(long, value_parser = commands::emit::parse_rect, allow_hyphen_values = true)]
        rect: Option<Rect>,

        /// Report the window as inactive (activate only)
        #[arg(long)]
        inactive: bool,

        /// Report the window as minimized (activate only)
        #[arg(long)]
        minimized: bool,

        /// Style of the window the notification comes from
        #[arg(long, value_enum, default_value_t = StyleArg::TopLevel)]
        style: StyleArg,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: String,
    },

    /// Show channel object names, sizes and version
    Info,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Watch { json, max_events } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::watch::execute(config, json, max_events).await
        }
        Commands::Emit {
            kind,
            window,
            rect,
            inactive,
            minimized,
            style,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            let request = commands::emit::EmitRequest {
                kind,
                window,
                rect,
                inactive,
                minimized,
                style,
            };
            commands::emit::execute(config, request).await
        }
        Commands::Validate { file } => commands::validate::execute(&file).await,
        Commands::Info => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::info::execute(config).await
        }
    }
}
