// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! RGB Relay command-line application

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rgb_relay::bluetooth::{BluezTransport, LoopbackTransport, SendOutcome, Transport};
use rgb_relay::cli::{Cli, Commands};
use rgb_relay::config::Config;
use rgb_relay::console::{spawn_line_reader, ConsoleCommand, HELP};
use rgb_relay::events::{EventProcessor, Notice, NoticeLevel};
use rgb_relay::relay::{RelayEvent, RelayHandle, RelayWorker};
use rgb_relay::state::AppState;
use rgb_relay::{Color, RelayError};

const DRY_RUN_ADDRESS: &str = "00:00:00:00:00:00";

fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => println!("{}", notice.text),
        NoticeLevel::Error => eprintln!("{}", notice.text),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("rgb_relay={}", level).parse()?),
        )
        .init();

    info!("Starting RGB Relay v{}...", env!("CARGO_PKG_VERSION"));

    let config = Config::load(cli.config.as_deref())?;

    let device_arg = match &cli.command {
        Commands::Send { device, .. } | Commands::Interactive { device } => device.clone(),
        Commands::Devices { .. } => None,
    };
    let device = device_arg.or_else(|| config.bluetooth.default_device.clone());

    // In a dry run any name given to `connect` counts as bonded.
    let dry_run = cli.dry_run.then(|| LoopbackTransport::new().echoing());
    let transport: Arc<dyn Transport> = match &dry_run {
        Some(loopback) => {
            if let Some(name) = &device {
                loopback.add_device(name, DRY_RUN_ADDRESS);
            }
            Arc::new(loopback.clone())
        }
        None => Arc::new(BluezTransport::new(&config.bluetooth).await?),
    };
    info!("Transport: {}", transport.name());

    let state = AppState::new();
    let (event_tx, mut event_rx) = mpsc::channel::<RelayEvent>(32);
    let (relay, worker) = RelayWorker::new(transport, event_tx).spawn(config.relay.queue_depth);

    // Handle relay events
    let state_events = state.clone();
    let notices = tokio::spawn(async move {
        let mut processor = EventProcessor::new(state_events);
        while let Some(event) = event_rx.recv().await {
            if let Some(notice) = processor.process_event(event) {
                print_notice(&notice);
            }
        }
    });

    let result = match cli.command {
        Commands::Devices { json } => list_devices(&relay, json).await,
        Commands::Send { colors, .. } => send_colors(&relay, device, colors).await,
        Commands::Interactive { .. } => interactive(&relay, &state, device, dry_run).await,
    };

    // Dropping the last handle stops the worker, which closes the link.
    drop(relay);
    worker.await?;
    notices.await?;

    info!("RGB Relay stopped");
    result
}

async fn list_devices(relay: &RelayHandle, json: bool) -> Result<()> {
    let devices = relay.list_devices().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
    } else if devices.is_empty() {
        println!("No paired devices");
    } else {
        for device in devices {
            println!("{}\t{}", device.address, device.name);
        }
    }
    Ok(())
}

async fn send_colors(relay: &RelayHandle, device: Option<String>, colors: Vec<Color>) -> Result<()> {
    let name = device.context("No device given and no default_device configured")?;
    relay.connect(&name).await?;
    for color in colors {
        relay.send_color(color).await?;
    }
    relay.disconnect().await?;
    Ok(())
}

async fn interactive(
    relay: &RelayHandle,
    state: &AppState,
    device: Option<String>,
    dry_run: Option<LoopbackTransport>,
) -> Result<()> {
    if let Some(name) = device {
        // Failures are reported through the event notices.
        if let Err(e) = relay.connect(&name).await {
            debug!("Initial connect failed: {}", e);
        }
    }

    println!("{}", HELP);
    let mut lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line.transpose()? else {
                    break;
                };

                let command = match ConsoleCommand::parse(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{}", e);
                        continue;
                    }
                };

                let outcome = match command {
                    ConsoleCommand::Empty => Ok(()),
                    ConsoleCommand::Help => {
                        println!("{}", HELP);
                        Ok(())
                    }
                    ConsoleCommand::Status => {
                        println!("{}", state.summary());
                        Ok(())
                    }
                    ConsoleCommand::Quit => break,
                    ConsoleCommand::Devices => list_devices(relay, false).await,
                    ConsoleCommand::Connect(name) => {
                        if let Some(loopback) = &dry_run {
                            loopback.add_device(&name, DRY_RUN_ADDRESS);
                        }
                        relay.connect(&name).await.map(|_| ()).map_err(Into::into)
                    }
                    ConsoleCommand::Disconnect => match relay.disconnect().await? {
                        Some(_) => Ok(()),
                        None => {
                            println!("Not connected");
                            Ok(())
                        }
                    },
                    ConsoleCommand::Color(color) => match relay.send_color(color).await {
                        Ok(SendOutcome::NotConnected) => {
                            println!("Not connected; use `connect <name>` first");
                            Ok(())
                        }
                        Ok(SendOutcome::Written) => Ok(()),
                        Err(e) => Err(e.into()),
                    },
                };

                // Relay errors already surfaced as notices; only a dead worker ends the session.
                if let Err(e) = outcome {
                    match e.downcast_ref::<RelayError>() {
                        Some(RelayError::WorkerGone) => return Err(e),
                        Some(_) => debug!("Command failed: {}", e),
                        None => eprintln!("{}", e),
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
