// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use ledlink::config::{self, Settings};
use ledlink::controller::{Controller, ControllerOptions, Source};
use ledlink::dmx::{Gamma, TestPattern};
use ledlink::lighting::ShowEngine;
use ledlink::playsync::CancelHandle;
use ledlink::remote::Poller;
use ledlink::serial::{link::SerialOpener, Transport};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// The frame interval of the test pattern.
const TEST_PATTERN_INTERVAL: Duration = Duration::from_millis(25);

const SYSTEMD_SERVICE: &str = r#"
[Unit]
Description=LED show controller

[Service]
Type=simple
Restart=on-failure
EnvironmentFile=-/etc/default/ledlink
ExecStart=/usr/local/bin/ledlink start --settings "$LEDLINK_SETTINGS"

[Install]
WantedBy=multi-user.target
Alias=ledlink.service
"#;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "An LED show controller for serial DMX output controllers."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start runs the show engine and keeps the configuration in sync with the server.
    Start {
        /// The path to the settings file.
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },
    /// Sends a test pattern to the output controllers instead of running shows.
    TestPattern {
        /// The path to the settings file.
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },
    /// Validate checks a show configuration file and prints a summary of its patch.
    Validate {
        /// The path to the show configuration.
        path: PathBuf,
    },
    /// Prints a systemd service definition to stdout.
    Systemd {},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { settings } => {
            let settings = Settings::load(settings.as_deref())?;
            let identity = config::load_identity(&settings.identity_path())?;
            info!(device_id = identity.device_id, "Loaded device identity.");

            let config_path = settings.config_path();
            let show_config = config::load_config(&config_path);

            let cancel_handle = CancelHandle::new();
            let (poller, config_rx, network_rx) = Poller::new(
                settings.server_url(),
                identity.device_id,
                settings.poll_interval()?,
                config_path,
                show_config,
            )?;
            let poller = tokio::spawn(poller.run(cancel_handle.clone()));

            let mut controller = start_controller(
                &settings,
                Source::Show(ShowEngine::new()),
                settings.engine_interval()?,
                config_rx,
                network_rx,
                &cancel_handle,
            )?;

            wait_for_shutdown(&cancel_handle).await;
            controller.join().await?;
            poller.await?;
        }
        Commands::TestPattern { settings } => {
            let settings = Settings::load(settings.as_deref())?;
            let cancel_handle = CancelHandle::new();
            let (_, config_rx) = watch::channel(config::ShowConfig::default());
            let (_, network_rx) = watch::channel(false);

            let mut controller = start_controller(
                &settings,
                Source::TestPattern(TestPattern::new()),
                TEST_PATTERN_INTERVAL,
                config_rx,
                network_rx,
                &cancel_handle,
            )?;

            wait_for_shutdown(&cancel_handle).await;
            controller.join().await?;
        }
        Commands::Validate { path } => {
            let show_config = config::read_config(&path)?;
            let mut engine = ShowEngine::new();
            engine.load(&show_config.rig());

            let zones = engine.zones();
            if zones.is_empty() {
                println!("No zones found in {}.", path.display());
                return Ok(());
            }

            println!("Zones (count: {}):", zones.len());
            for (index, zone) in zones.iter().enumerate() {
                println!(
                    "- zone {}: {} entries, show {}",
                    index + 1,
                    zone.entries.len(),
                    zone.show
                );
            }
        }
        Commands::Systemd {} => {
            println!("{}", SYSTEMD_SERVICE);
        }
    };

    Ok(())
}

/// Opens both serial ports and starts the controller on the given source.
fn start_controller(
    settings: &Settings,
    source: Source,
    source_interval: Duration,
    config_rx: watch::Receiver<config::ShowConfig>,
    network_rx: watch::Receiver<bool>,
    cancel_handle: &CancelHandle,
) -> Result<Controller, Box<dyn Error>> {
    let [first, second] = settings.ports();
    let openers = [
        SerialOpener::new(&first, settings.baud_rate()),
        SerialOpener::new(&second, settings.baud_rate()),
    ];
    let (transport, events, _links) =
        Transport::spawn(openers, settings.reconnect_interval()?, cancel_handle);

    let options = ControllerOptions {
        source_interval,
        dmx_interval: settings.dmx_interval()?,
        gamma: Gamma::new(settings.gamma()),
        debug_fps: settings.debug_fps(),
    };

    Ok(Controller::start(
        source,
        options,
        transport,
        events,
        config_rx,
        network_rx,
        cancel_handle.clone(),
    ))
}

/// Waits for Ctrl-C and cancels everything.
async fn wait_for_shutdown(cancel_handle: &CancelHandle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(err = e.to_string(), "Error waiting for shutdown signal");
    }
    info!("Shutting down.");
    cancel_handle.cancel();
}
