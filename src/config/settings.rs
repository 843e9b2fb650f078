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
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, Environment, File};
use duration_string::DurationString;
use serde::Deserialize;

use super::error::ConfigError;
use crate::dmx::gamma::DEFAULT_GAMMA;

pub const DEFAULT_PORTS: [&str; 2] = ["/dev/ttyACM0", "/dev/ttyACM1"];
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_DMX_INTERVAL: Duration = Duration::from_millis(35);
pub const DEFAULT_ENGINE_INTERVAL: Duration = Duration::from_millis(50);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_SERVER_URL: &str = "https://attitude.lighting/api/devices/";
pub const DEFAULT_IDENTITY_PATH: &str = "../id.json";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// The prefix of environment variables that override settings.
const ENV_PREFIX: &str = "LEDLINK";

/// Process level settings of the controller. Every field is optional.
#[derive(Deserialize, Clone, Default)]
pub struct Settings {
    /// The serial device of each output controller.
    ports: Option<Vec<String>>,

    baud_rate: Option<u32>,

    /// How long to wait between attempts to reopen a closed port.
    reconnect_interval: Option<String>,

    /// How often the frame buffer is sent to the output controllers.
    dmx_interval: Option<String>,

    /// How often the show engine runs.
    engine_interval: Option<String>,

    gamma: Option<f64>,

    /// Logs frames per second and queue depths once per second.
    debug_fps: Option<bool>,

    /// The base URL of the configuration server's device API.
    server_url: Option<String>,

    /// How often the configuration server is polled for changes.
    poll_interval: Option<String>,

    /// The file holding the device ID and serial number.
    identity_path: Option<String>,

    /// Where the show configuration is persisted.
    config_path: Option<String>,
}

impl Settings {
    /// Loads settings from an optional file, overridden by `LEDLINK_*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        Ok(builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("ports"),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// Gets the serial device paths. Missing entries use the defaults.
    pub fn ports(&self) -> [String; 2] {
        let configured = self.ports.as_deref().unwrap_or_default();
        [0, 1].map(|i| {
            configured
                .get(i)
                .cloned()
                .unwrap_or_else(|| DEFAULT_PORTS[i].to_string())
        })
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate.unwrap_or(DEFAULT_BAUD_RATE)
    }

    pub fn reconnect_interval(&self) -> Result<Duration, ConfigError> {
        duration(&self.reconnect_interval, DEFAULT_RECONNECT_INTERVAL)
    }

    pub fn dmx_interval(&self) -> Result<Duration, ConfigError> {
        duration(&self.dmx_interval, DEFAULT_DMX_INTERVAL)
    }

    pub fn engine_interval(&self) -> Result<Duration, ConfigError> {
        duration(&self.engine_interval, DEFAULT_ENGINE_INTERVAL)
    }

    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        duration(&self.poll_interval, DEFAULT_POLL_INTERVAL)
    }

    pub fn gamma(&self) -> f64 {
        self.gamma.unwrap_or(DEFAULT_GAMMA)
    }

    pub fn debug_fps(&self) -> bool {
        self.debug_fps.unwrap_or(true)
    }

    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn identity_path(&self) -> PathBuf {
        PathBuf::from(
            self.identity_path
                .as_deref()
                .unwrap_or(DEFAULT_IDENTITY_PATH),
        )
    }

    pub fn config_path(&self) -> PathBuf {
        PathBuf::from(self.config_path.as_deref().unwrap_or(DEFAULT_CONFIG_PATH))
    }
}

/// Parses an optional duration string. Zero durations are rejected since they
/// would spin the timers.
fn duration(value: &Option<String>, default: Duration) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    let duration: Duration = DurationString::from_string(value.clone())?.into();
    if duration.is_zero() {
        return Ok(default);
    }
    Ok(duration)
}
