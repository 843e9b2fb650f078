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
use std::{fs, io, path::Path};

use tracing::{info, warn};

use super::{error::ConfigError, show::ShowConfig};

/// Loads the locally saved show configuration. A missing or malformed file
/// yields an empty configuration.
pub fn load_config(path: &Path) -> ShowConfig {
    match read_config(path) {
        Ok(config) => {
            info!(path = path.display().to_string(), "Loaded locally saved config.");
            config
        }
        Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            warn!(
                path = path.display().to_string(),
                "No locally saved config, starting empty."
            );
            ShowConfig::default()
        }
        Err(e) => {
            warn!(
                path = path.display().to_string(),
                err = e.to_string(),
                "Error loading locally saved config, starting empty."
            );
            ShowConfig::default()
        }
    }
}

/// Reads and parses a show configuration file.
pub fn read_config(path: &Path) -> Result<ShowConfig, ConfigError> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

/// Saves the show configuration. The file is replaced atomically.
pub fn save_config(path: &Path, config: &ShowConfig) -> Result<(), ConfigError> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");

    fs::write(&staging, serde_json::to_vec(config)?)?;
    fs::rename(&staging, path)?;
    Ok(())
}
