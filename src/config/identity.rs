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
use std::{fs, path::Path};

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::error::IdentityError;

/// Who this controller is to the configuration server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub device_id: i64,
    pub serial_number: String,
}

#[derive(Deserialize)]
struct RawIdentity {
    device_id: Option<Value>,
    serialnumber: Option<Value>,
}

/// Loads the identity file. The device ID must be an integer and the serial
/// number a string.
pub fn load_identity(path: &Path) -> Result<Identity, IdentityError> {
    let contents = fs::read_to_string(path).map_err(|source| IdentityError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let raw: RawIdentity = serde_json::from_str(&contents)?;

    let device_id = raw.device_id.as_ref().and_then(Value::as_i64);
    let serial_number = raw.serialnumber.as_ref().and_then(Value::as_str);
    let (Some(device_id), Some(serial_number)) = (device_id, serial_number) else {
        return Err(IdentityError::Invalid);
    };

    info!(device_id, serial_number, "Loaded device identity.");
    Ok(Identity {
        device_id,
        serial_number: serial_number.to_string(),
    })
}
