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
mod error;
pub mod identity;
pub mod settings;
pub mod show;
pub mod store;

pub use error::{ConfigError, IdentityError};
pub use identity::{load_identity, Identity};
pub use settings::Settings;
pub use show::ShowConfig;
pub use store::{load_config, read_config, save_config};
