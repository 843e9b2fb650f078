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
//! The show configuration: the device metadata, patch, shows and fixture types
//! sent by the configuration server. Every field may be missing and numbers may
//! arrive as strings, so everything is held loosely here and validated once
//! into a [Rig] for the show engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::dmx::universe::UNIVERSE_SIZE;
use crate::lighting::{
    catalog::{Catalog, ColorMode, FixtureType},
    patch::Fixture,
    show::{Direction, Show, ShowType},
    Rig,
};

pub const DEFAULT_SPEED: i64 = 50;
pub const DEFAULT_SIZE: i64 = 1;
/// The show slot zones run when they carry no `show` index.
pub const DEFAULT_SHOW: usize = 1;

/// A scalar the server sends as a number, a numeric string or a boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// The value as an integer. Fractions are truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Bool(value) => Some(i64::from(*value)),
            Scalar::Int(value) => Some(*value),
            Scalar::Float(value) => truncate(*value),
            Scalar::Text(text) => {
                let text = text.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(truncate))
            }
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Scalar::Bool(value) => *value,
            Scalar::Text(text) if text.trim().eq_ignore_ascii_case("true") => true,
            other => other.as_i64().is_some_and(|value| value != 0),
        }
    }
}

fn truncate(value: f64) -> Option<i64> {
    value.is_finite().then_some(value.trunc() as i64)
}

fn int(value: &Option<Scalar>) -> Option<i64> {
    value.as_ref().and_then(Scalar::as_i64)
}

/// Maps each output universe to a configured universe ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port1: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port2: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port3: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port4: Option<Scalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatchConfig {
    /// One entry per zone. Entries may select a show with a `show` index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones_list: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixtures_list: Option<Vec<FixtureConfig>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FixtureConfig {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub fixture_type: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub universe: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_address: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_number: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_number: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Scalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureTypeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multicountonefixture: Option<Scalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShowEntry {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub show_type: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors_list: Option<Vec<Vec<Scalar>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splits: Option<Scalar>,
}

/// The complete show configuration, as persisted to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShowConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devicemeta: Option<DeviceMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<PatchConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shows: Option<Vec<Option<ShowEntry>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture_types: Option<Vec<FixtureTypeConfig>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_blocks: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_blocks: Option<Value>,
}

/// The top level sections of the show configuration.
pub const SECTIONS: [&str; 6] = [
    "devicemeta",
    "patch",
    "shows",
    "fixtureTypes",
    "scheduleBlocks",
    "eventBlocks",
];

impl ShowConfig {
    /// Replaces every section present in `update`. Sections that fail to parse
    /// are skipped and the current section is kept. Returns the names of the
    /// sections whose contents changed.
    pub fn merge(&mut self, update: &Map<String, Value>) -> Vec<&'static str> {
        let mut changed = Vec::new();
        for section in SECTIONS {
            let Some(value) = update.get(section) else {
                continue;
            };
            match self.replace_section(section, value) {
                Ok(true) => changed.push(section),
                Ok(false) => {}
                Err(e) => warn!(section, err = e.to_string(), "Ignoring malformed section."),
            }
        }
        changed
    }

    fn replace_section(&mut self, section: &str, value: &Value) -> Result<bool, serde_json::Error> {
        let value = value.clone();
        let changed = match section {
            "devicemeta" => replace(&mut self.devicemeta, serde_json::from_value(value)?),
            "patch" => replace(&mut self.patch, serde_json::from_value(value)?),
            "shows" => replace(&mut self.shows, serde_json::from_value(value)?),
            "fixtureTypes" => replace(&mut self.fixture_types, serde_json::from_value(value)?),
            "scheduleBlocks" => replace(&mut self.schedule_blocks, Some(value)),
            "eventBlocks" => replace(&mut self.event_blocks, Some(value)),
            _ => false,
        };
        Ok(changed)
    }

    /// Validates the configuration into a rig. Anything missing or invalid is
    /// left out with a warning.
    pub fn rig(&self) -> Rig {
        let shows = self.validated_shows();
        Rig {
            outputs: self.outputs(),
            zone_shows: self.zone_shows(&shows),
            fixtures: self.fixtures(),
            catalog: self.catalog(),
            shows,
        }
    }

    fn outputs(&self) -> [Option<i64>; 4] {
        let Some(meta) = &self.devicemeta else {
            return [None; 4];
        };
        [
            int(&meta.port1),
            int(&meta.port2),
            int(&meta.port3),
            int(&meta.port4),
        ]
    }

    /// Zones without a `show` index run the show in slot 1. The server keeps a
    /// placeholder in slot 0. When slot 1 holds no valid show the first valid
    /// one runs instead.
    fn zone_shows(&self, shows: &[Option<Show>]) -> Vec<usize> {
        let zones = self
            .patch
            .as_ref()
            .and_then(|patch| patch.zones_list.as_ref());
        let Some(zones) = zones else {
            return Vec::new();
        };

        let default_show = match shows.get(DEFAULT_SHOW) {
            Some(Some(_)) => DEFAULT_SHOW,
            _ => shows
                .iter()
                .position(Option::is_some)
                .unwrap_or(DEFAULT_SHOW),
        };

        zones
            .iter()
            .map(|zone| {
                zone.get("show")
                    .cloned()
                    .and_then(|show| serde_json::from_value::<Scalar>(show).ok())
                    .and_then(|show| show.as_i64())
                    .and_then(|show| usize::try_from(show).ok())
                    .unwrap_or(default_show)
            })
            .collect()
    }

    fn fixtures(&self) -> Vec<Fixture> {
        let fixtures = self
            .patch
            .as_ref()
            .and_then(|patch| patch.fixtures_list.as_ref());
        let Some(fixtures) = fixtures else {
            return Vec::new();
        };

        fixtures
            .iter()
            .enumerate()
            .filter_map(|(index, fixture)| {
                let type_id = int(&fixture.fixture_type);
                let start_address = int(&fixture.start_address)
                    .filter(|address| (1..=UNIVERSE_SIZE as i64).contains(address))
                    .map(|address| address as u32);
                let zone_number =
                    int(&fixture.zone_number).and_then(|zone| usize::try_from(zone).ok());
                let (Some(type_id), Some(start_address), Some(zone_number)) =
                    (type_id, start_address, zone_number)
                else {
                    warn!(
                        fixture = index,
                        "Fixture is missing its type, zone or a valid address, skipping."
                    );
                    return None;
                };

                Some(Fixture {
                    type_id,
                    universe: int(&fixture.universe).unwrap_or(0),
                    start_address,
                    zone_number,
                    group_number: int(&fixture.group_number).unwrap_or(0),
                    quantity: int(&fixture.quantity)
                        .and_then(|q| u32::try_from(q).ok())
                        .unwrap_or(0),
                })
            })
            .collect()
    }

    fn catalog(&self) -> Catalog {
        let Some(types) = &self.fixture_types else {
            return Catalog::default();
        };

        Catalog::new(types.iter().filter_map(|fixture_type| {
            let Some(id) = int(&fixture_type.id) else {
                warn!("Fixture type is missing its ID, skipping.");
                return None;
            };
            let channel_count = clamp_u16(int(&fixture_type.channels).unwrap_or(3));
            Some(FixtureType {
                id,
                color_mode: fixture_type
                    .color
                    .as_deref()
                    .map(ColorMode::parse)
                    .unwrap_or_default(),
                channel_count,
                segment_count: clamp_u16(int(&fixture_type.segments).unwrap_or(1)),
                multi_count_one_fixture: fixture_type
                    .multicountonefixture
                    .as_ref()
                    .is_some_and(Scalar::as_bool),
            })
        }))
    }

    fn validated_shows(&self) -> Vec<Option<Show>> {
        let Some(shows) = &self.shows else {
            return Vec::new();
        };

        shows
            .iter()
            .enumerate()
            .map(|(index, show)| {
                let show = show.as_ref()?;
                let validated = validate_show(show);
                if validated.is_none() {
                    warn!(show = index, "Show has an unknown type or no colors.");
                }
                validated
            })
            .collect()
    }
}

/// Stores `value` in `slot`. Returns whether it differed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn clamp_u16(value: i64) -> u16 {
    value.clamp(0, i64::from(u16::MAX)) as u16
}

/// Validates a show. Returns `None` for an unknown type or an empty color list.
pub fn validate_show(show: &ShowEntry) -> Option<Show> {
    let show_type = int(&show.show_type).and_then(ShowType::from_number)?;
    let colors: Vec<[u8; 3]> = show
        .colors_list
        .as_ref()?
        .iter()
        .map(|color| {
            let channel = |i: usize| {
                color
                    .get(i)
                    .and_then(Scalar::as_i64)
                    .map_or(0, |value| value.clamp(0, 255) as u8)
            };
            [channel(0), channel(1), channel(2)]
        })
        .collect();
    if colors.is_empty() {
        return None;
    }

    Some(Show {
        show_type,
        colors,
        speed: int(&show.speed).unwrap_or(DEFAULT_SPEED).clamp(1, 100) as u8,
        size: int(&show.size).unwrap_or(DEFAULT_SIZE).clamp(1, 20) as u8,
        direction: Direction::from_number(int(&show.direction).unwrap_or(1)),
        splits: Show::splits_from_selector(int(&show.splits).unwrap_or(1)),
    })
}
