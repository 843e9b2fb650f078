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

use std::{collections::HashMap, fmt};

/// The channel layout of a fixture's color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Rgb,
    Rgbw,
    Wrgb,
}

impl ColorMode {
    /// Parses the color mode string used by the configuration server. Unknown
    /// strings fall back to RGB.
    pub fn parse(value: &str) -> ColorMode {
        match value.trim().to_ascii_uppercase().as_str() {
            "RGBW" => ColorMode::Rgbw,
            "WRGB" => ColorMode::Wrgb,
            _ => ColorMode::Rgb,
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Rgb => write!(f, "RGB"),
            ColorMode::Rgbw => write!(f, "RGBW"),
            ColorMode::Wrgb => write!(f, "WRGB"),
        }
    }
}

/// A fixture type definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureType {
    /// The catalog ID of this fixture type.
    pub id: i64,

    /// The color layout of each segment.
    pub color_mode: ColorMode,

    /// The total number of DMX channels the fixture occupies.
    pub channel_count: u16,

    /// The number of independently addressable segments.
    pub segment_count: u16,

    /// True if one patched fixture stands in for `quantity` repeating segments.
    pub multi_count_one_fixture: bool,
}

impl FixtureType {
    /// The channel stride between consecutive segments.
    pub fn stride(&self) -> u16 {
        if self.segment_count == 0 {
            return self.channel_count;
        }
        self.channel_count / self.segment_count
    }
}

/// The static table of known fixture types, keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    types: HashMap<i64, FixtureType>,
}

impl Catalog {
    /// Creates a catalog from the given fixture types. Later duplicates replace
    /// earlier ones.
    pub fn new(types: impl IntoIterator<Item = FixtureType>) -> Catalog {
        Catalog {
            types: types.into_iter().map(|t| (t.id, t)).collect(),
        }
    }

    /// Looks up a fixture type by ID.
    pub fn get(&self, id: i64) -> Option<&FixtureType> {
        self.types.get(&id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
