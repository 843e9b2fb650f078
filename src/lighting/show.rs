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

use std::fmt;

use super::fade;

/// The show algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowType {
    Static,
    AllFade,
    AllFlash,
    Chase,
    FadeChase,
    FluidChase,
}

impl ShowType {
    /// Maps the configured show number (1-6) to a show type.
    pub fn from_number(number: i64) -> Option<ShowType> {
        match number {
            1 => Some(ShowType::Static),
            2 => Some(ShowType::AllFade),
            3 => Some(ShowType::AllFlash),
            4 => Some(ShowType::Chase),
            5 => Some(ShowType::FadeChase),
            6 => Some(ShowType::FluidChase),
            _ => None,
        }
    }
}

impl fmt::Display for ShowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShowType::Static => "static",
            ShowType::AllFade => "all fade",
            ShowType::AllFlash => "all flash",
            ShowType::Chase => "chase",
            ShowType::FadeChase => "fade chase",
            ShowType::FluidChase => "fluid chase",
        };
        write!(f, "{}", name)
    }
}

/// How pixel indices are remapped before the chase offset is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Reverse,
    Forward,
    Converge,
    Diverge,
}

impl Direction {
    /// Maps the configured direction number. Unknown values run forward.
    pub fn from_number(number: i64) -> Direction {
        match number {
            0 => Direction::Reverse,
            2 => Direction::Converge,
            3 => Direction::Diverge,
            _ => Direction::Forward,
        }
    }
}

/// A validated show.
#[derive(Debug, Clone, PartialEq)]
pub struct Show {
    pub show_type: ShowType,
    /// The colors the show cycles through. Never empty.
    pub colors: Vec<[u8; 3]>,
    /// 1 (slowest) to 100 (fastest).
    pub speed: u8,
    /// 1-10 is a pixel count, 11-20 is a fraction of the zone.
    pub size: u8,
    pub direction: Direction,
    /// The number of parallel repeating patterns: 1, 2 or 4.
    pub splits: u8,
}

impl Show {
    /// The number of counter steps in one cycle of this show.
    pub fn total_time(&self) -> u32 {
        fade::total_time(self.speed, self.colors.len())
    }

    /// Gets the color at the given index, wrapping in both directions.
    pub fn color(&self, index: i64) -> [u8; 3] {
        let len = self.colors.len() as i64;
        if len == 0 {
            return [0, 0, 0];
        }
        self.colors[index.rem_euclid(len) as usize]
    }

    /// Maps a splits selector onto the number of parallel patterns.
    pub fn splits_from_selector(selector: i64) -> u8 {
        match selector {
            2 => 2,
            3 | 4 => 4,
            _ => 1,
        }
    }
}
