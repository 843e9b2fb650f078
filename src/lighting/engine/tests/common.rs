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
use crate::dmx::universe::FrameBuffer;
use crate::lighting::catalog::{Catalog, ColorMode, FixtureType};
use crate::lighting::patch::Fixture;
use crate::lighting::show::{Direction, Show, ShowType};
use crate::lighting::{Rig, ShowEngine};

pub(crate) const RED: [u8; 3] = [255, 0, 0];
pub(crate) const GREEN: [u8; 3] = [0, 255, 0];
pub(crate) const BLUE: [u8; 3] = [0, 0, 255];

pub(crate) const RGB_TYPE: i64 = 1;
pub(crate) const RGBW_TYPE: i64 = 2;

pub(crate) fn create_catalog() -> Catalog {
    Catalog::new(vec![
        FixtureType {
            id: RGB_TYPE,
            color_mode: ColorMode::Rgb,
            channel_count: 3,
            segment_count: 1,
            multi_count_one_fixture: false,
        },
        FixtureType {
            id: RGBW_TYPE,
            color_mode: ColorMode::Rgbw,
            channel_count: 4,
            segment_count: 1,
            multi_count_one_fixture: false,
        },
    ])
}

pub(crate) fn create_show(show_type: ShowType, colors: Vec<[u8; 3]>) -> Show {
    Show {
        show_type,
        colors,
        speed: 50,
        size: 1,
        direction: Direction::Forward,
        splits: 1,
    }
}

/// Creates a rig with `count` RGB fixtures packed from address 1 on universe 1
/// in a single zone, with universe 1 driven by the first output.
pub(crate) fn create_rig(count: u32, show: Show) -> Rig {
    Rig {
        outputs: [Some(1), None, None, None],
        zone_shows: vec![0],
        fixtures: (0..count)
            .map(|i| Fixture {
                type_id: RGB_TYPE,
                universe: 1,
                start_address: 1 + i * 3,
                zone_number: 1,
                group_number: 1,
                quantity: 0,
            })
            .collect(),
        catalog: create_catalog(),
        shows: vec![Some(show)],
    }
}

pub(crate) fn create_engine(count: u32, show: Show) -> ShowEngine {
    let mut engine = ShowEngine::new();
    engine.load(&create_rig(count, show));
    engine
}

/// Runs the given number of ticks and returns the frame buffer.
pub(crate) fn run_ticks(engine: &mut ShowEngine, ticks: usize) -> FrameBuffer {
    let mut buffer = FrameBuffer::new();
    for _ in 0..ticks {
        engine.tick(&mut buffer);
    }
    buffer
}

/// The colors of the first zone's entries after the last tick.
pub(crate) fn zone_colors(engine: &ShowEngine) -> Vec<[u8; 3]> {
    engine.zones()[0]
        .entries
        .iter()
        .map(|entry| entry.color)
        .collect()
}
