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

use tracing::warn;

use super::catalog::{Catalog, ColorMode};
use crate::dmx::universe::UNIVERSE_SIZE;

/// A fixture as placed in the patch.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    /// The catalog ID of the fixture type.
    pub type_id: i64,

    /// The configured universe ID. Mapped to an output through the device metadata.
    pub universe: i64,

    /// The first DMX channel of the fixture (1-based).
    pub start_address: u32,

    /// The 1-based zone this fixture belongs to.
    pub zone_number: usize,

    /// The group this fixture belongs to. Carried through but not used by the engine.
    pub group_number: i64,

    /// The number of repeating segments when the type is multi-count.
    pub quantity: u32,
}

/// One independently addressable color target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnginePatchEntry {
    pub universe: i64,
    pub start_address: u32,
    pub color_mode: ColorMode,
    pub color: [u8; 3],
}

impl EnginePatchEntry {
    fn new(universe: i64, start_address: u32, color_mode: ColorMode) -> EnginePatchEntry {
        EnginePatchEntry {
            universe,
            start_address,
            color_mode,
            color: [0, 0, 0],
        }
    }
}

/// An ordered collection of patch entries running one show.
#[derive(Debug, Clone, Default)]
pub struct Zone {
    /// The patch entries in zone order.
    pub entries: Vec<EnginePatchEntry>,

    /// The index into the show list this zone runs.
    pub show: usize,

    /// The phase counter. Bounded by the active show's total time.
    pub counter: u32,
}

/// Expands the fixture list into per-zone patch entries. The result has one zone
/// per element of `zone_shows`, each running the show at that index. Fixtures
/// with an unknown type or zone are skipped.
pub fn compile_patch(zone_shows: &[usize], fixtures: &[Fixture], catalog: &Catalog) -> Vec<Zone> {
    let mut zones: Vec<Zone> = zone_shows
        .iter()
        .map(|show| Zone {
            entries: Vec::new(),
            show: *show,
            counter: 0,
        })
        .collect();

    if zones.is_empty() {
        return zones;
    }

    for fixture in fixtures {
        let Some(fixture_type) = catalog.get(fixture.type_id) else {
            warn!(
                fixture_type = fixture.type_id,
                "Fixture references an unknown fixture type, skipping."
            );
            continue;
        };
        let Some(zone) = fixture
            .zone_number
            .checked_sub(1)
            .and_then(|index| zones.get_mut(index))
        else {
            warn!(
                zone = fixture.zone_number,
                "Fixture references an unknown zone, skipping."
            );
            continue;
        };

        let stride = u32::from(fixture_type.stride());
        let count = if fixture_type.multi_count_one_fixture {
            fixture.quantity
        } else if fixture_type.segment_count > 1 {
            u32::from(fixture_type.segment_count)
        } else {
            1
        };

        // No universe holds more entries than channels.
        let count = count.min(UNIVERSE_SIZE as u32);
        let entries = (0..count)
            .map_while(|i| {
                stride
                    .checked_mul(i)
                    .and_then(|offset| fixture.start_address.checked_add(offset))
                    .filter(|address| *address <= UNIVERSE_SIZE as u32)
            })
            .map(|address| EnginePatchEntry::new(fixture.universe, address, fixture_type.color_mode));
        zone.entries.extend(entries);
    }

    zones
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use crate::lighting::catalog::FixtureType;

    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            FixtureType {
                id: 1,
                color_mode: ColorMode::Rgb,
                channel_count: 3,
                segment_count: 1,
                multi_count_one_fixture: false,
            },
            FixtureType {
                id: 2,
                color_mode: ColorMode::Rgbw,
                channel_count: 32,
                segment_count: 8,
                multi_count_one_fixture: false,
            },
            FixtureType {
                id: 3,
                color_mode: ColorMode::Rgb,
                channel_count: 3,
                segment_count: 1,
                multi_count_one_fixture: true,
            },
        ])
    }

    fn fixture(type_id: i64, start_address: u32, zone_number: usize, quantity: u32) -> Fixture {
        Fixture {
            type_id,
            universe: 1,
            start_address,
            zone_number,
            group_number: 1,
            quantity,
        }
    }

    #[test]
    fn test_single_segment() {
        let zones = compile_patch(&[0], &[fixture(1, 10, 1, 0)], &catalog());
        assert_eq!(1, zones.len());
        assert_eq!(1, zones[0].entries.len());
        assert_eq!(10, zones[0].entries[0].start_address);
        assert_eq!(ColorMode::Rgb, zones[0].entries[0].color_mode);
    }

    #[test]
    fn test_multi_segment() {
        let zones = compile_patch(&[0], &[fixture(2, 1, 1, 0)], &catalog());
        let addresses: Vec<u32> = zones[0].entries.iter().map(|e| e.start_address).collect();
        assert_eq!(vec![1, 5, 9, 13, 17, 21, 25, 29], addresses);
        assert!(zones[0]
            .entries
            .iter()
            .all(|e| e.color_mode == ColorMode::Rgbw));
    }

    #[test]
    fn test_multi_count_uses_quantity() {
        let zones = compile_patch(&[0, 0], &[fixture(3, 100, 2, 5)], &catalog());
        assert!(zones[0].entries.is_empty());
        let addresses: Vec<u32> = zones[1].entries.iter().map(|e| e.start_address).collect();
        assert_eq!(vec![100, 103, 106, 109, 112], addresses);
    }

    #[test]
    fn test_entry_count_and_uniqueness() {
        let fixtures = vec![
            fixture(1, 1, 1, 0),
            fixture(2, 4, 1, 0),
            fixture(3, 40, 1, 10),
            fixture(1, 1, 2, 0),
        ];
        let zones = compile_patch(&[0, 1], &fixtures, &catalog());

        assert_eq!(1 + 8 + 10, zones[0].entries.len());
        assert_eq!(1, zones[1].entries.len());
        assert_eq!(1, zones[1].show);

        for zone in zones.iter() {
            let unique: HashSet<(i64, u32)> = zone
                .entries
                .iter()
                .map(|e| (e.universe, e.start_address))
                .collect();
            assert_eq!(zone.entries.len(), unique.len());
        }
    }

    #[test]
    fn test_empty_zone_list() {
        let zones = compile_patch(&[], &[fixture(1, 1, 1, 0)], &catalog());
        assert!(zones.is_empty());
    }

    #[test]
    fn test_unknown_type_and_zone_skipped() {
        let zones = compile_patch(
            &[0],
            &[fixture(42, 1, 1, 0), fixture(1, 1, 0, 0), fixture(1, 1, 3, 0)],
            &catalog(),
        );
        assert!(zones[0].entries.is_empty());
    }

    #[test]
    fn test_entries_past_universe_end_dropped() {
        let fixtures = vec![
            fixture(2, u32::MAX, 1, 0),
            fixture(2, 500, 1, 0),
            fixture(3, 500, 1, 4_000_000_000),
        ];
        let zones = compile_patch(&[0], &fixtures, &catalog());

        let addresses: Vec<u32> = zones[0].entries.iter().map(|e| e.start_address).collect();
        assert_eq!(vec![500, 504, 508, 512, 500, 503, 506, 509, 512], addresses);
    }
}
