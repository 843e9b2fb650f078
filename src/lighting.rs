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

pub mod catalog;
pub mod engine;
pub mod fade;
pub mod patch;
pub mod show;

pub use engine::ShowEngine;

use crate::dmx::universe::UNIVERSE_COUNT;

use self::{catalog::Catalog, patch::Fixture, show::Show};

/// Everything the show engine needs to know about the installation, validated
/// and defaulted from the show configuration.
#[derive(Debug, Clone, Default)]
pub struct Rig {
    /// The configured universe ID driven by each output universe, if any.
    pub outputs: [Option<i64>; UNIVERSE_COUNT],

    /// The show index each zone runs, in zone order.
    pub zone_shows: Vec<usize>,

    /// The patched fixtures.
    pub fixtures: Vec<Fixture>,

    /// The fixture types referenced by the patch.
    pub catalog: Catalog,

    /// The shows. Invalid shows are kept as `None` so indices stay stable.
    pub shows: Vec<Option<Show>>,
}
