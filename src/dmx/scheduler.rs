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

use crate::serial::Transport;

use super::{frame, gamma::Gamma, universe::FrameBuffer, universe::UNIVERSE_COUNT};

/// Hands every universe of the frame buffer to the transport on each DMX tick.
pub struct FrameScheduler {
    gamma: Gamma,
}

impl FrameScheduler {
    pub fn new(gamma: Gamma) -> FrameScheduler {
        FrameScheduler { gamma }
    }

    /// Encodes all four universes and sends each to the port currently
    /// responsible for it.
    pub fn emit(&self, buffer: &FrameBuffer, network_status: bool, transport: &mut Transport) {
        for universe in 0..UNIVERSE_COUNT {
            let (Some(values), Some((port, line))) =
                (buffer.universe(universe), transport.identity().route(universe))
            else {
                warn!(universe, "Universe has no route.");
                continue;
            };

            let frame = frame::encode(line, network_status, values, &self.gamma);
            transport.send(port, frame);
        }
    }
}
