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
use super::PORT_COUNT;

/// Tracks which physical port currently plays which logical role. The output
/// controllers announce their role in every acknowledgement, so they can be
/// plugged into either port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityMap {
    /// The physical port index for each role.
    roles: [usize; PORT_COUNT],
}

impl IdentityMap {
    pub fn new() -> IdentityMap {
        IdentityMap { roles: [0, 1] }
    }

    /// Records that the device on `port` declared `role`. The other port takes
    /// the other role.
    pub fn acknowledge(&mut self, port: usize, role: usize) {
        if port >= PORT_COUNT || role >= PORT_COUNT {
            return;
        }
        self.roles[role] = port;
        self.roles[1 - role] = 1 - port;
    }

    /// The physical port currently playing the given role.
    pub fn port_for_role(&self, role: usize) -> Option<usize> {
        self.roles.get(role).copied()
    }

    /// Resolves a 0-based universe to its physical port and line. Universes 0
    /// and 1 belong to role 0 as lines 1 and 2, universes 2 and 3 to role 1.
    pub fn route(&self, universe: usize) -> Option<(usize, u8)> {
        let port = self.port_for_role(universe / 2)?;
        let line = if universe % 2 == 0 { 1 } else { 2 };
        Some((port, line))
    }
}

impl Default for IdentityMap {
    fn default() -> Self {
        Self::new()
    }
}
