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

/// The default gamma exponent for the LED outputs.
pub const DEFAULT_GAMMA: f64 = 2.8;

/// A precomputed gamma correction table.
#[derive(Clone)]
pub struct Gamma {
    table: [u8; 256],
}

impl Gamma {
    /// Builds the table for `round((v / 255)^gamma * 255)`.
    pub fn new(gamma: f64) -> Gamma {
        let mut table = [0u8; 256];
        for (value, corrected) in table.iter_mut().enumerate() {
            let normalized = value as f64 / 255.0;
            *corrected = (normalized.powf(gamma) * 255.0)
                .round()
                .clamp(0.0, 255.0) as u8;
        }
        Gamma { table }
    }

    /// Corrects a single channel value.
    #[inline]
    pub fn correct(&self, value: u8) -> u8 {
        self.table[usize::from(value)]
    }
}

impl Default for Gamma {
    fn default() -> Self {
        Self::new(DEFAULT_GAMMA)
    }
}
