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
use super::universe::{FrameBuffer, UNIVERSE_COUNT, UNIVERSE_SIZE};

/// The bring-up pattern: a triangle wave ramped up and down on every fourth
/// channel, offset by one channel per universe.
#[derive(Debug, Default)]
pub struct TestPattern {
    step: u16,
}

impl TestPattern {
    pub fn new() -> TestPattern {
        TestPattern { step: 0 }
    }

    /// The value written on the next tick.
    pub fn value(&self) -> i32 {
        let step = i32::from(self.step);
        if step > 255 {
            512 - step
        } else {
            step
        }
    }

    /// Writes the current value and advances the ramp.
    pub fn tick(&mut self, buffer: &mut FrameBuffer) {
        let value = self.value();
        for i in 0..UNIVERSE_SIZE / UNIVERSE_COUNT {
            for universe in 1..=UNIVERSE_COUNT {
                buffer.set_channel(universe, i * UNIVERSE_COUNT + universe, value);
            }
        }

        self.step += 2;
        if self.step > 512 {
            self.step = 0;
        }
    }
}
