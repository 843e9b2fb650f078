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

/// A DMX universe is 512 channels.
pub const UNIVERSE_SIZE: usize = 512;

/// The number of output universes: two per output controller.
pub const UNIVERSE_COUNT: usize = 4;

/// The channel values for every output universe. Written by the show engine and
/// read by the frame scheduler; the last write within a tick wins.
#[derive(Clone, PartialEq)]
pub struct FrameBuffer {
    universes: [[u8; UNIVERSE_SIZE]; UNIVERSE_COUNT],
}

impl FrameBuffer {
    /// Creates a blacked out frame buffer.
    pub fn new() -> FrameBuffer {
        FrameBuffer {
            universes: [[0; UNIVERSE_SIZE]; UNIVERSE_COUNT],
        }
    }

    /// Sets a channel. `universe` is 1-4 and `channel` is 1-512; `value` must be
    /// 0-255. Anything out of range is ignored.
    pub fn set_channel(&mut self, universe: usize, channel: usize, value: i32) {
        if !(1..=UNIVERSE_COUNT).contains(&universe) || !(1..=UNIVERSE_SIZE).contains(&channel) {
            return;
        }
        let Ok(value) = u8::try_from(value) else {
            return;
        };

        self.universes[universe - 1][channel - 1] = value;
    }

    /// Gets a channel using the same 1-based addressing as `set_channel`.
    pub fn channel(&self, universe: usize, channel: usize) -> Option<u8> {
        self.universes
            .get(universe.checked_sub(1)?)?
            .get(channel.checked_sub(1)?)
            .copied()
    }

    /// Gets the raw values of a universe by its 0-based index.
    pub fn universe(&self, index: usize) -> Option<&[u8; UNIVERSE_SIZE]> {
        self.universes.get(index)
    }

    /// Sets every channel of every universe to zero.
    pub fn blackout(&mut self) {
        self.universes
            .iter_mut()
            .for_each(|universe| universe.fill(0));
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut buffer = FrameBuffer::new();
        buffer.set_channel(1, 1, 10);
        buffer.set_channel(4, 512, 255);

        assert_eq!(Some(10), buffer.channel(1, 1));
        assert_eq!(Some(255), buffer.channel(4, 512));
        assert_eq!(10, buffer.universe(0).unwrap()[0]);
        assert_eq!(255, buffer.universe(3).unwrap()[511]);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut buffer = FrameBuffer::new();
        buffer.set_channel(2, 5, 100);

        buffer.set_channel(0, 5, 1);
        buffer.set_channel(5, 5, 1);
        buffer.set_channel(2, 0, 1);
        buffer.set_channel(2, 513, 1);
        buffer.set_channel(2, 5, -1);
        buffer.set_channel(2, 5, 256);

        assert!(buffer == {
            let mut expected = FrameBuffer::new();
            expected.set_channel(2, 5, 100);
            expected
        });
        assert_eq!(None, buffer.channel(0, 1));
        assert_eq!(None, buffer.channel(1, 513));
    }

    #[test]
    fn test_blackout() {
        let mut buffer = FrameBuffer::new();
        buffer.set_channel(3, 7, 99);
        buffer.blackout();
        assert_eq!(Some(0), buffer.channel(3, 7));
    }
}
