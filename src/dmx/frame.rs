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

use super::{gamma::Gamma, universe::UNIVERSE_SIZE};

/// The length of an encoded frame, excluding the newline terminator.
pub const FRAME_LEN: usize = 2 + UNIVERSE_SIZE * 2;

/// Encodes one universe as an output line:
/// `<line index><network status><two lowercase hex digits per channel>`.
/// Every channel is gamma corrected on the way out.
pub fn encode(
    line: u8,
    network_status: bool,
    values: &[u8; UNIVERSE_SIZE],
    gamma: &Gamma,
) -> String {
    let corrected: Vec<u8> = values.iter().map(|value| gamma.correct(*value)).collect();

    let mut frame = String::with_capacity(FRAME_LEN);
    frame.push(char::from(b'0' + line % 10));
    frame.push(if network_status { '1' } else { '0' });
    frame.push_str(&hex::encode(corrected));
    frame
}
