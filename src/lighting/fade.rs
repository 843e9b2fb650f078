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

//! Timing and interpolation primitives shared by the show algorithms.

use std::f64::consts::FRAC_PI_2;

/// Rounds half toward positive infinity. The show math was tuned against this
/// rounding, so `f64::round` (half away from zero) is not a substitute.
#[inline]
pub fn round(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Rounds to four decimal places.
#[inline]
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// The number of counter steps in one full cycle of a show.
///
/// The speed curve is nonlinear: the top ten speed settings fall off much faster
/// than the rest of the range so that fast shows stay visually distinct.
pub fn total_time(speed: u8, colors: usize) -> u32 {
    let speed_range = 101.0 - f64::from(speed.clamp(1, 100));
    let exp = if speed_range >= 90.0 {
        (speed_range - 80.0).powf(2.3)
    } else {
        speed_range.powf(1.1)
    };
    let colors = colors.max(1) as f64;

    (round(exp) + (colors - 1.0) * 5.0) as u32
}

/// Blends `color1` into `color2` over `steps`, then eases the blended value
/// along a quarter sine wave against the full 0-255 scale.
///
/// The easing always uses 255 as its reference, regardless of the magnitude
/// of the two endpoints.
pub fn sine_fade(color1: u8, color2: u8, steps: f64, current_step: f64) -> u8 {
    let color1 = f64::from(color1);
    let color2 = f64::from(color2);
    let value = round(color2 / steps * current_step + color1 / steps * (steps - current_step));
    let radians_per_step = FRAC_PI_2 / 255.0;

    channel(round((radians_per_step * value).sin() * 255.0))
}

/// Clamps a computed value into a DMX channel value.
#[inline]
pub fn channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0) as u8
}
