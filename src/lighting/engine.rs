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

use tracing::{debug, info};

use crate::dmx::universe::{FrameBuffer, UNIVERSE_COUNT};

use super::{
    catalog::ColorMode,
    fade::{round, round4, sine_fade},
    patch::{compile_patch, EnginePatchEntry, Zone},
    show::{Direction, Show, ShowType},
    Rig,
};


/// The show engine. Computes a color for every patch entry on each tick and
/// writes the results into the frame buffer.
pub struct ShowEngine {
    zones: Vec<Zone>,
    shows: Vec<Option<Show>>,
    outputs: [Option<i64>; UNIVERSE_COUNT],
}

impl ShowEngine {
    /// Creates an engine with no patch. Ticks do nothing until a rig is loaded.
    pub fn new() -> ShowEngine {
        ShowEngine {
            zones: Vec::new(),
            shows: Vec::new(),
            outputs: [None; UNIVERSE_COUNT],
        }
    }

    /// Rebuilds the engine patch from the given rig. Zone counters carry over
    /// by zone position.
    pub fn load(&mut self, rig: &Rig) {
        let mut zones = compile_patch(&rig.zone_shows, &rig.fixtures, &rig.catalog);
        for (zone, previous) in zones.iter_mut().zip(self.zones.iter()) {
            zone.counter = previous.counter;
        }

        for (index, zone) in zones.iter().enumerate() {
            match rig.shows.get(zone.show).and_then(Option::as_ref) {
                Some(show) => info!(
                    zone = index + 1,
                    entries = zone.entries.len(),
                    show = %show.show_type,
                    "Zone loaded."
                ),
                None => info!(
                    zone = index + 1,
                    entries = zone.entries.len(),
                    "Zone loaded without a valid show."
                ),
            }
        }

        self.zones = zones;
        self.shows = rig.shows.clone();
        self.outputs = rig.outputs;
    }

    /// The compiled zones.
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Runs one engine tick: every zone with a valid show is recomputed, written
    /// to the frame buffer and has its counter advanced.
    pub fn tick(&mut self, buffer: &mut FrameBuffer) {
        for zone in self.zones.iter_mut() {
            let Some(show) = self.shows.get(zone.show).and_then(Option::as_ref) else {
                continue;
            };

            let total_time = show.total_time();
            if zone.counter > total_time {
                zone.counter = 0;
            }

            let mut counter = f64::from(zone.counter);
            render(show, &mut zone.entries, &mut counter, f64::from(total_time));
            zone.counter = counter as u32;

            for entry in zone.entries.iter() {
                for (output, universe) in self.outputs.iter().enumerate() {
                    if *universe == Some(entry.universe) {
                        write_entry(buffer, output + 1, entry);
                    }
                }
            }

            zone.counter += 1;
            if zone.counter > total_time {
                zone.counter = 0;
            }
        }
    }
}

impl Default for ShowEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes a patch entry's color to the given output universe. RGBW fixtures get
/// a derived white channel after the color channels.
fn write_entry(buffer: &mut FrameBuffer, universe: usize, entry: &EnginePatchEntry) {
    let start = entry.start_address as usize;
    for (offset, value) in entry.color.iter().enumerate() {
        buffer.set_channel(universe, start + offset, i32::from(*value));
    }

    if entry.color_mode == ColorMode::Rgbw {
        let [r, g, b] = entry.color;
        buffer.set_channel(universe, start + 3, i32::from(r.min(g).min(b)));
    }
}

/// Computes the colors of a zone for the current counter. The algorithms may
/// reset the counter when it runs past the end of their cycle.
fn render(show: &Show, entries: &mut [EnginePatchEntry], counter: &mut f64, total_time: f64) {
    if entries.is_empty() || show.colors.is_empty() {
        return;
    }

    match show.show_type {
        ShowType::Static => static_color(show, entries),
        ShowType::AllFade => all_fade(show, entries, counter, total_time),
        ShowType::AllFlash => all_flash(show, entries, counter, total_time),
        ShowType::Chase => chase(show, entries, counter, total_time),
        ShowType::FadeChase => fade_chase(show, entries, counter, total_time),
        ShowType::FluidChase => fluid_chase(show, entries, counter, total_time),
    }
}

/// Remaps a pixel index for the show direction. Centered remapping shifts the
/// diverge pattern so that it starts from the middle of the zone.
fn remap(direction: Direction, f: f64, count: f64, centered: bool) -> f64 {
    match direction {
        Direction::Forward => f,
        Direction::Reverse => count - f,
        Direction::Converge => {
            if f > count / 2.0 {
                count - f
            } else {
                f
            }
        }
        Direction::Diverge => {
            let offset = if f > count / 2.0 { f } else { count - f };
            if centered {
                offset - count / 2.0
            } else {
                offset
            }
        }
    }
}

/// Blends two colors channel by channel with the sine fade.
fn fade_colors(from: [u8; 3], to: [u8; 3], steps: f64, step: f64) -> [u8; 3] {
    [
        sine_fade(from[0], to[0], steps, step),
        sine_fade(from[1], to[1], steps, step),
        sine_fade(from[2], to[2], steps, step),
    ]
}

fn static_color(show: &Show, entries: &mut [EnginePatchEntry]) {
    let count = entries.len() as f64;
    let colors = show.colors.len() as f64;

    for (f, entry) in entries.iter_mut().enumerate() {
        let index = (f as f64 / count * colors).floor();
        entry.color = show.color(index as i64);
    }
}

fn all_fade(show: &Show, entries: &mut [EnginePatchEntry], counter: &mut f64, total_time: f64) {
    let colors = show.colors.len() as i64;
    let total_fade_time = round(total_time / colors as f64).max(1.0);
    let fade_counter = round(*counter % total_fade_time);

    let mut current = (*counter / total_fade_time).floor() as i64;
    let mut next = current + 1;
    if next >= colors {
        next = 0;
    }
    if current >= colors {
        current = 0;
        next = 0;
        *counter = 0.0;
    }

    let color = fade_colors(
        show.color(current),
        show.color(next),
        total_fade_time,
        fade_counter,
    );
    entries.iter_mut().for_each(|entry| entry.color = color);
}

fn all_flash(show: &Show, entries: &mut [EnginePatchEntry], counter: &mut f64, total_time: f64) {
    let colors = show.colors.len() as i64;
    let counters_per_color = (total_time / colors as f64).floor().max(1.0);

    let mut index = (*counter / counters_per_color).floor() as i64;
    if index >= colors {
        index = 0;
        *counter = 0.0;
    }

    let color = show.color(index);
    entries.iter_mut().for_each(|entry| entry.color = color);
}

/// The pixels per color segment. Sizes of 11 and up are a fraction of the zone.
fn segment_pixels(size: u8, count: f64) -> f64 {
    let pixels = if size >= 11 {
        round(count / (21.0 - f64::from(size)))
    } else {
        f64::from(size)
    };
    pixels.max(1.0)
}

fn chase(show: &Show, entries: &mut [EnginePatchEntry], counter: &mut f64, total_time: f64) {
    let count = entries.len() as f64;
    let colors = show.colors.len() as f64;

    let pixels_per_segment = segment_pixels(show.size, count);
    let total_pixels = pixels_per_segment * colors;
    let time_per_pixel = total_time / total_pixels;
    let offset = round(*counter / time_per_pixel);
    if *counter > time_per_pixel * total_pixels {
        *counter = 0.0;
    }

    for (f, entry) in entries.iter_mut().enumerate() {
        let shifted = remap(show.direction, f as f64, count, false) + offset;
        entry.color = show.color((shifted / pixels_per_segment).floor() as i64);
    }
}

fn fade_chase(show: &Show, entries: &mut [EnginePatchEntry], counter: &mut f64, total_time: f64) {
    let count = entries.len() as f64;
    let colors = show.colors.len() as f64;

    let (pixels_per_color, pixels_to_fade) = if show.size >= 11 {
        (segment_pixels(show.size, count), (count / 10.0).ceil())
    } else {
        (f64::from(show.size), (f64::from(show.size) / 3.0).ceil())
    };
    let static_per_color = pixels_per_color - pixels_to_fade;

    let time_per_pixel = round4(total_time / (pixels_per_color * colors));
    if time_per_pixel <= 0.0 {
        debug!("Fade chase cycle too short to render.");
        return;
    }
    let fade_steps = pixels_to_fade * time_per_pixel;

    if *counter >= time_per_pixel * pixels_per_color * colors {
        *counter = 0.0;
    }
    let step_in_pixel = (*counter % time_per_pixel).floor();
    let pixel_offset = (*counter / time_per_pixel).floor();

    for (f, entry) in entries.iter_mut().enumerate() {
        let shifted = remap(show.direction, f as f64, count, true) + pixel_offset;
        let pixel_in_color = (shifted % pixels_per_color).floor();
        let current_step = step_in_pixel + (pixel_in_color - static_per_color) * time_per_pixel;

        let current = ((shifted / pixels_per_color).floor() % colors).floor() as i64;
        let next = current + 1;

        entry.color = if pixel_in_color >= static_per_color {
            fade_colors(
                show.color(current),
                show.color(next),
                fade_steps,
                current_step,
            )
        } else {
            show.color(current)
        };
    }
}

/// Fluid chase maps each position of a pattern continuously through the color
/// progression. When the pattern length is not a multiple of the color count,
/// the leftover pixels are folded into the last color's fade; the branches below
/// correct the color and step for those pixels on both passes of the pattern.
fn fluid_chase(show: &Show, entries: &mut [EnginePatchEntry], counter: &mut f64, total_time: f64) {
    let count = entries.len() as f64;
    let colors = show.colors.len() as f64;
    let splits = f64::from(show.splits.max(1));

    let loop_length = count / splits;
    let pattern_pixels = match show.direction {
        Direction::Converge | Direction::Diverge => round(loop_length / 2.0),
        _ => round(loop_length),
    }
    .max(1.0);

    let last_color = colors - 1.0;
    let pixels_per_color = (pattern_pixels / colors).floor().max(1.0);
    let pixels_per_last_color = pattern_pixels - last_color * pixels_per_color;
    let extra_pixels = pixels_per_last_color - pixels_per_color;

    let time_per_pixel = round4(total_time / pattern_pixels);
    if time_per_pixel <= 0.0 {
        debug!("Fluid chase cycle too short to render.");
        return;
    }
    let time_per_color = time_per_pixel * pixels_per_color;
    let time_per_last_color = time_per_pixel * pixels_per_last_color;

    if *counter >= time_per_pixel * pattern_pixels {
        *counter = 0.0;
    }
    let step_in_pixel = (*counter % time_per_pixel).floor();
    let pixel_offset = (*counter / time_per_pixel).floor();
    let split_stride = round(count / splits) as usize;

    let mut f = 0usize;
    while (f as f64) < loop_length {
        let shifted = remap(show.direction, f as f64, count, true) + pixel_offset;

        let mut pixel_in_color = (shifted % pixels_per_color).floor();
        let mut fade_steps = time_per_color;
        let mut current = (shifted / pixels_per_color).floor();

        // Pixel within the last color on the first pass.
        if shifted >= last_color * pixels_per_color && shifted < pattern_pixels {
            fade_steps = time_per_last_color;
        }

        // Second pass through the pattern.
        if shifted >= pattern_pixels {
            pixel_in_color = ((shifted - pattern_pixels) % pixels_per_color).floor();
            current = ((shifted - extra_pixels) / pixels_per_color).floor();
            current = (current % colors).floor();
        }

        // Leftover pixel folded into the last color's fade.
        if shifted >= colors * pixels_per_color && shifted < pattern_pixels {
            fade_steps = time_per_last_color;
            pixel_in_color += pixels_per_color;
            current -= 1.0;
        }

        // Last color on the second pass.
        if shifted >= pattern_pixels * 2.0 - pixels_per_last_color {
            fade_steps = time_per_last_color;
        }

        // Leftover pixel on the second pass.
        if shifted >= colors * pixels_per_color + pattern_pixels && shifted < pattern_pixels * 2.0 {
            pixel_in_color += pixels_per_color;
            current = last_color;
        }

        let current = current as i64;
        let next = current + 1;
        let current_step = step_in_pixel + pixel_in_color * time_per_pixel;
        let color = fade_colors(
            show.color(current),
            show.color(next),
            fade_steps,
            current_step,
        );

        for split in 0..usize::from(show.splits.max(1)) {
            if let Some(entry) = entries.get_mut(f + split * split_stride) {
                entry.color = color;
            }
        }

        f += 1;
    }
}
