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
use crate::lighting::engine::tests::common::*;
use crate::lighting::show::ShowType;

const BLACK: [u8; 3] = [0, 0, 0];
const WHITE: [u8; 3] = [255, 255, 255];

#[test]
fn test_all_fade_starts_on_first_color() {
    let mut engine = create_engine(3, create_show(ShowType::AllFade, vec![BLACK, WHITE]));
    run_ticks(&mut engine, 1);

    assert_eq!(vec![BLACK, BLACK, BLACK], zone_colors(&engine));
}

#[test]
fn test_all_fade_midway() {
    // Total time 81, 41 steps per color. Counter 20 blends to round(255 / 41 * 20) = 124,
    // which the sine curve lifts to 176.
    let mut engine = create_engine(2, create_show(ShowType::AllFade, vec![BLACK, WHITE]));
    run_ticks(&mut engine, 21);

    assert_eq!(vec![[176, 176, 176], [176, 176, 176]], zone_colors(&engine));
}

#[test]
fn test_all_fade_reaches_second_color() {
    let mut engine = create_engine(1, create_show(ShowType::AllFade, vec![BLACK, WHITE]));

    // Counter 41 starts the fade from the second color back to the first.
    run_ticks(&mut engine, 42);
    assert_eq!(vec![WHITE], zone_colors(&engine));
}

#[test]
fn test_all_fade_is_monotonic_within_a_color() {
    let mut engine = create_engine(1, create_show(ShowType::AllFade, vec![BLACK, WHITE]));

    let mut previous = 0u8;
    for _ in 0..41 {
        run_ticks(&mut engine, 1);
        let value = zone_colors(&engine)[0][0];
        assert!(value >= previous);
        previous = value;
    }
}

#[test]
fn test_fade_chase_holds_then_fades() {
    let mut show = create_show(ShowType::FadeChase, vec![RED, BLUE]);
    show.size = 3;
    let mut engine = create_engine(6, show);

    // At counter 0 every fading pixel sits at the start of its fade.
    run_ticks(&mut engine, 1);
    assert_eq!(vec![RED, RED, RED, BLUE, BLUE, BLUE], zone_colors(&engine));

    // 13.5 steps per pixel. Counter 7 is partway through the fade of the last
    // pixel of each color segment while the solid pixels hold.
    run_ticks(&mut engine, 7);
    let colors = zone_colors(&engine);
    assert_eq!(RED, colors[0]);
    assert_eq!(RED, colors[1]);
    assert_eq!([175, 0, 185], colors[2]);
    assert_eq!(BLUE, colors[3]);
    assert_eq!(BLUE, colors[4]);
    assert_eq!([185, 0, 175], colors[5]);
}

#[test]
fn test_fade_chase_percentage_size() {
    let mut show = create_show(ShowType::FadeChase, vec![RED, BLUE]);
    // 21 - 19 = 2: each color covers half of the zone.
    show.size = 19;
    let mut engine = create_engine(10, show);
    run_ticks(&mut engine, 1);

    let colors = zone_colors(&engine);
    assert_eq!(RED, colors[0]);
    assert_eq!(BLUE, colors[5]);
}
