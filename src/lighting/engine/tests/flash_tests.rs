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

#[test]
fn test_flash_flips_at_half_cycle() {
    let show = create_show(ShowType::AllFlash, vec![RED, BLUE]);
    let total_time = show.total_time();
    assert_eq!(81, total_time);
    let mut engine = create_engine(3, show);

    // Ticks render counters 0 through 39.
    run_ticks(&mut engine, (total_time / 2) as usize);
    assert_eq!(vec![RED, RED, RED], zone_colors(&engine));

    // The next tick renders counter 40 = floor(81 / 2).
    run_ticks(&mut engine, 1);
    assert_eq!(vec![BLUE, BLUE, BLUE], zone_colors(&engine));
}

#[test]
fn test_flash_resets_past_last_color() {
    let mut engine = create_engine(1, create_show(ShowType::AllFlash, vec![RED, BLUE]));

    // Counter 80 is past both 40-step colors: back to the first color and the
    // counter restarts.
    run_ticks(&mut engine, 81);
    assert_eq!(vec![RED], zone_colors(&engine));
    assert_eq!(1, engine.zones()[0].counter);
}

#[test]
fn test_flash_counter_bounded() {
    let show = create_show(ShowType::AllFlash, vec![RED, GREEN, BLUE]);
    let total_time = show.total_time();
    let mut engine = create_engine(2, show);

    for _ in 0..500 {
        run_ticks(&mut engine, 1);
        assert!(engine.zones()[0].counter <= total_time);
    }
}
