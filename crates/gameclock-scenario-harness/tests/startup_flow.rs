use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use gameclock_scenario_harness::{Hook, ScenarioHarness};
use gameclock_ui::style::palette;

fn deep_blue() -> Rgb565 {
    Rgb565::from(palette::DEEP_BLUE)
}

#[test]
fn default_screen_shows_until_the_load_delay_passes() {
    let mut harness = ScenarioHarness::boot().expect("bring-up should succeed");
    harness.tick(0);

    assert_eq!(harness.count(deep_blue()), 240 * 320);
    // 320 rows in 100-row bands
    assert_eq!(harness.flush_count(), 4);

    harness.run_for(90);
    assert!(harness.hooks().is_empty());
    assert_ne!(harness.ui().active_screen(), harness.main().root());
}

#[test]
fn main_screen_loads_then_default_screen_is_deleted() {
    let mut harness = ScenarioHarness::boot().expect("bring-up should succeed");
    let default = harness.ui().active_screen();

    harness.run_for(100);
    assert_eq!(harness.hooks(), vec![Hook::LoadStarted]);
    assert_eq!(harness.ui().active_screen(), harness.main().root());
    assert!(harness.ui().is_loading());

    harness.run_for(100);
    assert_eq!(harness.hooks(), vec![Hook::LoadStarted, Hook::LoadFinished]);
    let ui = harness.ui();
    assert!(!ui.is_loading());
    assert!(!ui.widgets().contains(default.id()));
    assert_eq!(ui.dispatcher().resident(), Some(harness.main().root()));
}

#[test]
fn main_screen_is_drawn_once_loaded() {
    let mut harness = ScenarioHarness::boot().expect("bring-up should succeed");
    harness.run_for(250);

    assert_eq!(harness.count(deep_blue()), 0);
    // Screen background, then the first button's border and fill
    assert_eq!(harness.pixel(0, 0), Some(Rgb565::WHITE));
    assert_eq!(harness.pixel(2, 20), Some(Rgb565::BLACK));
    assert_eq!(harness.pixel(20, 10), Some(Rgb565::WHITE));
}

#[test]
fn slide_in_shows_both_screens_half_way() {
    let mut harness = ScenarioHarness::boot().expect("bring-up should succeed");
    harness.run_for(150);

    // Incoming screen has covered the left half only.
    assert_eq!(harness.pixel(60, 300), Some(deep_blue()));
    assert_eq!(harness.pixel(200, 300), Some(Rgb565::WHITE));
}
