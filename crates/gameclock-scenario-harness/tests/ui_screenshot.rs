use std::path::PathBuf;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use gameclock_scenario_harness::ScenarioHarness;
use gameclock_ui::style::palette;
use gameclock_ui::State;

fn screenshot_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("screenshots")
}

#[test]
fn screenshot_startup_sequence() {
    let mut harness = ScenarioHarness::boot().expect("bring-up should succeed");
    let dir = screenshot_dir();

    harness.tick(0);
    harness
        .save_screenshot_png(dir.join("startup_default.png"))
        .expect("Failed to save default screen");

    harness.run_for(150);
    harness
        .save_screenshot_png(dir.join("startup_sliding.png"))
        .expect("Failed to save slide-in");

    harness.run_for(100);
    harness
        .save_screenshot_png(dir.join("startup_main.png"))
        .expect("Failed to save main screen");
    assert!(dir.join("startup_main.png").exists());
}

#[test]
fn screenshot_button_states() {
    let mut harness = ScenarioHarness::boot().expect("bring-up should succeed");
    harness.run_for(250);

    let [replay, new, settings] = harness.main().buttons();
    {
        let mut ui = harness.ui();
        let widgets = ui.widgets_mut();
        widgets.add_state(new, State::FOCUSED).expect("live button");
        widgets.add_state(settings, State::DISABLED).expect("live button");
        widgets.add_state(replay, State::PRESSED).expect("live button");
    }
    harness.tick(33);

    // Left of the labels: pressed has no style of its own, focused is
    // inverted, disabled is greyed.
    assert_eq!(harness.pixel(20, 22), Some(Rgb565::WHITE));
    assert_eq!(harness.pixel(20, 66), Some(Rgb565::BLACK));
    assert_eq!(
        harness.pixel(20, 110),
        Some(Rgb565::from(palette::GREY_LIGHTEN_3))
    );

    harness
        .save_screenshot_png(screenshot_dir().join("main_button_states.png"))
        .expect("Failed to save button states");
}
