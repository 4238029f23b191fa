use cyd_panel::mock::{Call, MockBackend};
use cyd_panel::{Config, ErrorCode};
use gameclock_scenario_harness::ScenarioHarness;
use gameclock_ui::Stage;

#[test]
fn claimed_bus_stops_at_bus_init() {
    let err = ScenarioHarness::boot_with(Config::cyd(), MockBackend::new().with_claimed_bus())
        .err()
        .expect("bring-up should fail");

    assert_eq!(err.stage, Stage::BusInit);
    assert_eq!(err.code, ErrorCode::INVALID_STATE);
    assert_eq!(
        err.to_string(),
        "display bring-up failed at bus init (2/9): ESP_ERR_INVALID_STATE (0x103)"
    );
}

#[test]
fn driver_failure_is_reported_with_its_code() {
    let backend = MockBackend::new().fail_at(Call::AttachPanelDriver, ErrorCode::NO_MEM);
    let err = ScenarioHarness::boot_with(Config::cyd(), backend)
        .err()
        .expect("bring-up should fail");

    assert_eq!(err.stage, Stage::PanelDriverAttach);
    assert_eq!(err.code, ErrorCode::NO_MEM);
}

#[test]
fn unswapped_panels_read_back_the_same() {
    let mut config = Config::cyd();
    config.swap_bytes = false;
    let mut harness = ScenarioHarness::boot_with(config, MockBackend::new()).expect("bring-up");
    harness.run_for(250);

    assert_eq!(
        harness.pixel(0, 0),
        Some(embedded_graphics::pixelcolor::Rgb565::new(31, 63, 31))
    );
}
