mod esp_backend;
mod input;
mod runtime_diagnostics;

use std::sync::Arc;
use std::time::{Duration, Instant};

use esp_idf_svc::hal::{
    delay::FreeRtos,
    gpio::{Level, Output, OutputPin, PinDriver},
    peripherals::Peripherals,
};
use esp_idf_svc::sys;

use cyd_panel::Config;
use gameclock_ui::{app, bring_up, RenderingPort};

use esp_backend::{EspBackend, EspFlush};
use runtime_diagnostics::{configure_port_task, log_heap, reset_thread_defaults};

const DEMO_PERIOD: Duration = Duration::from_secs(1);
const PORT_TASK_STACK_BYTES: usize = 16 * 1024;

fn main() {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log_heap("startup");

    let peripherals = Peripherals::take().unwrap();

    let mut led_red = PinDriver::output(peripherals.pins.gpio4).unwrap();
    let mut led_green = PinDriver::output(peripherals.pins.gpio16).unwrap();

    let config = Config::cyd();
    let backlight = PinDriver::output(peripherals.pins.gpio21.downgrade_output()).unwrap();
    let port = match bring_up(config, EspBackend::new(backlight)) {
        Ok(port) => Arc::new(port),
        Err(err) => {
            log::error!("{}, restarting", err);
            unsafe { sys::esp_restart() }
        }
    };
    log_heap("display ready");

    match input::boot_keypad(peripherals.pins.gpio0) {
        Ok(keypad) => port.set_keypad(keypad),
        Err(err) => log::warn!("BOOT button unavailable: {}", err),
    }

    spawn_port_task(Arc::clone(&port));

    {
        let mut ui = port.lock();
        if let Err(err) = app::setup(&mut ui) {
            log::error!("app setup failed: {}", err);
        }
    }
    log_heap("app ready");

    let mut cnt: u32 = 0;
    loop {
        log::info!("cnt: {}", cnt);
        set_led(&mut led_red, cnt % 2 != 0);
        set_led(&mut led_green, cnt % 3 != 0);

        // Screen mutations from this task go through the lock.
        port.lock().unlock();

        FreeRtos::delay_ms(DEMO_PERIOD.as_millis() as u32);
        cnt = cnt.wrapping_add(1);
    }
}

fn spawn_port_task(port: Arc<RenderingPort<EspFlush>>) {
    configure_port_task();
    let spawned = std::thread::Builder::new()
        .name("gui".into())
        .stack_size(PORT_TASK_STACK_BYTES)
        .spawn(move || {
            let mut last = Instant::now();
            loop {
                let now = Instant::now();
                let elapsed = now.duration_since(last).as_millis() as u32;
                last = now;
                let delay_ms = port.handle(elapsed);
                FreeRtos::delay_ms(delay_ms.max(1));
            }
        });
    reset_thread_defaults();

    if let Err(err) = spawned {
        log::error!("failed to start port task: {}, restarting", err);
        unsafe { sys::esp_restart() }
    }
}

fn set_led<P: OutputPin>(led: &mut PinDriver<'_, P, Output>, on: bool) {
    if let Err(err) = led.set_level(Level::from(on)) {
        log::warn!("LED GPIO{}: {}", led.pin(), err);
    }
}
