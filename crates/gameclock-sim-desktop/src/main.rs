//! Desktop SDL simulator for the CYD game clock.
//!
//! Runs the same bring-up, port loop and main screen as the firmware, with
//! the panel replaced by an SDL window and the keypad by the keyboard.

mod backend;

use std::time::{Duration, Instant};

use embedded_graphics_simulator::{
    sdl2::{Keycode, Mod},
    OutputSettingsBuilder, SimulatorEvent, Window,
};
use gameclock_ui::{app, bring_up, Key, SharedKeypad};

use backend::SimBackend;

const DEMO_PERIOD: Duration = Duration::from_secs(1);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = cyd_panel::Config::cyd();
    let backend = SimBackend::new(config.resolution);
    let display = backend.display();
    let port = bring_up(config, backend)?;

    let keypad = SharedKeypad::new();
    port.set_keypad(keypad.clone());

    {
        let mut ui = port.lock();
        app::setup(&mut ui)?;
    }

    let output_settings = OutputSettingsBuilder::new().scale(2).build();
    let mut window = Window::new("CYD game clock", &output_settings);

    println!("CYD game clock simulator");
    println!("Controls:");
    println!("  Tab / Shift+Tab   - Next / previous focus");
    println!("  Arrow Keys        - Up / Down / Left / Right");
    println!("  Enter / Space     - Enter");
    println!("  Backspace         - Back");
    println!("  Escape            - Esc");
    println!("  Close window      - Quit");

    let mut last = Instant::now();
    let mut demo_tick = Instant::now();
    let mut cnt: u32 = 0;
    loop {
        let now = Instant::now();
        let elapsed = now.duration_since(last).as_millis() as u32;
        last = now;
        let delay_ms = port.handle(elapsed);

        window.update(&display.borrow());

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => return Ok(()),
                SimulatorEvent::KeyDown {
                    keycode, keymod, ..
                } => {
                    let shift = keymod.intersects(Mod::LSHIFTMOD | Mod::RSHIFTMOD);
                    if let Some(key) = keycode_to_key(keycode, shift) {
                        keypad.press(key);
                    }
                }
                SimulatorEvent::KeyUp { .. } => keypad.release(),
                _ => {}
            }
        }

        if demo_tick.elapsed() >= DEMO_PERIOD {
            demo_tick = Instant::now();
            log::info!("cnt: {}", cnt);
            port.lock().unlock();
            cnt = cnt.wrapping_add(1);
        }

        std::thread::sleep(Duration::from_millis(delay_ms.max(1) as u64));
    }
}

fn keycode_to_key(keycode: Keycode, shift: bool) -> Option<Key> {
    match keycode {
        Keycode::Tab if shift => Some(Key::PREV),
        Keycode::Tab => Some(Key::NEXT),
        Keycode::Up => Some(Key::UP),
        Keycode::Down => Some(Key::DOWN),
        Keycode::Left => Some(Key::LEFT),
        Keycode::Right => Some(Key::RIGHT),
        Keycode::Return | Keycode::Space => Some(Key::ENTER),
        Keycode::Backspace => Some(Key::BACKSPACE),
        Keycode::Escape => Some(Key::ESC),
        Keycode::Delete => Some(Key::DEL),
        Keycode::Home => Some(Key::HOME),
        Keycode::End => Some(Key::END),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_direction_follows_shift() {
        assert_eq!(keycode_to_key(Keycode::Tab, false), Some(Key::NEXT));
        assert_eq!(keycode_to_key(Keycode::Tab, true), Some(Key::PREV));
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert_eq!(keycode_to_key(Keycode::Q, false), None);
    }
}
