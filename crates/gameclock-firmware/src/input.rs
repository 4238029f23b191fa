use esp_idf_svc::hal::gpio::{Gpio0, Input, PinDriver, Pull};
use esp_idf_svc::sys::EspError;

use gameclock_ui::{ButtonKeypad, Key};

/// BOOT button on GPIO0: pulled up, low while pressed
pub type BootKeypad = ButtonKeypad<PinDriver<'static, Gpio0, Input>>;

/// The CYD has one free push button; it reports `ENTER`.
pub fn boot_keypad(pin: Gpio0) -> Result<BootKeypad, EspError> {
    let mut button = PinDriver::input(pin)?;
    button.set_pull(Pull::Up)?;
    log::info!("input: BOOT button mapped to {}", Key::ENTER);
    Ok(ButtonKeypad::active_low(button, Key::ENTER))
}
