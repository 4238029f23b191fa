//! Backlight line driven through embedded-hal

use embedded_hal::digital::OutputPin;

use crate::error::ErrorCode;

/// Backlight enable line
///
/// Wraps any [`OutputPin`]; the polarity decides which level lights the panel.
pub struct Backlight<P> {
    pin: P,
    active_high: bool,
}

impl<P: OutputPin> Backlight<P> {
    /// Wrap an already configured output pin
    pub fn new(pin: P, active_high: bool) -> Self {
        Self { pin, active_high }
    }

    /// Drive the line to its active level
    pub fn enable(&mut self) -> Result<(), ErrorCode> {
        let result = if self.active_high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| ErrorCode::FAIL)
    }

    /// Drive the line to its inactive level
    pub fn disable(&mut self) -> Result<(), ErrorCode> {
        let result = if self.active_high {
            self.pin.set_low()
        } else {
            self.pin.set_high()
        };
        result.map_err(|_| ErrorCode::FAIL)
    }

    /// Borrow the pin
    pub fn pin(&self) -> &P {
        &self.pin
    }

    /// Give the pin back
    pub fn release(self) -> P {
        self.pin
    }
}
