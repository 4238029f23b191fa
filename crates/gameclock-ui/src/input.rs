//! Keypad input abstraction.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use embedded_hal::digital::InputPin;

/// Non-zero key code, numbered like the LVGL keypad codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Key(u32);

impl Key {
    pub const HOME: Key = Key(2);
    pub const END: Key = Key(3);
    pub const BACKSPACE: Key = Key(8);
    /// Move focus to the next object of the group
    pub const NEXT: Key = Key(9);
    pub const ENTER: Key = Key(10);
    /// Move focus to the previous object of the group
    pub const PREV: Key = Key(11);
    pub const UP: Key = Key(17);
    pub const DOWN: Key = Key(18);
    pub const RIGHT: Key = Key(19);
    pub const LEFT: Key = Key(20);
    pub const ESC: Key = Key(27);
    pub const DEL: Key = Key(127);

    /// `None` for 0, which means "no key"
    pub fn from_raw(raw: u32) -> Option<Key> {
        (raw != 0).then_some(Key(raw))
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for Key {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match *self {
            Key::HOME => "HOME",
            Key::END => "END",
            Key::BACKSPACE => "BACKSPACE",
            Key::NEXT => "NEXT",
            Key::ENTER => "ENTER",
            Key::PREV => "PREV",
            Key::UP => "UP",
            Key::DOWN => "DOWN",
            Key::RIGHT => "RIGHT",
            Key::LEFT => "LEFT",
            Key::ESC => "ESC",
            Key::DEL => "DEL",
            _ => return write!(f, "key {}", self.0),
        };
        f.write_str(name)
    }
}

/// One keypad sample
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyReading {
    /// Raw key code, 0 when the device reports none
    pub key: u32,
    pub pressed: bool,
}

impl KeyReading {
    pub const RELEASED: KeyReading = KeyReading {
        key: 0,
        pressed: false,
    };

    pub fn pressed(key: Key) -> Self {
        Self {
            key: key.raw(),
            pressed: true,
        }
    }
}

/// Keypad polled once per port iteration
pub trait Keypad {
    fn read(&mut self) -> KeyReading;
}

/// "What key, if any, is currently pressed" on the input device
///
/// Returns the raw code; 0 means no key.
pub trait KeySource {
    fn active_key(&self) -> u32;
}

/// Input device state the port keeps between polls
#[derive(Clone, Copy, Debug, Default)]
pub struct KeypadState {
    last_key: u32,
    pressed: bool,
}

impl KeypadState {
    /// Feed a sample; returns the raw key of a new press edge
    pub fn update(&mut self, reading: KeyReading) -> Option<u32> {
        if !reading.pressed {
            self.pressed = false;
            return None;
        }
        let edge = !self.pressed || reading.key != self.last_key;
        self.pressed = true;
        self.last_key = reading.key;
        edge.then_some(reading.key)
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

impl KeySource for KeypadState {
    fn active_key(&self) -> u32 {
        if self.pressed {
            self.last_key
        } else {
            0
        }
    }
}

/// Single push button reported as one key
///
/// Pin read errors are logged and read as released.
pub struct ButtonKeypad<P> {
    pin: P,
    key: Key,
    active_low: bool,
}

impl<P: InputPin> ButtonKeypad<P> {
    /// Button that pulls the line low when pressed (BOOT on ESP32 boards)
    pub fn active_low(pin: P, key: Key) -> Self {
        Self {
            pin,
            key,
            active_low: true,
        }
    }

    pub fn active_high(pin: P, key: Key) -> Self {
        Self {
            pin,
            key,
            active_low: false,
        }
    }
}

impl<P: InputPin> Keypad for ButtonKeypad<P> {
    fn read(&mut self) -> KeyReading {
        let level = if self.active_low {
            self.pin.is_low()
        } else {
            self.pin.is_high()
        };
        match level {
            Ok(true) => KeyReading::pressed(self.key),
            Ok(false) => KeyReading::RELEASED,
            Err(err) => {
                log::warn!("keypad read failed: {:?}", err);
                KeyReading::RELEASED
            }
        }
    }
}

/// Keypad fed from another thread or an event loop
///
/// Clones share the same state. Holds at most one key. A press is latched
/// until the next read, so a press and release between two polls still
/// reports the key once.
#[derive(Clone, Debug, Default)]
pub struct SharedKeypad {
    held: Arc<AtomicU32>,
    latched: Arc<AtomicU32>,
}

impl SharedKeypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, key: Key) {
        self.hold_raw(key.raw());
    }

    pub fn release(&self) {
        self.held.store(0, Ordering::Release);
    }

    /// Report a raw code as held, including codes with no [`Key`] constant
    pub fn hold_raw(&self, raw: u32) {
        self.held.store(raw, Ordering::Release);
        self.latched.store(raw, Ordering::Release);
    }
}

impl Keypad for SharedKeypad {
    fn read(&mut self) -> KeyReading {
        let latched = self.latched.swap(0, Ordering::AcqRel);
        match self.held.load(Ordering::Acquire) {
            0 if latched == 0 => KeyReading::RELEASED,
            0 => KeyReading {
                key: latched,
                pressed: true,
            },
            key => KeyReading { key, pressed: true },
        }
    }
}
