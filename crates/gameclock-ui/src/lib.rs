//! Display bring-up and screen framework for the CYD game clock.
//! Runs on the ESP32 firmware, the desktop simulator and host tests.
//!
//! Start-up order: [`bringup::bring_up`] drives the panel through its
//! hardware handshake and returns a [`port::RenderingPort`]; the port owns
//! the [`port::Ui`] context (widgets, styles, dispatcher) and from then on is
//! the only source of [`event::SystemEvent`]s.

#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::unreachable,
        clippy::unwrap_used
    )
)]

pub mod app;
pub mod bringup;
pub mod dispatcher;
pub mod event;
pub mod focus;
pub mod input;
pub mod main_screen;
pub mod port;
pub mod render;
pub mod screen;
pub mod style;
pub mod test_display;
pub mod widget;

pub use bringup::{bring_up, BringupError, BringupState, Sequencer, Stage};
pub use dispatcher::Dispatcher;
pub use event::{EventCode, EventKind, SystemEvent};
pub use input::{ButtonKeypad, Key, KeyReading, KeySource, Keypad, SharedKeypad};
pub use main_screen::MainScreen;
pub use port::{LoadAnim, PortGuard, RenderingPort, Ui};
pub use screen::ScreenCapability;
pub use style::{StyleRecord, StyleRegistry, StyleRole};
pub use widget::{ScreenHandle, State, WidgetError, WidgetId, WidgetTree};

/// Panel width of the CYD in its mounted orientation
pub const DISPLAY_WIDTH: u32 = 240;
/// Panel height of the CYD in its mounted orientation
pub const DISPLAY_HEIGHT: u32 = 320;
