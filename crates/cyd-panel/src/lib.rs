//! Bring-up contract for SPI TFT panels.
//!
//! The crate is the leaf of the display stack: it knows how to describe a bus,
//! a panel IO channel and a panel controller, and defines the trait a vendor
//! SDK implements to perform each hardware step. It owns no UI state.
//!
//! ## Modules
//!
//! - [`config`] - pin assignment, resolution, color depth, builder
//! - [`backend`] - [`PanelBackend`] and the per-step parameter records
//! - [`flush`] - draw buffer and the flush path to the panel
//! - [`backlight`] - backlight line over embedded-hal
//! - [`error`] - vendor status codes and builder errors
//! - [`mock`] - host doubles for tests and simulators

#![cfg_attr(not(any(feature = "std", test)), no_std)]
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

extern crate alloc;

pub mod backend;
pub mod backlight;
pub mod config;
pub mod error;
pub mod flush;
pub mod mock;

pub use backend::{BusConfig, PanelBackend, PanelDevConfig, PanelIoConfig, PortGeometry};
pub use backlight::Backlight;
pub use config::{
    Builder, ColorDepth, Config, GpioNum, Mirror, Pins, Resolution, RgbOrder, TRANSFER_ROW_BATCH,
};
pub use error::{BuilderError, ErrorCode, MAX_PANEL_EDGE};
pub use flush::{Area, DrawBuffer, FlushTarget};
