//! Error types for the adapter
//!
//! This module defines the vendor status code returned by every hardware step
//! ([`ErrorCode`]) and the configuration errors reported by the builder
//! ([`BuilderError`]).
//!
//! ## Example
//!
//! ```
//! use cyd_panel::{Builder, BuilderError, Resolution};
//!
//! // Missing resolution
//! let result = Builder::new().build();
//! assert!(matches!(result, Err(BuilderError::MissingResolution)));
//!
//! // Invalid resolution
//! let result = Resolution::new(0, 320);
//! assert!(result.is_err());
//! ```

/// Largest panel edge accepted by the builder.
///
/// The ILI9341 GRAM is 240x320; the margin covers the ST7789 family that
/// shares the same SPI command set.
pub const MAX_PANEL_EDGE: u16 = 480;

/// Status code returned by a vendor bus or panel primitive.
///
/// Numbering follows ESP-IDF `esp_err_t` so codes coming from the SDK can be
/// carried through unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    /// Generic failure
    pub const FAIL: Self = Self(-1);
    /// Out of memory
    pub const NO_MEM: Self = Self(0x101);
    /// Invalid argument
    pub const INVALID_ARG: Self = Self(0x102);
    /// Invalid state (e.g. bus already claimed, step out of order)
    pub const INVALID_STATE: Self = Self(0x103);
    /// Invalid size
    pub const INVALID_SIZE: Self = Self(0x104);
    /// Requested resource not found
    pub const NOT_FOUND: Self = Self(0x105);
    /// Operation or feature not supported
    pub const NOT_SUPPORTED: Self = Self(0x106);
    /// Operation timed out
    pub const TIMEOUT: Self = Self(0x107);

    /// Raw numeric value
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Symbolic name for the well-known codes
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::FAIL => "ESP_FAIL",
            Self::NO_MEM => "ESP_ERR_NO_MEM",
            Self::INVALID_ARG => "ESP_ERR_INVALID_ARG",
            Self::INVALID_STATE => "ESP_ERR_INVALID_STATE",
            Self::INVALID_SIZE => "ESP_ERR_INVALID_SIZE",
            Self::NOT_FOUND => "ESP_ERR_NOT_FOUND",
            Self::NOT_SUPPORTED => "ESP_ERR_NOT_SUPPORTED",
            Self::TIMEOUT => "ESP_ERR_TIMEOUT",
            _ => return None,
        };
        Some(name)
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} (0x{:x})", self.0),
            None => write!(f, "error {}", self.0),
        }
    }
}

impl core::error::Error for ErrorCode {}

/// Errors that can occur when building configuration
///
/// These errors occur during the builder pattern before bring-up starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    /// Resolution was not specified
    ///
    /// [`Builder::resolution()`](crate::config::Builder::resolution) must be called before building.
    MissingResolution,
    /// Invalid resolution provided
    ///
    /// See [`Resolution::new()`](crate::config::Resolution::new) for constraints.
    InvalidResolution {
        /// Horizontal resolution requested
        h_res: u16,
        /// Vertical resolution requested
        v_res: u16,
    },
    /// Draw buffer row batch is zero or taller than the panel
    InvalidDrawRows {
        /// Rows requested
        rows: u16,
        /// Panel height
        v_res: u16,
    },
    /// Pixel clock of zero
    InvalidClock,
    /// The same GPIO is assigned to two signals
    PinConflict {
        /// GPIO number used twice
        pin: i32,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BuilderError::MissingResolution => write!(f, "Resolution must be specified"),
            BuilderError::InvalidResolution { h_res, v_res } => write!(
                f,
                "Invalid resolution {h_res}x{v_res} (max {MAX_PANEL_EDGE} per edge)"
            ),
            BuilderError::InvalidDrawRows { rows, v_res } => {
                write!(f, "Invalid draw buffer rows {rows} for panel height {v_res}")
            }
            BuilderError::InvalidClock => write!(f, "Pixel clock must be non-zero"),
            BuilderError::PinConflict { pin } => {
                write!(f, "GPIO {pin} assigned to more than one signal")
            }
        }
    }
}

impl core::error::Error for BuilderError {}
