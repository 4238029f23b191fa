//! Hardware backend abstraction
//!
//! This module provides the [`PanelBackend`] trait, the narrow contract between
//! the bring-up sequence and the vendor bus/panel primitives, together with the
//! per-step parameter records derived from a [`Config`].
//!
//! ## Hardware Requirements
//!
//! A backend drives:
//! - one SPI bus (SCLK + MOSI, MISO optional)
//! - a panel IO channel on that bus (CS + DC)
//! - the panel controller itself (ILI9341 on the CYD)
//! - the backlight GPIO
//!
//! ## Example
//!
//! ```rust,ignore
//! use cyd_panel::{BusConfig, Config, PanelBackend};
//!
//! let config = Config::cyd();
//! backend.enable_backlight(config.pins.backlight, config.backlight_active_high)?;
//! backend.init_bus(&BusConfig::from_config(&config))?;
//! ```

use crate::config::{ColorDepth, Config, GpioNum, Mirror, RgbOrder};
use crate::error::ErrorCode;
use crate::flush::FlushTarget;

/// Bus parameters for the bus-init step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusConfig {
    /// SPI host peripheral index
    pub host: u8,
    /// Clock line
    pub sclk: GpioNum,
    /// Data out line
    pub mosi: GpioNum,
    /// Data in line; the panel is write-only so this is normally `None`
    pub miso: Option<GpioNum>,
    /// Largest single transfer in bytes
    pub max_transfer_size: usize,
}

impl BusConfig {
    /// Derive bus parameters from the panel configuration
    ///
    /// MISO is left unrouted; the panel is never read back.
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.host,
            sclk: config.pins.sclk,
            mosi: config.pins.mosi,
            miso: None,
            max_transfer_size: config.max_transfer_size(),
        }
    }
}

/// Command/parameter channel bound to the bus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelIoConfig {
    /// Chip select line
    pub cs: GpioNum,
    /// Data/command line
    pub dc: GpioNum,
    /// SPI mode
    pub spi_mode: u8,
    /// Pixel clock in Hz
    pub pclk_hz: u32,
    /// Queued color transactions
    pub trans_queue_depth: usize,
    /// Command width in bits
    pub cmd_bits: u8,
    /// Parameter width in bits
    pub param_bits: u8,
}

impl PanelIoConfig {
    /// Derive the IO channel parameters from the panel configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            cs: config.pins.cs,
            dc: config.pins.dc,
            spi_mode: config.spi_mode,
            pclk_hz: config.pclk_hz,
            trans_queue_depth: config.trans_queue_depth,
            cmd_bits: config.cmd_bits,
            param_bits: config.param_bits,
        }
    }
}

/// Panel controller parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelDevConfig {
    /// Reset line, `None` when the controller is reset over the bus
    pub reset: Option<GpioNum>,
    /// Color element order
    pub rgb_order: RgbOrder,
    /// Color depth
    pub color_depth: ColorDepth,
}

impl PanelDevConfig {
    /// Derive the controller parameters from the panel configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            reset: config.pins.reset,
            rgb_order: config.rgb_order,
            color_depth: config.color_depth,
        }
    }
}

/// Geometry handed to the compositor when the rendering port is attached
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortGeometry {
    /// Horizontal resolution
    pub width: u16,
    /// Vertical resolution
    pub height: u16,
    /// Rows per draw buffer band
    pub draw_rows: u16,
    /// Swap RGB565 bytes before flushing
    pub swap_bytes: bool,
}

impl PortGeometry {
    /// Derive the port geometry from the panel configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            width: config.resolution.h_res,
            height: config.resolution.v_res,
            draw_rows: config.draw_rows,
            swap_bytes: config.swap_bytes,
        }
    }
}

/// Vendor primitives used by the bring-up sequence
///
/// Every method maps to exactly one vendor call (or a tight group of calls
/// that the vendor treats as one step) and reports the vendor status code on
/// failure. Methods are called at most once, in declaration order; the
/// backend is not required to support any other order.
///
/// ## Implementing
///
/// The firmware implements this over ESP-IDF `esp_lcd`; host tests use
/// [`MockBackend`](crate::mock::MockBackend).
pub trait PanelBackend {
    /// Flush target produced once the panel is ready
    type Flush: FlushTarget;

    /// Configure the backlight pin as output and drive it to its active level
    fn enable_backlight(&mut self, pin: GpioNum, active_high: bool) -> Result<(), ErrorCode>;

    /// Configure and claim the bus
    ///
    /// # Errors
    ///
    /// Typically `INVALID_STATE` when the bus is already claimed and
    /// `INVALID_SIZE`/`INVALID_ARG` for an unusable transfer size.
    fn init_bus(&mut self, bus: &BusConfig) -> Result<(), ErrorCode>;

    /// Bind the command/parameter channel to the bus
    fn attach_panel_io(&mut self, io: &PanelIoConfig) -> Result<(), ErrorCode>;

    /// Instantiate the panel controller driver over the IO channel
    fn attach_panel_driver(&mut self, dev: &PanelDevConfig) -> Result<(), ErrorCode>;

    /// Reset the panel controller
    fn reset_panel(&mut self) -> Result<(), ErrorCode>;

    /// Run the controller's init command table
    fn init_panel(&mut self) -> Result<(), ErrorCode>;

    /// Apply mounting orientation
    fn mirror(&mut self, mirror: Mirror) -> Result<(), ErrorCode>;

    /// Switch the panel output on
    fn power_on(&mut self) -> Result<(), ErrorCode>;

    /// Hand out the flush target the compositor draws through
    fn attach_flush(&mut self, geometry: &PortGeometry) -> Result<Self::Flush, ErrorCode>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_config_leaves_miso_unrouted() {
        let bus = BusConfig::from_config(&Config::cyd());
        assert_eq!(bus.miso, None);
        assert_eq!(bus.sclk, 14);
        assert_eq!(bus.mosi, 13);
        assert_eq!(bus.max_transfer_size, 240 * 80 * 2);
    }

    #[test]
    fn io_config_uses_fixed_bit_widths() {
        let io = PanelIoConfig::from_config(&Config::cyd());
        assert_eq!((io.cmd_bits, io.param_bits), (8, 8));
        assert_eq!((io.cs, io.dc), (15, 2));
        assert_eq!(io.pclk_hz, 40_000_000);
    }

    #[test]
    fn dev_config_carries_color_format() {
        let dev = PanelDevConfig::from_config(&Config::cyd());
        assert_eq!(dev.rgb_order, RgbOrder::Bgr);
        assert_eq!(dev.color_depth.bits_per_pixel(), 16);
        assert_eq!(dev.reset, None);
    }
}
