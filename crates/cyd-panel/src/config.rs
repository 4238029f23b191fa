//! Panel configuration types and builder

pub use crate::error::{BuilderError, MAX_PANEL_EDGE};

/// Rows per bus transaction used to size the SPI DMA transfer limit.
pub const TRANSFER_ROW_BATCH: u16 = 80;

/// GPIO number as understood by the vendor SDK (`gpio_num_t`).
pub type GpioNum = i32;

/// Pin assignment for the panel signals
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pins {
    /// SPI clock
    pub sclk: GpioNum,
    /// SPI data out (MOSI)
    pub mosi: GpioNum,
    /// SPI data in (MISO), not routed to the bus when the panel is write-only
    pub miso: Option<GpioNum>,
    /// Chip select
    pub cs: GpioNum,
    /// Data/command select
    pub dc: GpioNum,
    /// Backlight enable
    pub backlight: GpioNum,
    /// Panel reset; `None` when shared with another device
    pub reset: Option<GpioNum>,
}

impl Pins {
    fn all(&self) -> impl Iterator<Item = GpioNum> {
        [
            Some(self.sclk),
            Some(self.mosi),
            self.miso,
            Some(self.cs),
            Some(self.dc),
            Some(self.backlight),
            self.reset,
        ]
        .into_iter()
        .flatten()
    }

    fn first_conflict(&self) -> Option<GpioNum> {
        let pins: alloc::vec::Vec<GpioNum> = self.all().collect();
        pins.iter()
            .enumerate()
            .find(|&(i, &pin)| pins[i + 1..].contains(&pin))
            .map(|(_, pin)| *pin)
    }
}

/// Panel resolution in its native orientation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Horizontal pixels
    pub h_res: u16,
    /// Vertical pixels
    pub v_res: u16,
}

impl Resolution {
    /// Create a new resolution with validation
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidResolution` if either edge is zero or
    /// larger than [`MAX_PANEL_EDGE`].
    pub fn new(h_res: u16, v_res: u16) -> Result<Self, BuilderError> {
        if h_res == 0 || v_res == 0 || h_res > MAX_PANEL_EDGE || v_res > MAX_PANEL_EDGE {
            return Err(BuilderError::InvalidResolution { h_res, v_res });
        }
        Ok(Self { h_res, v_res })
    }

    /// Total pixel count
    pub fn pixels(&self) -> usize {
        self.h_res as usize * self.v_res as usize
    }
}

/// Color depth pushed over the bus
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorDepth {
    /// RGB565
    #[default]
    Bpp16,
    /// RGB666, sent as three bytes per pixel
    Bpp18,
}

impl ColorDepth {
    /// Bits per pixel as the panel driver expects them
    pub fn bits_per_pixel(self) -> u8 {
        match self {
            ColorDepth::Bpp16 => 16,
            ColorDepth::Bpp18 => 18,
        }
    }

    /// Bytes occupied by one pixel on the bus
    pub fn bytes_per_pixel(self) -> usize {
        (self.bits_per_pixel() as usize).div_ceil(8)
    }
}

/// Color element order of the panel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RgbOrder {
    /// Red first
    #[default]
    Rgb,
    /// Blue first (CYD ILI9341 modules)
    Bgr,
}

/// Mirroring applied during the orientation step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mirror {
    /// Mirror along the X axis
    pub x: bool,
    /// Mirror along the Y axis
    pub y: bool,
}

/// Bus and panel configuration
///
/// This struct holds every parameter the bring-up sequence consumes.
/// Use `Builder` to create a Config, or [`Config::cyd`] for the board preset.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// SPI host peripheral index (`SPI2_HOST` = 1 on ESP32)
    pub host: u8,
    /// Pin assignment
    pub pins: Pins,
    /// Pixel clock in Hz
    pub pclk_hz: u32,
    /// SPI mode (0..=3)
    pub spi_mode: u8,
    /// Queued color transactions
    pub trans_queue_depth: usize,
    /// Command width in bits
    pub cmd_bits: u8,
    /// Parameter width in bits
    pub param_bits: u8,
    /// Panel resolution
    pub resolution: Resolution,
    /// Color depth
    pub color_depth: ColorDepth,
    /// Color element order
    pub rgb_order: RgbOrder,
    /// Draw buffer height in rows
    pub draw_rows: u16,
    /// Orientation mirroring
    pub mirror: Mirror,
    /// Swap RGB565 bytes before flushing
    pub swap_bytes: bool,
    /// Backlight is lit when the line is driven high
    pub backlight_active_high: bool,
}

impl Config {
    /// ESP32-2432S028R ("Cheap Yellow Display") with its ILI9341 module
    pub fn cyd() -> Self {
        Self {
            host: 1,
            pins: Pins {
                sclk: 14,
                mosi: 13,
                miso: Some(12),
                cs: 15,
                dc: 2,
                backlight: 21,
                reset: None,
            },
            pclk_hz: 40_000_000,
            spi_mode: 0,
            trans_queue_depth: 10,
            cmd_bits: 8,
            param_bits: 8,
            resolution: Resolution {
                h_res: 240,
                v_res: 320,
            },
            color_depth: ColorDepth::Bpp16,
            rgb_order: RgbOrder::Bgr,
            draw_rows: 100,
            mirror: Mirror { x: true, y: true },
            swap_bytes: true,
            backlight_active_high: true,
        }
    }

    /// Largest single SPI transfer the bus must accept
    pub fn max_transfer_size(&self) -> usize {
        self.resolution.h_res as usize
            * TRANSFER_ROW_BATCH as usize
            * self.color_depth.bytes_per_pixel()
    }

    /// Draw buffer length in pixels
    pub fn draw_buffer_len(&self) -> usize {
        self.resolution.h_res as usize * self.draw_rows as usize
    }
}

/// Builder for constructing panel configuration
///
/// Starts from the CYD board values; only the resolution is mandatory.
///
/// # Example
///
/// ```
/// use cyd_panel::{Builder, Resolution};
///
/// let config = Builder::new()
///     .resolution(Resolution::new(240, 320).unwrap())
///     .draw_rows(40)
///     .build()
///     .expect("valid configuration");
/// assert_eq!(config.draw_buffer_len(), 240 * 40);
/// ```
pub struct Builder {
    /// Panel resolution (required)
    resolution: Option<Resolution>,
    /// Everything else, seeded from the board preset
    base: Config,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            resolution: None,
            base: Config::cyd(),
        }
    }
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set panel resolution (required)
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Set SPI host
    pub fn host(mut self, host: u8) -> Self {
        self.base.host = host;
        self
    }

    /// Set pin assignment
    pub fn pins(mut self, pins: Pins) -> Self {
        self.base.pins = pins;
        self
    }

    /// Set pixel clock
    pub fn pclk_hz(mut self, hz: u32) -> Self {
        self.base.pclk_hz = hz;
        self
    }

    /// Set SPI mode
    pub fn spi_mode(mut self, mode: u8) -> Self {
        self.base.spi_mode = mode & 0x03;
        self
    }

    /// Set color depth
    pub fn color_depth(mut self, depth: ColorDepth) -> Self {
        self.base.color_depth = depth;
        self
    }

    /// Set color element order
    pub fn rgb_order(mut self, order: RgbOrder) -> Self {
        self.base.rgb_order = order;
        self
    }

    /// Set draw buffer height in rows
    pub fn draw_rows(mut self, rows: u16) -> Self {
        self.base.draw_rows = rows;
        self
    }

    /// Set orientation mirroring
    pub fn mirror(mut self, x: bool, y: bool) -> Self {
        self.base.mirror = Mirror { x, y };
        self
    }

    /// Swap RGB565 bytes before flushing
    pub fn swap_bytes(mut self, swap: bool) -> Self {
        self.base.swap_bytes = swap;
        self
    }

    /// Set backlight polarity
    pub fn backlight_active_high(mut self, active_high: bool) -> Self {
        self.base.backlight_active_high = active_high;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// - `BuilderError::MissingResolution` if the resolution was not set
    /// - `BuilderError::InvalidDrawRows` if the draw buffer has no rows or is
    ///   taller than the panel
    /// - `BuilderError::InvalidClock` for a zero pixel clock
    /// - `BuilderError::PinConflict` when one GPIO drives two signals
    pub fn build(self) -> Result<Config, BuilderError> {
        let resolution = self.resolution.ok_or(BuilderError::MissingResolution)?;
        let config = Config {
            resolution,
            ..self.base
        };
        if config.draw_rows == 0 || config.draw_rows > resolution.v_res {
            return Err(BuilderError::InvalidDrawRows {
                rows: config.draw_rows,
                v_res: resolution.v_res,
            });
        }
        if config.pclk_hz == 0 {
            return Err(BuilderError::InvalidClock);
        }
        if let Some(pin) = config.pins.first_conflict() {
            return Err(BuilderError::PinConflict { pin });
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyd_preset_matches_board() {
        let config = Config::cyd();
        assert_eq!(config.pins.backlight, 21);
        assert_eq!(config.pins.cs, 15);
        assert_eq!(config.resolution, Resolution::new(240, 320).unwrap());
        assert_eq!(config.color_depth.bits_per_pixel(), 16);
        assert_eq!(config.mirror, Mirror { x: true, y: true });
    }

    #[test]
    fn transfer_size_uses_row_batch() {
        let config = Config::cyd();
        assert_eq!(config.max_transfer_size(), 240 * 80 * 2);

        let deep = Builder::new()
            .resolution(Resolution::new(240, 320).unwrap())
            .color_depth(ColorDepth::Bpp18)
            .build()
            .unwrap();
        assert_eq!(deep.max_transfer_size(), 240 * 80 * 3);
    }

    #[test]
    fn draw_buffer_len_is_width_times_rows() {
        assert_eq!(Config::cyd().draw_buffer_len(), 240 * 100);
    }

    #[test]
    fn builder_requires_resolution() {
        assert_eq!(
            Builder::new().build().unwrap_err(),
            BuilderError::MissingResolution
        );
    }

    #[test]
    fn builder_rejects_tall_draw_buffer() {
        let err = Builder::new()
            .resolution(Resolution::new(240, 64).unwrap())
            .draw_rows(100)
            .build()
            .unwrap_err();
        assert_eq!(err, BuilderError::InvalidDrawRows { rows: 100, v_res: 64 });
    }

    #[test]
    fn builder_rejects_shared_pins() {
        let mut pins = Config::cyd().pins;
        pins.dc = pins.cs;
        let err = Builder::new()
            .resolution(Resolution::new(240, 320).unwrap())
            .pins(pins)
            .build()
            .unwrap_err();
        assert_eq!(err, BuilderError::PinConflict { pin: 15 });
    }

    #[test]
    fn resolution_bounds() {
        assert!(Resolution::new(0, 320).is_err());
        assert!(Resolution::new(240, MAX_PANEL_EDGE + 1).is_err());
        assert_eq!(Resolution::new(240, 320).unwrap().pixels(), 76_800);
    }
}
