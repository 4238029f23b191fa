//! ESP-IDF `esp_lcd` backend for the CYD ILI9341 panel

use core::ffi::c_void;
use core::ptr;
use core::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_svc::sys;

use cyd_panel::{
    Area, Backlight, BusConfig, ErrorCode, FlushTarget, GpioNum, Mirror, PanelBackend,
    PanelDevConfig, PanelIoConfig, PortGeometry, RgbOrder,
};

type BacklightPin = PinDriver<'static, AnyOutputPin, Output>;

/// Upper bound for one band to leave the SPI queue
const FLUSH_TIMEOUT: Duration = Duration::from_millis(500);

extern "C" {
    fn esp_lcd_new_panel_ili9341(
        io: sys::esp_lcd_panel_io_handle_t,
        panel_dev_config: *const sys::esp_lcd_panel_dev_config_t,
        ret_panel: *mut sys::esp_lcd_panel_handle_t,
    ) -> sys::esp_err_t;
}

/// Set from the SPI ISR once the last color transaction of a band is out.
static COLOR_TRANS_DONE: AtomicBool = AtomicBool::new(true);

unsafe extern "C" fn on_color_trans_done(
    _io: sys::esp_lcd_panel_io_handle_t,
    _edata: *mut sys::esp_lcd_panel_io_event_data_t,
    _user_ctx: *mut c_void,
) -> bool {
    COLOR_TRANS_DONE.store(true, Ordering::Release);
    false
}

fn check(code: sys::esp_err_t) -> Result<(), ErrorCode> {
    if code == sys::ESP_OK {
        Ok(())
    } else {
        Err(ErrorCode(code))
    }
}

/// Bus, panel IO and ILI9341 driver over `esp_lcd`
///
/// Owns the backlight pin until the flush target is attached; the pin then
/// moves along so the line stays driven for the life of the port.
pub struct EspBackend {
    backlight_pin: Option<BacklightPin>,
    backlight: Option<Backlight<BacklightPin>>,
    host: Option<sys::spi_host_device_t>,
    io: sys::esp_lcd_panel_io_handle_t,
    panel: sys::esp_lcd_panel_handle_t,
}

impl EspBackend {
    pub fn new(backlight_pin: BacklightPin) -> Self {
        Self {
            backlight_pin: Some(backlight_pin),
            backlight: None,
            host: None,
            io: ptr::null_mut(),
            panel: ptr::null_mut(),
        }
    }

    fn panel(&self) -> Result<sys::esp_lcd_panel_handle_t, ErrorCode> {
        if self.panel.is_null() {
            Err(ErrorCode::INVALID_STATE)
        } else {
            Ok(self.panel)
        }
    }
}

impl PanelBackend for EspBackend {
    type Flush = EspFlush;

    fn enable_backlight(&mut self, pin: GpioNum, active_high: bool) -> Result<(), ErrorCode> {
        let driver = self.backlight_pin.take().ok_or(ErrorCode::INVALID_STATE)?;
        if driver.pin() != pin {
            log::error!("backlight wired to GPIO{}, config says GPIO{}", driver.pin(), pin);
            return Err(ErrorCode::INVALID_ARG);
        }
        let mut backlight = Backlight::new(driver, active_high);
        backlight.enable()?;
        self.backlight = Some(backlight);
        Ok(())
    }

    fn init_bus(&mut self, bus: &BusConfig) -> Result<(), ErrorCode> {
        let host = bus.host as sys::spi_host_device_t;
        let mut bus_cfg = sys::spi_bus_config_t::default();
        bus_cfg.__bindgen_anon_1.mosi_io_num = bus.mosi;
        bus_cfg.__bindgen_anon_2.miso_io_num = bus.miso.unwrap_or(-1);
        bus_cfg.__bindgen_anon_3.quadwp_io_num = -1;
        bus_cfg.__bindgen_anon_4.quadhd_io_num = -1;
        bus_cfg.sclk_io_num = bus.sclk;
        bus_cfg.max_transfer_sz = i32::try_from(bus.max_transfer_size)
            .map_err(|_| ErrorCode::INVALID_SIZE)?;

        check(unsafe {
            sys::spi_bus_initialize(host, &bus_cfg, sys::spi_common_dma_t_SPI_DMA_CH_AUTO)
        })?;
        self.host = Some(host);
        Ok(())
    }

    fn attach_panel_io(&mut self, io: &PanelIoConfig) -> Result<(), ErrorCode> {
        let host = self.host.ok_or(ErrorCode::INVALID_STATE)?;
        let io_cfg = sys::esp_lcd_panel_io_spi_config_t {
            cs_gpio_num: io.cs,
            dc_gpio_num: io.dc,
            spi_mode: io.spi_mode as i32,
            pclk_hz: io.pclk_hz,
            trans_queue_depth: io.trans_queue_depth,
            on_color_trans_done: Some(on_color_trans_done),
            user_ctx: ptr::null_mut(),
            lcd_cmd_bits: io.cmd_bits as i32,
            lcd_param_bits: io.param_bits as i32,
            ..Default::default()
        };

        let mut handle: sys::esp_lcd_panel_io_handle_t = ptr::null_mut();
        check(unsafe {
            sys::esp_lcd_new_panel_io_spi(
                host as sys::esp_lcd_spi_bus_handle_t,
                &io_cfg,
                &mut handle,
            )
        })?;
        self.io = handle;
        Ok(())
    }

    fn attach_panel_driver(&mut self, dev: &PanelDevConfig) -> Result<(), ErrorCode> {
        if self.io.is_null() {
            return Err(ErrorCode::INVALID_STATE);
        }
        let mut panel_cfg = sys::esp_lcd_panel_dev_config_t {
            reset_gpio_num: dev.reset.unwrap_or(-1),
            bits_per_pixel: dev.color_depth.bits_per_pixel() as u32,
            ..Default::default()
        };
        panel_cfg.__bindgen_anon_1.rgb_ele_order = match dev.rgb_order {
            RgbOrder::Rgb => sys::lcd_rgb_element_order_t_LCD_RGB_ELEMENT_ORDER_RGB,
            RgbOrder::Bgr => sys::lcd_rgb_element_order_t_LCD_RGB_ELEMENT_ORDER_BGR,
        };

        let mut handle: sys::esp_lcd_panel_handle_t = ptr::null_mut();
        check(unsafe { esp_lcd_new_panel_ili9341(self.io, &panel_cfg, &mut handle) })?;
        self.panel = handle;
        Ok(())
    }

    fn reset_panel(&mut self) -> Result<(), ErrorCode> {
        let panel = self.panel()?;
        check(unsafe { sys::esp_lcd_panel_reset(panel) })
    }

    fn init_panel(&mut self) -> Result<(), ErrorCode> {
        let panel = self.panel()?;
        check(unsafe { sys::esp_lcd_panel_init(panel) })
    }

    fn mirror(&mut self, mirror: Mirror) -> Result<(), ErrorCode> {
        let panel = self.panel()?;
        check(unsafe { sys::esp_lcd_panel_mirror(panel, mirror.x, mirror.y) })
    }

    fn power_on(&mut self) -> Result<(), ErrorCode> {
        let panel = self.panel()?;
        check(unsafe { sys::esp_lcd_panel_disp_on_off(panel, true) })
    }

    fn attach_flush(&mut self, geometry: &PortGeometry) -> Result<EspFlush, ErrorCode> {
        let panel = self.panel()?;
        log::info!(
            "esp_lcd: {}x{} port, {} rows per band",
            geometry.width,
            geometry.height,
            geometry.draw_rows
        );
        Ok(EspFlush {
            panel,
            _io: self.io,
            _backlight: self.backlight.take(),
        })
    }
}

/// Flush target pushing bands through `esp_lcd_panel_draw_bitmap`
pub struct EspFlush {
    panel: sys::esp_lcd_panel_handle_t,
    _io: sys::esp_lcd_panel_io_handle_t,
    _backlight: Option<Backlight<BacklightPin>>,
}

// The handles are only touched by whoever holds the rendering port lock.
unsafe impl Send for EspFlush {}

impl FlushTarget for EspFlush {
    type Error = ErrorCode;

    fn flush(&mut self, area: Area, pixels: &[u16]) -> Result<(), ErrorCode> {
        if pixels.len() < area.pixels() {
            return Err(ErrorCode::INVALID_SIZE);
        }
        COLOR_TRANS_DONE.store(false, Ordering::Release);
        let drawn = check(unsafe {
            sys::esp_lcd_panel_draw_bitmap(
                self.panel,
                area.x0 as i32,
                area.y0 as i32,
                area.x1 as i32,
                area.y1 as i32,
                pixels.as_ptr() as *const c_void,
            )
        });
        if let Err(code) = drawn {
            COLOR_TRANS_DONE.store(true, Ordering::Release);
            return Err(code);
        }

        // The draw buffer is reused for the next band as soon as we return.
        let started = Instant::now();
        while !COLOR_TRANS_DONE.load(Ordering::Acquire) {
            if started.elapsed() > FLUSH_TIMEOUT {
                return Err(ErrorCode::TIMEOUT);
            }
            std::thread::yield_now();
        }
        Ok(())
    }
}
