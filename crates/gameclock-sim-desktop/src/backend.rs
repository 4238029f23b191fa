//! Host stand-in for the ESP-IDF panel backend

use std::cell::RefCell;
use std::rc::Rc;

use cyd_panel::{
    Area, BusConfig, ErrorCode, FlushTarget, GpioNum, Mirror, PanelBackend, PanelDevConfig,
    PanelIoConfig, PortGeometry, Resolution,
};
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::SimulatorDisplay;

pub type SharedDisplay = Rc<RefCell<SimulatorDisplay<Rgb565>>>;

/// Walks the bring-up steps against an SDL framebuffer
///
/// Every step succeeds once, in order; a repeated bus claim reports
/// `INVALID_STATE` like the vendor driver.
pub struct SimBackend {
    display: SharedDisplay,
    bus_claimed: bool,
    panel_ready: bool,
    mirror: Mirror,
}

impl SimBackend {
    pub fn new(resolution: Resolution) -> Self {
        let size = Size::new(resolution.h_res as u32, resolution.v_res as u32);
        Self {
            display: Rc::new(RefCell::new(SimulatorDisplay::new(size))),
            bus_claimed: false,
            panel_ready: false,
            mirror: Mirror::default(),
        }
    }

    pub fn display(&self) -> SharedDisplay {
        Rc::clone(&self.display)
    }
}

impl PanelBackend for SimBackend {
    type Flush = SimFlush;

    fn enable_backlight(&mut self, pin: GpioNum, active_high: bool) -> Result<(), ErrorCode> {
        log::debug!("sim: backlight GPIO{} active_high={}", pin, active_high);
        Ok(())
    }

    fn init_bus(&mut self, bus: &BusConfig) -> Result<(), ErrorCode> {
        if self.bus_claimed {
            return Err(ErrorCode::INVALID_STATE);
        }
        log::debug!("sim: bus {:?}", bus);
        self.bus_claimed = true;
        Ok(())
    }

    fn attach_panel_io(&mut self, io: &PanelIoConfig) -> Result<(), ErrorCode> {
        if !self.bus_claimed {
            return Err(ErrorCode::INVALID_STATE);
        }
        log::debug!("sim: panel io {:?}", io);
        Ok(())
    }

    fn attach_panel_driver(&mut self, dev: &PanelDevConfig) -> Result<(), ErrorCode> {
        log::debug!("sim: panel {:?}", dev);
        Ok(())
    }

    fn reset_panel(&mut self) -> Result<(), ErrorCode> {
        self.display.borrow_mut().clear(Rgb565::BLACK).ok();
        Ok(())
    }

    fn init_panel(&mut self) -> Result<(), ErrorCode> {
        self.panel_ready = true;
        Ok(())
    }

    fn mirror(&mut self, mirror: Mirror) -> Result<(), ErrorCode> {
        // The window already shows the panel the right way up.
        self.mirror = mirror;
        Ok(())
    }

    fn power_on(&mut self) -> Result<(), ErrorCode> {
        if !self.panel_ready {
            return Err(ErrorCode::INVALID_STATE);
        }
        Ok(())
    }

    fn attach_flush(&mut self, geometry: &PortGeometry) -> Result<SimFlush, ErrorCode> {
        log::debug!("sim: mirror {:?} ignored on screen", self.mirror);
        Ok(SimFlush {
            display: Rc::clone(&self.display),
            swapped: geometry.swap_bytes,
        })
    }
}

/// Writes flushed bands into the simulator framebuffer
pub struct SimFlush {
    display: SharedDisplay,
    swapped: bool,
}

impl FlushTarget for SimFlush {
    type Error = ErrorCode;

    fn flush(&mut self, area: Area, pixels: &[u16]) -> Result<(), ErrorCode> {
        if pixels.len() < area.pixels() {
            return Err(ErrorCode::INVALID_SIZE);
        }
        let swapped = self.swapped;
        let rect = area.to_rectangle();
        let colors = pixels.iter().map(|&raw| {
            let raw = if swapped { raw.swap_bytes() } else { raw };
            Rgb565::from(RawU16::new(raw))
        });
        self.display
            .borrow_mut()
            .fill_contiguous(&rect, colors)
            .map_err(|_| ErrorCode::FAIL)
    }
}
