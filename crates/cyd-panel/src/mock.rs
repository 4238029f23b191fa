//! Host-side doubles for the hardware seams.
//!
//! `MockBackend` records every vendor call in order and can fail any of them
//! with a chosen code. `MockPin` is a shared-state GPIO for embedded-hal
//! consumers, and `MockFlush` keeps a copy of everything flushed to the panel.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

use crate::backend::{BusConfig, PanelBackend, PanelDevConfig, PanelIoConfig, PortGeometry};
use crate::backlight::Backlight;
use crate::config::{GpioNum, Mirror};
use crate::error::ErrorCode;
use crate::flush::{Area, FlushTarget};

/// One recorded vendor call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    EnableBacklight,
    InitBus,
    AttachPanelIo,
    AttachPanelDriver,
    ResetPanel,
    InitPanel,
    Mirror,
    PowerOn,
    AttachFlush,
}

/// Recording, fault-injecting [`PanelBackend`]
#[derive(Default)]
pub struct MockBackend {
    calls: Vec<Call>,
    faults: Vec<(Call, ErrorCode)>,
    bus_claimed_elsewhere: bool,
    backlight: Option<Backlight<MockPin>>,
    bus: Option<BusConfig>,
    io: Option<PanelIoConfig>,
    dev: Option<PanelDevConfig>,
    mirror: Option<Mirror>,
    powered: bool,
    frame: Option<Rc<RefCell<Frame>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `call` fail with `code`
    pub fn fail_at(mut self, call: Call, code: ErrorCode) -> Self {
        self.faults.push((call, code));
        self
    }

    /// Pretend another driver already owns the SPI host
    pub fn with_claimed_bus(mut self) -> Self {
        self.bus_claimed_elsewhere = true;
        self
    }

    /// Calls made so far, in order
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Bus parameters received by `init_bus`
    pub fn bus(&self) -> Option<&BusConfig> {
        self.bus.as_ref()
    }

    /// IO parameters received by `attach_panel_io`
    pub fn panel_io(&self) -> Option<&PanelIoConfig> {
        self.io.as_ref()
    }

    /// Controller parameters received by `attach_panel_driver`
    pub fn panel_dev(&self) -> Option<&PanelDevConfig> {
        self.dev.as_ref()
    }

    /// Orientation applied by `mirror`
    pub fn applied_mirror(&self) -> Option<Mirror> {
        self.mirror
    }

    /// Whether the panel output was switched on
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Level of the backlight line, if it was configured
    pub fn backlight_level(&self) -> Option<bool> {
        self.backlight.as_ref().and_then(|b| b.pin().level())
    }

    /// Frame shared with the flush target handed out by `attach_flush`
    pub fn frame(&self) -> Option<Rc<RefCell<Frame>>> {
        self.frame.clone()
    }

    fn enter(&mut self, call: Call) -> Result<(), ErrorCode> {
        self.calls.push(call);
        match self.faults.iter().find(|(c, _)| *c == call) {
            Some((_, code)) => Err(*code),
            None => Ok(()),
        }
    }

    fn require(ready: bool) -> Result<(), ErrorCode> {
        if ready {
            Ok(())
        } else {
            Err(ErrorCode::INVALID_STATE)
        }
    }
}

impl PanelBackend for MockBackend {
    type Flush = MockFlush;

    fn enable_backlight(&mut self, _pin: GpioNum, active_high: bool) -> Result<(), ErrorCode> {
        self.enter(Call::EnableBacklight)?;
        let mut backlight = Backlight::new(MockPin::new(), active_high);
        backlight.enable()?;
        self.backlight = Some(backlight);
        Ok(())
    }

    fn init_bus(&mut self, bus: &BusConfig) -> Result<(), ErrorCode> {
        self.enter(Call::InitBus)?;
        if self.bus_claimed_elsewhere || self.bus.is_some() {
            return Err(ErrorCode::INVALID_STATE);
        }
        if bus.max_transfer_size == 0 {
            return Err(ErrorCode::INVALID_SIZE);
        }
        self.bus = Some(*bus);
        Ok(())
    }

    fn attach_panel_io(&mut self, io: &PanelIoConfig) -> Result<(), ErrorCode> {
        self.enter(Call::AttachPanelIo)?;
        Self::require(self.bus.is_some())?;
        self.io = Some(*io);
        Ok(())
    }

    fn attach_panel_driver(&mut self, dev: &PanelDevConfig) -> Result<(), ErrorCode> {
        self.enter(Call::AttachPanelDriver)?;
        Self::require(self.io.is_some())?;
        self.dev = Some(*dev);
        Ok(())
    }

    fn reset_panel(&mut self) -> Result<(), ErrorCode> {
        self.enter(Call::ResetPanel)?;
        Self::require(self.dev.is_some())
    }

    fn init_panel(&mut self) -> Result<(), ErrorCode> {
        self.enter(Call::InitPanel)?;
        Self::require(self.dev.is_some())
    }

    fn mirror(&mut self, mirror: Mirror) -> Result<(), ErrorCode> {
        self.enter(Call::Mirror)?;
        Self::require(self.dev.is_some())?;
        self.mirror = Some(mirror);
        Ok(())
    }

    fn power_on(&mut self) -> Result<(), ErrorCode> {
        self.enter(Call::PowerOn)?;
        Self::require(self.dev.is_some())?;
        self.powered = true;
        Ok(())
    }

    fn attach_flush(&mut self, geometry: &PortGeometry) -> Result<MockFlush, ErrorCode> {
        self.enter(Call::AttachFlush)?;
        Self::require(self.powered)?;
        let frame = Rc::new(RefCell::new(Frame::new(geometry.width, geometry.height)));
        self.frame = Some(frame.clone());
        Ok(MockFlush { frame })
    }
}

/// Panel memory as seen through the mock flush path
#[derive(Debug)]
pub struct Frame {
    width: u16,
    height: u16,
    pixels: Vec<u16>,
    flushes: Vec<Area>,
}

impl Frame {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            flushes: Vec::new(),
        }
    }

    /// Panel width
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Panel height
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Raw pixel as it was sent over the bus
    pub fn pixel(&self, x: u16, y: u16) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Every flushed area, oldest first
    pub fn flushes(&self) -> &[Area] {
        &self.flushes
    }

    /// Forget the recorded flush areas
    pub fn clear_flushes(&mut self) {
        self.flushes.clear();
    }
}

/// Flush target writing into a shared [`Frame`]
pub struct MockFlush {
    frame: Rc<RefCell<Frame>>,
}

impl MockFlush {
    /// Standalone flush target for a `width` x `height` panel
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            frame: Rc::new(RefCell::new(Frame::new(width, height))),
        }
    }

    /// Shared frame handle
    pub fn frame(&self) -> Rc<RefCell<Frame>> {
        self.frame.clone()
    }
}

impl FlushTarget for MockFlush {
    type Error = ErrorCode;

    fn flush(&mut self, area: Area, pixels: &[u16]) -> Result<(), ErrorCode> {
        let mut frame = self.frame.borrow_mut();
        if area.x1 > frame.width || area.y1 > frame.height || pixels.len() < area.pixels() {
            return Err(ErrorCode::INVALID_ARG);
        }
        let band_width = (area.x1 - area.x0) as usize;
        let frame_width = frame.width as usize;
        for (row, chunk) in pixels
            .chunks(band_width)
            .take((area.y1 - area.y0) as usize)
            .enumerate()
        {
            let start = (area.y0 as usize + row) * frame_width + area.x0 as usize;
            frame.pixels[start..start + band_width].copy_from_slice(chunk);
        }
        frame.flushes.push(area);
        Ok(())
    }
}

/// Error reported by a failing [`MockPin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl embedded_hal::digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// GPIO double; clones share the same line
#[derive(Clone, Debug, Default)]
pub struct MockPin {
    level: Rc<Cell<Option<bool>>>,
    failing: bool,
}

impl MockPin {
    /// Unconfigured line (`level()` is `None` until driven)
    pub fn new() -> Self {
        Self::default()
    }

    /// Line whose every operation fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Current level
    pub fn level(&self) -> Option<bool> {
        self.level.get()
    }

    /// Force the level seen by readers
    pub fn set_level(&self, high: bool) {
        self.level.set(Some(high));
    }

    fn drive(&mut self, high: bool) -> Result<(), MockPinError> {
        if self.failing {
            return Err(MockPinError);
        }
        self.level.set(Some(high));
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.failing {
            return Err(MockPinError);
        }
        Ok(self.level.get().unwrap_or(false))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn out_of_order_call_is_rejected() {
        let mut backend = MockBackend::new();
        let io = PanelIoConfig::from_config(&Config::cyd());
        assert_eq!(
            backend.attach_panel_io(&io).unwrap_err(),
            ErrorCode::INVALID_STATE
        );
    }

    #[test]
    fn claimed_bus_fails_init() {
        let mut backend = MockBackend::new().with_claimed_bus();
        let bus = BusConfig::from_config(&Config::cyd());
        assert_eq!(backend.init_bus(&bus).unwrap_err(), ErrorCode::INVALID_STATE);
        assert_eq!(backend.calls(), &[Call::InitBus]);
    }

    #[test]
    fn flush_copies_band_into_frame() {
        let mut flush = MockFlush::new(4, 4);
        let area = Area {
            x0: 0,
            y0: 2,
            x1: 4,
            y1: 3,
        };
        flush.flush(area, &[7; 4]).unwrap();
        let frame = flush.frame();
        let frame = frame.borrow();
        assert_eq!(frame.pixel(3, 2), Some(7));
        assert_eq!(frame.pixel(3, 1), Some(0));
        assert_eq!(frame.flushes(), &[area]);
    }

    #[test]
    fn flush_rejects_short_pixel_slice() {
        let mut flush = MockFlush::new(4, 4);
        let area = Area {
            x0: 0,
            y0: 0,
            x1: 4,
            y1: 2,
        };
        assert_eq!(flush.flush(area, &[0; 3]).unwrap_err(), ErrorCode::INVALID_ARG);
    }

    #[test]
    fn pin_clones_share_level() {
        let pin = MockPin::new();
        let mut reader = pin.clone();
        pin.set_level(true);
        assert!(reader.is_high().unwrap());
    }
}
