//! Host-side scenario test harness for scripted start-up and input flows.
//!
//! Boots the full stack (bring-up, rendering port, main screen) against the
//! recording mock backend and reads pixels back from the mock panel memory.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use cyd_panel::mock::{Frame, MockBackend, MockFlush};
use cyd_panel::Config;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use gameclock_ui::port::ANIM_PERIOD_MS;
use gameclock_ui::{
    app, bring_up, BringupError, Key, MainScreen, PortGuard, RenderingPort, ScreenCapability,
    SharedKeypad, WidgetTree,
};
use png::{BitDepth, ColorType, Encoder};

/// Screen callback observed by a [`Recorder`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hook {
    LoadStarted,
    LoadFinished,
    Key(Key),
}

/// Shared log of delivered callbacks
pub type HookLog = Arc<Mutex<Vec<Hook>>>;

/// Wraps a screen and logs every callback before forwarding it
pub struct Recorder<S> {
    inner: S,
    log: HookLog,
}

impl<S> Recorder<S> {
    pub fn new(inner: S, log: HookLog) -> Self {
        Self { inner, log }
    }

    fn record(&self, hook: Hook) {
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(hook);
    }
}

impl<S: ScreenCapability> ScreenCapability for Recorder<S> {
    fn on_load_started(&mut self, widgets: &mut WidgetTree) {
        self.record(Hook::LoadStarted);
        self.inner.on_load_started(widgets);
    }

    fn on_load_finished(&mut self, widgets: &mut WidgetTree) {
        self.record(Hook::LoadFinished);
        self.inner.on_load_finished(widgets);
    }

    fn on_key(&mut self, key: Key, widgets: &mut WidgetTree) {
        self.record(Hook::Key(key));
        self.inner.on_key(key, widgets);
    }
}

/// Couples the rendering port, the mock panel memory and a scripted keypad
pub struct ScenarioHarness {
    port: RenderingPort<MockFlush>,
    frame: Rc<RefCell<Frame>>,
    keypad: SharedKeypad,
    main: MainScreen,
    hooks: HookLog,
    swapped: bool,
}

impl ScenarioHarness {
    /// Bring up the CYD configuration and run the application setup
    pub fn boot() -> Result<Self, BringupError> {
        Self::boot_with(Config::cyd(), MockBackend::new())
    }

    /// Bring up with a caller-provided configuration and backend
    ///
    /// The main screen's capability is wrapped in a [`Recorder`] so tests can
    /// follow the callbacks it receives.
    pub fn boot_with(config: Config, backend: MockBackend) -> Result<Self, BringupError> {
        let swapped = config.swap_bytes;
        let port = bring_up(config, backend)?;
        let frame = port.with_flush(|flush| flush.frame());

        let keypad = SharedKeypad::new();
        port.set_keypad(keypad.clone());

        let hooks = HookLog::default();
        let main = {
            let mut ui = port.lock();
            let main = app::setup(&mut ui).expect("scenario app setup should succeed");
            ui.subscribe(main.root(), Box::new(Recorder::new(main, hooks.clone())))
                .expect("main screen should be live");
            main
        };

        Ok(Self {
            port,
            frame,
            keypad,
            main,
            hooks,
            swapped,
        })
    }

    /// One loop iteration after `elapsed_ms`
    pub fn tick(&mut self, elapsed_ms: u32) -> u32 {
        self.port.handle(elapsed_ms)
    }

    /// Run the loop for `total_ms` in animation-period steps
    pub fn run_for(&mut self, total_ms: u32) {
        let mut remaining = total_ms;
        while remaining > 0 {
            let step = remaining.min(ANIM_PERIOD_MS);
            self.tick(step);
            remaining -= step;
        }
    }

    /// Press and release `key`, one loop iteration each
    pub fn press(&mut self, key: Key) {
        self.keypad.press(key);
        self.tick(ANIM_PERIOD_MS);
        self.keypad.release();
        self.tick(ANIM_PERIOD_MS);
    }

    /// Report a raw code as held for one iteration, then release
    pub fn press_raw(&mut self, raw: u32) {
        self.keypad.hold_raw(raw);
        self.tick(ANIM_PERIOD_MS);
        self.keypad.release();
        self.tick(ANIM_PERIOD_MS);
    }

    /// Lock the UI for inspection or mutation
    pub fn ui(&self) -> PortGuard<'_, MockFlush> {
        self.port.lock()
    }

    pub fn port(&self) -> &RenderingPort<MockFlush> {
        &self.port
    }

    pub fn main(&self) -> MainScreen {
        self.main
    }

    /// Callbacks delivered to the main screen so far
    pub fn hooks(&self) -> Vec<Hook> {
        self.hooks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Panel pixel in display byte order
    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb565> {
        let raw = self.frame.borrow().pixel(x, y)?;
        let raw = if self.swapped { raw.swap_bytes() } else { raw };
        Some(Rgb565::from(RawU16::new(raw)))
    }

    /// Number of panel pixels showing `color`
    pub fn count(&self, color: Rgb565) -> usize {
        let frame = self.frame.borrow();
        (0..frame.height())
            .flat_map(|y| (0..frame.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| self.pixel(x, y) == Some(color))
            .count()
    }

    /// Number of band flushes received by the panel
    pub fn flush_count(&self) -> usize {
        self.frame.borrow().flushes().len()
    }

    /// Save the panel memory to an RGB PNG.
    pub fn save_screenshot_png(&self, path: impl AsRef<Path>) -> Result<(), String> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let (width, height) = {
            let frame = self.frame.borrow();
            (frame.width(), frame.height())
        };
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                let color = Rgb888::from(self.pixel(x, y).unwrap_or(Rgb565::BLACK));
                data.extend_from_slice(&[color.r(), color.g(), color.b()]);
            }
        }

        let file = File::create(path).map_err(|e| e.to_string())?;
        let writer = BufWriter::new(file);
        let mut encoder = Encoder::new(writer, width as u32, height as u32);
        encoder.set_color(ColorType::Rgb);
        encoder.set_depth(BitDepth::Eight);
        let mut png_writer = encoder.write_header().map_err(|e| e.to_string())?;
        png_writer
            .write_image_data(&data)
            .map_err(|e| e.to_string())
    }
}
