//! Rendering port
//!
//! The port is what bring-up hands over once the panel is live. It owns the
//! UI context ([`Ui`]), the flush target and the single draw buffer behind one
//! mutex. The loop side calls [`RenderingPort::handle`] periodically; any other
//! thread mutates the UI through [`RenderingPort::lock`], which returns a
//! guard that releases the lock when dropped.
//!
//! ```rust,ignore
//! let port = bring_up(Config::cyd(), backend)?;
//! {
//!     let mut ui = port.lock();
//!     app::setup(&mut ui)?;
//! } // unlocked here, on every exit path
//! loop {
//!     let delay = port.handle(elapsed_ms);
//!     sleep(delay);
//! }
//! ```

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, TryLockError};

use cyd_panel::{Area, DrawBuffer, ErrorCode, FlushTarget, PortGeometry};
use embedded_graphics::prelude::{Point, Size};

use crate::dispatcher::Dispatcher;
use crate::event::{EventCode, EventKind, SystemEvent};
use crate::focus::FocusGroup;
use crate::input::{Key, KeyReading, Keypad, KeypadState};
use crate::render::{draw_screen, BandTarget};
use crate::screen::ScreenCapability;
use crate::style::StyleRegistry;
use crate::widget::{ScreenHandle, State, WidgetError, WidgetId, WidgetTree};

/// Suggested delay between loop iterations while idle
pub const REFRESH_PERIOD_MS: u32 = 33;
/// Suggested delay while a load animation runs
pub const ANIM_PERIOD_MS: u32 = 10;

/// Load animation of an incoming screen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadAnim {
    /// Switch without motion
    #[default]
    None,
    /// New screen slides in from the right, over the old one
    OverLeft,
    /// New screen slides in from the left
    OverRight,
    /// New screen slides in from the bottom
    OverTop,
    /// New screen slides in from the top
    OverBottom,
}

impl LoadAnim {
    /// Position of the incoming screen, `permille` of the way through
    fn offset(self, size: Size, permille: u32) -> Point {
        let remaining = 1000 - permille.min(1000) as i32;
        let dx = size.width as i32 * remaining / 1000;
        let dy = size.height as i32 * remaining / 1000;
        match self {
            LoadAnim::None => Point::zero(),
            LoadAnim::OverLeft => Point::new(dx, 0),
            LoadAnim::OverRight => Point::new(-dx, 0),
            LoadAnim::OverTop => Point::new(0, dy),
            LoadAnim::OverBottom => Point::new(0, -dy),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Transition {
    from: ScreenHandle,
    to: ScreenHandle,
    anim: LoadAnim,
    time_ms: u32,
    delay_ms: u32,
    elapsed_ms: u32,
    started: bool,
    auto_delete: bool,
}

impl Transition {
    fn permille(&self) -> u32 {
        if self.time_ms == 0 {
            return 1000;
        }
        let run = self.elapsed_ms.saturating_sub(self.delay_ms).min(self.time_ms);
        (run as u64 * 1000 / self.time_ms as u64) as u32
    }

    fn involves(&self, root: ScreenHandle) -> bool {
        self.from == root || self.to == root
    }
}

/// UI context: everything screens and setup code touch
///
/// Built once, by the rendering port; there is no global UI state.
pub struct Ui {
    widgets: WidgetTree,
    styles: StyleRegistry,
    dispatcher: Dispatcher,
    group: FocusGroup,
    events: VecDeque<SystemEvent>,
    active: ScreenHandle,
    transition: Option<Transition>,
    pending_delete: Vec<ScreenHandle>,
    keys: KeypadState,
    size: Size,
    clock_ms: u64,
}

impl Ui {
    /// Fresh context with the style registry and an empty default screen
    pub fn new(size: Size) -> Self {
        let styles = StyleRegistry::init();
        let mut widgets = WidgetTree::new();
        let active = widgets.create_screen();
        Self {
            widgets,
            styles,
            dispatcher: Dispatcher::new(),
            group: FocusGroup::new(),
            events: VecDeque::new(),
            active,
            transition: None,
            pending_delete: Vec::new(),
            keys: KeypadState::default(),
            size,
            clock_ms: 0,
        }
    }

    pub fn widgets(&self) -> &WidgetTree {
        &self.widgets
    }

    pub fn widgets_mut(&mut self) -> &mut WidgetTree {
        &mut self.widgets
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Screen currently shown (the incoming one once its animation started)
    pub fn active_screen(&self) -> ScreenHandle {
        self.active
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Milliseconds of loop time seen so far
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn create_screen(&mut self) -> ScreenHandle {
        self.widgets.create_screen()
    }

    /// Make `screen` the resident screen for events raised against `root`
    ///
    /// Returns the screen it replaced, if any.
    pub fn subscribe(
        &mut self,
        root: ScreenHandle,
        screen: Box<dyn ScreenCapability>,
    ) -> Result<Option<Box<dyn ScreenCapability>>, WidgetError> {
        if self.widgets.screen(root.id()).is_none() {
            return Err(WidgetError::Stale(root.id()));
        }
        Ok(self.dispatcher.subscribe(root, screen))
    }

    pub fn unsubscribe(&mut self, root: ScreenHandle) -> Option<Box<dyn ScreenCapability>> {
        self.dispatcher.unsubscribe(root)
    }

    /// Add `id` to the keypad focus group; the first object added is focused
    pub fn group_add(&mut self, id: WidgetId) -> Result<(), WidgetError> {
        if !self.widgets.contains(id) {
            return Err(WidgetError::Stale(id));
        }
        if self.group.add(id) {
            self.set_focus(id)?;
        }
        Ok(())
    }

    /// Object holding keypad focus
    pub fn focused(&self) -> Option<WidgetId> {
        self.group.focused()
    }

    pub fn focus_next(&mut self) {
        if let Some((old, new)) = self.group.focus_next() {
            self.move_focus(old, new);
        }
    }

    pub fn focus_prev(&mut self) {
        if let Some((old, new)) = self.group.focus_prev() {
            self.move_focus(old, new);
        }
    }

    /// Start showing `root`
    ///
    /// After `delay_ms` the outgoing screen gets `ScreenUnloadStarted` and
    /// `root` gets `ScreenLoadStarted` and becomes active; `time_ms` later
    /// `root` gets `ScreenLoadFinished` and the outgoing one `ScreenUnloaded`.
    /// With `auto_delete` the outgoing screen is then unsubscribed and deleted.
    /// A load still in progress is completed first.
    pub fn load_screen(
        &mut self,
        root: ScreenHandle,
        anim: LoadAnim,
        time_ms: u32,
        delay_ms: u32,
        auto_delete: bool,
    ) -> Result<(), WidgetError> {
        if self.widgets.screen(root.id()).is_none() {
            return Err(WidgetError::Stale(root.id()));
        }
        if let Some(mut interrupted) = self.transition.take() {
            log::debug!("port: completing interrupted load of {:?}", interrupted.to);
            if !interrupted.started {
                self.start_transition(&mut interrupted);
            }
            self.end_transition(interrupted);
        }
        if root == self.active {
            log::debug!("port: {:?} is already active", root);
            return Ok(());
        }

        let mut transition = Transition {
            from: self.active,
            to: root,
            anim,
            time_ms,
            delay_ms,
            elapsed_ms: 0,
            started: false,
            auto_delete,
        };
        log::debug!(
            "port: load {:?} over {:?} ({:?}, {} ms after {} ms)",
            root,
            transition.from,
            anim,
            time_ms,
            delay_ms
        );
        if time_ms == 0 && delay_ms == 0 {
            self.start_transition(&mut transition);
            self.end_transition(transition);
        } else {
            self.transition = Some(transition);
        }
        Ok(())
    }

    /// Whether a screen load is still in progress
    pub fn is_loading(&self) -> bool {
        self.transition.is_some()
    }

    /// Unsubscribe and delete a screen that is not shown
    pub fn delete_screen(&mut self, root: ScreenHandle) -> Result<(), WidgetError> {
        if self.widgets.screen(root.id()).is_none() {
            return Err(WidgetError::NotAScreen(root.id()));
        }
        if root == self.active || self.transition.is_some_and(|t| t.involves(root)) {
            return Err(WidgetError::ScreenActive(root));
        }
        self.teardown(root)
    }

    /// Events queued and not yet delivered
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn push(&mut self, target: ScreenHandle, kind: EventKind) {
        self.events.push_back(SystemEvent::new(target, kind));
    }

    fn set_focus(&mut self, id: WidgetId) -> Result<(), WidgetError> {
        self.widgets.add_state(id, State::FOCUSED)?;
        if let Some(screen) = self.widgets.screen(id) {
            self.push(screen, EventKind::Other(EventCode::Focused));
        }
        Ok(())
    }

    fn move_focus(&mut self, old: WidgetId, new: WidgetId) {
        if self.widgets.remove_state(old, State::FOCUSED).is_ok() {
            if let Some(screen) = self.widgets.screen(old) {
                self.push(screen, EventKind::Other(EventCode::Defocused));
            }
        }
        if let Err(err) = self.set_focus(new) {
            log::warn!("port: cannot focus: {}", err);
        }
    }

    fn start_transition(&mut self, transition: &mut Transition) {
        transition.started = true;
        self.push(transition.from, EventKind::Other(EventCode::ScreenUnloadStarted));
        self.push(transition.to, EventKind::ScreenLoadStarted);
        self.active = transition.to;
        self.widgets.mark_dirty();
    }

    fn end_transition(&mut self, transition: Transition) {
        self.push(transition.to, EventKind::ScreenLoadFinished);
        self.push(transition.from, EventKind::Other(EventCode::ScreenUnloaded));
        if transition.auto_delete {
            self.pending_delete.push(transition.from);
        }
        self.widgets.mark_dirty();
    }

    /// Move the clock and the load animation forward
    fn advance(&mut self, elapsed_ms: u32) {
        self.clock_ms = self.clock_ms.saturating_add(elapsed_ms as u64);
        let Some(mut transition) = self.transition.take() else {
            return;
        };
        transition.elapsed_ms = transition.elapsed_ms.saturating_add(elapsed_ms);
        if !transition.started && transition.elapsed_ms >= transition.delay_ms {
            self.start_transition(&mut transition);
        }
        if transition.started
            && transition.elapsed_ms >= transition.delay_ms.saturating_add(transition.time_ms)
        {
            self.end_transition(transition);
        } else {
            if transition.started {
                self.widgets.mark_dirty();
            }
            self.transition = Some(transition);
        }
    }

    /// Turn a keypad sample into focus moves or a key event
    fn feed_key(&mut self, reading: KeyReading) {
        let Some(raw) = self.keys.update(reading) else {
            return;
        };
        match Key::from_raw(raw) {
            Some(Key::NEXT) => self.focus_next(),
            Some(Key::PREV) => self.focus_prev(),
            _ => match self.group.focused().and_then(|id| self.widgets.screen(id)) {
                Some(screen) => self.push(screen, EventKind::KeyPressed),
                None => log::debug!("port: key {} with no focused screen", raw),
            },
        }
    }

    /// Deliver queued events one at a time, then run pending deletes
    fn pump(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.events.pop_front() {
            if event.is_subscribable() {
                self.dispatcher.dispatch(event, &mut self.widgets, &self.keys);
                delivered += 1;
            } else {
                log::trace!("port: {:?} for {:?}", event.kind, event.target);
            }
        }
        for root in core::mem::take(&mut self.pending_delete) {
            if root == self.active || self.transition.is_some_and(|t| t.involves(root)) {
                continue;
            }
            if let Err(err) = self.teardown(root) {
                log::warn!("port: auto-delete failed: {}", err);
            }
        }
        delivered
    }

    fn teardown(&mut self, root: ScreenHandle) -> Result<(), WidgetError> {
        self.dispatcher.unsubscribe(root);
        let removed = self.widgets.delete(root.id())?;
        let mut lost_focus = false;
        for id in removed {
            lost_focus |= self.group.remove(id);
        }
        if lost_focus {
            if let Some(next) = self.group.focused() {
                if self.widgets.contains(next) {
                    self.set_focus(next)?;
                }
            }
        }
        log::debug!("port: deleted {:?}", root);
        Ok(())
    }

    /// Screens to draw, bottom first, with their offsets
    fn layers(&self) -> Vec<(ScreenHandle, Point)> {
        match &self.transition {
            Some(t) if t.started => vec![
                (t.from, Point::zero()),
                (t.to, t.anim.offset(self.size, t.permille())),
            ],
            _ => vec![(self.active, Point::zero())],
        }
    }

    fn next_period(&self) -> u32 {
        if self.transition.is_some() {
            ANIM_PERIOD_MS
        } else {
            REFRESH_PERIOD_MS
        }
    }
}

struct PortInner<F> {
    ui: Ui,
    flush: F,
    buffer: DrawBuffer,
    keypad: Option<Box<dyn Keypad + Send>>,
    frames: u32,
    flush_errors: u32,
}

impl<F: FlushTarget> PortInner<F> {
    /// Render the visible screens band by band and flush each band
    fn render(&mut self, geometry: &PortGeometry) {
        let PortInner {
            ui,
            flush,
            buffer,
            frames,
            flush_errors,
            ..
        } = self;
        let layers = ui.layers();
        let screen = Size::new(geometry.width as u32, geometry.height as u32);
        let rows = buffer.rows().max(1);

        let mut top = 0u16;
        while top < geometry.height {
            let band_rows = rows.min(geometry.height - top);
            let len = geometry.width as usize * band_rows as usize;
            buffer.fill(0);
            {
                let mut band = BandTarget::new(
                    &mut buffer.pixels_mut()[..len],
                    geometry.width,
                    top,
                    band_rows,
                    screen,
                );
                for (root, offset) in &layers {
                    if let Err(never) =
                        draw_screen(&ui.widgets, &ui.styles, *root, *offset, screen, &mut band)
                    {
                        match never {}
                    }
                }
            }
            if geometry.swap_bytes {
                buffer.swap_bytes(len);
            }
            let area = Area {
                x0: 0,
                y0: top,
                x1: geometry.width,
                y1: top + band_rows,
            };
            if let Err(err) = flush.flush(area, &buffer.pixels()[..len]) {
                *flush_errors = flush_errors.saturating_add(1);
                log::warn!("port: flush of {:?} failed: {:?}", area, err);
            }
            top += band_rows;
        }
        *frames = frames.saturating_add(1);
    }
}

/// Exclusive access to the [`Ui`]; the port unlocks when this drops
pub struct PortGuard<'a, F> {
    inner: MutexGuard<'a, PortInner<F>>,
}

impl<F> PortGuard<'_, F> {
    /// Release the lock
    pub fn unlock(self) {}
}

impl<F> Deref for PortGuard<'_, F> {
    type Target = Ui;

    fn deref(&self) -> &Ui {
        &self.inner.ui
    }
}

impl<F> DerefMut for PortGuard<'_, F> {
    fn deref_mut(&mut self) -> &mut Ui {
        &mut self.inner.ui
    }
}

/// Handle for widget mutation and the source of system events
pub struct RenderingPort<F> {
    inner: Mutex<PortInner<F>>,
    geometry: PortGeometry,
}

impl<F: FlushTarget> RenderingPort<F> {
    /// Register the draw buffer and flush target with a fresh UI context
    ///
    /// # Errors
    ///
    /// `INVALID_SIZE` when the buffer does not span the panel width or the
    /// panel has no rows.
    pub fn new(flush: F, buffer: DrawBuffer, geometry: PortGeometry) -> Result<Self, ErrorCode> {
        if buffer.width() != geometry.width || geometry.height == 0 {
            return Err(ErrorCode::INVALID_SIZE);
        }
        log::info!(
            "port: {}x{} panel, {} row draw buffer",
            geometry.width,
            geometry.height,
            buffer.rows()
        );
        let ui = Ui::new(Size::new(geometry.width as u32, geometry.height as u32));
        Ok(Self {
            inner: Mutex::new(PortInner {
                ui,
                flush,
                buffer,
                keypad: None,
                frames: 0,
                flush_errors: 0,
            }),
            geometry,
        })
    }

    pub fn geometry(&self) -> PortGeometry {
        self.geometry
    }

    /// Block until the UI is free
    pub fn lock(&self) -> PortGuard<'_, F> {
        PortGuard {
            inner: self.lock_inner(),
        }
    }

    /// Take the lock only if nobody holds it
    pub fn try_lock(&self) -> Option<PortGuard<'_, F>> {
        match self.inner.try_lock() {
            Ok(inner) => Some(PortGuard { inner }),
            Err(TryLockError::Poisoned(poisoned)) => {
                log::warn!("port: lock poisoned, recovering");
                Some(PortGuard {
                    inner: poisoned.into_inner(),
                })
            }
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Input device polled on every iteration
    pub fn set_keypad<K: Keypad + Send + 'static>(&self, keypad: K) {
        self.lock_inner().keypad = Some(Box::new(keypad));
    }

    /// One loop iteration; returns the suggested delay until the next one
    pub fn handle(&self, elapsed_ms: u32) -> u32 {
        let mut guard = self.lock_inner();
        let inner = &mut *guard;
        inner.ui.advance(elapsed_ms);
        if let Some(keypad) = inner.keypad.as_mut() {
            let reading = keypad.read();
            inner.ui.feed_key(reading);
        }
        inner.ui.pump();
        if inner.ui.widgets.take_dirty() {
            inner.render(&self.geometry);
        }
        inner.ui.next_period()
    }

    /// Redraw everything now
    pub fn refresh(&self) {
        let mut inner = self.lock_inner();
        inner.ui.widgets.take_dirty();
        inner.render(&self.geometry);
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u32 {
        self.lock_inner().frames
    }

    /// Band flushes the panel rejected
    pub fn flush_errors(&self) -> u32 {
        self.lock_inner().flush_errors
    }

    /// Inspect the flush target
    pub fn with_flush<R>(&self, f: impl FnOnce(&F) -> R) -> R {
        f(&self.lock_inner().flush)
    }

    fn lock_inner(&self) -> MutexGuard<'_, PortInner<F>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            log::warn!("port: lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::SharedKeypad;
    use crate::style::palette;
    use crate::test_display::TestDisplay;
    use embedded_graphics::pixelcolor::Rgb565;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Debug, PartialEq, Eq)]
    enum Hook {
        LoadStarted,
        LoadFinished,
        Key(Key),
    }

    struct Recorder(Arc<StdMutex<Vec<Hook>>>);

    impl ScreenCapability for Recorder {
        fn on_load_started(&mut self, _widgets: &mut WidgetTree) {
            self.0.lock().unwrap().push(Hook::LoadStarted);
        }

        fn on_load_finished(&mut self, _widgets: &mut WidgetTree) {
            self.0.lock().unwrap().push(Hook::LoadFinished);
        }

        fn on_key(&mut self, key: Key, _widgets: &mut WidgetTree) {
            self.0.lock().unwrap().push(Hook::Key(key));
        }
    }

    fn geometry() -> PortGeometry {
        PortGeometry {
            width: 240,
            height: 320,
            draw_rows: 100,
            swap_bytes: true,
        }
    }

    fn port() -> RenderingPort<TestDisplay> {
        RenderingPort::new(
            TestDisplay::cyd().with_swapped_input(),
            DrawBuffer::allocate(240, 100).unwrap(),
            geometry(),
        )
        .unwrap()
    }

    fn recorded_screen(ui: &mut Ui) -> (ScreenHandle, Arc<StdMutex<Vec<Hook>>>) {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let root = ui.create_screen();
        ui.subscribe(root, Box::new(Recorder(log.clone()))).unwrap();
        (root, log)
    }

    #[test]
    fn rejects_buffer_narrower_than_panel() {
        let result = RenderingPort::new(
            TestDisplay::cyd(),
            DrawBuffer::allocate(200, 100).unwrap(),
            geometry(),
        );
        assert_eq!(result.err(), Some(ErrorCode::INVALID_SIZE));
    }

    #[test]
    fn renders_in_bands() {
        let port = port();
        {
            let mut ui = port.lock();
            let active = ui.active_screen();
            ui.widgets_mut()
                .set_local_bg_color(active.id(), palette::DEEP_BLUE)
                .unwrap();
        }
        port.handle(0);

        port.with_flush(|display| {
            assert_eq!(display.flushes(), 4);
            assert_eq!(display.count(Rgb565::from(palette::DEEP_BLUE)), 240 * 320);
        });
        assert_eq!(port.frames(), 1);

        port.handle(33);
        assert_eq!(port.frames(), 1, "nothing changed, nothing redrawn");
    }

    #[test]
    fn animated_load_orders_events() {
        let port = port();
        let (root, log) = recorded_screen(&mut port.lock());
        port.lock()
            .load_screen(root, LoadAnim::OverLeft, 100, 100, true)
            .unwrap();

        port.handle(50);
        assert!(log.lock().unwrap().is_empty());
        assert_ne!(port.lock().active_screen(), root);

        port.handle(50);
        assert_eq!(*log.lock().unwrap(), vec![Hook::LoadStarted]);
        assert_eq!(port.lock().active_screen(), root);

        assert_eq!(port.handle(60), ANIM_PERIOD_MS);
        port.handle(40);
        assert_eq!(*log.lock().unwrap(), vec![Hook::LoadStarted, Hook::LoadFinished]);
        assert!(!port.lock().is_loading());
    }

    #[test]
    fn auto_delete_removes_outgoing_screen() {
        let port = port();
        let default = port.lock().active_screen();
        let (root, _log) = recorded_screen(&mut port.lock());
        port.lock().load_screen(root, LoadAnim::None, 0, 0, true).unwrap();
        port.handle(0);

        let ui = port.lock();
        assert!(!ui.widgets().contains(default.id()));
        assert!(ui.widgets().contains(root.id()));
        assert_eq!(ui.dispatcher().resident(), Some(root));
    }

    #[test]
    fn outgoing_screen_stops_receiving_events() {
        let port = port();
        let (first, first_log) = recorded_screen(&mut port.lock());
        port.lock().load_screen(first, LoadAnim::None, 0, 0, true).unwrap();
        port.handle(0);

        let (second, second_log) = recorded_screen(&mut port.lock());
        port.lock().load_screen(second, LoadAnim::None, 0, 0, true).unwrap();
        port.handle(0);

        assert_eq!(*first_log.lock().unwrap(), vec![Hook::LoadStarted, Hook::LoadFinished]);
        assert_eq!(*second_log.lock().unwrap(), vec![Hook::LoadStarted, Hook::LoadFinished]);
        assert!(!port.lock().widgets().contains(first.id()));
    }

    #[test]
    fn keys_reach_focused_screen_once_per_press() {
        let port = port();
        let keypad = SharedKeypad::new();
        port.set_keypad(keypad.clone());
        let (root, log) = {
            let mut ui = port.lock();
            let (root, log) = recorded_screen(&mut ui);
            ui.group_add(root.id()).unwrap();
            ui.load_screen(root, LoadAnim::None, 0, 0, true).unwrap();
            (root, log)
        };
        port.handle(0);
        assert!(port.lock().widgets().has_state(root.id(), State::FOCUSED));

        keypad.press(Key::ENTER);
        port.handle(10);
        port.handle(10);
        keypad.release();
        port.handle(10);

        assert_eq!(
            *log.lock().unwrap(),
            vec![Hook::LoadStarted, Hook::LoadFinished, Hook::Key(Key::ENTER)]
        );
    }

    struct ZeroKeypad;

    impl Keypad for ZeroKeypad {
        fn read(&mut self) -> KeyReading {
            KeyReading {
                key: 0,
                pressed: true,
            }
        }
    }

    #[test]
    fn zero_key_press_is_dropped() {
        let port = port();
        let log = {
            let mut ui = port.lock();
            let (root, log) = recorded_screen(&mut ui);
            ui.group_add(root.id()).unwrap();
            ui.load_screen(root, LoadAnim::None, 0, 0, false).unwrap();
            log
        };
        port.handle(0);
        port.set_keypad(ZeroKeypad);
        port.handle(10);
        port.handle(10);
        assert_eq!(*log.lock().unwrap(), vec![Hook::LoadStarted, Hook::LoadFinished]);
        assert_eq!(port.lock().dispatcher().anomalies(), 0);
    }

    #[test]
    fn next_key_moves_focus_instead_of_raising_key() {
        let port = port();
        let keypad = SharedKeypad::new();
        port.set_keypad(keypad.clone());
        let (a, b, log) = {
            let mut ui = port.lock();
            let (a, log) = recorded_screen(&mut ui);
            let b = ui.create_screen();
            ui.group_add(a.id()).unwrap();
            ui.group_add(b.id()).unwrap();
            (a, b, log)
        };
        keypad.press(Key::NEXT);
        port.handle(10);

        let ui = port.lock();
        assert_eq!(ui.focused(), Some(b.id()));
        assert!(!ui.widgets().has_state(a.id(), State::FOCUSED));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn try_lock_fails_while_held() {
        let port = port();
        let guard = port.lock();
        assert!(port.try_lock().is_none());
        guard.unlock();
        assert!(port.try_lock().is_some());
    }

    #[test]
    fn lock_is_released_on_early_return() {
        fn fails(port: &RenderingPort<TestDisplay>) -> Result<(), WidgetError> {
            let mut ui = port.lock();
            let stale = ui.create_screen();
            ui.widgets_mut().delete(stale.id())?;
            ui.load_screen(stale, LoadAnim::None, 0, 0, false)?;
            Ok(())
        }
        let port = port();
        assert!(fails(&port).is_err());
        assert!(port.try_lock().is_some());
    }

    #[test]
    fn delete_screen_refuses_active() {
        let port = port();
        let mut ui = port.lock();
        let active = ui.active_screen();
        assert_eq!(ui.delete_screen(active), Err(WidgetError::ScreenActive(active)));
        let spare = ui.create_screen();
        ui.delete_screen(spare).unwrap();
        assert!(!ui.widgets().contains(spare.id()));
    }

    #[test]
    fn deleting_screen_drops_its_focus_members() {
        let port = port();
        let mut ui = port.lock();
        let spare = ui.create_screen();
        let first = ui.widgets_mut().create_button(spare.id()).unwrap();
        let second = ui.widgets_mut().create_button(spare.id()).unwrap();
        ui.group_add(first).unwrap();
        ui.group_add(second).unwrap();
        ui.focus_next();
        assert_eq!(ui.focused(), Some(second));

        assert_eq!(ui.delete_screen(spare), Ok(()));
        assert_eq!(ui.focused(), None);
        assert!(!ui.widgets().contains(first));
        assert!(!ui.widgets().contains(second));
    }

    #[test]
    fn deleting_screen_refocuses_surviving_member() {
        let port = port();
        let mut ui = port.lock();
        let active = ui.active_screen();
        let spare = ui.create_screen();
        let kept = ui.widgets_mut().create_button(active.id()).unwrap();
        let doomed = ui.widgets_mut().create_button(spare.id()).unwrap();
        ui.group_add(kept).unwrap();
        ui.group_add(doomed).unwrap();
        ui.focus_next();

        ui.delete_screen(spare).unwrap();
        assert_eq!(ui.focused(), Some(kept));
        assert!(ui.widgets().has_state(kept, State::FOCUSED));
    }

    #[test]
    fn port_is_shareable_across_threads() {
        let port = Arc::new(port());
        let worker = {
            let port = port.clone();
            std::thread::spawn(move || {
                for _ in 0..5 {
                    port.handle(10);
                }
            })
        };
        {
            let mut ui = port.lock();
            let root = ui.create_screen();
            ui.load_screen(root, LoadAnim::OverLeft, 20, 0, true).unwrap();
        }
        worker.join().unwrap();
        port.handle(100);
        assert!(!port.lock().is_loading());
    }

    #[test]
    fn slide_offset_shrinks_to_zero() {
        let size = Size::new(240, 320);
        assert_eq!(LoadAnim::OverLeft.offset(size, 0), Point::new(240, 0));
        assert_eq!(LoadAnim::OverLeft.offset(size, 500), Point::new(120, 0));
        assert_eq!(LoadAnim::OverBottom.offset(size, 250), Point::new(0, -240));
        assert_eq!(LoadAnim::OverRight.offset(size, 1000), Point::zero());
    }
}
