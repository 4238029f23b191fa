//! Screen event dispatcher
//!
//! Holds at most one subscription, the resident screen, and routes each
//! [`SystemEvent`] raised against that screen's root to the matching hook.
//! Dispatch never fails: anything it cannot route is logged and dropped.

use crate::event::{EventKind, SystemEvent};
use crate::input::{Key, KeySource};
use crate::screen::ScreenCapability;
use crate::widget::{ScreenHandle, WidgetTree};

struct Subscription {
    root: ScreenHandle,
    screen: Box<dyn ScreenCapability>,
}

#[derive(Default)]
pub struct Dispatcher {
    resident: Option<Subscription>,
    anomalies: u32,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `screen` resident for events raised against `root`
    ///
    /// Replaces the current subscription, if any, and hands the replaced screen
    /// back to the caller.
    pub fn subscribe(
        &mut self,
        root: ScreenHandle,
        screen: Box<dyn ScreenCapability>,
    ) -> Option<Box<dyn ScreenCapability>> {
        let previous = self.resident.replace(Subscription { root, screen });
        match &previous {
            Some(old) if old.root != root => {
                log::info!("dispatcher: {:?} replaces {:?}", root, old.root)
            }
            Some(_) => log::info!("dispatcher: {:?} resubscribed", root),
            None => log::info!("dispatcher: {:?} subscribed", root),
        }
        previous.map(|old| old.screen)
    }

    /// Drop the subscription for `root`; no-op when another screen is resident
    pub fn unsubscribe(&mut self, root: ScreenHandle) -> Option<Box<dyn ScreenCapability>> {
        if self.resident()? != root {
            return None;
        }
        log::info!("dispatcher: {:?} unsubscribed", root);
        self.resident.take().map(|sub| sub.screen)
    }

    /// Root of the resident screen
    pub fn resident(&self) -> Option<ScreenHandle> {
        self.resident.as_ref().map(|sub| sub.root)
    }

    pub fn is_subscribed(&self, root: ScreenHandle) -> bool {
        self.resident() == Some(root)
    }

    /// Events that could not be routed so far
    pub fn anomalies(&self) -> u32 {
        self.anomalies
    }

    /// Route one event to the resident screen
    ///
    /// `keys` is the input device the event came from; it is only read for
    /// [`EventKind::KeyPressed`].
    pub fn dispatch(&mut self, event: SystemEvent, widgets: &mut WidgetTree, keys: &dyn KeySource) {
        let Some(sub) = self.resident.as_mut().filter(|sub| sub.root == event.target) else {
            log::debug!("dispatcher: {:?} for {:?} has no subscriber", event.kind, event.target);
            return;
        };

        match event.kind {
            EventKind::ScreenLoadStarted => sub.screen.on_load_started(widgets),
            EventKind::ScreenLoadFinished => sub.screen.on_load_finished(widgets),
            EventKind::KeyPressed => match Key::from_raw(keys.active_key()) {
                Some(key) => sub.screen.on_key(key, widgets),
                None => log::debug!("dispatcher: key event without a key"),
            },
            EventKind::Other(code) => {
                self.anomalies = self.anomalies.saturating_add(1);
                log::warn!("dispatcher: spurious event {:?} for {:?}", code, event.target);
            }
        }
    }
}
