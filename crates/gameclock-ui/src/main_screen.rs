//! Main menu screen: Replay / New / Settings

use crate::input::Key;
use crate::port::Ui;
use crate::screen::ScreenCapability;
use crate::style::StyleRole;
use crate::widget::{Layout, ScreenHandle, SizeSpec, State, WidgetError, WidgetId, WidgetTree};

/// Button captions, top to bottom
pub const BUTTON_LABELS: [&str; 3] = ["Replay", "New", "Settings"];

/// Main menu
///
/// Only holds widget ids, so the copy returned by [`MainScreen::create`] and
/// the copy living in the dispatcher name the same widgets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MainScreen {
    root: ScreenHandle,
    buttons: [WidgetId; 3],
}

impl MainScreen {
    /// Build the widget tree, join the focus group and subscribe
    pub fn create(ui: &mut Ui) -> Result<MainScreen, WidgetError> {
        let root = ui.create_screen();
        let screen = Self::build(ui.widgets_mut(), root)?;
        ui.group_add(root.id())?;
        ui.subscribe(root, Box::new(screen))?;
        Ok(screen)
    }

    pub fn root(&self) -> ScreenHandle {
        self.root
    }

    pub fn buttons(&self) -> [WidgetId; 3] {
        self.buttons
    }

    fn build(widgets: &mut WidgetTree, root: ScreenHandle) -> Result<Self, WidgetError> {
        widgets.add_style(root.id(), StyleRole::Container, State::DEFAULT)?;
        widgets.set_layout(root.id(), Layout::FlexColumn)?;

        let mut buttons = [root.id(); 3];
        for (slot, text) in buttons.iter_mut().zip(BUTTON_LABELS) {
            *slot = menu_button(widgets, root.id(), text)?;
        }
        Ok(Self { root, buttons })
    }
}

fn menu_button(widgets: &mut WidgetTree, parent: WidgetId, text: &str) -> Result<WidgetId, WidgetError> {
    let button = widgets.create_button(parent)?;
    widgets.remove_style_all(button)?;
    widgets.add_style(button, StyleRole::Normal, State::DEFAULT)?;
    widgets.add_style(button, StyleRole::Focused, State::FOCUSED)?;
    widgets.add_style(button, StyleRole::Disabled, State::DISABLED)?;
    widgets.set_size(button, SizeSpec::Pct(100), SizeSpec::Content)?;
    widgets.create_label(button, text)?;
    Ok(button)
}

impl ScreenCapability for MainScreen {
    fn on_load_started(&mut self, widgets: &mut WidgetTree) {
        for button in self.buttons {
            if let Err(err) = widgets.remove_state(button, State::FOCUSED) {
                log::warn!("main: {}", err);
            }
        }
    }

    fn on_key(&mut self, key: Key, _widgets: &mut WidgetTree) {
        // Menu navigation hooks in here.
        log::info!("main: key {}", key);
    }
}
