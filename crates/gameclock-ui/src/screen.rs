//! Screen lifecycle contract.
//!
//! A screen owns a widget subtree under its root and reacts to the events the
//! dispatcher forwards while it is resident.

use crate::input::Key;
use crate::widget::WidgetTree;

/// Lifecycle hooks of one screen
///
/// Every hook defaults to doing nothing. Hooks run on the port's loop with the
/// port lock held, so they get direct access to the widget tree.
///
/// # Example
/// ```
/// use gameclock_ui::input::Key;
/// use gameclock_ui::screen::ScreenCapability;
/// use gameclock_ui::widget::WidgetTree;
///
/// struct Splash {
///     keys_seen: u32,
/// }
///
/// impl ScreenCapability for Splash {
///     fn on_key(&mut self, _key: Key, _widgets: &mut WidgetTree) {
///         self.keys_seen += 1;
///     }
/// }
/// ```
pub trait ScreenCapability: Send {
    /// The screen's load animation started; it is now the active screen
    fn on_load_started(&mut self, _widgets: &mut WidgetTree) {}

    /// The load animation finished
    fn on_load_finished(&mut self, _widgets: &mut WidgetTree) {}

    /// A key was pressed while the screen had focus
    fn on_key(&mut self, _key: Key, _widgets: &mut WidgetTree) {}
}
