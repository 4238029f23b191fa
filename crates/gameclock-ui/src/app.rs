//! Application entry: what runs once the rendering port is up.

use crate::main_screen::MainScreen;
use crate::port::{LoadAnim, Ui};
use crate::style::palette;
use crate::widget::WidgetError;

/// Animation used to bring in the main screen
pub const STARTUP_ANIM: LoadAnim = LoadAnim::OverLeft;
pub const STARTUP_ANIM_TIME_MS: u32 = 100;
pub const STARTUP_ANIM_DELAY_MS: u32 = 100;

/// Paint the default screen, build the main screen and start loading it
///
/// Call with the port locked. The default screen is deleted once the main
/// screen has finished loading.
pub fn setup(ui: &mut Ui) -> Result<MainScreen, WidgetError> {
    let default = ui.active_screen();
    ui.widgets_mut()
        .set_local_bg_color(default.id(), palette::DEEP_BLUE)?;

    let main = MainScreen::create(ui)?;
    ui.load_screen(
        main.root(),
        STARTUP_ANIM,
        STARTUP_ANIM_TIME_MS,
        STARTUP_ANIM_DELAY_MS,
        true,
    )?;
    log::info!("app: main screen loading");
    Ok(main)
}
