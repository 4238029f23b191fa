//! Style registry: the four named style records every screen draws with.
//!
//! Records are plain values built once by [`StyleRegistry::init`]. Widgets
//! refer to them by [`StyleRole`] and the renderer resolves the role against
//! the registry owned by the port, so there is no global style state.

use embedded_graphics::pixelcolor::Rgb888;

/// Opacity, 0 = transparent, 255 = opaque
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Opa(pub u8);

impl Opa {
    pub const TRANSP: Opa = Opa(0);
    pub const OPA_50: Opa = Opa(127);
    pub const COVER: Opa = Opa(255);

    /// Whether the renderer paints with this opacity
    ///
    /// The renderer does not blend; anything at or above half is opaque.
    pub fn is_visible(self) -> bool {
        self.0 > Self::OPA_50.0
    }
}

/// Per-edge spacing in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Edges {
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
    pub left: i16,
}

impl Edges {
    /// Same value on every edge
    pub const fn all(value: i16) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn horizontal(&self) -> i32 {
        self.left as i32 + self.right as i32
    }

    pub fn vertical(&self) -> i32 {
        self.top as i32 + self.bottom as i32
    }
}

/// Colors used by the style records
pub mod palette {
    use embedded_graphics::pixelcolor::Rgb888;

    pub const WHITE: Rgb888 = Rgb888::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: Rgb888 = Rgb888::new(0x00, 0x00, 0x00);
    /// Material grey 500
    pub const GREY_MAIN: Rgb888 = Rgb888::new(0x9E, 0x9E, 0x9E);
    /// Material grey 200, three steps lighter than main
    pub const GREY_LIGHTEN_3: Rgb888 = Rgb888::new(0xEE, 0xEE, 0xEE);
    /// Background of the screen shown before the first load completes
    pub const DEEP_BLUE: Rgb888 = Rgb888::new(0x00, 0x3A, 0x57);
}

/// Named style categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleRole {
    Container,
    Normal,
    Focused,
    Disabled,
}

impl StyleRole {
    pub const ALL: [StyleRole; 4] = [
        StyleRole::Container,
        StyleRole::Normal,
        StyleRole::Focused,
        StyleRole::Disabled,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StyleRole::Container => "container",
            StyleRole::Normal => "normal",
            StyleRole::Focused => "focused",
            StyleRole::Disabled => "disabled",
        }
    }

    fn index(self) -> usize {
        match self {
            StyleRole::Container => 0,
            StyleRole::Normal => 1,
            StyleRole::Focused => 2,
            StyleRole::Disabled => 3,
        }
    }
}

/// Sparse bundle of visual attributes; unset fields inherit
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleRecord {
    pub radius: Option<u16>,
    pub bg_opa: Option<Opa>,
    pub bg_color: Option<Rgb888>,
    pub border_opa: Option<Opa>,
    pub border_width: Option<u16>,
    pub border_color: Option<Rgb888>,
    pub text_color: Option<Rgb888>,
    pub margin: Option<Edges>,
    pub pad: Option<Edges>,
    pub pad_row: Option<i16>,
}

impl StyleRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn radius(mut self, radius: u16) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn bg_opa(mut self, opa: Opa) -> Self {
        self.bg_opa = Some(opa);
        self
    }

    pub fn bg_color(mut self, color: Rgb888) -> Self {
        self.bg_color = Some(color);
        self
    }

    pub fn border_opa(mut self, opa: Opa) -> Self {
        self.border_opa = Some(opa);
        self
    }

    pub fn border_width(mut self, width: u16) -> Self {
        self.border_width = Some(width);
        self
    }

    pub fn border_color(mut self, color: Rgb888) -> Self {
        self.border_color = Some(color);
        self
    }

    pub fn text_color(mut self, color: Rgb888) -> Self {
        self.text_color = Some(color);
        self
    }

    pub fn margin(mut self, margin: Edges) -> Self {
        self.margin = Some(margin);
        self
    }

    pub fn pad(mut self, pad: Edges) -> Self {
        self.pad = Some(pad);
        self
    }

    pub fn pad_row(mut self, pad_row: i16) -> Self {
        self.pad_row = Some(pad_row);
        self
    }
}

/// Fully resolved attributes for one widget
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComputedStyle {
    pub radius: u16,
    pub bg_opa: Opa,
    pub bg_color: Rgb888,
    pub border_opa: Opa,
    pub border_width: u16,
    pub border_color: Rgb888,
    pub text_color: Rgb888,
    pub margin: Edges,
    pub pad: Edges,
    pub pad_row: i16,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            radius: 0,
            bg_opa: Opa::TRANSP,
            bg_color: palette::WHITE,
            border_opa: Opa::COVER,
            border_width: 0,
            border_color: palette::BLACK,
            text_color: palette::BLACK,
            margin: Edges::default(),
            pad: Edges::default(),
            pad_row: 0,
        }
    }
}

impl ComputedStyle {
    /// Overlay every field the record sets
    pub fn apply(&mut self, record: &StyleRecord) {
        if let Some(v) = record.radius {
            self.radius = v;
        }
        if let Some(v) = record.bg_opa {
            self.bg_opa = v;
        }
        if let Some(v) = record.bg_color {
            self.bg_color = v;
        }
        if let Some(v) = record.border_opa {
            self.border_opa = v;
        }
        if let Some(v) = record.border_width {
            self.border_width = v;
        }
        if let Some(v) = record.border_color {
            self.border_color = v;
        }
        if let Some(v) = record.text_color {
            self.text_color = v;
        }
        if let Some(v) = record.margin {
            self.margin = v;
        }
        if let Some(v) = record.pad {
            self.pad = v;
        }
        if let Some(v) = record.pad_row {
            self.pad_row = v;
        }
    }
}

/// Read-only table of the four style records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRegistry {
    records: [StyleRecord; 4],
}

impl StyleRegistry {
    /// Build the records. Called once, when the rendering port is created.
    pub fn init() -> Self {
        let container = StyleRecord::new().pad_row(0);

        let normal = StyleRecord::new()
            .radius(8)
            .bg_opa(Opa::COVER)
            .bg_color(palette::WHITE)
            .border_opa(Opa::COVER)
            .border_width(2)
            .border_color(palette::BLACK)
            .margin(Edges::all(2))
            .text_color(palette::BLACK)
            .pad(Edges::all(10));

        let focused = StyleRecord::new()
            .text_color(palette::WHITE)
            .bg_color(palette::BLACK);

        let disabled = StyleRecord::new()
            .bg_color(palette::GREY_LIGHTEN_3)
            .text_color(palette::GREY_MAIN);

        log::debug!("style registry initialised");
        Self {
            records: [container, normal, focused, disabled],
        }
    }

    /// Record for `role`
    pub fn get(&self, role: StyleRole) -> &StyleRecord {
        &self.records[role.index()]
    }
}
