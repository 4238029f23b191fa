//! System events produced by the rendering port

use crate::widget::ScreenHandle;

/// Events the port raises that screens do not subscribe to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventCode {
    /// The screen is about to be covered by a load animation
    ScreenUnloadStarted,
    /// The load animation that covered the screen finished
    ScreenUnloaded,
    /// The object gained focus
    Focused,
    /// The object lost focus
    Defocused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    ScreenLoadStarted,
    ScreenLoadFinished,
    /// A key went down while the screen was focused; the key itself is read
    /// from the input device during dispatch
    KeyPressed,
    Other(EventCode),
}

/// One event, tagged with the screen root it originated from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemEvent {
    pub target: ScreenHandle,
    pub kind: EventKind,
}

impl SystemEvent {
    pub fn new(target: ScreenHandle, kind: EventKind) -> Self {
        Self { target, kind }
    }

    /// Whether a screen subscription covers this kind
    pub fn is_subscribable(&self) -> bool {
        !matches!(self.kind, EventKind::Other(_))
    }
}
