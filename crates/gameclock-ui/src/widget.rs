//! Widget tree
//!
//! Widgets live in a generational arena owned by the rendering port. A
//! [`WidgetId`] stays valid until its widget (or an ancestor) is deleted; after
//! that every lookup through the old id fails instead of reaching a reused
//! slot.

use embedded_graphics::pixelcolor::Rgb888;

use crate::style::{ComputedStyle, Opa, StyleRecord, StyleRegistry, StyleRole};

/// Generational reference to a widget
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WidgetId {
    index: u32,
    generation: u32,
}

/// Reference to a screen root
///
/// Only [`WidgetTree::create_screen`] hands these out, so a live handle
/// always names a widget of kind [`WidgetKind::Screen`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScreenHandle(WidgetId);

impl ScreenHandle {
    pub fn id(self) -> WidgetId {
        self.0
    }
}

/// Interaction state bits
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct State(u16);

impl State {
    pub const DEFAULT: State = State(0);
    pub const CHECKED: State = State(0x0001);
    pub const FOCUSED: State = State(0x0002);
    pub const PRESSED: State = State(0x0020);
    pub const DISABLED: State = State(0x0080);

    pub fn bits(self) -> u16 {
        self.0
    }

    /// Every bit of `other` is set in `self`
    pub fn contains(self, other: State) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: State) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: State) {
        self.0 &= !other.0;
    }
}

impl core::ops::BitOr for State {
    type Output = State;

    fn bitor(self, rhs: State) -> State {
        State(self.0 | rhs.0)
    }
}

/// Requested extent along one axis
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeSpec {
    /// Fixed pixels
    Px(u16),
    /// Percentage of the parent's content box
    Pct(u8),
    /// Fit the children
    Content,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WidgetKind {
    Screen,
    Button,
    Label(String),
}

/// How a widget places its children
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// Children centered in the content box
    #[default]
    Center,
    /// Children stacked top to bottom
    FlexColumn,
}

#[derive(Clone, Debug)]
pub struct Widget {
    kind: WidgetKind,
    parent: Option<WidgetId>,
    children: Vec<WidgetId>,
    state: State,
    styles: Vec<(StyleRole, State)>,
    local: StyleRecord,
    width: SizeSpec,
    height: SizeSpec,
    layout: Layout,
}

impl Widget {
    fn new(kind: WidgetKind, parent: Option<WidgetId>) -> Self {
        let (width, height) = match kind {
            WidgetKind::Screen => (SizeSpec::Pct(100), SizeSpec::Pct(100)),
            _ => (SizeSpec::Content, SizeSpec::Content),
        };
        Self {
            kind,
            parent,
            children: Vec::new(),
            state: State::DEFAULT,
            styles: Vec::new(),
            local: StyleRecord::default(),
            width,
            height,
            layout: Layout::default(),
        }
    }

    pub fn kind(&self) -> &WidgetKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn size(&self) -> (SizeSpec, SizeSpec) {
        (self.width, self.height)
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Label text, if this is a label
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            WidgetKind::Label(text) => Some(text),
            _ => None,
        }
    }

    fn base_style(&self) -> StyleRecord {
        match self.kind {
            WidgetKind::Screen => StyleRecord::new().bg_opa(Opa::COVER),
            WidgetKind::Button | WidgetKind::Label(_) => StyleRecord::new(),
        }
    }
}

/// Error for operations naming a widget that no longer exists
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidgetError {
    /// The id was deleted (or never issued by this tree)
    Stale(WidgetId),
    /// The operation needs a screen root
    NotAScreen(WidgetId),
    /// The screen is still shown
    ScreenActive(ScreenHandle),
}

impl core::fmt::Display for WidgetError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            WidgetError::Stale(id) => write!(f, "widget {}:{} no longer exists", id.index, id.generation),
            WidgetError::NotAScreen(id) => write!(f, "widget {}:{} is not a screen", id.index, id.generation),
            WidgetError::ScreenActive(screen) => {
                write!(f, "screen {}:{} is active", screen.0.index, screen.0.generation)
            }
        }
    }
}

impl core::error::Error for WidgetError {}

struct Slot {
    generation: u32,
    widget: Option<Widget>,
}

/// Arena of widgets; single-writer, reached through the port lock
#[derive(Default)]
pub struct WidgetTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    dirty: bool,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached screen root
    pub fn create_screen(&mut self) -> ScreenHandle {
        ScreenHandle(self.insert(Widget::new(WidgetKind::Screen, None)))
    }

    /// Create a button under `parent`
    pub fn create_button(&mut self, parent: WidgetId) -> Result<WidgetId, WidgetError> {
        self.create_child(parent, WidgetKind::Button)
    }

    /// Create a text label under `parent`
    pub fn create_label(&mut self, parent: WidgetId, text: &str) -> Result<WidgetId, WidgetError> {
        self.create_child(parent, WidgetKind::Label(text.to_owned()))
    }

    pub fn get(&self, id: WidgetId) -> Option<&Widget> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.widget.as_ref())
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live widgets
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.widget.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every live widget id, in slot order
    pub fn ids(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.widget.as_ref().map(|_| WidgetId {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    /// The handle for `id` if it is a live screen root
    pub fn screen(&self, id: WidgetId) -> Option<ScreenHandle> {
        match self.get(id)?.kind {
            WidgetKind::Screen => Some(ScreenHandle(id)),
            _ => None,
        }
    }

    /// Screen root that `id` belongs to
    pub fn root_of(&self, id: WidgetId) -> Option<ScreenHandle> {
        let mut current = id;
        loop {
            let widget = self.get(current)?;
            match widget.parent {
                Some(parent) => current = parent,
                None => return self.screen(current),
            }
        }
    }

    pub fn has_state(&self, id: WidgetId, state: State) -> bool {
        self.get(id).is_some_and(|w| w.state.contains(state))
    }

    pub fn add_state(&mut self, id: WidgetId, state: State) -> Result<(), WidgetError> {
        self.update(id, |w| w.state.insert(state))
    }

    pub fn remove_state(&mut self, id: WidgetId, state: State) -> Result<(), WidgetError> {
        self.update(id, |w| w.state.remove(state))
    }

    /// Reference the registry record for `role` while `selector` is active
    pub fn add_style(
        &mut self,
        id: WidgetId,
        role: StyleRole,
        selector: State,
    ) -> Result<(), WidgetError> {
        self.update(id, |w| w.styles.push((role, selector)))
    }

    /// Drop every style reference and local override
    pub fn remove_style_all(&mut self, id: WidgetId) -> Result<(), WidgetError> {
        self.update(id, |w| {
            w.styles.clear();
            w.local = StyleRecord::default();
        })
    }

    pub fn set_local_bg_color(&mut self, id: WidgetId, color: Rgb888) -> Result<(), WidgetError> {
        self.update(id, |w| w.local.bg_color = Some(color))
    }

    pub fn set_size(&mut self, id: WidgetId, width: SizeSpec, height: SizeSpec) -> Result<(), WidgetError> {
        self.update(id, |w| {
            w.width = width;
            w.height = height;
        })
    }

    pub fn set_layout(&mut self, id: WidgetId, layout: Layout) -> Result<(), WidgetError> {
        self.update(id, |w| w.layout = layout)
    }

    /// Resolve the attributes `id` is drawn with in its current state
    ///
    /// Text color is inherited from the parent. On top of that: base style,
    /// then every referenced role whose selector is a subset of the current
    /// state (in the order added), then local overrides.
    pub fn resolve_style(&self, id: WidgetId, registry: &StyleRegistry) -> Option<ComputedStyle> {
        let widget = self.get(id)?;
        let mut style = ComputedStyle::default();
        if let Some(parent) = widget.parent.and_then(|p| self.resolve_style(p, registry)) {
            style.text_color = parent.text_color;
        }
        style.apply(&widget.base_style());
        for (role, selector) in &widget.styles {
            if widget.state.contains(*selector) {
                style.apply(registry.get(*role));
            }
        }
        style.apply(&widget.local);
        Some(style)
    }

    /// Delete `id` and its whole subtree, returning every removed id
    pub fn delete(&mut self, id: WidgetId) -> Result<Vec<WidgetId>, WidgetError> {
        let parent = self.get(id).ok_or(WidgetError::Stale(id))?.parent;
        if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
            parent.children.retain(|child| *child != id);
        }

        let mut removed = Vec::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let Some(slot) = self.slots.get_mut(next.index as usize) else {
                continue;
            };
            if slot.generation != next.generation {
                continue;
            }
            if let Some(widget) = slot.widget.take() {
                pending.extend(widget.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(next.index);
                removed.push(next);
            }
        }
        self.dirty = true;
        Ok(removed)
    }

    /// Whether anything changed since the last call
    pub fn take_dirty(&mut self) -> bool {
        core::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn get_mut(&mut self, id: WidgetId) -> Option<&mut Widget> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.widget.as_mut())
    }

    fn update(&mut self, id: WidgetId, f: impl FnOnce(&mut Widget)) -> Result<(), WidgetError> {
        let widget = self.get_mut(id).ok_or(WidgetError::Stale(id))?;
        f(widget);
        self.dirty = true;
        Ok(())
    }

    fn create_child(&mut self, parent: WidgetId, kind: WidgetKind) -> Result<WidgetId, WidgetError> {
        if !self.contains(parent) {
            return Err(WidgetError::Stale(parent));
        }
        let id = self.insert(Widget::new(kind, Some(parent)));
        if let Some(parent) = self.get_mut(parent) {
            parent.children.push(id);
        }
        Ok(id)
    }

    fn insert(&mut self, widget: Widget) -> WidgetId {
        self.dirty = true;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.widget = Some(widget);
            return WidgetId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            widget: Some(widget),
        });
        WidgetId {
            index,
            generation: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::palette;

    #[test]
    fn children_are_linked_in_order() {
        let mut tree = WidgetTree::new();
        let screen = tree.create_screen();
        let a = tree.create_button(screen.id()).unwrap();
        let b = tree.create_button(screen.id()).unwrap();
        let label = tree.create_label(a, "Replay").unwrap();

        assert_eq!(tree.get(screen.id()).unwrap().children(), &[a, b]);
        assert_eq!(tree.get(label).unwrap().text(), Some("Replay"));
        assert_eq!(tree.root_of(label), Some(screen));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn delete_removes_subtree_and_invalidates_ids() {
        let mut tree = WidgetTree::new();
        let screen = tree.create_screen();
        let button = tree.create_button(screen.id()).unwrap();
        let label = tree.create_label(button, "New").unwrap();
        let other = tree.create_screen();

        let removed = tree.delete(screen.id()).unwrap();
        assert_eq!(removed.len(), 3);
        assert!(!tree.contains(label));
        assert!(tree.contains(other.id()));
        assert_eq!(tree.add_state(button, State::FOCUSED), Err(WidgetError::Stale(button)));
    }

    #[test]
    fn reused_slot_does_not_resurrect_old_id() {
        let mut tree = WidgetTree::new();
        let first = tree.create_screen();
        tree.delete(first.id()).unwrap();
        let second = tree.create_screen();

        assert_ne!(first, second);
        assert!(tree.get(first.id()).is_none());
        assert!(tree.get(second.id()).is_some());
    }

    #[test]
    fn deleting_child_unlinks_it_from_parent() {
        let mut tree = WidgetTree::new();
        let screen = tree.create_screen();
        let a = tree.create_button(screen.id()).unwrap();
        let b = tree.create_button(screen.id()).unwrap();
        tree.delete(a).unwrap();
        assert_eq!(tree.get(screen.id()).unwrap().children(), &[b]);
    }

    #[test]
    fn state_bits() {
        let mut state = State::FOCUSED | State::PRESSED;
        assert!(state.contains(State::FOCUSED));
        assert!(state.contains(State::DEFAULT));
        state.remove(State::FOCUSED);
        assert!(!state.contains(State::FOCUSED));
        assert!(state.contains(State::PRESSED));
    }

    #[test]
    fn style_follows_state() {
        let registry = StyleRegistry::init();
        let mut tree = WidgetTree::new();
        let screen = tree.create_screen();
        let button = tree.create_button(screen.id()).unwrap();
        tree.add_style(button, StyleRole::Normal, State::DEFAULT).unwrap();
        tree.add_style(button, StyleRole::Focused, State::FOCUSED).unwrap();
        tree.add_style(button, StyleRole::Disabled, State::DISABLED).unwrap();

        let idle = tree.resolve_style(button, &registry).unwrap();
        assert_eq!(idle.bg_color, palette::WHITE);
        assert_eq!(idle.text_color, palette::BLACK);

        tree.add_state(button, State::FOCUSED).unwrap();
        let focused = tree.resolve_style(button, &registry).unwrap();
        assert_eq!(focused.bg_color, palette::BLACK);
        assert_eq!(focused.text_color, palette::WHITE);
        assert_eq!(focused.radius, 8);

        tree.remove_state(button, State::FOCUSED).unwrap();
        tree.add_state(button, State::DISABLED).unwrap();
        let disabled = tree.resolve_style(button, &registry).unwrap();
        assert_eq!(disabled.bg_color, palette::GREY_LIGHTEN_3);
    }

    #[test]
    fn label_inherits_text_color() {
        let registry = StyleRegistry::init();
        let mut tree = WidgetTree::new();
        let screen = tree.create_screen();
        let button = tree.create_button(screen.id()).unwrap();
        tree.add_style(button, StyleRole::Normal, State::DEFAULT).unwrap();
        tree.add_style(button, StyleRole::Focused, State::FOCUSED).unwrap();
        let label = tree.create_label(button, "Replay").unwrap();
        tree.add_state(button, State::FOCUSED).unwrap();

        let style = tree.resolve_style(label, &registry).unwrap();
        assert_eq!(style.text_color, palette::WHITE);
        assert!(!style.bg_opa.is_visible());
    }

    #[test]
    fn local_override_wins() {
        let registry = StyleRegistry::init();
        let mut tree = WidgetTree::new();
        let screen = tree.create_screen();
        tree.set_local_bg_color(screen.id(), palette::DEEP_BLUE).unwrap();
        let style = tree.resolve_style(screen.id(), &registry).unwrap();
        assert_eq!(style.bg_color, palette::DEEP_BLUE);
        assert!(style.bg_opa.is_visible());
    }

    #[test]
    fn mutations_mark_dirty() {
        let mut tree = WidgetTree::new();
        let screen = tree.create_screen();
        assert!(tree.take_dirty());
        assert!(!tree.take_dirty());
        tree.add_state(screen.id(), State::FOCUSED).unwrap();
        assert!(tree.take_dirty());
    }
}
