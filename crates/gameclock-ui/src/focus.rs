//! Keypad focus group

use crate::widget::WidgetId;

/// Ordered set of focusable objects with at most one focused
#[derive(Debug, Default)]
pub struct FocusGroup {
    members: Vec<WidgetId>,
    focused: Option<usize>,
}

impl FocusGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id`; returns true when it became the focused object
    ///
    /// The first object added gets focus. Adding a member twice is a no-op.
    pub fn add(&mut self, id: WidgetId) -> bool {
        if self.members.contains(&id) {
            return false;
        }
        self.members.push(id);
        if self.focused.is_none() {
            self.focused = Some(self.members.len() - 1);
            return true;
        }
        false
    }

    pub fn focused(&self) -> Option<WidgetId> {
        self.focused.and_then(|i| self.members.get(i).copied())
    }

    pub fn members(&self) -> &[WidgetId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Move focus forward, wrapping; returns `(old, new)` when it moved
    pub fn focus_next(&mut self) -> Option<(WidgetId, WidgetId)> {
        self.step(1)
    }

    /// Move focus backward, wrapping; returns `(old, new)` when it moved
    pub fn focus_prev(&mut self) -> Option<(WidgetId, WidgetId)> {
        self.step(self.members.len().saturating_sub(1))
    }

    /// Drop `id`; returns true if it held focus
    ///
    /// Focus then passes to the member that took its place, or the first one.
    pub fn remove(&mut self, id: WidgetId) -> bool {
        let Some(index) = self.members.iter().position(|m| *m == id) else {
            return false;
        };
        self.members.remove(index);
        let Some(focused) = self.focused else {
            return false;
        };
        if self.members.is_empty() {
            self.focused = None;
        } else if focused > index {
            self.focused = Some(focused - 1);
        } else if focused == index {
            self.focused = Some(index % self.members.len());
        }
        focused == index
    }

    fn step(&mut self, by: usize) -> Option<(WidgetId, WidgetId)> {
        let current = self.focused?;
        let next = (current + by) % self.members.len();
        if next == current {
            return None;
        }
        self.focused = Some(next);
        Some((self.members[current], self.members[next]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::WidgetTree;

    fn ids(n: usize) -> Vec<WidgetId> {
        let mut tree = WidgetTree::new();
        (0..n).map(|_| tree.create_screen().id()).collect()
    }

    #[test]
    fn first_member_takes_focus() {
        let ids = ids(2);
        let mut group = FocusGroup::new();
        assert!(group.add(ids[0]));
        assert!(!group.add(ids[1]));
        assert!(!group.add(ids[0]));
        assert_eq!(group.focused(), Some(ids[0]));
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn next_and_prev_wrap() {
        let ids = ids(3);
        let mut group = FocusGroup::new();
        for id in &ids {
            group.add(*id);
        }
        assert_eq!(group.focus_prev(), Some((ids[0], ids[2])));
        assert_eq!(group.focus_next(), Some((ids[2], ids[0])));
        assert_eq!(group.focus_next(), Some((ids[0], ids[1])));
    }

    #[test]
    fn single_member_never_moves() {
        let ids = ids(1);
        let mut group = FocusGroup::new();
        group.add(ids[0]);
        assert_eq!(group.focus_next(), None);
        assert_eq!(group.focus_prev(), None);
    }

    #[test]
    fn removing_focused_passes_focus_on() {
        let ids = ids(3);
        let mut group = FocusGroup::new();
        for id in &ids {
            group.add(*id);
        }
        group.focus_next();
        assert!(group.remove(ids[1]));
        assert_eq!(group.focused(), Some(ids[2]));
        assert!(!group.remove(ids[0]));
        assert_eq!(group.focused(), Some(ids[2]));
        assert!(group.remove(ids[2]));
        assert_eq!(group.focused(), None);
        assert!(group.is_empty());
    }
}
