//! The user's ad-hoc multi-pick of map points.
//!
//! Lifecycle is independent of filtering: a selected point stays selected
//! when the active filter hides it, and clearing filters never clears the
//! selection.

use crate::model::PointId;

/// Insertion-ordered set of point identities toggled on by map clicks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<PointId>,
}

impl SelectionSet {
    /// Empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the id if absent, remove it if present. Returns true when the id
    /// is selected afterwards.
    pub fn toggle(&mut self, id: &PointId) -> bool {
        if let Some(position) = self.ids.iter().position(|known| known == id) {
            self.ids.remove(position);
            false
        } else {
            self.ids.push(id.clone());
            true
        }
    }

    /// True when the id is currently selected.
    pub fn contains(&self, id: &PointId) -> bool {
        self.ids.iter().any(|known| known == id)
    }

    /// Remove every selected id.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Number of selected ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in the order they were first toggled on.
    pub fn iter(&self) -> impl Iterator<Item = &PointId> {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_then_removes() {
        let mut selection = SelectionSet::new();
        assert!(selection.toggle(&PointId::from(1)));
        assert!(selection.contains(&PointId::from(1)));
        assert!(!selection.toggle(&PointId::from(1)));
        assert!(selection.is_empty());
    }

    #[test]
    fn double_toggle_restores_prior_state() {
        let mut selection = SelectionSet::new();
        selection.toggle(&PointId::from("a"));
        let before = selection.clone();
        selection.toggle(&PointId::from("b"));
        selection.toggle(&PointId::from("b"));
        assert_eq!(selection, before);
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut selection = SelectionSet::new();
        selection.toggle(&PointId::from(3));
        selection.toggle(&PointId::from(1));
        selection.toggle(&PointId::from(2));
        let order: Vec<_> = selection.iter().cloned().collect();
        assert_eq!(
            order,
            vec![PointId::from(3), PointId::from(1), PointId::from(2)]
        );
    }

    #[test]
    fn clear_empties_the_set() {
        let mut selection = SelectionSet::new();
        selection.toggle(&PointId::from(1));
        selection.toggle(&PointId::from(2));
        selection.clear();
        assert!(selection.is_empty());
        assert_eq!(selection.len(), 0);
    }

    #[test]
    fn string_and_numeric_ids_do_not_collide() {
        let mut selection = SelectionSet::new();
        selection.toggle(&PointId::from(1));
        selection.toggle(&PointId::from("1"));
        assert_eq!(selection.len(), 2);
    }
}
