use std::collections::BTreeSet;

use foundation::OverlayId;

/// Result of diffing two id sets.
///
/// Ordering contract:
/// - `to_add` follows the order of the incoming list.
/// - `to_remove` is in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdDiff {
    pub to_add: Vec<OverlayId>,
    pub to_remove: Vec<OverlayId>,
}

impl IdDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Deterministic id set used to diff rendered entities against a new scene.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSet {
    ids: BTreeSet<OverlayId>,
}

impl IdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &OverlayId) -> bool {
        self.ids.contains(id)
    }

    /// Returns `true` if the set changed.
    pub fn insert(&mut self, id: OverlayId) -> bool {
        self.ids.insert(id)
    }

    /// Returns `true` if the set changed.
    pub fn remove(&mut self, id: &OverlayId) -> bool {
        self.ids.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverlayId> + '_ {
        self.ids.iter()
    }

    /// Computes `incoming - self` (to add) and `self - incoming` (to remove).
    ///
    /// Duplicate ids in `incoming` are reported once.
    pub fn diff<'a>(&self, incoming: impl IntoIterator<Item = &'a OverlayId>) -> IdDiff {
        let mut seen = BTreeSet::new();
        let mut to_add = Vec::new();
        for id in incoming {
            if !seen.insert(id) {
                continue;
            }
            if !self.ids.contains(id) {
                to_add.push(id.clone());
            }
        }
        let to_remove = self
            .ids
            .iter()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();
        IdDiff { to_add, to_remove }
    }
}

impl FromIterator<OverlayId> for IdSet {
    fn from_iter<T: IntoIterator<Item = OverlayId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
