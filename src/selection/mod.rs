use std::collections::HashSet;

use crate::record::SchoolRecord;

/// Set of selected record uuids. Membership is by id only, so a record
/// re-fetched later is still recognized as selected. Survives pagination,
/// filtering and sorting; only an explicit action clears it.
#[derive(Clone, Debug, Default)]
pub struct SelectionSet {
    ids: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Idempotent single toggle: re-adding or re-removing is a no-op.
    pub fn select_one(&mut self, id: &str, checked: bool) {
        if checked {
            self.ids.insert(id.to_string());
        } else {
            self.ids.remove(id);
        }
    }

    /// Selects or deselects exactly the displayed records; ids from other
    /// pages are left as they were.
    pub fn select_all(&mut self, displayed: &[SchoolRecord], checked: bool) {
        for record in displayed {
            self.select_one(&record.uuid, checked);
        }
    }

    pub fn selected_on_page(&self, displayed: &[SchoolRecord]) -> usize {
        displayed.iter().filter(|r| self.contains(&r.uuid)).count()
    }

    /// Tri-state checkbox condition: some but not all displayed rows are
    /// selected. An empty page is never indeterminate.
    pub fn is_indeterminate(&self, displayed: &[SchoolRecord]) -> bool {
        if displayed.is_empty() {
            return false;
        }
        let on_page = self.selected_on_page(displayed);
        on_page > 0 && on_page < displayed.len()
    }

    pub fn is_all_selected(&self, displayed: &[SchoolRecord]) -> bool {
        !displayed.is_empty() && self.selected_on_page(displayed) == displayed.len()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
