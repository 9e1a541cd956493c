//! In-progress modifier choices for one product.
//!
//! A [`Selection`] lives only while a customization dialog is open. It maps
//! each group to the ordered set of modifiers chosen in it. Ungrouped
//! modifiers are tracked separately by the caller as a plain id set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::modifier::SelectionType;
use crate::types::{GroupId, ModifierId};

/// Chosen modifiers per group.
///
/// Within a group ids are unique and keep the order they were chosen in.
/// Groups with nothing chosen are not stored, so two selections with the same
/// choices always compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<GroupId, Vec<ModifierId>>", into = "BTreeMap<GroupId, Vec<ModifierId>>")]
pub struct Selection {
    groups: BTreeMap<GroupId, Vec<ModifierId>>,
}

impl Selection {
    /// An empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Modifiers chosen in a group, in the order they were chosen.
    #[must_use]
    pub fn selected(&self, group_id: &GroupId) -> &[ModifierId] {
        self.groups.get(group_id).map_or(&[], Vec::as_slice)
    }

    /// Number of modifiers chosen in a group.
    #[must_use]
    pub fn count(&self, group_id: &GroupId) -> usize {
        self.selected(group_id).len()
    }

    /// Whether a modifier is chosen in a group.
    #[must_use]
    pub fn contains(&self, group_id: &GroupId, modifier_id: &ModifierId) -> bool {
        self.selected(group_id).contains(modifier_id)
    }

    /// Whether nothing is chosen in any group.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate over groups with at least one choice.
    pub fn iter(&self) -> impl Iterator<Item = (&GroupId, &[ModifierId])> {
        self.groups.iter().map(|(g, ids)| (g, ids.as_slice()))
    }

    /// Return a new selection with `modifier_id` toggled in `group_id`.
    ///
    /// For single-choice groups the group's set is replaced by
    /// `{modifier_id}`. For multiple-choice groups membership is flipped;
    /// upper bounds are left to validation. `self` is not modified.
    #[must_use]
    pub fn toggled(
        &self,
        group_id: &GroupId,
        modifier_id: &ModifierId,
        selection_type: SelectionType,
    ) -> Self {
        let mut next = self.clone();
        match selection_type {
            SelectionType::Single => {
                next.groups
                    .insert(group_id.clone(), vec![modifier_id.clone()]);
            }
            SelectionType::Multiple => {
                let ids = next.groups.entry(group_id.clone()).or_default();
                if let Some(pos) = ids.iter().position(|id| id == modifier_id) {
                    ids.remove(pos);
                } else {
                    ids.push(modifier_id.clone());
                }
                if ids.is_empty() {
                    next.groups.remove(group_id);
                }
            }
        }
        next
    }

    /// Return a new selection with the group's choices replaced.
    #[must_use]
    pub fn with_group(&self, group_id: &GroupId, ids: impl IntoIterator<Item = ModifierId>) -> Self {
        let mut next = self.clone();
        let ids = dedup(ids.into_iter().collect());
        if ids.is_empty() {
            next.groups.remove(group_id);
        } else {
            next.groups.insert(group_id.clone(), ids);
        }
        next
    }
}

fn dedup(ids: Vec<ModifierId>) -> Vec<ModifierId> {
    let mut out: Vec<ModifierId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

impl From<BTreeMap<GroupId, Vec<ModifierId>>> for Selection {
    fn from(raw: BTreeMap<GroupId, Vec<ModifierId>>) -> Self {
        let groups = raw
            .into_iter()
            .map(|(group, ids)| (group, dedup(ids)))
            .filter(|(_, ids)| !ids.is_empty())
            .collect();
        Self { groups }
    }
}

impl From<Selection> for BTreeMap<GroupId, Vec<ModifierId>> {
    fn from(selection: Selection) -> Self {
        selection.groups
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gid(s: &str) -> GroupId {
        GroupId::new(s).unwrap()
    }

    fn mid(s: &str) -> ModifierId {
        ModifierId::new(s).unwrap()
    }

    #[test]
    fn test_single_replaces() {
        let sel = Selection::new()
            .toggled(&gid("size"), &mid("s"), SelectionType::Single)
            .toggled(&gid("size"), &mid("l"), SelectionType::Single);
        assert_eq!(sel.selected(&gid("size")), [mid("l")]);
    }

    #[test]
    fn test_single_reselect_keeps_choice() {
        let sel = Selection::new()
            .toggled(&gid("size"), &mid("s"), SelectionType::Single)
            .toggled(&gid("size"), &mid("s"), SelectionType::Single);
        assert_eq!(sel.count(&gid("size")), 1);
    }

    #[test]
    fn test_multiple_toggles_membership_and_keeps_order() {
        let g = gid("toppings");
        let sel = Selection::new()
            .toggled(&g, &mid("b"), SelectionType::Multiple)
            .toggled(&g, &mid("a"), SelectionType::Multiple)
            .toggled(&g, &mid("c"), SelectionType::Multiple)
            .toggled(&g, &mid("a"), SelectionType::Multiple);
        assert_eq!(sel.selected(&g), [mid("b"), mid("c")]);
    }

    #[test]
    fn test_toggle_does_not_mutate_input() {
        let g = gid("toppings");
        let before = Selection::new().toggled(&g, &mid("a"), SelectionType::Multiple);
        let after = before.toggled(&g, &mid("b"), SelectionType::Multiple);
        assert_eq!(before.count(&g), 1);
        assert_eq!(after.count(&g), 2);
    }

    #[test]
    fn test_emptied_group_is_dropped() {
        let g = gid("toppings");
        let sel = Selection::new()
            .toggled(&g, &mid("a"), SelectionType::Multiple)
            .toggled(&g, &mid("a"), SelectionType::Multiple);
        assert!(sel.is_empty());
        assert_eq!(sel, Selection::new());
    }

    #[test]
    fn test_deserialize_dedups_and_drops_empty() {
        let sel: Selection =
            serde_json::from_str(r#"{"toppings": ["a", "b", "a"], "size": []}"#).unwrap();
        assert_eq!(sel.selected(&gid("toppings")), [mid("a"), mid("b")]);
        assert_eq!(sel.iter().count(), 1);
    }

    #[test]
    fn test_with_group_replaces() {
        let g = gid("toppings");
        let sel = Selection::new().with_group(&g, [mid("x"), mid("y"), mid("x")]);
        assert_eq!(sel.selected(&g), [mid("x"), mid("y")]);
        assert!(sel.with_group(&g, []).is_empty());
    }
}
