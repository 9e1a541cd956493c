//! Selection constraint validator.
//!
//! Pure functions over a [`Selection`] and a product's [`ModifierSchema`].
//! Nothing here performs I/O or keeps state between calls. An invalid
//! selection is an ordinary [`ValidationResult`], never an error: the caller
//! decides whether to block confirmation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::cart::ChosenModifier;
use crate::catalog::ModifierSchema;
use crate::modifier::{GroupSchema, Modifier, SelectionType};
use crate::selection::Selection;
use crate::types::{GroupId, ModifierId, Price};

/// How the initial selection is chosen when a customization dialog opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultSelectionPolicy {
    /// Required single-choice groups start with their first available
    /// modifier; everything else starts empty.
    #[default]
    FirstAvailable,
    /// Modifiers flagged `is_default` in the catalog start selected, capped
    /// at the group's upper bound.
    Flagged,
    /// Every group starts empty.
    None,
}

impl DefaultSelectionPolicy {
    /// Build the initial selection for a product's groups.
    #[must_use]
    pub fn select(self, groups: &[GroupSchema]) -> Selection {
        let mut selection = Selection::new();
        for schema in groups {
            let ids: Vec<ModifierId> = match self {
                Self::FirstAvailable => {
                    if schema.group.required && schema.group.selection_type == SelectionType::Single
                    {
                        schema.first_available().map(|m| m.id.clone()).into_iter().collect()
                    } else {
                        Vec::new()
                    }
                }
                Self::Flagged => {
                    let cap = schema
                        .group
                        .effective_max()
                        .map_or(usize::MAX, |max| usize::try_from(max).unwrap_or(usize::MAX));
                    schema
                        .modifiers
                        .iter()
                        .filter(|m| m.available && m.is_default)
                        .take(cap)
                        .map(|m| m.id.clone())
                        .collect()
                }
                Self::None => Vec::new(),
            };
            selection = selection.with_group(&schema.group.id, ids);
        }
        selection
    }
}

impl std::str::FromStr for DefaultSelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-available" => Ok(Self::FirstAvailable),
            "flagged" => Ok(Self::Flagged),
            "none" => Ok(Self::None),
            other => Err(format!(
                "unknown default selection policy '{other}' (expected first-available, flagged or none)"
            )),
        }
    }
}

/// Initial selection under the default policy.
#[must_use]
pub fn default_selection(groups: &[GroupSchema]) -> Selection {
    DefaultSelectionPolicy::default().select(groups)
}

/// Toggle a modifier in a group, returning the new selection.
#[must_use]
pub fn toggle(
    selection: &Selection,
    group_id: &GroupId,
    modifier_id: &ModifierId,
    selection_type: SelectionType,
) -> Selection {
    selection.toggled(group_id, modifier_id, selection_type)
}

/// Which rule a group violates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Fewer choices than the group's minimum.
    BelowMinimum { min: u32, selected: usize },
    /// More choices than the group's maximum.
    AboveMaximum { max: u32, selected: usize },
    /// A chosen id is not an available modifier of the group.
    UnknownModifier { modifier_id: ModifierId },
}

/// One violated group, for highlighting in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupError {
    pub group_id: GroupId,
    pub group_name: String,
    pub violation: Violation,
    pub message: String,
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<GroupError>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<GroupError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Check a selection against every group, in declaration order.
///
/// Each violated group yields exactly one [`GroupError`]. Rules are checked
/// in order: below minimum, above maximum, unknown modifier. All groups are
/// checked so every violation can be shown at once.
#[must_use]
pub fn validate(selection: &Selection, groups: &[GroupSchema]) -> ValidationResult {
    let errors = groups
        .iter()
        .filter_map(|schema| {
            check_group(selection, schema).map(|violation| GroupError {
                group_id: schema.group.id.clone(),
                group_name: schema.group.name.clone(),
                message: message_for(&violation, schema.group.selection_type),
                violation,
            })
        })
        .collect();

    ValidationResult::from_errors(errors)
}

fn check_group(selection: &Selection, schema: &GroupSchema) -> Option<Violation> {
    let chosen = selection.selected(&schema.group.id);
    let count = chosen.len();

    let min = schema.group.effective_min();
    if count < usize::try_from(min).unwrap_or(usize::MAX) {
        return Some(Violation::BelowMinimum {
            min,
            selected: count,
        });
    }

    if let Some(max) = schema.group.effective_max()
        && count > usize::try_from(max).unwrap_or(usize::MAX)
    {
        return Some(Violation::AboveMaximum {
            max,
            selected: count,
        });
    }

    chosen
        .iter()
        .find(|id| schema.available(id).is_none())
        .map(|id| Violation::UnknownModifier {
            modifier_id: id.clone(),
        })
}

fn message_for(violation: &Violation, selection_type: SelectionType) -> String {
    match violation {
        Violation::BelowMinimum { min: 1, .. } => "Select an option".to_string(),
        Violation::BelowMinimum { min, .. } => format!("Select at least {min} options"),
        Violation::AboveMaximum { .. } if selection_type == SelectionType::Single => {
            "Select only one option".to_string()
        }
        Violation::AboveMaximum { max, .. } => format!("Select at most {max} options"),
        Violation::UnknownModifier { .. } => "Invalid selection".to_string(),
    }
}

/// Sum of the prices of everything chosen.
///
/// Includes grouped choices and independently toggled ungrouped modifiers.
/// Ids that do not resolve to an available modifier contribute nothing;
/// [`validate`] reports them.
#[must_use]
pub fn price_delta(
    selection: &Selection,
    ungrouped_ids: &BTreeSet<ModifierId>,
    schema: &ModifierSchema,
) -> Price {
    chosen(selection, ungrouped_ids, schema)
        .map(|(modifier, _)| modifier.price)
        .sum()
}

/// Flatten grouped and ungrouped choices into the list handed to the cart.
///
/// Grouped entries come first, in group declaration order and then choice
/// order, and carry their group's id and name. Ungrouped entries follow in
/// catalog order with no group.
#[must_use]
pub fn resolve(
    selection: &Selection,
    ungrouped_ids: &BTreeSet<ModifierId>,
    schema: &ModifierSchema,
) -> Vec<ChosenModifier> {
    chosen(selection, ungrouped_ids, schema)
        .map(|(modifier, group)| ChosenModifier {
            id: modifier.id.clone(),
            name: modifier.name.clone(),
            price: modifier.price,
            group_id: group.map(|g| g.group.id.clone()),
            group_name: group.map(|g| g.group.name.clone()),
        })
        .collect()
}

fn chosen<'a>(
    selection: &'a Selection,
    ungrouped_ids: &'a BTreeSet<ModifierId>,
    schema: &'a ModifierSchema,
) -> impl Iterator<Item = (&'a Modifier, Option<&'a GroupSchema>)> + 'a {
    let grouped = schema.groups.iter().flat_map(move |group| {
        selection
            .selected(&group.group.id)
            .iter()
            .filter_map(move |id| group.available(id).map(|m| (m, Some(group))))
    });

    let ungrouped = schema
        .ungrouped
        .iter()
        .filter(move |m| m.available && ungrouped_ids.contains(&m.id))
        .map(|m| (m, None));

    grouped.chain(ungrouped)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::modifier::ModifierGroup;

    fn gid(s: &str) -> GroupId {
        GroupId::new(s).unwrap()
    }

    fn mid(s: &str) -> ModifierId {
        ModifierId::new(s).unwrap()
    }

    fn modifier(id: &str, cents: i64, order: i32) -> Modifier {
        Modifier {
            id: mid(id),
            name: id.to_uppercase(),
            price: Price::from_cents(cents).unwrap(),
            available: true,
            display_order: order,
            group_id: None,
            is_default: false,
        }
    }

    fn group(
        id: &str,
        selection_type: SelectionType,
        required: bool,
        min: u32,
        max: Option<u32>,
        modifiers: Vec<Modifier>,
    ) -> GroupSchema {
        GroupSchema {
            group: ModifierGroup {
                id: gid(id),
                name: id.to_string(),
                selection_type,
                required,
                min_selections: min,
                max_selections: max,
                display_order: 0,
            },
            modifiers,
        }
    }

    fn size_group() -> GroupSchema {
        group(
            "size",
            SelectionType::Single,
            true,
            1,
            Some(1),
            vec![modifier("a", 0, 0), modifier("b", 150, 1)],
        )
    }

    fn toppings_group(max: Option<u32>) -> GroupSchema {
        group(
            "toppings",
            SelectionType::Multiple,
            false,
            0,
            max,
            vec![modifier("t1", 100, 0), modifier("t2", 200, 1), modifier("t3", 300, 2)],
        )
    }

    #[test]
    fn test_required_single_without_choice_reports_one_error() {
        let groups = vec![size_group()];
        let result = validate(&Selection::new(), &groups);

        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].group_id, gid("size"));
        assert_eq!(
            result.errors[0].violation,
            Violation::BelowMinimum { min: 1, selected: 0 }
        );
        assert_eq!(result.errors[0].message, "Select an option");
    }

    #[test]
    fn test_required_single_with_free_choice_is_valid() {
        let groups = vec![size_group()];
        let schema = ModifierSchema {
            groups: groups.clone(),
            ungrouped: vec![],
        };
        let sel = toggle(&Selection::new(), &gid("size"), &mid("a"), SelectionType::Single);

        assert!(validate(&sel, &groups).is_valid);
        assert_eq!(price_delta(&sel, &BTreeSet::new(), &schema), Price::ZERO);
    }

    #[test]
    fn test_over_max_flags_only_that_group() {
        let groups = vec![size_group(), toppings_group(Some(2))];
        let g = gid("toppings");
        let sel = Selection::new()
            .toggled(&gid("size"), &mid("a"), SelectionType::Single)
            .toggled(&g, &mid("t1"), SelectionType::Multiple)
            .toggled(&g, &mid("t2"), SelectionType::Multiple)
            .toggled(&g, &mid("t3"), SelectionType::Multiple);

        let result = validate(&sel, &groups);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].group_id, g);
        assert_eq!(
            result.errors[0].violation,
            Violation::AboveMaximum { max: 2, selected: 3 }
        );
        assert_eq!(result.errors[0].message, "Select at most 2 options");
    }

    #[test]
    fn test_reports_every_violated_group() {
        let groups = vec![
            size_group(),
            toppings_group(Some(1)),
            group(
                "sauces",
                SelectionType::Multiple,
                false,
                2,
                None,
                vec![modifier("s1", 0, 0), modifier("s2", 0, 1)],
            ),
        ];
        let sel = Selection::new()
            .with_group(&gid("toppings"), [mid("t1"), mid("t2")])
            .with_group(&gid("sauces"), [mid("s1")]);

        let result = validate(&sel, &groups);
        let ids: Vec<_> = result.errors.iter().map(|e| e.group_id.as_str()).collect();
        assert_eq!(ids, ["size", "toppings", "sauces"]);
        assert_eq!(result.errors[2].message, "Select at least 2 options");
    }

    #[test]
    fn test_optional_group_with_min_is_enforced() {
        let groups = vec![group(
            "sauces",
            SelectionType::Multiple,
            false,
            2,
            None,
            vec![modifier("s1", 0, 0), modifier("s2", 0, 1)],
        )];
        assert!(!validate(&Selection::new(), &groups).is_valid);
    }

    #[test]
    fn test_unbounded_max() {
        let groups = vec![toppings_group(None)];
        let sel = Selection::new().with_group(&gid("toppings"), [mid("t1"), mid("t2"), mid("t3")]);
        assert!(validate(&sel, &groups).is_valid);
    }

    #[test]
    fn test_unknown_modifier_is_reported() {
        let groups = vec![toppings_group(None)];
        let sel = Selection::new().with_group(&gid("toppings"), [mid("t1"), mid("nope")]);

        let result = validate(&sel, &groups);
        assert_eq!(
            result.errors[0].violation,
            Violation::UnknownModifier { modifier_id: mid("nope") }
        );
    }

    #[test]
    fn test_single_group_over_one_message() {
        let groups = vec![size_group()];
        let sel = Selection::new().with_group(&gid("size"), [mid("a"), mid("b")]);
        let result = validate(&sel, &groups);
        assert_eq!(result.errors[0].message, "Select only one option");
    }

    #[test]
    fn test_no_groups_is_always_valid() {
        let sel = Selection::new().with_group(&gid("ghost"), [mid("x")]);
        let result = validate(&sel, &[]);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_default_selection_preselects_required_single() {
        let mut size = size_group();
        size.modifiers[0].available = false;
        let groups = vec![size, toppings_group(None)];

        let sel = default_selection(&groups);
        assert_eq!(sel.selected(&gid("size")), [mid("b")]);
        assert_eq!(sel.count(&gid("toppings")), 0);
        assert!(validate(&sel, &groups).is_valid);
    }

    #[test]
    fn test_default_selection_leaves_optional_single_empty() {
        let mut size = size_group();
        size.group.required = false;
        size.group.min_selections = 0;
        assert!(default_selection(&[size]).is_empty());
    }

    #[test]
    fn test_flagged_policy_caps_at_max() {
        let mut toppings = toppings_group(Some(2));
        for m in &mut toppings.modifiers {
            m.is_default = true;
        }
        let sel = DefaultSelectionPolicy::Flagged.select(&[toppings]);
        assert_eq!(sel.selected(&gid("toppings")), [mid("t1"), mid("t2")]);
    }

    #[test]
    fn test_none_policy_is_empty() {
        assert!(DefaultSelectionPolicy::None.select(&[size_group()]).is_empty());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "flagged".parse::<DefaultSelectionPolicy>().unwrap(),
            DefaultSelectionPolicy::Flagged
        );
        assert!("random".parse::<DefaultSelectionPolicy>().is_err());
    }

    #[test]
    fn test_price_delta_includes_ungrouped() {
        let schema = ModifierSchema {
            groups: vec![size_group(), toppings_group(None)],
            ungrouped: vec![modifier("napkins", 25, 0), modifier("bag", 50, 1)],
        };
        let sel = Selection::new()
            .with_group(&gid("size"), [mid("b")])
            .with_group(&gid("toppings"), [mid("t2")]);
        let ungrouped = BTreeSet::from([mid("bag")]);

        let delta = price_delta(&sel, &ungrouped, &schema);
        assert_eq!(delta.amount(), Decimal::new(400, 2));
    }

    #[test]
    fn test_resolve_attaches_groups_and_matches_delta() {
        let schema = ModifierSchema {
            groups: vec![size_group(), toppings_group(None)],
            ungrouped: vec![modifier("napkins", 25, 0), modifier("bag", 50, 1)],
        };
        let sel = Selection::new()
            .with_group(&gid("toppings"), [mid("t3"), mid("t1"), mid("bogus")])
            .with_group(&gid("size"), [mid("a")]);
        let ungrouped = BTreeSet::from([mid("bag"), mid("napkins")]);

        let resolved = resolve(&sel, &ungrouped, &schema);
        let ids: Vec<_> = resolved.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a", "t3", "t1", "napkins", "bag"]);

        assert_eq!(resolved[0].group_id, Some(gid("size")));
        assert_eq!(resolved[0].group_name.as_deref(), Some("size"));
        assert_eq!(resolved[3].group_id, None);
        assert_eq!(resolved[3].group_name, None);

        let total: Price = resolved.iter().map(|m| m.price).sum();
        assert_eq!(total, price_delta(&sel, &ungrouped, &schema));
    }
}
