//! Modifier ("extra") schema.
//!
//! A product exposes zero or more [`ModifierGroup`]s, each a constraint scope
//! over its [`Modifier`]s, plus a list of ungrouped modifiers that are always
//! optional and toggled independently.

use serde::{Deserialize, Serialize};

use crate::types::{GroupId, ModifierId, Price};

/// Whether a group behaves like radio buttons or checkboxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionType {
    /// At most one modifier can be chosen.
    Single,
    /// Any number of modifiers, bounded by `max_selections`.
    #[default]
    Multiple,
}

/// An optional add-on priced independently of the base product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub id: ModifierId,
    pub name: String,
    pub price: Price,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub display_order: i32,
    /// Owning group, `None` for ungrouped modifiers.
    #[serde(default)]
    pub group_id: Option<GroupId>,
    /// Catalog hint that this modifier should start selected.
    #[serde(default)]
    pub is_default: bool,
}

const fn default_available() -> bool {
    true
}

/// A named constraint scope over a set of modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierGroup {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub selection_type: SelectionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_selections: u32,
    /// Upper bound on selections, `None` meaning unbounded.
    #[serde(default)]
    pub max_selections: Option<u32>,
    #[serde(default)]
    pub display_order: i32,
}

impl ModifierGroup {
    /// Upper bound actually enforced: a single group always allows exactly one,
    /// whatever its configured maximum.
    #[must_use]
    pub fn effective_max(&self) -> Option<u32> {
        match self.selection_type {
            SelectionType::Single => Some(1),
            SelectionType::Multiple => self.max_selections,
        }
    }

    /// Lower bound actually enforced: a required group needs at least one.
    #[must_use]
    pub fn effective_min(&self) -> u32 {
        if self.required {
            self.min_selections.max(1)
        } else {
            self.min_selections
        }
    }

    /// Check that the group's bounds can be satisfied at all.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] describing an unsatisfiable bound.
    pub fn check(&self) -> Result<(), SchemaError> {
        let min = self.effective_min();
        match self.effective_max() {
            Some(0) if self.required => Err(SchemaError::RequiredWithoutCapacity {
                group_id: self.id.clone(),
            }),
            Some(max) if min > max => Err(SchemaError::MinExceedsMax {
                group_id: self.id.clone(),
                min,
                max,
            }),
            _ => Ok(()),
        }
    }
}

/// A group together with its modifiers, ordered by `display_order`.
///
/// This is the shape the selection validator walks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSchema {
    #[serde(flatten)]
    pub group: ModifierGroup,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

impl GroupSchema {
    /// Find a modifier of this group that can currently be chosen.
    #[must_use]
    pub fn available(&self, id: &ModifierId) -> Option<&Modifier> {
        self.modifiers.iter().find(|m| m.available && &m.id == id)
    }

    /// First available modifier by `display_order`, ties broken by position.
    #[must_use]
    pub fn first_available(&self) -> Option<&Modifier> {
        self.modifiers
            .iter()
            .filter(|m| m.available)
            .min_by_key(|m| m.display_order)
    }

    /// Check group bounds and modifier ownership.
    ///
    /// Collects every problem rather than stopping at the first.
    #[must_use]
    pub fn check(&self) -> Vec<SchemaError> {
        let mut errors = Vec::new();
        if let Err(e) = self.group.check() {
            errors.push(e);
        }

        for (i, modifier) in self.modifiers.iter().enumerate() {
            if let Some(owner) = &modifier.group_id
                && owner != &self.group.id
            {
                errors.push(SchemaError::ForeignModifier {
                    group_id: self.group.id.clone(),
                    modifier_id: modifier.id.clone(),
                });
            }
            let seen_before = self
                .modifiers
                .iter()
                .take(i)
                .any(|other| other.id == modifier.id);
            if seen_before {
                errors.push(SchemaError::DuplicateModifier {
                    group_id: self.group.id.clone(),
                    modifier_id: modifier.id.clone(),
                });
            }
        }

        errors
    }
}

/// Problems that make a group impossible to satisfy or ambiguous.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The lower bound is above the upper bound.
    #[error("group {group_id}: minimum {min} exceeds maximum {max}")]
    MinExceedsMax {
        group_id: GroupId,
        min: u32,
        max: u32,
    },
    /// A required group that can never hold a selection.
    #[error("group {group_id}: required but allows no selections")]
    RequiredWithoutCapacity { group_id: GroupId },
    /// A modifier listed under a group it does not belong to.
    #[error("group {group_id}: modifier {modifier_id} belongs to another group")]
    ForeignModifier {
        group_id: GroupId,
        modifier_id: ModifierId,
    },
    /// The same modifier id appears twice in one group.
    #[error("group {group_id}: modifier {modifier_id} is listed twice")]
    DuplicateModifier {
        group_id: GroupId,
        modifier_id: ModifierId,
    },
}
