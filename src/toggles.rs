//! Feature-toggle list editor.
//!
//! ## Design
//! - Independent of the sample-size engine; shares nothing with it
//! - [`ToggleList`] is copy-on-write: every operation returns a new list and
//!   leaves the receiver untouched
//! - Ids are `<slug-of-name>-<created_at_ms>`, suffixed `-2`, `-3`, ... on collision
//!
//! New toggles start disabled with a 0% rollout.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ToggleError;

pub const MAX_ROLLOUT: u32 = 100;

/// Current Unix epoch in milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Lowercase ASCII slug: alphanumerics kept, every other run becomes one `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("toggle");
    }
    slug
}

// ---------------------------------------------------------------------------
// FeatureToggle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureToggle {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    /// Percentage of users exposed, 0 to 100.
    pub rollout: u8,
    pub description: String,
    pub created_at_ms: u64,
}

// ---------------------------------------------------------------------------
// ToggleList
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToggleList(Vec<FeatureToggle>);

impl ToggleList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggles(&self) -> &[FeatureToggle] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&FeatureToggle> {
        self.0.iter().find(|t| t.id == id)
    }

    fn contains_id(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn unique_id(&self, name: &str, created_at_ms: u64) -> String {
        let base = format!("{}-{created_at_ms}", slugify(name));
        if !self.contains_id(&base) {
            return base;
        }
        (2u32..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !self.contains_id(candidate))
            .unwrap_or(base)
    }

    /// Append a new, disabled toggle. The new toggle is the last element.
    pub fn with_added(
        &self,
        name: &str,
        description: &str,
        created_at_ms: u64,
    ) -> Result<Self, ToggleError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ToggleError::EmptyName);
        }
        let toggle = FeatureToggle {
            id: self.unique_id(name, created_at_ms),
            name: name.to_string(),
            enabled: false,
            rollout: 0,
            description: description.trim().to_string(),
            created_at_ms,
        };
        let mut next = self.0.clone();
        next.push(toggle);
        Ok(Self(next))
    }

    /// Copy the list, applying `edit` to the toggle with `id`.
    fn with_edit(
        &self,
        id: &str,
        edit: impl FnOnce(&mut FeatureToggle),
    ) -> Result<Self, ToggleError> {
        let mut next = self.0.clone();
        let toggle = next
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ToggleError::UnknownId(id.to_string()))?;
        edit(toggle);
        Ok(Self(next))
    }

    pub fn with_enabled(&self, id: &str, enabled: bool) -> Result<Self, ToggleError> {
        self.with_edit(id, |t| t.enabled = enabled)
    }

    /// Flip the enabled flag.
    pub fn with_toggled(&self, id: &str) -> Result<Self, ToggleError> {
        self.with_edit(id, |t| t.enabled = !t.enabled)
    }

    pub fn with_rollout(&self, id: &str, rollout: u32) -> Result<Self, ToggleError> {
        if rollout > MAX_ROLLOUT {
            return Err(ToggleError::RolloutOutOfRange(rollout));
        }
        // bounded by MAX_ROLLOUT above
        let rollout = rollout as u8;
        self.with_edit(id, |t| t.rollout = rollout)
    }

    pub fn with_description(&self, id: &str, description: &str) -> Result<Self, ToggleError> {
        let description = description.trim().to_string();
        self.with_edit(id, |t| t.description = description)
    }

    pub fn with_removed(&self, id: &str) -> Result<Self, ToggleError> {
        if !self.contains_id(id) {
            return Err(ToggleError::UnknownId(id.to_string()));
        }
        Ok(Self(self.0.iter().filter(|t| t.id != id).cloned().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one() -> ToggleList {
        ToggleList::new()
            .with_added("New Checkout", "one-page flow", 1_700_000_000_000)
            .unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("New Checkout"), "new-checkout");
        assert_eq!(slugify("  --Dark  mode!! "), "dark-mode");
        assert_eq!(slugify("!!!"), "toggle");
        assert_eq!(slugify("Über v2"), "ber-v2");
    }

    #[test]
    fn test_added_toggle_defaults() {
        let list = one();
        let t = &list.toggles()[0];
        assert_eq!(t.id, "new-checkout-1700000000000");
        assert_eq!(t.name, "New Checkout");
        assert!(!t.enabled);
        assert_eq!(t.rollout, 0);
        assert_eq!(t.description, "one-page flow");
    }

    #[test]
    fn test_add_rejects_blank_name() {
        assert_eq!(
            ToggleList::new().with_added("   ", "", 1),
            Err(ToggleError::EmptyName)
        );
    }

    #[test]
    fn test_colliding_ids_get_suffix() {
        let list = one()
            .with_added("new checkout", "", 1_700_000_000_000)
            .unwrap()
            .with_added("NEW CHECKOUT", "", 1_700_000_000_000)
            .unwrap();
        let ids: Vec<&str> = list.toggles().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "new-checkout-1700000000000",
                "new-checkout-1700000000000-2",
                "new-checkout-1700000000000-3"
            ]
        );
    }

    #[test]
    fn test_operations_leave_receiver_untouched() {
        let before = one();
        let id = before.toggles()[0].id.clone();
        let after = before.with_enabled(&id, true).unwrap();
        assert!(!before.get(&id).unwrap().enabled);
        assert!(after.get(&id).unwrap().enabled);

        let removed = before.with_removed(&id).unwrap();
        assert_eq!(before.len(), 1);
        assert!(removed.is_empty());
    }

    #[test]
    fn test_toggle_flips() {
        let list = one();
        let id = list.toggles()[0].id.clone();
        let on = list.with_toggled(&id).unwrap();
        let off = on.with_toggled(&id).unwrap();
        assert!(on.get(&id).unwrap().enabled);
        assert!(!off.get(&id).unwrap().enabled);
    }

    #[test]
    fn test_rollout_bounds() {
        let list = one();
        let id = list.toggles()[0].id.clone();
        assert_eq!(list.with_rollout(&id, 100).unwrap().get(&id).unwrap().rollout, 100);
        assert_eq!(list.with_rollout(&id, 0).unwrap().get(&id).unwrap().rollout, 0);
        assert_eq!(
            list.with_rollout(&id, 101),
            Err(ToggleError::RolloutOutOfRange(101))
        );
    }

    #[test]
    fn test_unknown_id() {
        let list = one();
        assert_eq!(
            list.with_enabled("missing", true),
            Err(ToggleError::UnknownId("missing".into()))
        );
        assert!(list.with_removed("missing").is_err());
        assert!(list.with_description("missing", "x").is_err());
    }

    #[test]
    fn test_description_update() {
        let list = one();
        let id = list.toggles()[0].id.clone();
        let next = list.with_description(&id, "  two-step flow ").unwrap();
        assert_eq!(next.get(&id).unwrap().description, "two-step flow");
    }

    #[test]
    fn test_serializes_as_array() {
        let json = serde_json::to_value(one()).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["createdAtMs"], 1_700_000_000_000u64);
        assert_eq!(json[0]["rollout"], 0);
    }

    #[test]
    fn test_now_ms_is_reasonable() {
        // After 2023-11-01
        assert!(now_ms() > 1_698_796_800_000);
    }
}
