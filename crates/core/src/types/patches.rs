//! Set-valued jersey patches.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The sleeve patches chosen for a customized jersey.
///
/// Two line items with the same patches in a different order are the same
/// product, so this is a set rather than a list. Iteration and storage order
/// is sorted, which makes the `TEXT[]` column deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PatchSet(BTreeSet<String>);

impl PatchSet {
    /// Build a set from any list, dropping blanks and duplicates.
    #[must_use]
    pub fn from_list<I, S>(patches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            patches
                .into_iter()
                .map(Into::into)
                .map(|p| p.trim().to_owned())
                .filter(|p| !p.is_empty())
                .collect(),
        )
    }

    /// Sorted patch names, as written to the database.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// Whether a stored patch list holds the same patches as this set.
    #[must_use]
    pub fn matches(&self, stored: &[String]) -> bool {
        *self == Self::from_list(stored.iter().map(String::as_str))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for PatchSet {
    fn from(patches: Vec<String>) -> Self {
        Self::from_list(patches)
    }
}

impl From<PatchSet> for Vec<String> {
    fn from(set: PatchSet) -> Self {
        set.0.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_independent() {
        assert_eq!(
            PatchSet::from_list(["Champions League", "Liga Portugal"]),
            PatchSet::from_list(["Liga Portugal", "Champions League"])
        );
    }

    #[test]
    fn test_duplicates_and_blanks_collapse() {
        let set = PatchSet::from_list(["A", "A", " ", "B "]);
        assert_eq!(set.to_vec(), vec!["A".to_owned(), "B".to_owned()]);
    }

    #[test]
    fn test_matches_stored_list_in_any_order() {
        let set = PatchSet::from_list(["B", "A"]);
        assert!(set.matches(&["A".to_owned(), "B".to_owned()]));
        assert!(set.matches(&["B".to_owned(), "A".to_owned(), "A".to_owned()]));
        assert!(!set.matches(&["A".to_owned()]));
        assert!(PatchSet::default().matches(&[]));
    }

    #[test]
    fn test_serializes_sorted() {
        let set = PatchSet::from_list(["Z", "M"]);
        assert_eq!(
            serde_json::to_value(&set).ok(),
            Some(serde_json::json!(["M", "Z"]))
        );
    }
}
