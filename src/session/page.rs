//! Pages scheduled for review.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// ReviewPage
// ============================================================================

/// One page or route of the application under review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPage {
    /// Human-readable name, used as the page key in the feedback log.
    pub name: String,
    /// Route relative to the app URL.
    pub path: String,
    /// What to look for on this page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ReviewPage {
    /// Creates a page with a name and path.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            description: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl From<&str> for ReviewPage {
    /// Uses the route as both name and path.
    fn from(path: &str) -> Self {
        Self::new(path, path)
    }
}

impl From<String> for ReviewPage {
    fn from(path: String) -> Self {
        Self::new(path.clone(), path)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_from_path() {
        let page = ReviewPage::from("/pricing");
        assert_eq!(page.name, "/pricing");
        assert_eq!(page.path, "/pricing");
        assert!(page.description.is_none());
    }

    #[test]
    fn test_serialization_skips_missing_description() {
        let page = ReviewPage::new("Home", "/");
        assert_eq!(
            serde_json::to_value(&page).expect("json"),
            json!({ "name": "Home", "path": "/" })
        );

        let page = page.with_description("hero and nav");
        assert_eq!(
            serde_json::to_value(&page).expect("json")["description"],
            "hero and nav"
        );
    }

    #[test]
    fn test_deserialize_without_description() {
        let page: ReviewPage =
            serde_json::from_value(json!({ "name": "Signup", "path": "/signup" })).expect("page");
        assert_eq!(page, ReviewPage::new("Signup", "/signup"));
    }
}
