//! Append-only feedback log.
//!
//! The log never rejects an item: missing or unrecognized fields fall back
//! to defaults (`page = "unknown"`, `category = visual`, `severity = minor`).
//!
//! # Example
//!
//! ```
//! use feedback_copilot::session::{FeedbackInput, ReviewLog};
//!
//! let mut log = ReviewLog::new();
//! log.add(FeedbackInput::new("crash on submit").page("/signup").severity("critical"));
//!
//! let summary = log.summary();
//! assert_eq!(summary.total, 1);
//! assert_eq!(summary.by_severity.critical, 1);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Page recorded when the caller gives none.
const UNKNOWN_PAGE: &str = "unknown";

// ============================================================================
// Category
// ============================================================================

/// Kind of issue being reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Something is broken.
    Bug,
    /// Layout, spacing, color.
    #[default]
    Visual,
    /// Interaction or flow problem.
    Ux,
    /// Slow or janky.
    Performance,
    /// Copy or media.
    Content,
    /// Something missing.
    FeatureRequest,
}

impl Category {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Visual => "visual",
            Self::Ux => "ux",
            Self::Performance => "performance",
            Self::Content => "content",
            Self::FeatureRequest => "feature_request",
        }
    }

    /// Parses a wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bug" => Some(Self::Bug),
            "visual" => Some(Self::Visual),
            "ux" => Some(Self::Ux),
            "performance" => Some(Self::Performance),
            "content" => Some(Self::Content),
            "feature_request" => Some(Self::FeatureRequest),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Severity
// ============================================================================

/// How much an issue matters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocks the user.
    Critical,
    /// Hurts the experience.
    Major,
    /// Noticeable but harmless.
    #[default]
    Minor,
    /// Nice to have.
    Suggestion,
}

impl Severity {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Suggestion => "suggestion",
        }
    }

    /// Parses a wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "critical" => Some(Self::Critical),
            "major" => Some(Self::Major),
            "minor" => Some(Self::Minor),
            "suggestion" => Some(Self::Suggestion),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FeedbackInput
// ============================================================================

/// Loosely-typed feedback as supplied by the caller.
///
/// Every field is optional so that tool arguments can be deserialized as-is.
/// A field holding anything other than a string is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedbackInput {
    /// Page the feedback is about.
    #[serde(default, deserialize_with = "lenient_string")]
    pub page: Option<String>,
    /// Category wire name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    /// Severity wire name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub severity: Option<String>,
    /// Free-text description.
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    /// Selector or label of the element concerned.
    #[serde(default, deserialize_with = "lenient_string")]
    pub element: Option<String>,
}

/// Reads a string field, mapping any other JSON value to `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

impl FeedbackInput {
    /// Creates input with a description and nothing else.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }

    /// Sets the page.
    #[must_use]
    pub fn page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    /// Sets the category wire name.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the severity wire name.
    #[must_use]
    pub fn severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    /// Sets the element.
    #[must_use]
    pub fn element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }
}

// ============================================================================
// FeedbackItem
// ============================================================================

/// A logged piece of feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackItem {
    /// 1-based, assigned by the log.
    pub id: u64,
    /// When the item was logged.
    pub timestamp: DateTime<Utc>,
    /// Page the feedback is about.
    pub page: String,
    /// Kind of issue.
    pub category: Category,
    /// How much it matters.
    pub severity: Severity,
    /// Free-text description.
    pub description: String,
    /// Element concerned, if known.
    pub element: Option<String>,
}

// ============================================================================
// ReviewSummary
// ============================================================================

/// Per-severity counts. All four severities are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    /// Critical items.
    pub critical: usize,
    /// Major items.
    pub major: usize,
    /// Minor items.
    pub minor: usize,
    /// Suggestions.
    pub suggestion: usize,
}

impl SeverityCounts {
    /// Returns the count for one severity.
    #[must_use]
    pub const fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Major => self.major,
            Severity::Minor => self.minor,
            Severity::Suggestion => self.suggestion,
        }
    }

    fn bump(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::Major => self.major += 1,
            Severity::Minor => self.minor += 1,
            Severity::Suggestion => self.suggestion += 1,
        }
    }
}

/// Aggregate view of the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    /// Number of items.
    pub total: usize,
    /// Counts per severity.
    #[serde(rename = "bySeverity")]
    pub by_severity: SeverityCounts,
    /// Counts per page.
    #[serde(rename = "byPage")]
    pub by_page: BTreeMap<String, usize>,
    /// Number of distinct pages with feedback.
    pub pages_reviewed: usize,
}

// ============================================================================
// ReviewLog
// ============================================================================

/// Append-only list of feedback items.
#[derive(Debug, Clone)]
pub struct ReviewLog {
    /// Items in id order.
    items: Vec<FeedbackItem>,
    /// Id for the next item.
    next_id: u64,
}

impl Default for ReviewLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }

    /// Appends an item, filling defaults, and returns a copy of the stored entry.
    pub fn add(&mut self, input: FeedbackInput) -> FeedbackItem {
        let category = input
            .category
            .as_deref()
            .and_then(Category::from_name)
            .unwrap_or_default();
        let severity = input
            .severity
            .as_deref()
            .and_then(Severity::from_name)
            .unwrap_or_default();

        let item = FeedbackItem {
            id: self.next_id,
            timestamp: Utc::now(),
            page: input
                .page
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| UNKNOWN_PAGE.to_string()),
            category,
            severity,
            description: input.description.unwrap_or_default(),
            element: input.element.filter(|e| !e.is_empty()),
        };

        self.next_id += 1;
        self.items.push(item.clone());
        item
    }

    /// Returns every item in id order.
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[FeedbackItem] {
        &self.items
    }

    /// Returns the items logged against one page.
    #[must_use]
    pub fn by_page(&self, page: &str) -> Vec<&FeedbackItem> {
        self.items.iter().filter(|item| item.page == page).collect()
    }

    /// Returns the number of items.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing has been logged.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Aggregates the log in one pass.
    #[must_use]
    pub fn summary(&self) -> ReviewSummary {
        let mut by_severity = SeverityCounts::default();
        let mut by_page: BTreeMap<String, usize> = BTreeMap::new();

        for item in &self.items {
            by_severity.bump(item.severity);
            *by_page.entry(item.page.clone()).or_default() += 1;
        }

        ReviewSummary {
            total: self.items.len(),
            by_severity,
            pages_reviewed: by_page.len(),
            by_page,
        }
    }

    /// Returns the distinct pages with feedback, in first-logged order.
    #[must_use]
    pub fn pages(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .map(|item| item.page.as_str())
            .filter(|page| seen.insert(*page))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_summary_counts() {
        let mut log = ReviewLog::new();
        log.add(
            FeedbackInput::new("crash")
                .page("home")
                .category("bug")
                .severity("critical"),
        );
        log.add(FeedbackInput::new("typo").page("home").severity("minor"));

        let summary = log.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.by_severity.critical, 1);
        assert_eq!(summary.by_severity.minor, 1);
        assert_eq!(summary.by_severity.major, 0);
        assert_eq!(summary.by_severity.suggestion, 0);
        assert_eq!(summary.pages_reviewed, 1);
        assert_eq!(summary.by_page.get("home"), Some(&2));
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let mut log = ReviewLog::new();
        let item = log.add(FeedbackInput::default());

        assert_eq!(item.id, 1);
        assert_eq!(item.page, "unknown");
        assert_eq!(item.category, Category::Visual);
        assert_eq!(item.severity, Severity::Minor);
        assert_eq!(item.description, "");
        assert_eq!(item.element, None);
    }

    #[test]
    fn test_unknown_names_fall_back() {
        let mut log = ReviewLog::new();
        let item = log
            .add(FeedbackInput::new("x").category("vibes").severity("apocalyptic"));
        assert_eq!(item.category, Category::Visual);
        assert_eq!(item.severity, Severity::Minor);
    }

    #[test]
    fn test_deserialize_tool_arguments() {
        let input: FeedbackInput = serde_json::from_value(json!({
            "page": "/pricing",
            "category": "feature_request",
            "severity": "suggestion",
            "description": "add annual toggle",
            "element": "#plans"
        }))
        .expect("input");

        let mut log = ReviewLog::new();
        let item = log.add(input);
        assert_eq!(item.category, Category::FeatureRequest);
        assert_eq!(item.severity, Severity::Suggestion);
        assert_eq!(item.element.as_deref(), Some("#plans"));
    }

    #[test]
    fn test_deserialize_tolerates_wrong_types() {
        let input: FeedbackInput = serde_json::from_value(json!({
            "page": null,
            "severity": 3,
            "category": ["ux"],
            "description": "button overlaps footer",
            "element": 5
        }))
        .expect("input");

        assert_eq!(input, FeedbackInput::new("button overlaps footer"));

        let mut log = ReviewLog::new();
        let item = log.add(input);
        assert_eq!(item.page, "unknown");
        assert_eq!(item.severity, Severity::Minor);
        assert_eq!(item.category, Category::Visual);
        assert!(item.element.is_none());
    }

    #[test]
    fn test_add_returns_stored_item() {
        let mut log = ReviewLog::new();
        let first = log.add(FeedbackInput::new("a"));
        let second = log.add(FeedbackInput::new("b"));

        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(log.items(), [first, second]);
    }

    #[test]
    fn test_by_page_and_pages() {
        let mut log = ReviewLog::new();
        log.add(FeedbackInput::new("a").page("/b"));
        log.add(FeedbackInput::new("b").page("/a"));
        log.add(FeedbackInput::new("c").page("/b"));

        assert_eq!(log.by_page("/b").len(), 2);
        assert!(log.by_page("/missing").is_empty());
        assert_eq!(log.pages(), vec!["/b", "/a"]);
        assert_eq!(log.len(), 3);
        assert!(!log.is_empty());
    }

    #[test]
    fn test_summary_does_not_mutate() {
        let mut log = ReviewLog::new();
        log.add(FeedbackInput::new("a"));
        let before = log.items().to_vec();
        let _ = log.summary();
        let _ = log.summary();
        assert_eq!(log.items(), before.as_slice());
    }

    #[test]
    fn test_summary_serialization() {
        let value = serde_json::to_value(ReviewLog::new().summary()).expect("json");
        assert_eq!(
            value,
            json!({
                "total": 0,
                "bySeverity": { "critical": 0, "major": 0, "minor": 0, "suggestion": 0 },
                "byPage": {},
                "pages_reviewed": 0
            })
        );
    }

    #[test]
    fn test_item_serialization() {
        let mut log = ReviewLog::new();
        let item = log.add(FeedbackInput::new("slow").category("performance"));
        let value = serde_json::to_value(&item).expect("json");
        assert_eq!(value["id"], 1);
        assert_eq!(value["category"], "performance");
        assert_eq!(value["severity"], "minor");
        assert!(value["timestamp"].as_str().is_some());
    }

    proptest! {
        #[test]
        fn prop_ids_are_sequential(pages in proptest::collection::vec("[a-c]", 0..30)) {
            let mut log = ReviewLog::new();
            for page in &pages {
                log.add(FeedbackInput::new("x").page(page.clone()));
            }

            for (i, item) in log.items().iter().enumerate() {
                prop_assert_eq!(item.id, i as u64 + 1);
            }

            let summary = log.summary();
            prop_assert_eq!(summary.total, pages.len());
            prop_assert_eq!(summary.by_page.values().sum::<usize>(), pages.len());
            prop_assert_eq!(summary.pages_reviewed, log.pages().len());
        }
    }
}
