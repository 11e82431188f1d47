//! Issue categories, their display names and badge styles.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Icon used for categories the client does not know about.
pub const FALLBACK_ICON: &str = "bi-exclamation-circle";

/// Categories the client has a display name for.
///
/// Variant order is the fixed order summaries and badges are shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownCategory {
    Missing,
    Duplicates,
    Formatting,
    Outliers,
    Dtypes,
    ClassImbalance,
    CategoricalConversionNeeded,
    LexicalIssues,
}

static KEY_INDEX: Lazy<HashMap<&'static str, KnownCategory>> = Lazy::new(|| {
    KnownCategory::ALL
        .iter()
        .map(|category| (category.key(), *category))
        .collect()
});

impl KnownCategory {
    /// All known categories in display order.
    pub const ALL: [KnownCategory; 8] = [
        Self::Missing,
        Self::Duplicates,
        Self::Formatting,
        Self::Outliers,
        Self::Dtypes,
        Self::ClassImbalance,
        Self::CategoricalConversionNeeded,
        Self::LexicalIssues,
    ];

    /// Report key the server uses for this category.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Duplicates => "duplicates",
            Self::Formatting => "formatting",
            Self::Outliers => "outliers",
            Self::Dtypes => "dtypes",
            Self::ClassImbalance => "class_imbalance",
            Self::CategoricalConversionNeeded => "categorical_conversion_needed",
            Self::LexicalIssues => "lexical_issues",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Missing => "Missing Values",
            Self::Duplicates => "Duplicate Data",
            Self::Formatting => "Format Issues",
            Self::Outliers => "Outliers",
            Self::Dtypes => "Data Type Issues",
            Self::ClassImbalance => "Class Imbalance",
            Self::CategoricalConversionNeeded => "Categorical Conversion Needed",
            Self::LexicalIssues => "Lexical Issues",
        }
    }

    /// `(style class, icon id)` of this category's badge.
    pub fn badge_parts(&self) -> (&'static str, &'static str) {
        match self {
            Self::Missing => ("missing", "bi-exclamation-triangle"),
            Self::Duplicates => ("duplicate", "bi-files"),
            Self::Formatting | Self::Dtypes => ("format", "bi-type"),
            Self::Outliers => ("outlier", "bi-graph-up"),
            Self::ClassImbalance => ("imbalance", "bi-bar-chart"),
            Self::CategoricalConversionNeeded => ("categorical", "bi-tags"),
            Self::LexicalIssues => ("lexical", "bi-spellcheck"),
        }
    }

    /// Case-insensitive lookup of a report key.
    pub fn from_key(key: &str) -> Option<Self> {
        KEY_INDEX.get(key.to_lowercase().as_str()).copied()
    }

    /// Exact lookup of a display name.
    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.display_name() == name)
    }
}

/// A report category: either one the client knows or a raw server key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Known(KnownCategory),
    Other(String),
}

impl IssueCategory {
    /// Classify a report key. Unknown keys are kept verbatim.
    pub fn from_key(key: &str) -> Self {
        match KnownCategory::from_key(key) {
            Some(known) => Self::Known(known),
            None => Self::Other(key.to_string()),
        }
    }

    /// Display name; unknown categories display as their raw key.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Known(known) => known.display_name(),
            Self::Other(key) => key,
        }
    }
}

/// Style class and icon of a summary badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeStyle {
    pub style_class: String,
    pub icon: String,
}

impl BadgeStyle {
    pub fn new(style_class: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            style_class: style_class.into(),
            icon: icon.into(),
        }
    }

    /// Badge for a known display name, `None` for anything else.
    pub fn for_display_name(name: &str) -> Option<Self> {
        KnownCategory::from_display_name(name).map(|category| {
            let (style_class, icon) = category.badge_parts();
            Self::new(style_class, icon)
        })
    }

    /// Badge for a display name, or `default` when the name is not known.
    pub fn lookup(name: &str, default: BadgeStyle) -> Self {
        Self::for_display_name(name).unwrap_or(default)
    }

    /// Default badge for an unrecognised category: the raw key doubles as the
    /// style class.
    pub fn fallback_for(raw_key: &str) -> Self {
        Self::new(raw_key, FALLBACK_ICON)
    }
}
