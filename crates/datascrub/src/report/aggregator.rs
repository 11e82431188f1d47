use crate::error::{DatascrubError, Result};
use crate::report::category::{BadgeStyle, IssueCategory, KnownCategory};
use crate::types::{IssueReport, json_kind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

// ============================================================================
// Aggregated report types
// ============================================================================

/// One `field: value` line of a category's details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailEntry {
    pub field: String,
    pub value: String,
}

/// Share of one class label within a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassShare {
    pub label: String,
    pub proportion: f64,
    /// Proportion with exactly four decimal places.
    pub formatted: String,
}

/// Class distribution of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDistribution {
    pub field: String,
    pub classes: Vec<ClassShare>,
}

/// Rendered details contributed by one raw report key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetailFragment {
    /// Duplicate rows: a single total.
    Total { count: u64 },
    /// One line per affected field.
    Entries { entries: Vec<DetailEntry> },
    /// Per-field class distributions.
    Distributions { distributions: Vec<ClassDistribution> },
}

/// Display-ready summary of one display category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: IssueCategory,
    pub display_name: String,
    /// Sum of the counts of every raw key that maps to this display name.
    pub count: u64,
    /// One fragment per contributing raw key, in report order.
    pub details: Vec<DetailFragment>,
    pub badge: BadgeStyle,
}

/// Result of [`ReportAggregator::aggregate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub summaries: Vec<CategorySummary>,
    pub total_issue_count: u64,
    pub has_issues: bool,
}

impl AggregatedReport {
    /// Find a summary by display name.
    pub fn summary(&self, display_name: &str) -> Option<&CategorySummary> {
        self.summaries
            .iter()
            .find(|summary| summary.display_name == display_name)
    }
}

// ============================================================================
// Aggregator
// ============================================================================

struct Slot {
    category: IssueCategory,
    display_name: String,
    count: u64,
    details: Vec<DetailFragment>,
    badge: BadgeStyle,
}

/// Turns a raw [`IssueReport`] into counted, ordered category summaries.
pub struct ReportAggregator;

impl ReportAggregator {
    /// Aggregate a report.
    ///
    /// Known categories come first in their fixed order, then unrecognised
    /// categories in first-seen order. Categories with a zero count are
    /// dropped from `summaries`.
    ///
    /// # Errors
    ///
    /// Returns [`DatascrubError::MalformedReport`] when a category detail has
    /// the wrong shape, e.g. a non-numeric class-imbalance proportion.
    pub fn aggregate(report: &IssueReport) -> Result<AggregatedReport> {
        let mut slots: Vec<Slot> = KnownCategory::ALL
            .iter()
            .map(|known| {
                let (style_class, icon) = known.badge_parts();
                Slot {
                    category: IssueCategory::Known(*known),
                    display_name: known.display_name().to_string(),
                    count: 0,
                    details: Vec::new(),
                    badge: BadgeStyle::new(style_class, icon),
                }
            })
            .collect();
        let mut index: HashMap<String, usize> = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.display_name.clone(), i))
            .collect();

        for (key, detail) in report.iter() {
            let category = IssueCategory::from_key(key);
            let (count, fragment) = match &category {
                IssueCategory::Known(KnownCategory::Duplicates) => {
                    let count = duplicate_count(key, detail)?;
                    (count, DetailFragment::Total { count })
                }
                IssueCategory::Known(KnownCategory::ClassImbalance) => {
                    let distributions = class_distributions(key, detail)?;
                    (
                        distributions.len() as u64,
                        DetailFragment::Distributions { distributions },
                    )
                }
                _ => {
                    let entries = detail_entries(key, detail)?;
                    (entries.len() as u64, DetailFragment::Entries { entries })
                }
            };

            let display_name = category.display_name().to_string();
            let slot_index = match index.get(&display_name) {
                Some(&i) => i,
                None => {
                    debug!("Unrecognised issue category '{}'", key);
                    slots.push(Slot {
                        category: category.clone(),
                        display_name: display_name.clone(),
                        count: 0,
                        details: Vec::new(),
                        badge: BadgeStyle::fallback_for(key),
                    });
                    index.insert(display_name, slots.len() - 1);
                    slots.len() - 1
                }
            };

            let slot = &mut slots[slot_index];
            slot.count = add_count(key, slot.count, count)?;
            if count > 0 {
                slot.details.push(fragment);
            }
        }

        let total_issue_count = slots
            .iter()
            .try_fold(0u64, |acc, slot| add_count(&slot.display_name, acc, slot.count))?;
        let summaries: Vec<CategorySummary> = slots
            .into_iter()
            .filter(|slot| slot.count > 0)
            .map(|slot| CategorySummary {
                category: slot.category,
                display_name: slot.display_name,
                count: slot.count,
                details: slot.details,
                badge: slot.badge,
            })
            .collect();

        debug!(
            "Aggregated {} categories into {} summaries ({} issues)",
            report.len(),
            summaries.len(),
            total_issue_count
        );

        Ok(AggregatedReport {
            summaries,
            total_issue_count,
            has_issues: total_issue_count > 0,
        })
    }
}

// ============================================================================
// Category detail parsing
// ============================================================================

fn malformed(key: &str, reason: impl std::fmt::Display) -> DatascrubError {
    DatascrubError::MalformedReport(format!("category '{}': {}", key, reason))
}

fn non_negative_integer(key: &str, value: &Value) -> Result<u64> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
        _ => Err(malformed(
            key,
            format!("expected a non-negative integer count, got {}", value),
        )),
    }
}

fn add_count(key: &str, acc: u64, count: u64) -> Result<u64> {
    acc.checked_add(count)
        .ok_or_else(|| malformed(key, "issue count does not fit in 64 bits"))
}

/// `duplicates` is a bare count; `{"total_duplicates": n}` is also accepted.
fn duplicate_count(key: &str, detail: &Value) -> Result<u64> {
    match detail {
        Value::Null => Ok(0),
        Value::Object(map) => map
            .values()
            .try_fold(0u64, |acc, v| add_count(key, acc, non_negative_integer(key, v)?)),
        other => non_negative_integer(key, other),
    }
}

fn detail_map<'a>(key: &str, detail: &'a Value) -> Result<Option<&'a Map<String, Value>>> {
    match detail {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(malformed(
            key,
            format!("expected an object of fields, got {}", json_kind(other)),
        )),
    }
}

fn detail_entries(key: &str, detail: &Value) -> Result<Vec<DetailEntry>> {
    let Some(map) = detail_map(key, detail)? else {
        return Ok(Vec::new());
    };

    Ok(map
        .iter()
        .map(|(field, value)| DetailEntry {
            field: field.clone(),
            value: match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        })
        .collect())
}

fn class_distributions(key: &str, detail: &Value) -> Result<Vec<ClassDistribution>> {
    let Some(map) = detail_map(key, detail)? else {
        return Ok(Vec::new());
    };

    map.iter()
        .map(|(field, classes)| {
            let Value::Object(classes) = classes else {
                return Err(malformed(
                    key,
                    format!(
                        "field '{}' must map class labels to proportions, got {}",
                        field,
                        json_kind(classes)
                    ),
                ));
            };

            let classes = classes
                .iter()
                .map(|(label, proportion)| {
                    let value = proportion
                        .as_f64()
                        .filter(|p| p.is_finite())
                        .ok_or_else(|| {
                            malformed(
                                key,
                                format!(
                                    "proportion of class '{}' in '{}' is not a finite number: {}",
                                    label, field, proportion
                                ),
                            )
                        })?;
                    Ok(ClassShare {
                        label: label.clone(),
                        proportion: value,
                        formatted: format!("{:.4}", value),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(ClassDistribution {
                field: field.clone(),
                classes,
            })
        })
        .collect()
}
