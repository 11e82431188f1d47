//! Issue-report aggregation.
//!
//! This module turns the raw report returned by `/analyze` into
//! display-ready category summaries. It performs no I/O.
//!
//! # Example
//!
//! ```rust,ignore
//! use datascrub::report::ReportAggregator;
//! use datascrub::IssueReport;
//!
//! let report = IssueReport::from_value(serde_json::json!({"duplicates": 5}))?;
//! let aggregated = ReportAggregator::aggregate(&report)?;
//!
//! assert!(aggregated.has_issues);
//! assert_eq!(aggregated.summaries[0].display_name, "Duplicate Data");
//! ```

mod aggregator;
pub mod category;

pub use aggregator::{
    AggregatedReport, CategorySummary, ClassDistribution, ClassShare, DetailEntry,
    DetailFragment, ReportAggregator,
};
pub use category::{BadgeStyle, IssueCategory, KnownCategory};
