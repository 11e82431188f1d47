//! Presentation of aggregated reports and cleaning results.
//!
//! - [`html`] produces fragments for web front-ends (issue table rows,
//!   summary badges, plot gallery, applied methods, preview table)
//! - [`text`] produces the terminal report printed by the CLI
//!
//! Both are pure functions of already-aggregated data.

pub mod html;
pub mod text;
