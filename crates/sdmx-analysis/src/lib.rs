//! Aggregation of flattened code lists into the analysis tables.
//!
//! [`aggregate`] consolidates every flattened document into full and filtered
//! code / code-list tables, annotates code statistics, and derives the agency
//! groups used for reporting. [`tables`] persists the four tables.

pub mod aggregate;
pub mod groups;
pub mod statistics;
pub mod tables;

pub use aggregate::{Aggregation, CollisionPolicy, Exclusion, ExclusionReason, aggregate};
pub use groups::agency_groups;
pub use statistics::{annotate_statistics, is_common_code, list_base_name};
pub use tables::{TablePaths, read_filtered_tables, write_table, write_tables};
