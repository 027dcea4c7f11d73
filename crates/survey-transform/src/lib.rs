//! Survey table transformations.
//!
//! The stages of a cleaning run after the source has been read:
//!
//! - [`dedupe`]: drop exact duplicate rows, keeping the first
//! - [`normalize`]: synonym collapsing, categorical labeling, yes/no standardization
//! - [`derive`]: ratio, bucket and date-difference columns
//! - [`to_dataframe`]: hand the cleaned table to polars
//!
//! Every stage borrows its input and returns a new table plus a report of
//! what it converted, so a caller can rerun a stage with different rules
//! against the same loaded table.

pub mod dedupe;
pub mod derive;
pub mod error;
pub mod frame;
pub mod normalize;
pub mod profile;

pub use dedupe::{Deduplicated, dedupe};
pub use derive::{
    BucketBound, Derivation, DerivationReport, Derived, DerivedColumn, bucket_label,
    complete_years, days_between, derive, ratio,
};
pub use error::{Result, TransformError};
pub use frame::{project_dataframe, to_dataframe};
pub use normalize::{
    CodeLabel, ColumnCounts, ColumnRule, NormalizeReport, Normalized, RawCode, SynonymGroup,
    normalize,
};
pub use profile::{ColumnProfile, ProfileSummary, profile};
