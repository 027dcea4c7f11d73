//! Record table model for survey data cleaning.
//!
//! A [`RecordTable`] is an ordered set of rows sharing one schema of typed
//! [`Field`]s. Cells are [`Value`]s with an explicit [`Value::Missing`]
//! marker, so sentinel codes never survive into derived columns.
//!
//! Source files are described by [`ColumnSpec`]s (name, primitive type and
//! either a fixed-width [`ByteSpan`] or a spreadsheet header) together with a
//! per-run [`SentinelSet`].

pub mod error;
pub mod numeric;
pub mod schema;
pub mod sentinel;
pub mod table;
pub mod value;

pub use error::{ModelError, Result};
pub use numeric::{format_numeric, parse_f64, parse_i64};
pub use schema::{ByteSpan, ColumnSpec, DataType, Field, validate_schema};
pub use sentinel::SentinelSet;
pub use table::RecordTable;
pub use value::{DATE_FORMAT, Level, Value};
