//! Data structures for beta-diversity analyses.

mod distance_matrix;
mod metadata;
mod numeric_table;

pub use distance_matrix::DistanceMatrix;
pub use metadata::{ColumnFilter, ColumnType, LoadOptions, Metadata, Variable, VariableType};
pub use numeric_table::NumericTable;
