pub mod curve_table;
pub mod projection;

pub use curve_table::{CurveTable, TableExtractor};
pub use projection::{ColumnProjector, ProjectedTable};
