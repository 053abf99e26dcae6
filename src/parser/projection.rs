use crate::config::ColumnConfig;
use crate::parser::CurveTable;

/// Subset of a [`CurveTable`] restricted to the required keyword list.
///
/// Column order follows the keyword list, never the source table. Keywords
/// absent from the source are omitted and reported in `missing` for the run
/// log; missing data is never synthesized.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub missing: Vec<String>,
}

impl ProjectedTable {
    pub fn has_missing_columns(&self) -> bool {
        !self.missing.is_empty()
    }
}

pub struct ColumnProjector {
    required: Vec<String>,
}

impl ColumnProjector {
    pub fn new(config: &ColumnConfig) -> Self {
        Self {
            required: config.required.clone(),
        }
    }

    /// Project the required columns out of `table`. Cannot fail: absent
    /// columns are dropped, not errors.
    pub fn project(&self, table: &CurveTable) -> ProjectedTable {
        let mut indices = Vec::new();
        let mut columns = Vec::new();
        let mut missing = Vec::new();

        for name in &self.required {
            match table.column_index(name) {
                Some(index) => {
                    indices.push(index);
                    columns.push(name.clone());
                }
                None => missing.push(name.clone()),
            }
        }

        let rows = table
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i]).collect())
            .collect();

        ProjectedTable {
            columns,
            rows,
            missing,
        }
    }
}
