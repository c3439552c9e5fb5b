//! Minimal in-memory table with named columns.
use hashbrown::HashSet;

use crate::errors::{Result, SetSimJoinError};

/// Cell of a table, `None` for a missing value.
pub type Cell = Option<String>;

/// Table of string cells with named columns.
///
/// The row index of a record is used as its record id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates an empty table with the given column names (must be distinct).
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(|c| c.into()).collect();
        {
            let mut seen = HashSet::new();
            for column in &columns {
                if !seen.insert(column.as_str()) {
                    return Err(SetSimJoinError::InvalidTable(format!(
                        "duplicate column name {column:?}"
                    )));
                }
            }
        }
        Ok(Self {
            columns,
            rows: vec![],
        })
    }

    /// Appends a row, which must have a cell for every column.
    pub fn add_row<I, S>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let row: Vec<Cell> = row.into_iter().map(|c| c.map(|c| c.into())).collect();
        if row.len() != self.num_columns() {
            return Err(SetSimJoinError::InvalidTable(format!(
                "row {} has {} cells, but the table has {} columns",
                self.rows.len(),
                row.len(),
                self.num_columns()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Gets the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Gets the index of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Gets the rows.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Gets a cell, `None` if the value is missing.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows[row][column].as_deref()
    }

    /// Gets the number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Gets the number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Checks if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
