//! Attribute selection and the layout of join results.
use hashbrown::HashSet;

use crate::errors::{Result, SetSimJoinError};
use crate::table::{Cell, Table};

/// Name of the trailing similarity-score column.
pub const SIM_SCORE_COLUMN: &str = "_sim_score";

/// Attributes of one side of a join.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SideSpec {
    key_attr: String,
    join_attr: String,
    out_attrs: Vec<String>,
    out_prefix: String,
}

impl SideSpec {
    /// Creates the attributes of the left (indexed) table, with output prefix `l_`.
    pub fn left<K, J>(key_attr: K, join_attr: J) -> Self
    where
        K: Into<String>,
        J: Into<String>,
    {
        Self::new(key_attr.into(), join_attr.into(), "l_")
    }

    /// Creates the attributes of the right (probing) table, with output prefix `r_`.
    pub fn right<K, J>(key_attr: K, join_attr: J) -> Self
    where
        K: Into<String>,
        J: Into<String>,
    {
        Self::new(key_attr.into(), join_attr.into(), "r_")
    }

    fn new(key_attr: String, join_attr: String, out_prefix: &str) -> Self {
        Self {
            key_attr,
            join_attr,
            out_attrs: vec![],
            out_prefix: out_prefix.to_string(),
        }
    }

    /// Sets the attributes copied into output rows.
    pub fn out_attrs<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.out_attrs = attrs.into_iter().map(|a| a.into()).collect();
        self
    }

    /// Sets the prefix of the output column names.
    pub fn out_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.out_prefix = prefix.into();
        self
    }

    /// Gets the key attribute.
    pub fn key_attr(&self) -> &str {
        &self.key_attr
    }

    /// Gets the join attribute.
    pub fn join_attr(&self) -> &str {
        &self.join_attr
    }

    /// Resolves the attribute names into column indices of `table`, checking that the key
    /// attribute has no missing or duplicate value.
    pub(crate) fn resolve(&self, table: &Table, label: &'static str) -> Result<ResolvedSide> {
        let index_of = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| SetSimJoinError::ColumnNotFound {
                    table: label,
                    column: column.to_string(),
                })
        };
        let key = index_of(&self.key_attr)?;
        let join = index_of(&self.join_attr)?;
        let mut out = Vec::with_capacity(self.out_attrs.len());
        let mut out_names = Vec::with_capacity(self.out_attrs.len());
        for attr in &self.out_attrs {
            let idx = index_of(attr)?;
            // The key is always the first output column.
            if idx != key {
                out.push(idx);
                out_names.push(format!("{}{}", self.out_prefix, attr));
            }
        }

        let mut keys = HashSet::with_capacity(table.num_rows());
        for row in 0..table.num_rows() {
            let valid = table.cell(row, key).map_or(false, |k| keys.insert(k));
            if !valid {
                return Err(SetSimJoinError::InvalidKeyAttribute {
                    table: label,
                    column: self.key_attr.clone(),
                });
            }
        }

        Ok(ResolvedSide {
            key,
            join,
            out,
            key_name: format!("{}{}", self.out_prefix, self.key_attr),
            out_names,
        })
    }
}

/// Column indices of one side of a join.
#[derive(Clone, Debug)]
pub(crate) struct ResolvedSide {
    pub key: usize,
    pub join: usize,
    pub out: Vec<usize>,
    key_name: String,
    out_names: Vec<String>,
}

impl ResolvedSide {
    fn key_value(&self, table: &Table, row: usize) -> String {
        // Keys were checked to be present in `SideSpec::resolve`.
        table.cell(row, self.key).unwrap_or_default().to_string()
    }

    fn out_values(&self, table: &Table, row: usize) -> Vec<Cell> {
        self.out
            .iter()
            .map(|&col| table.cell(row, col).map(|v| v.to_string()))
            .collect()
    }
}

/// Builds the header of the output and checks that column names are unique.
pub(crate) fn output_header(
    left: &ResolvedSide,
    right: &ResolvedSide,
    out_sim_score: bool,
) -> Result<Vec<String>> {
    let mut header = vec![left.key_name.clone(), right.key_name.clone()];
    header.extend(left.out_names.iter().cloned());
    header.extend(right.out_names.iter().cloned());
    if out_sim_score {
        header.push(SIM_SCORE_COLUMN.to_string());
    }
    {
        let mut seen = HashSet::with_capacity(header.len());
        for name in &header {
            if !seen.insert(name.as_str()) {
                return Err(SetSimJoinError::OutputColumnCollision(name.clone()));
            }
        }
    }
    Ok(header)
}

/// Assembles an output row from a left record and a right record.
pub(crate) fn output_row(
    ltable: &Table,
    left: &ResolvedSide,
    l_id: usize,
    rtable: &Table,
    right: &ResolvedSide,
    r_id: usize,
    score: Option<f64>,
) -> OutputRow {
    OutputRow {
        l_key: left.key_value(ltable, l_id),
        r_key: right.key_value(rtable, r_id),
        l_values: left.out_values(ltable, l_id),
        r_values: right.out_values(rtable, r_id),
        score,
    }
}

/// Row of a join result.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputRow {
    /// Key of the left record.
    pub l_key: String,
    /// Key of the right record.
    pub r_key: String,
    /// Selected attributes of the left record.
    pub l_values: Vec<Cell>,
    /// Selected attributes of the right record.
    pub r_values: Vec<Cell>,
    /// Similarity score, if requested.
    pub score: Option<f64>,
}

impl OutputRow {
    /// Converts into string fields following the header order.
    /// Missing values become empty strings.
    pub fn to_fields(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(2 + self.l_values.len() + self.r_values.len() + 1);
        fields.push(self.l_key.clone());
        fields.push(self.r_key.clone());
        for value in self.l_values.iter().chain(self.r_values.iter()) {
            fields.push(value.clone().unwrap_or_default());
        }
        if let Some(score) = self.score {
            fields.push(score.to_string());
        }
        fields
    }
}

/// Result of a join.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JoinOutput {
    header: Vec<String>,
    rows: Vec<OutputRow>,
}

impl JoinOutput {
    pub(crate) fn new(header: Vec<String>, rows: Vec<OutputRow>) -> Self {
        Self { header, rows }
    }

    /// Gets the column names.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Gets the rows.
    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    /// Gets the pairs of left and right keys.
    pub fn key_pairs(&self) -> Vec<(&str, &str)> {
        self.rows
            .iter()
            .map(|r| (r.l_key.as_str(), r.r_key.as_str()))
            .collect()
    }

    /// Gets the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Checks if there is no row.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Takes the rows.
    pub fn into_rows(self) -> Vec<OutputRow> {
        self.rows
    }
}
