//! Rectangular string tables shared by every extractor.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A rectangular table of string cells with named columns.
///
/// Every row always has exactly `columns.len()` cells; rows pushed with a
/// different width are padded with empty strings or truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table by promoting the first grid row to column headers.
    ///
    /// Header cells are trimmed and have embedded newlines flattened.
    /// Data rows whose cells are all blank are dropped.
    pub fn from_grid(grid: &[Vec<String>]) -> Self {
        let Some((header, body)) = grid.split_first() else {
            return Self::default();
        };

        let mut table = Self::new(header.iter().map(|c| c.replace('\n', " ").trim().to_string()));
        for row in body {
            if row.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            table.push_row(row.iter().map(|c| c.trim().to_string()));
        }
        table
    }

    /// Build a one-row table from ordered field/value pairs.
    pub fn single_row<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<String>) = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        let mut table = Self::new(columns);
        table.push_row(values);
        table
    }

    /// Build a two-column `Field`/`Value` table, one row per field.
    pub fn field_value<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::new(["Field", "Value"]);
        for (k, v) in fields {
            table.push_row([k.into(), v.into()]);
        }
        table
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = row.into_iter().map(Into::into).collect();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows in order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// A table with no data rows is empty, whatever its columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` in the named column.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// Append a column holding the same value on every row.
    pub fn with_constant_column(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        match self.column_index(&name) {
            Some(col) => {
                for row in &mut self.rows {
                    row[col] = value.clone();
                }
            }
            None => {
                self.columns.push(name);
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
        self
    }

    /// Keep only rows for which the predicate holds.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Drop rows whose cells are all blank.
    pub fn drop_blank_rows(mut self) -> Self {
        self.retain_rows(|row| row.iter().any(|c| !c.trim().is_empty()));
        self
    }

    /// Drop columns whose cells are all blank (every column of a table with
    /// no rows counts as blank).
    pub fn drop_empty_columns(self) -> Self {
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|col| self.rows.iter().any(|row| !row[col].trim().is_empty()))
            .collect();

        let columns = self
            .columns
            .into_iter()
            .zip(&keep)
            .filter_map(|(c, &k)| k.then_some(c))
            .collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&keep)
                    .filter_map(|(c, &k)| k.then_some(c))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Suffix repeated column names: `Amount`, `Amount_1`, `Amount_2`.
    /// Suffixes skip names already present in the table.
    pub fn dedupe_columns(mut self) -> Self {
        let mut taken: HashSet<String> = self.columns.iter().cloned().collect();
        let mut seen: HashSet<String> = HashSet::new();
        for col in &mut self.columns {
            if seen.insert(col.clone()) {
                continue;
            }
            let renamed = (1..)
                .map(|n| format!("{}_{}", col, n))
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or_default();
            taken.insert(renamed.clone());
            seen.insert(renamed.clone());
            *col = renamed;
        }
        self
    }

    /// Stack tables vertically over the union of their columns, in first-seen
    /// order. Missing cells are left blank; repeated names within one table
    /// are suffixed first so no cell is lost.
    pub fn concat<'a, I>(tables: I) -> Self
    where
        I: IntoIterator<Item = &'a Table>,
    {
        let tables: Vec<Table> = tables
            .into_iter()
            .map(|t| t.clone().dedupe_columns())
            .collect();

        let mut merged = Self::default();
        for table in &tables {
            for col in &table.columns {
                if !merged.columns.contains(col) {
                    merged.columns.push(col.clone());
                }
            }
        }

        for table in tables {
            let positions: Vec<usize> = table
                .columns
                .iter()
                .filter_map(|c| merged.column_index(c))
                .collect();
            for row in table.rows {
                let mut out = vec![String::new(); merged.columns.len()];
                for (cell, &pos) in row.into_iter().zip(&positions) {
                    out[pos] = cell;
                }
                merged.rows.push(out);
            }
        }

        merged
    }
}
