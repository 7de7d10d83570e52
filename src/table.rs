use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use thiserror::Error;

/// A single table cell. `None` is a missing value.
pub type Cell = Option<String>;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("column not found: {0}")]
    MissingColumn(String),
    #[error("header width mismatch: table has {found} columns, expected {expected}")]
    HeaderWidth { expected: usize, found: usize },
    #[error("row {row} has {found} cells, table has {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("csv input has {found} header rows, expected {expected}")]
    MissingHeader { expected: usize, found: usize },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Row-oriented table of optional string cells with named columns.
///
/// Column names are not required to be unique; name lookups resolve to the
/// first matching column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, TableError> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn require_column(&self, name: &str) -> Result<usize, TableError> {
        self.column_index(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    pub fn column_values(&self, name: &str) -> Result<Vec<Option<&str>>, TableError> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|row| row[idx].as_deref()).collect())
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Removes the final row, if any.
    pub fn drop_last_row(&mut self) {
        self.rows.pop();
    }

    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Cell]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    /// Drops every named column. Fails without modifying the table if any is absent.
    pub fn drop_columns(&mut self, names: &[&str]) -> Result<(), TableError> {
        let mut doomed = Vec::with_capacity(names.len());
        for name in names {
            doomed.push(self.require_column(name)?);
        }
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|idx| !doomed.contains(&idx))
            .collect();
        self.columns = retain_by_mask(std::mem::take(&mut self.columns), &keep);
        for row in &mut self.rows {
            *row = retain_by_mask(std::mem::take(row), &keep);
        }
        Ok(())
    }

    /// Renames columns by name. Names not present are ignored.
    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
        for col in &mut self.columns {
            if let Some((_, to)) = renames.iter().find(|(from, _)| *from == col.as_str()) {
                *col = (*to).to_string();
            }
        }
    }

    /// Replaces the whole header positionally.
    pub fn set_columns(&mut self, columns: Vec<String>) -> Result<(), TableError> {
        if columns.len() != self.columns.len() {
            return Err(TableError::HeaderWidth {
                expected: columns.len(),
                found: self.columns.len(),
            });
        }
        self.columns = columns;
        Ok(())
    }

    pub fn add_constant_column(&mut self, name: &str, value: &str) {
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(Some(value.to_string()));
        }
    }

    /// Mutable access to every cell of one column, top to bottom.
    pub fn column_cells_mut(
        &mut self,
        name: &str,
    ) -> Result<impl Iterator<Item = &mut Cell>, TableError> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter_mut().map(move |row| &mut row[idx]))
    }

    /// Projects the table onto `names`, in that order.
    pub fn select(&self, names: &[&str]) -> Result<Table, TableError> {
        let mut idxs = Vec::with_capacity(names.len());
        for name in names {
            idxs.push(self.require_column(name)?);
        }
        let rows = self
            .rows
            .iter()
            .map(|row| idxs.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Table {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows,
        })
    }

    /// Joins two tables side by side by row position. The shorter side is
    /// padded with missing cells.
    pub fn hconcat(left: &Table, right: &Table) -> Table {
        let height = left.len().max(right.len());
        let mut columns = left.columns.clone();
        columns.extend(right.columns.iter().cloned());

        let mut rows = Vec::with_capacity(height);
        for i in 0..height {
            let mut row = Vec::with_capacity(columns.len());
            match left.rows.get(i) {
                Some(cells) => row.extend(cells.iter().cloned()),
                None => row.extend(std::iter::repeat_n(None, left.width())),
            }
            match right.rows.get(i) {
                Some(cells) => row.extend(cells.iter().cloned()),
                None => row.extend(std::iter::repeat_n(None, right.width())),
            }
            rows.push(row);
        }
        Table { columns, rows }
    }

    /// Stacks tables vertically, aligning cells by column name. The result
    /// carries the union of all columns in first-seen order; cells for
    /// columns a table lacks are missing.
    pub fn vconcat<'a>(tables: impl IntoIterator<Item = &'a Table>) -> Table {
        let tables: Vec<&Table> = tables.into_iter().collect();
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for col in &table.columns {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for table in tables {
            let mapping: Vec<Option<usize>> =
                columns.iter().map(|c| table.column_index(c)).collect();
            for src in &table.rows {
                rows.push(
                    mapping
                        .iter()
                        .map(|idx| idx.and_then(|i| src[i].clone()))
                        .collect(),
                );
            }
        }
        Table { columns, rows }
    }

    /// Reads a CSV document whose first `header_rows` records are header
    /// levels. Column names come from the last level; the others are
    /// discarded. Empty cells become missing values.
    pub fn from_csv_reader<R: Read>(reader: R, header_rows: usize) -> Result<Table, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = rdr.records();
        let mut columns = Vec::new();
        for level in 0..header_rows {
            let Some(record) = records.next() else {
                return Err(TableError::MissingHeader {
                    expected: header_rows,
                    found: level,
                });
            };
            columns = record?.iter().map(|s| s.to_string()).collect();
        }

        let mut table = Table::new(columns);
        for record in records {
            let record = record?;
            let mut row: Vec<Cell> = record
                .iter()
                .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
                .collect();
            if row.len() < table.width() {
                row.resize(table.width(), None);
            }
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn read_csv(path: &Path, header_rows: usize) -> Result<Table, TableError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, header_rows)
    }

    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), TableError> {
        let file = std::fs::File::create(path)?;
        self.to_csv_writer(file)
    }
}

fn retain_by_mask<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, &k)| k.then_some(item))
        .collect()
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    {}", self.columns.join(" | "))?;
        for (idx, row) in self.rows.iter().enumerate() {
            let cells: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("NaN")).collect();
            writeln!(f, "{idx:>3} {}", cells.join(" | "))?;
        }
        write!(f, "[{} rows x {} columns]", self.len(), self.width())
    }
}
