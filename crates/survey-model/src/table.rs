#![deny(unsafe_code)]

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::schema::{DataType, Field};
use crate::value::Value;

/// Row-oriented table where every row has exactly one cell per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTable {
    fields: Vec<Field>,
    rows: Vec<Vec<Value>>,
}

impl RecordTable {
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ModelError::DuplicateColumn {
                    name: field.name.clone(),
                });
            }
        }
        Ok(Self {
            fields,
            rows: Vec::new(),
        })
    }

    pub fn from_rows(fields: Vec<Field>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut table = Self::new(fields)?;
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.fields.len() {
            return Err(ModelError::RowWidth {
                expected: self.fields.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| ModelError::ColumnNotFound {
                name: name.to_string(),
            })
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Cell at `row` in column `name`.
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Appends a new column; `values` must have one entry per row.
    pub fn append_column(&mut self, field: Field, values: Vec<Value>) -> Result<()> {
        if self.column_index(&field.name).is_some() {
            return Err(ModelError::DuplicateColumn { name: field.name });
        }
        if values.len() != self.rows.len() {
            return Err(ModelError::ColumnLength {
                name: field.name,
                expected: self.rows.len(),
                actual: values.len(),
            });
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        self.fields.push(field);
        Ok(())
    }

    /// Replaces the values and type of an existing column.
    pub fn replace_column(
        &mut self,
        name: &str,
        data_type: DataType,
        values: Vec<Value>,
    ) -> Result<()> {
        let idx = self.require_column(name)?;
        if values.len() != self.rows.len() {
            return Err(ModelError::ColumnLength {
                name: name.to_string(),
                expected: self.rows.len(),
                actual: values.len(),
            });
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
        self.fields[idx].data_type = data_type;
        Ok(())
    }

    /// Keeps the rows whose mask entry is true; `keep` must have one entry per row.
    pub fn filter_rows(&self, keep: &[bool]) -> Result<Self> {
        if keep.len() != self.rows.len() {
            return Err(ModelError::MaskLength {
                expected: self.rows.len(),
                actual: keep.len(),
            });
        }
        let rows = self
            .rows
            .iter()
            .zip(keep)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect();
        Ok(Self {
            fields: self.fields.clone(),
            rows,
        })
    }

    /// New table holding only `columns`, in the order given.
    pub fn project(&self, columns: &[&str]) -> Result<Self> {
        let mut indices = Vec::with_capacity(columns.len());
        let mut fields = Vec::with_capacity(columns.len());
        for name in columns {
            let idx = self.require_column(name)?;
            indices.push(idx);
            fields.push(self.fields[idx].clone());
        }
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&idx| row[idx].clone()).collect())
            .collect();
        Self::from_rows(fields, rows)
    }
}
