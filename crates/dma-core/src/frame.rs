//! Column-oriented output frames.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Value type of a frame column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Epoch milliseconds.
    Time,
    /// Numeric values.
    Number,
    /// Free text.
    String,
    /// `true` / `false`.
    Boolean,
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// One value per row.
    pub values: Vec<Value>,
}

impl Field {
    /// Create an empty column.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            values: Vec::new(),
        }
    }
}

/// Frame error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Row has {actual} values but the frame has {expected} columns")]
    ArityMismatch { expected: usize, actual: usize },
}

/// Output table for one query.
///
/// Rows are stored column-wise. Every column always holds exactly
/// `len()` values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Identifier of the query that produced this frame.
    pub ref_id: String,
    /// Columns in output order.
    pub fields: Vec<Field>,
    #[serde(skip)]
    len: usize,
}

impl Frame {
    /// Create an empty frame with no columns.
    #[must_use]
    pub fn new(ref_id: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            fields: Vec::new(),
            len: 0,
        }
    }

    /// Create a frame with the given columns.
    #[must_use]
    pub fn with_fields(ref_id: impl Into<String>, fields: Vec<Field>) -> Self {
        let mut frame = Self::new(ref_id);
        for field in fields {
            frame.add_field(field.name, field.field_type);
        }
        frame
    }

    /// Append a column. Existing rows get `null` in the new column.
    pub fn add_field(&mut self, name: impl Into<String>, field_type: FieldType) {
        let mut field = Field::new(name, field_type);
        field.values.resize(self.len, Value::Null);
        self.fields.push(field);
    }

    /// Append one row.
    ///
    /// # Errors
    /// Returns error if the row does not supply exactly one value per column.
    pub fn append_row(&mut self, row: Vec<Value>) -> Result<(), FrameError> {
        if row.len() != self.fields.len() {
            return Err(FrameError::ArityMismatch {
                expected: self.fields.len(),
                actual: row.len(),
            });
        }
        for (field, value) in self.fields.iter_mut().zip(row) {
            field.values.push(value);
        }
        self.len += 1;
        Ok(())
    }

    /// Number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the frame has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Column names in order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Look up a column by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Row at `index`, in column order.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.len {
            return None;
        }
        Some(self.fields.iter().map(|f| &f.values[index]).collect())
    }
}
