use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single column value as seen by criteria matching.
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum ColumnValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }
}

impl From<bool> for ColumnValue {
    fn from(value: bool) -> Self {
        ColumnValue::Bool(value)
    }
}

impl From<i32> for ColumnValue {
    fn from(value: i32) -> Self {
        ColumnValue::Int(value.into())
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        ColumnValue::Int(value)
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        ColumnValue::Text(value.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        ColumnValue::Text(value)
    }
}

impl From<DateTime<Utc>> for ColumnValue {
    fn from(value: DateTime<Utc>) -> Self {
        ColumnValue::Timestamp(value)
    }
}

impl<T: Into<ColumnValue>> From<Option<T>> for ColumnValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ColumnValue::Null, Into::into)
    }
}

/// A row type stored behind an [`EntityMapper`](crate::EntityMapper).
///
/// Fields are nullable so that "selective" writes can tell which columns were
/// provided.
pub trait Entity: Clone + Default + Send + Sync + 'static {
    type Column: Copy + Eq + fmt::Debug + Send + Sync + 'static;

    const TABLE: &'static str;

    fn all_columns() -> &'static [Self::Column];

    fn primary_key_column() -> Self::Column;

    fn id(&self) -> Option<i32>;

    fn set_id(&mut self, id: i32);

    fn value(&self, column: Self::Column) -> ColumnValue;

    /// Copy one column from `source` into `self`.
    fn copy_column(&mut self, source: &Self, column: Self::Column);

    fn is_deleted(&self) -> bool;

    fn set_deleted(&mut self, deleted: bool);

    /// The row a database would start from before a selective insert fills
    /// in the provided columns.
    fn with_column_defaults() -> Self {
        Self::default()
    }

    /// A fresh row holding only `columns` from `self`.
    fn project(&self, columns: &[Self::Column]) -> Self {
        let mut projected = Self::default();
        for column in columns {
            projected.copy_column(self, *column);
        }
        projected
    }

    /// Copy every column of `source` except the primary key. With
    /// `non_null_only`, null columns of `source` are skipped.
    fn apply(&mut self, source: &Self, non_null_only: bool) {
        let key = Self::primary_key_column();
        for column in Self::all_columns() {
            if *column == key || (non_null_only && source.value(*column).is_null()) {
                continue;
            }
            self.copy_column(source, *column);
        }
    }
}
