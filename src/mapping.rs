// ABOUTME: Explicit column-to-field mapping from result rows onto caller record types
// ABOUTME: Mappers are validated once at registration and resolve columns once per result set
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Row Mapping
//!
//! A [`RowMapper`] declares which columns a record reads and how to build the
//! record from them. Declarations are checked when the mapper is built, the
//! declared columns are matched against the result set once per query, and
//! each row is then handed to the constructor through a [`MappedRow`].
//!
//! ```rust
//! use twoway_sql::mapping::RowMapper;
//!
//! #[derive(Debug, PartialEq)]
//! struct Employee {
//!     id: i32,
//!     name: Option<String>,
//! }
//!
//! let mapper = RowMapper::builder("Employee")
//!     .column("id")
//!     .column("name")
//!     .build(|row| {
//!         Ok(Employee {
//!             id: row.get("id")?,
//!             name: row.get("name")?,
//!         })
//!     })
//!     .unwrap();
//! assert_eq!(mapper.columns(), ["id", "name"]);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::errors::MappingError;
use crate::models::ResultRow;
use crate::params::SqlValue;

type BuildFn<T> = dyn Fn(&MappedRow<'_>) -> Result<T, MappingError> + Send + Sync;

/// Registered mapping from result columns onto `T`
pub struct RowMapper<T> {
    type_name: &'static str,
    columns: Vec<String>,
    build: Box<BuildFn<T>>,
}

impl<T> fmt::Debug for RowMapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowMapper")
            .field("type_name", &self.type_name)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

impl<T> RowMapper<T> {
    /// Start declaring a mapper for the record type named `type_name`
    #[must_use]
    pub fn builder(type_name: &'static str) -> RowMapperBuilder<T> {
        RowMapperBuilder {
            type_name,
            columns: Vec::new(),
            _record: PhantomData,
        }
    }

    /// Record type name used in error messages
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Declared columns in registration order
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Map a single row
    ///
    /// # Errors
    ///
    /// Returns an error if a declared column is missing or a value does not convert
    pub fn map_row(&self, row: &ResultRow) -> Result<T, MappingError> {
        let index = self.resolve(row.columns())?;
        (self.build)(&MappedRow {
            type_name: self.type_name,
            row,
            index: &index,
        })
    }

    /// Map a result set, resolving columns once
    ///
    /// # Errors
    ///
    /// Returns the first mapping failure
    pub fn map_rows(&self, rows: &[ResultRow]) -> Result<Vec<T>, MappingError> {
        let Some(first) = rows.first() else {
            return Ok(Vec::new());
        };
        let index = self.resolve(first.columns())?;
        rows.iter()
            .map(|row| {
                (self.build)(&MappedRow {
                    type_name: self.type_name,
                    row,
                    index: &index,
                })
            })
            .collect()
    }

    /// Declared column (lowercase) to result index
    fn resolve(&self, result_columns: &[String]) -> Result<HashMap<String, usize>, MappingError> {
        let mut positions: HashMap<String, usize> = HashMap::with_capacity(result_columns.len());
        for (i, column) in result_columns.iter().enumerate() {
            positions.entry(column.to_ascii_lowercase()).or_insert(i);
        }
        self.columns
            .iter()
            .map(|declared| {
                positions
                    .get(declared.as_str())
                    .map(|&i| (declared.clone(), i))
                    .ok_or_else(|| MappingError::MissingColumn {
                        type_name: self.type_name,
                        column: declared.clone(),
                    })
            })
            .collect()
    }
}

impl<V: FromSqlValue + 'static> RowMapper<V> {
    /// Mapper reading one column straight into `V`
    ///
    /// # Errors
    ///
    /// Returns an error if `column` is empty
    pub fn scalar(column: &str) -> Result<Self, MappingError> {
        let column = column.to_owned();
        RowMapper::builder(V::TYPE_NAME)
            .column(&column)
            .build(move |row| row.get(&column))
    }
}

/// Declares the columns of a [`RowMapper`]
pub struct RowMapperBuilder<T> {
    type_name: &'static str,
    columns: Vec<String>,
    _record: PhantomData<fn() -> T>,
}

impl<T> RowMapperBuilder<T> {
    /// Declare a column the record reads
    #[must_use]
    pub fn column(mut self, name: &str) -> Self {
        self.columns.push(name.to_owned());
        self
    }

    /// Declare several columns
    #[must_use]
    pub fn columns<'c>(mut self, names: impl IntoIterator<Item = &'c str>) -> Self {
        self.columns.extend(names.into_iter().map(str::to_owned));
        self
    }

    /// Validate the declarations and attach the record constructor
    ///
    /// # Errors
    ///
    /// Returns `MappingError::InvalidMapping` if no column was declared, a
    /// name is empty, or a name is declared twice (case-insensitive)
    pub fn build<F>(self, build: F) -> Result<RowMapper<T>, MappingError>
    where
        F: Fn(&MappedRow<'_>) -> Result<T, MappingError> + Send + Sync + 'static,
    {
        let invalid = |reason: String| MappingError::InvalidMapping {
            type_name: self.type_name,
            reason,
        };
        if self.columns.is_empty() {
            return Err(invalid("no columns declared".to_owned()));
        }

        let mut seen = HashSet::with_capacity(self.columns.len());
        let mut columns = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let column = column.trim().to_ascii_lowercase();
            if column.is_empty() {
                return Err(invalid("empty column name".to_owned()));
            }
            if !seen.insert(column.clone()) {
                return Err(invalid(format!("column '{column}' declared twice")));
            }
            columns.push(column);
        }

        Ok(RowMapper {
            type_name: self.type_name,
            columns,
            build: Box::new(build),
        })
    }
}

/// Read access to one row restricted to the mapper's declared columns
pub struct MappedRow<'r> {
    type_name: &'static str,
    row: &'r ResultRow,
    index: &'r HashMap<String, usize>,
}

impl MappedRow<'_> {
    /// Convert the value of a declared column
    ///
    /// # Errors
    ///
    /// Returns an error if the column was not declared, is NULL for a
    /// non-optional target, or holds an incompatible value
    pub fn get<V: FromSqlValue>(&self, column: &str) -> Result<V, MappingError> {
        let position = self
            .index
            .get(column.to_ascii_lowercase().as_str())
            .ok_or_else(|| MappingError::UndeclaredColumn {
                type_name: self.type_name,
                column: column.to_owned(),
            })?;
        V::from_nullable(column, self.row.value(*position))
    }

    /// Underlying row
    #[must_use]
    pub const fn row(&self) -> &ResultRow {
        self.row
    }
}

/// Conversion from a stored SQL value into a Rust field type
pub trait FromSqlValue: Sized {
    /// Rust type name for error messages
    const TYPE_NAME: &'static str;

    /// Convert a non-null value; `None` if incompatible
    fn from_sql_value(value: &SqlValue) -> Option<Self>;

    /// Convert a possibly NULL value of `column`
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedNull` for NULL and `Conversion` for incompatible values
    fn from_nullable(column: &str, value: Option<&SqlValue>) -> Result<Self, MappingError> {
        let value = value.ok_or_else(|| MappingError::UnexpectedNull {
            column: column.to_owned(),
        })?;
        Self::from_sql_value(value).ok_or_else(|| MappingError::Conversion {
            column: column.to_owned(),
            expected: Self::TYPE_NAME,
            found: format!("{} value", value.sql_type()),
        })
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        T::from_sql_value(value).map(Some)
    }

    fn from_nullable(column: &str, value: Option<&SqlValue>) -> Result<Self, MappingError> {
        value.map_or(Ok(None), |v| T::from_nullable(column, Some(v)).map(Some))
    }
}

impl FromSqlValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Boolean(b) => Some(*b),
            // SQLite stores booleans as integers
            SqlValue::Integer(i) => Some(*i != 0),
            SqlValue::BigInt(i) => Some(*i != 0),
            _ => None,
        }
    }
}

impl FromSqlValue for i32 {
    const TYPE_NAME: &'static str = "i32";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Integer(i) => Some(*i),
            SqlValue::BigInt(i) => Self::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for i64 {
    const TYPE_NAME: &'static str = "i64";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Integer(i) => Some(Self::from(*i)),
            SqlValue::BigInt(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromSqlValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Double(d) => Some(*d),
            SqlValue::Integer(i) => Some(Self::from(*i)),
            SqlValue::BigInt(i) => Some(*i as Self),
            SqlValue::Text(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for String {
    const TYPE_NAME: &'static str = "String";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromSqlValue for NaiveDate {
    const TYPE_NAME: &'static str = "NaiveDate";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Date(d) => Some(*d),
            SqlValue::Text(s) => Self::parse_from_str(s, "%Y-%m-%d").ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for NaiveDateTime {
    const TYPE_NAME: &'static str = "NaiveDateTime";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Timestamp(ts) => Some(*ts),
            SqlValue::Text(s) => Self::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| Self::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                .ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for DateTime<Utc> {
    const TYPE_NAME: &'static str = "DateTime<Utc>";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::TimestampTz(ts) => Some(*ts),
            SqlValue::Text(s) => DateTime::parse_from_rfc3339(s)
                .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z"))
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }
}

impl FromSqlValue for Uuid {
    const TYPE_NAME: &'static str = "Uuid";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Uuid(u) => Some(*u),
            SqlValue::Bytes(b) => Self::from_slice(b).ok(),
            SqlValue::Text(s) => Self::parse_str(s).ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for Vec<u8> {
    const TYPE_NAME: &'static str = "Vec<u8>";

    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Bytes(b) => Some(b.clone()),
            _ => None,
        }
    }
}
