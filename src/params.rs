// ABOUTME: Named, explicitly typed SQL parameters used to bind two-way SQL templates
// ABOUTME: Keeps the declared SQL type alongside the value so NULLs bind with the right type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Parameter Model
//!
//! A [`SqlParam`] is a `{name, sql_type, value}` triple. The declared type is
//! mandatory even when the value is `NULL`: the driver must be told which SQL
//! type the `NULL` stands for, and a missing value carries no runtime type.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use twoway_sql::params::{SqlParam, SqlType};
//!
//! let params = [
//!     SqlParam::new("name", "John Doe"),
//!     SqlParam::null::<NaiveDate>("joined_date"),
//! ];
//! assert_eq!(params[1].sql_type(), SqlType::Date);
//! assert!(params[1].is_null());
//! ```

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ParameterError;

/// Declared SQL type of a parameter or argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlType {
    /// `BOOLEAN`
    Boolean,
    /// 32-bit `INTEGER`
    Integer,
    /// 64-bit `BIGINT`
    BigInt,
    /// `DOUBLE PRECISION`
    Double,
    /// `VARCHAR` / `TEXT`
    Text,
    /// `DATE`
    Date,
    /// `TIMESTAMP` without time zone
    Timestamp,
    /// `TIMESTAMP WITH TIME ZONE`, normalized to UTC
    TimestampTz,
    /// `UUID`
    Uuid,
    /// `BYTEA` / `BLOB`
    Bytes,
}

impl SqlType {
    /// Short lowercase name, also accepted by [`SqlType::from_str`]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "bool",
            Self::Integer => "int",
            Self::BigInt => "bigint",
            Self::Double => "double",
            Self::Text => "text",
            Self::Date => "date",
            Self::Timestamp => "timestamp",
            Self::TimestampTz => "timestamptz",
            Self::Uuid => "uuid",
            Self::Bytes => "bytes",
        }
    }

    /// Parse a textual value into a [`SqlValue`] of this type
    ///
    /// Dates use `%Y-%m-%d`, timestamps `%Y-%m-%dT%H:%M:%S` (or a space
    /// separator), `timestamptz` RFC 3339 and bytes hexadecimal. Returns
    /// `None` if the text is not a valid literal of this type.
    #[must_use]
    pub fn parse_value(&self, raw: &str) -> Option<SqlValue> {
        match self {
            Self::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "t" | "1" | "yes" => Some(SqlValue::Boolean(true)),
                "false" | "f" | "0" | "no" => Some(SqlValue::Boolean(false)),
                _ => None,
            },
            Self::Integer => raw.parse().ok().map(SqlValue::Integer),
            Self::BigInt => raw.parse().ok().map(SqlValue::BigInt),
            Self::Double => raw.parse().ok().map(SqlValue::Double),
            Self::Text => Some(SqlValue::Text(raw.to_owned())),
            Self::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(SqlValue::Date),
            Self::Timestamp => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
                .ok()
                .map(SqlValue::Timestamp),
            Self::TimestampTz => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| SqlValue::TimestampTz(dt.with_timezone(&Utc))),
            Self::Uuid => Uuid::parse_str(raw).ok().map(SqlValue::Uuid),
            Self::Bytes => hex::decode(raw).ok().map(SqlValue::Bytes),
        }
    }
}

impl Display for SqlType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SqlType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Ok(Self::Boolean),
            "int" | "integer" | "int4" => Ok(Self::Integer),
            "bigint" | "long" | "int8" => Ok(Self::BigInt),
            "double" | "float" | "float8" => Ok(Self::Double),
            "text" | "string" | "varchar" => Ok(Self::Text),
            "date" => Ok(Self::Date),
            "timestamp" | "datetime" => Ok(Self::Timestamp),
            "timestamptz" => Ok(Self::TimestampTz),
            "uuid" => Ok(Self::Uuid),
            "bytes" | "blob" | "bytea" => Ok(Self::Bytes),
            other => Err(format!("unknown SQL type '{other}'")),
        }
    }
}

/// A non-null SQL value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum SqlValue {
    /// Boolean value
    Boolean(bool),
    /// 32-bit integer
    Integer(i32),
    /// 64-bit integer
    BigInt(i64),
    /// Double precision float
    Double(f64),
    /// Text
    Text(String),
    /// Calendar date
    Date(NaiveDate),
    /// Timestamp without zone
    Timestamp(NaiveDateTime),
    /// Timestamp in UTC
    TimestampTz(DateTime<Utc>),
    /// UUID
    Uuid(Uuid),
    /// Raw bytes
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// SQL type this value naturally binds as
    #[must_use]
    pub const fn sql_type(&self) -> SqlType {
        match self {
            Self::Boolean(_) => SqlType::Boolean,
            Self::Integer(_) => SqlType::Integer,
            Self::BigInt(_) => SqlType::BigInt,
            Self::Double(_) => SqlType::Double,
            Self::Text(_) => SqlType::Text,
            Self::Date(_) => SqlType::Date,
            Self::Timestamp(_) => SqlType::Timestamp,
            Self::TimestampTz(_) => SqlType::TimestampTz,
            Self::Uuid(_) => SqlType::Uuid,
            Self::Bytes(_) => SqlType::Bytes,
        }
    }

    /// Integer view of the value, used for generated keys
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(i64::from(*v)),
            Self::BigInt(v) => Some(*v),
            Self::Text(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl Display for SqlValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::BigInt(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Self::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
            Self::TimestampTz(v) => f.write_str(&v.to_rfc3339()),
            Self::Uuid(v) => write!(f, "{v}"),
            Self::Bytes(v) => f.write_str(&hex::encode(v)),
        }
    }
}

/// Rust types with a fixed SQL type tag
///
/// Implementations let [`SqlParam::new`] and [`SqlParam::null`] derive the
/// declared type from the Rust type, the way a typed null is declared in the
/// caller's code rather than guessed at runtime.
pub trait SqlTyped {
    /// SQL type this Rust type binds as
    const SQL_TYPE: SqlType;

    /// Convert into a non-null SQL value
    fn into_sql_value(self) -> SqlValue;
}

macro_rules! impl_sql_typed {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl SqlTyped for $ty {
                const SQL_TYPE: SqlType = SqlType::$variant;

                fn into_sql_value(self) -> SqlValue {
                    SqlValue::$variant(self)
                }
            }
        )*
    };
}

impl_sql_typed! {
    bool => Boolean,
    i32 => Integer,
    i64 => BigInt,
    f64 => Double,
    String => Text,
    NaiveDate => Date,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    Uuid => Uuid,
    Vec<u8> => Bytes,
}

impl SqlTyped for &str {
    const SQL_TYPE: SqlType = SqlType::Text;

    fn into_sql_value(self) -> SqlValue {
        SqlValue::Text(self.to_owned())
    }
}

/// Value carried by a [`SqlParam`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Typed SQL NULL
    Null,
    /// Single value
    Single(SqlValue),
    /// Value list for IN-clause expansion
    List(Vec<SqlValue>),
}

/// Named, typed, nullable parameter for a two-way SQL template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlParam {
    name: String,
    sql_type: SqlType,
    value: ParamValue,
}

impl SqlParam {
    /// Create a non-null parameter; the SQL type comes from `T`
    #[must_use]
    pub fn new<T: SqlTyped>(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            sql_type: T::SQL_TYPE,
            value: ParamValue::Single(value.into_sql_value()),
        }
    }

    /// Create a parameter from an optional value; `None` binds a typed NULL
    #[must_use]
    pub fn nullable<T: SqlTyped>(name: impl Into<String>, value: Option<T>) -> Self {
        Self {
            name: name.into(),
            sql_type: T::SQL_TYPE,
            value: value.map_or(ParamValue::Null, |v| ParamValue::Single(v.into_sql_value())),
        }
    }

    /// Create a typed NULL parameter
    #[must_use]
    pub fn null<T: SqlTyped>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: T::SQL_TYPE,
            value: ParamValue::Null,
        }
    }

    /// Create a list parameter for `IN /*name*/(...)` expansion
    #[must_use]
    pub fn list<T, I>(name: impl Into<String>, values: I) -> Self
    where
        T: SqlTyped,
        I: IntoIterator<Item = T>,
    {
        Self {
            name: name.into(),
            sql_type: T::SQL_TYPE,
            value: ParamValue::List(values.into_iter().map(SqlTyped::into_sql_value).collect()),
        }
    }

    /// Create a parameter from a runtime type tag and value
    ///
    /// # Errors
    ///
    /// Returns `ParameterError::TypeMismatch` if the value's variant does not
    /// match `sql_type`
    pub fn typed(
        name: impl Into<String>,
        sql_type: SqlType,
        value: Option<SqlValue>,
    ) -> Result<Self, ParameterError> {
        let name = name.into();
        if let Some(v) = &value {
            if v.sql_type() != sql_type {
                return Err(ParameterError::TypeMismatch {
                    name,
                    declared: sql_type,
                    actual: v.sql_type(),
                });
            }
        }
        Ok(Self {
            name,
            sql_type,
            value: value.map_or(ParamValue::Null, ParamValue::Single),
        })
    }

    /// Create a list parameter from a runtime type tag and values
    ///
    /// # Errors
    ///
    /// Returns `ParameterError::TypeMismatch` for the first element whose
    /// variant does not match `sql_type`
    pub fn typed_list(
        name: impl Into<String>,
        sql_type: SqlType,
        values: Vec<SqlValue>,
    ) -> Result<Self, ParameterError> {
        let name = name.into();
        if let Some(v) = values.iter().find(|v| v.sql_type() != sql_type) {
            return Err(ParameterError::TypeMismatch {
                actual: v.sql_type(),
                name,
                declared: sql_type,
            });
        }
        Ok(Self {
            name,
            sql_type,
            value: ParamValue::List(values),
        })
    }

    /// Parameter name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared SQL type
    #[must_use]
    pub const fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    /// Carried value
    #[must_use]
    pub const fn value(&self) -> &ParamValue {
        &self.value
    }

    /// True for a typed NULL
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self.value, ParamValue::Null)
    }
}

/// Validate a parameter list before it reaches the template engine
///
/// # Errors
///
/// Returns an error if a name is empty or repeated
pub fn validate_params(params: &[SqlParam]) -> Result<(), ParameterError> {
    let mut seen = HashSet::with_capacity(params.len());
    for (position, param) in params.iter().enumerate() {
        if param.name.is_empty() {
            return Err(ParameterError::EmptyName { position });
        }
        if !seen.insert(param.name.as_str()) {
            return Err(ParameterError::DuplicateName {
                name: param.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_keeps_declared_type() {
        let param = SqlParam::null::<NaiveDate>("joined_date");
        assert_eq!(param.sql_type(), SqlType::Date);
        assert!(param.is_null());

        let param = SqlParam::nullable::<String>("name", None);
        assert_eq!(param.sql_type(), SqlType::Text);
        assert_eq!(param.value(), &ParamValue::Null);
    }

    #[test]
    fn test_typed_rejects_mismatched_value() {
        let err = SqlParam::typed("id", SqlType::Integer, Some(SqlValue::Text("2".into())))
            .unwrap_err();
        assert!(matches!(
            err,
            ParameterError::TypeMismatch {
                declared: SqlType::Integer,
                actual: SqlType::Text,
                ..
            }
        ));

        let ok = SqlParam::typed("id", SqlType::Integer, None).unwrap();
        assert!(ok.is_null());
    }

    #[test]
    fn test_validate_params() {
        assert!(validate_params(&[]).is_ok());
        assert!(validate_params(&[SqlParam::new("id", 1), SqlParam::new("name", "a")]).is_ok());

        let err = validate_params(&[SqlParam::new("id", 1), SqlParam::new("", 2)]).unwrap_err();
        assert!(matches!(err, ParameterError::EmptyName { position: 1 }));

        let err = validate_params(&[SqlParam::new("id", 1), SqlParam::new("id", 2)]).unwrap_err();
        assert!(matches!(err, ParameterError::DuplicateName { name } if name == "id"));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(SqlType::Integer.parse_value("42"), Some(SqlValue::Integer(42)));
        assert_eq!(SqlType::Boolean.parse_value("TRUE"), Some(SqlValue::Boolean(true)));
        assert_eq!(
            SqlType::Date.parse_value("2022-12-31"),
            NaiveDate::from_ymd_opt(2022, 12, 31).map(SqlValue::Date)
        );
        assert_eq!(SqlType::Bytes.parse_value("cafe"), Some(SqlValue::Bytes(vec![0xca, 0xfe])));
        assert_eq!(SqlType::Integer.parse_value("x"), None);
        assert_eq!("timestamptz".parse::<SqlType>(), Ok(SqlType::TimestampTz));
    }
}
