// ABOUTME: Binds rendered template arguments onto sqlx queries for any supported backend
// ABOUTME: NULL arguments are bound as typed NULLs using the declared SQL type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Argument binding
//!
//! The driver must know the SQL type of every NULL it receives. Values bind
//! by their own variant; NULLs bind as `None::<T>` where `T` follows the
//! argument's declared [`SqlType`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::query::Query;
use sqlx::{Database, Encode, Type};
use uuid::Uuid;

use crate::params::{SqlType, SqlValue};
use crate::template::{BoundStatement, SqlArgument};

/// Bind a single argument
pub fn bind_argument<'q, DB>(
    query: Query<'q, DB, <DB as Database>::Arguments<'q>>,
    argument: &SqlArgument,
) -> Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    Option<bool>: Encode<'q, DB> + Type<DB>,
    Option<i32>: Encode<'q, DB> + Type<DB>,
    Option<i64>: Encode<'q, DB> + Type<DB>,
    Option<f64>: Encode<'q, DB> + Type<DB>,
    Option<String>: Encode<'q, DB> + Type<DB>,
    Option<NaiveDate>: Encode<'q, DB> + Type<DB>,
    Option<NaiveDateTime>: Encode<'q, DB> + Type<DB>,
    Option<DateTime<Utc>>: Encode<'q, DB> + Type<DB>,
    Option<Uuid>: Encode<'q, DB> + Type<DB>,
    Option<Vec<u8>>: Encode<'q, DB> + Type<DB>,
{
    match &argument.value {
        Some(SqlValue::Boolean(v)) => query.bind(Some(*v)),
        Some(SqlValue::Integer(v)) => query.bind(Some(*v)),
        Some(SqlValue::BigInt(v)) => query.bind(Some(*v)),
        Some(SqlValue::Double(v)) => query.bind(Some(*v)),
        Some(SqlValue::Text(v)) => query.bind(Some(v.clone())),
        Some(SqlValue::Date(v)) => query.bind(Some(*v)),
        Some(SqlValue::Timestamp(v)) => query.bind(Some(*v)),
        Some(SqlValue::TimestampTz(v)) => query.bind(Some(*v)),
        Some(SqlValue::Uuid(v)) => query.bind(Some(*v)),
        Some(SqlValue::Bytes(v)) => query.bind(Some(v.clone())),
        None => match argument.sql_type {
            SqlType::Boolean => query.bind(None::<bool>),
            SqlType::Integer => query.bind(None::<i32>),
            SqlType::BigInt => query.bind(None::<i64>),
            SqlType::Double => query.bind(None::<f64>),
            SqlType::Text => query.bind(None::<String>),
            SqlType::Date => query.bind(None::<NaiveDate>),
            SqlType::Timestamp => query.bind(None::<NaiveDateTime>),
            SqlType::TimestampTz => query.bind(None::<DateTime<Utc>>),
            SqlType::Uuid => query.bind(None::<Uuid>),
            SqlType::Bytes => query.bind(None::<Vec<u8>>),
        },
    }
}

/// Build a query over `sql` with every argument of `stmt` bound in order
pub fn bind_statement<'q, DB>(
    sql: &'q str,
    stmt: &BoundStatement,
) -> Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    Option<bool>: Encode<'q, DB> + Type<DB>,
    Option<i32>: Encode<'q, DB> + Type<DB>,
    Option<i64>: Encode<'q, DB> + Type<DB>,
    Option<f64>: Encode<'q, DB> + Type<DB>,
    Option<String>: Encode<'q, DB> + Type<DB>,
    Option<NaiveDate>: Encode<'q, DB> + Type<DB>,
    Option<NaiveDateTime>: Encode<'q, DB> + Type<DB>,
    Option<DateTime<Utc>>: Encode<'q, DB> + Type<DB>,
    Option<Uuid>: Encode<'q, DB> + Type<DB>,
    Option<Vec<u8>>: Encode<'q, DB> + Type<DB>,
{
    stmt.arguments()
        .iter()
        .fold(sqlx::query::<DB>(sql), bind_argument)
}
