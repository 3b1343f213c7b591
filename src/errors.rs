// ABOUTME: Error taxonomy for resource loading, parameter binding, template rendering and execution
// ABOUTME: Separates template failures from driver failures while preserving every source error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Error Handling
//!
//! Every operation of [`crate::executor::TwoWayTemplate`] returns [`TwoWayError`].
//! Failures that happen before the database is touched (loading the SQL file,
//! validating parameters, rendering the template) are wrapped in a single
//! [`TemplateOperationError`] carrying the resource path. Driver failures are
//! surfaced as the untouched [`sqlx::Error`].

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::SqlType;

/// Standard error codes used to classify [`TwoWayError`] values
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Resource path is malformed
    #[serde(rename = "INVALID_RESOURCE_PATH")]
    InvalidResourcePath,
    /// Resource path did not resolve on the search path
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound,
    /// Resource exists but could not be read
    #[serde(rename = "RESOURCE_READ_ERROR")]
    ResourceReadError,
    /// Parameter list is invalid
    #[serde(rename = "INVALID_PARAMETER")]
    InvalidParameter,
    /// Template directives are malformed
    #[serde(rename = "TEMPLATE_SYNTAX_ERROR")]
    TemplateSyntaxError,
    /// Template references a parameter that was not supplied
    #[serde(rename = "UNRESOLVED_PARAMETER")]
    UnresolvedParameter,
    /// Single-row query returned no rows
    #[serde(rename = "NO_RESULT")]
    NoResult,
    /// Single-row query returned several rows
    #[serde(rename = "MULTIPLE_RESULTS")]
    MultipleResults,
    /// Insert reported more than one generated key
    #[serde(rename = "MULTIPLE_GENERATED_KEYS")]
    MultipleGeneratedKeys,
    /// Row could not be mapped onto the result type
    #[serde(rename = "MAPPING_ERROR")]
    MappingError,
    /// Driver or database rejected the statement
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    /// Configuration is invalid
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidResourcePath => "The SQL resource path is not a valid logical path",
            Self::ResourceNotFound => "The SQL resource was not found on the resource search path",
            Self::ResourceReadError => "The SQL resource could not be read",
            Self::InvalidParameter => "The SQL parameter list is invalid",
            Self::TemplateSyntaxError => "The SQL template contains malformed directives",
            Self::UnresolvedParameter => "The SQL template references an unknown parameter",
            Self::NoResult => "The query returned no rows where exactly one was expected",
            Self::MultipleResults => "The query returned more than one row where one was expected",
            Self::MultipleGeneratedKeys => "The statement generated more than one key",
            Self::MappingError => "A result row could not be mapped onto the record type",
            Self::DatabaseError => "The database rejected the statement",
            Self::ConfigInvalid => "Configuration is invalid",
        }
    }
}

/// Failures while resolving or reading a SQL resource
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The logical path is empty, absolute or escapes the resource root
    #[error("invalid resource path '{path}': {reason}")]
    InvalidPath {
        /// Offending path
        path: String,
        /// Why the path was rejected
        reason: &'static str,
    },

    /// No configured root contains the resource
    #[error("{path} not found (searched {searched} location(s))")]
    NotFound {
        /// Logical resource path
        path: String,
        /// Number of roots that were searched
        searched: usize,
    },

    /// The resource exists but reading or decoding it failed
    #[error("failed to read {path}")]
    Read {
        /// Logical resource path
        path: String,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },
}

impl ResourceError {
    /// Error code for this resource failure
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidPath { .. } => ErrorCode::InvalidResourcePath,
            Self::NotFound { .. } => ErrorCode::ResourceNotFound,
            Self::Read { .. } => ErrorCode::ResourceReadError,
        }
    }
}

/// Invalid parameter construction or parameter lists
#[derive(Debug, Error)]
pub enum ParameterError {
    /// Parameter name is empty
    #[error("parameter name must not be empty (position {position})")]
    EmptyName {
        /// Zero-based position in the parameter list
        position: usize,
    },

    /// Same name supplied twice in one call
    #[error("parameter '{name}' supplied more than once")]
    DuplicateName {
        /// Repeated name
        name: String,
    },

    /// Value variant disagrees with the declared type
    #[error("parameter '{name}' declared as {declared} but value is {actual}")]
    TypeMismatch {
        /// Parameter name
        name: String,
        /// Declared SQL type
        declared: SqlType,
        /// SQL type of the supplied value
        actual: SqlType,
    },

    /// Textual value could not be parsed into the declared type
    #[error("parameter '{name}': cannot parse '{raw}' as {declared}")]
    InvalidValue {
        /// Parameter name
        name: String,
        /// Declared SQL type
        declared: SqlType,
        /// Raw input text
        raw: String,
    },
}

/// Template rendering failures reported by a [`crate::template::TemplateEngine`]
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Malformed directive or expression
    #[error("SQL template syntax error at {line}:{column}: {message}")]
    Syntax {
        /// Description of the problem
        message: String,
        /// One-based line
        line: usize,
        /// One-based column
        column: usize,
    },

    /// Directive references a name with no matching parameter
    #[error("SQL template references unknown parameter '{name}' at {line}:{column}")]
    UnresolvedParameter {
        /// Referenced name
        name: String,
        /// One-based line
        line: usize,
        /// One-based column
        column: usize,
    },
}

impl TemplateError {
    /// Error code for this template failure
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Syntax { .. } => ErrorCode::TemplateSyntaxError,
            Self::UnresolvedParameter { .. } => ErrorCode::UnresolvedParameter,
        }
    }
}

/// Underlying cause of a [`TemplateOperationError`]
#[derive(Debug, Error)]
pub enum TemplateCause {
    /// Loading the SQL resource failed
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// The parameter list was rejected
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// The template engine rejected the template
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Load or bind failure for a specific SQL resource
#[derive(Debug, Error)]
#[error("SQL template operation failed for '{path}'")]
pub struct TemplateOperationError {
    /// Logical resource path of the failing template
    pub path: String,
    /// Original failure
    #[source]
    pub cause: TemplateCause,
}

impl TemplateOperationError {
    /// Wrap a cause with the resource path it belongs to
    #[must_use]
    pub fn new(path: impl Into<String>, cause: impl Into<TemplateCause>) -> Self {
        Self {
            path: path.into(),
            cause: cause.into(),
        }
    }

    /// Error code of the wrapped cause
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match &self.cause {
            TemplateCause::Resource(e) => e.code(),
            TemplateCause::Parameter(_) => ErrorCode::InvalidParameter,
            TemplateCause::Template(e) => e.code(),
        }
    }
}

/// Failures while turning result rows into records
#[derive(Debug, Error)]
pub enum MappingError {
    /// Mapper registration was rejected
    #[error("invalid row mapping for {type_name}: {reason}")]
    InvalidMapping {
        /// Record type name
        type_name: &'static str,
        /// Why the mapping is invalid
        reason: String,
    },

    /// Result set lacks a column the mapper declares
    #[error("column '{column}' required by {type_name} is missing from the result set")]
    MissingColumn {
        /// Record type name
        type_name: &'static str,
        /// Missing column
        column: String,
    },

    /// Constructor read a column it never declared
    #[error("{type_name} reads undeclared column '{column}'")]
    UndeclaredColumn {
        /// Record type name
        type_name: &'static str,
        /// Column name
        column: String,
    },

    /// NULL found where the record field is not optional
    #[error("column '{column}' is NULL but the target is not optional")]
    UnexpectedNull {
        /// Column name
        column: String,
    },

    /// Value cannot be converted into the requested Rust type
    #[error("column '{column}': cannot convert {found} into {expected}")]
    Conversion {
        /// Column name
        column: String,
        /// Requested Rust type
        expected: &'static str,
        /// Description of the stored value
        found: String,
    },
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds an unusable value
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// The database URL uses a backend that is not compiled in
    #[error("unsupported database URL '{0}'")]
    UnsupportedDatabase(String),
}

/// Unified error type returned by the executor
#[derive(Debug, Error)]
pub enum TwoWayError {
    /// Loading or binding the SQL template failed
    #[error(transparent)]
    TemplateOperation(#[from] TemplateOperationError),

    /// The driver or database rejected the statement
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Single-row query returned no rows
    #[error("query '{path}' returned no rows, expected exactly one")]
    NoResult {
        /// Logical resource path
        path: String,
    },

    /// Single-row query returned more than one row
    #[error("query '{path}' returned more than one row, expected exactly one")]
    MultipleResults {
        /// Logical resource path
        path: String,
    },

    /// Insert reported several generated keys where one was expected
    #[error("statement '{path}' generated {count} keys, expected at most one")]
    MultipleGeneratedKeys {
        /// Logical resource path
        path: String,
        /// Number of generated keys
        count: usize,
    },

    /// Result rows could not be mapped onto the record type
    #[error("row mapping failed")]
    Mapping(#[from] MappingError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TwoWayError {
    /// Classify this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::TemplateOperation(e) => e.code(),
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::NoResult { .. } => ErrorCode::NoResult,
            Self::MultipleResults { .. } => ErrorCode::MultipleResults,
            Self::MultipleGeneratedKeys { .. } => ErrorCode::MultipleGeneratedKeys,
            Self::Mapping(_) => ErrorCode::MappingError,
            Self::Config(_) => ErrorCode::ConfigInvalid,
        }
    }

    /// True when the failure happened before the database was involved
    #[must_use]
    pub const fn is_template_failure(&self) -> bool {
        matches!(self, Self::TemplateOperation(_))
    }

    /// True when the driver or database rejected the statement
    #[must_use]
    pub const fn is_database_failure(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Result type alias for executor operations
pub type TwoWayResult<T> = Result<T, TwoWayError>;
