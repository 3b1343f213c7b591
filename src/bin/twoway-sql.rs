// ABOUTME: twoway-sql CLI - renders and executes two-way SQL resources from the command line
// ABOUTME: Parses typed parameters, prints bound SQL or runs statements against DATABASE_URL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Show the bound SQL and arguments without touching a database
//! twoway-sql --sql-root sql render example/selectEmployeeById.sql --param id:int=2
//!
//! # Run a query and print rows as JSON lines
//! twoway-sql exec example/selectEmployeeById.sql --query --param id:int=2
//!
//! # Update with a typed NULL (no '=value')
//! twoway-sql exec example/updateEmployeeById.sql --param name:text --param joined_date:date --param id:int=2
//!
//! # Insert and report the generated key
//! twoway-sql exec example/insertEmployee.sql --returning-key id \
//!     --param name:text='John Doe' --param joined_date:date=2022-12-31
//!
//! # IN-list parameter
//! twoway-sql render example/selectEmployeesByIds.sql --param 'ids:int[]=1,2,3'
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use tracing::debug;
use twoway_sql::config::database::DatabaseUrl;
use twoway_sql::config::TemplateConfig;
use twoway_sql::database_plugins::SqlBackend;
use twoway_sql::dialect::Dialect;
use twoway_sql::errors::ParameterError;
use twoway_sql::logging::LoggingConfig;
use twoway_sql::models::ResultRow;
use twoway_sql::params::{validate_params, SqlParam, SqlType, SqlValue};
use twoway_sql::resources::{FsResourceLoader, ResourceLoader};
use twoway_sql::template::{BoundStatement, TemplateEngine, TwoWaySqlEngine};

#[derive(Parser)]
#[command(
    name = "twoway-sql",
    about = "Render and execute two-way SQL resources",
    long_about = "Loads a SQL resource from the resource roots, binds typed parameters \
                  and either prints the bound statement or runs it against DATABASE_URL."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Resource root (repeatable, searched in order)
    #[arg(long = "sql-root", global = true)]
    sql_roots: Vec<PathBuf>,

    /// Dialect override (sqlite or postgres)
    #[arg(long, global = true)]
    dialect: Option<Dialect>,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Enable debug logging, including executed SQL
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the bound SQL, its arguments and the formatted SQL
    Render {
        /// Logical resource path
        path: String,

        /// Parameter as name:type[=value]; omit the value for NULL, use type[] for lists
        #[arg(long = "param", short = 'p')]
        params: Vec<String>,
    },

    /// Execute the statement against the database
    Exec {
        /// Logical resource path
        path: String,

        /// Parameter as name:type[=value]; omit the value for NULL, use type[] for lists
        #[arg(long = "param", short = 'p')]
        params: Vec<String>,

        /// Treat the statement as a query and print rows as JSON lines
        #[arg(long, conflicts_with = "returning_key")]
        query: bool,

        /// Report the generated value of this key column
        #[arg(long)]
        returning_key: Option<String>,
    },
}

/// Parse `name:type[=value]`
fn parse_param(arg: &str) -> Result<SqlParam> {
    let (name, rest) = arg
        .split_once(':')
        .ok_or_else(|| anyhow!("parameter '{arg}' must look like name:type[=value]"))?;
    let (type_name, raw) = match rest.split_once('=') {
        Some((type_name, raw)) => (type_name, Some(raw)),
        None => (rest, None),
    };

    if let Some(element_type) = type_name.strip_suffix("[]") {
        let sql_type: SqlType = element_type.parse().map_err(|e: String| anyhow!(e))?;
        let raw = raw.unwrap_or_default();
        let values = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|item| parse_value(name, sql_type, item))
            .collect::<Result<Vec<_>>>()?;
        return Ok(SqlParam::typed_list(name, sql_type, values)?);
    }

    let sql_type: SqlType = type_name.parse().map_err(|e: String| anyhow!(e))?;
    let value = raw.map(|raw| parse_value(name, sql_type, raw)).transpose()?;
    Ok(SqlParam::typed(name, sql_type, value)?)
}

fn parse_value(name: &str, sql_type: SqlType, raw: &str) -> Result<SqlValue> {
    sql_type.parse_value(raw).ok_or_else(|| {
        ParameterError::InvalidValue {
            name: name.to_owned(),
            declared: sql_type,
            raw: raw.to_owned(),
        }
        .into()
    })
}

fn sql_value_to_json(value: &SqlValue) -> Value {
    match value {
        SqlValue::Boolean(b) => json!(b),
        SqlValue::Integer(i) => json!(i),
        SqlValue::BigInt(i) => json!(i),
        SqlValue::Double(d) => json!(d),
        other => json!(other.to_string()),
    }
}

fn row_to_json(row: &ResultRow) -> Value {
    let object: Map<String, Value> = row
        .columns()
        .iter()
        .zip(row.values())
        .map(|(column, value)| {
            (
                column.clone(),
                value.as_ref().map_or(Value::Null, sql_value_to_json),
            )
        })
        .collect();
    Value::Object(object)
}

fn print_statement(stmt: &BoundStatement) -> Result<()> {
    println!("{}", stmt.sql());
    println!("{}", serde_json::to_string_pretty(stmt.arguments())?);
    println!("-- formatted");
    println!("{}", stmt.formatted_sql());
    Ok(())
}

async fn render(config: &TemplateConfig, path: &str, params: &[SqlParam]) -> Result<()> {
    let loader = FsResourceLoader::new(config.sql_roots.iter().cloned());
    let template = loader.load(path).await.with_context(|| format!("loading {path}"))?;
    validate_params(params)?;
    let stmt = TwoWaySqlEngine::new(config.dialect)
        .render(&template, params)
        .with_context(|| format!("rendering {path}"))?;
    print_statement(&stmt)
}

async fn exec(
    config: &TemplateConfig,
    path: &str,
    params: &[SqlParam],
    query: bool,
    returning_key: Option<&str>,
) -> Result<()> {
    let template = config.connect().await?;

    if query {
        let stmt = template.bind(path, params).await?;
        let rows = template.backend().fetch_rows(&stmt, None).await?;
        debug!(rows = rows.len(), "Query finished");
        for row in &rows {
            println!("{}", row_to_json(row));
        }
    } else if let Some(key_column) = returning_key {
        let outcome = template
            .execute_returning_key(path, key_column, params)
            .await?;
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        let affected = template.execute(path, params).await?;
        println!("{}", json!({ "affected_rows": affected }));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = LoggingConfig::from_env();
    let logging = if cli.verbose {
        logging.with_level("debug")
    } else {
        logging
    };
    logging.init()?;

    let mut config = TemplateConfig::from_env()?;
    if let Some(url) = &cli.database_url {
        config.database_url = DatabaseUrl::parse_url(url)?;
        config.dialect = Dialect::for_url(&config.database_url);
    }
    if let Some(dialect) = cli.dialect {
        config.dialect = dialect;
    }
    if !cli.sql_roots.is_empty() {
        config.sql_roots = cli.sql_roots;
    }

    match cli.command {
        Command::Render { path, params } => {
            let params = params.iter().map(|p| parse_param(p)).collect::<Result<Vec<_>>>()?;
            render(&config, &path, &params).await
        }
        Command::Exec {
            path,
            params,
            query,
            returning_key,
        } => {
            let params = params.iter().map(|p| parse_param(p)).collect::<Result<Vec<_>>>()?;
            exec(&config, &path, &params, query, returning_key.as_deref()).await
        }
    }
}
