//! Database schema, migrations, and query builders.
//!
//! Builders return `(sql, values)` pairs for SQLite; the server binds the
//! values and executes them.

pub mod courses;
pub mod migrations;
pub mod reset_tokens;
pub mod schools;
pub mod tables;
pub mod users;

pub use tables::*;

/// A built statement: SQL text plus its bound values.
pub type Built = (String, sea_query::Values);
