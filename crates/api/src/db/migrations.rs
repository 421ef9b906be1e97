//! Ordered schema migrations.

/// A named migration: `(name, sql)`.
pub type Migration = (&'static str, &'static str);

/// Applied in order; each name is recorded once in `_migrations`.
pub const MIGRATIONS: &[Migration] = &[(
    "0001_schema",
    include_str!("../../migrations/0001_schema.sql"),
)];
