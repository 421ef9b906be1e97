//! Password reset token query builders.

use sea_query::{Expr, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::PasswordResetTokens;

pub fn insert(id: &str, email: &str, token_hash: &str, expires_at: &str) -> Built {
    Query::insert()
        .into_table(PasswordResetTokens::Table)
        .columns([
            PasswordResetTokens::Id,
            PasswordResetTokens::Email,
            PasswordResetTokens::TokenHash,
            PasswordResetTokens::ExpiresAt,
        ])
        .values_panic([
            id.into(),
            email.into(),
            token_hash.into(),
            expires_at.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// `id, email, expires_at` for a token hash.
pub fn lookup(token_hash: &str) -> Built {
    Query::select()
        .columns([
            PasswordResetTokens::Id,
            PasswordResetTokens::Email,
            PasswordResetTokens::ExpiresAt,
        ])
        .from(PasswordResetTokens::Table)
        .and_where(Expr::col(PasswordResetTokens::TokenHash).eq(token_hash))
        .build(SqliteQueryBuilder)
}

pub fn delete_by_id(id: &str) -> Built {
    Query::delete()
        .from_table(PasswordResetTokens::Table)
        .and_where(Expr::col(PasswordResetTokens::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Drop every outstanding token for an email.
pub fn delete_for_email(email: &str) -> Built {
    Query::delete()
        .from_table(PasswordResetTokens::Table)
        .and_where(Expr::col(PasswordResetTokens::Email).eq(email))
        .build(SqliteQueryBuilder)
}
