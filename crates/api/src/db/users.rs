//! User query builders.

use sea_query::{Expr, Query, SelectStatement, SqliteQueryBuilder};

use super::Built;
use super::tables::Users;

/// Profile column order shared by every user SELECT:
/// `id, email, role, school_id, created_at`.
fn profile_columns(q: &mut SelectStatement) -> &mut SelectStatement {
    q.column((Users::Table, Users::Id))
        .column((Users::Table, Users::Email))
        .column((Users::Table, Users::Role))
        .column((Users::Table, Users::SchoolId))
        .column((Users::Table, Users::CreatedAt))
}

// ── Lookups ────────────────────────────────────────────────────────────────

pub fn get_by_email(email: &str) -> Built {
    let mut q = Query::select().to_owned();
    profile_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col((Users::Table, Users::Email)).eq(email))
        .build(SqliteQueryBuilder)
}

pub fn get_by_id(id: &str) -> Built {
    let mut q = Query::select().to_owned();
    profile_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col((Users::Table, Users::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// Profile columns followed by `password_hash, password_salt`, for login.
pub fn get_for_login(email: &str) -> Built {
    let mut q = Query::select().to_owned();
    profile_columns(&mut q);
    q.column((Users::Table, Users::PasswordHash))
        .column((Users::Table, Users::PasswordSalt))
        .from(Users::Table)
        .and_where(Expr::col((Users::Table, Users::Email)).eq(email))
        .build(SqliteQueryBuilder)
}

// ── Writes ─────────────────────────────────────────────────────────────────

pub fn insert(
    id: &str,
    email: &str,
    password_hash: &str,
    password_salt: &str,
    school_id: &str,
    role: &str,
) -> Built {
    Query::insert()
        .into_table(Users::Table)
        .columns([
            Users::Id,
            Users::Email,
            Users::PasswordHash,
            Users::PasswordSalt,
            Users::SchoolId,
            Users::Role,
        ])
        .values_panic([
            id.into(),
            email.into(),
            password_hash.into(),
            password_salt.into(),
            school_id.into(),
            role.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn update_password(email: &str, password_hash: &str, password_salt: &str) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::PasswordHash, password_hash)
        .value(Users::PasswordSalt, password_salt)
        .and_where(Expr::col(Users::Email).eq(email))
        .build(SqliteQueryBuilder)
}

pub fn update_role(email: &str, role: &str) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::Role, role)
        .and_where(Expr::col(Users::Email).eq(email))
        .build(SqliteQueryBuilder)
}

pub fn delete_by_email(email: &str) -> Built {
    Query::delete()
        .from_table(Users::Table)
        .and_where(Expr::col(Users::Email).eq(email))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_binds_email_as_value() {
        let (sql, values) = get_by_email("a@test.com");
        assert!(sql.contains(r#"FROM "users""#));
        assert!(sql.contains(r#""users"."email" = ?"#));
        assert_eq!(values.0.len(), 1);
    }

    #[test]
    fn login_query_appends_password_columns() {
        let (sql, _) = get_for_login("a@test.com");
        let hash_at = sql.find("password_hash").unwrap();
        let created_at = sql.find("created_at").unwrap();
        assert!(created_at < hash_at);
    }
}
