use anyhow::{Context, Result};
use classroom_api::db::{self, Built};
use classroom_api::{CourseResponse, MemberResponse, Role, SchoolResponse, ServiceError, UserProfile};
use rusqlite::{Connection, OptionalExtension, Row, types::Value};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared database state
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}

/// Initialize the database: open connection, enable WAL, run migrations
pub fn init_db(data_dir: &Path) -> Result<Db> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join("classroom.db");
    let conn = Connection::open(&db_path).context("opening SQLite database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    run_migrations(&conn)?;

    Ok(Db {
        conn: Arc::new(Mutex::new(conn)),
    })
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in db::migrations::MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .with_context(|| format!("checking migration {name}"))?;

        if !already_applied {
            conn.execute_batch(sql)
                .with_context(|| format!("running migration {name}"))?;
            conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])?;
            tracing::info!("Applied migration: {name}");
        }
    }

    Ok(())
}

/// Upsert the configured schools.
pub fn seed_schools(db: &Db, schools: &[(String, String)]) -> Result<()> {
    let conn = db.conn();
    for (id, name) in schools {
        sq_execute(&conn, db::schools::upsert(id, name))
            .with_context(|| format!("seeding school {id}"))?;
    }
    if !schools.is_empty() {
        tracing::info!("seeded {} school(s)", schools.len());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// sea-query → rusqlite
// ---------------------------------------------------------------------------

fn bind_values(values: &sea_query::Values) -> Vec<Value> {
    values
        .0
        .iter()
        .map(|v| match v {
            sea_query::Value::String(Some(s)) => Value::Text(s.as_str().to_owned()),
            sea_query::Value::Int(Some(i)) => Value::Integer(i64::from(*i)),
            sea_query::Value::BigInt(Some(i)) => Value::Integer(*i),
            sea_query::Value::Bool(Some(b)) => Value::Integer(i64::from(*b)),
            sea_query::Value::Bytes(Some(b)) => Value::Blob(b.to_vec()),
            _ => Value::Null,
        })
        .collect()
}

pub fn sq_execute(conn: &Connection, (sql, values): Built) -> rusqlite::Result<usize> {
    conn.execute(&sql, rusqlite::params_from_iter(bind_values(&values)))
}

pub fn sq_query_row<T, F>(conn: &Connection, (sql, values): Built, f: F) -> rusqlite::Result<T>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    conn.query_row(&sql, rusqlite::params_from_iter(bind_values(&values)), f)
}

/// Like [`sq_query_row`], but "no rows" is `Ok(None)` instead of an error.
pub fn sq_query_opt<T, F>(conn: &Connection, built: Built, f: F) -> rusqlite::Result<Option<T>>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    sq_query_row(conn, built, f).optional()
}

pub fn sq_query_map<T, F>(conn: &Connection, (sql, values): Built, f: F) -> rusqlite::Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(bind_values(&values)), f)?;
    rows.collect()
}

/// Whether an error is a UNIQUE / PRIMARY KEY / CHECK violation.
pub fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ---------------------------------------------------------------------------
// Row mappers (column orders match the builders in `classroom_api::db`)
// ---------------------------------------------------------------------------

fn role_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Role> {
    let raw: String = row.get(idx)?;
    Role::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(ServiceError::Internal(format!("unknown role {raw:?}"))),
        )
    })
}

pub fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        email: row.get(1)?,
        role: role_at(row, 2)?,
        school_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Profile plus `(password_hash, password_salt)`.
pub fn login_from_row(row: &Row<'_>) -> rusqlite::Result<(UserProfile, String, String)> {
    Ok((profile_from_row(row)?, row.get(5)?, row.get(6)?))
}

pub fn course_from_row(row: &Row<'_>) -> rusqlite::Result<CourseResponse> {
    Ok(CourseResponse {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        creator_id: row.get(3)?,
        school_id: row.get(4)?,
    })
}

pub fn member_from_row(row: &Row<'_>) -> rusqlite::Result<MemberResponse> {
    Ok(MemberResponse {
        user_id: row.get(0)?,
        email: row.get(1)?,
        role: role_at(row, 2)?,
        joined_at: row.get(3)?,
    })
}

pub fn school_from_row(row: &Row<'_>) -> rusqlite::Result<SchoolResponse> {
    Ok(SchoolResponse {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_api::db::{courses, users};

    fn temp_db() -> (tempfile::TempDir, Db) {
        let dir = tempfile::tempdir().unwrap();
        let db = init_db(dir.path()).unwrap();
        (dir, db)
    }

    #[test]
    fn migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        drop(init_db(dir.path()).unwrap());
        let db = init_db(dir.path()).unwrap();
        let applied: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, db::migrations::MIGRATIONS.len() as i64);
    }

    #[test]
    fn seeded_schools_are_upserted() {
        let (_dir, db) = temp_db();
        seed_schools(&db, &[("inst001".into(), "Old Name".into())]).unwrap();
        seed_schools(&db, &[("inst001".into(), "New Name".into())]).unwrap();

        let conn = db.conn();
        let schools = sq_query_map(&conn, db::schools::list(), school_from_row).unwrap();
        assert_eq!(schools.len(), 1);
        assert_eq!(schools[0].name, "New Name");
    }

    #[test]
    fn duplicate_email_is_a_constraint_violation() {
        let (_dir, db) = temp_db();
        seed_schools(&db, &[("inst001".into(), "Institute".into())]).unwrap();
        let conn = db.conn();

        sq_execute(&conn, users::insert("u1", "a@test.com", "h", "s", "inst001", "STUDENT")).unwrap();
        let err = sq_execute(&conn, users::insert("u2", "a@test.com", "h", "s", "inst001", "STUDENT"))
            .unwrap_err();
        assert!(is_constraint_violation(&err));

        let found = sq_query_opt(&conn, users::get_by_email("a@test.com"), profile_from_row)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "u1");
        assert_eq!(found.role, Role::Student);
        assert!(
            sq_query_opt(&conn, users::get_by_email("b@test.com"), profile_from_row)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn deleting_user_cascades_membership_and_clears_creator() {
        let (_dir, db) = temp_db();
        seed_schools(&db, &[("inst001".into(), "Institute".into())]).unwrap();
        let conn = db.conn();

        sq_execute(&conn, users::insert("t1", "t@test.com", "h", "s", "inst001", "TEACHER")).unwrap();
        sq_execute(&conn, users::insert("s1", "s@test.com", "h", "s", "inst001", "STUDENT")).unwrap();
        sq_execute(&conn, courses::insert("inst001_CS1", "CS1", "Intro", "t1", "inst001")).unwrap();
        sq_execute(&conn, courses::join("inst001_CS1", "s1")).unwrap();
        // Re-joining is a no-op.
        assert_eq!(sq_execute(&conn, courses::join("inst001_CS1", "s1")).unwrap(), 0);

        sq_execute(&conn, users::delete_by_email("s@test.com")).unwrap();
        sq_execute(&conn, users::delete_by_email("t@test.com")).unwrap();

        let members = sq_query_map(&conn, courses::list_members("inst001_CS1"), member_from_row).unwrap();
        assert!(members.is_empty());
        let course = sq_query_row(&conn, courses::get_by_id("inst001_CS1"), course_from_row).unwrap();
        assert_eq!(course.creator_id, None);
    }
}
