//! Course + enrollment query builders.

use sea_query::{Expr, OnConflict, Order, Query, SelectStatement, SqliteQueryBuilder};

use super::Built;
use super::tables::{CourseMembers, Courses, Users};

/// Course column order: `id, code, name, creator_id, school_id`.
fn course_columns(q: &mut SelectStatement) -> &mut SelectStatement {
    q.column((Courses::Table, Courses::Id))
        .column((Courses::Table, Courses::Code))
        .column((Courses::Table, Courses::Name))
        .column((Courses::Table, Courses::CreatorId))
        .column((Courses::Table, Courses::SchoolId))
}

pub fn get_by_id(id: &str) -> Built {
    let mut q = Query::select().to_owned();
    course_columns(&mut q);
    q.from(Courses::Table)
        .and_where(Expr::col((Courses::Table, Courses::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn insert(id: &str, code: &str, name: &str, creator_id: &str, school_id: &str) -> Built {
    Query::insert()
        .into_table(Courses::Table)
        .columns([
            Courses::Id,
            Courses::Code,
            Courses::Name,
            Courses::CreatorId,
            Courses::SchoolId,
        ])
        .values_panic([
            id.into(),
            code.into(),
            name.into(),
            creator_id.into(),
            school_id.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Courses a user has joined, oldest enrollment first.
pub fn list_joined(user_id: &str) -> Built {
    let mut q = Query::select().to_owned();
    course_columns(&mut q);
    q.from(Courses::Table)
        .inner_join(
            CourseMembers::Table,
            Expr::col((CourseMembers::Table, CourseMembers::CourseId))
                .equals((Courses::Table, Courses::Id)),
        )
        .and_where(Expr::col((CourseMembers::Table, CourseMembers::UserId)).eq(user_id))
        .order_by((CourseMembers::Table, CourseMembers::JoinedAt), Order::Asc)
        .order_by((Courses::Table, Courses::Id), Order::Asc)
        .build(SqliteQueryBuilder)
}

// ── Members ────────────────────────────────────────────────────────────────

/// Connect a user to a course. Re-joining an existing course is a no-op.
pub fn join(course_id: &str, user_id: &str) -> Built {
    Query::insert()
        .into_table(CourseMembers::Table)
        .columns([CourseMembers::CourseId, CourseMembers::UserId])
        .values_panic([course_id.into(), user_id.into()])
        .on_conflict(
            OnConflict::columns([CourseMembers::CourseId, CourseMembers::UserId])
                .do_nothing()
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

/// Members of a course: `user_id, email, role, joined_at`.
pub fn list_members(course_id: &str) -> Built {
    Query::select()
        .column((CourseMembers::Table, CourseMembers::UserId))
        .column((Users::Table, Users::Email))
        .column((Users::Table, Users::Role))
        .column((CourseMembers::Table, CourseMembers::JoinedAt))
        .from(CourseMembers::Table)
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id))
                .equals((CourseMembers::Table, CourseMembers::UserId)),
        )
        .and_where(Expr::col((CourseMembers::Table, CourseMembers::CourseId)).eq(course_id))
        .order_by((CourseMembers::Table, CourseMembers::JoinedAt), Order::Asc)
        .order_by((Users::Table, Users::Email), Order::Asc)
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_ignores_existing_membership() {
        let (sql, values) = join("inst001_CS3213", "u1");
        assert!(sql.contains("ON CONFLICT"));
        assert!(sql.contains("DO NOTHING"));
        assert_eq!(values.0.len(), 2);
    }

    #[test]
    fn joined_courses_go_through_membership_table() {
        let (sql, _) = list_joined("u1");
        assert!(sql.contains(r#"INNER JOIN "course_members""#));
    }
}
