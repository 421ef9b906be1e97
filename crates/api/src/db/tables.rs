//! Compile-time checked column identifiers for all tables.

use sea_query::Iden;

#[derive(Iden)]
pub enum Schools {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    PasswordSalt,
    SchoolId,
    Role,
    CreatedAt,
}

#[derive(Iden)]
pub enum Courses {
    Table,
    Id,
    Code,
    Name,
    CreatorId,
    SchoolId,
    CreatedAt,
}

#[derive(Iden)]
pub enum CourseMembers {
    Table,
    CourseId,
    UserId,
    JoinedAt,
}

#[derive(Iden)]
pub enum PasswordResetTokens {
    Table,
    Id,
    Email,
    TokenHash,
    ExpiresAt,
    CreatedAt,
}
