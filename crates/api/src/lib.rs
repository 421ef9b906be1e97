//! Shared API types, crypto, and SQL builders for the classroom server.
//!
//! This crate is the **single source of truth** for request/response shapes.
//! The server deserializes requests into these types and the e2e suite
//! deserializes responses back out of them.

use serde::{Deserialize, Serialize};

#[cfg(feature = "backend")]
pub mod crypto;
#[cfg(feature = "backend")]
pub mod db;
#[cfg(feature = "backend")]
pub mod service;

// ─── Shared Enums ────────────────────────────────────────────────────────────

/// Role of a user within their school.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Teacher => "TEACHER",
        }
    }

    /// Parse the stored/wire form. Anything unrecognised is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "STUDENT" => Some(Self::Student),
            "TEACHER" => Some(Self::Teacher),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Schools ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchoolResponse {
    pub id: String,
    pub name: String,
}

/// Returned by `GET /api/schools`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListSchoolsResponse {
    pub schools: Vec<SchoolResponse>,
}

// ─── Auth ────────────────────────────────────────────────────────────────────

/// Registration form submission. `institution` is a school id.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub institution: String,
}

/// Public view of a user row. Never carries password material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub school_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: UserProfile,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned on successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: u64,
    pub user: UserProfile,
}

/// Returned by `GET /api/me`: the user with their school and joined courses.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: UserProfile,
    pub school: Option<SchoolResponse>,
    pub courses: Vec<CourseResponse>,
}

// ─── Password reset ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailRef {
    pub email: String,
}

/// `{ "reset": { "email": ... } }`, returned by both forgot- and reset-password.
#[derive(Debug, Serialize, Deserialize)]
pub struct PasswordResetResponse {
    pub reset: EmailRef,
}

// ─── User management ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteUserRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub deleted: EmailRef,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedRole {
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateRoleResponse {
    pub updated: UpdatedRole,
}

// ─── Courses ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseResponse {
    pub id: String,
    pub code: String,
    pub name: String,
    pub creator_id: Option<String>,
    pub school_id: String,
}

/// Course creation. The caller states their own role; `user_role` is kept as a
/// raw string so that any value other than `TEACHER` is a permission failure
/// rather than a body rejection.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCourseRequest {
    pub user_id: String,
    pub user_role: String,
    pub school_id: String,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCourseResponse {
    #[serde(rename = "courseToCreate")]
    pub course_to_create: CourseResponse,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCourseRequest {
    pub requestor_email: String,
    pub course_id: String,
    pub emails_to_add: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCourseResponse {
    pub added_users: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberResponse {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub joined_at: String,
}

/// Returned by `GET /api/course-management/courses/:id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CourseDetailResponse {
    pub course: CourseResponse,
    pub members: Vec<MemberResponse>,
}

// ─── Health ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ─── Service Error ───────────────────────────────────────────────────────────

/// Framework-agnostic service error.
///
/// Each variant maps to an HTTP status code; the server turns it into a
/// `{"error": "..."}` response.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ServiceError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Gone(String),
    Internal(String),
}

impl ServiceError {
    /// HTTP status code as a `u16`.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Gone(_) => 410,
            Self::Internal(_) => 500,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Gone(m)
            | Self::Internal(m) => m,
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ServiceError {}

/// JSON error shape `{ "error": "..." }` returned by all error responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl From<&ServiceError> for ApiError {
    fn from(e: &ServiceError) -> Self {
        Self {
            error: e.message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_wire_form() {
        assert_eq!(serde_json::to_string(&Role::Teacher).unwrap(), "\"TEACHER\"");
        let r: Role = serde_json::from_str("\"STUDENT\"").unwrap();
        assert_eq!(r, Role::Student);
        assert_eq!(Role::parse("TEACHER"), Some(Role::Teacher));
        assert_eq!(Role::parse("teacher"), None);
    }

    #[test]
    fn add_to_course_uses_camel_case_fields() {
        let req: AddToCourseRequest = serde_json::from_value(serde_json::json!({
            "requestorEmail": "t@test.com",
            "courseId": "inst001_CS3213",
            "emailsToAdd": ["a@test.com", "b@test.com"],
        }))
        .unwrap();
        assert_eq!(req.course_id, "inst001_CS3213");
        assert_eq!(req.emails_to_add.len(), 2);

        let body = serde_json::to_value(AddToCourseResponse {
            added_users: vec!["a@test.com".into()],
        })
        .unwrap();
        assert_eq!(body["addedUsers"][0], "a@test.com");
    }

    #[test]
    fn create_course_response_is_wrapped() {
        let body = serde_json::to_value(CreateCourseResponse {
            course_to_create: CourseResponse {
                id: "inst001_CS3213".into(),
                code: "CS3213".into(),
                name: "Foundations of Software Engineering".into(),
                creator_id: Some("u1".into()),
                school_id: "inst001".into(),
            },
        })
        .unwrap();
        assert_eq!(body["courseToCreate"]["id"], "inst001_CS3213");
    }

    #[test]
    fn service_error_status_codes() {
        assert_eq!(ServiceError::Forbidden("x".into()).status_code(), 403);
        assert_eq!(ServiceError::Gone("x".into()).status_code(), 410);
        let api = ApiError::from(&ServiceError::NotFound("User not found.".into()));
        assert_eq!(api.error, "User not found.");
    }
}
