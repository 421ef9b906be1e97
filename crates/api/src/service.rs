//! Shared business rules as framework-agnostic pure functions.
//!
//! Route handlers stay thin adapters around these: they fetch rows, call into
//! here to decide, then write rows.

use crate::{Role, ServiceError};

// ─── Fixed response messages ────────────────────────────────────────────────

pub const MSG_NOT_A_VALID_USER: &str = "Not a valid user.";
pub const MSG_NO_PERMISSION: &str = "You do not have the permission to make this request.";
pub const MSG_INVALID_COURSE: &str = "Invalid course ID.";
pub const MSG_COURSE_EXISTS: &str = "Course already exists.";
pub const MSG_USER_NOT_FOUND: &str = "User not found.";
pub const MSG_EMAIL_TAKEN: &str = "This email address is already registered.";
pub const MSG_BAD_CREDENTIALS: &str = "Invalid email or password.";
pub const MSG_BAD_RESET_TOKEN: &str = "Invalid or expired token.";
pub const MSG_BAD_INSTITUTION: &str = "Select a valid institution";
pub const MSG_INVALID_SCHOOL: &str = "Invalid school ID.";
pub const MSG_AUTH_DISABLED: &str = "Authentication is not configured.";
pub const MSG_BAD_BODY: &str = "Invalid request body.";
pub const MSG_UNEXPECTED: &str = "Unexpected error occurred.";

const MIN_PASSWORD_LEN: usize = 6;
const MAX_EMAIL_LEN: usize = 254;

// ─── Validation ─────────────────────────────────────────────────────────────

/// Canonical form of an email used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate and normalize an email address.
pub fn validate_email(email: &str) -> Result<String, ServiceError> {
    let email = normalize_email(email);
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !well_formed || email.len() > MAX_EMAIL_LEN {
        return Err(ServiceError::BadRequest("Invalid email format".into()));
    }
    Ok(email)
}

/// Passwords need at least six characters.
pub fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Trim a required course field, rejecting blanks.
pub fn validate_course_field(field: &str, value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

// ─── Permissions ────────────────────────────────────────────────────────────

/// Only teachers may create courses or enroll users.
pub fn require_teacher(role: Option<Role>) -> Result<(), ServiceError> {
    match role {
        Some(Role::Teacher) => Ok(()),
        _ => Err(ServiceError::Forbidden(MSG_NO_PERMISSION.into())),
    }
}

// ─── Courses ────────────────────────────────────────────────────────────────

/// Composite course primary key: `{school_id}_{code}`.
pub fn course_id(school_id: &str, code: &str) -> String {
    format!("{school_id}_{code}")
}

// ─── Password reset ─────────────────────────────────────────────────────────

/// A freshly minted reset token. The raw token only goes into the email; the
/// database only ever sees `token_hash`.
pub struct ResetToken {
    pub id: String,
    pub raw: String,
    pub token_hash: String,
    pub expires_at: String,
}

pub fn prepare_reset_token(now_unix: u64) -> Result<ResetToken, ServiceError> {
    use crate::crypto;

    let raw = crypto::generate_token()?;
    Ok(ResetToken {
        id: uuid::Uuid::new_v4().to_string(),
        token_hash: crypto::hash_token(&raw),
        raw,
        expires_at: sqlite_datetime(now_unix + crypto::RESET_TOKEN_EXPIRY_SECS)?,
    })
}

/// Link sent in the reset email.
pub fn reset_link(base_url: &str, raw_token: &str) -> String {
    format!(
        "{}/reset-password?token={raw_token}",
        base_url.trim_end_matches('/')
    )
}

/// Whether a stored `expires_at` is in the past. Unparseable values count as
/// expired.
pub fn is_expired(expires_at: &str, now_unix: u64) -> bool {
    match chrono::NaiveDateTime::parse_from_str(expires_at, SQLITE_DATETIME) {
        Ok(exp) => exp.and_utc().timestamp() < saturating_i64(now_unix),
        Err(_) => true,
    }
}

// ─── Time ───────────────────────────────────────────────────────────────────

const SQLITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// Format a unix timestamp the way SQLite's `datetime('now')` does.
pub fn sqlite_datetime(unix: u64) -> Result<String, ServiceError> {
    chrono::DateTime::from_timestamp(saturating_i64(unix), 0)
        .map(|t| t.format(SQLITE_DATETIME).to_string())
        .ok_or_else(|| ServiceError::Internal("invalid timestamp".into()))
}

fn saturating_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized_and_checked() {
        assert_eq!(validate_email("  Student1@Test.COM ").unwrap(), "student1@test.com");
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@test.com").is_err());
        assert!(validate_email("a@").is_err());
        assert!(validate_email(&format!("{}@x.io", "a".repeat(260))).is_err());
    }

    #[test]
    fn password_minimum_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        let err = validate_password("abc").unwrap_err();
        assert_eq!(err.message(), "Password must be at least 6 characters");
    }

    #[test]
    fn only_teachers_pass_permission_gate() {
        assert!(require_teacher(Some(Role::Teacher)).is_ok());
        let err = require_teacher(Some(Role::Student)).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.message(), MSG_NO_PERMISSION);
        assert!(require_teacher(None).is_err());
    }

    #[test]
    fn course_id_is_composite() {
        assert_eq!(course_id("inst001", "CS3213"), "inst001_CS3213");
    }

    #[test]
    fn reset_token_expiry_window() {
        let now = 1_700_000_000;
        let token = prepare_reset_token(now).unwrap();
        assert_eq!(token.token_hash, crate::crypto::hash_token(&token.raw));
        assert!(!is_expired(&token.expires_at, now));
        assert!(!is_expired(&token.expires_at, now + 3599));
        assert!(is_expired(&token.expires_at, now + 3601));
        assert!(is_expired("garbage", now));
    }

    #[test]
    fn reset_link_joins_base_url() {
        assert_eq!(
            reset_link("http://localhost:3000/", "abc"),
            "http://localhost:3000/reset-password?token=abc"
        );
    }
}
