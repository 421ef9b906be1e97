use axum::{Json, extract::State};

use classroom_api::{
    EmailRef, ForgotPasswordRequest, PasswordResetResponse, ResetPasswordRequest, crypto, db,
    service,
};

use crate::error::ApiErr;
use crate::extract::ApiJson;
use crate::mail::ResetEmail;
use crate::storage::{Db, profile_from_row, sq_execute, sq_query_opt};
use crate::{AppConfig, SharedMailer, now_unix};

// ---------------------------------------------------------------------------
// Forgot password
// ---------------------------------------------------------------------------

/// POST /api/forgot-password: issue a reset token and mail the link.
///
/// Any earlier tokens for the same email are replaced.
pub async fn forgot_password(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    State(mailer): State<SharedMailer>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<PasswordResetResponse>, ApiErr> {
    let email = service::normalize_email(&req.email);
    let token = service::prepare_reset_token(now_unix())?;

    {
        let conn = db.conn();
        let user = sq_query_opt(&conn, db::users::get_by_email(&email), profile_from_row)
            .map_err(ApiErr::from_db("forgot password lookup"))?;
        if user.is_none() {
            return Err(ApiErr::not_found(service::MSG_USER_NOT_FOUND));
        }

        sq_execute(&conn, db::reset_tokens::delete_for_email(&email))
            .map_err(ApiErr::from_db("clear reset tokens"))?;
        sq_execute(
            &conn,
            db::reset_tokens::insert(&token.id, &email, &token.token_hash, &token.expires_at),
        )
        .map_err(ApiErr::from_db("insert reset token"))?;
    }

    let message = ResetEmail {
        to: email.clone(),
        link: service::reset_link(&config.base_url, &token.raw),
    };
    mailer
        .send(&message)
        .map_err(ApiErr::from_db("send reset email"))?;

    tracing::info!(token_id = %token.id, "password reset requested");
    Ok(Json(PasswordResetResponse {
        reset: EmailRef { email },
    }))
}

// ---------------------------------------------------------------------------
// Reset password
// ---------------------------------------------------------------------------

/// POST /api/reset-password: consume a reset token and set a new password.
pub async fn reset_password(
    State(db): State<Db>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<PasswordResetResponse>, ApiErr> {
    let token_hash = crypto::hash_token(req.token.trim());

    let (token_id, email, expires_at) = {
        let conn = db.conn();
        sq_query_opt(&conn, db::reset_tokens::lookup(&token_hash), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(ApiErr::from_db("reset token lookup"))?
        .ok_or_else(|| ApiErr::not_found(service::MSG_BAD_RESET_TOKEN))?
    };

    if service::is_expired(&expires_at, now_unix()) {
        let conn = db.conn();
        sq_execute(&conn, db::reset_tokens::delete_by_id(&token_id))
            .map_err(ApiErr::from_db("drop expired reset token"))?;
        return Err(ApiErr::gone(service::MSG_BAD_RESET_TOKEN));
    }

    service::validate_password(&req.password)?;
    let (hash, salt) = crypto::hash_password(&req.password)?;

    let conn = db.conn();
    let updated = sq_execute(&conn, db::users::update_password(&email, &hash, &salt))
        .map_err(ApiErr::from_db("update password"))?;
    sq_execute(&conn, db::reset_tokens::delete_by_id(&token_id))
        .map_err(ApiErr::from_db("consume reset token"))?;
    if updated == 0 {
        return Err(ApiErr::not_found(service::MSG_USER_NOT_FOUND));
    }

    tracing::info!(token_id = %token_id, "password reset");
    Ok(Json(PasswordResetResponse {
        reset: EmailRef { email },
    }))
}
