use axum::{
    Json,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, request::Parts},
};
use uuid::Uuid;

use classroom_api::{
    LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse, Role, UserProfile,
    crypto, db, service,
};

use crate::error::ApiErr;
use crate::extract::ApiJson;
use crate::storage::{
    Db, course_from_row, is_constraint_violation, login_from_row, profile_from_row,
    school_from_row, sq_execute, sq_query_map, sq_query_opt,
};
use crate::{AppConfig, now_unix};

// ---------------------------------------------------------------------------
// Auth extractor
// ---------------------------------------------------------------------------

/// Authenticated user extracted from the `Authorization: Bearer <jwt>` header.
pub struct AuthUser {
    pub profile: UserProfile,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Db: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiErr;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        if !config.auth_enabled() {
            return Err(ApiErr::unauthorized(service::MSG_AUTH_DISABLED));
        }

        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiErr::unauthorized("missing or invalid Authorization header"))?;

        let user_id = crypto::verify_jwt(token, &config.jwt_secret, now_unix())?;

        let db = Db::from_ref(state);
        let conn = db.conn();
        let profile = sq_query_opt(&conn, db::users::get_by_id(&user_id), profile_from_row)
            .map_err(ApiErr::from_db("auth user lookup"))?
            .ok_or_else(|| ApiErr::unauthorized("user no longer exists"))?;

        Ok(AuthUser { profile })
    }
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

/// POST /api/register: create a student account at an existing school.
pub async fn register(
    State(db): State<Db>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiErr> {
    let email = service::validate_email(&req.email)?;
    service::validate_password(&req.password)?;
    let school_id = req.institution.trim().to_string();

    // Hash before taking the connection lock.
    let (hash, salt) = crypto::hash_password(&req.password)?;
    let user_id = Uuid::new_v4().to_string();

    let conn = db.conn();

    let school = sq_query_opt(&conn, db::schools::get_by_id(&school_id), school_from_row)
        .map_err(ApiErr::from_db("register school lookup"))?;
    if school.is_none() {
        return Err(ApiErr::bad_request(service::MSG_BAD_INSTITUTION));
    }

    let existing = sq_query_opt(&conn, db::users::get_by_email(&email), profile_from_row)
        .map_err(ApiErr::from_db("register email lookup"))?;
    if existing.is_some() {
        return Err(ApiErr::conflict(service::MSG_EMAIL_TAKEN));
    }

    let inserted = sq_execute(
        &conn,
        db::users::insert(
            &user_id,
            &email,
            &hash,
            &salt,
            &school_id,
            Role::Student.as_str(),
        ),
    );
    match inserted {
        Ok(_) => {}
        Err(e) if is_constraint_violation(&e) => {
            return Err(ApiErr::conflict(service::MSG_EMAIL_TAKEN));
        }
        Err(e) => return Err(ApiErr::from_db("register insert")(e)),
    }

    let user = sq_query_opt(&conn, db::users::get_by_id(&user_id), profile_from_row)
        .map_err(ApiErr::from_db("register read back"))?
        .ok_or_else(|| ApiErr::internal(service::MSG_UNEXPECTED))?;

    tracing::info!(user_id = %user.id, school_id = %school_id, "user registered");
    Ok((StatusCode::CREATED, Json(RegisterResponse { user })))
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// POST /api/login: exchange email and password for an access token.
pub async fn login(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiErr> {
    if !config.auth_enabled() {
        tracing::error!("login attempted without JWT_SECRET");
        return Err(ApiErr::internal(service::MSG_AUTH_DISABLED));
    }

    let email = service::normalize_email(&req.email);
    let found = {
        let conn = db.conn();
        sq_query_opt(&conn, db::users::get_for_login(&email), login_from_row)
            .map_err(ApiErr::from_db("login lookup"))?
    };

    let Some((user, hash, salt)) = found else {
        return Err(ApiErr::unauthorized(service::MSG_BAD_CREDENTIALS));
    };
    if !crypto::verify_password(&req.password, &hash, &salt) {
        return Err(ApiErr::unauthorized(service::MSG_BAD_CREDENTIALS));
    }

    let access_token = crypto::sign_jwt(&user.id, &config.jwt_secret, now_unix());
    Ok(Json(LoginResponse {
        access_token,
        expires_in: crypto::JWT_EXPIRY_SECS,
        user,
    }))
}

// ---------------------------------------------------------------------------
// Me
// ---------------------------------------------------------------------------

/// GET /api/me: the caller with their school and joined courses.
pub async fn me(State(db): State<Db>, user: AuthUser) -> Result<Json<MeResponse>, ApiErr> {
    let conn = db.conn();

    let school = match &user.profile.school_id {
        Some(id) => sq_query_opt(&conn, db::schools::get_by_id(id), school_from_row)
            .map_err(ApiErr::from_db("me school"))?,
        None => None,
    };
    let courses = sq_query_map(
        &conn,
        db::courses::list_joined(&user.profile.id),
        course_from_row,
    )
    .map_err(ApiErr::from_db("me courses"))?;

    Ok(Json(MeResponse {
        user: user.profile,
        school,
        courses,
    }))
}
