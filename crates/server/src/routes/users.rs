use axum::{Json, extract::State};

use classroom_api::{
    DeleteUserRequest, DeleteUserResponse, EmailRef, UpdateRoleRequest, UpdateRoleResponse,
    UpdatedRole, db, service,
};

use crate::error::ApiErr;
use crate::extract::ApiJson;
use crate::storage::{Db, profile_from_row, sq_execute, sq_query_opt};

/// DELETE /api/user-management/delete-row: permanently remove a user by email.
///
/// Course memberships cascade; courses the user created stay with no creator.
pub async fn delete_user(
    State(db): State<Db>,
    ApiJson(req): ApiJson<DeleteUserRequest>,
) -> Result<Json<DeleteUserResponse>, ApiErr> {
    let email = service::normalize_email(&req.email);
    let conn = db.conn();

    let user = sq_query_opt(&conn, db::users::get_by_email(&email), profile_from_row)
        .map_err(ApiErr::from_db("delete user lookup"))?
        .ok_or_else(|| ApiErr::not_found(service::MSG_NOT_A_VALID_USER))?;

    sq_execute(&conn, db::users::delete_by_email(&user.email))
        .map_err(ApiErr::from_db("delete user"))?;
    sq_execute(&conn, db::reset_tokens::delete_for_email(&user.email))
        .map_err(ApiErr::from_db("delete user reset tokens"))?;

    tracing::info!(user_id = %user.id, "user deleted");
    Ok(Json(DeleteUserResponse {
        deleted: EmailRef { email: user.email },
    }))
}

/// PUT /api/user-management/update-role: switch a user between student and teacher.
pub async fn update_role(
    State(db): State<Db>,
    ApiJson(req): ApiJson<UpdateRoleRequest>,
) -> Result<Json<UpdateRoleResponse>, ApiErr> {
    let email = service::normalize_email(&req.email);
    let conn = db.conn();

    let user = sq_query_opt(&conn, db::users::get_by_email(&email), profile_from_row)
        .map_err(ApiErr::from_db("update role lookup"))?
        .ok_or_else(|| ApiErr::not_found(service::MSG_NOT_A_VALID_USER))?;

    sq_execute(&conn, db::users::update_role(&user.email, req.role.as_str()))
        .map_err(ApiErr::from_db("update role"))?;

    tracing::info!(user_id = %user.id, from = %user.role, to = %req.role, "role updated");
    Ok(Json(UpdateRoleResponse {
        updated: UpdatedRole {
            email: user.email,
            role: req.role,
        },
    }))
}
