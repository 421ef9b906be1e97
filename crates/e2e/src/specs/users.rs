use anyhow::{Result, ensure};

use classroom_api::{
    CourseDetailResponse, DeleteUserRequest, DeleteUserResponse, Role, UpdateRoleRequest,
    UpdateRoleResponse,
};

use crate::client::{TestContext, expect_error};
use crate::fixtures;

/// DELETE /api/user-management/delete-row → 200, then the email is free again.
pub async fn delete_user(ctx: &TestContext) -> Result<()> {
    let user = ctx.register_user().await?;

    let resp = ctx
        .delete_json(
            "/user-management/delete-row",
            &DeleteUserRequest {
                email: user.email.clone(),
            },
        )
        .await?;
    ensure!(resp.status() == 200, "expected 200, got {}", resp.status());
    let body: DeleteUserResponse = resp.json().await?;
    ensure!(body.deleted.email == user.email, "unexpected {}", body.deleted.email);

    let resp = ctx
        .delete_json(
            "/user-management/delete-row",
            &DeleteUserRequest {
                email: user.email.clone(),
            },
        )
        .await?;
    expect_error(resp, 404, "Not a valid user.").await?;

    ensure!(
        ctx.login(&user.email, &user.password).await.is_err(),
        "deleted user could still log in"
    );
    Ok(())
}

/// Unknown email → 404.
pub async fn delete_user_unknown(ctx: &TestContext) -> Result<()> {
    let resp = ctx
        .delete_json(
            "/user-management/delete-row",
            &DeleteUserRequest {
                email: fixtures::unique_email("ghost"),
            },
        )
        .await?;
    expect_error(resp, 404, "Not a valid user.").await
}

/// Deleting a teacher keeps their course with no creator and drops memberships.
pub async fn delete_user_keeps_courses(ctx: &TestContext) -> Result<()> {
    let teacher = ctx.register_teacher().await?;
    let student = ctx.register_user().await?;
    let course = ctx.create_course(&teacher).await?;

    let resp = ctx
        .post_json(
            "/course-management/add-to-course",
            &serde_json::json!({
                "requestorEmail": teacher.email,
                "courseId": course.id,
                "emailsToAdd": [student.email],
            }),
        )
        .await?;
    ensure!(resp.status() == 200, "expected 200, got {}", resp.status());

    for email in [&teacher.email, &student.email] {
        let resp = ctx
            .delete_json(
                "/user-management/delete-row",
                &DeleteUserRequest {
                    email: email.clone(),
                },
            )
            .await?;
        ensure!(resp.status() == 200, "expected 200, got {}", resp.status());
    }

    let detail: CourseDetailResponse = ctx
        .get(&format!("/course-management/courses/{}", course.id))
        .await?
        .error_for_status()?
        .json()
        .await?;
    ensure!(detail.course.creator_id.is_none(), "creator should be cleared");
    ensure!(detail.members.is_empty(), "memberships should cascade");
    Ok(())
}

/// PUT /api/user-management/update-role → 200, and the role sticks.
pub async fn update_role(ctx: &TestContext) -> Result<()> {
    let user = ctx.register_user().await?;

    let resp = ctx
        .put_json(
            "/user-management/update-role",
            &UpdateRoleRequest {
                email: user.email.clone(),
                role: Role::Teacher,
            },
        )
        .await?;
    ensure!(resp.status() == 200, "expected 200, got {}", resp.status());
    let body: UpdateRoleResponse = resp.json().await?;
    ensure!(body.updated.role == Role::Teacher, "expected TEACHER");

    let tokens = ctx.login(&user.email, &user.password).await?;
    ensure!(tokens.user.role == Role::Teacher, "role not persisted");
    Ok(())
}

/// Unknown email → 404.
pub async fn update_role_unknown(ctx: &TestContext) -> Result<()> {
    let resp = ctx
        .put_json(
            "/user-management/update-role",
            &UpdateRoleRequest {
                email: fixtures::unique_email("ghost"),
                role: Role::Teacher,
            },
        )
        .await?;
    expect_error(resp, 404, "Not a valid user.").await
}
