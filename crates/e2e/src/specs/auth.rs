use anyhow::{Result, ensure};

use classroom_api::{AddToCourseRequest, MeResponse, RegisterRequest, RegisterResponse, Role};

use crate::client::{TestContext, expect_error};
use crate::fixtures::{self, PASSWORD, SCHOOL_ID};

/// POST /api/register → 201, new accounts are students.
pub async fn register_student(ctx: &TestContext) -> Result<()> {
    let email = fixtures::unique_email("fresh");
    let resp = ctx
        .post_json(
            "/register",
            &RegisterRequest {
                // Stored trimmed and lower-cased.
                email: format!("  {}  ", email.to_uppercase()),
                password: PASSWORD.into(),
                institution: SCHOOL_ID.into(),
            },
        )
        .await?;
    ensure!(resp.status() == 201, "expected 201, got {}", resp.status());

    let body: RegisterResponse = resp.json().await?;
    ensure!(body.user.email == email, "expected {email}, got {}", body.user.email);
    ensure!(body.user.role == Role::Student, "expected STUDENT");
    ensure!(
        body.user.school_id.as_deref() == Some(SCHOOL_ID),
        "expected school {SCHOOL_ID}"
    );
    Ok(())
}

/// Same email → 409.
pub async fn register_duplicate_email(ctx: &TestContext) -> Result<()> {
    let user = ctx.register_user().await?;
    let resp = ctx
        .post_json(
            "/register",
            &RegisterRequest {
                email: user.email.clone(),
                password: PASSWORD.into(),
                institution: SCHOOL_ID.into(),
            },
        )
        .await?;
    expect_error(resp, 409, "This email address is already registered.").await
}

/// Bad email, short password or unknown school → 400.
pub async fn register_invalid_input(ctx: &TestContext) -> Result<()> {
    let resp = ctx
        .post_json(
            "/register",
            &RegisterRequest {
                email: "not-an-email".into(),
                password: PASSWORD.into(),
                institution: SCHOOL_ID.into(),
            },
        )
        .await?;
    expect_error(resp, 400, "Invalid email format").await?;

    let resp = ctx
        .post_json(
            "/register",
            &RegisterRequest {
                email: fixtures::unique_email("short"),
                password: "12345".into(),
                institution: SCHOOL_ID.into(),
            },
        )
        .await?;
    expect_error(resp, 400, "Password must be at least 6 characters").await?;

    let resp = ctx
        .post_json(
            "/register",
            &RegisterRequest {
                email: fixtures::unique_email("noschool"),
                password: PASSWORD.into(),
                institution: "inst-missing".into(),
            },
        )
        .await?;
    expect_error(resp, 400, "Select a valid institution").await
}

/// POST /api/login → token usable on /api/me.
pub async fn login_and_me(ctx: &TestContext) -> Result<()> {
    let user = ctx.register_user().await?;
    let tokens = ctx.login(&user.email, &user.password).await?;
    ensure!(!tokens.access_token.is_empty(), "expected access_token");
    ensure!(tokens.expires_in == 3600, "expected 1h expiry");
    ensure!(tokens.user.id == user.user_id, "login returned another user");

    let resp = ctx.get_authed("/me", &tokens.access_token).await?;
    ensure!(resp.status() == 200, "expected 200, got {}", resp.status());
    let me: MeResponse = resp.json().await?;
    ensure!(me.user.email == user.email, "expected {}", user.email);
    ensure!(
        me.school.as_ref().map(|s| s.id.as_str()) == Some(SCHOOL_ID),
        "expected school {SCHOOL_ID}"
    );
    ensure!(me.courses.is_empty(), "new user should have no courses");
    Ok(())
}

/// Wrong password and unknown email get the same 401.
pub async fn login_bad_credentials(ctx: &TestContext) -> Result<()> {
    let user = ctx.register_user().await?;

    let resp = ctx
        .post_json(
            "/login",
            &serde_json::json!({ "email": user.email, "password": "wrongpass" }),
        )
        .await?;
    expect_error(resp, 401, "Invalid email or password.").await?;

    let resp = ctx
        .post_json(
            "/login",
            &serde_json::json!({
                "email": fixtures::unique_email("ghost"),
                "password": PASSWORD,
            }),
        )
        .await?;
    expect_error(resp, 401, "Invalid email or password.").await
}

/// GET /api/me without a valid bearer token → 401.
pub async fn me_requires_token(ctx: &TestContext) -> Result<()> {
    let resp = ctx.get("/me").await?;
    ensure!(resp.status() == 401, "expected 401, got {}", resp.status());

    let resp = ctx.get_authed("/me", "not.a.jwt").await?;
    ensure!(resp.status() == 401, "expected 401, got {}", resp.status());
    Ok(())
}

/// Joined courses show up on /api/me.
pub async fn me_lists_joined_courses(ctx: &TestContext) -> Result<()> {
    let teacher = ctx.register_teacher().await?;
    let student = ctx.register_user().await?;
    let course = ctx.create_course(&teacher).await?;

    let resp = ctx
        .post_json(
            "/course-management/add-to-course",
            &AddToCourseRequest {
                requestor_email: teacher.email.clone(),
                course_id: course.id.clone(),
                emails_to_add: vec![student.email.clone()],
            },
        )
        .await?;
    ensure!(resp.status() == 200, "expected 200, got {}", resp.status());

    let tokens = ctx.login(&student.email, &student.password).await?;
    let me: MeResponse = ctx
        .get_authed("/me", &tokens.access_token)
        .await?
        .error_for_status()?
        .json()
        .await?;
    ensure!(
        me.courses.iter().any(|c| c.id == course.id),
        "expected {} in joined courses",
        course.id
    );
    Ok(())
}
