use anyhow::{Result, ensure};

use classroom_api::{
    AddToCourseRequest, AddToCourseResponse, ApiError, CourseDetailResponse, CreateCourseRequest,
    CreateCourseResponse,
};

use crate::client::{TestContext, expect_error};
use crate::fixtures::{self, SCHOOL_ID};

const NO_PERMISSION: &str = "You do not have the permission to make this request.";

fn create_request(user_id: &str, user_role: &str, code: &str) -> CreateCourseRequest {
    CreateCourseRequest {
        user_id: user_id.into(),
        user_role: user_role.into(),
        school_id: SCHOOL_ID.into(),
        code: code.into(),
        name: "Foundations of Software Engineering".into(),
    }
}

fn add_request(requestor: &str, course_id: &str, emails: &[&str]) -> AddToCourseRequest {
    AddToCourseRequest {
        requestor_email: requestor.into(),
        course_id: course_id.into(),
        emails_to_add: emails.iter().map(|e| e.to_string()).collect(),
    }
}

// ---------------------------------------------------------------------------
// Create course
// ---------------------------------------------------------------------------

/// Teacher creates a course → 200 with the composite id.
pub async fn create_course(ctx: &TestContext) -> Result<()> {
    let teacher = ctx.register_teacher().await?;
    let code = fixtures::unique_course_code();

    let resp = ctx
        .post_json(
            "/course-management/create-course",
            &create_request(&teacher.user_id, "TEACHER", &code),
        )
        .await?;
    ensure!(resp.status() == 200, "expected 200, got {}", resp.status());

    let body: CreateCourseResponse = resp.json().await?;
    let course = body.course_to_create;
    ensure!(course.id == format!("{SCHOOL_ID}_{code}"), "unexpected id {}", course.id);
    ensure!(course.code == code, "unexpected code {}", course.code);
    ensure!(
        course.creator_id.as_deref() == Some(teacher.user_id.as_str()),
        "creator not recorded"
    );
    ensure!(course.school_id == SCHOOL_ID, "unexpected school {}", course.school_id);
    Ok(())
}

/// Any role other than TEACHER → 403.
pub async fn create_course_requires_teacher(ctx: &TestContext) -> Result<()> {
    let student = ctx.register_user().await?;
    for role in ["STUDENT", "teacher", " TEACHER ", "ADMIN"] {
        let resp = ctx
            .post_json(
                "/course-management/create-course",
                &create_request(&student.user_id, role, &fixtures::unique_course_code()),
            )
            .await?;
        expect_error(resp, 403, NO_PERMISSION).await?;
    }
    Ok(())
}

/// Same school + code twice → 409.
pub async fn create_course_duplicate(ctx: &TestContext) -> Result<()> {
    let teacher = ctx.register_teacher().await?;
    let course = ctx.create_course(&teacher).await?;

    let resp = ctx
        .post_json(
            "/course-management/create-course",
            &create_request(&teacher.user_id, "TEACHER", &course.code),
        )
        .await?;
    expect_error(resp, 409, "Course already exists.").await
}

/// Unknown creator or school → 404.
pub async fn create_course_unknown_refs(ctx: &TestContext) -> Result<()> {
    let resp = ctx
        .post_json(
            "/course-management/create-course",
            &create_request("no-such-user", "TEACHER", &fixtures::unique_course_code()),
        )
        .await?;
    expect_error(resp, 404, "Not a valid user.").await?;

    let teacher = ctx.register_teacher().await?;
    let mut req = create_request(&teacher.user_id, "TEACHER", &fixtures::unique_course_code());
    req.school_id = "inst-missing".into();
    let resp = ctx
        .post_json("/course-management/create-course", &req)
        .await?;
    expect_error(resp, 404, "Invalid school ID.").await
}

/// Blank code after trimming → 400 naming the field.
pub async fn create_course_blank_field(ctx: &TestContext) -> Result<()> {
    let teacher = ctx.register_teacher().await?;

    let resp = ctx
        .post_json(
            "/course-management/create-course",
            &create_request(&teacher.user_id, "TEACHER", "   "),
        )
        .await?;
    expect_error(resp, 400, "code must not be empty").await?;

    let mut req = create_request(&teacher.user_id, "TEACHER", &fixtures::unique_course_code());
    req.name = String::new();
    let resp = ctx
        .post_json("/course-management/create-course", &req)
        .await?;
    expect_error(resp, 400, "name must not be empty").await
}

// ---------------------------------------------------------------------------
// Add to course
// ---------------------------------------------------------------------------

/// Student requestor → 403.
pub async fn add_to_course_student_forbidden(ctx: &TestContext) -> Result<()> {
    let teacher = ctx.register_teacher().await?;
    let student = ctx.register_user().await?;
    let other = ctx.register_user().await?;
    let course = ctx.create_course(&teacher).await?;

    let resp = ctx
        .post_json(
            "/course-management/add-to-course",
            &add_request(&student.email, &course.id, &[&other.email]),
        )
        .await?;
    expect_error(resp, 403, NO_PERMISSION).await
}

/// Unknown requestor → 404.
pub async fn add_to_course_unknown_requestor(ctx: &TestContext) -> Result<()> {
    let teacher = ctx.register_teacher().await?;
    let course = ctx.create_course(&teacher).await?;

    let resp = ctx
        .post_json(
            "/course-management/add-to-course",
            &add_request(&fixtures::unique_email("ghost"), &course.id, &[]),
        )
        .await?;
    expect_error(resp, 404, "Not a valid user.").await
}

/// Unknown course → 404.
pub async fn add_to_course_unknown_course(ctx: &TestContext) -> Result<()> {
    let teacher = ctx.register_teacher().await?;
    let student = ctx.register_user().await?;

    let resp = ctx
        .post_json(
            "/course-management/add-to-course",
            &add_request(&teacher.email, "inst001_NOPE", &[&student.email]),
        )
        .await?;
    expect_error(resp, 404, "Invalid course ID.").await
}

/// Teacher enrolls two students → 200 with emails in request order.
pub async fn add_to_course(ctx: &TestContext) -> Result<()> {
    let teacher = ctx.register_teacher().await?;
    let first = ctx.register_user().await?;
    let second = ctx.register_user().await?;
    let course = ctx.create_course(&teacher).await?;

    let resp = ctx
        .post_json(
            "/course-management/add-to-course",
            &add_request(&teacher.email, &course.id, &[&second.email, &first.email]),
        )
        .await?;
    ensure!(resp.status() == 200, "expected 200, got {}", resp.status());
    let body: AddToCourseResponse = resp.json().await?;
    ensure!(
        body.added_users == vec![second.email.clone(), first.email.clone()],
        "unexpected addedUsers {:?}",
        body.added_users
    );

    let detail: CourseDetailResponse = ctx
        .get(&format!("/course-management/courses/{}", course.id))
        .await?
        .error_for_status()?
        .json()
        .await?;
    ensure!(detail.members.len() == 2, "expected 2 members");
    Ok(())
}

/// Enrolling someone twice leaves one membership.
pub async fn add_to_course_twice(ctx: &TestContext) -> Result<()> {
    let teacher = ctx.register_teacher().await?;
    let student = ctx.register_user().await?;
    let course = ctx.create_course(&teacher).await?;

    for _ in 0..2 {
        let resp = ctx
            .post_json(
                "/course-management/add-to-course",
                &add_request(&teacher.email, &course.id, &[&student.email]),
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
    ensure!(detail.members.len() == 1, "expected 1 member");
    ensure!(detail.members[0].user_id == student.user_id, "wrong member");
    Ok(())
}

/// One unknown target email → 404 and nobody from the batch is enrolled.
pub async fn add_to_course_unknown_target(ctx: &TestContext) -> Result<()> {
    let teacher = ctx.register_teacher().await?;
    let student = ctx.register_user().await?;
    let course = ctx.create_course(&teacher).await?;
    let missing = fixtures::unique_email("missing");

    let resp = ctx
        .post_json(
            "/course-management/add-to-course",
            &add_request(&teacher.email, &course.id, &[&student.email, &missing]),
        )
        .await?;
    expect_error(
        resp,
        404,
        &format!("User with email: {missing} does not exist."),
    )
    .await?;

    let detail: CourseDetailResponse = ctx
        .get(&format!("/course-management/courses/{}", course.id))
        .await?
        .error_for_status()?
        .json()
        .await?;
    ensure!(
        detail.members.is_empty(),
        "expected no members after failed batch, got {:?}",
        detail.members
    );
    Ok(())
}

/// Body missing required fields → 400 with the usual JSON error shape.
pub async fn add_to_course_malformed_body(ctx: &TestContext) -> Result<()> {
    let resp = ctx
        .post_json("/course-management/add-to-course", &serde_json::json!({}))
        .await?;
    ensure!(resp.status() == 400, "expected 400, got {}", resp.status());
    let body: ApiError = resp.json().await?;
    ensure!(
        body.error == "Invalid request body.",
        "unexpected error {:?}",
        body.error
    );
    Ok(())
}

/// GET an unknown course → 404.
pub async fn get_course_unknown(ctx: &TestContext) -> Result<()> {
    let resp = ctx.get("/course-management/courses/inst001_NOPE").await?;
    expect_error(resp, 404, "Invalid course ID.").await
}
