use axum::{
    Json,
    extract::{Path, State},
};

use classroom_api::{
    AddToCourseRequest, AddToCourseResponse, CourseDetailResponse, CreateCourseRequest,
    CreateCourseResponse, Role, db, service,
};

use crate::error::ApiErr;
use crate::extract::ApiJson;
use crate::storage::{
    Db, course_from_row, is_constraint_violation, member_from_row, profile_from_row,
    school_from_row, sq_execute, sq_query_map, sq_query_opt,
};

// ---------------------------------------------------------------------------
// Create course
// ---------------------------------------------------------------------------

/// POST /api/course-management/create-course: teachers create a course in a
/// school. The course id is `{school_id}_{code}`.
pub async fn create_course(
    State(db): State<Db>,
    ApiJson(req): ApiJson<CreateCourseRequest>,
) -> Result<Json<CreateCourseResponse>, ApiErr> {
    service::require_teacher(Role::parse(&req.user_role))?;

    let code = service::validate_course_field("code", &req.code)?;
    let name = service::validate_course_field("name", &req.name)?;
    let school_id = service::validate_course_field("school_id", &req.school_id)?;
    let id = service::course_id(&school_id, &code);

    let conn = db.conn();

    let duplicate = sq_query_opt(&conn, db::courses::get_by_id(&id), course_from_row)
        .map_err(ApiErr::from_db("create course lookup"))?;
    if duplicate.is_some() {
        return Err(ApiErr::conflict(service::MSG_COURSE_EXISTS));
    }

    let creator = sq_query_opt(&conn, db::users::get_by_id(&req.user_id), profile_from_row)
        .map_err(ApiErr::from_db("create course creator"))?;
    if creator.is_none() {
        return Err(ApiErr::not_found(service::MSG_NOT_A_VALID_USER));
    }
    let school = sq_query_opt(&conn, db::schools::get_by_id(&school_id), school_from_row)
        .map_err(ApiErr::from_db("create course school"))?;
    if school.is_none() {
        return Err(ApiErr::not_found(service::MSG_INVALID_SCHOOL));
    }

    match sq_execute(
        &conn,
        db::courses::insert(&id, &code, &name, &req.user_id, &school_id),
    ) {
        Ok(_) => {}
        // Lost a race with a concurrent insert of the same id.
        Err(e) if is_constraint_violation(&e) => {
            return Err(ApiErr::conflict(service::MSG_COURSE_EXISTS));
        }
        Err(e) => return Err(ApiErr::from_db("create course insert")(e)),
    }

    let course_to_create = sq_query_opt(&conn, db::courses::get_by_id(&id), course_from_row)
        .map_err(ApiErr::from_db("create course read back"))?
        .ok_or_else(|| ApiErr::internal(service::MSG_UNEXPECTED))?;

    tracing::info!(course_id = %id, creator_id = %req.user_id, "course created");
    Ok(Json(CreateCourseResponse { course_to_create }))
}

// ---------------------------------------------------------------------------
// Add to course
// ---------------------------------------------------------------------------

/// POST /api/course-management/add-to-course: a teacher enrolls users by
/// email. Either every listed user is enrolled or none is.
pub async fn add_to_course(
    State(db): State<Db>,
    ApiJson(req): ApiJson<AddToCourseRequest>,
) -> Result<Json<AddToCourseResponse>, ApiErr> {
    let requestor_email = service::normalize_email(&req.requestor_email);

    let mut conn = db.conn();

    let requestor = sq_query_opt(
        &conn,
        db::users::get_by_email(&requestor_email),
        profile_from_row,
    )
    .map_err(ApiErr::from_db("add to course requestor"))?
    .ok_or_else(|| ApiErr::not_found(service::MSG_NOT_A_VALID_USER))?;
    service::require_teacher(Some(requestor.role))?;

    let course = sq_query_opt(&conn, db::courses::get_by_id(&req.course_id), course_from_row)
        .map_err(ApiErr::from_db("add to course lookup"))?
        .ok_or_else(|| ApiErr::not_found(service::MSG_INVALID_COURSE))?;

    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("add to course begin"))?;

    let mut added_users = Vec::with_capacity(req.emails_to_add.len());
    for raw in &req.emails_to_add {
        let email = service::normalize_email(raw);
        // Dropping `tx` on early return rolls back earlier enrollments.
        let user = sq_query_opt(&tx, db::users::get_by_email(&email), profile_from_row)
            .map_err(ApiErr::from_db("add to course user"))?
            .ok_or_else(|| ApiErr::not_found(format!("User with email: {raw} does not exist.")))?;

        sq_execute(&tx, db::courses::join(&course.id, &user.id))
            .map_err(ApiErr::from_db("add to course join"))?;
        added_users.push(user.email);
    }

    tx.commit().map_err(ApiErr::from_db("add to course commit"))?;

    tracing::info!(
        course_id = %course.id,
        requestor = %requestor.email,
        count = added_users.len(),
        "users added to course"
    );
    Ok(Json(AddToCourseResponse { added_users }))
}

// ---------------------------------------------------------------------------
// Course detail
// ---------------------------------------------------------------------------

/// GET /api/course-management/courses/:id: course with its enrolled members.
pub async fn get_course(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<CourseDetailResponse>, ApiErr> {
    let conn = db.conn();

    let course = sq_query_opt(&conn, db::courses::get_by_id(&id), course_from_row)
        .map_err(ApiErr::from_db("get course"))?
        .ok_or_else(|| ApiErr::not_found(service::MSG_INVALID_COURSE))?;
    let members = sq_query_map(&conn, db::courses::list_members(&id), member_from_row)
        .map_err(ApiErr::from_db("list course members"))?;

    Ok(Json(CourseDetailResponse { course, members }))
}
