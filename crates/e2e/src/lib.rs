pub mod client;
pub mod fixtures;
pub mod specs;

/// Invoke `$mac!(module::name)` for every HTTP-level spec.
///
/// Adding a spec here registers it in `tests/server.rs`.
#[macro_export]
macro_rules! for_each_spec {
    ($mac:ident) => {
        // health (1)
        $mac!(health::health_check);

        // schools (1)
        $mac!(schools::list_schools);

        // auth (7)
        $mac!(auth::register_student);
        $mac!(auth::register_duplicate_email);
        $mac!(auth::register_invalid_input);
        $mac!(auth::login_and_me);
        $mac!(auth::login_bad_credentials);
        $mac!(auth::me_requires_token);
        $mac!(auth::me_lists_joined_courses);

        // courses (13)
        $mac!(courses::create_course);
        $mac!(courses::create_course_requires_teacher);
        $mac!(courses::create_course_duplicate);
        $mac!(courses::create_course_unknown_refs);
        $mac!(courses::create_course_blank_field);
        $mac!(courses::add_to_course_student_forbidden);
        $mac!(courses::add_to_course_unknown_requestor);
        $mac!(courses::add_to_course_unknown_course);
        $mac!(courses::add_to_course);
        $mac!(courses::add_to_course_twice);
        $mac!(courses::add_to_course_unknown_target);
        $mac!(courses::add_to_course_malformed_body);
        $mac!(courses::get_course_unknown);

        // users (5)
        $mac!(users::delete_user);
        $mac!(users::delete_user_unknown);
        $mac!(users::delete_user_keeps_courses);
        $mac!(users::update_role);
        $mac!(users::update_role_unknown);

        // password reset (3)
        $mac!(password::forgot_password);
        $mac!(password::forgot_password_unknown);
        $mac!(password::reset_password_unknown_token);
    };
}
