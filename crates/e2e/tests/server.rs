use std::sync::Arc;

use classroom_api::{
    DeleteUserRequest, ForgotPasswordRequest, LoginRequest, PasswordResetResponse,
    ResetPasswordRequest, crypto, db, service,
};
use classroom_e2e::client::{TestContext, expect_error};
use classroom_e2e::fixtures::{SCHOOL_ID, SCHOOL_NAME};
use classroom_server::mail::{Mailer, Outbox, ResetEmail};
use classroom_server::storage::{self, Db};
use classroom_server::{AppConfig, AppState, SharedMailer, build_router, now_unix};

/// An in-process server on an ephemeral port, backed by a throwaway database.
struct TestServer {
    ctx: TestContext,
    db: Db,
    _dir: tempfile::TempDir,
}

async fn spawn_server(mailer: SharedMailer) -> TestServer {
    spawn_server_with(mailer, |_| {}).await
}

/// Like `spawn_server`, with a hook to adjust the config before the router is built.
async fn spawn_server_with(
    mailer: SharedMailer,
    configure: impl FnOnce(&mut AppConfig),
) -> TestServer {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classroom_server=warn".into()),
        )
        .with_test_writer()
        .try_init();

    let dir = tempfile::tempdir().expect("tempdir");
    let db = storage::init_db(dir.path()).expect("init db");
    storage::seed_schools(&db, &[(SCHOOL_ID.into(), SCHOOL_NAME.into())]).expect("seed schools");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let base_url = format!("http://{}", listener.local_addr().expect("local addr"));

    let mut config = AppConfig {
        base_url: base_url.clone(),
        jwt_secret: "e2e-secret".into(),
        data_dir: dir.path().to_path_buf(),
        schools: vec![(SCHOOL_ID.into(), SCHOOL_NAME.into())],
        ..AppConfig::default()
    };
    configure(&mut config);
    let app = build_router(AppState {
        db: db.clone(),
        config,
        mailer,
    });
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server crashed");
    });

    TestServer {
        ctx: TestContext::new(base_url),
        db,
        _dir: dir,
    }
}

macro_rules! e2e_test {
    ($module:ident :: $name:ident) => {
        #[tokio::test]
        async fn $name() {
            let server = spawn_server(Arc::new(Outbox::new())).await;
            classroom_e2e::specs::$module::$name(&server.ctx)
                .await
                .unwrap();
        }
    };
}

classroom_e2e::for_each_spec!(e2e_test);

// ---------------------------------------------------------------------------
// Tests that need to reach past HTTP
// ---------------------------------------------------------------------------

fn token_from_link(email: &ResetEmail) -> String {
    email
        .link
        .split_once("token=")
        .map(|(_, token)| token.to_string())
        .expect("reset link carries a token")
}

#[tokio::test]
async fn forgot_then_reset_password_via_outbox() {
    let outbox = Outbox::new();
    let server = spawn_server(Arc::new(outbox.clone())).await;
    let ctx = &server.ctx;
    let user = ctx.register_user().await.unwrap();

    // Two requests: only the latest token stays valid.
    for _ in 0..2 {
        let resp = ctx
            .post_json(
                "/forgot-password",
                &ForgotPasswordRequest {
                    email: user.email.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }
    let sent = outbox.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].link.starts_with(&format!("{}/reset-password?token=", ctx.base_url())));
    let stale = token_from_link(&sent[0]);
    let token = token_from_link(&sent[1]);

    let resp = ctx
        .post_json(
            "/reset-password",
            &ResetPasswordRequest {
                token: stale,
                password: "brandnew1".into(),
            },
        )
        .await
        .unwrap();
    expect_error(resp, 404, service::MSG_BAD_RESET_TOKEN).await.unwrap();

    let resp = ctx
        .post_json(
            "/reset-password",
            &ResetPasswordRequest {
                token: token.clone(),
                password: "123".into(),
            },
        )
        .await
        .unwrap();
    expect_error(resp, 400, "Password must be at least 6 characters")
        .await
        .unwrap();

    let resp = ctx
        .post_json(
            "/reset-password",
            &ResetPasswordRequest {
                token: token.clone(),
                password: "brandnew1".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: PasswordResetResponse = resp.json().await.unwrap();
    assert_eq!(body.reset.email, user.email);

    assert!(ctx.login(&user.email, &user.password).await.is_err());
    ctx.login(&user.email, "brandnew1").await.unwrap();

    // Tokens are single-use.
    let resp = ctx
        .post_json(
            "/reset-password",
            &ResetPasswordRequest {
                token,
                password: "another1".into(),
            },
        )
        .await
        .unwrap();
    expect_error(resp, 404, service::MSG_BAD_RESET_TOKEN).await.unwrap();
}

#[tokio::test]
async fn expired_reset_token_is_gone() {
    let server = spawn_server(Arc::new(Outbox::new())).await;
    let user = server.ctx.register_user().await.unwrap();

    let raw = "expired-token";
    let expires_at = service::sqlite_datetime(now_unix() - 60).unwrap();
    storage::sq_execute(
        &server.db.conn(),
        db::reset_tokens::insert("tok1", &user.email, &crypto::hash_token(raw), &expires_at),
    )
    .unwrap();

    let req = ResetPasswordRequest {
        token: raw.into(),
        password: "brandnew1".into(),
    };
    let resp = server.ctx.post_json("/reset-password", &req).await.unwrap();
    expect_error(resp, 410, service::MSG_BAD_RESET_TOKEN).await.unwrap();

    // The expired token was dropped on first use.
    let resp = server.ctx.post_json("/reset-password", &req).await.unwrap();
    expect_error(resp, 404, service::MSG_BAD_RESET_TOKEN).await.unwrap();
}

struct FailingMailer;

impl Mailer for FailingMailer {
    fn send(&self, _email: &ResetEmail) -> anyhow::Result<()> {
        anyhow::bail!("smtp relay unreachable")
    }
}

#[tokio::test]
async fn mailer_failure_is_500() {
    let server = spawn_server(Arc::new(FailingMailer)).await;
    let user = server.ctx.register_user().await.unwrap();

    let resp = server
        .ctx
        .post_json(
            "/forgot-password",
            &ForgotPasswordRequest { email: user.email },
        )
        .await
        .unwrap();
    expect_error(resp, 500, service::MSG_UNEXPECTED).await.unwrap();
}

#[tokio::test]
async fn add_to_course_store_failure_is_500() {
    let server = spawn_server(Arc::new(Outbox::new())).await;
    let ctx = &server.ctx;
    let teacher = ctx.register_teacher().await.unwrap();
    let student = ctx.register_user().await.unwrap();
    let course = ctx.create_course(&teacher).await.unwrap();

    server
        .db
        .conn()
        .execute_batch("ALTER TABLE users RENAME TO users_gone;")
        .unwrap();

    let resp = ctx
        .post_json(
            "/course-management/add-to-course",
            &serde_json::json!({
                "requestorEmail": teacher.email,
                "courseId": course.id,
                "emailsToAdd": [student.email],
            }),
        )
        .await
        .unwrap();
    expect_error(resp, 500, service::MSG_UNEXPECTED).await.unwrap();
}

#[tokio::test]
async fn login_without_secret_is_500() {
    let server = spawn_server_with(Arc::new(Outbox::new()), |config| {
        config.jwt_secret = String::new();
    })
    .await;
    let ctx = &server.ctx;
    let user = ctx.register_user().await.unwrap();

    let resp = ctx
        .post_json(
            "/login",
            &LoginRequest {
                email: user.email.clone(),
                password: user.password.clone(),
            },
        )
        .await
        .unwrap();
    expect_error(resp, 500, service::MSG_AUTH_DISABLED).await.unwrap();

    let token = crypto::sign_jwt(&user.user_id, "e2e-secret", now_unix());
    let resp = ctx.get_authed("/me", &token).await.unwrap();
    expect_error(resp, 401, service::MSG_AUTH_DISABLED).await.unwrap();
}

#[tokio::test]
async fn create_course_store_failure_is_500() {
    let server = spawn_server(Arc::new(Outbox::new())).await;
    let ctx = &server.ctx;
    let teacher = ctx.register_teacher().await.unwrap();

    server
        .db
        .conn()
        .execute_batch("ALTER TABLE courses RENAME TO courses_gone;")
        .unwrap();

    let resp = ctx
        .post_json(
            "/course-management/create-course",
            &serde_json::json!({
                "user_id": teacher.user_id,
                "user_role": "TEACHER",
                "school_id": SCHOOL_ID,
                "code": "CS101",
                "name": "Intro",
            }),
        )
        .await
        .unwrap();
    expect_error(resp, 500, service::MSG_UNEXPECTED).await.unwrap();
}

#[tokio::test]
async fn delete_user_store_failure_is_500() {
    let server = spawn_server(Arc::new(Outbox::new())).await;
    let ctx = &server.ctx;
    let user = ctx.register_user().await.unwrap();

    server
        .db
        .conn()
        .execute_batch("ALTER TABLE users RENAME TO users_gone;")
        .unwrap();

    let resp = ctx
        .delete_json(
            "/user-management/delete-row",
            &DeleteUserRequest { email: user.email },
        )
        .await
        .unwrap();
    expect_error(resp, 500, service::MSG_UNEXPECTED).await.unwrap();
}
