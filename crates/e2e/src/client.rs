use anyhow::{Result, anyhow, ensure};
use serde::Serialize;

use classroom_api::{
    ApiError, CourseResponse, CreateCourseRequest, CreateCourseResponse, LoginRequest,
    LoginResponse, RegisterRequest, RegisterResponse, Role, UpdateRoleRequest,
};

use crate::fixtures;

/// Holds connection info for a test run.
pub struct TestContext {
    base_url: String,
    client: reqwest::Client,
}

/// A registered test user with credentials.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub user_id: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl TestContext {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full API URL from a path like `/health`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    // ── HTTP convenience methods ──────────────────────────────────────

    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    pub async fn get_authed(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?)
    }

    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        Ok(self.client.post(self.url(path)).json(body).send().await?)
    }

    pub async fn put_json<T: Serialize>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        Ok(self.client.put(self.url(path)).json(body).send().await?)
    }

    pub async fn delete_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self.client.delete(self.url(path)).json(body).send().await?)
    }

    // ── Setup helpers ─────────────────────────────────────────────────

    /// Register a fresh student at the seeded school.
    pub async fn register_user(&self) -> Result<TestUser> {
        let email = fixtures::unique_email("student");
        let resp = self
            .post_json(
                "/register",
                &RegisterRequest {
                    email: email.clone(),
                    password: fixtures::PASSWORD.into(),
                    institution: fixtures::SCHOOL_ID.into(),
                },
            )
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("register failed ({status}): {body}"));
        }
        let body: RegisterResponse = resp.json().await?;

        Ok(TestUser {
            user_id: body.user.id,
            email,
            password: fixtures::PASSWORD.into(),
            role: body.user.role,
        })
    }

    /// Register a fresh user and promote them to teacher.
    pub async fn register_teacher(&self) -> Result<TestUser> {
        let mut user = self.register_user().await?;
        let resp = self
            .put_json(
                "/user-management/update-role",
                &UpdateRoleRequest {
                    email: user.email.clone(),
                    role: Role::Teacher,
                },
            )
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("promote to teacher failed ({status}): {body}"));
        }
        user.role = Role::Teacher;
        Ok(user)
    }

    /// Create a course with a unique code at the seeded school.
    pub async fn create_course(&self, teacher: &TestUser) -> Result<CourseResponse> {
        let resp = self
            .post_json(
                "/course-management/create-course",
                &CreateCourseRequest {
                    user_id: teacher.user_id.clone(),
                    user_role: teacher.role.as_str().into(),
                    school_id: fixtures::SCHOOL_ID.into(),
                    code: fixtures::unique_course_code(),
                    name: "Foundations of Software Engineering".into(),
                },
            )
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("create course failed ({status}): {body}"));
        }
        let body: CreateCourseResponse = resp.json().await?;
        Ok(body.course_to_create)
    }

    /// Log in and return the access token response.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let resp = self
            .post_json(
                "/login",
                &LoginRequest {
                    email: email.into(),
                    password: password.into(),
                },
            )
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("login failed ({status}): {body}"));
        }
        Ok(resp.json().await?)
    }
}

/// Assert an error response's status and `{"error": ...}` message.
pub async fn expect_error(resp: reqwest::Response, status: u16, message: &str) -> Result<()> {
    let actual = resp.status();
    let body: ApiError = resp.json().await?;
    ensure!(
        actual.as_u16() == status,
        "expected {status}, got {actual}: {}",
        body.error
    );
    ensure!(
        body.error == message,
        "expected error {message:?}, got {:?}",
        body.error
    );
    Ok(())
}
