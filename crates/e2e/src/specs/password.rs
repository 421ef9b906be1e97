use anyhow::{Result, ensure};

use classroom_api::{ForgotPasswordRequest, PasswordResetResponse, ResetPasswordRequest};

use crate::client::{TestContext, expect_error};
use crate::fixtures;

/// POST /api/forgot-password → 200 with the stored (lower-cased) email.
pub async fn forgot_password(ctx: &TestContext) -> Result<()> {
    let user = ctx.register_user().await?;

    let resp = ctx
        .post_json(
            "/forgot-password",
            &ForgotPasswordRequest {
                email: user.email.to_uppercase(),
            },
        )
        .await?;
    ensure!(resp.status() == 200, "expected 200, got {}", resp.status());
    let body: PasswordResetResponse = resp.json().await?;
    ensure!(body.reset.email == user.email, "unexpected {}", body.reset.email);
    Ok(())
}

/// Unknown email → 404.
pub async fn forgot_password_unknown(ctx: &TestContext) -> Result<()> {
    let resp = ctx
        .post_json(
            "/forgot-password",
            &ForgotPasswordRequest {
                email: fixtures::unique_email("ghost"),
            },
        )
        .await?;
    expect_error(resp, 404, "User not found.").await
}

/// A token that was never issued → 404.
pub async fn reset_password_unknown_token(ctx: &TestContext) -> Result<()> {
    let resp = ctx
        .post_json(
            "/reset-password",
            &ResetPasswordRequest {
                token: "deadbeef".into(),
                password: fixtures::PASSWORD.into(),
            },
        )
        .await?;
    expect_error(resp, 404, "Invalid or expired token.").await
}
