use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;

use classroom_api::service::MSG_BAD_BODY;

use crate::error::ApiErr;

/// `Json<T>` whose rejections use the `{"error": ...}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiErr))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("rejected request body: {}", rejection.body_text());
        Self::bad_request(MSG_BAD_BODY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode, header};
    use classroom_api::DeleteUserRequest;

    async fn extract(body: &'static str, content_type: &str) -> Result<DeleteUserRequest, ApiErr> {
        let req = Request::builder()
            .method("DELETE")
            .header(header::CONTENT_TYPE, content_type)
            .body(axum::body::Body::from(body))
            .unwrap();
        ApiJson::<DeleteUserRequest>::from_request(req, &())
            .await
            .map(|ApiJson(v)| v)
    }

    #[tokio::test]
    async fn well_formed_body_passes_through() {
        let req = extract(r#"{"email":"a@test.com"}"#, "application/json")
            .await
            .unwrap();
        assert_eq!(req.email, "a@test.com");
    }

    #[tokio::test]
    async fn bad_bodies_become_json_bad_requests() {
        for (body, content_type) in [
            ("{}", "application/json"),
            (r#"{"email": 7}"#, "application/json"),
            ("{not json", "application/json"),
            (r#"{"email":"a@test.com"}"#, "text/plain"),
        ] {
            let err = extract(body, content_type).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "body {body:?}");
            assert_eq!(err.message(), MSG_BAD_BODY);
        }
    }
}
