//! Authentication middleware.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::state::AppState;
use crate::error::ErrorCode;

/// Extract bearer token from Authorization header.
fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    let auth_header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;

    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}

fn rejection(status: StatusCode, code: ErrorCode, message: &str) -> Response {
    let body = Json(json!({
        "code": code.as_i32(),
        "message": message,
        "data": null
    }));

    (status, body).into_response()
}

/// Middleware that requires the configured admin token.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(&req) else {
        return rejection(
            StatusCode::UNAUTHORIZED,
            ErrorCode::UNAUTHORIZED,
            "Missing or invalid Authorization header",
        );
    };

    if token != state.config.auth.admin_token {
        tracing::warn!(path = %req.uri().path(), "Rejected admin request");
        return rejection(
            StatusCode::FORBIDDEN,
            ErrorCode::FORBIDDEN,
            "Admin token required",
        );
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/v1/settings");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token(&request_with(Some("Bearer abc"))),
            Some("abc")
        );
        assert_eq!(
            extract_bearer_token(&request_with(Some("bearer abc"))),
            Some("abc")
        );
        assert_eq!(extract_bearer_token(&request_with(Some("Basic abc"))), None);
        assert_eq!(extract_bearer_token(&request_with(None)), None);
    }
}
