use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use session_auth::UserKey;

use crate::inbound::http::handlers::ApiResponseBody;
use crate::inbound::http::router::AppState;

/// Message returned for every rejected bearer token.
const INVALID_SESSION: &str = "Could not validate credentials";

/// Extension type to store the authenticated user key in request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_key: UserKey,
}

/// Middleware that resolves the bearer session token to a live account
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req)?;

    let user_key = state.gate.resolve_account(token).await.map_err(|e| {
        tracing::warn!(error = %e, "Session rejected");
        unauthorized()
    })?;

    req.extensions_mut().insert(AuthenticatedUser { user_key });

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, Response> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| {
            tracing::warn!("Missing Authorization header");
            unauthorized()
        })?;

    let auth_str = auth_header.to_str().map_err(|_| {
        tracing::warn!("Authorization header is not visible ASCII");
        unauthorized()
    })?;

    bearer_token(auth_str).ok_or_else(|| {
        tracing::warn!("Authorization header is not a bearer token");
        unauthorized()
    })
}

/// Token from a `<scheme> <token>` header value; the scheme matches `bearer` in any case.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn unauthorized() -> Response {
    let status = StatusCode::UNAUTHORIZED;
    (
        status,
        [(http::header::WWW_AUTHENTICATE, "Bearer")],
        Json(ApiResponseBody::new_error(
            status,
            INVALID_SESSION.to_string(),
        )),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("BEARER abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_rejects_other_forms() {
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearerabc"), None);
    }
}
