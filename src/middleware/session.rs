use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{self, Session};
use crate::error::ApiError;

/// Request-scoped identity, injected by [`session_middleware`]. Absent means
/// the request is anonymous.
#[derive(Clone, Debug)]
pub struct CurrentSession(pub Option<Session>);

/// Resolve the request's identity from its transport credentials: a Bearer
/// token verified against the identity collaborator's signing secret, or an
/// API key checked by digest. Requests without credentials pass through as
/// anonymous; requests with *invalid* credentials are rejected outright.
pub async fn session_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = resolve_session(&headers)?;
    if let Some(session) = &session {
        tracing::debug!(subject = %session.subject, auth = ?session.auth, "session resolved");
    }
    request.extensions_mut().insert(CurrentSession(session));
    Ok(next.run(request).await)
}

fn resolve_session(headers: &HeaderMap) -> Result<Option<Session>, ApiError> {
    if let Some(token) = extract_bearer(headers)? {
        let claims = auth::verify_jwt(&token).map_err(|e| ApiError::unauthorized(e.to_string()))?;
        return Ok(Some(Session::from_claims(claims)));
    }

    if let Some(key) = headers.get("x-api-key") {
        let key = key
            .to_str()
            .map_err(|_| ApiError::unauthorized("Invalid API key header"))?;
        auth::verify_api_key(key).map_err(|e| ApiError::unauthorized(e.to_string()))?;
        return Ok(Some(Session::api_key()));
    }

    Ok(None)
}

/// Extract a Bearer token from the Authorization header, if one is present
fn extract_bearer(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(auth_header) = headers.get("authorization") else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(ApiError::unauthorized(
            "Authorization header must use Bearer token format",
        ));
    };
    if token.trim().is_empty() {
        return Err(ApiError::unauthorized("Empty bearer token"));
    }
    Ok(Some(token.to_string()))
}
