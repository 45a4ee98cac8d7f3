use std::{convert::Infallible, sync::Arc};

use warp::{
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    reject::Rejection,
    Filter,
};

use crate::error::ApiError;

use super::jwt::{verify_jwt_session, SessionData};

/// Extracts the token from `Token <jwt>` or `Bearer <jwt>`.
pub fn token_from_header(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();

    if token.is_empty() {
        return None;
    }

    match scheme {
        s if s.eq_ignore_ascii_case("token") || s.eq_ignore_ascii_case("bearer") => Some(token),
        _ => None,
    }
}

fn session_from_header(header: &HeaderValue, secret: &str) -> Result<SessionData, ApiError> {
    let header = header.to_str().map_err(|_| ApiError::Unauthorized)?;
    let token = token_from_header(header).ok_or(ApiError::Unauthorized)?;
    verify_jwt_session(token, secret).map(Into::into)
}

/// Raw `Authorization` value; non-UTF-8 bytes are left for the session check to refuse.
fn authorization() -> impl Filter<Extract = (Option<HeaderValue>,), Error = Infallible> + Clone {
    warp::header::headers_cloned().map(|headers: HeaderMap| headers.get(AUTHORIZATION).cloned())
}

/// Requires a valid session.
pub fn with_session(
    secret: Arc<String>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    authorization().and_then(move |header: Option<HeaderValue>| {
        let secret = secret.clone();
        async move {
            match header {
                Some(header) => session_from_header(&header, &secret).map_err(Rejection::from),
                None => Err(Rejection::from(ApiError::Unauthorized)),
            }
        }
    })
}

/// Anonymous requests pass through as `None`; a bad token is still rejected.
pub fn with_possible_session(
    secret: Arc<String>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    authorization().and_then(move |header: Option<HeaderValue>| {
        let secret = secret.clone();
        async move {
            match header {
                Some(header) => session_from_header(&header, &secret)
                    .map(Some)
                    .map_err(Rejection::from),
                None => Ok(None),
            }
        }
    })
}
