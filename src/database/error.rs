use std::convert::Infallible;

use serde_json::json;
use thiserror::Error;
use warp::{
    http::StatusCode,
    reject::{self, Rejection},
    reply::{self, Reply},
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("Authentication credentials were not provided.")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found."))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> serde_json::Value {
        match self {
            ApiError::Validation { field, message } => {
                let mut body = serde_json::Map::new();
                body.insert(field.to_owned(), json!([message]));
                serde_json::Value::Object(body)
            }
            ApiError::Conflict(message) => json!({ "errors": message }),
            // internals stay in the log
            ApiError::Database(_) | ApiError::Internal(_) => {
                json!({ "detail": "Internal server error" })
            }
            _ => json!({ "detail": self.to_string() }),
        }
    }
}

impl reject::Reject for ApiError {}

fn json_reply(status: StatusCode, body: serde_json::Value) -> reply::Response {
    reply::with_status(reply::json(&body), status).into_response()
}

/// Turns every rejection produced by the api filters into a JSON response.
pub async fn handle_rejection(err: Rejection) -> Result<reply::Response, Infallible> {
    if let Some(e) = err.find::<ApiError>() {
        let status = e.status();
        if status.is_server_error() {
            log::error!("{e}");
        } else {
            log::debug!("> Rejected with {status}: {e}");
        }
        return Ok(json_reply(status, e.body()));
    }

    if err.is_not_found() {
        return Ok(json_reply(
            StatusCode::NOT_FOUND,
            json!({ "detail": "Not found." }),
        ));
    }

    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        return Ok(json_reply(
            StatusCode::BAD_REQUEST,
            json!({ "detail": format!("Malformed request body: {e}") }),
        ));
    }

    if err.find::<reject::PayloadTooLarge>().is_some() {
        return Ok(json_reply(
            StatusCode::PAYLOAD_TOO_LARGE,
            json!({ "detail": "Request body is too large." }),
        ));
    }

    if err.find::<reject::LengthRequired>().is_some() {
        return Ok(json_reply(
            StatusCode::LENGTH_REQUIRED,
            json!({ "detail": "Content-Length header is required." }),
        ));
    }

    if err.find::<reject::UnsupportedMediaType>().is_some() {
        return Ok(json_reply(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            json!({ "detail": "Expected an application/json body." }),
        ));
    }

    if err.find::<reject::InvalidQuery>().is_some() {
        return Ok(json_reply(
            StatusCode::BAD_REQUEST,
            json!({ "detail": "Invalid query string." }),
        ));
    }

    if let Some(e) = err.find::<reject::InvalidHeader>() {
        return Ok(json_reply(
            StatusCode::BAD_REQUEST,
            json!({ "detail": format!("Invalid header: {}", e.name()) }),
        ));
    }

    if err.find::<reject::MethodNotAllowed>().is_some() {
        return Ok(json_reply(
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "detail": "Method not allowed." }),
        ));
    }

    log::error!("Unhandled rejection: {err:?}");
    Ok(json_reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "detail": "Internal server error" }),
    ))
}
