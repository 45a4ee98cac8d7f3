use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::constants::SESSION_LIFETIME_HOURS;
use crate::database::schema::User;
use crate::error::ApiError;
use crate::schema::{UserRole, Uuid};

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Uuid, username: String, role: UserRole) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }
}

/// Identity of the caller, handed explicitly to every action that needs it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ApiError> {
        if !action.authenticate(self) {
            return Err(ApiError::Forbidden);
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            username: value.username,
            user_id: value.user_id,
            role: value.role,
        }
    }
}

fn signing_key(secret: &str) -> Result<Hmac<Sha256>, ApiError> {
    Hmac::new_from_slice(secret.as_bytes()).map_err(|e| ApiError::Internal(format!("{e}")))
}

pub fn generate_jwt_session(user: &User, secret: &str) -> Result<String, ApiError> {
    let key = signing_key(secret)?;
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.role.to_owned());

    claims
        .sign_with_key(&key)
        .map_err(|e| ApiError::Internal(format!("Failed to sign session: {e}")))
}

pub fn verify_jwt_session(token: &str, secret: &str) -> Result<JwtSessionData, ApiError> {
    let key = signing_key(secret)?;

    let session: JwtSessionData = token.verify_with_key(&key).map_err(|e| {
        log::debug!("> Invalid session token: {e}");
        ApiError::Unauthorized
    })?;

    let now = Local::now().timestamp();
    if (session.exp - now).is_negative() {
        log::debug!("> Session of {} expired", session.username);
        return Err(ApiError::Unauthorized);
    }

    Ok(session)
}
