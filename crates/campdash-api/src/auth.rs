//! HTTP Basic auth with argon2 password hashes and two roles.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use campdash_sync::Dashboard;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  /// May administer tenants and trigger cleanup.
  Super,
  #[default]
  User,
}

/// One account, as listed under `[[users]]` in the server config.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  #[serde(default)]
  pub role:          Role,
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
  pub users: Vec<UserConfig>,
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
  pub username: String,
  pub role:     Role,
}

/// An authenticated caller with the [`Role::Super`] role.
#[derive(Debug, Clone)]
pub struct SuperUser(pub CurrentUser);

/// Check the `Authorization` header against the configured accounts.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<CurrentUser, ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  let user = config
    .users
    .iter()
    .find(|u| u.username == username)
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&user.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(CurrentUser {
    username: user.username.clone(),
    role:     user.role,
  })
}

impl<D> FromRequestParts<AppState<D>> for CurrentUser
where
  D: Dashboard + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<D>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, &state.auth)
  }
}

impl<D> FromRequestParts<AppState<D>> for SuperUser
where
  D: Dashboard + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<D>,
  ) -> Result<Self, Self::Rejection> {
    let user = verify_auth(&parts.headers, &state.auth)?;
    if user.role != Role::Super {
      return Err(ApiError::Forbidden);
    }
    Ok(SuperUser(user))
  }
}
