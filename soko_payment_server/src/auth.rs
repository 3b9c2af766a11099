//! Caller identity extraction.
//!
//! Authentication is handled upstream: an API gateway verifies the caller's credentials and asserts the verified
//! identity on the proxied request via trusted headers. This module only *reads* that assertion; it never verifies
//! credentials itself, so the callback whitelist and network topology must guarantee that these headers cannot be
//! set by the outside world.
//!
//! * `X-User-Id` carries the caller's user id. Required on all authenticated routes.
//! * `X-User-Role` carries the caller's role (`Buyer`, `Seller` or `Admin`). Absent or unreadable values fall back
//!   to `Buyer`, the least-privileged role.
use std::{future::ready, str::FromStr};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use log::*;
use soko_order_engine::db_types::{ActingUser, Role};

use crate::errors::{AuthError, ServerError};

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// The verified caller, as asserted by the upstream gateway. Use this as a handler parameter to require an
/// authenticated caller on a route.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub acting: ActingUser,
}

impl AuthenticatedUser {
    pub fn id(&self) -> &str {
        &self.acting.id
    }

    pub fn is_admin(&self) -> bool {
        self.acting.is_admin()
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_caller(req))
    }
}

fn extract_caller(req: &HttpRequest) -> Result<AuthenticatedUser, ServerError> {
    let id = req
        .headers()
        .get(USER_ID_HEADER)
        .ok_or(ServerError::AuthenticationError(AuthError::MissingIdentityHeader))?
        .to_str()
        .map_err(|e| ServerError::AuthenticationError(AuthError::MalformedIdentityHeader(e.to_string())))?
        .trim();
    if id.is_empty() {
        return Err(ServerError::AuthenticationError(AuthError::MissingIdentityHeader));
    }
    let role = req
        .headers()
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Role::from_str(s.trim()).ok())
        .unwrap_or(Role::Buyer);
    trace!("💻️ Request from {id} ({role})");
    Ok(AuthenticatedUser { acting: ActingUser::new(id, role) })
}
