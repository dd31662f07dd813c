//! Authenticated principal, as handed over by the upstream auth layer.
//!
//! Authentication itself lives outside this service. The gateway in front
//! of it terminates credentials and forwards the authenticated identity in
//! trusted headers; here that identity is only extracted, never verified.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::utils::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    fn parse(value: &str) -> Option<Role> {
        match value {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or_else(|| {
                AppError::AuthError("Missing or invalid authenticated principal".to_string())
            })?;

        // Absent role header means an ordinary user; an unrecognized value
        // is rejected rather than silently downgraded.
        let role = match parts.headers.get(USER_ROLE_HEADER) {
            None => Role::User,
            Some(v) => v
                .to_str()
                .ok()
                .and_then(Role::parse)
                .ok_or_else(|| AppError::AuthError("Unrecognized principal role".to_string()))?,
        };

        Ok(Principal { id, role })
    }
}
