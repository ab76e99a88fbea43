use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::domain::Role;

/// Header carrying the verified subject email, set by the external identity
/// collaborator after token verification.
pub const SUBJECT_HEADER: &str = "x-auth-subject";
/// Header carrying the role claim embedded in the client token. Informational
/// only; authorization always re-resolves the role from the directory.
pub const CLAIMED_ROLE_HEADER: &str = "x-auth-role";

/// Verified identity of the caller as handed over by the identity context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub claimed_role: Option<Role>,
}

impl Identity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            claimed_role: None,
        }
    }

    pub fn is_self(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let subject = parts
            .headers
            .get(SUBJECT_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let Some(email) = subject else {
            let body = Json(json!({ "error": "unauthorized: no verified identity" }));
            return Err((StatusCode::UNAUTHORIZED, body).into_response());
        };

        let claimed_role = parts
            .headers
            .get(CLAIMED_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(Role::parse);

        Ok(Identity {
            email: email.to_string(),
            claimed_role,
        })
    }
}
