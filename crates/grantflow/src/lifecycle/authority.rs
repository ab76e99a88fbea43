use std::sync::Arc;

use super::domain::Role;
use super::store::{StoreError, UserDirectory};

/// Resolves a subject's authoritative role from the user directory.
///
/// Resolution happens fresh on every call and is never cached across
/// requests, so an admin promotion or demotion takes effect on the very next
/// request without re-authentication. Client-supplied role claims are never
/// consulted here.
pub struct RoleAuthority<D> {
    directory: Arc<D>,
}

/// Error raised by capability checks.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("subject '{subject}' lacks the {required} role")]
    Forbidden {
        subject: String,
        required: &'static str,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl<D> RoleAuthority<D>
where
    D: UserDirectory,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Look up the subject's current role. A subject without a directory
    /// record is treated as a student (least privilege) to tolerate directory
    /// lag right after identity verification.
    pub async fn resolve(&self, subject: &str) -> Result<Role, StoreError> {
        let record = self.directory.find(subject).await?;
        Ok(record.map(|user| user.role).unwrap_or(Role::Student))
    }

    pub async fn require_admin(&self, subject: &str) -> Result<(), AccessError> {
        match self.resolve(subject).await? {
            Role::Admin => Ok(()),
            _ => Err(AccessError::Forbidden {
                subject: subject.to_string(),
                required: "admin",
            }),
        }
    }

    pub async fn require_moderator(&self, subject: &str) -> Result<(), AccessError> {
        match self.resolve(subject).await? {
            Role::Moderator => Ok(()),
            _ => Err(AccessError::Forbidden {
                subject: subject.to_string(),
                required: "moderator",
            }),
        }
    }

    /// Moderators and admins may review applications.
    pub async fn require_review(&self, subject: &str) -> Result<Role, AccessError> {
        match self.resolve(subject).await? {
            role @ (Role::Moderator | Role::Admin) => Ok(role),
            Role::Student => Err(AccessError::Forbidden {
                subject: subject.to_string(),
                required: "moderator or admin",
            }),
        }
    }

    /// Owner-or-reviewer check used by per-student listings.
    pub async fn authorize_student_scope(
        &self,
        subject: &str,
        owner_email: &str,
    ) -> Result<(), AccessError> {
        if subject.eq_ignore_ascii_case(owner_email) {
            return Ok(());
        }
        self.require_review(subject).await.map(|_| ())
    }
}
