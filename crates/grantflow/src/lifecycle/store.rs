use async_trait::async_trait;

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, LoginProfile, Role, ScholarshipId,
    UserRecord,
};

/// Condition evaluated atomically with a delete.
///
/// `Owner` succeeds only while the record belongs to `email` and is still
/// unpaid; a settled application can only be removed by an admin, so payment
/// state never silently vanishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteGuard {
    Owner { email: String },
    Admin,
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("delete guard rejected the operation")]
    Denied,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence contract for applications.
///
/// The conditional operations (`insert_unique`, `confirm_payment`, `remove`)
/// must evaluate their condition and apply the write as one atomic step per
/// record; the engine relies on that to close check-then-act races between
/// concurrent requests. Implementations back onto stores with per-record
/// conditional writes and need no coordination across distinct
/// `(student_email, scholarship_id)` pairs.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Insert enforcing uniqueness on `(student_email, scholarship_id)`.
    async fn insert_unique(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, StoreError>;

    /// Compare-and-swap the payment state from unpaid to paid, recording the
    /// gateway's payment reference. An already-paid record yields `Conflict`,
    /// a missing one `NotFound`.
    async fn confirm_payment(
        &self,
        student_email: &str,
        scholarship_id: &ScholarshipId,
        transaction_id: &str,
    ) -> Result<ApplicationRecord, StoreError>;

    async fn set_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, StoreError>;

    async fn set_feedback(
        &self,
        id: &ApplicationId,
        feedback: String,
    ) -> Result<ApplicationRecord, StoreError>;

    /// Remove a record, evaluating `guard` atomically with the removal.
    async fn remove(
        &self,
        id: &ApplicationId,
        guard: DeleteGuard,
    ) -> Result<ApplicationRecord, StoreError>;

    async fn find(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError>;

    async fn find_for_scholarship(
        &self,
        student_email: &str,
        scholarship_id: &ScholarshipId,
    ) -> Result<Option<ApplicationRecord>, StoreError>;

    async fn list_for_student(
        &self,
        student_email: &str,
    ) -> Result<Vec<ApplicationRecord>, StoreError>;

    async fn list_all(&self) -> Result<Vec<ApplicationRecord>, StoreError>;
}

/// Directory of known users, keyed by email.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Create the user with default role, or refresh `last_login_at` when the
    /// email is already known. Idempotent on email.
    async fn upsert_login(&self, profile: LoginProfile) -> Result<UserRecord, StoreError>;

    async fn find(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn set_role(&self, email: &str, role: Role) -> Result<UserRecord, StoreError>;

    async fn remove(&self, email: &str) -> Result<UserRecord, StoreError>;

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;
}
