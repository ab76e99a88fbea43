use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::authority::{AccessError, RoleAuthority};
use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission, LoginProfile,
    Role, ScholarshipId, UserRecord,
};
use super::gateway::{
    AmountError, CheckoutRequest, CheckoutSession, GatewayError, MinorUnits, PaymentGateway,
    SessionStatus,
};
use super::identity::Identity;
use super::store::{ApplicationStore, DeleteGuard, StoreError, UserDirectory};

/// Checkout-session parameters shared by every engine instance.
#[derive(Debug, Clone)]
pub struct PaymentSettings {
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Client request to open a checkout session for an existing application.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutInput {
    pub title: String,
    /// Decimal amount as a string, e.g. `"49.50"`.
    pub price: String,
    pub student_email: String,
    pub scholarship_id: ScholarshipId,
}

/// Outcome of a successful payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub application_id: ApplicationId,
    pub transaction_id: String,
}

/// Error raised by lifecycle operations, one variant per outcome the HTTP
/// layer distinguishes.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("payment verification failed: {0}")]
    PaymentVerificationFailed(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<AccessError> for EngineError {
    fn from(value: AccessError) -> Self {
        match value {
            AccessError::Forbidden { .. } => EngineError::Forbidden(value.to_string()),
            AccessError::Store(err) => err.into(),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict => EngineError::Conflict("record already exists".to_string()),
            StoreError::NotFound => EngineError::NotFound("record"),
            StoreError::Denied => {
                EngineError::Forbidden("subject may not modify this record".to_string())
            }
            StoreError::Unavailable(detail) => EngineError::StoreUnavailable(detail),
        }
    }
}

impl From<AmountError> for EngineError {
    fn from(value: AmountError) -> Self {
        EngineError::Validation(value.to_string())
    }
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// State machine applying lifecycle events to the application store under
/// role-authority checks, calling out to the payment gateway at the
/// confirmation transition.
pub struct LifecycleEngine<S, D, G> {
    store: Arc<S>,
    authority: RoleAuthority<D>,
    directory: Arc<D>,
    gateway: Arc<G>,
    payments: PaymentSettings,
}

impl<S, D, G> LifecycleEngine<S, D, G>
where
    S: ApplicationStore + 'static,
    D: UserDirectory + 'static,
    G: PaymentGateway + 'static,
{
    pub fn new(
        store: Arc<S>,
        directory: Arc<D>,
        gateway: Arc<G>,
        payments: PaymentSettings,
    ) -> Self {
        Self {
            store,
            authority: RoleAuthority::new(directory.clone()),
            directory,
            gateway,
            payments,
        }
    }

    /// Create a new application for the authenticated subject. The subject
    /// must be applying on their own behalf; uniqueness per
    /// `(student_email, scholarship_id)` is enforced by the store's insert.
    pub async fn create(
        &self,
        subject: &Identity,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationRecord, EngineError> {
        if submission.student_email.trim().is_empty() {
            return Err(EngineError::Validation("student_email is required".into()));
        }
        if submission.scholarship_id.0.trim().is_empty() {
            return Err(EngineError::Validation("scholarship_id is required".into()));
        }
        if !subject.is_self(&submission.student_email) {
            return Err(EngineError::Forbidden(
                "applications can only be created for the authenticated student".into(),
            ));
        }

        let record = ApplicationRecord::create(next_application_id(), submission);
        let stored = match self.store.insert_unique(record).await {
            Ok(stored) => stored,
            Err(StoreError::Conflict) => {
                return Err(EngineError::Conflict(
                    "an application for this scholarship already exists".into(),
                ))
            }
            Err(other) => return Err(other.into()),
        };

        info!(
            application = %stored.id.0,
            scholarship = %stored.scholarship_id.0,
            "application created"
        );
        Ok(stored)
    }

    /// List one student's applications: the owner or any reviewer may read.
    pub async fn list_for_student(
        &self,
        subject: &Identity,
        student_email: &str,
    ) -> Result<Vec<ApplicationRecord>, EngineError> {
        self.authority
            .authorize_student_scope(&subject.email, student_email)
            .await?;
        Ok(self.store.list_for_student(student_email).await?)
    }

    pub async fn list_all(&self, subject: &Identity) -> Result<Vec<ApplicationRecord>, EngineError> {
        self.authority.require_review(&subject.email).await?;
        Ok(self.store.list_all().await?)
    }

    /// Moderator/admin review outcome. Authorization is re-derived from the
    /// directory on every call.
    pub async fn set_status(
        &self,
        subject: &Identity,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, EngineError> {
        let role = self.authority.require_review(&subject.email).await?;
        let updated = match self.store.set_status(id, status).await {
            Ok(updated) => updated,
            Err(StoreError::NotFound) => return Err(EngineError::NotFound("application")),
            Err(other) => return Err(other.into()),
        };
        info!(
            application = %updated.id.0,
            status = status.label(),
            reviewer = role.label(),
            "application status updated"
        );
        Ok(updated)
    }

    /// Moderator-only free-text feedback.
    pub async fn set_feedback(
        &self,
        subject: &Identity,
        id: &ApplicationId,
        feedback: String,
    ) -> Result<ApplicationRecord, EngineError> {
        self.authority.require_moderator(&subject.email).await?;
        match self.store.set_feedback(id, feedback).await {
            Ok(updated) => Ok(updated),
            Err(StoreError::NotFound) => Err(EngineError::NotFound("application")),
            Err(other) => Err(other.into()),
        }
    }

    /// Delete an application: admins unconditionally, the owning student only
    /// while the record is unpaid. The guard is evaluated atomically with the
    /// removal by the store.
    pub async fn delete(
        &self,
        subject: &Identity,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, EngineError> {
        let guard = match self.authority.resolve(&subject.email).await? {
            Role::Admin => DeleteGuard::Admin,
            _ => DeleteGuard::Owner {
                email: subject.email.clone(),
            },
        };

        match self.store.remove(id, guard).await {
            Ok(removed) => {
                info!(application = %removed.id.0, "application removed");
                Ok(removed)
            }
            Err(StoreError::NotFound) => Err(EngineError::NotFound("application")),
            Err(StoreError::Denied) => Err(EngineError::Forbidden(
                "only the owning student (while unpaid) or an admin may delete".into(),
            )),
            Err(other) => Err(other.into()),
        }
    }

    /// Open a hosted checkout session for an existing application. No store
    /// mutation happens here; the application stays unpaid until the gateway
    /// confirms settlement.
    pub async fn initiate_checkout(
        &self,
        subject: &Identity,
        input: CheckoutInput,
    ) -> Result<CheckoutSession, EngineError> {
        if !subject.is_self(&input.student_email) {
            return Err(EngineError::Forbidden(
                "checkout can only be initiated by the applicant".into(),
            ));
        }

        let existing = self
            .store
            .find_for_scholarship(&input.student_email, &input.scholarship_id)
            .await?;
        let Some(application) = existing else {
            return Err(EngineError::NotFound("application"));
        };
        if application.settled() {
            return Err(EngineError::Conflict(
                "application is already paid".into(),
            ));
        }

        let amount = MinorUnits::parse_decimal(&input.price)?;
        let session = self
            .gateway
            .create_session(CheckoutRequest {
                title: input.title,
                amount,
                currency: self.payments.currency.clone(),
                scholarship_id: input.scholarship_id,
                student_email: input.student_email,
                success_url: self.payments.success_url.clone(),
                cancel_url: self.payments.cancel_url.clone(),
            })
            .await
            .map_err(|err| EngineError::PaymentVerificationFailed(err.to_string()))?;

        info!(session = %session.id, amount = %amount, "checkout session created");
        Ok(session)
    }

    /// Confirm settlement for a checkout session. The gateway is consulted
    /// first; the store then applies the unpaid→paid compare-and-swap, so a
    /// second confirmation of the same session surfaces as a conflict and a
    /// confirmation racing an admin delete surfaces as not-found.
    pub async fn confirm_payment(
        &self,
        session_id: &str,
    ) -> Result<PaymentReceipt, EngineError> {
        let details = match self.gateway.retrieve_session(session_id).await {
            Ok(details) => details,
            Err(err @ GatewayError::Unreachable(_)) => {
                return Err(EngineError::PaymentVerificationFailed(err.to_string()))
            }
            Err(GatewayError::UnknownSession) => {
                return Err(EngineError::PaymentVerificationFailed(
                    "checkout session not known to the gateway".into(),
                ))
            }
        };

        if details.status != SessionStatus::Complete {
            return Err(EngineError::Validation(
                "checkout session has not completed".into(),
            ));
        }
        let Some(reference) = details.payment_reference else {
            return Err(EngineError::PaymentVerificationFailed(
                "completed session carries no payment reference".into(),
            ));
        };

        let updated = match self
            .store
            .confirm_payment(&details.student_email, &details.scholarship_id, &reference)
            .await
        {
            Ok(updated) => updated,
            Err(StoreError::Conflict) => {
                warn!(session = session_id, "duplicate payment confirmation ignored");
                return Err(EngineError::Conflict(
                    "payment has already been confirmed".into(),
                ));
            }
            Err(StoreError::NotFound) => return Err(EngineError::NotFound("application")),
            Err(other) => return Err(other.into()),
        };

        info!(
            application = %updated.id.0,
            transaction = %reference,
            "payment confirmed"
        );
        Ok(PaymentReceipt {
            application_id: updated.id,
            transaction_id: reference,
        })
    }

    /// Login upsert: register the user at least privilege or refresh their
    /// last-login timestamp. Idempotent on email.
    pub async fn login(&self, profile: LoginProfile) -> Result<UserRecord, EngineError> {
        if profile.email.trim().is_empty() {
            return Err(EngineError::Validation("email is required".into()));
        }
        Ok(self.directory.upsert_login(profile).await?)
    }

    pub async fn list_users(&self, subject: &Identity) -> Result<Vec<UserRecord>, EngineError> {
        self.authority.require_admin(&subject.email).await?;
        Ok(self.directory.list().await?)
    }

    /// Admin-only role mutation. A non-admin subject is rejected before any
    /// write regardless of the role claimed by their identity token, which
    /// also rules out self-promotion.
    pub async fn set_role(
        &self,
        subject: &Identity,
        email: &str,
        role: Role,
    ) -> Result<UserRecord, EngineError> {
        self.authority.require_admin(&subject.email).await?;
        let updated = match self.directory.set_role(email, role).await {
            Ok(updated) => updated,
            Err(StoreError::NotFound) => return Err(EngineError::NotFound("user")),
            Err(other) => return Err(other.into()),
        };
        info!(user = email, role = role.label(), "role updated");
        Ok(updated)
    }

    pub async fn delete_user(
        &self,
        subject: &Identity,
        email: &str,
    ) -> Result<UserRecord, EngineError> {
        self.authority.require_admin(&subject.email).await?;
        match self.directory.remove(email).await {
            Ok(removed) => Ok(removed),
            Err(StoreError::NotFound) => Err(EngineError::NotFound("user")),
            Err(other) => Err(other.into()),
        }
    }
}
