use std::sync::Arc;

use async_trait::async_trait;

use crate::lifecycle::domain::{ApplicationSubmission, Role, ScholarshipId};
use crate::lifecycle::engine::{LifecycleEngine, PaymentSettings};
use crate::lifecycle::gateway::{
    CheckoutRequest, CheckoutSession, GatewayError, PaymentGateway, SessionDetails,
};
use crate::lifecycle::identity::Identity;

pub(super) use crate::lifecycle::memory::{
    InMemoryApplicationStore as MemoryStore, InMemoryCheckoutGateway as MemoryGateway,
    InMemoryUserDirectory as MemoryDirectory,
};

/// Gateway double whose every call fails as unreachable.
pub(super) struct UnreachableGateway;

#[async_trait]
impl PaymentGateway for UnreachableGateway {
    async fn create_session(
        &self,
        _request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        Err(GatewayError::Unreachable("connection refused".to_string()))
    }

    async fn retrieve_session(&self, _session_id: &str) -> Result<SessionDetails, GatewayError> {
        Err(GatewayError::Unreachable("connection refused".to_string()))
    }
}

pub(super) type TestEngine = LifecycleEngine<MemoryStore, MemoryDirectory, MemoryGateway>;

pub(super) fn payment_settings() -> PaymentSettings {
    PaymentSettings {
        currency: "usd".to_string(),
        success_url: "https://portal.test/payment-success".to_string(),
        cancel_url: "https://portal.test/payment-cancelled".to_string(),
    }
}

/// Engine over fresh in-memory collaborators with the usual cast seeded:
/// `admin@x.com`, `mod@x.com`, and `a@x.com`/`b@x.com` students.
pub(super) fn build_engine() -> (
    Arc<TestEngine>,
    Arc<MemoryStore>,
    Arc<MemoryDirectory>,
    Arc<MemoryGateway>,
) {
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(MemoryDirectory::default());
    let gateway = Arc::new(MemoryGateway::default());

    directory.seed_role("admin@x.com", Role::Admin);
    directory.seed_role("mod@x.com", Role::Moderator);
    directory.seed_role("a@x.com", Role::Student);
    directory.seed_role("b@x.com", Role::Student);

    let engine = Arc::new(LifecycleEngine::new(
        store.clone(),
        directory.clone(),
        gateway.clone(),
        payment_settings(),
    ));
    (engine, store, directory, gateway)
}

pub(super) fn identity(email: &str) -> Identity {
    Identity::new(email)
}

pub(super) fn submission(email: &str, scholarship: &str) -> ApplicationSubmission {
    ApplicationSubmission {
        student_email: email.to_string(),
        scholarship_id: ScholarshipId(scholarship.to_string()),
        details: Default::default(),
    }
}
