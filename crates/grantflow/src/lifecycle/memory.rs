//! In-memory reference implementations of the store, directory, and gateway
//! contracts. They back the bundled service and the test suites; a deployment
//! with durable storage swaps them for adapters over a database and a real
//! checkout provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, LoginProfile, PaymentStatus, Role,
    ScholarshipId, UserRecord,
};
use super::gateway::{
    CheckoutRequest, CheckoutSession, GatewayError, PaymentGateway, SessionDetails, SessionStatus,
};
use super::store::{ApplicationStore, DeleteGuard, StoreError, UserDirectory};

/// Application store over a single mutex-guarded map. The lock makes every
/// conditional operation (unique insert, payment CAS, guarded delete) atomic
/// per record, which is the whole contract.
#[derive(Default)]
pub struct InMemoryApplicationStore {
    records: Mutex<HashMap<ApplicationId, ApplicationRecord>>,
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn insert_unique(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let duplicate = guard.values().any(|existing| {
            existing.owned_by(&record.student_email)
                && existing.scholarship_id == record.scholarship_id
        });
        if duplicate || guard.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn confirm_payment(
        &self,
        student_email: &str,
        scholarship_id: &ScholarshipId,
        transaction_id: &str,
    ) -> Result<ApplicationRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let record = guard
            .values_mut()
            .find(|record| {
                record.owned_by(student_email) && record.scholarship_id == *scholarship_id
            })
            .ok_or(StoreError::NotFound)?;
        if record.settled() {
            return Err(StoreError::Conflict);
        }
        record.payment = PaymentStatus::Paid;
        record.transaction_id = Some(transaction_id.to_string());
        Ok(record.clone())
    }

    async fn set_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        record.status = status;
        Ok(record.clone())
    }

    async fn set_feedback(
        &self,
        id: &ApplicationId,
        feedback: String,
    ) -> Result<ApplicationRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        record.moderator_feedback = Some(feedback);
        Ok(record.clone())
    }

    async fn remove(
        &self,
        id: &ApplicationId,
        delete_guard: DeleteGuard,
    ) -> Result<ApplicationRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let record = guard.get(id).ok_or(StoreError::NotFound)?;
        let allowed = match &delete_guard {
            DeleteGuard::Admin => true,
            DeleteGuard::Owner { email } => record.owned_by(email) && !record.settled(),
        };
        if !allowed {
            return Err(StoreError::Denied);
        }
        Ok(guard.remove(id).expect("record present under lock"))
    }

    async fn find(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    async fn find_for_scholarship(
        &self,
        student_email: &str,
        scholarship_id: &ScholarshipId,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .find(|record| {
                record.owned_by(student_email) && record.scholarship_id == *scholarship_id
            })
            .cloned())
    }

    async fn list_for_student(
        &self,
        student_email: &str,
    ) -> Result<Vec<ApplicationRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.owned_by(student_email))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<ApplicationRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

/// User directory over a mutex-guarded map keyed by lowercased email.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl InMemoryUserDirectory {
    /// Seed a user with an explicit role, bypassing the login default.
    /// Intended for bootstrap and tests.
    pub fn seed_role(&self, email: &str, role: Role) {
        let mut user = UserRecord::register(LoginProfile {
            email: email.to_string(),
            photo: None,
        });
        user.role = role;
        self.users
            .lock()
            .expect("directory mutex poisoned")
            .insert(email.to_ascii_lowercase(), user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn upsert_login(&self, profile: LoginProfile) -> Result<UserRecord, StoreError> {
        let mut guard = self.users.lock().expect("directory mutex poisoned");
        let key = profile.email.to_ascii_lowercase();
        if let Some(existing) = guard.get_mut(&key) {
            existing.last_login_at = chrono::Utc::now();
            if profile.photo.is_some() {
                existing.photo = profile.photo;
            }
            return Ok(existing.clone());
        }
        let user = UserRecord::register(profile);
        guard.insert(key, user.clone());
        Ok(user)
    }

    async fn find(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let guard = self.users.lock().expect("directory mutex poisoned");
        Ok(guard.get(&email.to_ascii_lowercase()).cloned())
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<UserRecord, StoreError> {
        let mut guard = self.users.lock().expect("directory mutex poisoned");
        let user = guard
            .get_mut(&email.to_ascii_lowercase())
            .ok_or(StoreError::NotFound)?;
        user.role = role;
        Ok(user.clone())
    }

    async fn remove(&self, email: &str) -> Result<UserRecord, StoreError> {
        let mut guard = self.users.lock().expect("directory mutex poisoned");
        guard
            .remove(&email.to_ascii_lowercase())
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let guard = self.users.lock().expect("directory mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

/// Checkout gateway double holding sessions in memory. Sessions open as
/// `Open`; [`InMemoryCheckoutGateway::settle`] simulates the hosted page
/// completing out of band.
#[derive(Default)]
pub struct InMemoryCheckoutGateway {
    sessions: Mutex<HashMap<String, SessionDetails>>,
    sequence: AtomicU64,
}

impl InMemoryCheckoutGateway {
    pub fn settle(&self, session_id: &str, payment_reference: &str) {
        let mut guard = self.sessions.lock().expect("gateway mutex poisoned");
        let session = guard.get_mut(session_id).expect("session exists");
        session.status = SessionStatus::Complete;
        session.payment_reference = Some(payment_reference.to_string());
    }
}

#[async_trait]
impl PaymentGateway for InMemoryCheckoutGateway {
    async fn create_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let id = format!("cs_test_{}", self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        let mut guard = self.sessions.lock().expect("gateway mutex poisoned");
        guard.insert(
            id.clone(),
            SessionDetails {
                status: SessionStatus::Open,
                payment_reference: None,
                scholarship_id: request.scholarship_id,
                student_email: request.student_email,
            },
        );
        Ok(CheckoutSession {
            url: format!("https://checkout.test/pay/{id}"),
            id,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails, GatewayError> {
        let guard = self.sessions.lock().expect("gateway mutex poisoned");
        guard
            .get(session_id)
            .cloned()
            .ok_or(GatewayError::UnknownSession)
    }
}
