//! Application and payment lifecycle engine.
//!
//! Applications move `pending/unpaid` → `pending/paid` → a terminal review
//! outcome. Every transition is gated by the subject's authoritative role as
//! resolved fresh from the user directory; settlement facts come only from
//! the payment gateway.

pub mod authority;
pub mod domain;
pub mod engine;
pub mod gateway;
pub mod identity;
pub mod memory;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use authority::{AccessError, RoleAuthority};
pub use domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission, LoginProfile,
    PaymentStatus, Role, ScholarshipId, UserRecord,
};
pub use engine::{
    CheckoutInput, EngineError, LifecycleEngine, PaymentReceipt, PaymentSettings,
};
pub use gateway::{
    AmountError, CheckoutRequest, CheckoutSession, GatewayError, MinorUnits, PaymentGateway,
    SessionDetails, SessionStatus,
};
pub use identity::{Identity, CLAIMED_ROLE_HEADER, SUBJECT_HEADER};
pub use router::lifecycle_router;
pub use store::{ApplicationStore, DeleteGuard, StoreError, UserDirectory};
