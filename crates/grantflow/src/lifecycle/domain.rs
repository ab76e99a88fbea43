use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for stored applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Reference to an externally owned scholarship record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScholarshipId(pub String);

/// Authoritative role stored in the user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Moderator,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "moderator" => Some(Role::Moderator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Review disposition of an application. `Rejected` is an explicit terminal
/// moderator outcome, never folded into `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Completed,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Completed => "completed",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// Settlement state. Monotonic: once `Paid`, never back to `Unpaid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

/// Applicant-provided payload accepted at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub student_email: String,
    pub scholarship_id: ScholarshipId,
    /// Free-form applicant fields captured at intake; immutable afterwards.
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

/// Persistent application record. One per `(student_email, scholarship_id)`
/// pair; `transaction_id` is present exactly when `payment` is `Paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub student_email: String,
    pub scholarship_id: ScholarshipId,
    pub status: ApplicationStatus,
    pub payment: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderator_feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub details: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl ApplicationRecord {
    pub fn create(id: ApplicationId, submission: ApplicationSubmission) -> Self {
        Self {
            id,
            student_email: submission.student_email,
            scholarship_id: submission.scholarship_id,
            status: ApplicationStatus::Pending,
            payment: PaymentStatus::Unpaid,
            moderator_feedback: None,
            transaction_id: None,
            details: submission.details,
            created_at: Utc::now(),
        }
    }

    pub fn owned_by(&self, email: &str) -> bool {
        self.student_email.eq_ignore_ascii_case(email)
    }

    pub fn settled(&self) -> bool {
        self.payment == PaymentStatus::Paid
    }
}

/// Identity payload handed over by the login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginProfile {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// Directory record, one per email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl UserRecord {
    /// A freshly registered user always starts at least privilege.
    pub fn register(profile: LoginProfile) -> Self {
        let now = Utc::now();
        Self {
            email: profile.email,
            role: Role::Student,
            photo: profile.photo,
            created_at: now,
            last_login_at: now,
        }
    }
}
