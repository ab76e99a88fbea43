use std::sync::Arc;

use clap::Args;
use grantflow::error::AppError;
use grantflow::lifecycle::memory::{
    InMemoryApplicationStore, InMemoryCheckoutGateway, InMemoryUserDirectory,
};
use grantflow::lifecycle::{
    ApplicationStatus, ApplicationSubmission, CheckoutInput, Identity, LifecycleEngine,
    LoginProfile, PaymentSettings, Role, ScholarshipId,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Student email applying for the scholarship
    #[arg(long, default_value = "a@x.com")]
    pub(crate) student: String,
    /// Scholarship identifier to apply for
    #[arg(long, default_value = "S1")]
    pub(crate) scholarship: String,
    /// Application fee as a decimal amount
    #[arg(long, default_value = "120.00")]
    pub(crate) price: String,
    /// Moderator feedback recorded before completion
    #[arg(long, default_value = "transcript verified")]
    pub(crate) feedback: String,
}

/// Walk one application from login through settlement to completion against
/// in-memory collaborators, printing each lifecycle step.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemoryApplicationStore::default());
    let directory = Arc::new(InMemoryUserDirectory::default());
    let gateway = Arc::new(InMemoryCheckoutGateway::default());

    directory.seed_role("mod@demo.test", Role::Moderator);

    let engine = LifecycleEngine::new(
        store,
        directory,
        gateway.clone(),
        PaymentSettings {
            currency: "usd".to_string(),
            success_url: "https://portal.demo/payment-success".to_string(),
            cancel_url: "https://portal.demo/payment-cancelled".to_string(),
        },
    );

    println!("Scholarship lifecycle demo");

    let student = Identity::new(args.student.clone());
    let moderator = Identity::new("mod@demo.test");

    let user = engine
        .login(LoginProfile {
            email: args.student.clone(),
            photo: None,
        })
        .await?;
    println!(
        "\n[1] login-upsert registered {} as {}",
        user.email,
        user.role.label()
    );

    let record = engine
        .create(
            &student,
            ApplicationSubmission {
                student_email: args.student.clone(),
                scholarship_id: ScholarshipId(args.scholarship.clone()),
                details: Default::default(),
            },
        )
        .await?;
    println!(
        "[2] application {} created: status={}, payment={}",
        record.id.0,
        record.status.label(),
        record.payment.label()
    );

    let session = engine
        .initiate_checkout(
            &student,
            CheckoutInput {
                title: format!("Scholarship {}", args.scholarship),
                price: args.price.clone(),
                student_email: args.student.clone(),
                scholarship_id: ScholarshipId(args.scholarship.clone()),
            },
        )
        .await?;
    println!(
        "[3] checkout session {} opened, redirect: {}",
        session.id, session.url
    );

    // The hosted checkout page completes out of band.
    gateway.settle(&session.id, "pi_demo_001");
    let receipt = engine.confirm_payment(&session.id).await?;
    println!(
        "[4] payment confirmed for {}: transaction {}",
        receipt.application_id.0, receipt.transaction_id
    );

    engine
        .set_feedback(&moderator, &receipt.application_id, args.feedback.clone())
        .await?;
    let resolved = engine
        .set_status(
            &moderator,
            &receipt.application_id,
            ApplicationStatus::Completed,
        )
        .await?;
    println!(
        "[5] moderator resolved the application: status={}, feedback={:?}",
        resolved.status.label(),
        resolved.moderator_feedback.as_deref().unwrap_or("")
    );

    println!(
        "\nFinal record:\n{}",
        serde_json::to_string_pretty(&resolved).unwrap_or_else(|_| "<unserializable>".to_string())
    );
    Ok(())
}
