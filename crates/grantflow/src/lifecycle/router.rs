use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ApplicationId, ApplicationStatus, ApplicationSubmission, LoginProfile, Role,
};
use super::engine::{CheckoutInput, EngineError, LifecycleEngine};
use super::gateway::PaymentGateway;
use super::identity::Identity;
use super::store::{ApplicationStore, UserDirectory};

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Conflict(_) => StatusCode::CONFLICT,
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::PaymentVerificationFailed(_) => StatusCode::BAD_GATEWAY,
            EngineError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Router builder exposing the lifecycle endpoints under `/api/v1`.
pub fn lifecycle_router<S, D, G>(engine: Arc<LifecycleEngine<S, D, G>>) -> Router
where
    S: ApplicationStore + 'static,
    D: UserDirectory + 'static,
    G: PaymentGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            post(create_application::<S, D, G>).get(list_applications::<S, D, G>),
        )
        .route(
            "/api/v1/applications/student/:email",
            get(list_student_applications::<S, D, G>),
        )
        .route(
            "/api/v1/applications/status/:id",
            put(update_status::<S, D, G>),
        )
        .route(
            "/api/v1/applications/feedback/:id",
            put(update_feedback::<S, D, G>),
        )
        .route(
            "/api/v1/applications/:id",
            delete(delete_application::<S, D, G>),
        )
        .route(
            "/api/v1/payments/checkout-session",
            post(create_checkout_session::<S, D, G>),
        )
        .route("/api/v1/payments/confirm", post(confirm_payment::<S, D, G>))
        .route(
            "/api/v1/users",
            post(login_user::<S, D, G>).get(list_users::<S, D, G>),
        )
        .route("/api/v1/users/role/:email", put(update_role::<S, D, G>))
        .route("/api/v1/users/:email", delete(delete_user::<S, D, G>))
        .with_state(engine)
}

type Engine<S, D, G> = Arc<LifecycleEngine<S, D, G>>;

pub(crate) async fn create_application<S, D, G>(
    State(engine): State<Engine<S, D, G>>,
    identity: Identity,
    Json(submission): Json<ApplicationSubmission>,
) -> Result<Response, EngineError>
where
    S: ApplicationStore + 'static,
    D: UserDirectory + 'static,
    G: PaymentGateway + 'static,
{
    let record = engine.create(&identity, submission).await?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

pub(crate) async fn list_applications<S, D, G>(
    State(engine): State<Engine<S, D, G>>,
    identity: Identity,
) -> Result<Response, EngineError>
where
    S: ApplicationStore + 'static,
    D: UserDirectory + 'static,
    G: PaymentGateway + 'static,
{
    let records = engine.list_all(&identity).await?;
    Ok(Json(records).into_response())
}

pub(crate) async fn list_student_applications<S, D, G>(
    State(engine): State<Engine<S, D, G>>,
    identity: Identity,
    Path(email): Path<String>,
) -> Result<Response, EngineError>
where
    S: ApplicationStore + 'static,
    D: UserDirectory + 'static,
    G: PaymentGateway + 'static,
{
    let records = engine.list_for_student(&identity, &email).await?;
    Ok(Json(records).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateStatusRequest {
    pub(crate) status: ApplicationStatus,
}

pub(crate) async fn update_status<S, D, G>(
    State(engine): State<Engine<S, D, G>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Response, EngineError>
where
    S: ApplicationStore + 'static,
    D: UserDirectory + 'static,
    G: PaymentGateway + 'static,
{
    let record = engine
        .set_status(&identity, &ApplicationId(id), body.status)
        .await?;
    Ok(Json(record).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateFeedbackRequest {
    pub(crate) feedback: String,
}

pub(crate) async fn update_feedback<S, D, G>(
    State(engine): State<Engine<S, D, G>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<UpdateFeedbackRequest>,
) -> Result<Response, EngineError>
where
    S: ApplicationStore + 'static,
    D: UserDirectory + 'static,
    G: PaymentGateway + 'static,
{
    let record = engine
        .set_feedback(&identity, &ApplicationId(id), body.feedback)
        .await?;
    Ok(Json(record).into_response())
}

pub(crate) async fn delete_application<S, D, G>(
    State(engine): State<Engine<S, D, G>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, EngineError>
where
    S: ApplicationStore + 'static,
    D: UserDirectory + 'static,
    G: PaymentGateway + 'static,
{
    let removed = engine.delete(&identity, &ApplicationId(id)).await?;
    Ok(Json(removed).into_response())
}

pub(crate) async fn create_checkout_session<S, D, G>(
    State(engine): State<Engine<S, D, G>>,
    identity: Identity,
    Json(input): Json<CheckoutInput>,
) -> Result<Response, EngineError>
where
    S: ApplicationStore + 'static,
    D: UserDirectory + 'static,
    G: PaymentGateway + 'static,
{
    let session = engine.initiate_checkout(&identity, input).await?;
    Ok(Json(json!({ "session_id": session.id, "url": session.url })).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfirmPaymentRequest {
    pub(crate) session_id: String,
}

pub(crate) async fn confirm_payment<S, D, G>(
    State(engine): State<Engine<S, D, G>>,
    _identity: Identity,
    Json(body): Json<ConfirmPaymentRequest>,
) -> Result<Response, EngineError>
where
    S: ApplicationStore + 'static,
    D: UserDirectory + 'static,
    G: PaymentGateway + 'static,
{
    let receipt = engine.confirm_payment(&body.session_id).await?;
    Ok(Json(receipt).into_response())
}

pub(crate) async fn login_user<S, D, G>(
    State(engine): State<Engine<S, D, G>>,
    Json(profile): Json<LoginProfile>,
) -> Result<Response, EngineError>
where
    S: ApplicationStore + 'static,
    D: UserDirectory + 'static,
    G: PaymentGateway + 'static,
{
    let user = engine.login(profile).await?;
    Ok(Json(user).into_response())
}

pub(crate) async fn list_users<S, D, G>(
    State(engine): State<Engine<S, D, G>>,
    identity: Identity,
) -> Result<Response, EngineError>
where
    S: ApplicationStore + 'static,
    D: UserDirectory + 'static,
    G: PaymentGateway + 'static,
{
    let users = engine.list_users(&identity).await?;
    Ok(Json(users).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateRoleRequest {
    pub(crate) role: Role,
}

pub(crate) async fn update_role<S, D, G>(
    State(engine): State<Engine<S, D, G>>,
    identity: Identity,
    Path(email): Path<String>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<Response, EngineError>
where
    S: ApplicationStore + 'static,
    D: UserDirectory + 'static,
    G: PaymentGateway + 'static,
{
    let user = engine.set_role(&identity, &email, body.role).await?;
    Ok(Json(user).into_response())
}

pub(crate) async fn delete_user<S, D, G>(
    State(engine): State<Engine<S, D, G>>,
    identity: Identity,
    Path(email): Path<String>,
) -> Result<Response, EngineError>
where
    S: ApplicationStore + 'static,
    D: UserDirectory + 'static,
    G: PaymentGateway + 'static,
{
    let user = engine.delete_user(&identity, &email).await?;
    Ok(Json(user).into_response())
}
