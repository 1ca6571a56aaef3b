use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use http::HeaderName;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::models::*;
use crate::{
    detector,
    disbursement::{ApprovalPolicy, AuthorizationEvent, DisbursementOrchestrator},
    error::{AppError, AppResult},
    group::GroupRepository,
    ratio::RatioResolver,
    webhook::{parse_event, InboundEvent, WebhookVerifier},
};

/// Name of the signature header on inbound webhook requests
pub static SIGNATURE_HEADER: HeaderName = HeaderName::from_static("webhook-signature");

#[derive(Clone)]
pub struct AppState {
    pub groups: Arc<GroupRepository>,
    pub ratio_resolver: Arc<RatioResolver>,
    pub orchestrator: Arc<DisbursementOrchestrator>,
    pub verifier: WebhookVerifier,
    pub approval_policy: ApprovalPolicy,
}

/// Health check endpoint
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "API is running",
    })
}

/// Signed event webhook from the payment processor
/// POST /api/v1/webhook/processor
///
/// Signature verification runs synchronously before anything else; an
/// unverified payload never reaches event parsing, let alone resolution.
pub async fn processor_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let signature = headers
        .get(&SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Authentication("Missing signature header".to_string()))?;

    state.verifier.verify(&body, signature)?;

    let event = parse_event(&body)?;
    info!("🔔 Webhook event verified: {}", event.event_id());

    match event {
        InboundEvent::AuthorizationRequest { event_id, data } => {
            // Policy gate only: no splitting, no charging
            let approved = state.approval_policy.approve(data.pending_amount);
            info!("Answered authorization request {}: {}", event_id, approved);
            Ok(Json(ApprovalResponse { approved }).into_response())
        }
        InboundEvent::AuthorizationCreated { event_id, data }
        | InboundEvent::TransactionCreated { event_id, data } => {
            let report = state
                .orchestrator
                .process_event(AuthorizationEvent {
                    event_id,
                    card_reference: data.card_reference,
                    amount: data.amount,
                    currency: data.currency,
                })
                .await?;

            info!(
                "Disbursement run for event {} finished {:?} ({} charged)",
                report.event_id,
                report.status,
                report.charged_member_count()
            );
            // Partial failure still acknowledges: the event source must
            // not retry the whole event
            Ok(Json(WebhookAck::success()).into_response())
        }
        InboundEvent::Unknown { event_id, event_type } => {
            info!("Ignoring unrecognized event type {} ({})", event_type, event_id);
            Ok(Json(WebhookAck::success()).into_response())
        }
    }
}

/// Current payment ratios for a group, computing and persisting an equal
/// split when none are configured
/// GET /api/v1/groups/:group_id/ratios
pub async fn get_group_ratios(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Query(query): Query<RatiosQuery>,
) -> AppResult<Json<GroupRatiosResponse>> {
    let group = state
        .groups
        .get_group(group_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Group {} not found", group_id)))?;

    let is_member = state.groups.is_member(group_id, query.actor_id).await?;
    if !is_member && group.admin_id != query.actor_id {
        return Err(AppError::Forbidden(
            "Only group members can view payment ratios".to_string(),
        ));
    }

    let ratios = state.ratio_resolver.get_ratios(group_id).await?;
    Ok(Json(GroupRatiosResponse::from_ratios(group_id, ratios)))
}

/// Replace a group's payment ratios, admin-only and all-or-nothing
/// POST /api/v1/groups/:group_id/ratios
pub async fn set_group_ratios(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Json(request): Json<SetRatiosRequest>,
) -> AppResult<Json<SetRatiosResponse>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let entries: Vec<(Uuid, rust_decimal::Decimal)> = request
        .ratios
        .iter()
        .map(|entry| (entry.user_id, entry.percentage))
        .collect();

    state
        .ratio_resolver
        .set_ratios(group_id, request.actor_id, &entries)
        .await?;

    Ok(Json(SetRatiosResponse {
        message: "Group payment ratios updated successfully",
    }))
}

/// Run recurrence detection over a normalized ledger
/// POST /api/v1/subscriptions/detect
pub async fn detect_subscriptions(
    Json(request): Json<DetectRequest>,
) -> AppResult<Json<DetectResponse>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let transactions = detector::normalize_rows(request.rows);
    let subscriptions = detector::detect(&transactions);

    Ok(Json(DetectResponse { subscriptions }))
}
