//! HTTP request handlers for the gateway API.
//!
//! The inference routes (`chat_completion`, `completions`, `responses`,
//! `messages`) all funnel through [`admission_pipeline`], which walks the
//! received → authenticated → rate_checked → resolved → decided →
//! dispatch → priced → emitted → replied state machine. The four routes
//! differ only in their wire shape; `completions` additionally translates
//! to/from the legacy completion format before and after the shared
//! pipeline runs.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use gateway_core::domain::{ModelPricing, UsageLedgerEntry, UsageOutcome};
use gateway_core::{GatewayRequest, ModelObject, ModelsResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyPool;
use sqlx::Row;
use std::collections::HashMap;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    auth,
    error::ApiError,
    extractors::{ApiKey, JsonBody, SessionId, Tags},
    state::AppState,
};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Version
    pub version: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let provider_count = state.providers.len();
    let response = state.health.check_readiness(provider_count, provider_count).await;
    let status = if response.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Liveness check endpoint
pub async fn liveness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.health.check_liveness())
}

/// Metrics endpoint (Prometheus text exposition format)
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = state.metrics.gather();
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], metrics)
}

/// List models endpoint (OpenAI compatible)
#[instrument(skip(state))]
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let data: Vec<ModelObject> = state
        .providers
        .provider_ids()
        .iter()
        .filter_map(|id| state.providers.get(id))
        .flat_map(|provider| {
            let owner = format!("{:?}", provider.provider_type());
            provider
                .models()
                .iter()
                .map(move |m| ModelObject {
                    id: m.id.clone(),
                    object_type: "model".to_string(),
                    owned_by: owner.clone(),
                })
                .collect::<Vec<_>>()
        })
        .collect();

    Json(ModelsResponse {
        object_type: "list".to_string(),
        data,
    })
}

/// Get model endpoint
#[instrument(skip(state))]
pub async fn get_model(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> Result<Json<ModelObject>, ApiError> {
    state
        .providers
        .provider_ids()
        .iter()
        .filter_map(|id| state.providers.get(id))
        .find_map(|provider| {
            provider.models().iter().find(|m| m.id == model_id).map(|m| {
                let owner = format!("{:?}", provider.provider_type());
                ModelObject {
                    id: m.id.clone(),
                    object_type: "model".to_string(),
                    owned_by: owner,
                }
            })
        })
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("model not found: {model_id}")))
}

/// Provider status response
#[derive(Debug, Serialize)]
pub struct ProviderStatus {
    /// Provider ID
    pub id: String,
    /// Provider type
    pub provider_type: String,
    /// Number of models
    pub model_count: usize,
}

/// List providers endpoint
pub async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderStatus>> {
    let statuses: Vec<ProviderStatus> = state
        .providers
        .provider_ids()
        .iter()
        .filter_map(|id| {
            state.providers.get(id).map(|p| ProviderStatus {
                id: id.clone(),
                provider_type: format!("{:?}", p.provider_type()),
                model_count: p.models().len(),
            })
        })
        .collect();

    Json(statuses)
}

/// Gateway statistics response
#[derive(Debug, Serialize)]
pub struct GatewayStats {
    /// Active request count
    pub active_requests: usize,
    /// Total requests processed
    pub total_requests: usize,
    /// Success rate
    pub success_rate: f64,
    /// Average latency in ms
    pub avg_latency_ms: f64,
    /// Registered providers
    pub providers: usize,
}

/// Get gateway statistics
pub async fn gateway_stats(State(state): State<AppState>) -> Json<GatewayStats> {
    let tracker_stats = state.tracker.stats();

    Json(GatewayStats {
        active_requests: tracker_stats.active_requests,
        total_requests: tracker_stats.total_completed,
        success_rate: tracker_stats.success_rate,
        avg_latency_ms: tracker_stats.avg_duration.as_millis() as f64,
        providers: state.providers.len(),
    })
}

// ---------------------------------------------------------------------
// Admission pipeline
// ---------------------------------------------------------------------

async fn tenant_rate_limit(pool: &AnyPool, tenant_id: i64) -> Option<u32> {
    let row = sqlx::query("SELECT rate_limit_per_minute FROM tenants WHERE id = $1")
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
        .ok()
        .flatten()?;
    row.try_get::<i32, _>("rate_limit_per_minute").ok().map(|n| n.max(0) as u32)
}

async fn fetch_pricing(pool: &AnyPool, model: &str) -> Option<ModelPricing> {
    let row = sqlx::query(
        "SELECT model, version_tag, input_price, cached_input_price, output_price, provider \
         FROM model_pricing WHERE model = $1",
    )
    .bind(model)
    .fetch_optional(pool)
    .await
    .ok()
    .flatten()?;

    Some(ModelPricing {
        model: row.get("model"),
        version_tag: row.get("version_tag"),
        input_price: row.get("input_price"),
        cached_input_price: row.get("cached_input_price"),
        output_price: row.get("output_price"),
        provider: row.get("provider"),
    })
}

/// Resolve `X-Tag` header values (names or dotted paths) to leaf tag ids.
/// Unknown names are dropped with a warning rather than rejecting the
/// request, per the tag header's "best effort" contract.
async fn resolve_tag_ids(pool: &AnyPool, tenant_id: i64, tag_names: &[String]) -> Vec<i64> {
    let mut ids = Vec::with_capacity(tag_names.len());
    for name in tag_names {
        let row = sqlx::query(
            "SELECT id FROM tags WHERE tenant_id = $1 AND name = $2 AND is_active = true",
        )
            .bind(tenant_id)
            .bind(name)
            .fetch_optional(pool)
            .await
            .ok()
            .flatten();

        match row {
            Some(row) => ids.push(row.get("id")),
            None => warn!(tenant_id, tag = %name, "unknown tag in X-Tag header, ignoring"),
        }
    }
    ids
}

async fn emit_usage(
    state: &AppState,
    route: &str,
    tenant_id: i64,
    model: &str,
    session_id: Option<&str>,
    outcome: UsageOutcome,
    usd: Decimal,
    prompt_tokens: u32,
    completion_tokens: u32,
    tag_budgets: &[gateway_budget::resolver::TagBudgetStatus],
) {
    // Every STRICT/LENIENT ancestor resolved for this request accrues,
    // weighted by its own configured weight. NONE-mode tags are part of
    // the resolver's ancestor walk (a deeper ancestor may still gate) but
    // never accrue usage themselves.
    let tag_weights: HashMap<i64, Decimal> = tag_budgets
        .iter()
        .filter(|t| t.inheritance_mode != gateway_core::domain::InheritanceMode::None)
        .map(|t| (t.tag_id, t.weight))
        .collect();

    let entry = UsageLedgerEntry {
        record_id: Uuid::new_v4(),
        ts: Utc::now(),
        tenant_id,
        route: route.to_string(),
        model: model.to_string(),
        prompt_tokens,
        completion_tokens,
        usd,
        session_id: session_id.map(str::to_string),
        outcome,
        tag_weights,
    };

    if let Err(e) = state.events.emit(entry).await {
        warn!(error = %e, route, tenant_id, "usage ledger emit failed, response not blocked");
    }
}

/// Run one request through the full admission pipeline and return the
/// normalized response, or the `ApiError` the pipeline stopped at.
async fn admission_pipeline(
    state: &AppState,
    route: &str,
    raw_key: &str,
    tag_names: &[String],
    session_id: Option<&str>,
    request: GatewayRequest,
) -> Result<gateway_core::GatewayResponse, ApiError> {
    // received -> authenticated
    let tenant = auth::authenticate(&state.db_pool, raw_key).await?;

    // authenticated -> rate_checked
    let now = Utc::now();
    let now_unix = u64::try_from(now.timestamp()).unwrap_or_default();
    let limit = tenant_rate_limit(&state.db_pool, tenant.tenant_id).await;
    let rate_decision =
        gateway_budget::check_rate_limit(&state.cache, tenant.tenant_id, limit, now_unix).await;
    if let gateway_budget::RateLimitDecision::Deny { retry_after_secs, limit } = rate_decision {
        return Err(ApiError::rate_limited(
            format!("rate limit of {limit} requests/window exceeded"),
            retry_after_secs,
        ));
    }

    // rate_checked -> resolved
    let leaf_tag_ids = resolve_tag_ids(&state.db_pool, tenant.tenant_id, tag_names).await;
    let budgets = gateway_budget::resolve_budgets(
        &state.cache,
        &state.db_pool,
        tenant.tenant_id,
        session_id,
        &leaf_tag_ids,
        now,
    )
    .await;

    // resolved -> decided
    let decision = gateway_budget::policy::evaluate(&budgets, rate_decision, Decimal::ZERO);
    if let gateway_budget::Decision::Deny { reason } = decision {
        emit_usage(
            state,
            route,
            tenant.tenant_id,
            &request.model,
            session_id,
            UsageOutcome::Blocked,
            Decimal::ZERO,
            0,
            0,
            &budgets.tag_budgets,
        )
        .await;
        return Err(ApiError::forbidden(reason));
    }

    // decided -> dispatch
    let (provider, _route_decision) = state.router.route(&request)?;
    let breaker = state.circuit_breakers.get_or_create(provider.id());
    breaker.check()?;

    let dispatch = state.retry_policy.execute(|| provider.chat_completion(&request)).await;

    let response = match dispatch {
        Ok(response) => {
            breaker.record_success();
            response
        }
        Err(e) => {
            breaker.record_failure();
            emit_usage(
                state,
                route,
                tenant.tenant_id,
                &request.model,
                session_id,
                UsageOutcome::Failed,
                Decimal::ZERO,
                0,
                0,
                &budgets.tag_budgets,
            )
            .await;
            return Err(ApiError::from(e));
        }
    };

    // dispatch -> priced
    let pricing = fetch_pricing(&state.db_pool, &response.model).await;
    let usage_tokens = gateway_budget::UsageTokens {
        prompt_tokens: i64::from(response.usage.prompt_tokens),
        cached_prompt_tokens: 0,
        completion_tokens: i64::from(response.usage.completion_tokens),
    };
    let cost = gateway_budget::compute_cost(&response.model, usage_tokens, pricing.as_ref());

    // priced -> emitted -> replied
    emit_usage(
        state,
        route,
        tenant.tenant_id,
        &response.model,
        session_id,
        UsageOutcome::Success,
        cost,
        response.usage.prompt_tokens,
        response.usage.completion_tokens,
        &budgets.tag_budgets,
    )
    .await;

    Ok(response)
}

/// `POST /v1/chat/completions`
#[instrument(skip(state, api_key, body), fields(model = %body.model))]
pub async fn chat_completion(
    State(state): State<AppState>,
    ApiKey(api_key): ApiKey,
    Tags(tags): Tags,
    SessionId(session_id): SessionId,
    JsonBody(body): JsonBody<GatewayRequest>,
) -> Result<Json<gateway_core::GatewayResponse>, ApiError> {
    body.validate().map_err(ApiError::from)?;
    let response = admission_pipeline(
        &state,
        "/v1/chat/completions",
        &api_key,
        &tags,
        session_id.as_deref(),
        body,
    )
    .await?;
    Ok(Json(response))
}

/// `POST /v1/responses`
///
/// The Responses API shares the chat request/response wire shape here;
/// translating its richer item-based format is out of scope.
#[instrument(skip(state, api_key, body), fields(model = %body.model))]
pub async fn responses(
    State(state): State<AppState>,
    ApiKey(api_key): ApiKey,
    Tags(tags): Tags,
    SessionId(session_id): SessionId,
    JsonBody(body): JsonBody<GatewayRequest>,
) -> Result<Json<gateway_core::GatewayResponse>, ApiError> {
    body.validate().map_err(ApiError::from)?;
    let response = admission_pipeline(
        &state,
        "/v1/responses",
        &api_key,
        &tags,
        session_id.as_deref(),
        body,
    )
    .await?;
    Ok(Json(response))
}

/// `POST /v1/messages`
///
/// Anthropic's Messages API shares the chat request/response wire shape
/// here; translating its content-block format is out of scope.
#[instrument(skip(state, api_key, body), fields(model = %body.model))]
pub async fn messages(
    State(state): State<AppState>,
    ApiKey(api_key): ApiKey,
    Tags(tags): Tags,
    SessionId(session_id): SessionId,
    JsonBody(body): JsonBody<GatewayRequest>,
) -> Result<Json<gateway_core::GatewayResponse>, ApiError> {
    body.validate().map_err(ApiError::from)?;
    let response = admission_pipeline(
        &state,
        "/v1/messages",
        &api_key,
        &tags,
        session_id.as_deref(),
        body,
    )
    .await?;
    Ok(Json(response))
}

// ---------------------------------------------------------------------
// Legacy completions compatibility shim
// ---------------------------------------------------------------------

/// `POST /v1/completions` request body, the legacy single-prompt shape
/// that predates chat messages.
#[derive(Debug, Deserialize)]
pub struct LegacyCompletionRequest {
    /// Target model.
    pub model: String,
    /// Prompt text.
    pub prompt: String,
    /// Maximum tokens to generate.
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// A single legacy completion choice.
#[derive(Debug, Serialize)]
pub struct CompletionChoice {
    /// Generated text.
    pub text: String,
    /// Choice index.
    pub index: u32,
    /// Why generation stopped, if known.
    pub finish_reason: Option<String>,
}

/// `POST /v1/completions` response body.
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    /// Response id.
    pub id: String,
    /// Model that served the request.
    pub model: String,
    /// Generated choices.
    pub choices: Vec<CompletionChoice>,
}

impl From<LegacyCompletionRequest> for GatewayRequest {
    fn from(legacy: LegacyCompletionRequest) -> Self {
        let mut builder = GatewayRequest::builder()
            .model(legacy.model)
            .message(gateway_core::ChatMessage::user(legacy.prompt));
        if let Some(max_tokens) = legacy.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        builder.build().expect("legacy prompt always yields a valid request")
    }
}

fn to_legacy_response(response: gateway_core::GatewayResponse) -> CompletionResponse {
    let choices = response
        .choices
        .into_iter()
        .map(|c| CompletionChoice {
            text: c.message.content.unwrap_or_default(),
            index: c.index,
            finish_reason: c.finish_reason.map(|r| format!("{r:?}").to_lowercase()),
        })
        .collect();

    CompletionResponse {
        id: response.id,
        model: response.model,
        choices,
    }
}

/// `POST /v1/completions`
#[instrument(skip(state, api_key, body), fields(model = %body.model))]
pub async fn completions(
    State(state): State<AppState>,
    ApiKey(api_key): ApiKey,
    Tags(tags): Tags,
    SessionId(session_id): SessionId,
    JsonBody(body): JsonBody<LegacyCompletionRequest>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let request: GatewayRequest = body.into();
    request.validate().map_err(ApiError::from)?;
    let response = admission_pipeline(
        &state,
        "/v1/completions",
        &api_key,
        &tags,
        session_id.as_deref(),
        request,
    )
    .await?;
    Ok(Json(to_legacy_response(response)))
}
