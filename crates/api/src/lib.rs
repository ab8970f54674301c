use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use snowtrip_core::{DialogueContext, Settings};
use snowtrip_dialogue::TripPlannerAgent;
use snowtrip_observability::AppMetrics;
use snowtrip_storage::{DialogueSession, MemorySessionStore, MemoryTripStore, SessionRepository};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

const MAX_TEXT_LEN: usize = 500;
const MAX_SUGGESTION_LIMIT: usize = 20;

pub type Agent = TripPlannerAgent<MemoryTripStore>;

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<Agent>,
    pub metrics: Arc<AppMetrics>,
    pub sessions: Arc<MemorySessionStore>,
    pub session_ttl: Duration,
}

impl ApiState {
    pub fn new(agent: Arc<Agent>, metrics: Arc<AppMetrics>) -> Self {
        let session_ttl = agent.settings().session_ttl;
        Self {
            agent,
            metrics,
            sessions: Arc::new(MemorySessionStore::new()),
            session_ttl,
        }
    }

    fn session_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::from_std(self.session_ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: snowtrip_observability::MetricsSnapshot,
    catalog: snowtrip_catalog::CatalogStats,
    sessions: usize,
}

#[derive(Debug, Deserialize)]
struct TurnRequest {
    session_id: Option<String>,
    text: String,
}

#[derive(Debug, Serialize)]
struct TurnResponse {
    session_id: String,
    #[serde(flatten)]
    response: snowtrip_core::DialogueResponse,
    trip: snowtrip_core::TripData,
    missing: snowtrip_core::SlotSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<snowtrip_core::NluError>,
}

#[derive(Debug, Deserialize)]
struct SessionRequest {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct MatchRequest {
    query: String,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct MatchResponse {
    query: String,
    resort: Option<snowtrip_core::ResolvedResort>,
    field: Option<snowtrip_core::MatchField>,
    suggestions: Vec<snowtrip_core::Suggestion>,
}

#[derive(Debug, Deserialize)]
struct TextRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct DatesResponse {
    today: chrono::NaiveDate,
    range: snowtrip_core::DateRange,
    duration_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DeleteTripRequest {
    trip_id: String,
}

/// Builtin or directory catalog per `settings`, in-memory trip store.
pub async fn build_app(settings: Settings) -> Router {
    let metrics = AppMetrics::shared();
    let store = Arc::new(MemoryTripStore::new());
    let agent = Arc::new(TripPlannerAgent::from_settings(
        settings,
        store,
        metrics.clone(),
    ));

    let stats = agent.refresh_catalog().await;
    info!(
        source = %stats.source,
        entities = stats.entities,
        groups = stats.groups,
        "catalog warmed"
    );

    build_router(ApiState::new(agent, metrics))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/dialogue/turn", post(dialogue_turn))
        .route("/v1/dialogue/reset", post(dialogue_reset))
        .route("/v1/resorts/match", post(resorts_match))
        .route("/v1/intent", post(intent))
        .route("/v1/dates", post(dates))
        .route("/v1/trips", get(trips_list))
        .route("/v1/trips/delete", post(trips_delete))
        .route("/v1/catalog/refresh", post(catalog_refresh))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(16 * 1024))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        catalog: state.agent.catalog_stats(),
        sessions: state.sessions.len(),
    };
    (StatusCode::OK, Json(payload))
}

fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": error,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Trimmed text, or the 400 to send back.
fn validated_text(text: &str) -> Result<&str, Response> {
    let text = text.trim();
    if text.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "empty_text",
            "text must not be empty",
        ));
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "text_too_long",
            format!("text is limited to {MAX_TEXT_LEN} characters"),
        ));
    }
    Ok(text)
}

async fn dialogue_turn(
    State(state): State<ApiState>,
    Json(request): Json<TurnRequest>,
) -> Response {
    let text = match validated_text(&request.text) {
        Ok(text) => text,
        Err(response) => return response,
    };
    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let now = state.agent.clock().now();
    let context = match load_context(&state, &session_id, now).await {
        Ok(context) => context,
        Err(err) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "session_store_failed",
                format!("{err:#}"),
            )
        }
    };

    let outcome = state.agent.handle_turn(context, text).await;
    let payload = TurnResponse {
        session_id: session_id.clone(),
        response: outcome.response,
        trip: outcome.context.trip.clone(),
        missing: outcome.context.trip.missing(),
        last_error: outcome.context.last_error.clone(),
    };
    let session = DialogueSession {
        session_id,
        context: outcome.context,
        expires_at: state.session_expiry(now),
    };
    if let Err(err) = state.sessions.upsert_session(session).await {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "session_store_failed",
            format!("{err:#}"),
        );
    }

    (StatusCode::OK, Json(payload)).into_response()
}

/// Drops idle sessions, then returns this session's context or a fresh one.
async fn load_context(
    state: &ApiState,
    session_id: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<DialogueContext> {
    let purged = state.sessions.purge_expired(now).await?;
    if purged > 0 {
        debug!(purged, "expired dialogue sessions removed");
    }
    Ok(state
        .sessions
        .load_session(session_id, now)
        .await?
        .map(|session| session.context)
        .unwrap_or_default())
}

async fn dialogue_reset(
    State(state): State<ApiState>,
    Json(request): Json<SessionRequest>,
) -> Response {
    match state.sessions.remove_session(&request.session_id).await {
        Ok(removed) => (
            StatusCode::OK,
            Json(serde_json::json!({ "session_id": request.session_id, "removed": removed })),
        )
            .into_response(),
        Err(err) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "session_store_failed",
            format!("{err:#}"),
        ),
    }
}

async fn resorts_match(
    State(state): State<ApiState>,
    Json(request): Json<MatchRequest>,
) -> Response {
    let query = match validated_text(&request.query) {
        Ok(query) => query,
        Err(response) => return response,
    };
    let matcher = state.agent.matcher().await;
    let limit = request
        .limit
        .unwrap_or_else(|| matcher.suggestion_limit())
        .clamp(1, MAX_SUGGESTION_LIMIT);

    match matcher.resolve(query) {
        Ok(result) => {
            let payload = MatchResponse {
                query: query.to_string(),
                resort: Some(result.to_resolved()),
                field: Some(result.field),
                suggestions: matcher.suggestions(query, limit),
            };
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => {
            let status = match err {
                snowtrip_core::NluError::AmbiguousMatch { .. } => StatusCode::CONFLICT,
                _ => StatusCode::NOT_FOUND,
            };
            (
                status,
                Json(serde_json::json!({
                    "error": err,
                    "message": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}

async fn intent(State(state): State<ApiState>, Json(request): Json<TextRequest>) -> Response {
    match validated_text(&request.text) {
        Ok(text) => (StatusCode::OK, Json(state.agent.classify(text).await)).into_response(),
        Err(response) => response,
    }
}

async fn dates(State(state): State<ApiState>, Json(request): Json<TextRequest>) -> Response {
    let text = match validated_text(&request.text) {
        Ok(text) => text,
        Err(response) => return response,
    };
    let parser = state.agent.parser();
    let payload = DatesResponse {
        today: parser.today(),
        range: parser.extract_dates(text),
        duration_days: parser.extract_duration(text),
    };
    (StatusCode::OK, Json(payload)).into_response()
}

async fn trips_list(State(state): State<ApiState>) -> Response {
    match state.agent.list_trips().await {
        Ok(trips) => (
            StatusCode::OK,
            Json(serde_json::json!({ "trips": trips })),
        )
            .into_response(),
        Err(err) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "trip_store_failed",
            format!("{err:#}"),
        ),
    }
}

async fn trips_delete(
    State(state): State<ApiState>,
    Json(request): Json<DeleteTripRequest>,
) -> Response {
    match state.agent.delete_trip(request.trip_id.trim()).await {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({ "trip_id": request.trip_id, "deleted": true })),
        )
            .into_response(),
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            "trip_not_found",
            format!("no trip with id {}", request.trip_id),
        ),
        Err(err) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "trip_store_failed",
            format!("{err:#}"),
        ),
    }
}

async fn catalog_refresh(State(state): State<ApiState>) -> impl IntoResponse {
    let stats = state.agent.refresh_catalog().await;
    (StatusCode::OK, Json(stats))
}
