use crate::db;
use crate::errors::ApiError;
use crate::models::*;
use crate::state::AppState;
use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;
use zk_credentials::groth16::{deserialize_vk, serialize_vk, verify_artifact};
use zk_credentials::types::CircuitId;

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/v1/credentials", post(create_request))
        .route("/api/v1/budget/:user/reset", post(reset_budget))
        .layer(middleware::from_fn(auth_middleware));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/credentials/:id", get(get_request))
        .route("/api/v1/users/:user/credentials", get(list_user_credentials))
        .route("/api/v1/verify", post(verify_credential))
        .route("/api/v1/zk/vk/:circuit_id", get(get_vk))
        .route("/api/v1/budget/:user", get(get_budget))
        .merge(protected_routes)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // In production, this should be a strong secret from environment.
    let expected_key = std::env::var("API_KEY").unwrap_or_else(|_| "dev-secret-key".to_string());

    if let Some(provided_key) = headers.get("X-API-KEY") {
        if provided_key == expected_key.as_str() {
            return Ok(next.run(request).await);
        }
    }

    tracing::warn!("unauthorized access attempt");
    Err(StatusCode::UNAUTHORIZED)
}

async fn create_request(
    State(state): State<AppState>,
    Json(req): Json<CredentialRequest>,
) -> Result<Json<CredentialRequestResponse>, ApiError> {
    if req.repositories.is_empty() {
        return Err(ApiError::BadRequest("no repositories supplied".to_string()));
    }
    if req.circuits.is_empty() {
        return Err(ApiError::BadRequest("no circuits requested".to_string()));
    }

    let request_id = Uuid::new_v4();
    db::insert_request(&state.db, request_id, &req.user).await?;

    // Analysis and proving run in the background.
    tokio::spawn(crate::prover::issue_credentials(
        state.clone(),
        request_id,
        req,
    ));

    Ok(Json(CredentialRequestResponse { request_id }))
}

async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CredentialStatusResponse>, ApiError> {
    let Some((created_at, _user, status_str, error)) = db::get_request(&state.db, id).await?
    else {
        return Err(ApiError::NotFound("request not found".to_string()));
    };

    let status = match status_str.as_str() {
        "analyzing" => RequestStatus::Analyzing,
        "proving" => RequestStatus::Proving,
        "ready" => RequestStatus::Ready,
        _ => RequestStatus::Failed,
    };

    let artifacts = db::list_artifacts_for_request(&state.db, id).await?;

    Ok(Json(CredentialStatusResponse {
        request_id: id,
        created_at,
        status,
        artifacts,
        error,
    }))
}

async fn list_user_credentials(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<Vec<zk_credentials::types::ProofArtifact>>, ApiError> {
    Ok(Json(db::list_artifacts_for_user(&state.db, &user).await?))
}

async fn verify_credential(
    State(_state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let vk_bytes = base64::engine::general_purpose::STANDARD
        .decode(req.vk_b64)
        .map_err(|_| ApiError::BadRequest("invalid vk_b64".to_string()))?;
    let vk = deserialize_vk(&vk_bytes)
        .map_err(|_| ApiError::BadRequest("invalid vk".to_string()))?;

    let ok = verify_artifact(&vk, &req.artifact).is_ok();
    Ok(Json(VerifyResponse { ok }))
}

async fn get_vk(
    State(state): State<AppState>,
    Path(circuit_id): Path<String>,
) -> Result<Json<ZkVkResponse>, ApiError> {
    let circuit_id: CircuitId =
        serde_json::from_value(serde_json::Value::String(circuit_id))
            .map_err(|_| ApiError::BadRequest("unknown circuit id".to_string()))?;

    let keys = state.keys.ensure(circuit_id).await?;
    let vk_bytes = serialize_vk(keys.vk.as_ref()).map_err(|_| ApiError::Internal)?;

    Ok(Json(ZkVkResponse {
        curve: "bn254".to_string(),
        proof_system: "groth16".to_string(),
        circuit_id,
        vk_b64: base64::engine::general_purpose::STANDARD.encode(vk_bytes),
    }))
}

async fn get_budget(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<BudgetResponse>, ApiError> {
    let snapshot = state.ledger.snapshot(&user);
    Ok(Json(BudgetResponse {
        remaining_milli: snapshot.remaining_milli(),
        total_milli: snapshot.total_milli,
        consumed_milli: snapshot.consumed_milli,
        by_category: snapshot.by_category,
        user,
    }))
}

/// Administrative reset: the only path by which a budget ever grows back.
async fn reset_budget(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<BudgetResponse>, ApiError> {
    state.ledger.reset(&user);
    let snapshot = state.ledger.snapshot(&user);
    db::save_budget(&state.db, &user, &snapshot).await?;

    Ok(Json(BudgetResponse {
        remaining_milli: snapshot.remaining_milli(),
        total_milli: snapshot.total_milli,
        consumed_milli: snapshot.consumed_milli,
        by_category: snapshot.by_category,
        user,
    }))
}
