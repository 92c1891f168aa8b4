use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use wheel_shared::Prize;

use crate::error::AppError;
use crate::relay::RelayState;

#[derive(Debug, Deserialize)]
pub struct PrizesBody {
    pub prizes: Vec<Prize>,
}

pub async fn get_prizes(State(state): State<Arc<RelayState>>) -> Json<Vec<Prize>> {
    Json(state.prizes().await)
}

/// REST twin of the `update_prizes` socket message.
pub async fn post_prizes(
    State(state): State<Arc<RelayState>>,
    Json(body): Json<PrizesBody>,
) -> Result<Json<Value>, AppError> {
    let prizes = state.replace_prizes(body.prizes).await?;
    info!("Prize list updated over HTTP ({} prizes)", prizes.len());
    Ok(Json(json!({ "success": true })))
}

pub async fn health(State(state): State<Arc<RelayState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "clients": state.client_count().await,
        "prizes": state.prizes().await.len(),
    }))
}
