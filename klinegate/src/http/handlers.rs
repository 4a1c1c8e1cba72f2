use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use klinegate_core::KlineError;
use serde_json::{Value, json};

use super::{ApiError, AppState};
use crate::core::{BasicQuery, KlineQuery};

fn bad_query(r: &QueryRejection) -> KlineError {
    KlineError::InvalidParameter(r.body_text())
}

fn bad_json(r: &JsonRejection) -> KlineError {
    KlineError::InvalidParameter(r.body_text())
}

async fn kline(state: &AppState, q: &KlineQuery) -> Result<Json<Value>, ApiError> {
    let rows = state.kline.kline(q).await.map_err(ApiError::kline)?;
    Ok(Json(json!({ "kdata": rows })))
}

async fn basic(state: &AppState, q: &BasicQuery) -> Result<Json<Value>, ApiError> {
    let basic = state.kline.basic(&q.ts_code).await.map_err(ApiError::basic)?;
    Ok(Json(json!({ "msg": "success", "basic": basic })))
}

pub async fn kline_get(
    State(state): State<Arc<AppState>>,
    q: Result<Query<KlineQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(q) = q.map_err(|r| ApiError::kline(bad_query(&r)))?;
    kline(&state, &q).await
}

pub async fn kline_post(
    State(state): State<Arc<AppState>>,
    q: Result<Json<KlineQuery>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(q) = q.map_err(|r| ApiError::kline(bad_json(&r)))?;
    kline(&state, &q).await
}

pub async fn basic_get(
    State(state): State<Arc<AppState>>,
    q: Result<Query<BasicQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(q) = q.map_err(|r| ApiError::basic(bad_query(&r)))?;
    basic(&state, &q).await
}

pub async fn basic_post(
    State(state): State<Arc<AppState>>,
    q: Result<Json<BasicQuery>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(q) = q.map_err(|r| ApiError::basic(bad_json(&r)))?;
    basic(&state, &q).await
}
