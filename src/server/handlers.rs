//! Route handlers.
//!
//! Handlers stay thin: extract, call one service operation, wrap the result
//! in JSON. Every service call touches `SQLite` or the oracle, so each one
//! runs on the blocking pool.

use super::AppState;
use super::extract::{ApiJson, AuthUser};
use crate::models::{
    ArchiveOutcome, ArchiveRecord, ArchiveSummary, Block, BlockPatch, ConverseRequest,
    ConverseResponse, Frequency, ModelPreference, NewBlock, NewPage, Node, NodeId, NodePatch,
    Page, PagePatch, PublicUser,
};
use crate::services::{AssistRequest, AssistResponse, AuthResponse, LoginRequest, PatternInsights, RegisterRequest};
use crate::{Error, Result};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Runs a blocking service call on tokio's blocking pool.
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::failed("spawn_blocking", e))?
}

fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

fn parse_frequency(value: &str) -> Result<Frequency> {
    Frequency::parse(value).ok_or_else(|| Error::InvalidInput(format!("Invalid frequency: {value}")))
}

// ---- root ----

pub async fn root() -> Json<Value> {
    message("Flowtion API")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => Error::NotFound("Metrics are disabled".to_string()).into_response(),
    }
}

// ---- auth ----

pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = state.services.auth.clone();
    blocking(move || auth.register(request)).await.map(Json)
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = state.services.auth.clone();
    blocking(move || auth.login(request)).await.map(Json)
}

pub async fn me(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<PublicUser>> {
    let auth = state.services.auth.clone();
    blocking(move || auth.me(&user_id)).await.map(Json)
}

// ---- pages ----

pub async fn create_page(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(new): ApiJson<NewPage>,
) -> Result<Json<Page>> {
    let pages = state.services.pages.clone();
    blocking(move || pages.create_page(&user_id, new)).await.map(Json)
}

pub async fn list_pages(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<Vec<Page>>> {
    let pages = state.services.pages.clone();
    blocking(move || pages.list_pages(&user_id)).await.map(Json)
}

pub async fn get_page(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(page_id): Path<String>,
) -> Result<Json<Page>> {
    let pages = state.services.pages.clone();
    blocking(move || pages.get_page(&user_id, &page_id)).await.map(Json)
}

pub async fn update_page(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(page_id): Path<String>,
    ApiJson(patch): ApiJson<PagePatch>,
) -> Result<Json<Page>> {
    let pages = state.services.pages.clone();
    blocking(move || pages.update_page(&user_id, &page_id, patch))
        .await
        .map(Json)
}

pub async fn delete_page(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(page_id): Path<String>,
) -> Result<Json<Value>> {
    let pages = state.services.pages.clone();
    blocking(move || pages.delete_page(&user_id, &page_id)).await?;
    Ok(message("Page deleted"))
}

// ---- blocks ----

pub async fn create_block(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(new): ApiJson<NewBlock>,
) -> Result<Json<Block>> {
    let pages = state.services.pages.clone();
    blocking(move || pages.create_block(&user_id, new)).await.map(Json)
}

/// `GET /api/blocks/{page_id}`: the path segment names a page.
pub async fn list_blocks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(page_id): Path<String>,
) -> Result<Json<Vec<Block>>> {
    let pages = state.services.pages.clone();
    blocking(move || pages.list_blocks(&user_id, &page_id)).await.map(Json)
}

pub async fn update_block(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(block_id): Path<String>,
    ApiJson(patch): ApiJson<BlockPatch>,
) -> Result<Json<Block>> {
    let pages = state.services.pages.clone();
    blocking(move || pages.update_block(&user_id, &block_id, patch))
        .await
        .map(Json)
}

pub async fn delete_block(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(block_id): Path<String>,
) -> Result<Json<Value>> {
    let pages = state.services.pages.clone();
    blocking(move || pages.delete_block(&user_id, &block_id)).await?;
    Ok(message("Block deleted"))
}

// ---- llm ----

pub async fn assist(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    ApiJson(request): ApiJson<AssistRequest>,
) -> Result<Json<AssistResponse>> {
    let assist = state.services.assist.clone();
    blocking(move || assist.assist(&request)).await.map(Json)
}

pub async fn converse(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(request): ApiJson<ConverseRequest>,
) -> Result<Json<ConverseResponse>> {
    let conversation = state.services.conversation.clone();
    blocking(move || conversation.converse(&user_id, &request))
        .await
        .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct InsightsQuery {
    model: Option<String>,
}

pub async fn insights(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<InsightsQuery>,
) -> Result<Json<PatternInsights>> {
    let model = match query.model.as_deref() {
        Some(name) => ModelPreference::parse(name)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown model: {name}")))?,
        None => state.services.default_model,
    };
    let insights = state.services.insights.clone();
    blocking(move || insights.insights(&user_id, model)).await.map(Json)
}

// ---- nodes ----

pub async fn list_nodes(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<Vec<Node>>> {
    let nodes = state.services.nodes.clone();
    blocking(move || nodes.list(&user_id, None)).await.map(Json)
}

/// `GET /api/nodes/{frequency}`.
pub async fn list_frequency_nodes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(frequency): Path<String>,
) -> Result<Json<Vec<Node>>> {
    let frequency = parse_frequency(&frequency)?;
    let nodes = state.services.nodes.clone();
    blocking(move || nodes.list(&user_id, Some(frequency)))
        .await
        .map(Json)
}

pub async fn update_node(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(node_id): Path<String>,
    ApiJson(patch): ApiJson<NodePatch>,
) -> Result<Json<Node>> {
    let nodes = state.services.nodes.clone();
    blocking(move || nodes.update(&user_id, &NodeId::new(node_id), patch))
        .await
        .map(Json)
}

pub async fn delete_node(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(node_id): Path<String>,
) -> Result<Json<Value>> {
    let nodes = state.services.nodes.clone();
    blocking(move || nodes.delete(&user_id, &NodeId::new(node_id))).await?;
    Ok(message("Node deleted"))
}

// ---- archives ----

#[derive(Debug, Deserialize)]
pub struct ArchiveRequest {
    frequency: String,
}

pub async fn archive(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(request): ApiJson<ArchiveRequest>,
) -> Result<Json<ArchiveOutcome>> {
    let frequency = parse_frequency(&request.frequency)?;
    let archive = state.services.archive.clone();
    blocking(move || archive.archive_frequency(&user_id, frequency))
        .await
        .map(Json)
}

pub async fn list_archives(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ArchiveSummary>>> {
    let archive = state.services.archive.clone();
    blocking(move || archive.list(&user_id)).await.map(Json)
}

pub async fn get_archive(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(archive_id): Path<String>,
) -> Result<Json<ArchiveRecord>> {
    let archive = state.services.archive.clone();
    blocking(move || archive.get(&user_id, &archive_id)).await.map(Json)
}

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    #[serde(default)]
    node_ids: Vec<NodeId>,
}

#[derive(Debug, Serialize)]
pub struct RestoreResponse {
    restored: usize,
    nodes: Vec<Node>,
}

pub async fn restore(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(archive_id): Path<String>,
    ApiJson(request): ApiJson<RestoreRequest>,
) -> Result<Json<RestoreResponse>> {
    let archive = state.services.archive.clone();
    let nodes = blocking(move || archive.restore(&user_id, &archive_id, &request.node_ids)).await?;
    Ok(Json(RestoreResponse {
        restored: nodes.len(),
        nodes,
    }))
}
