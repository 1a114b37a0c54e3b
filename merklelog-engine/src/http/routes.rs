//! The queue HTTP surface (spec §6.1): CBOR `pull`/`ack`, JSON
//! `stats`/`shards`/`debug/recent`.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;

use merklelog_queue::dto::{AckRequest, LatencySummary, PullRequest, QueueStats, ShardInfo, ShardsResponse};

use super::cbor::Cbor;
use super::problem::{problem_response, queue_error_response};
use super::state::{EngineState, now_ms};

/// Build the router. The caller mounts it wherever it likes (spec §6.1
/// gives paths relative to some unspecified root).
pub fn router(state: Arc<EngineState>) -> Router {
    Router::new()
        .route("/queue/pull", post(pull))
        .route("/queue/ack", post(ack))
        .route("/queue/stats", get(stats))
        .route("/queue/shards", get(shards))
        .route("/queue/debug/recent", get(debug_recent))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Deserialize)]
struct ShardQuery {
    shard: u32,
}

fn out_of_range(shard: u32) -> Response {
    problem_response(
        StatusCode::BAD_REQUEST,
        "invalid-request",
        "Invalid Request",
        Some(format!("shard {shard} is out of range")),
    )
}

async fn pull(
    State(state): State<Arc<EngineState>>,
    Query(q): Query<ShardQuery>,
    Cbor(req): Cbor<PullRequest>,
) -> Response {
    let Some(shard) = state.shard(q.shard) else {
        return out_of_range(q.shard);
    };
    let mut shard = shard.lock().await;
    match shard.pull(req, now_ms()) {
        Ok(resp) => Cbor(resp).into_response(),
        Err(e) => queue_error_response(e),
    }
}

async fn ack(
    State(state): State<Arc<EngineState>>,
    Query(q): Query<ShardQuery>,
    Cbor(req): Cbor<AckRequest>,
) -> Response {
    let Some(shard) = state.shard(q.shard) else {
        return out_of_range(q.shard);
    };
    let mut shard = shard.lock().await;
    match shard.ack(req, now_ms()) {
        Ok(resp) => Cbor(resp).into_response(),
        Err(e) => queue_error_response(e),
    }
}

/// `GET /queue/stats`: no `shard` parameter in spec §6.1, so this
/// aggregates every shard's point-in-time summary (Open Question decision,
/// `DESIGN.md`).
async fn stats(State(state): State<Arc<EngineState>>) -> axum::Json<QueueStats> {
    let now = now_ms();
    let mut pending = 0u64;
    let mut dead_letters = 0u64;
    let mut oldest_entry_age_ms: Option<u64> = None;
    let mut active_pollers = 0u64;
    let mut poller_limit_reached = false;
    for shard in &state.shards {
        let shard = shard.lock().await;
        let s = shard.stats(now);
        pending += s.pending;
        dead_letters += s.dead_letters;
        oldest_entry_age_ms = match (oldest_entry_age_ms, s.oldest_entry_age_ms) {
            (None, age) => age,
            (age, None) => age,
            (Some(a), Some(b)) => Some(a.max(b)),
        };
        active_pollers += s.active_pollers;
        poller_limit_reached |= s.poller_limit_reached;
    }
    axum::Json(QueueStats { pending, dead_letters, oldest_entry_age_ms, active_pollers, poller_limit_reached })
}

async fn shards(State(state): State<Arc<EngineState>>) -> axum::Json<ShardsResponse> {
    let mut shards = Vec::with_capacity(state.shards.len());
    for (index, shard) in state.shards.iter().enumerate() {
        let shard = shard.lock().await;
        shards.push(ShardInfo { index: index as u32, pending_count: shard.pending_count() });
    }
    axum::Json(ShardsResponse {
        count: state.config.shard_count,
        pull_url_template: "/queue/pull?shard={shard}".to_string(),
        ack_url_template: "/queue/ack?shard={shard}".to_string(),
        shards,
    })
}

#[derive(Deserialize)]
struct DebugRecentQuery {
    limit: usize,
    shard: Option<u32>,
}

#[derive(serde::Serialize)]
struct DebugRecentResponse {
    entries: Vec<merklelog_queue::dto::RecentEntryView>,
    latency_summary: Option<LatencySummary>,
}

async fn debug_recent(
    State(state): State<Arc<EngineState>>,
    Query(q): Query<DebugRecentQuery>,
) -> Response {
    let entries = match q.shard {
        Some(index) => {
            let Some(shard) = state.shard(index) else {
                return out_of_range(index);
            };
            shard.lock().await.recent_entries(q.limit)
        }
        None => {
            let mut merged = Vec::new();
            for shard in &state.shards {
                merged.extend(shard.lock().await.recent_entries(q.limit));
            }
            merged.sort_by(|a, b| b.enqueued_at_ms.cmp(&a.enqueued_at_ms));
            merged.truncate(q.limit);
            merged
        }
    };
    let samples: Vec<u64> = entries.iter().filter_map(|e| e.sequencing_latency_ms).collect();
    let latency_summary = LatencySummary::from_samples(&samples);
    axum::Json(DebugRecentResponse { entries, latency_summary }).into_response()
}
