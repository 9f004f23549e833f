use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, ENDPOINTS};
use crate::app::{AppState, ServiceStatus};
use crate::domain::{MatchId, MatchRecord};
use crate::store::Lookup;

const DEFAULT_CHANGES_LIMIT: usize = 50;
const MAX_CHANGES_LIMIT: usize = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct MatchFilter {
    /// Case-insensitive substring of either team name.
    pub team: Option<String>,
    pub in_play: Option<bool>,
}

impl MatchFilter {
    fn accepts(&self, record: &MatchRecord) -> bool {
        let team_ok = self
            .team
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map_or(true, |t| record.involves_team(t));
        let in_play_ok = self.in_play.map_or(true, |want| record.in_play == want);
        team_ok && in_play_ok
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangesQuery {
    pub limit: Option<usize>,
}

pub async fn index() -> Json<Value> {
    Json(json!({
        "name": "oddsfeed",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ENDPOINTS,
    }))
}

pub async fn ping() -> &'static str {
    "pong"
}

pub async fn status(State(state): State<AppState>) -> Json<ServiceStatus> {
    Json(state.status())
}

pub async fn list_matches(
    State(state): State<AppState>,
    Query(filter): Query<MatchFilter>,
) -> Json<Value> {
    let snapshot = state.store().read_snapshot();
    let matches: Vec<&MatchRecord> = snapshot
        .matches
        .iter()
        .filter(|m| filter.accepts(m))
        .collect();
    Json(json!({
        "timestamp": snapshot.captured_at,
        "count": matches.len(),
        "matches": matches,
    }))
}

pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.store().find_by_id(&MatchId::new(id.as_str())) {
        Lookup::Found(record) => Ok(Json(record).into_response()),
        Lookup::Moved {
            record,
            resolved_id,
        } => {
            let location = format!("/api/matches/{resolved_id}");
            Ok((
                StatusCode::MOVED_PERMANENTLY,
                [(header::LOCATION, location)],
                Json(record),
            )
                .into_response())
        }
        Lookup::NotFound => Err(ApiError::MatchNotFound { id }),
    }
}

pub async fn match_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let match_id = MatchId::new(id.as_str());
    let lookup = state.store().find_by_id(&match_id);
    let history = state.store().history(&match_id);
    if history.is_empty() && lookup.record().is_none() {
        return Err(ApiError::MatchNotFound { id });
    }
    let resolved = lookup
        .record()
        .map(|r| r.id.clone())
        .unwrap_or(match_id);
    Ok(Json(json!({
        "match_id": resolved,
        "count": history.len(),
        "history": history,
    })))
}

pub async fn recent_changes(
    State(state): State<AppState>,
    Query(query): Query<ChangesQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_CHANGES_LIMIT);
    if limit == 0 || limit > MAX_CHANGES_LIMIT {
        return Err(ApiError::InvalidParameter {
            name: "limit",
            reason: format!("must be between 1 and {MAX_CHANGES_LIMIT}"),
        });
    }
    let changes = state.store().recent_changes(limit);
    Ok(Json(json!({
        "count": changes.len(),
        "changes": changes,
    })))
}

pub async fn refresh(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    state.request_refresh();
    (
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "refresh_triggered",
            "message": "A scrape cycle has been scheduled",
        })),
    )
}
