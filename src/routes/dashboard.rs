use axum::extract::{Query, State};
use serde::Deserialize;

use crate::error::{ApiResult, Envelope};
use crate::middleware::auth::require_role;
use crate::models::auth::AuthenticatedIdentity;
use crate::models::checkin::CheckinFeedItem;
use crate::models::identity::Role;
use crate::models::roster::{ClientProgress, DashboardStats};
use crate::models::session::UpcomingSession;
use crate::services::checkins::CheckinAggregator;
use crate::services::dashboard::DashboardService;
use crate::services::relationships::RelationshipLedger;
use crate::AppState;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    fn clamped(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// GET /dashboard/stats — KPI counters for the overview screen.
pub async fn stats(
    State(state): State<AppState>,
    caller: AuthenticatedIdentity,
) -> ApiResult<DashboardStats> {
    let stats = DashboardService::stats(&state.stores, &caller).await?;
    Ok(Envelope::ok(stats))
}

/// GET /dashboard/checkins — newest check-ins across the caller's roster,
/// weekly and daily merged into one feed.
pub async fn recent_checkins(
    State(state): State<AppState>,
    caller: AuthenticatedIdentity,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<CheckinFeedItem>> {
    require_role(&caller, &[Role::Coach, Role::Admin])?;
    let client_ids =
        RelationshipLedger::active_client_ids(&state.stores, caller.user_id).await?;
    let feed =
        CheckinAggregator::recent_feed(&state.stores, &client_ids, query.clamped()).await?;
    Ok(Envelope::ok(feed))
}

/// GET /dashboard/sessions — the caller's next sessions, soonest first.
pub async fn upcoming_sessions(
    State(state): State<AppState>,
    caller: AuthenticatedIdentity,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<UpcomingSession>> {
    let sessions =
        DashboardService::upcoming_sessions(&state.stores, &caller, query.clamped()).await?;
    Ok(Envelope::ok(sessions))
}

/// GET /dashboard/progress — per-client program and weight trend rows.
pub async fn client_progress(
    State(state): State<AppState>,
    caller: AuthenticatedIdentity,
) -> ApiResult<Vec<ClientProgress>> {
    let progress = DashboardService::client_progress(&state.stores, &caller).await?;
    Ok(Envelope::ok(progress))
}
