use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiResult, Envelope};
use crate::models::auth::AuthenticatedIdentity;
use crate::models::profile::Profile;
use crate::models::relationship::CoachingRelationship;
use crate::models::roster::{AllClientsResponse, RosterSnapshot};
use crate::services::relationships::RelationshipLedger;
use crate::services::roster::RosterBuilder;
use crate::services::status::StatusFlow;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RejectClientRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignCoachRequest {
    pub coach_id: Uuid,
}

/// GET /clients — every client in the practice plus the coaches they can be
/// assigned to. Admin only.
pub async fn list_all_clients(
    State(state): State<AppState>,
    caller: AuthenticatedIdentity,
) -> ApiResult<AllClientsResponse> {
    let directory = RosterBuilder::list_all_clients(&state.stores, &caller).await?;
    Ok(Envelope::ok(directory))
}

/// GET /coach/clients — the caller's own active roster.
pub async fn list_coach_clients(
    State(state): State<AppState>,
    caller: AuthenticatedIdentity,
) -> ApiResult<Vec<RosterSnapshot>> {
    let roster = RosterBuilder::list_coach_clients(&state.stores, &caller).await?;
    Ok(Envelope::ok(roster))
}

/// POST /clients/{id}/approve — mark the client approved and clear any
/// earlier rejection reason.
pub async fn approve_client(
    State(state): State<AppState>,
    caller: AuthenticatedIdentity,
    Path(client_id): Path<Uuid>,
) -> ApiResult<Profile> {
    let profile = StatusFlow::approve(&state.stores, &caller, client_id).await?;
    Ok(Envelope::ok(profile))
}

/// POST /clients/{id}/reject — mark the client rejected. An empty or missing
/// reason falls back to the standard one.
pub async fn reject_client(
    State(state): State<AppState>,
    caller: AuthenticatedIdentity,
    Path(client_id): Path<Uuid>,
    Json(req): Json<RejectClientRequest>,
) -> ApiResult<Profile> {
    let profile =
        StatusFlow::reject(&state.stores, &caller, client_id, req.reason.as_deref()).await?;
    Ok(Envelope::ok(profile))
}

/// POST /clients/{id}/coach — move the client to the given coach, ending
/// whatever active relationship the client had before.
pub async fn assign_coach(
    State(state): State<AppState>,
    caller: AuthenticatedIdentity,
    Path(client_id): Path<Uuid>,
    Json(req): Json<AssignCoachRequest>,
) -> ApiResult<CoachingRelationship> {
    let relationship =
        RelationshipLedger::assign(&state.stores, &caller, client_id, req.coach_id).await?;
    Ok(Envelope::ok(relationship))
}

/// DELETE /clients/{id}/coach — end the active relationship if one exists.
/// Unassigning an unassigned client is a no-op, not an error.
pub async fn unassign_coach(
    State(state): State<AppState>,
    caller: AuthenticatedIdentity,
    Path(client_id): Path<Uuid>,
) -> ApiResult<Option<CoachingRelationship>> {
    let ended = RelationshipLedger::unassign(&state.stores, &caller, client_id).await?;
    Ok(Envelope::ok(ended))
}
