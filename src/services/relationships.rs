//! Relationship Ledger: coach↔client assignment state and its lifecycle.
//! The at-most-one-active-relationship-per-client invariant is enforced by
//! the store's atomic assign command; this layer adds the capability checks
//! and referent validation.

use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::require_role;
use crate::models::auth::AuthenticatedIdentity;
use crate::models::identity::Role;
use crate::models::relationship::{CoachingRelationship, RelationshipFilter};
use crate::stores::Stores;

use super::metrics;

pub struct RelationshipLedger;

impl RelationshipLedger {
    /// Make `coach_id` the client's one active coach. Whatever relationship
    /// was active before ends first; a repeated (coach, client) pair reuses
    /// its existing row.
    pub async fn assign(
        stores: &Stores,
        caller: &AuthenticatedIdentity,
        client_id: Uuid,
        coach_id: Uuid,
    ) -> Result<CoachingRelationship, ApiError> {
        require_role(caller, &[Role::Coach, Role::Admin])?;

        if stores.bounded(stores.profiles.get(client_id)).await?.is_none() {
            return Err(ApiError::NotFound("Klant niet gevonden".to_string()));
        }
        let coach_exists = stores
            .bounded(stores.identities.list_by_ids(&[coach_id]))
            .await?
            .iter()
            .any(|i| matches!(i.role, Role::Coach | Role::Admin));
        if !coach_exists {
            return Err(ApiError::NotFound("Coach niet gevonden".to_string()));
        }

        let relationship = stores
            .bounded(stores.relationships.assign_active(coach_id, client_id, Utc::now()))
            .await?;
        metrics::COACH_ASSIGNMENTS.with_label_values(&["assigned"]).inc();
        tracing::info!(%client_id, %coach_id, "coach assigned");
        Ok(relationship)
    }

    /// End the client's active relationship. `Ok(None)` when there was none.
    pub async fn unassign(
        stores: &Stores,
        caller: &AuthenticatedIdentity,
        client_id: Uuid,
    ) -> Result<Option<CoachingRelationship>, ApiError> {
        require_role(caller, &[Role::Coach, Role::Admin])?;
        let ended = stores
            .bounded(stores.relationships.end_active(client_id, Utc::now()))
            .await?;
        if let Some(relationship) = &ended {
            metrics::COACH_ASSIGNMENTS.with_label_values(&["unassigned"]).inc();
            tracing::info!(%client_id, coach_id = %relationship.coach_id, "coach unassigned");
        }
        Ok(ended)
    }

    /// Client ids with an active relationship to this coach.
    pub async fn active_client_ids(
        stores: &Stores,
        coach_id: Uuid,
    ) -> Result<Vec<Uuid>, ApiError> {
        let relationships = stores
            .bounded(
                stores
                    .relationships
                    .list(RelationshipFilter::active_for_coach(coach_id)),
            )
            .await?;
        Ok(relationships.into_iter().map(|r| r.client_id).collect())
    }
}
