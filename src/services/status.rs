//! Status Derivation: the approval lifecycle (approve/reject) and the
//! display ordering a mixed roster is shown in.

use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::require_role;
use crate::models::auth::AuthenticatedIdentity;
use crate::models::identity::Role;
use crate::models::profile::{ClientStatus, Profile};
use crate::models::roster::RosterSnapshot;
use crate::stores::Stores;

use super::metrics;

/// Stored when a coach rejects without giving a reason.
pub const DEFAULT_REJECTION_REASON: &str = "Afgewezen door coach";

pub struct StatusFlow;

impl StatusFlow {
    /// Approve a client, clearing any rejection reason. Valid from Pending
    /// and from Rejected (reconsideration).
    pub async fn approve(
        stores: &Stores,
        caller: &AuthenticatedIdentity,
        client_id: Uuid,
    ) -> Result<Profile, ApiError> {
        require_role(caller, &[Role::Coach, Role::Admin])?;
        let profile = stores
            .bounded(stores.profiles.update_client_status(
                client_id,
                ClientStatus::Approved,
                None,
                caller.user_id,
            ))
            .await?
            .ok_or_else(|| ApiError::NotFound("Klant niet gevonden".to_string()))?;
        metrics::STATUS_DECISIONS.with_label_values(&["approved"]).inc();
        tracing::info!(%client_id, approved_by = %caller.user_id, "client approved");
        Ok(profile)
    }

    /// Reject a client. An empty or whitespace reason is not an error; it
    /// is normalized to the default reason.
    pub async fn reject(
        stores: &Stores,
        caller: &AuthenticatedIdentity,
        client_id: Uuid,
        reason: Option<&str>,
    ) -> Result<Profile, ApiError> {
        require_role(caller, &[Role::Coach, Role::Admin])?;
        let reason = Self::normalize_reason(reason);
        let profile = stores
            .bounded(stores.profiles.update_client_status(
                client_id,
                ClientStatus::Rejected,
                Some(&reason),
                caller.user_id,
            ))
            .await?
            .ok_or_else(|| ApiError::NotFound("Klant niet gevonden".to_string()))?;
        metrics::STATUS_DECISIONS.with_label_values(&["rejected"]).inc();
        tracing::info!(%client_id, rejected_by = %caller.user_id, "client rejected");
        Ok(profile)
    }

    pub fn normalize_reason(reason: Option<&str>) -> String {
        match reason.map(str::trim) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => DEFAULT_REJECTION_REASON.to_string(),
        }
    }

    /// Partition a roster into the fixed order Pending, Rejected, Approved.
    /// The sort is stable: fetch order survives inside each partition.
    pub fn display_order(clients: &mut [RosterSnapshot]) {
        clients.sort_by_key(|c| Self::status_rank(c.status));
    }

    const fn status_rank(status: ClientStatus) -> u8 {
        match status {
            ClientStatus::Pending => 0,
            ClientStatus::Rejected => 1,
            ClientStatus::Approved => 2,
        }
    }
}
