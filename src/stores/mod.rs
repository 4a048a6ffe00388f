//! Store contracts for every collaborator the aggregation core reads or
//! writes. Services depend on these traits only; `postgres` holds the sqlx
//! implementations and tests substitute in-memory fakes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::checkin::{DailyCheckin, WeeklyCheckin};
use crate::models::enrollment::ProgramEnrollment;
use crate::models::identity::{Identity, Role};
use crate::models::profile::{ClientStatus, Profile};
use crate::models::relationship::{
    CoachingRelationship, NewRelationship, RelationshipFilter,
};
use crate::models::session::Session;

pub mod postgres;

/// Failure of a store call. Absence is expressed as `Option::None` or an
/// empty `Vec` at the call site, never through this type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store call timed out after {0} ms")]
    Timeout(u64),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed row: {0}")]
    Malformed(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Malformed(e.to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Offset page for directory listings.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const fn first(limit: i64) -> Self {
        Self { limit, offset: 0 }
    }

    pub const fn next(&self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset + self.limit,
        }
    }
}

/// Read-only identity directory.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// List identities holding a role, one offset page at a time.
    async fn list_by_role(&self, role: Role, page: Page) -> StoreResult<Vec<Identity>>;

    /// Fetch the identities for an id set; unknown ids are skipped.
    async fn list_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Identity>>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn list_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Profile>>;

    async fn get(&self, user_id: Uuid) -> StoreResult<Option<Profile>>;

    /// Set the review status in one atomic update, stamping who decided and
    /// when. `None` when no profile exists for the id.
    async fn update_client_status(
        &self,
        user_id: Uuid,
        status: ClientStatus,
        reason: Option<&str>,
        updated_by: Uuid,
    ) -> StoreResult<Option<Profile>>;
}

/// Coach↔client assignment ledger.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    async fn list(&self, filter: RelationshipFilter) -> StoreResult<Vec<CoachingRelationship>>;

    /// Insert a fresh Active row for the pair.
    async fn insert(&self, new: NewRelationship) -> StoreResult<CoachingRelationship>;

    /// End the client's Active relationship if one exists.
    async fn end_active(
        &self,
        client_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<CoachingRelationship>>;

    /// End whatever is Active for the client, then reactivate the existing
    /// (coach, client) row or insert a fresh one. Must run as a single
    /// atomic command: two concurrent calls for one client serialize, and
    /// afterwards exactly one Active row exists for that client.
    async fn assign_active(
        &self,
        coach_id: Uuid,
        client_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<CoachingRelationship>;
}

#[async_trait]
pub trait WeeklyCheckinStore: Send + Sync {
    /// Most recent check-ins across the id set, newest first.
    async fn list_recent(&self, ids: &[Uuid], limit: i64) -> StoreResult<Vec<WeeklyCheckin>>;

    /// The single newest check-in per client in the id set.
    async fn latest_per_client(&self, ids: &[Uuid]) -> StoreResult<Vec<WeeklyCheckin>>;

    async fn count_since(&self, ids: &[Uuid], since: DateTime<Utc>) -> StoreResult<i64>;
}

#[async_trait]
pub trait DailyCheckinStore: Send + Sync {
    /// Most recent logs across the id set, newest first.
    async fn list_recent(&self, ids: &[Uuid], limit: i64) -> StoreResult<Vec<DailyCheckin>>;

    /// The newest `per_client` logs per client, newest first within each
    /// client. The trend derivation asks for two.
    async fn latest_per_client(
        &self,
        ids: &[Uuid],
        per_client: i64,
    ) -> StoreResult<Vec<DailyCheckin>>;

    async fn count_since(&self, ids: &[Uuid], since: DateTime<Utc>) -> StoreResult<i64>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Earliest not-cancelled session at or after `after`, one per client.
    async fn next_per_client(
        &self,
        ids: &[Uuid],
        after: DateTime<Utc>,
    ) -> StoreResult<Vec<Session>>;

    async fn list_upcoming_for_coach(
        &self,
        coach_id: Uuid,
        after: DateTime<Utc>,
        limit: i64,
    ) -> StoreResult<Vec<Session>>;

    async fn count_between(
        &self,
        coach_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<i64>;
}

#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Active program enrollments for the id set; at most one per client.
    async fn list_active(&self, ids: &[Uuid]) -> StoreResult<Vec<ProgramEnrollment>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn count_unread(&self, user_id: Uuid) -> StoreResult<i64>;
}

/// Store handles injected into the services. Cloning is cheap; tests build
/// one of these over in-memory fakes.
#[derive(Clone)]
pub struct Stores {
    pub identities: Arc<dyn IdentityStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub relationships: Arc<dyn RelationshipStore>,
    pub weekly_checkins: Arc<dyn WeeklyCheckinStore>,
    pub daily_checkins: Arc<dyn DailyCheckinStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub enrollments: Arc<dyn EnrollmentStore>,
    pub messages: Arc<dyn MessageStore>,
    pub call_timeout: Duration,
}

impl Stores {
    /// Bound a store call by the configured timeout. A timed-out branch is
    /// indistinguishable from a failed one for callers.
    pub async fn bounded<T>(
        &self,
        fut: impl Future<Output = StoreResult<T>> + Send,
    ) -> StoreResult<T> {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(StoreError::Timeout(self.call_timeout.as_millis() as u64)),
        }
    }
}
