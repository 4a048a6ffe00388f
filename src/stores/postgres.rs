//! sqlx implementations of the store contracts, all backed by one Postgres
//! pool. Enum-bearing rows land in private row structs first and parse
//! fail-closed: a row that does not parse is dropped with a warning (lists)
//! or surfaced as `StoreError::Malformed` (single-row commands).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::checkin::{DailyCheckin, WeeklyCheckin};
use crate::models::enrollment::ProgramEnrollment;
use crate::models::identity::{Identity, Role};
use crate::models::profile::{ClientStatus, Profile};
use crate::models::relationship::{
    CoachingRelationship, NewRelationship, RelationshipFilter,
};
use crate::models::session::Session;

use super::{
    DailyCheckinStore, EnrollmentStore, IdentityStore, MessageStore, Page, ProfileStore,
    RelationshipStore, SessionStore, StoreError, StoreResult, Stores, WeeklyCheckinStore,
};

/// Wire every store contract to one Postgres pool.
pub fn postgres_stores(pool: &PgPool, call_timeout: Duration) -> Stores {
    Stores {
        identities: Arc::new(PgIdentityStore { pool: pool.clone() }),
        profiles: Arc::new(PgProfileStore { pool: pool.clone() }),
        relationships: Arc::new(PgRelationshipStore { pool: pool.clone() }),
        weekly_checkins: Arc::new(PgWeeklyCheckinStore { pool: pool.clone() }),
        daily_checkins: Arc::new(PgDailyCheckinStore { pool: pool.clone() }),
        sessions: Arc::new(PgSessionStore { pool: pool.clone() }),
        enrollments: Arc::new(PgEnrollmentStore { pool: pool.clone() }),
        messages: Arc::new(PgMessageStore { pool: pool.clone() }),
        call_timeout,
    }
}

/// Parse a list of raw rows, dropping the ones that do not fit the domain
/// type. The roster must survive a single bad row in a collaborator table.
fn collect_rows<R, T>(rows: Vec<R>, store: &'static str) -> Vec<T>
where
    T: TryFrom<R, Error = anyhow::Error>,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(store, error = %e, "dropping malformed row");
                None
            }
        })
        .collect()
}

/// Parse the single row a command returned. Here a bad row is an error, not
/// a drop: the write happened and the caller must know its outcome.
fn parse_row<R, T>(row: R) -> StoreResult<T>
where
    T: TryFrom<R, Error = anyhow::Error>,
{
    T::try_from(row).map_err(|e| StoreError::Malformed(e.to_string()))
}

#[derive(Debug, FromRow)]
struct IdentityRow {
    id: Uuid,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = anyhow::Error;

    fn try_from(r: IdentityRow) -> Result<Self, Self::Error> {
        Ok(Identity {
            id: r.id,
            email: r.email,
            role: r.role.parse()?,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    user_id: Uuid,
    first_name: Option<String>,
    last_name: Option<String>,
    avatar_url: Option<String>,
    client_status: String,
    rejection_reason: Option<String>,
    status_updated_at: Option<DateTime<Utc>>,
    status_updated_by: Option<Uuid>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = anyhow::Error;

    fn try_from(r: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            user_id: r.user_id,
            first_name: r.first_name,
            last_name: r.last_name,
            avatar_url: r.avatar_url,
            client_status: r.client_status.parse()?,
            rejection_reason: r.rejection_reason,
            status_updated_at: r.status_updated_at,
            status_updated_by: r.status_updated_by,
        })
    }
}

#[derive(Debug, FromRow)]
struct RelationshipRow {
    id: Uuid,
    coach_id: Uuid,
    client_id: Uuid,
    status: String,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl TryFrom<RelationshipRow> for CoachingRelationship {
    type Error = anyhow::Error;

    fn try_from(r: RelationshipRow) -> Result<Self, Self::Error> {
        Ok(CoachingRelationship {
            id: r.id,
            coach_id: r.coach_id,
            client_id: r.client_id,
            status: r.status.parse()?,
            started_at: r.started_at,
            ended_at: r.ended_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    coach_id: Uuid,
    client_id: Uuid,
    start_time: DateTime<Utc>,
    session_type: String,
    status: String,
    mode: String,
}

impl TryFrom<SessionRow> for Session {
    type Error = anyhow::Error;

    fn try_from(r: SessionRow) -> Result<Self, Self::Error> {
        Ok(Session {
            id: r.id,
            coach_id: r.coach_id,
            client_id: r.client_id,
            start_time: r.start_time,
            session_type: r.session_type,
            status: r.status.parse()?,
            mode: r.mode.parse()?,
        })
    }
}

#[derive(Debug, FromRow)]
struct EnrollmentRow {
    client_id: Uuid,
    program_name: String,
    status: String,
}

impl TryFrom<EnrollmentRow> for ProgramEnrollment {
    type Error = anyhow::Error;

    fn try_from(r: EnrollmentRow) -> Result<Self, Self::Error> {
        Ok(ProgramEnrollment {
            client_id: r.client_id,
            program_name: r.program_name,
            status: r.status.parse()?,
        })
    }
}

struct PgIdentityStore {
    pool: PgPool,
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn list_by_role(&self, role: Role, page: Page) -> StoreResult<Vec<Identity>> {
        let rows = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, email, role, created_at FROM users
             WHERE role = $1
             ORDER BY created_at
             LIMIT $2 OFFSET $3",
        )
        .bind(role.as_str())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(collect_rows(rows, "users"))
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Identity>> {
        let rows = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, email, role, created_at FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(collect_rows(rows, "users"))
    }
}

struct PgProfileStore {
    pool: PgPool,
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn list_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, first_name, last_name, avatar_url, client_status,
                    rejection_reason, status_updated_at, status_updated_by
             FROM profiles
             WHERE user_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(collect_rows(rows, "profiles"))
    }

    async fn get(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, first_name, last_name, avatar_url, client_status,
                    rejection_reason, status_updated_at, status_updated_by
             FROM profiles
             WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(parse_row).transpose()
    }

    async fn update_client_status(
        &self,
        user_id: Uuid,
        status: ClientStatus,
        reason: Option<&str>,
        updated_by: Uuid,
    ) -> StoreResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "UPDATE profiles
             SET client_status = $2,
                 rejection_reason = $3,
                 status_updated_at = NOW(),
                 status_updated_by = $4
             WHERE user_id = $1
             RETURNING user_id, first_name, last_name, avatar_url, client_status,
                       rejection_reason, status_updated_at, status_updated_by",
        )
        .bind(user_id)
        .bind(status.as_str())
        .bind(reason)
        .bind(updated_by)
        .fetch_optional(&self.pool)
        .await?;
        row.map(parse_row).transpose()
    }
}

struct PgRelationshipStore {
    pool: PgPool,
}

#[async_trait]
impl RelationshipStore for PgRelationshipStore {
    async fn list(&self, filter: RelationshipFilter) -> StoreResult<Vec<CoachingRelationship>> {
        let rows = sqlx::query_as::<_, RelationshipRow>(
            "SELECT id, coach_id, client_id, status, started_at, ended_at
             FROM coaching_relationships
             WHERE ($1::uuid IS NULL OR coach_id = $1)
               AND ($2::uuid IS NULL OR client_id = $2)
               AND ($3::text IS NULL OR status = $3)
             ORDER BY started_at",
        )
        .bind(filter.coach_id)
        .bind(filter.client_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(collect_rows(rows, "coaching_relationships"))
    }

    async fn insert(&self, new: NewRelationship) -> StoreResult<CoachingRelationship> {
        let row = sqlx::query_as::<_, RelationshipRow>(
            "INSERT INTO coaching_relationships (id, coach_id, client_id, status, started_at)
             VALUES ($1, $2, $3, 'active', $4)
             RETURNING id, coach_id, client_id, status, started_at, ended_at",
        )
        .bind(Uuid::new_v4())
        .bind(new.coach_id)
        .bind(new.client_id)
        .bind(new.started_at)
        .fetch_one(&self.pool)
        .await?;
        parse_row(row)
    }

    async fn end_active(
        &self,
        client_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<CoachingRelationship>> {
        let row = sqlx::query_as::<_, RelationshipRow>(
            "UPDATE coaching_relationships
             SET status = 'ended', ended_at = $2
             WHERE client_id = $1 AND status = 'active'
             RETURNING id, coach_id, client_id, status, started_at, ended_at",
        )
        .bind(client_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(parse_row).transpose()
    }

    async fn assign_active(
        &self,
        coach_id: Uuid,
        client_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<CoachingRelationship> {
        let mut tx = self.pool.begin().await?;

        // Concurrent assigns for one client queue on this lock; the partial
        // unique index on active rows catches anything that slips past it.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(client_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE coaching_relationships
             SET status = 'ended', ended_at = $2
             WHERE client_id = $1 AND status = 'active'",
        )
        .bind(client_id)
        .bind(at)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, RelationshipRow>(
            "INSERT INTO coaching_relationships (id, coach_id, client_id, status, started_at)
             VALUES ($1, $2, $3, 'active', $4)
             ON CONFLICT (coach_id, client_id)
             DO UPDATE SET status = 'active', started_at = EXCLUDED.started_at, ended_at = NULL
             RETURNING id, coach_id, client_id, status, started_at, ended_at",
        )
        .bind(Uuid::new_v4())
        .bind(coach_id)
        .bind(client_id)
        .bind(at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        parse_row(row)
    }
}

struct PgWeeklyCheckinStore {
    pool: PgPool,
}

#[async_trait]
impl WeeklyCheckinStore for PgWeeklyCheckinStore {
    async fn list_recent(&self, ids: &[Uuid], limit: i64) -> StoreResult<Vec<WeeklyCheckin>> {
        let checkins = sqlx::query_as::<_, WeeklyCheckin>(
            "SELECT id, user_id, submitted_at, weight_kg, coach_feedback, notes
             FROM weekly_checkins
             WHERE user_id = ANY($1)
             ORDER BY submitted_at DESC
             LIMIT $2",
        )
        .bind(ids)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(checkins)
    }

    async fn latest_per_client(&self, ids: &[Uuid]) -> StoreResult<Vec<WeeklyCheckin>> {
        let checkins = sqlx::query_as::<_, WeeklyCheckin>(
            "SELECT DISTINCT ON (user_id)
                    id, user_id, submitted_at, weight_kg, coach_feedback, notes
             FROM weekly_checkins
             WHERE user_id = ANY($1)
             ORDER BY user_id, submitted_at DESC",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(checkins)
    }

    async fn count_since(&self, ids: &[Uuid], since: DateTime<Utc>) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM weekly_checkins
             WHERE user_id = ANY($1) AND submitted_at >= $2",
        )
        .bind(ids)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

struct PgDailyCheckinStore {
    pool: PgPool,
}

#[async_trait]
impl DailyCheckinStore for PgDailyCheckinStore {
    async fn list_recent(&self, ids: &[Uuid], limit: i64) -> StoreResult<Vec<DailyCheckin>> {
        let checkins = sqlx::query_as::<_, DailyCheckin>(
            "SELECT id, user_id, logged_at, weight_kg, coach_feedback, mood
             FROM daily_checkins
             WHERE user_id = ANY($1)
             ORDER BY logged_at DESC
             LIMIT $2",
        )
        .bind(ids)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(checkins)
    }

    async fn latest_per_client(
        &self,
        ids: &[Uuid],
        per_client: i64,
    ) -> StoreResult<Vec<DailyCheckin>> {
        let checkins = sqlx::query_as::<_, DailyCheckin>(
            "SELECT id, user_id, logged_at, weight_kg, coach_feedback, mood
             FROM (SELECT *, ROW_NUMBER() OVER (PARTITION BY user_id ORDER BY logged_at DESC) AS rn
                   FROM daily_checkins
                   WHERE user_id = ANY($1)) ranked
             WHERE rn <= $2
             ORDER BY user_id, logged_at DESC",
        )
        .bind(ids)
        .bind(per_client)
        .fetch_all(&self.pool)
        .await?;
        Ok(checkins)
    }

    async fn count_since(&self, ids: &[Uuid], since: DateTime<Utc>) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM daily_checkins
             WHERE user_id = ANY($1) AND logged_at >= $2",
        )
        .bind(ids)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

struct PgSessionStore {
    pool: PgPool,
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn next_per_client(
        &self,
        ids: &[Uuid],
        after: DateTime<Utc>,
    ) -> StoreResult<Vec<Session>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            "SELECT DISTINCT ON (client_id)
                    id, coach_id, client_id, start_time, session_type, status, mode
             FROM sessions
             WHERE client_id = ANY($1) AND start_time >= $2 AND status <> 'cancelled'
             ORDER BY client_id, start_time",
        )
        .bind(ids)
        .bind(after)
        .fetch_all(&self.pool)
        .await?;
        Ok(collect_rows(rows, "sessions"))
    }

    async fn list_upcoming_for_coach(
        &self,
        coach_id: Uuid,
        after: DateTime<Utc>,
        limit: i64,
    ) -> StoreResult<Vec<Session>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            "SELECT id, coach_id, client_id, start_time, session_type, status, mode
             FROM sessions
             WHERE coach_id = $1 AND start_time >= $2 AND status <> 'cancelled'
             ORDER BY start_time
             LIMIT $3",
        )
        .bind(coach_id)
        .bind(after)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(collect_rows(rows, "sessions"))
    }

    async fn count_between(
        &self,
        coach_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sessions
             WHERE coach_id = $1 AND start_time >= $2 AND start_time < $3
               AND status <> 'cancelled'",
        )
        .bind(coach_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

struct PgEnrollmentStore {
    pool: PgPool,
}

#[async_trait]
impl EnrollmentStore for PgEnrollmentStore {
    async fn list_active(&self, ids: &[Uuid]) -> StoreResult<Vec<ProgramEnrollment>> {
        let rows = sqlx::query_as::<_, EnrollmentRow>(
            "SELECT client_id, program_name, status
             FROM program_enrollments
             WHERE client_id = ANY($1) AND status = 'active'",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(collect_rows(rows, "program_enrollments"))
    }
}

struct PgMessageStore {
    pool: PgPool,
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn count_unread(&self, user_id: Uuid) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages
             WHERE recipient_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
