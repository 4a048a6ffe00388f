//! In-memory fakes for every store contract, shared by the scenario tests.
//! One `World` behind a mutex backs all eight stores, with per-store
//! failure injection and call counters.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use uuid::Uuid;

use fitcoach_api::models::auth::AuthenticatedIdentity;
use fitcoach_api::models::checkin::{DailyCheckin, WeeklyCheckin};
use fitcoach_api::models::enrollment::{EnrollmentStatus, ProgramEnrollment};
use fitcoach_api::models::identity::{Identity, Role};
use fitcoach_api::models::profile::{ClientStatus, Profile};
use fitcoach_api::models::relationship::{
    CoachingRelationship, NewRelationship, RelationshipFilter, RelationshipStatus,
};
use fitcoach_api::models::session::{Session, SessionMode, SessionStatus};
use fitcoach_api::stores::{
    DailyCheckinStore, EnrollmentStore, IdentityStore, MessageStore, Page, ProfileStore,
    RelationshipStore, SessionStore, StoreError, StoreResult, Stores, WeeklyCheckinStore,
};

#[derive(Default)]
struct World {
    identities: Vec<Identity>,
    profiles: Vec<Profile>,
    relationships: Vec<CoachingRelationship>,
    weekly: Vec<WeeklyCheckin>,
    daily: Vec<DailyCheckin>,
    sessions: Vec<Session>,
    enrollments: Vec<ProgramEnrollment>,
    unread: HashMap<Uuid, i64>,
    failing: HashSet<&'static str>,
    calls: HashMap<&'static str, usize>,
    seq: i64,
}

impl World {
    /// Count the call and fail it if the store is switched off.
    fn enter(&mut self, store: &'static str) -> StoreResult<()> {
        *self.calls.entry(store).or_insert(0) += 1;
        if self.failing.contains(store) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

/// One struct implements all eight contracts; `Stores` holds it behind
/// eight trait objects, exactly as the services see production.
#[derive(Clone)]
struct FakeStore {
    world: Arc<Mutex<World>>,
}

#[async_trait]
impl IdentityStore for FakeStore {
    async fn list_by_role(&self, role: Role, page: Page) -> StoreResult<Vec<Identity>> {
        let mut w = self.world.lock().unwrap();
        w.enter("identities")?;
        let matching: Vec<Identity> = w
            .identities
            .iter()
            .filter(|i| i.role == role)
            .cloned()
            .collect();
        let start = (page.offset.max(0) as usize).min(matching.len());
        let end = (start + page.limit.max(0) as usize).min(matching.len());
        Ok(matching[start..end].to_vec())
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Identity>> {
        let mut w = self.world.lock().unwrap();
        w.enter("identities")?;
        Ok(w.identities
            .iter()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProfileStore for FakeStore {
    async fn list_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Profile>> {
        let mut w = self.world.lock().unwrap();
        w.enter("profiles")?;
        Ok(w.profiles
            .iter()
            .filter(|p| ids.contains(&p.user_id))
            .cloned()
            .collect())
    }

    async fn get(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        let mut w = self.world.lock().unwrap();
        w.enter("profiles")?;
        Ok(w.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn update_client_status(
        &self,
        user_id: Uuid,
        status: ClientStatus,
        reason: Option<&str>,
        updated_by: Uuid,
    ) -> StoreResult<Option<Profile>> {
        let mut w = self.world.lock().unwrap();
        w.enter("profiles")?;
        let Some(profile) = w.profiles.iter_mut().find(|p| p.user_id == user_id) else {
            return Ok(None);
        };
        profile.client_status = status;
        profile.rejection_reason = reason.map(String::from);
        profile.status_updated_at = Some(Utc::now());
        profile.status_updated_by = Some(updated_by);
        Ok(Some(profile.clone()))
    }
}

#[async_trait]
impl RelationshipStore for FakeStore {
    async fn list(&self, filter: RelationshipFilter) -> StoreResult<Vec<CoachingRelationship>> {
        let mut w = self.world.lock().unwrap();
        w.enter("relationships")?;
        let mut rows: Vec<CoachingRelationship> = w
            .relationships
            .iter()
            .filter(|r| {
                filter.coach_id.map_or(true, |c| r.coach_id == c)
                    && filter.client_id.map_or(true, |c| r.client_id == c)
                    && filter.status.map_or(true, |s| r.status == s)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.started_at);
        Ok(rows)
    }

    async fn insert(&self, new: NewRelationship) -> StoreResult<CoachingRelationship> {
        let mut w = self.world.lock().unwrap();
        w.enter("relationships")?;
        let row = CoachingRelationship {
            id: Uuid::new_v4(),
            coach_id: new.coach_id,
            client_id: new.client_id,
            status: RelationshipStatus::Active,
            started_at: new.started_at,
            ended_at: None,
        };
        w.relationships.push(row.clone());
        Ok(row)
    }

    async fn end_active(
        &self,
        client_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<CoachingRelationship>> {
        let mut w = self.world.lock().unwrap();
        w.enter("relationships")?;
        let Some(row) = w
            .relationships
            .iter_mut()
            .find(|r| r.client_id == client_id && r.status == RelationshipStatus::Active)
        else {
            return Ok(None);
        };
        row.status = RelationshipStatus::Ended;
        row.ended_at = Some(at);
        Ok(Some(row.clone()))
    }

    async fn assign_active(
        &self,
        coach_id: Uuid,
        client_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<CoachingRelationship> {
        let mut w = self.world.lock().unwrap();
        w.enter("relationships")?;
        // Mirror of the production command: end whatever is active, then
        // revive the (coach, client) row or insert a fresh one.
        for row in w
            .relationships
            .iter_mut()
            .filter(|r| r.client_id == client_id && r.status == RelationshipStatus::Active)
        {
            row.status = RelationshipStatus::Ended;
            row.ended_at = Some(at);
        }
        if let Some(row) = w
            .relationships
            .iter_mut()
            .find(|r| r.coach_id == coach_id && r.client_id == client_id)
        {
            row.status = RelationshipStatus::Active;
            row.started_at = at;
            row.ended_at = None;
            return Ok(row.clone());
        }
        let row = CoachingRelationship {
            id: Uuid::new_v4(),
            coach_id,
            client_id,
            status: RelationshipStatus::Active,
            started_at: at,
            ended_at: None,
        };
        w.relationships.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl WeeklyCheckinStore for FakeStore {
    async fn list_recent(&self, ids: &[Uuid], limit: i64) -> StoreResult<Vec<WeeklyCheckin>> {
        let mut w = self.world.lock().unwrap();
        w.enter("weekly_checkins")?;
        let mut rows: Vec<WeeklyCheckin> = w
            .weekly
            .iter()
            .filter(|c| ids.contains(&c.user_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn latest_per_client(&self, ids: &[Uuid]) -> StoreResult<Vec<WeeklyCheckin>> {
        let mut w = self.world.lock().unwrap();
        w.enter("weekly_checkins")?;
        let mut newest: HashMap<Uuid, WeeklyCheckin> = HashMap::new();
        for checkin in w.weekly.iter().filter(|c| ids.contains(&c.user_id)) {
            let keep = newest
                .get(&checkin.user_id)
                .map_or(true, |cur| checkin.submitted_at > cur.submitted_at);
            if keep {
                newest.insert(checkin.user_id, checkin.clone());
            }
        }
        Ok(newest.into_values().collect())
    }

    async fn count_since(&self, ids: &[Uuid], since: DateTime<Utc>) -> StoreResult<i64> {
        let mut w = self.world.lock().unwrap();
        w.enter("weekly_checkins")?;
        Ok(w.weekly
            .iter()
            .filter(|c| ids.contains(&c.user_id) && c.submitted_at >= since)
            .count() as i64)
    }
}

#[async_trait]
impl DailyCheckinStore for FakeStore {
    async fn list_recent(&self, ids: &[Uuid], limit: i64) -> StoreResult<Vec<DailyCheckin>> {
        let mut w = self.world.lock().unwrap();
        w.enter("daily_checkins")?;
        let mut rows: Vec<DailyCheckin> = w
            .daily
            .iter()
            .filter(|c| ids.contains(&c.user_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.logged_at.cmp(&a.logged_at));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn latest_per_client(
        &self,
        ids: &[Uuid],
        per_client: i64,
    ) -> StoreResult<Vec<DailyCheckin>> {
        let mut w = self.world.lock().unwrap();
        w.enter("daily_checkins")?;
        let mut by_client: HashMap<Uuid, Vec<DailyCheckin>> = HashMap::new();
        for checkin in w.daily.iter().filter(|c| ids.contains(&c.user_id)) {
            by_client.entry(checkin.user_id).or_default().push(checkin.clone());
        }
        let mut rows = Vec::new();
        for (_, mut list) in by_client {
            list.sort_by(|a, b| b.logged_at.cmp(&a.logged_at));
            list.truncate(per_client.max(0) as usize);
            rows.extend(list);
        }
        Ok(rows)
    }

    async fn count_since(&self, ids: &[Uuid], since: DateTime<Utc>) -> StoreResult<i64> {
        let mut w = self.world.lock().unwrap();
        w.enter("daily_checkins")?;
        Ok(w.daily
            .iter()
            .filter(|c| ids.contains(&c.user_id) && c.logged_at >= since)
            .count() as i64)
    }
}

#[async_trait]
impl SessionStore for FakeStore {
    async fn next_per_client(
        &self,
        ids: &[Uuid],
        after: DateTime<Utc>,
    ) -> StoreResult<Vec<Session>> {
        let mut w = self.world.lock().unwrap();
        w.enter("sessions")?;
        let mut next: HashMap<Uuid, Session> = HashMap::new();
        for session in w.sessions.iter().filter(|s| {
            ids.contains(&s.client_id)
                && s.start_time >= after
                && s.status != SessionStatus::Cancelled
        }) {
            let keep = next
                .get(&session.client_id)
                .map_or(true, |cur| session.start_time < cur.start_time);
            if keep {
                next.insert(session.client_id, session.clone());
            }
        }
        Ok(next.into_values().collect())
    }

    async fn list_upcoming_for_coach(
        &self,
        coach_id: Uuid,
        after: DateTime<Utc>,
        limit: i64,
    ) -> StoreResult<Vec<Session>> {
        let mut w = self.world.lock().unwrap();
        w.enter("sessions")?;
        let mut rows: Vec<Session> = w
            .sessions
            .iter()
            .filter(|s| {
                s.coach_id == coach_id
                    && s.start_time >= after
                    && s.status != SessionStatus::Cancelled
            })
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.start_time);
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn count_between(
        &self,
        coach_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<i64> {
        let mut w = self.world.lock().unwrap();
        w.enter("sessions")?;
        Ok(w.sessions
            .iter()
            .filter(|s| {
                s.coach_id == coach_id
                    && s.start_time >= from
                    && s.start_time < to
                    && s.status != SessionStatus::Cancelled
            })
            .count() as i64)
    }
}

#[async_trait]
impl EnrollmentStore for FakeStore {
    async fn list_active(&self, ids: &[Uuid]) -> StoreResult<Vec<ProgramEnrollment>> {
        let mut w = self.world.lock().unwrap();
        w.enter("enrollments")?;
        Ok(w.enrollments
            .iter()
            .filter(|e| ids.contains(&e.client_id) && e.status == EnrollmentStatus::Active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MessageStore for FakeStore {
    async fn count_unread(&self, user_id: Uuid) -> StoreResult<i64> {
        let mut w = self.world.lock().unwrap();
        w.enter("messages")?;
        Ok(w.unread.get(&user_id).copied().unwrap_or(0))
    }
}

/// Test harness: the `Stores` bundle the services take, plus seeding and
/// inspection helpers over the shared world.
pub struct TestWorld {
    pub stores: Stores,
    world: Arc<Mutex<World>>,
}

impl TestWorld {
    pub fn new() -> Self {
        let world = Arc::new(Mutex::new(World::default()));
        let fake = Arc::new(FakeStore {
            world: world.clone(),
        });
        let stores = Stores {
            identities: fake.clone(),
            profiles: fake.clone(),
            relationships: fake.clone(),
            weekly_checkins: fake.clone(),
            daily_checkins: fake.clone(),
            sessions: fake.clone(),
            enrollments: fake.clone(),
            messages: fake,
            call_timeout: Duration::from_secs(5),
        };
        Self { stores, world }
    }

    pub fn caller(&self, id: Uuid, role: Role) -> AuthenticatedIdentity {
        AuthenticatedIdentity { user_id: id, role }
    }

    pub fn add_identity(&self, role: Role, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.world.lock().unwrap().identities.push(Identity {
            id,
            email: email.to_string(),
            role,
            created_at: Utc::now(),
        });
        id
    }

    pub fn add_profile(
        &self,
        user_id: Uuid,
        first: Option<&str>,
        last: Option<&str>,
        status: ClientStatus,
    ) {
        self.world.lock().unwrap().profiles.push(Profile {
            user_id,
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            avatar_url: None,
            client_status: status,
            rejection_reason: None,
            status_updated_at: None,
            status_updated_by: None,
        });
    }

    /// Identity plus named profile in one go; the email is derived from the
    /// name.
    pub fn add_client(&self, first: &str, last: &str, status: ClientStatus) -> Uuid {
        let email = format!(
            "{}.{}@voorbeeld.nl",
            first.to_lowercase(),
            last.to_lowercase().replace(' ', "")
        );
        let id = self.add_identity(Role::Client, &email);
        self.add_profile(id, Some(first), Some(last), status);
        id
    }

    pub fn add_coach(&self, first: &str, last: &str) -> (Uuid, AuthenticatedIdentity) {
        let email = format!("{}@fitcoach.nl", first.to_lowercase());
        let id = self.add_identity(Role::Coach, &email);
        self.add_profile(id, Some(first), Some(last), ClientStatus::Approved);
        (id, self.caller(id, Role::Coach))
    }

    pub fn add_admin(&self, first: &str, last: &str) -> (Uuid, AuthenticatedIdentity) {
        let email = format!("{}@fitcoach.nl", first.to_lowercase());
        let id = self.add_identity(Role::Admin, &email);
        self.add_profile(id, Some(first), Some(last), ClientStatus::Approved);
        (id, self.caller(id, Role::Admin))
    }

    /// Active relationship with a deterministic, strictly increasing
    /// started_at so listing order matches linking order.
    pub fn link_active(&self, coach_id: Uuid, client_id: Uuid) {
        let mut w = self.world.lock().unwrap();
        w.seq += 1;
        let started_at = Utc::now() - ChronoDuration::days(30) + ChronoDuration::minutes(w.seq);
        w.relationships.push(CoachingRelationship {
            id: Uuid::new_v4(),
            coach_id,
            client_id,
            status: RelationshipStatus::Active,
            started_at,
            ended_at: None,
        });
    }

    pub fn add_weekly(
        &self,
        client_id: Uuid,
        at: DateTime<Utc>,
        weight_kg: f64,
        feedback: Option<&str>,
    ) {
        self.world.lock().unwrap().weekly.push(WeeklyCheckin {
            id: Uuid::new_v4(),
            user_id: client_id,
            submitted_at: at,
            weight_kg,
            coach_feedback: feedback.map(String::from),
            notes: None,
        });
    }

    pub fn add_daily(&self, client_id: Uuid, at: DateTime<Utc>, weight_kg: f64) {
        self.world.lock().unwrap().daily.push(DailyCheckin {
            id: Uuid::new_v4(),
            user_id: client_id,
            logged_at: at,
            weight_kg,
            coach_feedback: None,
            mood: None,
        });
    }

    pub fn add_session(
        &self,
        coach_id: Uuid,
        client_id: Uuid,
        at: DateTime<Utc>,
        session_type: &str,
        status: SessionStatus,
        mode: SessionMode,
    ) {
        self.world.lock().unwrap().sessions.push(Session {
            id: Uuid::new_v4(),
            coach_id,
            client_id,
            start_time: at,
            session_type: session_type.to_string(),
            status,
            mode,
        });
    }

    pub fn enroll(&self, client_id: Uuid, program: &str) {
        self.world.lock().unwrap().enrollments.push(ProgramEnrollment {
            client_id,
            program_name: program.to_string(),
            status: EnrollmentStatus::Active,
        });
    }

    pub fn set_unread(&self, user_id: Uuid, count: i64) {
        self.world.lock().unwrap().unread.insert(user_id, count);
    }

    /// Make every call on the named store fail from now on.
    pub fn fail(&self, store: &'static str) {
        self.world.lock().unwrap().failing.insert(store);
    }

    pub fn calls(&self, store: &'static str) -> usize {
        self.world
            .lock()
            .unwrap()
            .calls
            .get(store)
            .copied()
            .unwrap_or(0)
    }

    pub fn relationships(&self) -> Vec<CoachingRelationship> {
        self.world.lock().unwrap().relationships.clone()
    }

    pub fn profile_of(&self, user_id: Uuid) -> Option<Profile> {
        self.world
            .lock()
            .unwrap()
            .profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned()
    }
}
