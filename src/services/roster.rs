//! Roster Snapshot Builder: resolves a coach's active clients, fans out the
//! per-resource fetches concurrently, joins them by client id, and derives
//! one display-ready snapshot per client. A failing branch degrades the
//! fields it feeds; it never fails the request.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::require_role;
use crate::models::auth::AuthenticatedIdentity;
use crate::models::checkin::{DailyCheckin, WeeklyCheckin};
use crate::models::enrollment::ProgramEnrollment;
use crate::models::identity::{Identity, Role};
use crate::models::profile::{ClientStatus, Profile};
use crate::models::relationship::RelationshipFilter;
use crate::models::roster::{AllClientsResponse, AssignableCoach, RosterSnapshot};
use crate::models::session::{NextSession, Session};
use crate::stores::{Page, StoreResult, Stores};

use super::checkins::CheckinAggregator;
use super::metrics;
use super::relationships::RelationshipLedger;
use super::status::StatusFlow;

/// Shown when a client has no active program enrollment.
pub const NO_PROGRAM: &str = "Geen programma";
/// Roster tag carried by clients with an active program.
pub const TAG_ONLINE: &str = "Online";

const DIRECTORY_PAGE_SIZE: i64 = 200;

pub struct RosterBuilder;

impl RosterBuilder {
    /// The authenticated coach's roster, one snapshot per active client.
    /// An empty client set returns immediately, without touching the other
    /// stores.
    pub async fn list_coach_clients(
        stores: &Stores,
        caller: &AuthenticatedIdentity,
    ) -> Result<Vec<RosterSnapshot>, ApiError> {
        require_role(caller, &[Role::Coach, Role::Admin])?;
        let coach_id = caller.user_id;

        let client_ids = RelationshipLedger::active_client_ids(stores, coach_id).await?;
        if client_ids.is_empty() {
            return Ok(Vec::new());
        }

        // The coach's own rows ride along so coach_name resolves without an
        // extra fetch.
        let mut lookup_ids = client_ids.clone();
        lookup_ids.push(coach_id);

        let now = Utc::now();
        let (profiles, identities, weekly, daily, enrollments, sessions) = tokio::join!(
            stores.bounded(stores.profiles.list_by_ids(&lookup_ids)),
            stores.bounded(stores.identities.list_by_ids(&lookup_ids)),
            stores.bounded(stores.weekly_checkins.latest_per_client(&client_ids)),
            stores.bounded(stores.daily_checkins.latest_per_client(&client_ids, 2)),
            stores.bounded(stores.enrollments.list_active(&client_ids)),
            stores.bounded(stores.sessions.next_per_client(&client_ids, now)),
        );

        let joined =
            JoinedRoster::settle(profiles, identities, weekly, daily, enrollments, sessions);
        let coach_name = joined.profile(coach_id).and_then(Profile::full_name);

        let mut roster: Vec<RosterSnapshot> = client_ids
            .iter()
            .map(|&id| joined.snapshot(id, Some(coach_id), coach_name.clone()))
            .collect();
        StatusFlow::display_order(&mut roster);
        Ok(roster)
    }

    /// Admin overview: every client in the directory, each with their
    /// active coach resolved, plus the list of assignable coaches.
    pub async fn list_all_clients(
        stores: &Stores,
        caller: &AuthenticatedIdentity,
    ) -> Result<AllClientsResponse, ApiError> {
        require_role(caller, &[Role::Admin])?;

        let clients = Self::directory(stores, Role::Client).await?;
        let mut coach_candidates = Self::directory(stores, Role::Coach).await?;
        coach_candidates.extend(Self::directory(stores, Role::Admin).await?);

        let client_ids: Vec<Uuid> = clients.iter().map(|i| i.id).collect();
        let mut profile_ids = client_ids.clone();
        profile_ids.extend(coach_candidates.iter().map(|i| i.id));

        let now = Utc::now();
        let (profiles, weekly, daily, enrollments, sessions, relationships) = tokio::join!(
            stores.bounded(stores.profiles.list_by_ids(&profile_ids)),
            stores.bounded(stores.weekly_checkins.latest_per_client(&client_ids)),
            stores.bounded(stores.daily_checkins.latest_per_client(&client_ids, 2)),
            stores.bounded(stores.enrollments.list_active(&client_ids)),
            stores.bounded(stores.sessions.next_per_client(&client_ids, now)),
            stores.bounded(stores.relationships.list(RelationshipFilter::all_active())),
        );

        let active_coach: HashMap<Uuid, Uuid> = settle_branch(relationships, "relationships")
            .into_iter()
            .map(|r| (r.client_id, r.coach_id))
            .collect();

        // Emails come from the directory pages already in hand.
        let identities: Vec<Identity> = clients
            .iter()
            .chain(coach_candidates.iter())
            .cloned()
            .collect();
        let joined =
            JoinedRoster::settle(profiles, Ok(identities), weekly, daily, enrollments, sessions);

        let mut roster: Vec<RosterSnapshot> = client_ids
            .iter()
            .map(|&id| {
                let coach_id = active_coach.get(&id).copied();
                let coach_name = coach_id
                    .and_then(|cid| joined.profile(cid))
                    .and_then(Profile::full_name);
                joined.snapshot(id, coach_id, coach_name)
            })
            .collect();
        StatusFlow::display_order(&mut roster);

        let coaches: Vec<AssignableCoach> = coach_candidates
            .iter()
            .filter_map(|identity| {
                let name = joined.profile(identity.id).and_then(Profile::full_name)?;
                Some(AssignableCoach {
                    id: identity.id,
                    name,
                    role: identity.role,
                })
            })
            .collect();

        Ok(AllClientsResponse {
            clients: roster,
            coaches,
        })
    }

    /// Page through the directory until a short page ends it.
    async fn directory(stores: &Stores, role: Role) -> Result<Vec<Identity>, ApiError> {
        let mut identities = Vec::new();
        let mut page = Page::first(DIRECTORY_PAGE_SIZE);
        loop {
            let batch = stores
                .bounded(stores.identities.list_by_role(role, page))
                .await?;
            let fetched = batch.len() as i64;
            identities.extend(batch);
            if fetched < page.limit {
                break;
            }
            page = page.next();
        }
        Ok(identities)
    }
}

/// The fan-in side of the build: per-resource maps keyed by client id.
struct JoinedRoster {
    profiles: HashMap<Uuid, Profile>,
    emails: HashMap<Uuid, String>,
    weekly: HashMap<Uuid, WeeklyCheckin>,
    daily: HashMap<Uuid, Vec<DailyCheckin>>,
    programs: HashMap<Uuid, ProgramEnrollment>,
    sessions: HashMap<Uuid, Session>,
}

impl JoinedRoster {
    /// Collect what succeeded. A failed branch becomes its empty default
    /// and degrades only the fields it feeds.
    fn settle(
        profiles: StoreResult<Vec<Profile>>,
        identities: StoreResult<Vec<Identity>>,
        weekly: StoreResult<Vec<WeeklyCheckin>>,
        daily: StoreResult<Vec<DailyCheckin>>,
        enrollments: StoreResult<Vec<ProgramEnrollment>>,
        sessions: StoreResult<Vec<Session>>,
    ) -> Self {
        let mut daily_map: HashMap<Uuid, Vec<DailyCheckin>> = HashMap::new();
        for checkin in settle_branch(daily, "daily_checkins") {
            daily_map.entry(checkin.user_id).or_default().push(checkin);
        }
        Self {
            profiles: settle_branch(profiles, "profiles")
                .into_iter()
                .map(|p| (p.user_id, p))
                .collect(),
            emails: settle_branch(identities, "identities")
                .into_iter()
                .map(|i| (i.id, i.email))
                .collect(),
            weekly: settle_branch(weekly, "weekly_checkins")
                .into_iter()
                .map(|c| (c.user_id, c))
                .collect(),
            daily: daily_map,
            programs: settle_branch(enrollments, "enrollments")
                .into_iter()
                .map(|e| (e.client_id, e))
                .collect(),
            sessions: settle_branch(sessions, "sessions")
                .into_iter()
                .map(|s| (s.client_id, s))
                .collect(),
        }
    }

    fn profile(&self, id: Uuid) -> Option<&Profile> {
        self.profiles.get(&id)
    }

    /// Derive one client's snapshot from whatever joined. Missing rows
    /// degrade to the documented defaults, never to a failure.
    fn snapshot(
        &self,
        client_id: Uuid,
        coach_id: Option<Uuid>,
        coach_name: Option<String>,
    ) -> RosterSnapshot {
        let profile = self.profiles.get(&client_id);
        let email = self.emails.get(&client_id).cloned().unwrap_or_default();
        let daily = self
            .daily
            .get(&client_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let program = self.programs.get(&client_id);

        RosterSnapshot {
            client_id,
            display_name: display_name(profile, &email),
            initials: profile
                .and_then(Profile::initials)
                .unwrap_or_else(|| "??".to_string()),
            email,
            status: profile
                .map(|p| p.client_status)
                .unwrap_or(ClientStatus::Pending),
            coach_id,
            coach_name,
            trend: CheckinAggregator::trend(daily),
            last_checkin: CheckinAggregator::last_checkin(
                self.weekly.get(&client_id),
                daily.first(),
            ),
            next_session: self.sessions.get(&client_id).cloned().map(NextSession::from),
            program_name: program
                .map(|p| p.program_name.clone())
                .unwrap_or_else(|| NO_PROGRAM.to_string()),
            tags: if program.is_some() {
                vec![TAG_ONLINE.to_string()]
            } else {
                Vec::new()
            },
        }
    }
}

fn settle_branch<T>(result: StoreResult<Vec<T>>, branch: &'static str) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(branch, error = %e, "roster branch failed, substituting defaults");
            metrics::ROSTER_BRANCH_FAILURES
                .with_label_values(&[branch])
                .inc();
            Vec::new()
        }
    }
}

/// Roster display name: profile name, then email, then "Onbekend".
fn display_name(profile: Option<&Profile>, email: &str) -> String {
    profile
        .and_then(Profile::full_name)
        .or_else(|| {
            let email = email.trim();
            if email.is_empty() {
                None
            } else {
                Some(email.to_string())
            }
        })
        .unwrap_or_else(|| "Onbekend".to_string())
}
