//! Dashboard reads: the stats reducer, the upcoming agenda, and the
//! progress tab. The reducer itself is pure; everything stateful comes in
//! through the stores.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::require_role;
use crate::models::auth::AuthenticatedIdentity;
use crate::models::identity::Role;
use crate::models::profile::Profile;
use crate::models::roster::{ClientProgress, DashboardStats};
use crate::models::session::UpcomingSession;
use crate::stores::Stores;

use super::checkins::CheckinAggregator;
use super::relationships::RelationshipLedger;
use super::roster::NO_PROGRAM;

pub struct DashboardService;

impl DashboardService {
    /// KPI set for the overview screen. Check-ins are counted over the
    /// trailing seven days, sessions over the coming seven.
    pub async fn stats(
        stores: &Stores,
        caller: &AuthenticatedIdentity,
    ) -> Result<DashboardStats, ApiError> {
        require_role(caller, &[Role::Coach, Role::Admin])?;
        let coach_id = caller.user_id;

        let client_ids = RelationshipLedger::active_client_ids(stores, coach_id).await?;
        let now = Utc::now();
        let week_ago = now - Duration::days(7);
        let week_ahead = now + Duration::days(7);

        let (weekly, daily, unread, sessions) = tokio::join!(
            stores.bounded(stores.weekly_checkins.count_since(&client_ids, week_ago)),
            stores.bounded(stores.daily_checkins.count_since(&client_ids, week_ago)),
            stores.bounded(stores.messages.count_unread(coach_id)),
            stores.bounded(stores.sessions.count_between(coach_id, now, week_ahead)),
        );

        Ok(Self::reduce(
            client_ids.len(),
            weekly?,
            daily?,
            unread?,
            sessions?,
        ))
    }

    /// Pure reduction over already-fetched counts: arithmetic and renaming
    /// only.
    pub fn reduce(
        active_clients: usize,
        weekly_count: i64,
        daily_count: i64,
        unread_messages: i64,
        sessions_this_week: i64,
    ) -> DashboardStats {
        DashboardStats {
            active_clients: active_clients as i64,
            checkins_this_week: weekly_count + daily_count,
            unread_messages,
            sessions_this_week,
        }
    }

    /// The coach's next sessions, client names resolved.
    pub async fn upcoming_sessions(
        stores: &Stores,
        caller: &AuthenticatedIdentity,
        limit: i64,
    ) -> Result<Vec<UpcomingSession>, ApiError> {
        require_role(caller, &[Role::Coach, Role::Admin])?;
        let sessions = stores
            .bounded(
                stores
                    .sessions
                    .list_upcoming_for_coach(caller.user_id, Utc::now(), limit),
            )
            .await?;
        if sessions.is_empty() {
            return Ok(Vec::new());
        }

        let client_ids: Vec<Uuid> = sessions.iter().map(|s| s.client_id).collect();
        let profiles = stores
            .bounded(stores.profiles.list_by_ids(&client_ids))
            .await?;
        let profiles: HashMap<Uuid, Profile> =
            profiles.into_iter().map(|p| (p.user_id, p)).collect();

        Ok(sessions
            .into_iter()
            .map(|s| {
                let profile = profiles.get(&s.client_id);
                UpcomingSession {
                    id: s.id,
                    client_id: s.client_id,
                    client_name: profile
                        .and_then(Profile::full_name)
                        .unwrap_or_else(|| "Onbekend".to_string()),
                    initials: profile
                        .and_then(Profile::initials)
                        .unwrap_or_else(|| "??".to_string()),
                    start_time: s.start_time,
                    session_type: s.session_type,
                    mode: s.mode,
                }
            })
            .collect())
    }

    /// Progress tab rows for the coach's active clients.
    pub async fn client_progress(
        stores: &Stores,
        caller: &AuthenticatedIdentity,
    ) -> Result<Vec<ClientProgress>, ApiError> {
        require_role(caller, &[Role::Coach, Role::Admin])?;
        let client_ids = RelationshipLedger::active_client_ids(stores, caller.user_id).await?;
        if client_ids.is_empty() {
            return Ok(Vec::new());
        }

        let (profiles, daily, enrollments) = tokio::join!(
            stores.bounded(stores.profiles.list_by_ids(&client_ids)),
            stores.bounded(stores.daily_checkins.latest_per_client(&client_ids, 2)),
            stores.bounded(stores.enrollments.list_active(&client_ids)),
        );
        let (profiles, daily, enrollments) = (profiles?, daily?, enrollments?);

        let profiles: HashMap<Uuid, Profile> =
            profiles.into_iter().map(|p| (p.user_id, p)).collect();
        let mut daily_map: HashMap<Uuid, Vec<_>> = HashMap::new();
        for checkin in daily {
            daily_map.entry(checkin.user_id).or_default().push(checkin);
        }
        let programs: HashMap<Uuid, String> = enrollments
            .into_iter()
            .map(|e| (e.client_id, e.program_name))
            .collect();

        Ok(client_ids
            .iter()
            .map(|&id| {
                let profile = profiles.get(&id);
                let recent = daily_map.get(&id).map(Vec::as_slice).unwrap_or(&[]);
                ClientProgress {
                    client_id: id,
                    display_name: profile
                        .and_then(Profile::full_name)
                        .unwrap_or_else(|| "Onbekend".to_string()),
                    initials: profile
                        .and_then(Profile::initials)
                        .unwrap_or_else(|| "??".to_string()),
                    program_name: programs
                        .get(&id)
                        .cloned()
                        .unwrap_or_else(|| NO_PROGRAM.to_string()),
                    // TODO: completion needs per-lesson progress rows; the
                    // enrollment store does not expose them yet.
                    completion: 0.0,
                    trend: CheckinAggregator::trend(recent),
                }
            })
            .collect())
    }
}
