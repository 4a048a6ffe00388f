use serde::Serialize;
use uuid::Uuid;

use super::checkin::{LastCheckin, Trend};
use super::identity::Role;
use super::profile::ClientStatus;
use super::session::NextSession;

/// Per-client summary assembled at request time by joining the stores.
/// Never persisted; rebuilt on every roster request.
#[derive(Debug, Clone, Serialize)]
pub struct RosterSnapshot {
    pub client_id: Uuid,
    pub display_name: String,
    pub initials: String,
    pub email: String,
    pub status: ClientStatus,
    pub coach_id: Option<Uuid>,
    pub coach_name: Option<String>,
    pub trend: Trend,
    pub last_checkin: Option<LastCheckin>,
    pub next_session: Option<NextSession>,
    pub program_name: String,
    pub tags: Vec<String>,
}

/// Coach or admin selectable in the assignment dropdown. Only identities
/// with a resolvable display name are listed.
#[derive(Debug, Clone, Serialize)]
pub struct AssignableCoach {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

/// KPI set for the overview screen.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub active_clients: i64,
    pub checkins_this_week: i64,
    pub unread_messages: i64,
    pub sessions_this_week: i64,
}

/// Progress tab row. `completion` stays 0 until lesson tracking lands.
#[derive(Debug, Clone, Serialize)]
pub struct ClientProgress {
    pub client_id: Uuid,
    pub display_name: String,
    pub initials: String,
    pub program_name: String,
    pub completion: f32,
    pub trend: Trend,
}

/// Admin directory payload: every client plus the coaches they can be
/// assigned to.
#[derive(Debug, Serialize)]
pub struct AllClientsResponse {
    pub clients: Vec<RosterSnapshot>,
    pub coaches: Vec<AssignableCoach>,
}
