use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(SessionStatus::Scheduled),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Unknown session status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Online,
    InPerson,
}

impl SessionMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Online => "online",
            SessionMode::InPerson => "in_person",
        }
    }
}

impl std::str::FromStr for SessionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(SessionMode::Online),
            "in_person" => Ok(SessionMode::InPerson),
            _ => Err(anyhow::anyhow!("Unknown session mode: {s}")),
        }
    }
}

/// Scheduled appointment between a coach and a client. Read-only input to
/// the roster and dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub client_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub session_type: String,
    pub status: SessionStatus,
    pub mode: SessionMode,
}

/// Roster field: the client's earliest session with `start_time >= now`.
#[derive(Debug, Clone, Serialize)]
pub struct NextSession {
    pub start_time: DateTime<Utc>,
    pub session_type: String,
    pub mode: SessionMode,
}

impl From<Session> for NextSession {
    fn from(s: Session) -> Self {
        Self {
            start_time: s.start_time,
            session_type: s.session_type,
            mode: s.mode,
        }
    }
}

/// Agenda entry for the dashboard, client name resolved.
#[derive(Debug, Clone, Serialize)]
pub struct UpcomingSession {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub initials: String,
    pub start_time: DateTime<Utc>,
    pub session_type: String,
    pub mode: SessionMode,
}
