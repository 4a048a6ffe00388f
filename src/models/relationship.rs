use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Active,
    Paused,
    Ended,
}

impl RelationshipStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RelationshipStatus::Active => "active",
            RelationshipStatus::Paused => "paused",
            RelationshipStatus::Ended => "ended",
        }
    }
}

impl std::fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RelationshipStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RelationshipStatus::Active),
            "paused" => Ok(RelationshipStatus::Paused),
            "ended" => Ok(RelationshipStatus::Ended),
            _ => Err(anyhow::anyhow!("Unknown relationship status: {s}")),
        }
    }
}

/// One coach↔client assignment. Rows are never deleted: ending and later
/// reactivating the same pair reuse the existing row. Invariant: per client
/// at most one row is Active at any instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachingRelationship {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub client_id: Uuid,
    pub status: RelationshipStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Ledger listing filter; `None` fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipFilter {
    pub coach_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub status: Option<RelationshipStatus>,
}

impl RelationshipFilter {
    pub fn active_for_coach(coach_id: Uuid) -> Self {
        Self {
            coach_id: Some(coach_id),
            client_id: None,
            status: Some(RelationshipStatus::Active),
        }
    }

    pub fn active_for_client(client_id: Uuid) -> Self {
        Self {
            coach_id: None,
            client_id: Some(client_id),
            status: Some(RelationshipStatus::Active),
        }
    }

    pub fn all_active() -> Self {
        Self {
            coach_id: None,
            client_id: None,
            status: Some(RelationshipStatus::Active),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewRelationship {
    pub coach_id: Uuid,
    pub client_id: Uuid,
    pub started_at: DateTime<Utc>,
}
