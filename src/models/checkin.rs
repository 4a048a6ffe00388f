use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Weekly check-in submitted by a client. "Reviewed" iff the coach attached
/// feedback.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WeeklyCheckin {
    pub id: Uuid,
    pub user_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub weight_kg: f64,
    pub coach_feedback: Option<String>,
    pub notes: Option<String>,
}

/// Daily quick log. The weight trend derivation reads only this stream.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyCheckin {
    pub id: Uuid,
    pub user_id: Uuid,
    pub logged_at: DateTime<Utc>,
    pub weight_kg: f64,
    pub coach_feedback: Option<String>,
    pub mood: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckinKind {
    Weekly,
    Daily,
}

/// Short-term weight direction, derived from the two most recent daily logs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// Uniform entry in the merged check-in feed, either cadence.
#[derive(Debug, Clone, Serialize)]
pub struct CheckinFeedItem {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub initials: String,
    pub occurred_at: DateTime<Utc>,
    pub kind: CheckinKind,
    pub reviewed: bool,
    pub note: Option<String>,
}

/// Most recent check-in of either cadence for one client.
#[derive(Debug, Clone, Serialize)]
pub struct LastCheckin {
    pub occurred_at: DateTime<Utc>,
    pub kind: CheckinKind,
    pub reviewed: bool,
}
