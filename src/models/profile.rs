use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Review state of a client account. New signups start as `Pending` and stay
/// out of coach tooling until a coach or admin decides.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Pending,
    Approved,
    Rejected,
}

impl ClientStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Pending => "pending",
            ClientStatus::Approved => "approved",
            ClientStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ClientStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClientStatus::Pending),
            "approved" => Ok(ClientStatus::Approved),
            "rejected" => Ok(ClientStatus::Rejected),
            _ => Err(anyhow::anyhow!("Unknown client status: {s}")),
        }
    }
}

/// Profile fields a client fills in after signup. One profile per identity;
/// only approve/reject mutate the status fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub client_status: ClientStatus,
    pub rejection_reason: Option<String>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub status_updated_by: Option<Uuid>,
}

impl Profile {
    /// Trimmed "first last", `None` when both parts are empty or whitespace.
    /// Callers fall back to email and then "Onbekend".
    pub fn full_name(&self) -> Option<String> {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        let joined = format!("{first} {last}");
        let joined = joined.trim();
        if joined.is_empty() {
            None
        } else {
            Some(joined.to_string())
        }
    }

    /// Upper-cased first letters of first/last name, `None` when no usable
    /// letter exists. Callers fall back to "??".
    pub fn initials(&self) -> Option<String> {
        let first = self
            .first_name
            .as_deref()
            .and_then(|s| s.trim().chars().next());
        let last = self
            .last_name
            .as_deref()
            .and_then(|s| s.trim().chars().next());
        match (first, last) {
            (Some(f), Some(l)) => Some(format!("{}{}", f.to_uppercase(), l.to_uppercase())),
            (Some(f), None) => Some(f.to_uppercase().to_string()),
            (None, Some(l)) => Some(l.to_uppercase().to_string()),
            (None, None) => None,
        }
    }
}
