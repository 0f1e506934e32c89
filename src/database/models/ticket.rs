use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const TICKET_PRIORITIES: &[&str] = &["low", "normal", "high", "urgent"];

/// Department a ticket lands in when its category has no routing row
pub const DEFAULT_DEPARTMENT: &str = "operations";

/// Ticket lifecycle. Progression is near-linear: forward moves may skip
/// stages, the single backward edge is resolved -> waiting_for_employee
/// (reopen), and closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    UnderReview,
    InProgress,
    WaitingForEmployee,
    Resolved,
    Closed,
}

impl TicketStatus {
    fn rank(self) -> u8 {
        match self {
            TicketStatus::New => 0,
            TicketStatus::UnderReview => 1,
            TicketStatus::InProgress => 2,
            TicketStatus::WaitingForEmployee => 3,
            TicketStatus::Resolved => 4,
            TicketStatus::Closed => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::UnderReview => "under_review",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::WaitingForEmployee => "waiting_for_employee",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn can_transition(self, next: TicketStatus) -> bool {
        if self == TicketStatus::Closed {
            return false;
        }
        if self == TicketStatus::Resolved && next == TicketStatus::WaitingForEmployee {
            return true;
        }
        next.rank() > self.rank()
    }

    pub fn is_closed(self) -> bool {
        self == TicketStatus::Closed
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(TicketStatus::New),
            "under_review" => Ok(TicketStatus::UnderReview),
            "in_progress" => Ok(TicketStatus::InProgress),
            "waiting_for_employee" => Ok(TicketStatus::WaitingForEmployee),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(format!("unknown ticket status: {}", other)),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub subject: String,
    pub description: Option<String>,
    pub category: String,
    pub department: String,
    pub status: String,
    pub priority: String,
    pub opened_by: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketComment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Category -> department routing row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketRoute {
    pub id: Uuid,
    pub category: String,
    pub department: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_round_trip() {
        for s in ["new", "under_review", "in_progress", "waiting_for_employee", "resolved", "closed"] {
            assert_eq!(s.parse::<TicketStatus>().unwrap().as_str(), s);
        }
        assert!("reopened".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn forward_moves_allowed_including_skips() {
        assert!(TicketStatus::New.can_transition(TicketStatus::UnderReview));
        assert!(TicketStatus::New.can_transition(TicketStatus::InProgress));
        assert!(TicketStatus::InProgress.can_transition(TicketStatus::Resolved));
        assert!(TicketStatus::Resolved.can_transition(TicketStatus::Closed));
    }

    #[test]
    fn backward_moves_rejected_except_reopen() {
        assert!(!TicketStatus::InProgress.can_transition(TicketStatus::New));
        assert!(!TicketStatus::Resolved.can_transition(TicketStatus::UnderReview));
        assert!(TicketStatus::Resolved.can_transition(TicketStatus::WaitingForEmployee));
    }

    #[test]
    fn closed_is_terminal() {
        for next in [
            TicketStatus::New,
            TicketStatus::UnderReview,
            TicketStatus::InProgress,
            TicketStatus::WaitingForEmployee,
            TicketStatus::Resolved,
        ] {
            assert!(!TicketStatus::Closed.can_transition(next));
        }
    }

    #[test]
    fn self_transition_rejected() {
        assert!(!TicketStatus::InProgress.can_transition(TicketStatus::InProgress));
    }
}
