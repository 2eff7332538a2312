use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::shared::constants::{TEMPORARY_BAN_MONTHS, TEMPORARY_BAN_THRESHOLD};

/// Database model for ban
#[derive(Debug, Clone, FromRow)]
pub struct Ban {
    pub id: Uuid,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// `None` means permanent
    pub ended_at: Option<DateTime<Utc>>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// What a newly recorded violation costs the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sanction {
    /// Violation recorded, no ban
    Warning,
    TemporaryBan { until: DateTime<Utc> },
    PermanentBan,
}

impl Sanction {
    /// Escalation ladder keyed on the number of violations recorded *before*
    /// the current one.
    pub fn for_prior_violations(prior: i64, now: DateTime<Utc>) -> Self {
        match prior {
            n if n < TEMPORARY_BAN_THRESHOLD => Sanction::Warning,
            TEMPORARY_BAN_THRESHOLD => now
                .checked_add_months(Months::new(TEMPORARY_BAN_MONTHS))
                .map_or(Sanction::PermanentBan, |until| Sanction::TemporaryBan {
                    until,
                }),
            _ => Sanction::PermanentBan,
        }
    }

    /// End of the ban to insert: `None` when there is no ban,
    /// `Some(None)` for a permanent one.
    pub fn ban_end(&self) -> Option<Option<DateTime<Utc>>> {
        match self {
            Sanction::Warning => None,
            Sanction::TemporaryBan { until } => Some(Some(*until)),
            Sanction::PermanentBan => Some(None),
        }
    }
}

/// Ban state derived from the most recent ban
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BanStatus {
    NotBanned,
    Temporary { until: DateTime<Utc> },
    Permanent,
}

impl BanStatus {
    /// Only the latest ban (by `started_at`) counts. A ban whose end equals
    /// `now` has already expired.
    pub fn derive(latest: Option<&Ban>, now: DateTime<Utc>) -> Self {
        match latest {
            None => BanStatus::NotBanned,
            Some(ban) => match ban.ended_at {
                None => BanStatus::Permanent,
                Some(until) if until > now => BanStatus::Temporary { until },
                Some(_) => BanStatus::NotBanned,
            },
        }
    }

    pub fn is_banned(&self) -> bool {
        !matches!(self, BanStatus::NotBanned)
    }
}
