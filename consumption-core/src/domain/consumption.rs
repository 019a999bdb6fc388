use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The closed set of tracked utilities.
///
/// Stored in Postgres as the `consumption_kind` enum type; serialized on the
/// wire as the lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "consumption_kind", rename_all = "lowercase")]
pub enum ConsumptionKind {
    Electricity,
    Water,
    Gas,
}

impl ConsumptionKind {
    pub const ALL: [ConsumptionKind; 3] = [
        ConsumptionKind::Electricity,
        ConsumptionKind::Water,
        ConsumptionKind::Gas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumptionKind::Electricity => "electricity",
            ConsumptionKind::Water => "water",
            ConsumptionKind::Gas => "gas",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown consumption type: {0}")]
pub struct UnknownKind(pub String);

impl std::str::FromStr for ConsumptionKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "electricity" => Ok(ConsumptionKind::Electricity),
            "water" => Ok(ConsumptionKind::Water),
            "gas" => Ok(ConsumptionKind::Gas),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

/// A single logged measurement of utility usage, owned by exactly one user.
///
/// Records are immutable once created; there are no update or delete
/// endpoints, and rows only disappear when the owning user is deleted.
/// Wire field names (`date`, `value`, `type`) follow the public API shape.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ConsumptionRecord {
    pub id: i64,
    pub user_id: i64,
    /// Date of the consumption itself, not of record creation.
    #[serde(rename = "date", with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    #[serde(rename = "value")]
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: ConsumptionKind,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
