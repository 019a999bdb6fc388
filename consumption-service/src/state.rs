use sqlx::PgPool;
use time::OffsetDateTime;

use crate::config::AuthConfig;

/// Wall-clock source handed to every handler that needs "now". Analytics
/// month windows depend on it, so tests pin it with `Fixed`.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    Fixed(OffsetDateTime),
}

impl Clock {
    pub fn now(&self) -> OffsetDateTime {
        match self {
            Clock::System => OffsetDateTime::now_utc(),
            Clock::Fixed(ts) => *ts,
        }
    }
}

/// Shared handler state. Built once in `main` and passed through axum's
/// `State`; no globals.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth: AuthConfig,
    pub clock: Clock,
}
