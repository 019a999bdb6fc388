use time::OffsetDateTime;

/// An account row. `password_hash` is a bcrypt digest and never leaves the
/// backend; response shaping happens in the service layer.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
