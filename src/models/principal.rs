//! Principal model read from the user directory.

/// A known caller of the query gateway.
///
/// Maps to a row of the `users` table. Only existence and the `disabled`
/// flag matter to the gateway.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Principal {
    pub username: String,
    pub disabled: bool,
}
