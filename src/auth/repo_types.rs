use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,                      // autoincrement row id
    pub email: String,                // unique, stored as given
    #[serde(skip_serializing)]
    pub hashed_password: String,      // Argon2 PHC string, not exposed in JSON
    pub full_name: Option<String>,
}

/// Part of the user that is safe to hand back to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub email: String,
    pub full_name: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            email: u.email,
            full_name: u.full_name.unwrap_or_default(),
        }
    }
}
