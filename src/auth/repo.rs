use sqlx::SqlitePool;

use crate::auth::{error::AuthError, repo_types::User};

/// Create the `users` table if it is not there yet.
pub async fn ensure_schema(db: &SqlitePool) -> Result<(), AuthError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT UNIQUE NOT NULL,
            hashed_password TEXT NOT NULL,
            full_name TEXT
        )
        "#,
    )
    .execute(db)
    .await?;
    Ok(())
}

impl User {
    /// Find a user by exact email match.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, hashed_password, full_name
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new user. The UNIQUE constraint on `email` decides duplicates.
    pub async fn create(
        db: &SqlitePool,
        email: &str,
        hashed_password: &str,
        full_name: &str,
    ) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, hashed_password, full_name)
            VALUES (?1, ?2, ?3)
            RETURNING id, email, hashed_password, full_name
            "#,
        )
        .bind(email)
        .bind(hashed_password)
        .bind(full_name)
        .fetch_one(db)
        .await
        .map_err(AuthError::from_insert)?;
        Ok(user)
    }
}
