//! # User Repository
//!
//! Login accounts. The password hash is stored as an opaque PHC string and
//! only leaves this module through [`UserRecord`].

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use dine_core::{Role, User};

/// A user together with the hash their password is checked against.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    password_hash: String,
    role: Role,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            user: User {
                id: row.id,
                username: row.username,
                role: row.role,
                created_at: row.created_at,
            },
            password_hash: row.password_hash,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRecord::from))
    }

    pub async fn exists_with_role(&self, role: Role) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = ?1)")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// ## Errors
    /// * `UniqueViolation` on `users.username` - the name is taken
    pub async fn insert(&self, username: &str, password_hash: &str, role: Role) -> DbResult<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            role,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, username, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user.id, role = %user.role, "Inserted user");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        assert!(!users.exists_with_role(Role::Admin).await.unwrap());
        let created = users.insert("owner", "$argon2id$stub", Role::Admin).await.unwrap();
        assert!(users.exists_with_role(Role::Admin).await.unwrap());
        assert!(!users.exists_with_role(Role::Staff).await.unwrap());

        let found = users.find_by_username("owner").await.unwrap().unwrap();
        assert_eq!(found.user.id, created.id);
        assert_eq!(found.user.role, Role::Admin);
        assert_eq!(found.password_hash, "$argon2id$stub");
        assert!(users.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().insert("cashier", "h", Role::Staff).await.unwrap();

        let err = db.users().insert("cashier", "h", Role::Staff).await.unwrap_err();
        assert!(err.is_unique_violation_on("username"));
    }
}
