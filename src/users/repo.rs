use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::users::model::User;

/// Persistence boundary for user records. One row per user, no caching;
/// every call goes straight to the backing store.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn exists_by_id(&self, id: Uuid) -> Result<bool, ApiError>;

    /// Fails with `Conflict` if the id is already taken, otherwise inserts
    /// the row inside a scoped transaction.
    async fn create(&self, user: &User) -> Result<(), ApiError>;

    /// Fails with `NotFound` if the id does not exist, otherwise replaces
    /// every mutable column inside a scoped transaction.
    async fn update(&self, user: &User) -> Result<(), ApiError>;

    /// Fails with `NotFound` when no row matches. Soft-deleted rows are
    /// returned as-is; filtering is the caller's decision.
    async fn find_by_username(&self, username: &str) -> Result<User, ApiError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn exists_by_id(&self, id: Uuid) -> Result<bool, ApiError> {
        let exists: bool =
            sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)"#)
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create(&self, user: &User) -> Result<(), ApiError> {
        // Ids are random v4 values, so a hit here is normally unreachable;
        // the unique constraints below are the authoritative guard.
        if self.exists_by_id(user.id).await? {
            return Err(ApiError::conflict("user already exists"));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, name, password_hash, role,
                created_at, created_by, updated_at, updated_by, deleted_at, deleted_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.created_at)
        .bind(user.created_by)
        .bind(user.updated_at)
        .bind(user.updated_by)
        .bind(user.deleted_at)
        .bind(user.deleted_by)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return ApiError::conflict("user already exists");
                }
            }
            ApiError::from(e)
        })?;
        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), ApiError> {
        if !self.exists_by_id(user.id).await? {
            return Err(ApiError::not_found("user"));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, name = $4, password_hash = $5, role = $6,
                updated_at = $7, updated_by = $8, deleted_at = $9, deleted_by = $10
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.updated_at)
        .bind(user.updated_by)
        .bind(user.deleted_at)
        .bind(user.deleted_by)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, name, password_hash, role,
                   created_at, created_by, updated_at, updated_by, deleted_at, deleted_by
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        user.ok_or_else(|| ApiError::not_found("user"))
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;

    use tokio::sync::RwLock;

    use super::*;

    /// In-memory store with the same contract as [`PgUserStore`], used to
    /// exercise the service layer without a database.
    #[derive(Default)]
    pub struct MemoryUserStore {
        users: RwLock<HashMap<Uuid, User>>,
    }

    impl MemoryUserStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn exists_by_id(&self, id: Uuid) -> Result<bool, ApiError> {
            Ok(self.users.read().await.contains_key(&id))
        }

        async fn create(&self, user: &User) -> Result<(), ApiError> {
            let mut users = self.users.write().await;
            if users.contains_key(&user.id) {
                return Err(ApiError::conflict("user already exists"));
            }
            if users.values().any(|u| u.username == user.username) {
                return Err(ApiError::conflict("user already exists"));
            }
            users.insert(user.id, user.clone());
            Ok(())
        }

        async fn update(&self, user: &User) -> Result<(), ApiError> {
            let mut users = self.users.write().await;
            if !users.contains_key(&user.id) {
                return Err(ApiError::not_found("user"));
            }
            users.insert(user.id, user.clone());
            Ok(())
        }

        async fn find_by_username(&self, username: &str) -> Result<User, ApiError> {
            self.users
                .read()
                .await
                .values()
                .find(|u| u.username == username)
                .cloned()
                .ok_or_else(|| ApiError::not_found("user"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryUserStore;
    use super::*;
    use crate::users::dto::CreateUserRequest;

    fn make_user(username: &str) -> User {
        User::new_from_request(
            CreateUserRequest {
                username: username.into(),
                email: format!("{username}@x.com"),
                name: username.into(),
                password: "secret1".into(),
                role: "member".into(),
            },
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_then_exists_and_find() {
        let store = MemoryUserStore::new();
        let user = make_user("alice");
        store.create(&user).await.unwrap();

        assert!(store.exists_by_id(user.id).await.unwrap());
        let found = store.find_by_username("alice").await.unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn create_duplicate_id_conflicts_without_write() {
        let store = MemoryUserStore::new();
        let user = make_user("alice");
        store.create(&user).await.unwrap();

        let mut clash = make_user("bob");
        clash.id = user.id;
        let err = store.create(&clash).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        // The original row survives untouched.
        let found = store.find_by_username("alice").await.unwrap();
        assert_eq!(found.username, "alice");
        assert!(store.find_by_username("bob").await.is_err());
    }

    #[tokio::test]
    async fn update_missing_id_is_not_found() {
        let store = MemoryUserStore::new();
        let user = make_user("alice");
        let err = store.update(&user).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn find_unknown_username_is_not_found() {
        let store = MemoryUserStore::new();
        let err = store.find_by_username("ghost").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn find_returns_soft_deleted_rows() {
        let store = MemoryUserStore::new();
        let mut user = make_user("alice");
        store.create(&user).await.unwrap();
        user.mark_deleted(user.id);
        store.update(&user).await.unwrap();

        let found = store.find_by_username("alice").await.unwrap();
        assert!(found.is_deleted());
    }
}
