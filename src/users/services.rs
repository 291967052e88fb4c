use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::verify_password;
use crate::auth::JwtKeys;
use crate::error::ApiError;
use crate::users::dto::{
    CreateUserRequest, LoginRequest, LoginResponse, UpdateUserRequest, UserResponse,
};
use crate::users::model::User;
use crate::users::repo::UserStore;

/// Orchestrates validation, hashing, token issuance and store calls. Store
/// errors pass through unchanged; nothing here retries or reclassifies.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    jwt: JwtKeys,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtKeys) -> Self {
        Self { store, jwt }
    }

    /// Creates an account. `acting` is the principal performing the
    /// creation; public signup passes `None` and the record becomes
    /// self-authored.
    pub async fn create(
        &self,
        req: CreateUserRequest,
        acting: Option<Uuid>,
    ) -> Result<UserResponse, ApiError> {
        let user = User::new_from_request(req, acting)?;
        self.store.create(&user).await?;
        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user.to_response(None))
    }

    /// Resolves the user, checks the password and issues an access token.
    /// A wrong password is an authentication failure, never a silent
    /// success.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, ApiError> {
        let user = self.store.find_by_username(&req.username).await?;

        if user.is_deleted() {
            warn!(username = %user.username, "login attempt on deleted account");
            return Err(ApiError::unauthorized("invalid credentials"));
        }

        if !verify_password(&req.password, &user.password_hash) {
            warn!(username = %user.username, "login with invalid password");
            return Err(ApiError::unauthorized("invalid credentials"));
        }

        let access_token = self
            .jwt
            .sign(user.id, &user.username)
            .map_err(|e| ApiError::internal(e.to_string()))?;

        info!(user_id = %user.id, username = %user.username, "user logged in");
        Ok(LoginResponse { access_token })
    }

    pub async fn resolve_by_username(&self, username: &str) -> Result<UserResponse, ApiError> {
        let user = self.store.find_by_username(username).await?;
        Ok(user.to_response(None))
    }

    /// Applies a profile update for the user named in the claims. The user
    /// acts on their own record, so the audit columns point at them.
    pub async fn update(
        &self,
        username: &str,
        req: UpdateUserRequest,
    ) -> Result<UserResponse, ApiError> {
        let mut user = self.store.find_by_username(username).await?;
        let acting_id = user.id;
        user.apply_update(req, acting_id)?;
        self.store.update(&user).await?;
        info!(user_id = %user.id, username = %user.username, "user updated");
        Ok(user.to_response(None))
    }

    /// Soft delete: stamps both deletion columns and persists the row.
    pub async fn delete(&self, username: &str, acting_id: Uuid) -> Result<UserResponse, ApiError> {
        let mut user = self.store.find_by_username(username).await?;
        user.mark_deleted(acting_id);
        self.store.update(&user).await?;
        info!(user_id = %user.id, username = %user.username, "user deleted");
        Ok(user.to_response(None))
    }
}
