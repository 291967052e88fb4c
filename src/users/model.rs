use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::error::ApiError;
use crate::users::dto::{CreateUserRequest, UpdateUserRequest, UserResponse};

/// User record as stored in the `users` table. Never serialized directly;
/// clients only ever see the [`UserResponse`] projection.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: OffsetDateTime,
    pub created_by: Uuid,
    pub updated_at: Option<OffsetDateTime>,
    pub updated_by: Option<Uuid>,
    pub deleted_at: Option<OffsetDateTime>,
    pub deleted_by: Option<Uuid>,
}

impl User {
    /// Builds a fresh record from a creation request: generates the id,
    /// validates required fields and hashes the password. `acting` is the
    /// principal performing the creation; without one (public signup) the
    /// record is marked as created by itself.
    pub fn new_from_request(
        req: CreateUserRequest,
        acting: Option<Uuid>,
    ) -> Result<Self, ApiError> {
        validate_required(&[
            ("username", &req.username),
            ("email", &req.email),
            ("name", &req.name),
            ("password", &req.password),
            ("role", &req.role),
        ])?;

        let id = Uuid::new_v4();
        let password_hash =
            hash_password(&req.password).map_err(|e| ApiError::internal(e.to_string()))?;

        Ok(Self {
            id,
            username: req.username,
            email: req.email,
            name: req.name,
            password_hash,
            role: req.role,
            created_at: OffsetDateTime::now_utc(),
            created_by: acting.unwrap_or(id),
            updated_at: None,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        })
    }

    /// Replaces the mutable fields from an update request and stamps the
    /// audit columns. Validation and hashing happen before any field is
    /// assigned, so a failed update leaves the record untouched.
    pub fn apply_update(
        &mut self,
        req: UpdateUserRequest,
        acting_id: Uuid,
    ) -> Result<(), ApiError> {
        let mut fields = vec![
            ("username", req.username.as_str()),
            ("email", req.email.as_str()),
            ("name", req.name.as_str()),
            ("role", req.role.as_str()),
        ];
        if let Some(password) = &req.password {
            fields.push(("password", password.as_str()));
        }
        validate_required(&fields)?;

        let password_hash = match &req.password {
            Some(password) => {
                Some(hash_password(password).map_err(|e| ApiError::internal(e.to_string()))?)
            }
            None => None,
        };

        self.username = req.username;
        self.email = req.email;
        self.name = req.name;
        self.role = req.role;
        if let Some(hash) = password_hash {
            self.password_hash = hash;
        }
        self.updated_at = Some(OffsetDateTime::now_utc());
        self.updated_by = Some(acting_id);

        Ok(())
    }

    /// Transition `active -> deleted`. Both deletion columns are set
    /// together; partial deletion state cannot be constructed through here.
    pub fn mark_deleted(&mut self, acting_id: Uuid) {
        self.deleted_at = Some(OffsetDateTime::now_utc());
        self.deleted_by = Some(acting_id);
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some() && self.deleted_by.is_some()
    }

    pub fn to_response(&self, access_token: Option<String>) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role.clone(),
            access_token,
            created_at: self.created_at,
            created_by: self.created_by,
            updated_at: self.updated_at,
            updated_by: self.updated_by,
            deleted_at: self.deleted_at,
            deleted_by: self.deleted_by,
        }
    }
}

fn validate_required(fields: &[(&str, &str)]) -> Result<(), ApiError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}
