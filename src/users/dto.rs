use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Request body for account creation.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for profile update. The password is optional; the stored
/// hash is recomputed only when one is supplied.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: Option<String>,
    pub role: String,
}

/// Redacted projection of a user returned to clients. The password hash is
/// never part of this shape.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub created_by: Uuid,
    #[serde(with = "time::serde::rfc3339::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<Uuid>,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_omits_absent_optionals() {
        let response = UserResponse {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "a@x.com".into(),
            name: "Alice".into(),
            role: "member".into(),
            access_token: None,
            created_at: OffsetDateTime::now_utc(),
            created_by: Uuid::new_v4(),
            updated_at: None,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        };

        let json = serde_json::to_value(&response).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("id"));
        assert!(obj.contains_key("created_at"));
        assert!(!obj.contains_key("access_token"));
        assert!(!obj.contains_key("updated_at"));
        assert!(!obj.contains_key("deleted_by"));
        assert!(!obj.contains_key("password"));
        assert!(!obj.contains_key("password_hash"));
    }
}
