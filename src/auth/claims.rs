use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload attached to every authenticated request. Handlers trust the
/// `username` claim without a second lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,        // user ID
    pub username: String, // login name, used to resolve the profile
    pub iat: usize,       // issued at (unix timestamp)
    pub exp: usize,       // expires at (unix timestamp)
    pub iss: String,      // issuer
    pub aud: String,      // audience
}
