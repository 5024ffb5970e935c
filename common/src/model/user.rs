use serde::{Deserialize, Serialize};

/// API-facing user record; the password hash never leaves the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    /// "admin" or "staff".
    pub role: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}
