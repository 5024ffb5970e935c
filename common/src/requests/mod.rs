use serde::Deserialize;

/// Query parameters shared by every paged list endpoint. Filters that a
/// resource does not support are simply ignored by its handler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// 1-based page number, default 1.
    pub page: Option<u32>,
    /// Page size, default 20, capped at 100.
    pub limit: Option<u32>,
    /// Substring match on name/code (and phone for customers).
    pub search: Option<String>,
    pub active: Option<bool>,
    pub group_id: Option<String>,
    pub customer_id: Option<String>,
    pub stage: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Payload for the Google-Maps short-link resolver.
#[derive(Debug, Deserialize)]
pub struct ResolveMapRequest {
    pub url: String,
}
