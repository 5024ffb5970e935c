use serde::{Deserialize, Serialize};

/// Grouping for catalog services, code `SG-000N`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceGroup {
    pub id: String,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceGroupCreate {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceGroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// A sellable catalog service, code `DV-000N`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub code: String,
    pub group_id: String,
    /// Billing unit, free text ("buổi", "gói", "lần").
    pub unit: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCreate {
    pub name: String,
    pub group_id: String,
    pub unit: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceUpdate {
    pub name: Option<String>,
    pub group_id: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}
