use serde::{Deserialize, Serialize};

/// A taxonomy group (care group or reject group). The `code` is derived from
/// the initials of `name`, with a numeric suffix when that collides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxonomyGroup {
    pub id: String,
    pub name: String,
    pub code: String,
    pub display_order: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// An entry under a taxonomy group (care result or reject reason).
///
/// `group_name` is a denormalized copy of the parent's name, rewritten whenever
/// the parent is renamed. `code` is prefixed with the first two characters of
/// the parent group's code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxonomyItem {
    pub id: String,
    pub group_id: String,
    pub group_name: String,
    pub name: String,
    pub classification: Option<String>,
    pub code: String,
    pub display_order: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyGroupCreate {
    pub name: String,
    pub display_order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyGroupUpdate {
    pub name: Option<String>,
    pub display_order: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyItemCreate {
    pub group_id: String,
    pub name: String,
    pub classification: Option<String>,
    pub display_order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyItemUpdate {
    pub name: Option<String>,
    pub classification: Option<String>,
    pub display_order: Option<i64>,
    pub is_active: Option<bool>,
}
