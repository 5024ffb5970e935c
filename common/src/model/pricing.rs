use serde::{Deserialize, Serialize};

/// A named price list, code `BG-000N`. Unit prices per service live in the
/// attached [`ServicePrice`] rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricePackage {
    pub id: String,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub prices: Vec<ServicePrice>,
}

/// Unit price of one service inside a package. Unique per (package, service).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServicePrice {
    pub service_id: String,
    pub service_name: String,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceEntry {
    pub service_id: String,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePackageCreate {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub prices: Vec<PriceEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricePackageUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    /// When present, replaces the package's price rows wholesale.
    pub prices: Option<Vec<PriceEntry>>,
}
