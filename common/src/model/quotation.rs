use serde::{Deserialize, Serialize};

/// A quotation for a customer, code `QU-000N`. Lines snapshot the service name
/// and unit price at creation time; later catalog renames do not touch them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quotation {
    pub id: String,
    pub code: String,
    pub customer_id: String,
    pub opportunity_id: Option<String>,
    /// Price package used to fill in unit prices, when one was chosen.
    pub package_id: Option<String>,
    /// "draft", "sent", "accepted", "rejected".
    pub status: String,
    pub notes: Option<String>,
    pub total: f64,
    pub created_at: String,
    pub updated_at: String,
    pub lines: Vec<QuotationLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuotationLine {
    pub service_id: String,
    pub service_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub line_total: f64,
}

/// Line as submitted by the client. When `unit_price` is absent the package's
/// price for the service is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotationLineInput {
    pub service_id: String,
    pub quantity: f64,
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotationCreate {
    pub customer_id: String,
    pub opportunity_id: Option<String>,
    pub package_id: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<QuotationLineInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotationUpdate {
    pub status: Option<String>,
    pub notes: Option<String>,
    /// When present, replaces the quotation's lines wholesale.
    pub lines: Option<Vec<QuotationLineInput>>,
}
