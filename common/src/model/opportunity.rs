use serde::{Deserialize, Serialize};

/// A sales opportunity attached to a customer, code `CH-000N`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Opportunity {
    pub id: String,
    pub code: String,
    pub customer_id: String,
    pub title: String,
    /// Pipeline stage: "moi", "dang-cham-soc", "bao-gia", "thanh-cong", "that-bai".
    pub stage: String,
    /// Estimated value in VND.
    pub value: Option<f64>,
    pub assignee_id: Option<String>,
    pub care_result_id: Option<String>,
    pub reject_reason_id: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunityCreate {
    pub customer_id: String,
    pub title: String,
    pub stage: Option<String>,
    pub value: Option<f64>,
    pub assignee_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpportunityUpdate {
    pub title: Option<String>,
    pub stage: Option<String>,
    pub value: Option<f64>,
    pub assignee_id: Option<String>,
    pub care_result_id: Option<String>,
    pub reject_reason_id: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}
