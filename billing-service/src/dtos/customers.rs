use crate::models::Bill;
use serde::{Deserialize, Serialize};

/// Query string for `/get_customer`. Both parameters are required; the
/// handler rejects the request with 400 when either is missing.
#[derive(Debug, Deserialize)]
pub struct CustomerLookupQuery {
    #[serde(rename = "searchBy")]
    pub search_by: Option<String>,
    pub value: Option<String>,
}

/// Customer identity as exposed by the lookup endpoint.
#[derive(Debug, Serialize)]
pub struct CustomerPayload {
    pub id: String,
    pub name: String,
    pub phone: String,
}

impl From<&Bill> for CustomerPayload {
    fn from(bill: &Bill) -> Self {
        Self {
            id: bill.customer_id.clone(),
            name: bill.customer_name.clone(),
            phone: bill.phone.clone().unwrap_or_default(),
        }
    }
}
