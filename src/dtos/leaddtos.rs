use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::leadmodel::InstallerLead;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct SignContractDto {
    /// Base64 data URI of the drawn signature (data:image/...)
    #[validate(length(min = 1, message = "Signature image is required"))]
    pub signature_image: String,

    pub signed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteRequestResponseDto {
    pub message: String,
    pub quote_request_id: i64,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeadDto {
    pub id: i64,
    pub status: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub customer: LeadCustomerDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeadCustomerDto {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub county: Option<String>,
}

impl LeadDto {
    pub fn from_lead(lead: &InstallerLead) -> Self {
        LeadDto {
            id: lead.id,
            status: lead.status.to_owned(),
            created_at: lead.created_at,
            customer: LeadCustomerDto {
                id: lead.customer_id,
                full_name: lead.customer_name.to_owned(),
                email: lead.customer_email.to_owned(),
                phone_number: lead.customer_phone.to_owned(),
                county: lead.customer_county.to_owned(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeadListResponseDto {
    pub leads: Vec<LeadDto>,
}
