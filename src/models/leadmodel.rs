use chrono::prelude::*;
use serde::{Deserialize, Serialize};

/// A customer's expression of interest in a specific installer.
/// At most one row per (customer, installer) pair.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct QuoteRequest {
    pub id: i64,
    pub customer_id: i64,
    pub installer_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct SignedContract {
    pub id: i64,
    pub user_id: i64,
    /// Base64 data URI of the drawn signature
    pub signature_image: String,
    pub ip_address: Option<String>,
    /// Timestamp reported by the signing client
    pub signed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A quote request joined with the requesting customer's contact fields,
/// shaped for the installer leads listing.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct InstallerLead {
    pub id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub customer_county: Option<String>,
}
