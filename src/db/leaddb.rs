// db/leaddb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::db::DBClient;
use crate::models::leadmodel::{InstallerLead, QuoteRequest, SignedContract};

#[async_trait]
pub trait LeadExt {
    /// Creates a new quote request with status "New". Returns None when the
    /// (customer, installer) pair already has one; no second row is created.
    async fn create_quote_request(
        &self,
        customer_id: i64,
        installer_id: i64,
    ) -> Result<Option<QuoteRequest>, sqlx::Error>;

    async fn get_leads_for_installer(
        &self,
        installer_id: i64,
    ) -> Result<Vec<InstallerLead>, sqlx::Error>;

    /// Stores the signed contract and flips contract_accepted on the user in
    /// one transaction. Returns None when the installer already signed.
    async fn save_signed_contract(
        &self,
        user_id: i64,
        signature_image: &str,
        ip_address: Option<&str>,
        signed_at: DateTime<Utc>,
    ) -> Result<Option<SignedContract>, sqlx::Error>;
}

#[async_trait]
impl LeadExt for DBClient {
    async fn create_quote_request(
        &self,
        customer_id: i64,
        installer_id: i64,
    ) -> Result<Option<QuoteRequest>, sqlx::Error> {
        sqlx::query_as::<_, QuoteRequest>(
            r#"
            INSERT INTO quote_requests (customer_id, installer_id, status)
            VALUES ($1, $2, 'New')
            ON CONFLICT (customer_id, installer_id) DO NOTHING
            RETURNING id, customer_id, installer_id, status, created_at, updated_at
            "#,
        )
        .bind(customer_id)
        .bind(installer_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_leads_for_installer(
        &self,
        installer_id: i64,
    ) -> Result<Vec<InstallerLead>, sqlx::Error> {
        sqlx::query_as::<_, InstallerLead>(
            r#"
            SELECT
                q.id, q.status, q.created_at,
                u.id AS customer_id,
                u.full_name AS customer_name,
                u.email AS customer_email,
                u.phone_number AS customer_phone,
                u.county AS customer_county
            FROM quote_requests q
            JOIN users u ON u.id = q.customer_id
            WHERE q.installer_id = $1
            ORDER BY q.created_at DESC
            "#,
        )
        .bind(installer_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn save_signed_contract(
        &self,
        user_id: i64,
        signature_image: &str,
        ip_address: Option<&str>,
        signed_at: DateTime<Utc>,
    ) -> Result<Option<SignedContract>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let contract = sqlx::query_as::<_, SignedContract>(
            r#"
            INSERT INTO signed_contracts (user_id, signature_image, ip_address, signed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING id, user_id, signature_image, ip_address, signed_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(signature_image)
        .bind(ip_address)
        .bind(signed_at)
        .fetch_optional(&mut *tx)
        .await?;

        if contract.is_some() {
            sqlx::query(
                r#"
                UPDATE users
                SET contract_accepted = TRUE,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(contract)
    }
}
