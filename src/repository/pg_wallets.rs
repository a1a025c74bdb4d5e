//! Postgres 钱包仓储
//! 表结构见 migrations/0001_init.sql

use anyhow::Result;
use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::wallet_repository::{
    decode_continuation_token, encode_continuation_token, AdditionalWalletRepository,
    LegacyCredentialsRepository, WalletRepository,
};
use crate::{
    domain::{LegacyCredentialsRecord, Page, Wallet},
    infrastructure::db::PgPool,
};

#[derive(Debug, FromRow)]
struct WalletRow {
    blockchain_type: String,
    asset_id: String,
    client_id: Uuid,
    address: String,
}

impl From<WalletRow> for Wallet {
    fn from(row: WalletRow) -> Self {
        Wallet::new(row.blockchain_type, row.asset_id, row.client_id, row.address)
    }
}

#[derive(Debug, FromRow)]
struct LegacyCredentialsRow {
    client_id: Uuid,
    asset_id: String,
    asset_address: String,
    address: String,
    public_key: String,
    encoded_key: String,
}

/// 多取一行用来判断是否还有下一页
fn into_page(mut rows: Vec<WalletRow>, offset: usize, take: usize) -> Page<Wallet> {
    let has_more = rows.len() > take;
    rows.truncate(take);
    let continuation_token = encode_continuation_token(offset, rows.len(), has_more);

    Page {
        items: rows.into_iter().map(Wallet::from).collect(),
        continuation_token,
    }
}

pub struct PgWalletRepository {
    pool: PgPool,
}

impl PgWalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletRepository for PgWalletRepository {
    async fn add(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
        address: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO wallets_default (blockchain_type, asset_id, client_id, address, created_at)
             VALUES ($1, $2, $3, $4, CURRENT_TIMESTAMP)",
        )
        .bind(blockchain_type)
        .bind(asset_id)
        .bind(client_id)
        .bind(address)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn try_get(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> Result<Option<Wallet>> {
        let row = sqlx::query_as::<_, WalletRow>(
            "SELECT blockchain_type, asset_id, client_id, address
             FROM wallets_default
             WHERE blockchain_type = $1 AND asset_id = $2 AND client_id = $3",
        )
        .bind(blockchain_type)
        .bind(asset_id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Wallet::from))
    }

    async fn try_get_by_address(
        &self,
        blockchain_type: &str,
        address: &str,
    ) -> Result<Option<Wallet>> {
        let row = sqlx::query_as::<_, WalletRow>(
            "SELECT blockchain_type, asset_id, client_id, address
             FROM wallets_default
             WHERE blockchain_type = $1 AND address = $2
             LIMIT 1",
        )
        .bind(blockchain_type)
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Wallet::from))
    }

    async fn exists(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                SELECT 1 FROM wallets_default
                WHERE blockchain_type = $1 AND asset_id = $2 AND client_id = $3
             )",
        )
        .bind(blockchain_type)
        .bind(asset_id)
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn delete_if_exists(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> Result<()> {
        sqlx::query(
            "DELETE FROM wallets_default
             WHERE blockchain_type = $1 AND asset_id = $2 AND client_id = $3",
        )
        .bind(blockchain_type)
        .bind(asset_id)
        .bind(client_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_all(
        &self,
        client_id: Uuid,
        take: usize,
        continuation_token: Option<&str>,
    ) -> Result<Page<Wallet>> {
        let offset = decode_continuation_token(continuation_token)?;

        let rows = sqlx::query_as::<_, WalletRow>(
            "SELECT blockchain_type, asset_id, client_id, address
             FROM wallets_default
             WHERE client_id = $1
             ORDER BY blockchain_type, asset_id
             LIMIT $2 OFFSET $3",
        )
        .bind(client_id)
        .bind((take + 1) as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(into_page(rows, offset, take))
    }

    async fn get_by_asset(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        take: usize,
        continuation_token: Option<&str>,
    ) -> Result<Page<Wallet>> {
        let offset = decode_continuation_token(continuation_token)?;

        let rows = sqlx::query_as::<_, WalletRow>(
            "SELECT blockchain_type, asset_id, client_id, address
             FROM wallets_default
             WHERE blockchain_type = $1 AND asset_id = $2
             ORDER BY client_id
             LIMIT $3 OFFSET $4",
        )
        .bind(blockchain_type)
        .bind(asset_id)
        .bind((take + 1) as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(into_page(rows, offset, take))
    }
}

pub struct PgAdditionalWalletRepository {
    pool: PgPool,
}

impl PgAdditionalWalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdditionalWalletRepository for PgAdditionalWalletRepository {
    async fn add(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
        address: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO wallets_additional (blockchain_type, asset_id, client_id, address, created_at)
             VALUES ($1, $2, $3, $4, CURRENT_TIMESTAMP)
             ON CONFLICT (blockchain_type, asset_id, client_id, address) DO NOTHING",
        )
        .bind(blockchain_type)
        .bind(asset_id)
        .bind(client_id)
        .bind(address)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn exists(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                SELECT 1 FROM wallets_additional
                WHERE blockchain_type = $1 AND asset_id = $2 AND client_id = $3
             )",
        )
        .bind(blockchain_type)
        .bind(asset_id)
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn try_get_by_address(
        &self,
        blockchain_type: &str,
        address: &str,
    ) -> Result<Option<Wallet>> {
        let row = sqlx::query_as::<_, WalletRow>(
            "SELECT blockchain_type, asset_id, client_id, address
             FROM wallets_additional
             WHERE blockchain_type = $1 AND address = $2
             LIMIT 1",
        )
        .bind(blockchain_type)
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Wallet::from))
    }

    async fn delete_all(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM wallets_additional
             WHERE blockchain_type = $1 AND asset_id = $2 AND client_id = $3",
        )
        .bind(blockchain_type)
        .bind(asset_id)
        .bind(client_id)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            blockchain_type,
            asset_id,
            %client_id,
            deleted = result.rows_affected(),
            "Additional wallets deleted"
        );
        Ok(())
    }
}

pub struct PgLegacyCredentialsRepository {
    pool: PgPool,
}

impl PgLegacyCredentialsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LegacyCredentialsRepository for PgLegacyCredentialsRepository {
    async fn insert_or_replace(&self, record: LegacyCredentialsRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO legacy_credentials
                (client_id, asset_id, asset_address, address, public_key, encoded_key, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, CURRENT_TIMESTAMP)
             ON CONFLICT (client_id, asset_id) DO UPDATE SET
                asset_address = EXCLUDED.asset_address,
                address = EXCLUDED.address,
                public_key = EXCLUDED.public_key,
                encoded_key = EXCLUDED.encoded_key,
                updated_at = CURRENT_TIMESTAMP",
        )
        .bind(record.client_id)
        .bind(&record.asset_id)
        .bind(&record.asset_address)
        .bind(&record.address)
        .bind(&record.public_key)
        .bind(&record.encoded_key)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn try_get(
        &self,
        client_id: Uuid,
        asset_id: &str,
    ) -> Result<Option<LegacyCredentialsRecord>> {
        let row = sqlx::query_as::<_, LegacyCredentialsRow>(
            "SELECT client_id, asset_id, asset_address, address, public_key, encoded_key
             FROM legacy_credentials
             WHERE client_id = $1 AND asset_id = $2",
        )
        .bind(client_id)
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| LegacyCredentialsRecord {
            client_id: r.client_id,
            asset_id: r.asset_id,
            asset_address: r.asset_address,
            address: r.address,
            public_key: r.public_key,
            encoded_key: r.encoded_key,
        }))
    }
}
