use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CancellationPolicy, Listing, ListingStatus, Promotion},
    error::{AppError, Result},
    repository::ListingRepository,
};

#[derive(FromRow)]
struct ListingRow {
    id: String,
    host_id: String,
    title: String,
    status: String,
    base_price: i64,
    cleaning_fee: i64,
    service_fee: i64,
    tax_pct: f64,
    refund_pct_3_days: i64,
    refund_pct_2_days: i64,
    refund_pct_1_day: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct PromotionRow {
    id: String,
    code: String,
    discount_pct: f64,
    active: bool,
    expires_at: Option<NaiveDateTime>,
}

pub struct SqliteListingRepository {
    pool: SqlitePool,
}

impl SqliteListingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_listing(row: ListingRow) -> Result<Listing> {
        Ok(Listing {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            host_id: Uuid::parse_str(&row.host_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            status: ListingStatus::parse(&row.status).ok_or_else(|| {
                AppError::Database(format!("Invalid listing status: {}", row.status))
            })?,
            base_price: row.base_price,
            cleaning_fee: row.cleaning_fee,
            service_fee: row.service_fee,
            tax_pct: row.tax_pct,
            cancellation_policy: CancellationPolicy {
                refund_pct_3_days: row.refund_pct_3_days,
                refund_pct_2_days: row.refund_pct_2_days,
                refund_pct_1_day: row.refund_pct_1_day,
            },
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn row_to_promotion(row: PromotionRow) -> Result<Promotion> {
        Ok(Promotion {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            code: row.code,
            discount_pct: row.discount_pct,
            active: row.active,
            expires_at: row
                .expires_at
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
        })
    }
}

#[async_trait]
impl ListingRepository for SqliteListingRepository {
    async fn create(&self, listing: Listing) -> Result<Listing> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            r#"
            INSERT INTO listings (
                id, host_id, title, status, base_price, cleaning_fee,
                service_fee, tax_pct, refund_pct_3_days, refund_pct_2_days,
                refund_pct_1_day, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(listing.id.to_string())
        .bind(listing.host_id.to_string())
        .bind(&listing.title)
        .bind(listing.status.as_str())
        .bind(listing.base_price)
        .bind(listing.cleaning_fee)
        .bind(listing.service_fee)
        .bind(listing.tax_pct)
        .bind(listing.cancellation_policy.refund_pct_3_days)
        .bind(listing.cancellation_policy.refund_pct_2_days)
        .bind(listing.cancellation_policy.refund_pct_1_day)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(listing.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created listing".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT id, host_id, title, status, base_price, cleaning_fee,
                   service_fee, tax_pct, refund_pct_3_days, refund_pct_2_days,
                   refund_pct_1_day, created_at, updated_at
            FROM listings
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_listing(r)?)),
            None => Ok(None),
        }
    }

    async fn find_approved(&self, id: Uuid) -> Result<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT id, host_id, title, status, base_price, cleaning_fee,
                   service_fee, tax_pct, refund_pct_3_days, refund_pct_2_days,
                   refund_pct_1_day, created_at, updated_at
            FROM listings
            WHERE id = ? AND status = 'approved'
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_listing(r)?)),
            None => Ok(None),
        }
    }

    async fn find_promotion(&self, code: &str) -> Result<Option<Promotion>> {
        let row = sqlx::query_as::<_, PromotionRow>(
            r#"
            SELECT id, code, discount_pct, active, expires_at
            FROM promotions
            WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_promotion(r)?)),
            None => Ok(None),
        }
    }

    async fn create_promotion(&self, promotion: Promotion) -> Result<Promotion> {
        sqlx::query(
            r#"
            INSERT INTO promotions (id, code, discount_pct, active, expires_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(promotion.id.to_string())
        .bind(&promotion.code)
        .bind(promotion.discount_pct)
        .bind(promotion.active)
        .bind(promotion.expires_at.map(|dt| dt.naive_utc()))
        .execute(&self.pool)
        .await?;

        Ok(promotion)
    }
}
