use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{
        BankSnapshot, HostSettlement, PayoutBatch, PayoutBatchStatus, SettlementStatus,
    },
    error::{AppError, Result},
    repository::{NewSettlement, PayoutRepository},
};

#[derive(FromRow)]
struct BatchRow {
    id: String,
    month: i64,
    year: i64,
    from_date: NaiveDate,
    to_date: NaiveDate,
    total_gmv: i64,
    total_platform_fee: i64,
    total_payout: i64,
    status: String,
    paid_count: i64,
    total_settlements: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct SettlementRow {
    id: String,
    batch_id: String,
    host_id: String,
    bank_name: Option<String>,
    bank_account_number: Option<String>,
    bank_account_holder: Option<String>,
    total_bookings: i64,
    total_net_revenue: i64,
    platform_fee: i64,
    payout_amount: i64,
    status: String,
    paid_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqlitePayoutRepository {
    pool: SqlitePool,
}

impl SqlitePayoutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn utc(dt: NaiveDateTime) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }

    fn row_to_batch(row: BatchRow) -> Result<PayoutBatch> {
        Ok(PayoutBatch {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            month: row.month as u32,
            year: row.year as i32,
            from_date: row.from_date,
            to_date: row.to_date,
            total_gmv: row.total_gmv,
            total_platform_fee: row.total_platform_fee,
            total_payout: row.total_payout,
            status: PayoutBatchStatus::parse(&row.status).ok_or_else(|| {
                AppError::Database(format!("Invalid payout batch status: {}", row.status))
            })?,
            paid_count: row.paid_count,
            total_settlements: row.total_settlements,
            created_at: Self::utc(row.created_at),
            updated_at: Self::utc(row.updated_at),
        })
    }

    fn row_to_settlement(row: SettlementRow) -> Result<HostSettlement> {
        let bank = match (row.bank_name, row.bank_account_number, row.bank_account_holder) {
            (Some(bank_name), Some(account_number), Some(account_holder)) => Some(BankSnapshot {
                bank_name,
                account_number,
                account_holder,
            }),
            _ => None,
        };

        Ok(HostSettlement {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            batch_id: Uuid::parse_str(&row.batch_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            host_id: Uuid::parse_str(&row.host_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            bank,
            total_bookings: row.total_bookings,
            total_net_revenue: row.total_net_revenue,
            platform_fee: row.platform_fee,
            payout_amount: row.payout_amount,
            status: SettlementStatus::parse(&row.status).ok_or_else(|| {
                AppError::Database(format!("Invalid settlement status: {}", row.status))
            })?,
            paid_at: row.paid_at.map(Self::utc),
            created_at: Self::utc(row.created_at),
            updated_at: Self::utc(row.updated_at),
        })
    }

    async fn find_batch_by_id(&self, id: Uuid) -> Result<Option<PayoutBatch>> {
        let row = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, month, year, from_date, to_date, total_gmv,
                   total_platform_fee, total_payout, status, paid_count,
                   total_settlements, created_at, updated_at
            FROM payout_batches
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_batch(r)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PayoutRepository for SqlitePayoutRepository {
    async fn find_batch(&self, month: u32, year: i32) -> Result<Option<PayoutBatch>> {
        let row = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, month, year, from_date, to_date, total_gmv,
                   total_platform_fee, total_payout, status, paid_count,
                   total_settlements, created_at, updated_at
            FROM payout_batches
            WHERE month = ? AND year = ?
            "#,
        )
        .bind(month as i64)
        .bind(year as i64)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_batch(r)?)),
            None => Ok(None),
        }
    }

    async fn create_batch(
        &self,
        batch: PayoutBatch,
        settlements: Vec<NewSettlement>,
    ) -> Result<PayoutBatch> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO payout_batches (
                id, month, year, from_date, to_date, total_gmv,
                total_platform_fee, total_payout, status, paid_count,
                total_settlements, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
            "#,
        )
        .bind(batch.id.to_string())
        .bind(batch.month as i64)
        .bind(batch.year as i64)
        .bind(batch.from_date)
        .bind(batch.to_date)
        .bind(batch.total_gmv)
        .bind(batch.total_platform_fee)
        .bind(batch.total_payout)
        .bind(batch.status.as_str())
        .bind(batch.total_settlements)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for settlement in &settlements {
            let (bank_name, account_number, account_holder) = match &settlement.bank {
                Some(bank) => (
                    Some(bank.bank_name.clone()),
                    Some(bank.account_number.clone()),
                    Some(bank.account_holder.clone()),
                ),
                None => (None, None, None),
            };

            sqlx::query(
                r#"
                INSERT INTO host_settlements (
                    id, batch_id, host_id, bank_name, bank_account_number,
                    bank_account_holder, total_bookings, total_net_revenue,
                    platform_fee, payout_amount, status, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(batch.id.to_string())
            .bind(settlement.host_id.to_string())
            .bind(bank_name)
            .bind(account_number)
            .bind(account_holder)
            .bind(settlement.total_bookings)
            .bind(settlement.total_net_revenue)
            .bind(settlement.platform_fee)
            .bind(settlement.payout_amount)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.find_batch_by_id(batch.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created batch".to_string()))
    }

    async fn list_settlements(&self, batch_id: Uuid) -> Result<Vec<HostSettlement>> {
        let rows = sqlx::query_as::<_, SettlementRow>(
            r#"
            SELECT id, batch_id, host_id, bank_name, bank_account_number,
                   bank_account_holder, total_bookings, total_net_revenue,
                   platform_fee, payout_amount, status, paid_at, created_at,
                   updated_at
            FROM host_settlements
            WHERE batch_id = ?
            ORDER BY total_net_revenue DESC
            "#,
        )
        .bind(batch_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_settlement).collect()
    }

    async fn find_settlement(&self, id: Uuid) -> Result<Option<HostSettlement>> {
        let row = sqlx::query_as::<_, SettlementRow>(
            r#"
            SELECT id, batch_id, host_id, bank_name, bank_account_number,
                   bank_account_holder, total_bookings, total_net_revenue,
                   platform_fee, payout_amount, status, paid_at, created_at,
                   updated_at
            FROM host_settlements
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_settlement(r)?)),
            None => Ok(None),
        }
    }

    async fn confirm_settlement(&self, id: Uuid, now: DateTime<Utc>) -> Result<HostSettlement> {
        let settlement = self
            .find_settlement(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Settlement not found".to_string()))?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE host_settlements
            SET status = 'paid', paid_at = ?, updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(now.naive_utc())
        .bind(now.naive_utc())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Settlement already confirmed".to_string(),
            ));
        }

        sqlx::query(
            r#"
            UPDATE payout_batches
            SET paid_count = paid_count + 1,
                status = CASE WHEN paid_count + 1 >= total_settlements
                              THEN 'completed' ELSE status END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now.naive_utc())
        .bind(settlement.batch_id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_settlement(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve settlement".to_string()))
    }
}
