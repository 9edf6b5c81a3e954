use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use uuid::Uuid;

use crate::{
    clock::Clock,
    domain::*,
    error::{AppError, Result},
    pricing::round_pct,
    repository::{BookingRepository, NewSettlement, PayoutRepository, UserRepository},
};

/// Monthly host payout aggregation. Batches materialize lazily: the first
/// admin query for a period scans that month's revenue-bearing bookings,
/// nets out refunds, splits the platform fee per host, and persists the
/// result. Subsequent queries return the stored batch untouched, so
/// bookings reconciled after the cut never shift an already-materialized
/// period.
pub struct PayoutService {
    booking_repo: Arc<dyn BookingRepository>,
    payout_repo: Arc<dyn PayoutRepository>,
    user_repo: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    platform_fee_pct: f64,
    utc_offset_hours: i32,
}

impl PayoutService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        payout_repo: Arc<dyn PayoutRepository>,
        user_repo: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
        platform_fee_pct: f64,
        utc_offset_hours: i32,
    ) -> Self {
        Self {
            booking_repo,
            payout_repo,
            user_repo,
            clock,
            platform_fee_pct,
            utc_offset_hours,
        }
    }

    /// The settlement period: the calendar month before the current local
    /// one, rolling to December of the prior year in January.
    fn previous_period(&self) -> (u32, i32) {
        let today =
            (self.clock.now() + Duration::hours(self.utc_offset_hours as i64)).date_naive();
        if today.month() == 1 {
            (12, today.year() - 1)
        } else {
            (today.month() - 1, today.year())
        }
    }

    /// Returns the batch for the previous calendar month, materializing it
    /// on first call. Concurrent first calls race on unique(month, year);
    /// the loser re-fetches the winner's batch.
    pub async fn latest_batch(&self) -> Result<PayoutBatch> {
        let (month, year) = self.previous_period();

        if let Some(batch) = self.payout_repo.find_batch(month, year).await? {
            return Ok(batch);
        }

        match self.materialize_batch(month, year).await {
            Ok(batch) => Ok(batch),
            Err(AppError::Conflict(_)) => self
                .payout_repo
                .find_batch(month, year)
                .await?
                .ok_or_else(|| {
                    AppError::Internal("Payout batch vanished after conflict".to_string())
                }),
            Err(e) => Err(e),
        }
    }

    async fn materialize_batch(&self, month: u32, year: i32) -> Result<PayoutBatch> {
        let from_date = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::Internal(format!("Invalid period {month}/{year}")))?;
        let (next_month, next_year) = if month == 12 { (1, year + 1) } else { (month + 1, year) };
        // Exclusive upper bound: checkouts on the 1st of the next month
        // belong to that month's batch.
        let to_date = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .ok_or_else(|| AppError::Internal(format!("Invalid period {month}/{year}")))?;

        let rows = self.booking_repo.revenue_rows(from_date, to_date).await?;

        // BTreeMap keeps settlement order stable across runs.
        let mut per_host: BTreeMap<Uuid, HostRevenue> = BTreeMap::new();
        for row in rows {
            let net = row.total - row.refund_amount;
            // Fully refunded bookings carry no settleable revenue.
            if net <= 0 {
                continue;
            }
            let entry = per_host.entry(row.host_id).or_insert(HostRevenue {
                host_id: row.host_id,
                total_bookings: 0,
                total_net_revenue: 0,
            });
            entry.total_bookings += 1;
            entry.total_net_revenue += net;
        }

        let mut settlements = Vec::with_capacity(per_host.len());
        let mut total_gmv = 0i64;
        let mut total_platform_fee = 0i64;
        let mut total_payout = 0i64;
        for revenue in per_host.into_values() {
            let platform_fee = round_pct(revenue.total_net_revenue, self.platform_fee_pct);
            let payout_amount = revenue.total_net_revenue - platform_fee;

            let bank = self
                .user_repo
                .find_by_id(revenue.host_id)
                .await?
                .and_then(|host| host.bank_snapshot());
            if bank.is_none() {
                tracing::warn!(
                    host_id = %revenue.host_id,
                    "host has no bank details; settlement created without a destination"
                );
            }

            total_gmv += revenue.total_net_revenue;
            total_platform_fee += platform_fee;
            total_payout += payout_amount;
            settlements.push(NewSettlement {
                host_id: revenue.host_id,
                bank,
                total_bookings: revenue.total_bookings,
                total_net_revenue: revenue.total_net_revenue,
                platform_fee,
                payout_amount,
            });
        }

        let now = self.clock.now();
        let total_settlements = settlements.len() as i64;
        let status = if settlements.is_empty() {
            // Nothing to pay out; the batch is born complete.
            PayoutBatchStatus::Completed
        } else {
            PayoutBatchStatus::Processing
        };
        let batch = PayoutBatch {
            id: Uuid::new_v4(),
            month,
            year,
            from_date,
            to_date,
            total_gmv,
            total_platform_fee,
            total_payout,
            status,
            paid_count: 0,
            total_settlements,
            created_at: now,
            updated_at: now,
        };

        tracing::info!(
            month,
            year,
            hosts = total_settlements,
            total_gmv,
            total_payout,
            "materializing payout batch"
        );

        self.payout_repo.create_batch(batch, settlements).await
    }

    /// Settlements of a given batch, or of the latest batch when none is
    /// named (materializing it if needed).
    pub async fn list_settlements(&self, batch_id: Option<Uuid>) -> Result<Vec<HostSettlement>> {
        let batch_id = match batch_id {
            Some(id) => id,
            None => self.latest_batch().await?.id,
        };
        self.payout_repo.list_settlements(batch_id).await
    }

    /// Operator confirmation that one host transfer went out.
    pub async fn confirm_settlement(&self, id: Uuid) -> Result<HostSettlement> {
        let settlement = self
            .payout_repo
            .confirm_settlement(id, self.clock.now())
            .await?;
        tracing::info!(
            settlement_id = %id,
            host_id = %settlement.host_id,
            amount = settlement.payout_amount,
            "settlement payment confirmed"
        );
        Ok(settlement)
    }
}
