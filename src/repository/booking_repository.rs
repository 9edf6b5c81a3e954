use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{
        BankSnapshot, Booking, BookingStatus, BookingTxn, CancellationPolicy, ContractRecord,
        NewBooking, PaymentRecord, PaymentStatus, PricingSnapshot, RefundRecord, RefundStatus,
    },
    error::{AppError, Result},
    repository::{BookingRepository, PaymentReceipt, RevenueRow},
};

/// Blocking status set, inlined into queries. Must match the predicate of
/// the idx_bookings_no_double_booking partial index.
const BLOCKING: &str = "('awaiting_payment', 'payment_processing', 'paid', 'completed')";

/// Statuses the payout aggregator treats as revenue-bearing.
const REVENUE_BEARING: &str =
    "('completed', 'paid', 'refunded', 'cancelled_by_guest', 'cancelled_by_host')";

const BOOKING_COLUMNS: &str = r#"
    id, guest_id, host_id, listing_id, status,
    checkin_date, checkout_date, nights, guest_count,
    currency, base_price_per_night, cleaning_fee, service_fee, tax_pct,
    subtotal, tax, platform_fee, discount, total, host_payout,
    refund_pct_3_days, refund_pct_2_days, refund_pct_1_day,
    order_code, payment_provider, payment_method, payment_intent_id,
    payment_checkout_url, payment_qr_data, payment_status, paid_at,
    refund_bank_name, refund_bank_account_number, refund_bank_account_holder,
    refund_amount, refund_pct, refund_reason, refund_status,
    contract_preview_hash, contract_executed_at, contract_pdf_key, contract_pdf_url,
    expires_at, requested_at, host_responded_at, completed_at, cancelled_at,
    cancel_reason, created_at, updated_at
"#;

#[derive(FromRow)]
struct BookingRow {
    id: String,
    guest_id: String,
    host_id: String,
    listing_id: String,
    status: String,
    checkin_date: NaiveDate,
    checkout_date: NaiveDate,
    nights: i64,
    guest_count: i64,
    currency: String,
    base_price_per_night: i64,
    cleaning_fee: i64,
    service_fee: i64,
    tax_pct: f64,
    subtotal: i64,
    tax: i64,
    platform_fee: i64,
    discount: i64,
    total: i64,
    host_payout: i64,
    refund_pct_3_days: i64,
    refund_pct_2_days: i64,
    refund_pct_1_day: i64,
    order_code: Option<String>,
    payment_provider: String,
    payment_method: String,
    payment_intent_id: Option<String>,
    payment_checkout_url: Option<String>,
    payment_qr_data: Option<String>,
    payment_status: String,
    paid_at: Option<NaiveDateTime>,
    refund_bank_name: Option<String>,
    refund_bank_account_number: Option<String>,
    refund_bank_account_holder: Option<String>,
    refund_amount: Option<i64>,
    refund_pct: Option<i64>,
    refund_reason: Option<String>,
    refund_status: Option<String>,
    contract_preview_hash: Option<String>,
    contract_executed_at: Option<NaiveDateTime>,
    contract_pdf_key: Option<String>,
    contract_pdf_url: Option<String>,
    expires_at: Option<NaiveDateTime>,
    requested_at: NaiveDateTime,
    host_responded_at: Option<NaiveDateTime>,
    completed_at: Option<NaiveDateTime>,
    cancelled_at: Option<NaiveDateTime>,
    cancel_reason: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct TxnRow {
    id: String,
    booking_id: String,
    provider_txn_id: String,
    amount: i64,
    status: String,
    raw: String,
    occurred_at: NaiveDateTime,
}

#[derive(FromRow)]
struct RevenueSqlRow {
    host_id: String,
    total: i64,
    refund_amount: Option<i64>,
}

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn utc(dt: NaiveDateTime) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }

    fn row_to_booking(row: BookingRow) -> Result<Booking> {
        let parse_uuid =
            |s: &str| Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()));

        let refund = match (
            row.refund_bank_name,
            row.refund_bank_account_number,
            row.refund_bank_account_holder,
            row.refund_amount,
            row.refund_pct,
            row.refund_status,
        ) {
            (Some(bank_name), Some(account_number), Some(account_holder), Some(amount), Some(pct), Some(status)) => {
                Some(RefundRecord {
                    bank: BankSnapshot {
                        bank_name,
                        account_number,
                        account_holder,
                    },
                    amount,
                    pct,
                    reason: row.refund_reason,
                    status: RefundStatus::parse(&status).ok_or_else(|| {
                        AppError::Database(format!("Invalid refund status: {}", status))
                    })?,
                })
            }
            _ => None,
        };

        Ok(Booking {
            id: parse_uuid(&row.id)?,
            guest_id: parse_uuid(&row.guest_id)?,
            host_id: parse_uuid(&row.host_id)?,
            listing_id: parse_uuid(&row.listing_id)?,
            status: BookingStatus::parse(&row.status).ok_or_else(|| {
                AppError::Database(format!("Invalid booking status: {}", row.status))
            })?,
            checkin_date: row.checkin_date,
            checkout_date: row.checkout_date,
            nights: row.nights,
            guest_count: row.guest_count,
            pricing: PricingSnapshot {
                currency: row.currency,
                base_price_per_night: row.base_price_per_night,
                cleaning_fee: row.cleaning_fee,
                service_fee: row.service_fee,
                tax_pct: row.tax_pct,
                subtotal: row.subtotal,
                tax: row.tax,
                platform_fee: row.platform_fee,
                discount: row.discount,
                total: row.total,
                host_payout: row.host_payout,
            },
            cancellation_policy: CancellationPolicy {
                refund_pct_3_days: row.refund_pct_3_days,
                refund_pct_2_days: row.refund_pct_2_days,
                refund_pct_1_day: row.refund_pct_1_day,
            },
            order_code: row.order_code,
            payment: PaymentRecord {
                provider: row.payment_provider,
                method: row.payment_method,
                intent_id: row.payment_intent_id,
                checkout_url: row.payment_checkout_url,
                qr_data: row.payment_qr_data,
                status: PaymentStatus::parse(&row.payment_status).ok_or_else(|| {
                    AppError::Database(format!("Invalid payment status: {}", row.payment_status))
                })?,
                paid_at: row.paid_at.map(Self::utc),
            },
            refund,
            contract: ContractRecord {
                preview_hash: row.contract_preview_hash,
                executed_at: row.contract_executed_at.map(Self::utc),
                pdf_key: row.contract_pdf_key,
                pdf_url: row.contract_pdf_url,
            },
            expires_at: row.expires_at.map(Self::utc),
            requested_at: Self::utc(row.requested_at),
            host_responded_at: row.host_responded_at.map(Self::utc),
            completed_at: row.completed_at.map(Self::utc),
            cancelled_at: row.cancelled_at.map(Self::utc),
            cancel_reason: row.cancel_reason,
            created_at: Self::utc(row.created_at),
            updated_at: Self::utc(row.updated_at),
        })
    }

    async fn fetch_where(&self, clause: &str, bind: String) -> Result<Option<Booking>> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE {clause}");
        let row = sqlx::query_as::<_, BookingRow>(&query)
            .bind(bind)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_booking(r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_party(
        &self,
        party_column: &str,
        party_id: Uuid,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Booking>, i64)> {
        let status_clause = if status.is_some() { "AND status = ?" } else { "" };
        let list_query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE {party_column} = ? {status_clause} \
             ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
        let count_query = format!(
            "SELECT COUNT(*) FROM bookings WHERE {party_column} = ? {status_clause}"
        );

        let mut list = sqlx::query_as::<_, BookingRow>(&list_query).bind(party_id.to_string());
        let mut count = sqlx::query_scalar::<_, i64>(&count_query).bind(party_id.to_string());
        if let Some(s) = status {
            list = list.bind(s.as_str());
            count = count.bind(s.as_str());
        }

        let rows = list.bind(limit).bind(offset).fetch_all(&self.pool).await?;
        let total = count.fetch_one(&self.pool).await?;

        let bookings = rows
            .into_iter()
            .map(Self::row_to_booking)
            .collect::<Result<Vec<_>>>()?;
        Ok((bookings, total))
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn create(&self, booking: NewBooking) -> Result<Booking> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, guest_id, host_id, listing_id, status,
                checkin_date, checkout_date, nights, guest_count,
                currency, base_price_per_night, cleaning_fee, service_fee, tax_pct,
                subtotal, tax, platform_fee, discount, total, host_payout,
                refund_pct_3_days, refund_pct_2_days, refund_pct_1_day,
                contract_preview_hash, requested_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, 'requested', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(booking.guest_id.to_string())
        .bind(booking.host_id.to_string())
        .bind(booking.listing_id.to_string())
        .bind(booking.checkin_date)
        .bind(booking.checkout_date)
        .bind(booking.nights)
        .bind(booking.guest_count)
        .bind(&booking.pricing.currency)
        .bind(booking.pricing.base_price_per_night)
        .bind(booking.pricing.cleaning_fee)
        .bind(booking.pricing.service_fee)
        .bind(booking.pricing.tax_pct)
        .bind(booking.pricing.subtotal)
        .bind(booking.pricing.tax)
        .bind(booking.pricing.platform_fee)
        .bind(booking.pricing.discount)
        .bind(booking.pricing.total)
        .bind(booking.pricing.host_payout)
        .bind(booking.cancellation_policy.refund_pct_3_days)
        .bind(booking.cancellation_policy.refund_pct_2_days)
        .bind(booking.cancellation_policy.refund_pct_1_day)
        .bind(&booking.contract_preview_hash)
        .bind(booking.requested_at.naive_utc())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created booking".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        self.fetch_where("id = ?", id.to_string()).await
    }

    async fn find_by_order_code(&self, order_code: &str) -> Result<Option<Booking>> {
        self.fetch_where("order_code = ?", order_code.to_string())
            .await
    }

    async fn list_by_guest(
        &self,
        guest_id: Uuid,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Booking>, i64)> {
        self.list_by_party("guest_id", guest_id, status, limit, offset)
            .await
    }

    async fn list_by_host(
        &self,
        host_id: Uuid,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Booking>, i64)> {
        self.list_by_party("host_id", host_id, status, limit, offset)
            .await
    }

    async fn has_blocking_overlap(
        &self,
        listing_id: Uuid,
        checkin: NaiveDate,
        checkout: NaiveDate,
    ) -> Result<bool> {
        let query = format!(
            "SELECT EXISTS(
                SELECT 1 FROM bookings
                WHERE listing_id = ?
                  AND status IN {BLOCKING}
                  AND checkin_date < ?
                  AND checkout_date > ?
            )"
        );
        let exists = sqlx::query_scalar::<_, bool>(&query)
            .bind(listing_id.to_string())
            .bind(checkout)
            .bind(checkin)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn host_accept(
        &self,
        id: Uuid,
        host_id: Uuid,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        // Entering awaiting_payment puts the row into the no-double-booking
        // index; an identical window already held by another booking fails
        // here with a unique violation (mapped to 409).
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'awaiting_payment',
                host_responded_at = ?,
                expires_at = ?,
                updated_at = ?
            WHERE id = ? AND host_id = ? AND status = 'requested'
            "#,
        )
        .bind(now.naive_utc())
        .bind(expires_at.naive_utc())
        .bind(now.naive_utc())
        .bind(id.to_string())
        .bind(host_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn host_decline(&self, id: Uuid, host_id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'host_rejected',
                host_responded_at = ?,
                updated_at = ?
            WHERE id = ? AND host_id = ? AND status = 'requested'
            "#,
        )
        .bind(now.naive_utc())
        .bind(now.naive_utc())
        .bind(id.to_string())
        .bind(host_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn attach_payment_intent(
        &self,
        id: Uuid,
        order_code: &str,
        payment: &PaymentRecord,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET order_code = ?,
                payment_provider = ?,
                payment_method = ?,
                payment_intent_id = ?,
                payment_checkout_url = ?,
                payment_qr_data = ?,
                payment_status = 'pending',
                updated_at = ?
            WHERE id = ? AND status = 'awaiting_payment'
            "#,
        )
        .bind(order_code)
        .bind(&payment.provider)
        .bind(&payment.method)
        .bind(&payment.intent_id)
        .bind(&payment.checkout_url)
        .bind(&payment.qr_data)
        .bind(now.naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn mark_expired(&self, id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'expired', updated_at = ?
            WHERE id = ? AND status = 'awaiting_payment'
            "#,
        )
        .bind(now.naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn mark_paid(&self, id: Uuid, receipt: &PaymentReceipt) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'paid',
                payment_status = 'succeeded',
                paid_at = ?,
                updated_at = ?
            WHERE id = ? AND status IN ('awaiting_payment', 'payment_processing')
            "#,
        )
        .bind(receipt.occurred_at.naive_utc())
        .bind(receipt.occurred_at.naive_utc())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        // Receipt only lands alongside the transition; a losing racer
        // appends nothing.
        if result.rows_affected() == 1 {
            sqlx::query(
                r#"
                INSERT INTO booking_txns (id, booking_id, provider_txn_id, amount, status, raw, occurred_at)
                VALUES (?, ?, ?, ?, 'succeeded', ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(id.to_string())
            .bind(&receipt.provider_txn_id)
            .bind(receipt.amount)
            .bind(&receipt.raw)
            .bind(receipt.occurred_at.naive_utc())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn record_receipt(&self, booking_id: Uuid, receipt: &PaymentReceipt) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO booking_txns (id, booking_id, provider_txn_id, amount, status, raw, occurred_at)
            VALUES (?, ?, ?, ?, 'unreconciled', ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(booking_id.to_string())
        .bind(&receipt.provider_txn_id)
        .bind(receipt.amount)
        .bind(&receipt.raw)
        .bind(receipt.occurred_at.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_payment_failed(&self, id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        // Booking status is left alone so the guest can retry before the
        // expiry deadline.
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_status = 'failed', updated_at = ?
            WHERE id = ? AND payment_status = 'pending'
            "#,
        )
        .bind(now.naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn set_contract_executed(
        &self,
        id: Uuid,
        executed_at: DateTime<Utc>,
        pdf_key: &str,
        pdf_url: &str,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET contract_executed_at = ?,
                contract_pdf_key = ?,
                contract_pdf_url = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(executed_at.naive_utc())
        .bind(pdf_key)
        .bind(pdf_url)
        .bind(executed_at.naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn cancel_unpaid(
        &self,
        id: Uuid,
        guest_id: Uuid,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'cancelled_by_guest',
                platform_fee = 0,
                host_payout = 0,
                cancelled_at = ?,
                cancel_reason = ?,
                updated_at = ?
            WHERE id = ? AND guest_id = ?
              AND status IN ('requested', 'host_accepted', 'awaiting_payment')
            "#,
        )
        .bind(now.naive_utc())
        .bind(reason)
        .bind(now.naive_utc())
        .bind(id.to_string())
        .bind(guest_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn cancel_paid(
        &self,
        id: Uuid,
        guest_id: Uuid,
        refund: &RefundRecord,
        new_platform_fee: i64,
        new_host_payout: i64,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'refund_pending',
                platform_fee = ?,
                host_payout = ?,
                refund_bank_name = ?,
                refund_bank_account_number = ?,
                refund_bank_account_holder = ?,
                refund_amount = ?,
                refund_pct = ?,
                refund_reason = ?,
                refund_status = 'pending',
                cancelled_at = ?,
                cancel_reason = ?,
                updated_at = ?
            WHERE id = ? AND guest_id = ? AND status = 'paid'
            "#,
        )
        .bind(new_platform_fee)
        .bind(new_host_payout)
        .bind(&refund.bank.bank_name)
        .bind(&refund.bank.account_number)
        .bind(&refund.bank.account_holder)
        .bind(refund.amount)
        .bind(refund.pct)
        .bind(&refund.reason)
        .bind(now.naive_utc())
        .bind(&refund.reason)
        .bind(now.naive_utc())
        .bind(id.to_string())
        .bind(guest_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn confirm_refund(&self, id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'refunded',
                refund_status = 'completed',
                payment_status = 'refunded',
                updated_at = ?
            WHERE id = ? AND status = 'refund_pending'
            "#,
        )
        .bind(now.naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn sweep_stale(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let user = user_id.to_string();
        let mut swept = 0;

        // Payment window elapsed.
        let expired = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'expired',
                cancel_reason = 'payment window elapsed',
                updated_at = ?
            WHERE status = 'awaiting_payment'
              AND expires_at < ?
              AND (guest_id = ? OR host_id = ?)
            "#,
        )
        .bind(now.naive_utc())
        .bind(now.naive_utc())
        .bind(&user)
        .bind(&user)
        .execute(&self.pool)
        .await?;
        swept += expired.rows_affected();

        // Request never answered before check-in.
        let rejected = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'host_rejected',
                host_responded_at = ?,
                cancel_reason = 'auto-declined: check-in date passed',
                updated_at = ?
            WHERE status = 'requested'
              AND checkin_date < ?
              AND (guest_id = ? OR host_id = ?)
            "#,
        )
        .bind(now.naive_utc())
        .bind(now.naive_utc())
        .bind(today)
        .bind(&user)
        .bind(&user)
        .execute(&self.pool)
        .await?;
        swept += rejected.rows_affected();

        // Stay finished: paid bookings past checkout become completed.
        let completed = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'completed',
                completed_at = ?,
                updated_at = ?
            WHERE status = 'paid'
              AND checkout_date <= ?
              AND (guest_id = ? OR host_id = ?)
            "#,
        )
        .bind(now.naive_utc())
        .bind(now.naive_utc())
        .bind(today)
        .bind(&user)
        .bind(&user)
        .execute(&self.pool)
        .await?;
        swept += completed.rows_affected();

        Ok(swept)
    }

    async fn list_txns(&self, booking_id: Uuid) -> Result<Vec<BookingTxn>> {
        let rows = sqlx::query_as::<_, TxnRow>(
            r#"
            SELECT id, booking_id, provider_txn_id, amount, status, raw, occurred_at
            FROM booking_txns
            WHERE booking_id = ?
            ORDER BY occurred_at ASC
            "#,
        )
        .bind(booking_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(BookingTxn {
                    id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
                    booking_id: Uuid::parse_str(&row.booking_id)
                        .map_err(|e| AppError::Database(e.to_string()))?,
                    provider_txn_id: row.provider_txn_id,
                    amount: row.amount,
                    status: row.status,
                    raw: row.raw,
                    occurred_at: Self::utc(row.occurred_at),
                })
            })
            .collect()
    }

    async fn revenue_rows(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<RevenueRow>> {
        // The payment predicate keeps never-paid cancellations (which still
        // carry their full quoted total) out of the revenue scan.
        let query = format!(
            "SELECT host_id, total, refund_amount FROM bookings \
             WHERE status IN {REVENUE_BEARING} \
               AND payment_status IN ('succeeded', 'refunded') \
               AND checkout_date >= ? AND checkout_date < ?"
        );
        let rows = sqlx::query_as::<_, RevenueSqlRow>(&query)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(RevenueRow {
                    host_id: Uuid::parse_str(&row.host_id)
                        .map_err(|e| AppError::Database(e.to_string()))?,
                    total: row.total,
                    refund_amount: row.refund_amount.unwrap_or(0),
                })
            })
            .collect()
    }
}
