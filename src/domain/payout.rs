use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::BankSnapshot;

/// One monthly payout run. Created once per (month, year) on first admin
/// query; afterwards mutated only by settlement confirmations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutBatch {
    pub id: Uuid,
    pub month: u32,
    pub year: i32,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub total_gmv: i64,
    pub total_platform_fee: i64,
    pub total_payout: i64,
    pub status: PayoutBatchStatus,
    pub paid_count: i64,
    pub total_settlements: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayoutBatchStatus {
    Processing,
    Completed,
}

impl PayoutBatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutBatchStatus::Processing => "processing",
            PayoutBatchStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<PayoutBatchStatus> {
        match s {
            "processing" => Some(PayoutBatchStatus::Processing),
            "completed" => Some(PayoutBatchStatus::Completed),
            _ => None,
        }
    }
}

/// One host's aggregated payout obligation within a batch. The bank snapshot
/// is point-in-time: later bank-detail edits do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSettlement {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub host_id: Uuid,
    pub bank: Option<BankSnapshot>,
    pub total_bookings: i64,
    pub total_net_revenue: i64,
    pub platform_fee: i64,
    pub payout_amount: i64,
    pub status: SettlementStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Pending,
    Paid,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "pending",
            SettlementStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<SettlementStatus> {
        match s {
            "pending" => Some(SettlementStatus::Pending),
            "paid" => Some(SettlementStatus::Paid),
            _ => None,
        }
    }
}

/// Per-host aggregation row produced by scanning a period's revenue-bearing
/// bookings, before fee splitting.
#[derive(Debug, Clone)]
pub struct HostRevenue {
    pub host_id: Uuid,
    pub total_bookings: i64,
    pub total_net_revenue: i64,
}
