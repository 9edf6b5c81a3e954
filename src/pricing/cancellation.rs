use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

use crate::domain::CancellationPolicy;
use crate::pricing::round_pct;

const SECS_PER_DAY: i64 = 86_400;

/// Settlement of a paid booking cancelled by the guest. `platform_fee` and
/// `host_payout` are recomputed from the retained amount and overwrite the
/// booking's frozen pricing fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundQuote {
    pub days_before_checkin: i64,
    pub refund_pct: i64,
    pub refund_amount: i64,
    pub retained_amount: i64,
    pub platform_fee: i64,
    pub host_payout: i64,
}

/// The instant the tier countdown anchors on: check-in day at the configured
/// hour (14:00 by default) in the deployment's local offset.
pub fn checkin_instant(
    checkin_date: NaiveDate,
    checkin_hour: u32,
    utc_offset_hours: i32,
) -> DateTime<Utc> {
    let offset = FixedOffset::east_opt(utc_offset_hours * 3600)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
    let naive = checkin_date
        .and_hms_opt(checkin_hour.min(23), 0, 0)
        .expect("hour clamped below 24");
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// Whole days remaining before check-in, rounded up, floored at zero. A
/// guest cancelling 2.2 days out is in the 3-day tier.
pub fn days_before_checkin(checkin_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (checkin_at - now).num_seconds();
    if secs <= 0 {
        return 0;
    }
    (secs + SECS_PER_DAY - 1) / SECS_PER_DAY
}

pub fn refund_quote(
    policy: &CancellationPolicy,
    total: i64,
    platform_fee_pct: f64,
    checkin_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> RefundQuote {
    let days = days_before_checkin(checkin_at, now);
    let refund_pct = match days {
        d if d >= 4 => 100,
        3 => policy.refund_pct_3_days,
        2 => policy.refund_pct_2_days,
        1 => policy.refund_pct_1_day,
        _ => 0,
    };

    let refund_amount = round_pct(total, refund_pct as f64);
    let retained_amount = total - refund_amount;
    let (platform_fee, host_payout) = if retained_amount > 0 {
        let fee = round_pct(retained_amount, platform_fee_pct);
        (fee, retained_amount - fee)
    } else {
        (0, 0)
    };

    RefundQuote {
        days_before_checkin: days,
        refund_pct,
        refund_amount,
        retained_amount,
        platform_fee,
        host_payout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn checkin() -> DateTime<Utc> {
        // 2025-06-10 14:00 +07:00 == 07:00 UTC
        checkin_instant(
            NaiveDate::from_ymd_opt(2025, 6, 10).expect("valid date"),
            14,
            7,
        )
    }

    fn policy() -> CancellationPolicy {
        CancellationPolicy::default()
    }

    #[test]
    fn checkin_anchor_converts_offset() {
        let at = checkin();
        assert_eq!(at.to_rfc3339(), "2025-06-10T07:00:00+00:00");
    }

    #[test]
    fn four_days_out_full_refund() {
        let now = checkin() - Duration::days(4);
        let q = refund_quote(&policy(), 1_207_500, 5.0, checkin(), now);
        assert_eq!(q.days_before_checkin, 4);
        assert_eq!(q.refund_pct, 100);
        assert_eq!(q.refund_amount, 1_207_500);
        assert_eq!(q.retained_amount, 0);
        assert_eq!(q.platform_fee, 0);
        assert_eq!(q.host_payout, 0);
    }

    #[test]
    fn two_days_out_half_refund() {
        let now = checkin() - Duration::days(2);
        let q = refund_quote(&policy(), 1_000_000, 5.0, checkin(), now);
        assert_eq!(q.refund_pct, 50);
        assert_eq!(q.refund_amount, 500_000);
        assert_eq!(q.retained_amount, 500_000);
        assert_eq!(q.platform_fee, 25_000);
        assert_eq!(q.host_payout, 475_000);
    }

    #[test]
    fn one_day_out_uses_t1_and_recomputes_payout() {
        let now = checkin() - Duration::hours(20);
        let q = refund_quote(&policy(), 1_207_500, 5.0, checkin(), now);
        assert_eq!(q.days_before_checkin, 1);
        assert_eq!(q.refund_pct, 30);
        assert_eq!(q.refund_amount, round_pct(1_207_500, 30.0));
        assert_eq!(q.retained_amount, 1_207_500 - q.refund_amount);
        assert_eq!(q.host_payout, q.retained_amount - q.platform_fee);
    }

    #[test]
    fn after_checkin_no_refund() {
        let now = checkin() + Duration::hours(3);
        let q = refund_quote(&policy(), 1_000_000, 5.0, checkin(), now);
        assert_eq!(q.days_before_checkin, 0);
        assert_eq!(q.refund_pct, 0);
        assert_eq!(q.refund_amount, 0);
        assert_eq!(q.retained_amount, 1_000_000);
    }

    #[test]
    fn partial_day_rounds_up_to_next_tier() {
        // 2 days and 5 hours out counts as 3 days.
        let now = checkin() - Duration::days(2) - Duration::hours(5);
        let q = refund_quote(&policy(), 1_000_000, 5.0, checkin(), now);
        assert_eq!(q.days_before_checkin, 3);
        assert_eq!(q.refund_pct, 90);
    }
}
