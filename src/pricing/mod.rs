pub mod cancellation;

use crate::domain::PricingSnapshot;

/// Half-up rounding of `pct` percent of an integer amount, in smallest
/// currency units. Mirrors everywhere a percentage touches money so fee and
/// refund math stays consistent.
pub fn round_pct(amount: i64, pct: f64) -> i64 {
    (amount as f64 * pct / 100.0).round() as i64
}

#[derive(Debug, Clone)]
pub struct PricingInputs {
    pub currency: String,
    pub base_price_per_night: i64,
    pub nights: i64,
    pub cleaning_fee: i64,
    pub service_fee: i64,
    pub tax_pct: f64,
    pub platform_fee_pct: f64,
    pub discount: i64,
}

/// Deterministic pricing quote, no I/O. The platform fee is computed on the
/// subtotal, not subtotal + tax. The discount is clamped to the subtotal so
/// a promo can never push the total below fees.
pub fn quote(inputs: &PricingInputs) -> PricingSnapshot {
    debug_assert!(inputs.nights > 0);

    let subtotal =
        inputs.base_price_per_night * inputs.nights + inputs.cleaning_fee + inputs.service_fee;
    let tax = round_pct(subtotal, inputs.tax_pct);
    let platform_fee = round_pct(subtotal, inputs.platform_fee_pct);
    let discount = inputs.discount.clamp(0, subtotal);
    let total = subtotal + tax + platform_fee - discount;
    let host_payout = subtotal + tax - platform_fee - discount;

    PricingSnapshot {
        currency: inputs.currency.clone(),
        base_price_per_night: inputs.base_price_per_night,
        cleaning_fee: inputs.cleaning_fee,
        service_fee: inputs.service_fee,
        tax_pct: inputs.tax_pct,
        subtotal,
        tax,
        platform_fee,
        discount,
        total,
        host_payout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(base: i64, nights: i64) -> PricingInputs {
        PricingInputs {
            currency: "VND".to_string(),
            base_price_per_night: base,
            nights,
            cleaning_fee: 0,
            service_fee: 0,
            tax_pct: 0.0,
            platform_fee_pct: 5.0,
            discount: 0,
        }
    }

    #[test]
    fn two_night_stay_with_fees() {
        // 500,000/night x 2 nights + 100,000 cleaning + 50,000 service,
        // no tax, 5% platform fee.
        let snapshot = quote(&PricingInputs {
            cleaning_fee: 100_000,
            service_fee: 50_000,
            ..inputs(500_000, 2)
        });

        assert_eq!(snapshot.subtotal, 1_150_000);
        assert_eq!(snapshot.platform_fee, 57_500);
        assert_eq!(snapshot.total, 1_207_500);
        assert_eq!(snapshot.host_payout, 1_092_500);
    }

    #[test]
    fn pricing_identities_hold() {
        let snapshot = quote(&PricingInputs {
            cleaning_fee: 120_000,
            service_fee: 80_000,
            tax_pct: 8.0,
            discount: 50_000,
            ..inputs(750_000, 3)
        });

        assert_eq!(
            snapshot.subtotal,
            750_000 * 3 + 120_000 + 80_000
        );
        assert_eq!(
            snapshot.total,
            snapshot.subtotal + snapshot.tax + snapshot.platform_fee - snapshot.discount
        );
        assert_eq!(
            snapshot.host_payout,
            snapshot.subtotal + snapshot.tax - snapshot.platform_fee - snapshot.discount
        );
        assert!(snapshot.discount <= snapshot.subtotal);
    }

    #[test]
    fn tax_computed_on_subtotal() {
        let snapshot = quote(&PricingInputs {
            tax_pct: 10.0,
            ..inputs(100_000, 1)
        });
        assert_eq!(snapshot.tax, 10_000);
        // Platform fee on subtotal, not subtotal + tax.
        assert_eq!(snapshot.platform_fee, 5_000);
    }

    #[test]
    fn discount_clamped_to_subtotal() {
        let snapshot = quote(&PricingInputs {
            discount: 999_999_999,
            ..inputs(100_000, 1)
        });
        assert_eq!(snapshot.discount, 100_000);
        assert_eq!(snapshot.total, snapshot.tax + snapshot.platform_fee);
    }

    #[test]
    fn negative_discount_ignored() {
        let snapshot = quote(&PricingInputs {
            discount: -5_000,
            ..inputs(100_000, 2)
        });
        assert_eq!(snapshot.discount, 0);
    }

    #[test]
    fn fractional_fee_rounds_half_up() {
        // 5% of 10,010 = 500.5 -> 501
        assert_eq!(round_pct(10_010, 5.0), 501);
        assert_eq!(round_pct(10_009, 5.0), 500);
    }
}
