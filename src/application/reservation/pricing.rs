//! Pricing engine
//!
//! Billing rule: a stay is charged in whole tariff units, rounded up, with a
//! floor of one unit. Durations are measured in whole seconds, so an hourly
//! stay of exactly 60:00 is one unit and 60:01 is two. Amounts are rounded to
//! 2 decimal places, midpoint away from zero. No floating point is involved.

use chrono::Duration;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::tariff::{TariffSnapshot, TariffUnit};

/// Outcome of recomputing a booking's price at completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub final_amount: Decimal,
    /// Part of the quote to give back (early exit)
    pub refund_due: Decimal,
    /// Amount owed on top of the quote (overstay)
    pub surcharge: Decimal,
}

#[derive(Debug, Clone)]
pub struct PricingEngine {
    /// Applied to the overstay portion only; 1 bills overstay linearly
    overstay_multiplier: Decimal,
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self {
            overstay_multiplier: Decimal::ONE,
        }
    }
}

/// Whole billable units for `duration`, never less than one.
pub fn billable_units(unit: TariffUnit, duration: Duration) -> i64 {
    let seconds = duration.num_seconds();
    if seconds <= 0 {
        return 1;
    }
    let unit_seconds = unit.seconds();
    ((seconds + unit_seconds - 1) / unit_seconds).max(1)
}

fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl PricingEngine {
    pub fn new(overstay_multiplier: Decimal) -> Self {
        Self {
            overstay_multiplier: overstay_multiplier.max(Decimal::ONE),
        }
    }

    pub fn overstay_multiplier(&self) -> Decimal {
        self.overstay_multiplier
    }

    /// Price of a stay of `duration_minutes` under `terms`.
    pub fn quote(&self, terms: &TariffSnapshot, duration_minutes: i64) -> Decimal {
        self.quote_duration(terms, Duration::minutes(duration_minutes))
    }

    pub fn quote_duration(&self, terms: &TariffSnapshot, duration: Duration) -> Decimal {
        let units = billable_units(terms.unit, duration);
        round_money(Decimal::from(units) * terms.unit_price)
    }

    /// Final price for a stay that ran `actual` instead of `planned`.
    ///
    /// Early exit never costs more than the quote; overstay adds the extra
    /// units times the overstay multiplier.
    pub fn reconcile(
        &self,
        terms: &TariffSnapshot,
        quoted: Decimal,
        planned: Duration,
        actual: Duration,
    ) -> Reconciliation {
        if actual < planned {
            let final_amount = self.quote_duration(terms, actual).min(quoted);
            return Reconciliation {
                final_amount,
                refund_due: quoted - final_amount,
                surcharge: Decimal::ZERO,
            };
        }

        if actual > planned {
            let extra = self.quote_duration(terms, actual) - self.quote_duration(terms, planned);
            let surcharge = round_money(extra.max(Decimal::ZERO) * self.overstay_multiplier);
            return Reconciliation {
                final_amount: quoted + surcharge,
                refund_due: Decimal::ZERO,
                surcharge,
            };
        }

        Reconciliation {
            final_amount: quoted,
            refund_due: Decimal::ZERO,
            surcharge: Decimal::ZERO,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hourly(price_cents: i64) -> TariffSnapshot {
        TariffSnapshot {
            tariff_id: 1,
            unit: TariffUnit::Hourly,
            unit_price: Decimal::new(price_cents, 2),
            currency: "EUR".into(),
        }
    }

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn two_hours_at_ten() {
        let pricing = PricingEngine::default();
        assert_eq!(pricing.quote(&hourly(1000), 120), money(2000));
    }

    #[test]
    fn short_stay_bills_one_unit() {
        let pricing = PricingEngine::default();
        assert_eq!(pricing.quote(&hourly(1000), 10), money(1000));
        assert_eq!(pricing.quote(&hourly(1000), 0), money(1000));
    }

    #[test]
    fn unit_boundaries_round_up() {
        let pricing = PricingEngine::default();
        let t = hourly(1000);
        assert_eq!(pricing.quote(&t, 60), money(1000));
        assert_eq!(pricing.quote(&t, 61), money(2000));
        assert_eq!(pricing.quote(&t, 90), money(2000));
        assert_eq!(pricing.quote(&t, 120), money(2000));
        assert_eq!(pricing.quote(&t, 121), money(3000));
    }

    #[test]
    fn one_second_over_a_unit_is_another_unit() {
        let pricing = PricingEngine::default();
        let t = hourly(1000);
        assert_eq!(
            pricing.quote_duration(&t, Duration::seconds(3600)),
            money(1000)
        );
        assert_eq!(
            pricing.quote_duration(&t, Duration::seconds(3601)),
            money(2000)
        );
    }

    #[test]
    fn daily_weekly_monthly_units() {
        let pricing = PricingEngine::default();
        let mut t = hourly(2500);
        t.unit = TariffUnit::Daily;
        assert_eq!(pricing.quote(&t, 60 * 30), money(5000));
        t.unit = TariffUnit::Weekly;
        assert_eq!(pricing.quote(&t, 60 * 24 * 7), money(2500));
        t.unit = TariffUnit::Monthly;
        assert_eq!(pricing.quote(&t, 60 * 24 * 31), money(5000));
    }

    #[test]
    fn sub_cent_unit_price_rounds_half_up() {
        let pricing = PricingEngine::default();
        let t = TariffSnapshot {
            unit_price: Decimal::new(1005, 3), // 1.005
            ..hourly(0)
        };
        assert_eq!(pricing.quote(&t, 60), money(101));
    }

    #[test]
    fn early_exit_within_same_units_keeps_quote() {
        // Booked 09:00-11:00, left 10:30: 90 min is still 2 hourly units.
        let pricing = PricingEngine::default();
        let r = pricing.reconcile(
            &hourly(1000),
            money(2000),
            Duration::minutes(120),
            Duration::minutes(90),
        );
        assert_eq!(r.final_amount, money(2000));
        assert_eq!(r.refund_due, Decimal::ZERO);
    }

    #[test]
    fn early_exit_flags_refund() {
        let pricing = PricingEngine::default();
        let r = pricing.reconcile(
            &hourly(1000),
            money(2000),
            Duration::minutes(120),
            Duration::minutes(60),
        );
        assert_eq!(r.final_amount, money(1000));
        assert_eq!(r.refund_due, money(1000));
        assert_eq!(r.surcharge, Decimal::ZERO);
    }

    #[test]
    fn early_exit_never_exceeds_quote() {
        // Quote below list price (e.g. tariff changed since); early exit
        // must not push the final amount above it.
        let pricing = PricingEngine::default();
        let r = pricing.reconcile(
            &hourly(1000),
            money(1500),
            Duration::minutes(180),
            Duration::minutes(150),
        );
        assert_eq!(r.final_amount, money(1500));
        assert_eq!(r.refund_due, Decimal::ZERO);
    }

    #[test]
    fn overstay_bills_linearly() {
        let pricing = PricingEngine::default();
        let r = pricing.reconcile(
            &hourly(1000),
            money(2000),
            Duration::minutes(120),
            Duration::minutes(150),
        );
        assert_eq!(r.final_amount, money(3000));
        assert_eq!(r.surcharge, money(1000));
        assert_eq!(r.refund_due, Decimal::ZERO);
    }

    #[test]
    fn overstay_multiplier_applies_to_extra_only() {
        let pricing = PricingEngine::new(Decimal::new(15, 1));
        let r = pricing.reconcile(
            &hourly(1000),
            money(2000),
            Duration::minutes(120),
            Duration::minutes(180),
        );
        assert_eq!(r.surcharge, money(1500));
        assert_eq!(r.final_amount, money(3500));
    }

    #[test]
    fn multiplier_below_one_is_clamped() {
        let pricing = PricingEngine::new(Decimal::new(5, 1));
        assert_eq!(pricing.overstay_multiplier(), Decimal::ONE);
    }

    #[test]
    fn on_time_exit_keeps_quote() {
        let pricing = PricingEngine::default();
        let r = pricing.reconcile(
            &hourly(1000),
            money(2000),
            Duration::minutes(120),
            Duration::minutes(120),
        );
        assert_eq!(r.final_amount, money(2000));
        assert_eq!(r.refund_due + r.surcharge, Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn quote_is_pure(minutes in 0i64..200_000, cents in 1i64..1_000_000) {
            let pricing = PricingEngine::default();
            let t = hourly(cents);
            prop_assert_eq!(pricing.quote(&t, minutes), pricing.quote(&t, minutes));
        }

        #[test]
        fn quote_is_monotonic(a in 0i64..100_000, b in 0i64..100_000, cents in 1i64..100_000) {
            let pricing = PricingEngine::default();
            let t = hourly(cents);
            let (short, long) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(pricing.quote(&t, short) <= pricing.quote(&t, long));
        }

        #[test]
        fn early_exit_never_costs_more(planned in 1i64..10_000, actual_frac in 0u32..100, cents in 1i64..100_000) {
            let pricing = PricingEngine::default();
            let t = hourly(cents);
            let actual = planned * i64::from(actual_frac) / 100;
            let quoted = pricing.quote(&t, planned);
            let r = pricing.reconcile(&t, quoted, Duration::minutes(planned), Duration::minutes(actual));
            prop_assert!(r.final_amount <= quoted);
            prop_assert_eq!(r.final_amount + r.refund_due, quoted);
        }
    }
}
