//! Property tests: the live bookings of a slot never overlap, whatever
//! sequence of requests and cancellations reaches the engine.

mod common;

use chrono::Duration;
use proptest::prelude::*;
use rust_decimal::Decimal;

use common::{at, harness_on, request, seeded_store};
use parking_reservation::application::reservation::PricingEngine;
use parking_reservation::domain::{
    Actor, BookingRepository, DomainError, RepositoryProvider, TariffUnit,
};

#[derive(Debug, Clone)]
enum Op {
    Book { start_min: i64, len_min: i64 },
    CancelLatest,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0i64..600, 1i64..180).prop_map(|(start_min, len_min)| Op::Book { start_min, len_min }),
        1 => Just(Op::CancelLatest),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn live_bookings_never_overlap(ops in prop::collection::vec(op(), 1..40)) {
        let rt = runtime();
        let (accepted_model, live) = rt.block_on(async {
            let store = seeded_store();
            let h = harness_on(store.clone(), common::fast_settings());
            let admin = Actor::admin("ops");
            let base = at(9, 0);

            // Reference model: windows accepted so far and not cancelled.
            let mut model: Vec<(uuid::Uuid, chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)> =
                Vec::new();

            for op in ops {
                match op {
                    Op::Book { start_min, len_min } => {
                        let start = base + Duration::minutes(start_min);
                        let end = start + Duration::minutes(len_min);
                        let clashes = model.iter().any(|(_, s, e)| start < *e && *s < end);
                        match h.engine.create_booking(request("U1", "S1", start, end)).await {
                            Ok(b) => {
                                assert!(!clashes, "accepted overlapping window {start}..{end}");
                                model.push((b.id, start, end));
                            }
                            Err(DomainError::SlotConflict { .. }) => {
                                assert!(clashes, "rejected free window {start}..{end}");
                            }
                            Err(e) => panic!("unexpected error: {e}"),
                        }
                    }
                    Op::CancelLatest => {
                        if let Some((id, _, _)) = model.pop() {
                            h.engine.cancel_booking(id, &admin).await.unwrap();
                        }
                    }
                }
            }

            let live = store.bookings().load_slot("S1").await.unwrap().bookings;
            (model.len(), live)
        });

        prop_assert_eq!(accepted_model, live.len());
        for (i, a) in live.iter().enumerate() {
            for b in &live[i + 1..] {
                prop_assert!(
                    a.end_time <= b.start_time || b.end_time <= a.start_time,
                    "{} and {} overlap", a.id, b.id
                );
            }
        }
    }

    #[test]
    fn quote_is_deterministic_and_monotone(
        minutes in 1i64..(60 * 24 * 90),
        extra in 0i64..(60 * 24 * 7),
        cents in 1i64..100_000,
        unit in prop_oneof![
            Just(TariffUnit::Hourly),
            Just(TariffUnit::Daily),
            Just(TariffUnit::Weekly),
            Just(TariffUnit::Monthly),
        ],
    ) {
        let pricing = PricingEngine::default();
        let mut tariff = common::hourly_tariff();
        tariff.unit = unit;
        tariff.unit_price = Decimal::new(cents, 2);
        let terms = tariff.snapshot();

        let first = pricing.quote(&terms, minutes);
        prop_assert_eq!(first, pricing.quote(&terms, minutes));
        prop_assert!(first >= tariff.unit_price);
        prop_assert_eq!(first.scale(), 2);
        prop_assert!(pricing.quote(&terms, minutes + extra) >= first);
    }
}
