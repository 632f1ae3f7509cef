//! Derived aggregate computation.
//!
//! The aggregate is a pure function of the collection and the current
//! calendar day. It is recomputed fully on every mutation; nothing here
//! holds state between calls.

use cadence_core::{ContentItem, ContentStats, ContentStatus};
use chrono::{Days, NaiveDate, Utc};
use std::collections::HashSet;

/// Compute the aggregate for `items` as of `today`.
pub fn derive_stats(items: &[ContentItem], today: NaiveDate) -> ContentStats {
    ContentStats {
        scheduled_count: scheduled_count(items),
        engagement_rate: engagement_rate(items),
        streak: streak(items, today),
    }
}

/// Compute the aggregate as of the current UTC day.
pub fn derive_stats_now(items: &[ContentItem]) -> ContentStats {
    derive_stats(items, Utc::now().date_naive())
}

fn scheduled_count(items: &[ContentItem]) -> u32 {
    items
        .iter()
        .filter(|item| item.status == ContentStatus::Scheduled)
        .count() as u32
}

/// Rounded percentage of interactions over views across published records,
/// clamped to [0, 100]. Views floor at 1 per record so a published record
/// with zero views still contributes a denominator.
fn engagement_rate(items: &[ContentItem]) -> u8 {
    let published: Vec<&ContentItem> = items
        .iter()
        .filter(|item| item.status == ContentStatus::Published)
        .collect();
    if published.is_empty() {
        return 0;
    }

    let interactions: u64 = published
        .iter()
        .map(|item| item.likes + item.comments + item.shares)
        .sum();
    let views: u64 = published.iter().map(|item| item.views.max(1)).sum();

    let rate = (100.0 * interactions as f64 / views as f64).round();
    rate.clamp(0.0, 100.0) as u8
}

/// Length of the run of consecutive calendar days, walking backward from
/// `today`, on each of which at least one record was created. Day 0 is
/// `today` itself; with no record today the streak is zero.
fn streak(items: &[ContentItem], today: NaiveDate) -> u32 {
    let creation_days: HashSet<NaiveDate> =
        items.iter().map(|item| item.created_at.date_naive()).collect();

    let mut run = 0u32;
    loop {
        let Some(day) = today.checked_sub_days(Days::new(run as u64)) else {
            break;
        };
        if !creation_days.contains(&day) {
            break;
        }
        run += 1;
    }
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::ContentId;
    use chrono::{DateTime, TimeZone, Utc};

    fn day(date: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
    }

    fn make_item(id: &str, status: ContentStatus, created: NaiveDate) -> ContentItem {
        ContentItem {
            id: ContentId::from(id),
            title: format!("item {id}"),
            status,
            views: 0,
            likes: 0,
            comments: 0,
            shares: 0,
            created_at: day(created),
            scheduled_for: None,
            metadata: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn test_scheduled_count() {
        let items = vec![
            make_item("a", ContentStatus::Scheduled, today()),
            make_item("b", ContentStatus::Published, today()),
            make_item("c", ContentStatus::Scheduled, today()),
            make_item("d", ContentStatus::Draft, today()),
        ];
        assert_eq!(derive_stats(&items, today()).scheduled_count, 2);
    }

    #[test]
    fn test_engagement_rate_zero_without_published() {
        let items = vec![make_item("a", ContentStatus::Scheduled, today())];
        assert_eq!(derive_stats(&items, today()).engagement_rate, 0);
    }

    #[test]
    fn test_engagement_rate_example_scenario() {
        // One published record: 10 likes over 100 views -> 10%.
        let mut item = make_item("a", ContentStatus::Published, today());
        item.views = 100;
        item.likes = 10;
        assert_eq!(derive_stats(&[item], today()).engagement_rate, 10);
    }

    #[test]
    fn test_engagement_rate_views_floor_at_one() {
        let mut item = make_item("a", ContentStatus::Published, today());
        item.views = 0;
        item.likes = 3;
        // Denominator floors at 1, then the rate clamps to 100.
        assert_eq!(derive_stats(&[item], today()).engagement_rate, 100);
    }

    #[test]
    fn test_engagement_rate_sums_across_published() {
        let mut a = make_item("a", ContentStatus::Published, today());
        a.views = 100;
        a.likes = 5;
        let mut b = make_item("b", ContentStatus::Published, today());
        b.views = 100;
        b.comments = 10;
        // (5 + 10) / 200 = 7.5% -> rounds to 8.
        assert_eq!(derive_stats(&[a, b], today()).engagement_rate, 8);
    }

    #[test]
    fn test_streak_requires_an_item_today() {
        let yesterday = today().pred_opt().unwrap();
        let items = vec![make_item("a", ContentStatus::Published, yesterday)];
        assert_eq!(derive_stats(&items, today()).streak, 0);
    }

    #[test]
    fn test_streak_counts_consecutive_days() {
        let t = today();
        let items = vec![
            make_item("a", ContentStatus::Published, t),
            make_item("b", ContentStatus::Draft, t.pred_opt().unwrap()),
            make_item("c", ContentStatus::Scheduled, t - Days::new(2)),
        ];
        assert_eq!(derive_stats(&items, t).streak, 3);
    }

    #[test]
    fn test_streak_stops_at_first_gap() {
        let t = today();
        let items = vec![
            make_item("a", ContentStatus::Published, t),
            // No item yesterday; the day before must not count.
            make_item("b", ContentStatus::Published, t - Days::new(2)),
        ];
        assert_eq!(derive_stats(&items, t).streak, 1);
    }

    #[test]
    fn test_streak_same_day_duplicates_count_once() {
        let t = today();
        let items = vec![
            make_item("a", ContentStatus::Published, t),
            make_item("b", ContentStatus::Draft, t),
        ];
        assert_eq!(derive_stats(&items, t).streak, 1);
    }

    #[test]
    fn test_empty_collection() {
        let stats = derive_stats(&[], today());
        assert_eq!(stats, ContentStats::default());
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use cadence_core::ContentId;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn arb_status() -> impl Strategy<Value = ContentStatus> {
        prop_oneof![
            Just(ContentStatus::Draft),
            Just(ContentStatus::Scheduled),
            Just(ContentStatus::Published),
            Just(ContentStatus::Failed),
        ]
    }

    fn arb_item() -> impl Strategy<Value = ContentItem> {
        (
            "[a-z0-9]{1,8}",
            arb_status(),
            0u64..10_000,
            0u64..1_000,
            0u64..1_000,
            0u64..1_000,
            0i64..30,
        )
            .prop_map(|(id, status, views, likes, comments, shares, days_ago)| {
                let created_at = Utc.with_ymd_and_hms(2026, 8, 7, 9, 30, 0).unwrap()
                    - chrono::Duration::days(days_ago);
                ContentItem {
                    id: ContentId::new(id),
                    title: "generated".to_string(),
                    status,
                    views,
                    likes,
                    comments,
                    shares,
                    created_at,
                    scheduled_for: None,
                    metadata: None,
                }
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Recomputing the aggregate from the same collection yields
        /// identical results: no hidden mutable state.
        #[test]
        fn prop_aggregate_is_pure(items in prop::collection::vec(arb_item(), 0..40)) {
            let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
            let first = derive_stats(&items, today);
            let second = derive_stats(&items, today);
            prop_assert_eq!(first, second);
        }

        /// The engagement rate is always a percentage.
        #[test]
        fn prop_engagement_rate_bounded(items in prop::collection::vec(arb_item(), 0..40)) {
            let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
            prop_assert!(derive_stats(&items, today).engagement_rate <= 100);
        }

        /// The scheduled count never exceeds the collection size.
        #[test]
        fn prop_scheduled_count_bounded(items in prop::collection::vec(arb_item(), 0..40)) {
            let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
            prop_assert!(derive_stats(&items, today).scheduled_count as usize <= items.len());
        }

        /// The aggregate ignores collection order.
        #[test]
        fn prop_aggregate_order_independent(items in prop::collection::vec(arb_item(), 0..20)) {
            let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
            let forward = derive_stats(&items, today);
            let mut reversed = items.clone();
            reversed.reverse();
            prop_assert_eq!(forward, derive_stats(&reversed, today));
        }
    }
}
