use chrono::{DateTime, Duration, Utc};

use crate::model::{Quality, ReviewItem};

/// Lower bound for the ease factor. SM-2 never lets an item get harder than
/// this; there is deliberately no upper bound (see `apply_review`).
pub const MIN_EASE_FACTOR: f64 = 1.3;

//
// ─── SM-2 REVIEW UPDATE ────────────────────────────────────────────────────────
//

/// Applies a quality rating to an item, returning its next scheduling state.
///
/// Pure transformation over the scheduling fields; the caller persists the
/// returned item. The update follows the SM-2 variant:
///
/// 1. `review_count` increments and `last_reviewed` is stamped.
/// 2. `average_quality` absorbs the new rating into its running mean.
/// 3. On a pass (quality >= 3) the interval becomes 1, 6, or
///    `round(interval * ease_factor)` for the first, second, and later
///    repetitions, and `repetitions` increments. The multiplication reads
///    the ease factor from *before* this review's ease update, and the
///    already-rounded whole-day interval from the previous review.
/// 4. On a fail, `repetitions` resets to 0 and the interval drops to 1 day.
/// 5. The ease factor then shifts by
///    `0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)`, clamped below at
///    [`MIN_EASE_FACTOR`]. There is no upper clamp: a long run of perfect
///    ratings grows the ease factor (and so the intervals) without bound.
/// 6. `next_review` lands `interval_days` whole days after `reviewed_at`.
#[must_use]
pub fn apply_review(item: &ReviewItem, quality: Quality, reviewed_at: DateTime<Utc>) -> ReviewItem {
    let mut next = item.clone();
    let q = f64::from(quality.value());

    next.review_count += 1;
    next.last_reviewed = Some(reviewed_at);
    next.average_quality = (next.average_quality * f64::from(next.review_count - 1) + q)
        / f64::from(next.review_count);

    if quality.is_passing() {
        next.interval_days = match next.repetitions {
            0 => 1,
            1 => 6,
            _ => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
                let scaled = (next.interval_days as f64 * next.ease_factor).round() as i64;
                scaled
            }
        };
        next.repetitions += 1;
    } else {
        next.repetitions = 0;
        next.interval_days = 1;
    }

    let ease_delta = 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
    next.ease_factor = (next.ease_factor + ease_delta).max(MIN_EASE_FACTOR);

    next.next_review = reviewed_at + Duration::days(next.interval_days);
    next
}

//
// ─── DUE-ITEM SELECTION ────────────────────────────────────────────────────────
//

/// Returns the items due for review at `now`, most overdue first.
///
/// Filters to `next_review <= now`, sorts ascending by `next_review`, and
/// truncates to `limit`. Pure read; empty input yields empty output.
#[must_use]
pub fn due_items(items: &[ReviewItem], now: DateTime<Utc>, limit: usize) -> Vec<ReviewItem> {
    let mut due: Vec<ReviewItem> = items
        .iter()
        .filter(|item| item.next_review <= now)
        .cloned()
        .collect();
    due.sort_by_key(|item| item.next_review);
    due.truncate(limit);
    due
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReviewItem, UserId};
    use crate::time::fixed_now;

    fn build_item() -> ReviewItem {
        ReviewItem::new(UserId::new("u1"), "Q", "Rust", fixed_now())
    }

    fn quality(value: u8) -> Quality {
        Quality::new(value).unwrap()
    }

    #[test]
    fn first_pass_gives_one_day_interval() {
        let item = build_item();
        let updated = apply_review(&item, quality(4), fixed_now());

        assert_eq!(updated.interval_days, 1);
        assert_eq!(updated.repetitions, 1);
        assert_eq!(updated.review_count, 1);
        assert_eq!(updated.last_reviewed, Some(fixed_now()));
        assert_eq!(updated.next_review, fixed_now() + Duration::days(1));
    }

    #[test]
    fn second_pass_gives_six_day_interval() {
        let item = build_item();
        let first = apply_review(&item, quality(4), fixed_now());
        let second = apply_review(&first, quality(4), fixed_now());

        assert_eq!(second.interval_days, 6);
        assert_eq!(second.repetitions, 2);
        assert_eq!(second.next_review, fixed_now() + Duration::days(6));
    }

    #[test]
    fn third_pass_multiplies_by_ease_factor() {
        // Quality 4 leaves the ease factor untouched (delta is exactly 0),
        // so the third interval is round(6 * 2.5) = 15.
        let mut item = build_item();
        for _ in 0..2 {
            item = apply_review(&item, quality(4), fixed_now());
        }
        assert_eq!(item.ease_factor, 2.5);

        let third = apply_review(&item, quality(4), fixed_now());
        assert_eq!(third.interval_days, 15);
        assert_eq!(third.repetitions, 3);
    }

    #[test]
    fn interval_uses_ease_factor_from_before_the_update() {
        // Three perfect reviews: ease goes 2.5 -> 2.6 -> 2.7, and the third
        // interval must read 2.7 (the value before THIS review's update),
        // not 2.8: round(6 * 2.7) = 16.
        let mut item = build_item();
        item = apply_review(&item, quality(5), fixed_now());
        item = apply_review(&item, quality(5), fixed_now());
        assert!((item.ease_factor - 2.7).abs() < 1e-9);

        let third = apply_review(&item, quality(5), fixed_now());
        assert_eq!(third.interval_days, 16);
        assert!((third.ease_factor - 2.8).abs() < 1e-9);
    }

    #[test]
    fn rounded_interval_is_what_later_reviews_multiply() {
        // Continuing the perfect-streak run: the fourth interval multiplies
        // the stored whole-day 16, not the fractional 16.2 that produced it:
        // round(16 * 2.8) = 45.
        let mut item = build_item();
        for _ in 0..3 {
            item = apply_review(&item, quality(5), fixed_now());
        }
        assert_eq!(item.interval_days, 16);

        let fourth = apply_review(&item, quality(5), fixed_now());
        assert_eq!(fourth.interval_days, 45);
    }

    #[test]
    fn fail_resets_repetitions_and_interval() {
        let mut item = build_item();
        for _ in 0..4 {
            item = apply_review(&item, quality(5), fixed_now());
        }
        assert!(item.interval_days > 6);

        for q in 0..3 {
            let failed = apply_review(&item, quality(q), fixed_now());
            assert_eq!(failed.repetitions, 0);
            assert_eq!(failed.interval_days, 1);
            assert_eq!(failed.next_review, fixed_now() + Duration::days(1));
        }
    }

    #[test]
    fn ease_factor_never_drops_below_floor() {
        for start in [1.3, 2.5, 5.0] {
            let mut item = build_item().with_ease_factor(start);
            for _ in 0..10 {
                for q in 0..=5 {
                    item = apply_review(&item, quality(q), fixed_now());
                    assert!(item.ease_factor >= MIN_EASE_FACTOR);
                }
            }
        }
    }

    #[test]
    fn repeated_blackouts_converge_on_floor() {
        let mut item = build_item();
        for _ in 0..10 {
            item = apply_review(&item, quality(0), fixed_now());
        }
        assert!((item.ease_factor - MIN_EASE_FACTOR).abs() < 1e-9);
    }

    #[test]
    fn ease_factor_grows_without_upper_bound() {
        // No upper clamp on the ease factor.
        let mut item = build_item();
        for _ in 0..40 {
            item = apply_review(&item, quality(5), fixed_now());
        }
        assert!(item.ease_factor > 5.0);
    }

    #[test]
    fn average_quality_is_mean_of_all_ratings() {
        let ratings = [5, 2, 4, 0, 3, 3];
        let mut item = build_item();
        for q in ratings {
            item = apply_review(&item, quality(q), fixed_now());
        }

        let expected = ratings.iter().map(|&q| f64::from(q)).sum::<f64>() / ratings.len() as f64;
        assert!((item.average_quality - expected).abs() < 1e-9);
        assert_eq!(item.review_count, ratings.len() as u32);
    }

    #[test]
    fn average_quality_is_order_independent() {
        let forward = [1, 4, 5, 2];
        let backward = [2, 5, 4, 1];

        let mut a = build_item();
        for q in forward {
            a = apply_review(&a, quality(q), fixed_now());
        }
        let mut b = build_item();
        for q in backward {
            b = apply_review(&b, quality(q), fixed_now());
        }

        assert!((a.average_quality - b.average_quality).abs() < 1e-9);
    }

    #[test]
    fn scheduler_leaves_identity_fields_alone() {
        let item = build_item().with_answer("A").with_subtopic("sub");
        let updated = apply_review(&item, quality(3), fixed_now());

        assert_eq!(updated.id, item.id);
        assert_eq!(updated.user_id, item.user_id);
        assert_eq!(updated.question, item.question);
        assert_eq!(updated.answer, item.answer);
        assert_eq!(updated.topic, item.topic);
        assert_eq!(updated.created_at, item.created_at);
    }

    #[test]
    fn due_items_filters_and_orders_by_urgency() {
        let now = fixed_now();
        let mut one_day_over = build_item();
        one_day_over.next_review = now - Duration::days(1);
        let mut future = build_item();
        future.next_review = now + Duration::days(1);
        let mut three_days_over = build_item();
        three_days_over.next_review = now - Duration::days(3);

        let items = vec![one_day_over.clone(), future, three_days_over.clone()];
        let due = due_items(&items, now, 20);

        assert_eq!(due.len(), 2);
        assert_eq!(due[0].id, three_days_over.id);
        assert_eq!(due[1].id, one_day_over.id);
    }

    #[test]
    fn due_items_includes_exactly_due_and_respects_limit() {
        let now = fixed_now();
        let mut items = Vec::new();
        for offset in 0..5 {
            let mut item = build_item();
            item.next_review = now - Duration::days(offset);
            items.push(item);
        }

        let due = due_items(&items, now, 3);
        assert_eq!(due.len(), 3);
        // Most overdue first; the item due exactly now is included but last.
        assert_eq!(due[0].next_review, now - Duration::days(4));
        assert_eq!(due[2].next_review, now - Duration::days(2));

        let all = due_items(&items, now, 20);
        assert_eq!(all.len(), 5);
        assert_eq!(all[4].next_review, now);
    }

    #[test]
    fn due_items_empty_input_yields_empty_output() {
        assert!(due_items(&[], fixed_now(), 20).is_empty());
    }
}
