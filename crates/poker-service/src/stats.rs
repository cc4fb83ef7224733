//! Vote statistics revealed when a round ends.

use poker_protocol::{RoomStats, Vote};

/// Aggregate a round's votes.
///
/// `average`, `min` and `max` only consider numeric cards and are zero when
/// there are none. The average is rounded half-up to two decimal places.
#[must_use]
pub fn compute(votes: &[Vote]) -> RoomStats {
    let mut stats = RoomStats {
        total_votes: votes.len(),
        ..RoomStats::default()
    };

    for vote in votes {
        *stats.distribution.entry(vote.value).or_insert(0) += 1;
    }

    let numeric: Vec<u8> = votes.iter().filter_map(|vote| vote.value.points()).collect();
    let (Some(&min), Some(&max)) = (numeric.iter().min(), numeric.iter().max()) else {
        return stats;
    };

    let sum: u64 = numeric.iter().map(|&points| u64::from(points)).sum();
    stats.average = average_to_hundredths(sum, numeric.len() as u64);
    stats.min = min;
    stats.max = max;
    stats
}

/// `sum / count` rounded half-up to two places. Rounds in integer hundredths
/// so `.xx5` averages round the same way whether or not they are exact in
/// binary. `count` is non-zero.
#[allow(clippy::cast_precision_loss)]
fn average_to_hundredths(sum: u64, count: u64) -> f64 {
    let hundredths = (sum * 200 + count) / (2 * count);
    hundredths as f64 / 100.0
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use chrono::Utc;
    use poker_protocol::VoteValue;
    use std::collections::BTreeMap;

    fn votes(values: &[VoteValue]) -> Vec<Vote> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| Vote {
                user_id: format!("conn-{i}"),
                user_name: format!("User {i}"),
                value,
                timestamp: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_empty_round_is_all_zero() {
        let stats = compute(&[]);
        assert_eq!(stats, RoomStats::default());
        assert_eq!(stats.total_votes, 0);
        assert!(stats.distribution.is_empty());
    }

    #[test]
    fn test_mixed_numeric_and_unknown() {
        let stats = compute(&votes(&[VoteValue::Five, VoteValue::Eight, VoteValue::Unknown]));

        assert_eq!(stats.total_votes, 3);
        assert_eq!(stats.average, 6.5);
        assert_eq!(stats.min, 5);
        assert_eq!(stats.max, 8);
        assert_eq!(
            stats.distribution,
            BTreeMap::from([
                (VoteValue::Five, 1),
                (VoteValue::Eight, 1),
                (VoteValue::Unknown, 1),
            ])
        );
    }

    #[test]
    fn test_only_unknown_votes() {
        let stats = compute(&votes(&[VoteValue::Unknown, VoteValue::Unknown]));

        assert_eq!(stats.total_votes, 2);
        assert_eq!(stats.average, 0.0);
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 0);
        assert_eq!(stats.distribution, BTreeMap::from([(VoteValue::Unknown, 2)]));
    }

    #[test]
    fn test_average_rounds_to_two_places() {
        // 1 + 1 + 2 = 4 / 3 = 1.333...
        let stats = compute(&votes(&[VoteValue::One, VoteValue::One, VoteValue::Two]));
        assert_eq!(stats.average, 1.33);

        // 1 + 2 + 2 = 5 / 3 = 1.666...
        let stats = compute(&votes(&[VoteValue::One, VoteValue::Two, VoteValue::Two]));
        assert_eq!(stats.average, 1.67);
    }

    #[test]
    fn test_average_half_rounds_up() {
        let mut values = vec![VoteValue::One];
        values.extend(std::iter::repeat(VoteValue::Zero).take(7));

        // 1 / 8 = 0.125
        let stats = compute(&votes(&values));
        assert_eq!(stats.average, 0.13);
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 1);
        assert_eq!(stats.distribution[&VoteValue::Zero], 7);
    }

    #[test]
    fn test_average_half_rounds_up_when_inexact_in_binary() {
        // 41 / 40 = 1.025, which has no exact f64 form
        let mut values = vec![VoteValue::Two];
        values.extend(std::iter::repeat(VoteValue::One).take(39));

        let stats = compute(&votes(&values));
        assert_eq!(stats.average, 1.03);

        // 21 / 8 = 2.625
        let mut values = vec![VoteValue::Thirteen, VoteValue::Eight];
        values.extend(std::iter::repeat(VoteValue::Zero).take(6));
        let stats = compute(&votes(&values));
        assert_eq!(stats.average, 2.63);
    }

    #[test]
    fn test_zero_card_counts_as_numeric() {
        let stats = compute(&votes(&[VoteValue::Zero, VoteValue::Unknown]));
        assert_eq!(stats.total_votes, 2);
        assert_eq!(stats.average, 0.0);
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 0);
        assert_eq!(stats.distribution.len(), 2);
    }

    #[test]
    fn test_distribution_counts_duplicates() {
        let stats = compute(&votes(&[
            VoteValue::EightyNine,
            VoteValue::Three,
            VoteValue::EightyNine,
        ]));
        assert_eq!(stats.min, 3);
        assert_eq!(stats.max, 89);
        assert_eq!(stats.average, 60.33);
        assert_eq!(stats.distribution[&VoteValue::EightyNine], 2);
    }
}
