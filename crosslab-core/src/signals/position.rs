//! Position Mapper: the one-bar lag between a signal and the exposure it sets.

use super::SignalRecord;

/// Return a copy of `records` with `position[t] = signal[t-1]`.
///
/// The first record's position is always `None`. A decision made at the close
/// of bar `t-1` can only be acted on during bar `t`.
pub fn map_positions(records: &[SignalRecord]) -> Vec<SignalRecord> {
    let mut previous = None;
    records
        .iter()
        .map(|r| {
            let mapped = SignalRecord {
                position: previous,
                ..r.clone()
            };
            previous = r.signal;
            mapped
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Direction;
    use chrono::{Duration, NaiveDate};

    fn record(day: i64, signal: Option<Direction>) -> SignalRecord {
        SignalRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                + Duration::days(day),
            close: 100.0,
            short_ma: signal.map(|_| 100.0),
            long_ma: signal.map(|_| 100.0),
            signal,
            position: None,
        }
    }

    #[test]
    fn lags_by_one_bar() {
        let input = vec![
            record(0, None),
            record(1, Some(Direction::Long)),
            record(2, Some(Direction::Short)),
            record(3, Some(Direction::Long)),
        ];
        let out = map_positions(&input);
        assert_eq!(out[0].position, None);
        assert_eq!(out[1].position, None);
        assert_eq!(out[2].position, Some(Direction::Long));
        assert_eq!(out[3].position, Some(Direction::Short));
    }

    #[test]
    fn first_position_undefined_even_with_signal() {
        let out = map_positions(&[record(0, Some(Direction::Long))]);
        assert_eq!(out[0].position, None);
    }

    #[test]
    fn input_is_untouched() {
        let input = vec![record(0, Some(Direction::Long)), record(1, Some(Direction::Long))];
        let snapshot = input.clone();
        let _ = map_positions(&input);
        assert_eq!(input, snapshot);
    }

    #[test]
    fn empty_in_empty_out() {
        assert!(map_positions(&[]).is_empty());
    }
}
