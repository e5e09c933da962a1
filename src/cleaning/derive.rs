//! Feature deriver: quality filters, charge window and overstay.

use chrono::TimeDelta;
use tracing::{debug, info};

use crate::cleaning::sanitize::{CONNECT_TIME, DEADLINE, LAST_UPDATE, START_CHARGE_TIME};
use crate::cleaning::timestamp::parse_timestamp;
use crate::cleaning::types::{DerivationAudit, DerivedSession, SanitizedSession};
use crate::error::DataQualityError;

/// Sessions implying a full day of charging or more are treated as corrupt.
pub const MAX_CHARGE_HOURS: f64 = 24.0;

const SECONDS_PER_DAY: i64 = 86_400;

/// Filters sanitized sessions and derives `reqChargeTime_h`,
/// `finishChargeTime`, `Overstay` and `Overstay_h`.
///
/// Rows with zero power or zero energy are dropped before their timestamps
/// are read. Rows whose implied charge time is not within (0, 24) hours are
/// dropped after derivation. Neither filter is an error.
///
/// # Errors
///
/// Returns [`DataQualityError`] if a timestamp of a retained row cannot be
/// parsed.
pub fn derive(
    sessions: Vec<SanitizedSession>,
) -> Result<(Vec<DerivedSession>, DerivationAudit), DataQualityError> {
    let mut audit = DerivationAudit {
        input: sessions.len(),
        ..Default::default()
    };
    let mut derived = Vec::with_capacity(sessions.len());

    for session in sessions {
        if session.peak_power_w == 0.0 || session.cum_energy_wh == 0.0 {
            audit.dropped_zero_power_or_energy += 1;
            continue;
        }

        let row = derive_session(session)?;
        if !is_plausible_duration(row.req_charge_time_h) {
            audit.dropped_charge_duration += 1;
            continue;
        }
        derived.push(row);
    }

    audit.kept = derived.len();
    info!(
        input = audit.input,
        dropped_zero = audit.dropped_zero_power_or_energy,
        dropped_duration = audit.dropped_charge_duration,
        kept = audit.kept,
        "Sessions derived"
    );

    Ok((derived, audit))
}

fn is_plausible_duration(hours: f64) -> bool {
    hours.is_finite() && hours > 0.0 && hours < MAX_CHARGE_HOURS
}

fn derive_session(session: SanitizedSession) -> Result<DerivedSession, DataQualityError> {
    let connect_time = parse_timestamp(CONNECT_TIME, &session.connect_time)?;
    let start_charge_time = parse_timestamp(START_CHARGE_TIME, &session.start_charge_time)?;
    let deadline = parse_timestamp(DEADLINE, &session.deadline)?;
    let last_update = parse_timestamp(LAST_UPDATE, &session.last_update)?;

    let req_charge_time_h = session.cum_energy_wh / session.peak_power_w;

    // Implausible durations are filtered by the caller; skip the arithmetic
    // rather than overflow on them.
    let finish_charge_time = if is_plausible_duration(req_charge_time_h) {
        start_charge_time + charge_duration(req_charge_time_h)
    } else {
        start_charge_time
    };

    let overstay = (last_update - deadline).max(TimeDelta::zero());
    let overstay_h = overstay_hours(overstay);

    debug!(
        %start_charge_time,
        %finish_charge_time,
        req_charge_time_h,
        overstay_h,
        "Session window resolved"
    );

    Ok(DerivedSession {
        connect_time,
        start_charge_time,
        finish_charge_time,
        deadline,
        last_update,
        cum_energy_wh: session.cum_energy_wh,
        peak_power_w: session.peak_power_w,
        req_charge_time_h,
        overstay,
        overstay_h,
        extra: session.extra,
    })
}

/// Hours in the seconds-of-day part of `overstay`. Whole days and
/// sub-second parts are not counted.
fn overstay_hours(overstay: TimeDelta) -> f64 {
    (overstay.num_seconds() % SECONDS_PER_DAY) as f64 / 3600.0
}

/// Converts fractional hours to a duration rounded to the nearest second,
/// ties to even.
fn charge_duration(hours: f64) -> TimeDelta {
    TimeDelta::seconds((hours * 3600.0).round_ties_even() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use serde_json::Map;

    fn session(energy: f64, power: f64, deadline: &str, last_update: &str) -> SanitizedSession {
        SanitizedSession {
            connect_time: "2022-03-01T07:55:00".to_string(),
            start_charge_time: "2022-03-01T08:00:00".to_string(),
            deadline: deadline.to_string(),
            last_update: last_update.to_string(),
            cum_energy_wh: energy,
            peak_power_w: power,
            extra: Map::new(),
        }
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_derive_computes_charge_window() {
        let (rows, audit) = derive(vec![session(
            3000.0,
            2000.0,
            "2022-03-01T12:00:00",
            "2022-03-01T11:00:00",
        )])
        .unwrap();

        assert_eq!(audit.kept, 1);
        let row = &rows[0];
        assert_eq!(row.req_charge_time_h, 1.5);
        assert_eq!(row.start_charge_time, at(8, 0, 0));
        assert_eq!(row.finish_charge_time, at(9, 30, 0));
    }

    #[test]
    fn test_finish_time_rounds_to_nearest_second() {
        // 1 / 7 h = 514.2857 s
        let (rows, _) = derive(vec![session(
            1.0,
            7.0,
            "2022-03-01T12:00:00",
            "2022-03-01T11:00:00",
        )])
        .unwrap();

        assert_eq!(rows[0].finish_charge_time, at(8, 8, 34));
    }

    #[test]
    fn test_overstay_is_clamped_at_zero() {
        let (rows, _) = derive(vec![session(
            1000.0,
            2000.0,
            "2022-03-01T12:00:00",
            "2022-03-01T10:00:00",
        )])
        .unwrap();

        assert_eq!(rows[0].overstay, TimeDelta::zero());
        assert_eq!(rows[0].overstay_h, 0.0);
    }

    #[test]
    fn test_overstay_past_deadline() {
        let (rows, _) = derive(vec![session(
            1000.0,
            2000.0,
            "2022-03-01T12:00:00",
            "2022-03-01T13:30:00",
        )])
        .unwrap();

        assert_eq!(rows[0].overstay, TimeDelta::minutes(90));
        assert_eq!(rows[0].overstay_h, 1.5);
    }

    #[test]
    fn test_overstay_hours_ignore_whole_days() {
        let (rows, _) = derive(vec![session(
            1000.0,
            2000.0,
            "2022-03-01T12:00:00",
            "2022-03-02T13:00:00",
        )])
        .unwrap();

        assert_eq!(rows[0].overstay, TimeDelta::hours(25));
        assert_eq!(rows[0].overstay_h, 1.0);
    }

    #[test]
    fn test_overstay_hours_drop_sub_second_part() {
        let (rows, _) = derive(vec![session(
            1000.0,
            2000.0,
            "2022-03-01T12:00:00",
            "2022-03-01T12:30:00.750",
        )])
        .unwrap();

        assert_eq!(rows[0].overstay, TimeDelta::milliseconds(30 * 60 * 1000 + 750));
        assert_eq!(rows[0].overstay_h, 0.5);
    }

    #[test]
    fn test_zero_power_and_zero_energy_rows_are_dropped() {
        let (rows, audit) = derive(vec![
            session(0.0, 2000.0, "2022-03-01T12:00:00", "2022-03-01T11:00:00"),
            session(1000.0, 0.0, "2022-03-01T12:00:00", "2022-03-01T11:00:00"),
            session(1000.0, 2000.0, "2022-03-01T12:00:00", "2022-03-01T11:00:00"),
        ])
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(audit.dropped_zero_power_or_energy, 2);
        assert_eq!(audit.input, 3);
    }

    #[test]
    fn test_zero_rows_are_dropped_before_timestamp_parsing() {
        let (rows, audit) = derive(vec![session(0.0, 2000.0, "not a time", "nor this")]).unwrap();

        assert!(rows.is_empty());
        assert_eq!(audit.dropped_zero_power_or_energy, 1);
    }

    #[test]
    fn test_day_long_sessions_are_dropped() {
        let (rows, audit) = derive(vec![
            // 30 h
            session(30_000.0, 1000.0, "2022-03-01T12:00:00", "2022-03-01T11:00:00"),
            // exactly 24 h
            session(24_000.0, 1000.0, "2022-03-01T12:00:00", "2022-03-01T11:00:00"),
            // negative power
            session(1000.0, -1000.0, "2022-03-01T12:00:00", "2022-03-01T11:00:00"),
        ])
        .unwrap();

        assert!(rows.is_empty());
        assert_eq!(audit.dropped_charge_duration, 3);
        assert_eq!(audit.kept, 0);
    }

    #[test]
    fn test_derived_rows_satisfy_bounds() {
        let inputs = (1..40)
            .map(|i| {
                session(
                    i as f64 * 1700.0,
                    1100.0,
                    "2022-03-01T12:00:00",
                    "2022-03-01T14:00:00",
                )
            })
            .collect();

        let (rows, _) = derive(inputs).unwrap();

        assert!(!rows.is_empty());
        for row in rows {
            assert!(row.req_charge_time_h > 0.0 && row.req_charge_time_h < 24.0);
            assert!(row.overstay_h >= 0.0);
        }
    }

    #[test]
    fn test_unparsable_timestamp_is_data_quality_error() {
        let err = derive(vec![session(
            1000.0,
            2000.0,
            "2022-13-45T99:00:00",
            "2022-03-01T11:00:00",
        )])
        .unwrap_err();

        assert!(matches!(
            err,
            DataQualityError::UnparsableTimestamp {
                field: DEADLINE,
                ..
            }
        ));
    }
}
