//! Interval expander: sessions to a merged 5-minute demand series.

use std::collections::BTreeMap;
use std::iter::successors;

use chrono::{DurationRound, NaiveDateTime, TimeDelta};
use tracing::debug;

use crate::cleaning::DerivedSession;
use crate::timeseries::types::BaseSample;

/// Width of one base slot.
pub const SLOT: TimeDelta = TimeDelta::minutes(5);

/// Where a session's slots sit in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlotAlignment {
    /// Slots are offset from each session's own start time, so sessions
    /// only merge where their offsets coincide.
    #[default]
    SessionStart,
    /// Slots are floored onto the wall-clock 5-minute grid.
    Calendar,
}

impl SlotAlignment {
    fn align(self, slot: NaiveDateTime) -> NaiveDateTime {
        match self {
            SlotAlignment::SessionStart => slot,
            SlotAlignment::Calendar => slot.duration_trunc(SLOT).unwrap_or(slot),
        }
    }
}

/// Slot times covering `[start, finish]`: `start + k * SLOT` for every
/// `k >= 0` not past `finish`.
///
/// The start is always present. The finish is present only if it falls on a
/// step; the trailing partial slot is truncated, not weighted.
pub fn session_slots(
    start: NaiveDateTime,
    finish: NaiveDateTime,
) -> impl Iterator<Item = NaiveDateTime> {
    successors(Some(start), |slot| slot.checked_add_signed(SLOT))
        .take_while(move |slot| *slot <= finish)
}

/// Expands every session into slots carrying its `peakPower_W` and sums the
/// demand of sessions sharing a slot.
///
/// The result is sorted with strictly increasing, unique timestamps.
pub fn expand(sessions: &[DerivedSession], alignment: SlotAlignment) -> Vec<BaseSample> {
    let mut demand: BTreeMap<NaiveDateTime, f64> = BTreeMap::new();
    let mut generated = 0usize;

    for session in sessions {
        for slot in session_slots(session.start_charge_time, session.finish_charge_time) {
            // Concurrent charging adds up; it is never averaged.
            *demand.entry(alignment.align(slot)).or_insert(0.0) += session.peak_power_w;
            generated += 1;
        }
    }

    debug!(
        sessions = sessions.len(),
        generated,
        merged = demand.len(),
        ?alignment,
        "Sessions expanded"
    );

    demand
        .into_iter()
        .map(|(time, avg_power_demand_w)| BaseSample {
            time,
            avg_power_demand_w,
        })
        .collect()
}
