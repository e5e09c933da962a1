//! Multi-granularity aggregation of the enriched base series.

use std::collections::BTreeMap;

use chrono::{Datelike, DurationRound, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use tracing::debug;

use crate::timeseries::types::EnrichedSample;

/// Reporting resolutions. Each one is persisted as its own artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    FiveMinute,
    Hourly,
    Daily,
    Monthly,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::FiveMinute,
        Granularity::Hourly,
        Granularity::Daily,
        Granularity::Monthly,
    ];

    /// Artifact name for this granularity.
    pub fn name(self) -> &'static str {
        match self {
            Granularity::FiveMinute => "fivemindemand",
            Granularity::Hourly => "hourlydemand",
            Granularity::Daily => "dailydemand",
            Granularity::Monthly => "monthlydemand",
        }
    }

    /// Label of the bucket containing `time`.
    ///
    /// Hourly and daily buckets are labelled by their start; monthly buckets
    /// by the last day of the month at midnight.
    pub fn bucket(self, time: NaiveDateTime) -> NaiveDateTime {
        match self {
            Granularity::FiveMinute => time,
            Granularity::Hourly => time.duration_trunc(TimeDelta::hours(1)).unwrap_or(time),
            Granularity::Daily => time.date().and_time(NaiveTime::MIN),
            Granularity::Monthly => month_end(time.date()).and_time(NaiveTime::MIN),
        }
    }
}

fn month_end(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// How a numeric column collapses a bucket of samples into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Mean,
    Sum,
    Max,
}

impl Aggregation {
    /// Reduces a non-empty bucket; `None` when `values` is empty.
    pub fn reduce(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(match self {
            Aggregation::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Numeric columns of a demand series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    AvgPowerDemandW,
    EnergyDemandKwh,
    PeakPowerW,
}

impl Column {
    /// Fixed aggregation rule for the column. The `day` and `month` labels
    /// are not aggregated; a bucket keeps the labels of its first sample.
    pub const fn aggregation(self) -> Aggregation {
        match self {
            Column::AvgPowerDemandW => Aggregation::Mean,
            Column::EnergyDemandKwh => Aggregation::Sum,
            Column::PeakPowerW => Aggregation::Max,
        }
    }

    fn value(self, sample: &EnrichedSample) -> f64 {
        match self {
            Column::AvgPowerDemandW => sample.avg_power_demand_w,
            Column::EnergyDemandKwh => sample.energy_demand_kwh,
            Column::PeakPowerW => sample.peak_power_w,
        }
    }

    fn reduce(self, samples: &[&EnrichedSample]) -> f64 {
        let values: Vec<f64> = samples.iter().map(|s| self.value(s)).collect();
        self.aggregation().reduce(&values).unwrap_or(0.0)
    }
}

/// A demand series at one granularity.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandSeries {
    pub granularity: Granularity,
    pub rows: Vec<EnrichedSample>,
}

/// Resamples a time-ordered series onto `granularity` buckets.
///
/// Buckets without samples produce no row.
pub fn resample(series: &[EnrichedSample], granularity: Granularity) -> Vec<EnrichedSample> {
    let mut buckets: BTreeMap<NaiveDateTime, Vec<&EnrichedSample>> = BTreeMap::new();
    for sample in series {
        buckets
            .entry(granularity.bucket(sample.time))
            .or_default()
            .push(sample);
    }

    buckets
        .into_iter()
        .filter_map(|(time, samples)| {
            let first = samples.first()?;
            Some(EnrichedSample {
                time,
                avg_power_demand_w: Column::AvgPowerDemandW.reduce(&samples),
                energy_demand_kwh: Column::EnergyDemandKwh.reduce(&samples),
                peak_power_w: Column::PeakPowerW.reduce(&samples),
                day: first.day.clone(),
                month: first.month.clone(),
            })
        })
        .collect()
}

/// Produces the four reporting series from the enriched base series.
///
/// The five-minute series is the base series itself, unmodified.
pub fn aggregate_all(base: Vec<EnrichedSample>) -> Vec<DemandSeries> {
    let coarse: Vec<DemandSeries> = Granularity::ALL
        .iter()
        .filter(|g| **g != Granularity::FiveMinute)
        .map(|&granularity| DemandSeries {
            granularity,
            rows: resample(&base, granularity),
        })
        .collect();

    for series in &coarse {
        debug!(
            granularity = series.granularity.name(),
            rows = series.rows.len(),
            "Series resampled"
        );
    }

    std::iter::once(DemandSeries {
        granularity: Granularity::FiveMinute,
        rows: base,
    })
    .chain(coarse)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeseries::features::enrich;
    use crate::timeseries::types::BaseSample;

    fn at(month: u32, day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, month, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn base(points: &[(NaiveDateTime, f64)]) -> Vec<EnrichedSample> {
        let samples: Vec<_> = points
            .iter()
            .map(|&(time, avg_power_demand_w)| BaseSample {
                time,
                avg_power_demand_w,
            })
            .collect();
        enrich(&samples)
    }

    #[test]
    fn test_aggregation_rules() {
        assert_eq!(Aggregation::Mean.reduce(&[1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(Aggregation::Sum.reduce(&[1.0, 2.0, 6.0]), Some(9.0));
        assert_eq!(Aggregation::Max.reduce(&[1.0, 7.0, 6.0]), Some(7.0));
        assert_eq!(Aggregation::Sum.reduce(&[]), None);
    }

    #[test]
    fn test_column_rule_table() {
        assert_eq!(Column::AvgPowerDemandW.aggregation(), Aggregation::Mean);
        assert_eq!(Column::EnergyDemandKwh.aggregation(), Aggregation::Sum);
        assert_eq!(Column::PeakPowerW.aggregation(), Aggregation::Max);
    }

    #[test]
    fn test_hourly_resample_applies_rules() {
        let series = base(&[
            (at(3, 1, 8, 0), 1200.0),
            (at(3, 1, 8, 5), 3600.0),
            (at(3, 1, 8, 55), 2400.0),
            (at(3, 1, 9, 0), 6000.0),
        ]);

        let hourly = resample(&series, Granularity::Hourly);

        assert_eq!(hourly.len(), 2);
        let eight = &hourly[0];
        assert_eq!(eight.time, at(3, 1, 8, 0));
        assert_eq!(eight.avg_power_demand_w, 2400.0);
        assert_eq!(eight.peak_power_w, 3600.0);
        assert!((eight.energy_demand_kwh - 0.6).abs() < 1e-12);
        assert_eq!(eight.day, "Tuesday");
        assert_eq!(hourly[1].time, at(3, 1, 9, 0));
        assert_eq!(hourly[1].energy_demand_kwh, 0.5);
    }

    #[test]
    fn test_empty_buckets_are_not_filled() {
        let series = base(&[(at(3, 1, 8, 0), 1200.0), (at(3, 1, 11, 30), 1200.0)]);

        let hourly = resample(&series, Granularity::Hourly);

        let times: Vec<_> = hourly.iter().map(|r| r.time).collect();
        assert_eq!(times, vec![at(3, 1, 8, 0), at(3, 1, 11, 0)]);
    }

    #[test]
    fn test_daily_buckets_start_at_midnight() {
        let series = base(&[
            (at(3, 1, 23, 55), 1000.0),
            (at(3, 2, 0, 0), 3000.0),
            (at(3, 2, 18, 0), 5000.0),
        ]);

        let daily = resample(&series, Granularity::Daily);

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].time, at(3, 1, 0, 0));
        assert_eq!(daily[1].time, at(3, 2, 0, 0));
        assert_eq!(daily[1].avg_power_demand_w, 4000.0);
        assert_eq!(daily[1].day, "Wednesday");
    }

    #[test]
    fn test_monthly_buckets_are_labelled_at_month_end() {
        let series = base(&[
            (at(2, 3, 10, 0), 1000.0),
            (at(2, 28, 10, 0), 3000.0),
            (at(12, 25, 10, 0), 2000.0),
        ]);

        let monthly = resample(&series, Granularity::Monthly);

        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].time, at(2, 28, 0, 0));
        assert_eq!(monthly[0].month, "February");
        assert_eq!(monthly[0].peak_power_w, 3000.0);
        assert_eq!(monthly[1].time, at(12, 31, 0, 0));
    }

    #[test]
    fn test_resample_is_idempotent_on_aligned_series() {
        let series = base(&[
            (at(3, 1, 8, 0), 1200.0),
            (at(3, 1, 8, 35), 3600.0),
            (at(3, 1, 10, 5), 2400.0),
            (at(3, 2, 10, 5), 800.0),
        ]);

        for granularity in [Granularity::Hourly, Granularity::Daily, Granularity::Monthly] {
            let once = resample(&series, granularity);
            let twice = resample(&once, granularity);
            assert_eq!(once, twice, "{}", granularity.name());
        }
    }

    #[test]
    fn test_peak_lies_within_bucket_demand_range() {
        let series = base(
            &(0..600)
                .map(|i| (at(3, 1, 0, 0) + TimeDelta::minutes(5 * i), ((i * 37) % 11) as f64 * 700.0))
                .collect::<Vec<_>>(),
        );

        for granularity in Granularity::ALL {
            for row in resample(&series, granularity) {
                let contributing: Vec<f64> = series
                    .iter()
                    .filter(|s| granularity.bucket(s.time) == row.time)
                    .map(|s| s.avg_power_demand_w)
                    .collect();
                let min = contributing.iter().copied().fold(f64::INFINITY, f64::min);
                let max = contributing.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                assert!(row.peak_power_w >= min && row.peak_power_w <= max);
            }
        }
    }

    #[test]
    fn test_aggregate_all_emits_four_named_series() {
        let series = base(&[(at(3, 1, 8, 0), 1200.0), (at(3, 1, 8, 5), 2400.0)]);

        let all = aggregate_all(series.clone());

        let names: Vec<_> = all.iter().map(|s| s.granularity.name()).collect();
        assert_eq!(
            names,
            vec!["fivemindemand", "hourlydemand", "dailydemand", "monthlydemand"]
        );
        assert_eq!(all[0].rows, series);
        assert_eq!(all[1].rows.len(), 1);
    }
}
