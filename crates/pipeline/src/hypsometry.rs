//! Elevation-banded ice/snow area, aggregated over periods of years
//!
//! Each year that passes the hypsometry gate contributes one
//! [`YearBinArea`] per elevation band that holds cleaned mask pixels. A
//! period row is the mean over the years that contributed to that bin;
//! years without the bin are absent, not zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use glacis_core::Result;
use glacis_parallel::{ParallelStrategy, ProcessingMode};

use crate::config::Period;
use crate::series::{partition_years, YearFailure};
use crate::window::WindowEvaluator;

/// Area of one elevation bin in one year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearBinArea {
    pub year: i32,
    /// Band id, `floor(elevation / bin_size)`
    pub band: i32,
    /// Lower bound of the bin, metres
    pub elev_bin: f64,
    pub area_km2: f64,
}

/// Mean area of one elevation bin over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypsometryRow {
    pub elev_bin: f64,
    pub area_km2: f64,
    pub year_group: String,
    pub n_years_in_bin: usize,
}

/// Mean area and contributing-year count per bin, sorted by bin.
///
/// `rows` may hold years outside any period; the caller filters.
pub fn aggregate_period(label: &str, rows: &[YearBinArea]) -> Vec<HypsometryRow> {
    let mut sums: BTreeMap<i32, (f64, f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = sums.entry(row.band).or_insert((row.elev_bin, 0.0, 0));
        entry.1 += row.area_km2;
        entry.2 += 1;
    }
    sums.into_values()
        .map(|(elev_bin, total, n)| HypsometryRow {
            elev_bin,
            area_km2: total / n as f64,
            year_group: label.to_string(),
            n_years_in_bin: n,
        })
        .collect()
}

/// Outcome of a hypsometry run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HypsometryReport {
    /// Per-year bin areas of every gated-in year
    pub year_rows: Vec<YearBinArea>,
    /// Period rows, sorted by (year_group, elev_bin)
    pub rows: Vec<HypsometryRow>,
    /// Years that failed the hypsometry gate
    pub gated_out_years: Vec<i32>,
    pub failures: Vec<YearFailure>,
    /// Years with at least one coarsened reduction
    pub coarsened_years: Vec<i32>,
}

/// Result for one year: `None` bins when the gate fails
#[derive(Debug, Clone, PartialEq)]
pub struct YearHypsometry {
    pub year: i32,
    pub bins: Option<Vec<YearBinArea>>,
    pub coarsened: bool,
}

/// Builds per-year bin areas and period curves
#[derive(Debug, Clone, Copy)]
pub struct HypsometricAggregator<'a> {
    evaluator: WindowEvaluator<'a>,
}

impl<'a> HypsometricAggregator<'a> {
    pub fn new(evaluator: WindowEvaluator<'a>) -> Self {
        Self { evaluator }
    }

    /// Bin areas of one year's extent window
    pub fn year(&self, year: i32) -> Result<YearHypsometry> {
        let ev = &self.evaluator;
        let config = ev.config();
        let scales = &config.scales;

        let extent = ev.evaluate(
            config.windows.season.window(year)?,
            scales.hypsometry_clear_fraction_m,
        )?;
        let mut coarsened = extent.coarsened;

        let Some(mask) = ev.gated_cleaned_mask(&extent, &config.gates.hypsometry)? else {
            debug!(year, n = extent.n_scenes(), clear = extent.clear_fraction, "gated out of hypsometry");
            return Ok(YearHypsometry {
                year,
                bins: None,
                coarsened,
            });
        };

        let bands = ev.context().elevation_bands();
        let areas = ev
            .reducer()
            .grouped_area_km2(bands.raster(), &mask, scales.hypsometry_m)?;
        coarsened |= areas.coarsened;

        let bins = areas
            .value
            .into_iter()
            .map(|(band, area_km2)| YearBinArea {
                year,
                band,
                elev_bin: bands.lower_bound_m(band),
                area_km2,
            })
            .collect::<Vec<_>>();
        debug!(year, bins = bins.len(), "hypsometry year evaluated");

        Ok(YearHypsometry {
            year,
            bins: Some(bins),
            coarsened,
        })
    }

    /// Evaluate every year of every period and aggregate per period
    pub fn run(&self, periods: &[Period]) -> HypsometryReport {
        let mut years: Vec<i32> = periods.iter().flat_map(Period::years).collect();
        years.sort_unstable();
        years.dedup();

        let mode = ProcessingMode::from_threads(self.evaluator.config().threads);
        let results = mode.par_map_items(&years, |&year| (year, self.year(year)));
        let (evaluated, failures) = partition_years(results, "hypsometry");

        let mut report = HypsometryReport {
            failures,
            ..HypsometryReport::default()
        };
        for year in evaluated {
            if year.coarsened {
                report.coarsened_years.push(year.year);
            }
            match year.bins {
                Some(bins) => report.year_rows.extend(bins),
                None => report.gated_out_years.push(year.year),
            }
        }

        let mut rows: Vec<HypsometryRow> = periods
            .iter()
            .flat_map(|period| {
                let members: Vec<YearBinArea> = report
                    .year_rows
                    .iter()
                    .filter(|r| period.years().contains(&r.year))
                    .copied()
                    .collect();
                aggregate_period(&period.label, &members)
            })
            .collect();
        rows.sort_by(|a, b| {
            a.year_group
                .cmp(&b.year_group)
                .then(a.elev_bin.total_cmp(&b.elev_bin))
        });
        report.rows = rows;

        info!(
            years = years.len(),
            gated_out = report.gated_out_years.len(),
            failed = report.failures.len(),
            rows = report.rows.len(),
            "hypsometry complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bin(year: i32, elev: f64, area: f64) -> YearBinArea {
        YearBinArea {
            year,
            band: (elev / 50.0) as i32,
            elev_bin: elev,
            area_km2: area,
        }
    }

    #[test]
    fn test_identical_years_keep_areas() {
        let rows: Vec<_> = [2000, 2001]
            .into_iter()
            .flat_map(|y| [bin(y, 1000.0, 0.5), bin(y, 1050.0, 1.2), bin(y, 1100.0, 0.3)])
            .collect();
        let out = aggregate_period("Early", &rows);
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].elev_bin, 1050.0);
        assert_relative_eq!(out[1].area_km2, 1.2);
        assert!(out.iter().all(|r| r.n_years_in_bin == 2 && r.year_group == "Early"));
    }

    #[test]
    fn test_missing_bin_is_not_zero() {
        let rows = vec![bin(2000, 1000.0, 1.0), bin(2001, 1000.0, 3.0), bin(2001, 1050.0, 2.0)];
        let out = aggregate_period("Late", &rows);
        assert_relative_eq!(out[0].area_km2, 2.0);
        assert_eq!(out[0].n_years_in_bin, 2);
        assert_relative_eq!(out[1].area_km2, 2.0);
        assert_eq!(out[1].n_years_in_bin, 1);
    }

    #[test]
    fn test_three_years_with_gaps() {
        let rows = vec![
            bin(2000, 1000.0, 1.0),
            bin(2000, 1050.0, 1.0),
            bin(2001, 1000.0, 2.0),
            bin(2001, 1100.0, 0.9),
            bin(2002, 1000.0, 3.0),
            bin(2002, 1050.0, 2.0),
        ];
        let out = aggregate_period("Span", &rows);
        let bins: Vec<(f64, usize)> = out.iter().map(|r| (r.elev_bin, r.n_years_in_bin)).collect();
        assert_eq!(bins, vec![(1000.0, 3), (1050.0, 2), (1100.0, 1)]);
        assert_relative_eq!(out[0].area_km2, 2.0);
        // Mean over 2000 and 2002 only
        assert_relative_eq!(out[1].area_km2, 1.5);
        assert_relative_eq!(out[2].area_km2, 0.9);
    }

    #[test]
    fn test_empty_period() {
        assert!(aggregate_period("Early", &[]).is_empty());
    }
}
