//! Years with usable ice/snow cover, per period

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use glacis_core::Result;
use glacis_parallel::{ParallelStrategy, ProcessingMode};

use crate::config::Period;
use crate::series::{partition_years, YearFailure};
use crate::window::WindowEvaluator;

/// Valid years of one period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidYearsSummary {
    pub year_group: String,
    #[serde(rename = "y0")]
    pub first_year: i32,
    #[serde(rename = "y1")]
    pub last_year: i32,
    pub n_valid_years: usize,
    pub valid_years: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidYearsReport {
    pub summaries: Vec<ValidYearsSummary>,
    pub failures: Vec<YearFailure>,
}

/// A year is valid when it passes the hypsometry gate and its cleaned mask
/// has a positive area.
#[derive(Debug, Clone, Copy)]
pub struct ValidYearEvaluator<'a> {
    evaluator: WindowEvaluator<'a>,
}

impl<'a> ValidYearEvaluator<'a> {
    pub fn new(evaluator: WindowEvaluator<'a>) -> Self {
        Self { evaluator }
    }

    pub fn is_valid(&self, year: i32) -> Result<bool> {
        let ev = &self.evaluator;
        let config = ev.config();
        let extent = ev.evaluate(
            config.windows.season.window(year)?,
            config.scales.hypsometry_clear_fraction_m,
        )?;
        let Some(mask) = ev.gated_cleaned_mask(&extent, &config.gates.hypsometry)? else {
            return Ok(false);
        };
        let area = ev.reducer().area_km2(&mask, config.scales.valid_year_m)?;
        debug!(year, area_km2 = area.value, "valid-year area");
        Ok(area.value > 0.0)
    }

    pub fn summarize(&self, period: &Period) -> (ValidYearsSummary, Vec<YearFailure>) {
        let years: Vec<i32> = period.years().collect();
        let mode = ProcessingMode::from_threads(self.evaluator.config().threads);
        let results = mode.par_map_items(&years, |&year| (year, self.is_valid(year).map(|ok| (year, ok))));
        let (evaluated, failures) = partition_years(results, "valid_years");

        let valid_years: Vec<i32> = evaluated.into_iter().filter(|&(_, ok)| ok).map(|(y, _)| y).collect();
        let summary = ValidYearsSummary {
            year_group: period.label.clone(),
            first_year: period.first_year,
            last_year: period.last_year,
            n_valid_years: valid_years.len(),
            valid_years,
        };
        (summary, failures)
    }

    pub fn run(&self, periods: &[Period]) -> ValidYearsReport {
        let mut report = ValidYearsReport::default();
        for period in periods {
            let (summary, failures) = self.summarize(period);
            info!(
                period = %period.label,
                valid = summary.n_valid_years,
                failed = failures.len(),
                "valid years counted"
            );
            report.summaries.push(summary);
            report.failures.extend(failures);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_field_names() {
        let summary = ValidYearsSummary {
            year_group: "Early".into(),
            first_year: 1989,
            last_year: 2005,
            n_valid_years: 2,
            valid_years: vec![1990, 1994],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["y0"], 1989);
        assert_eq!(json["y1"], 2005);
        assert_eq!(json["valid_years"][1], 1994);
    }
}
