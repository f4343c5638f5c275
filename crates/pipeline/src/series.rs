//! Yearly extent and snowline series
//!
//! Every year runs two independent windows. The extent window (August to May
//! by default) yields the ice/snow area, clear fraction and surface
//! temperature. The summer window (January to March) yields the snowline,
//! and only when its own gate passes.

use std::ops::RangeInclusive;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use glacis_algorithms::morphology::edge_band;
use glacis_algorithms::statistics::ElevationSampler;
use glacis_core::{Result, SceneSet};
use glacis_parallel::{ParallelStrategy, ProcessingMode};

use crate::config::PipelineConfig;
use crate::window::WindowEvaluator;

/// Label of the extent window in every record
pub const SEASON_WINDOW: &str = "SEASON";

/// Configuration constants recorded with each year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordParameters {
    pub season: String,
    pub snow_window: String,
    pub ndsi_thr: f64,
    pub swir1_max: f64,
    pub min_scenes_quality: usize,
    pub min_clear_fraction: f64,
    pub min_scenes_snowline: usize,
    pub min_clear_fraction_snowline: f64,
    pub min_glacier_km2_for_snowline: f64,
    pub scale_m: f64,
    pub dem: String,
}

impl RecordParameters {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            season: config.windows.season.label(),
            snow_window: config.windows.summer.label(),
            ndsi_thr: config.classifier.ndsi_threshold,
            swir1_max: config.classifier.swir1_max,
            min_scenes_quality: config.gates.extent.min_scenes,
            min_clear_fraction: config.gates.extent.min_clear_fraction,
            min_scenes_snowline: config.gates.snowline.min_scenes,
            min_clear_fraction_snowline: config.gates.snowline.min_clear_fraction,
            min_glacier_km2_for_snowline: config.gates.snowline.min_glacier_km2,
            scale_m: config.scales.area_m,
            dem: config.dem_label.clone(),
        }
    }
}

/// One row of the yearly table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    pub year: i32,
    pub window_used: String,

    // extent window
    pub img_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub clear_fraction: Option<f64>,
    pub glacier_km2: Option<f64>,
    #[serde(rename = "lst_median_C")]
    pub lst_median_c: Option<f64>,
    pub ok_scenes: bool,
    pub ok_clear: Option<bool>,
    pub ok_overall: Option<bool>,

    // summer window
    pub n_snow: usize,
    pub clear_fraction_snow: Option<f64>,
    pub do_snowline: bool,
    pub snowline_edge_m: Option<f64>,
    pub snow_elev_p10_m: Option<f64>,
    pub snow_elev_p50_m: Option<f64>,
    pub snow_elev_p90_m: Option<f64>,

    /// Some reduction of this year ran at a coarser scale than configured
    pub reduction_coarsened: bool,

    #[serde(flatten)]
    pub params: RecordParameters,
}

/// A year whose evaluation failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearFailure {
    pub year: i32,
    pub reason: String,
}

/// Records for the years that completed, failures for the rest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesReport {
    pub records: Vec<YearRecord>,
    pub failures: Vec<YearFailure>,
}

/// Split per-year results into successes and failures, in year order
pub(crate) fn partition_years<T>(results: Vec<(i32, Result<T>)>, stage: &str) -> (Vec<T>, Vec<YearFailure>) {
    let mut ok = Vec::new();
    let mut failures = Vec::new();
    for (year, result) in results {
        match result {
            Ok(value) => ok.push(value),
            Err(e) => {
                warn!(year, stage, error = %e, "year failed");
                failures.push(YearFailure {
                    year,
                    reason: e.to_string(),
                });
            }
        }
    }
    (ok, failures)
}

/// Builds [`YearRecord`]s
#[derive(Debug, Clone, Copy)]
pub struct SeriesAssembler<'a> {
    evaluator: WindowEvaluator<'a>,
}

impl<'a> SeriesAssembler<'a> {
    pub fn new(evaluator: WindowEvaluator<'a>) -> Self {
        Self { evaluator }
    }

    /// Configured year range, starting at the earliest scene when no first
    /// year is set. `None` for an empty scene set without a first year.
    pub fn year_range(config: &PipelineConfig, scenes: &SceneSet) -> Option<RangeInclusive<i32>> {
        config
            .years
            .resolve(scenes.first_acquired().map(|t| t.date_naive()))
    }

    /// Evaluate every year concurrently; a failing year does not stop the
    /// others.
    pub fn run(&self, years: RangeInclusive<i32>) -> SeriesReport {
        let years: Vec<i32> = years.collect();
        let mode = ProcessingMode::from_threads(self.evaluator.config().threads);
        let results = mode.par_map_items(&years, |&year| (year, self.year(year)));
        let (records, failures) = partition_years(results, "series");

        info!(
            years = years.len(),
            records = records.len(),
            failed = failures.len(),
            "yearly series complete"
        );
        SeriesReport { records, failures }
    }

    /// The record for one year
    pub fn year(&self, year: i32) -> Result<YearRecord> {
        let ev = &self.evaluator;
        let config = ev.config();
        let reducer = ev.reducer();
        let scales = &config.scales;

        // Extent window
        let extent = ev.evaluate(config.windows.season.window(year)?, scales.clear_fraction_m)?;
        let mut coarsened = extent.coarsened;

        let glacier_km2 = match ev.classify(&extent)? {
            Some(mask) => {
                let area = reducer.area_km2(&mask, scales.area_m)?;
                coarsened |= area.coarsened;
                Some(area.value)
            }
            None => None,
        };

        let lst_median_c = match extent.composite.as_ref().and_then(|c| c.lst.as_ref()) {
            Some(lst) => {
                let median = reducer.median(lst, None, scales.temperature_m)?;
                coarsened |= median.coarsened;
                median.value
            }
            None => None,
        };

        let gate = extent.gate(&config.gates.extent);

        // Summer window
        let summer = ev.evaluate(config.windows.summer.window(year)?, scales.clear_fraction_m)?;
        coarsened |= summer.coarsened;
        let do_snowline = config
            .gates
            .snowline
            .allows(summer.n_scenes(), summer.clear_fraction, glacier_km2);

        let mut snowline_edge_m = None;
        let mut percentiles = None;
        if do_snowline {
            if let Some(cleaned) = ev.cleaned_mask(&summer)? {
                let context = ev.context();
                let edges = edge_band(&cleaned, context.footprint(), config.cleaning.edge_radius)?;
                let sampler = ElevationSampler::new(*reducer, context.dem());

                let edge = sampler.edge_median(&edges, scales.snowline_m)?;
                let interior = sampler.interior_percentiles(&cleaned, scales.snowline_m)?;
                coarsened |= edge.coarsened || interior.coarsened;
                snowline_edge_m = edge.value;
                percentiles = interior.value;
            }
        }

        if coarsened {
            warn!(year, "reductions coarsened to fit the pixel budget");
        }
        debug!(
            year,
            n = extent.n_scenes(),
            n_snow = summer.n_scenes(),
            glacier_km2,
            do_snowline,
            "year evaluated"
        );

        let composite = extent.composite.as_ref();
        Ok(YearRecord {
            year,
            window_used: SEASON_WINDOW.to_string(),
            img_count: extent.n_scenes(),
            first_date: composite.map(|c| c.first_date),
            last_date: composite.map(|c| c.last_date),
            clear_fraction: extent.clear_fraction,
            glacier_km2,
            lst_median_c,
            ok_scenes: gate.ok_scenes,
            ok_clear: gate.ok_clear,
            ok_overall: gate.ok_overall,
            n_snow: summer.n_scenes(),
            clear_fraction_snow: summer.clear_fraction,
            do_snowline,
            snowline_edge_m,
            snow_elev_p10_m: percentiles.map(|p| p.p10),
            snow_elev_p50_m: percentiles.map(|p| p.p50),
            snow_elev_p90_m: percentiles.map(|p| p.p90),
            reduction_coarsened: coarsened,
            params: RecordParameters::from_config(config),
        })
    }
}
