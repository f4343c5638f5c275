//! End-to-end run

use geo::MultiPolygon;
use tracing::info;
use glacis_core::raster::Raster;
use glacis_core::Result;

use crate::config::PipelineConfig;
use crate::context::AnalysisContext;
use crate::hypsometry::{HypsometricAggregator, HypsometryReport};
use crate::ingest::{IngestReport, SceneArchive, SceneIngestor};
use crate::series::{SeriesAssembler, SeriesReport};
use crate::valid_years::{ValidYearEvaluator, ValidYearsReport};
use crate::window::WindowEvaluator;

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    pub ingest: IngestReport,
    pub series: SeriesReport,
    pub hypsometry: HypsometryReport,
    pub valid_years: ValidYearsReport,
}

/// Ingest `archives`, then build the yearly series, the hypsometric curves
/// and the valid-year summaries.
///
/// Fails only on invalid configuration or a degenerate geometry; sensor and
/// per-year problems are carried in the reports.
pub fn run(
    outline: impl Into<MultiPolygon<f64>>,
    dem: &Raster<f64>,
    archives: &[&dyn SceneArchive],
    config: &PipelineConfig,
) -> Result<PipelineOutputs> {
    let context = AnalysisContext::new(outline, dem, config)?;
    let (scenes, ingest) = SceneIngestor::new(&context, &config.sensors).ingest(archives);
    let evaluator = WindowEvaluator::new(&context, &scenes, config)?;

    let series = match SeriesAssembler::year_range(config, &scenes) {
        Some(years) => SeriesAssembler::new(evaluator).run(years),
        None => {
            info!("no scenes and no first year configured, yearly series is empty");
            SeriesReport::default()
        }
    };
    let hypsometry = HypsometricAggregator::new(evaluator).run(&config.hypsometry.periods);
    let valid_years = ValidYearEvaluator::new(evaluator).run(&config.hypsometry.periods);

    Ok(PipelineOutputs {
        ingest,
        series,
        hypsometry,
        valid_years,
    })
}
