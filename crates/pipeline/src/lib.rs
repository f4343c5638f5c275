//! # Glacis Pipeline
//!
//! Multi-decade glacier state from a multi-sensor optical archive and a DEM.
//!
//! A run validates a [`PipelineConfig`], builds the [`AnalysisContext`]
//! (footprint, clipped DEM, elevation bands), ingests scenes from one
//! [`SceneArchive`] per sensor and then produces three tables:
//!
//! - [`YearRecord`]: extent area, clear fraction, surface temperature and
//!   snowline elevation per year
//! - [`HypsometryRow`]: mean ice/snow area per elevation bin and period
//! - [`ValidYearsSummary`]: years with usable cover per period
//!
//! Derived statistics are `Option`s. A window without scenes or a reduction
//! without samples yields `None`, never zero.
//!
//! ```no_run
//! use glacis_pipeline::{run, MemoryArchive, PipelineConfig, SceneArchive, write_table};
//! # fn main() -> glacis_core::Result<()> {
//! # let outline: geo::Polygon<f64> = todo!();
//! # let dem: glacis_core::Raster<f64> = todo!();
//! let config = PipelineConfig::from_path("run.json")?;
//! let archive = MemoryArchive::new("LC08");
//! let archives: [&dyn SceneArchive; 1] = [&archive];
//! let outputs = run(outline, &dem, &archives, &config)?;
//! write_table("series.jsonl", &outputs.series.records)?;
//! # Ok(())
//! # }
//! ```

pub mod composite;
pub mod config;
pub mod context;
pub mod gate;
pub mod hypsometry;
pub mod ingest;
pub mod pipeline;
pub mod sensor;
pub mod series;
pub mod table;
pub mod valid_years;
pub mod window;

pub use composite::{median_stack, Compositor, WindowComposite};
pub use config::{PipelineConfig, Period, SamplingScales, SeasonWindow};
pub use context::AnalysisContext;
pub use gate::{GateOutcome, GatePolicy, SnowlineGate};
pub use hypsometry::{aggregate_period, HypsometricAggregator, HypsometryReport, HypsometryRow, YearBinArea};
pub use ingest::{IngestReport, MemoryArchive, RawScene, SceneArchive, SceneIngestor};
pub use pipeline::{run, PipelineOutputs};
pub use sensor::SensorProfile;
pub use series::{RecordParameters, SeriesAssembler, SeriesReport, YearFailure, YearRecord};
pub use table::{read_table, write_table};
pub use valid_years::{ValidYearEvaluator, ValidYearsReport, ValidYearsSummary};
pub use window::{WindowEvaluation, WindowEvaluator};
