//! Run configuration
//!
//! Every tunable of a run lives in one immutable [`PipelineConfig`] that is
//! passed by reference to each stage. All sections default to the reference
//! values, so a JSON file only needs the keys it changes:
//!
//! ```json
//! {
//!   "classifier": { "ndsi_threshold": 0.45 },
//!   "years": { "first": 1990, "last": 2020 },
//!   "reduction": { "kind": "tiled", "tile_size": 256, "max_pixels": 4000000, "histogram_bin": 1.0 }
//! }
//! ```

use std::fmt;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use glacis_algorithms::imagery::ClassifierParams;
use glacis_algorithms::morphology::CleaningParams;
use glacis_algorithms::statistics::ReductionStrategy;
use glacis_core::{DateWindow, Error, Result};

use crate::gate::{GatePolicy, SnowlineGate};
use crate::sensor::SensorProfile;

/// Complete configuration of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub geometry: GeometryConfig,
    pub classifier: ClassifierParams,
    pub cleaning: CleaningParams,
    pub gates: GateConfig,
    pub windows: WindowConfig,
    pub scales: SamplingScales,
    pub hypsometry: HypsometryConfig,
    pub years: YearRange,
    pub reduction: ReductionStrategy,
    /// Worker threads for per-year fan-out; `None` uses the global pool
    pub threads: Option<usize>,
    pub sensors: Vec<SensorProfile>,
    /// Elevation dataset label recorded in every year record
    pub dem_label: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            geometry: GeometryConfig::default(),
            classifier: ClassifierParams::default(),
            cleaning: CleaningParams::default(),
            gates: GateConfig::default(),
            windows: WindowConfig::default(),
            scales: SamplingScales::default(),
            hypsometry: HypsometryConfig::default(),
            years: YearRange::default(),
            reduction: ReductionStrategy::default(),
            threads: None,
            sensors: SensorProfile::landsat_reference(),
            dem_label: "NASADEM_HGT_001".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Check every section; called before any per-year work
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        self.classifier.validate()?;
        self.cleaning.validate()?;
        self.gates.validate()?;
        self.windows.season.validate()?;
        self.windows.summer.validate()?;
        self.scales.validate()?;
        self.hypsometry.validate()?;
        self.years.validate()?;
        self.reduction.validate()?;
        if self.threads == Some(0) {
            return Err(Error::invalid("threads", 0, "use null for the global pool"));
        }
        for profile in &self.sensors {
            profile.validate()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Buffer around the outline for all reductions, metres
    pub analysis_buffer_m: f64,
    /// Extra reach when querying archives, metres
    pub search_buffer_m: f64,
    /// Douglas-Peucker tolerance, metres; 0 disables simplification
    pub simplify_m: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            analysis_buffer_m: 300.0,
            search_buffer_m: 8000.0,
            simplify_m: 20.0,
        }
    }
}

impl GeometryConfig {
    fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("analysis_buffer_m", self.analysis_buffer_m),
            ("search_buffer_m", self.search_buffer_m),
            ("simplify_m", self.simplify_m),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(Error::invalid(name, v, "must be finite and >= 0"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub extent: GatePolicy,
    pub snowline: SnowlineGate,
    pub hypsometry: GatePolicy,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            extent: GatePolicy::new(2, 0.10),
            snowline: SnowlineGate {
                min_scenes: 3,
                min_clear_fraction: 0.20,
                min_glacier_km2: 5.0,
            },
            hypsometry: GatePolicy::new(4, 0.20),
        }
    }
}

impl GateConfig {
    fn validate(&self) -> Result<()> {
        self.extent.validate("extent.min_clear_fraction")?;
        self.snowline.validate()?;
        self.hypsometry.validate("hypsometry.min_clear_fraction")
    }
}

/// Calendar month and day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub const fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }

    fn validate(&self) -> Result<()> {
        // leap year so that 29 Feb is accepted
        if NaiveDate::from_ymd_opt(2000, self.month, self.day).is_none() {
            return Err(Error::invalid("month_day", self, "not a calendar day"));
        }
        Ok(())
    }

    /// The date in `year`; 29 Feb becomes 28 Feb in common years
    pub fn in_year(&self, year: i32) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
            .or_else(|| NaiveDate::from_ymd_opt(year, self.month, self.day.saturating_sub(1)))
            .ok_or_else(|| Error::invalid("month_day", format!("{year}-{self}"), "not a calendar day"))
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.day)
    }
}

/// Yearly window from `start` in year y to `end` (inclusive) in year
/// y + `end_year_offset`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonWindow {
    pub start: MonthDay,
    pub end: MonthDay,
    pub end_year_offset: i32,
}

impl SeasonWindow {
    fn validate(&self) -> Result<()> {
        self.start.validate()?;
        self.end.validate()?;
        if self.end_year_offset < 0 {
            return Err(Error::invalid("end_year_offset", self.end_year_offset, "must be >= 0"));
        }
        // Probe a common and a leap year for an empty window
        self.window(2001)?;
        self.window(2003)?;
        Ok(())
    }

    /// The half-open date window for `year`
    pub fn window(&self, year: i32) -> Result<DateWindow> {
        let first = self.start.in_year(year)?;
        let last = self.end.in_year(year + self.end_year_offset)?;
        DateWindow::inclusive(first, last)
    }

    /// Label such as `8/1-5/31`
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Extent window, wrapping into the following year
    pub season: SeasonWindow,
    /// Snowline window inside the calendar year
    pub summer: SeasonWindow,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            season: SeasonWindow {
                start: MonthDay::new(8, 1),
                end: MonthDay::new(5, 31),
                end_year_offset: 1,
            },
            summer: SeasonWindow {
                start: MonthDay::new(1, 1),
                end: MonthDay::new(3, 31),
                end_year_offset: 0,
            },
        }
    }
}

/// Sampling scale, in metres, of every reduction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingScales {
    pub area_m: f64,
    pub clear_fraction_m: f64,
    pub temperature_m: f64,
    pub snowline_m: f64,
    pub hypsometry_m: f64,
    pub hypsometry_clear_fraction_m: f64,
    pub valid_year_m: f64,
}

impl Default for SamplingScales {
    fn default() -> Self {
        Self {
            area_m: 30.0,
            clear_fraction_m: 60.0,
            temperature_m: 120.0,
            snowline_m: 30.0,
            hypsometry_m: 60.0,
            hypsometry_clear_fraction_m: 120.0,
            valid_year_m: 120.0,
        }
    }
}

impl SamplingScales {
    fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("scales.area_m", self.area_m),
            ("scales.clear_fraction_m", self.clear_fraction_m),
            ("scales.temperature_m", self.temperature_m),
            ("scales.snowline_m", self.snowline_m),
            ("scales.hypsometry_m", self.hypsometry_m),
            ("scales.hypsometry_clear_fraction_m", self.hypsometry_clear_fraction_m),
            ("scales.valid_year_m", self.valid_year_m),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(Error::invalid(name, v, "must be finite and > 0"));
            }
        }
        Ok(())
    }
}

/// Named inclusive year range aggregated into one hypsometric curve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub label: String,
    pub first_year: i32,
    pub last_year: i32,
}

impl Period {
    pub fn new(label: impl Into<String>, first_year: i32, last_year: i32) -> Self {
        Self {
            label: label.into(),
            first_year,
            last_year,
        }
    }

    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.first_year..=self.last_year
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HypsometryConfig {
    pub bin_size_m: f64,
    pub periods: Vec<Period>,
}

impl Default for HypsometryConfig {
    fn default() -> Self {
        Self {
            bin_size_m: 50.0,
            periods: vec![Period::new("Early", 1989, 2005), Period::new("Late", 2006, 2022)],
        }
    }
}

impl HypsometryConfig {
    fn validate(&self) -> Result<()> {
        if !(self.bin_size_m.is_finite() && self.bin_size_m > 0.0) {
            return Err(Error::invalid("bin_size_m", self.bin_size_m, "must be finite and > 0"));
        }
        for period in &self.periods {
            if period.first_year > period.last_year {
                return Err(Error::invalid(
                    "period",
                    format!("{} {}..={}", period.label, period.first_year, period.last_year),
                    "first_year must not exceed last_year",
                ));
            }
        }
        Ok(())
    }
}

/// Years of the yearly series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YearRange {
    /// First year; `None` starts at the year of the earliest scene
    pub first: Option<i32>,
    pub last: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            first: None,
            last: 2025,
        }
    }
}

impl YearRange {
    fn validate(&self) -> Result<()> {
        if let Some(first) = self.first {
            if first > self.last {
                return Err(Error::invalid("years.first", first, format!("exceeds years.last ({})", self.last)));
            }
        }
        Ok(())
    }

    /// Resolve the range; `None` when there is no first year
    pub fn resolve(&self, earliest_scene: Option<NaiveDate>) -> Option<std::ops::RangeInclusive<i32>> {
        let first = self.first.or(earliest_scene.map(|d| d.year()))?;
        Some(first..=self.last)
    }
}
