//! Per-sensor band layouts and scaling rules
//!
//! Archives deliver raw digital numbers under sensor-specific band names.
//! A [`SensorProfile`] maps them onto the derived `green`, `swir1` and `lst`
//! bands and says which quality bits exclude a pixel.

use serde::{Deserialize, Serialize};
use glacis_core::{Error, Result};

/// Offset subtracted from scaled thermal values to get °C
pub const KELVIN_OFFSET: f64 = 273.15;

/// Linear `value * scale + offset` conversion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandScaling {
    pub scale: f64,
    pub offset: f64,
}

impl BandScaling {
    pub const fn new(scale: f64, offset: f64) -> Self {
        Self { scale, offset }
    }

    #[inline]
    pub fn apply(&self, raw: f64) -> f64 {
        raw * self.scale + self.offset
    }

    fn validate(&self, name: &'static str) -> Result<()> {
        if !(self.scale.is_finite() && self.scale != 0.0 && self.offset.is_finite()) {
            return Err(Error::invalid(
                name,
                format!("scale={}, offset={}", self.scale, self.offset),
                "scale must be finite and non-zero, offset finite",
            ));
        }
        Ok(())
    }
}

/// Collection 2 Level-2 surface reflectance scaling
pub const LANDSAT_C2_REFLECTANCE: BandScaling = BandScaling::new(0.0000275, -0.2);
/// Collection 2 Level-2 surface temperature scaling (to Kelvin)
pub const LANDSAT_C2_THERMAL: BandScaling = BandScaling::new(0.00341802, 149.0);

/// Band layout, scaling and quality-bit rules for one sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorProfile {
    /// Sensor id as reported by its archive
    pub sensor: String,
    pub green_band: String,
    pub swir1_band: String,
    /// Thermal band, if the sensor has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_band: Option<String>,
    pub qa_band: String,
    pub reflectance: BandScaling,
    pub thermal: BandScaling,
    pub cloud_bit: u8,
    pub shadow_bit: u8,
}

impl SensorProfile {
    fn landsat(sensor: &str, green: &str, swir1: &str, thermal: &str) -> Self {
        Self {
            sensor: sensor.to_string(),
            green_band: green.to_string(),
            swir1_band: swir1.to_string(),
            thermal_band: Some(thermal.to_string()),
            qa_band: "QA_PIXEL".to_string(),
            reflectance: LANDSAT_C2_REFLECTANCE,
            thermal: LANDSAT_C2_THERMAL,
            cloud_bit: 3,
            shadow_bit: 4,
        }
    }

    /// Landsat 4/5 TM and 7 ETM+ layout
    pub fn landsat_tm_etm(sensor: &str) -> Self {
        Self::landsat(sensor, "SR_B2", "SR_B5", "ST_B6")
    }

    /// Landsat 8 OLI/TIRS layout
    pub fn landsat_oli(sensor: &str) -> Self {
        Self::landsat(sensor, "SR_B3", "SR_B6", "ST_B10")
    }

    /// Profiles for LT04, LT05, LE07 and LC08
    pub fn landsat_reference() -> Vec<Self> {
        vec![
            Self::landsat_tm_etm("LT04"),
            Self::landsat_tm_etm("LT05"),
            Self::landsat_tm_etm("LE07"),
            Self::landsat_oli("LC08"),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        if self.sensor.is_empty() {
            return Err(Error::invalid("sensor", "\"\"", "sensor id must not be empty"));
        }
        for (name, bit) in [("cloud_bit", self.cloud_bit), ("shadow_bit", self.shadow_bit)] {
            if bit >= 16 {
                return Err(Error::invalid(name, bit, "quality bit must be below 16"));
            }
        }
        self.reflectance.validate("reflectance")?;
        self.thermal.validate("thermal")?;
        Ok(())
    }

    /// Whether a quality value flags the pixel as cloud or cloud shadow
    #[inline]
    pub fn is_excluded(&self, quality: u16) -> bool {
        let flags = (1u16 << self.cloud_bit) | (1u16 << self.shadow_bit);
        quality & flags != 0
    }

    /// Reflectance from a raw value
    #[inline]
    pub fn reflectance(&self, raw: f64) -> f64 {
        self.reflectance.apply(raw)
    }

    /// Surface temperature in °C from a raw value
    #[inline]
    pub fn temperature_c(&self, raw: f64) -> f64 {
        self.thermal.apply(raw) - KELVIN_OFFSET
    }
}
