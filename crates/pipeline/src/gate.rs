//! Quality gates
//!
//! Extent, snowline and hypsometry each have their own gate. They share the
//! classifier constants but never each other's thresholds.

use serde::{Deserialize, Serialize};
use glacis_core::{Error, Result};

/// Scene-count and clear-fraction gate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GatePolicy {
    pub min_scenes: usize,
    pub min_clear_fraction: f64,
}

/// Flags produced by a [`GatePolicy`] for one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateOutcome {
    pub ok_scenes: bool,
    /// `None` only when the clear fraction could not be reduced
    pub ok_clear: Option<bool>,
    pub ok_overall: Option<bool>,
}

impl GateOutcome {
    /// Whether the window passed unconditionally
    pub fn passed(&self) -> bool {
        self.ok_overall == Some(true)
    }
}

impl GatePolicy {
    pub const fn new(min_scenes: usize, min_clear_fraction: f64) -> Self {
        Self {
            min_scenes,
            min_clear_fraction,
        }
    }

    pub fn validate(&self, name: &'static str) -> Result<()> {
        validate_fraction(name, self.min_clear_fraction)
    }

    /// Flags for a window with `n_scenes` scenes and the given clear fraction
    pub fn evaluate(&self, n_scenes: usize, clear_fraction: Option<f64>) -> GateOutcome {
        let ok_scenes = n_scenes >= self.min_scenes;
        let ok_clear = if n_scenes == 0 {
            Some(false)
        } else {
            clear_fraction.map(|c| c >= self.min_clear_fraction)
        };
        let ok_overall = match (ok_scenes, ok_clear) {
            (false, _) | (_, Some(false)) => Some(false),
            (true, None) => None,
            (true, Some(true)) => Some(true),
        };
        GateOutcome {
            ok_scenes,
            ok_clear,
            ok_overall,
        }
    }
}

/// Gate for the snowline computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnowlineGate {
    pub min_scenes: usize,
    pub min_clear_fraction: f64,
    /// Extent-window area below which the snowline is not computed
    pub min_glacier_km2: f64,
}

impl SnowlineGate {
    pub fn validate(&self) -> Result<()> {
        validate_fraction("snowline.min_clear_fraction", self.min_clear_fraction)?;
        if !(self.min_glacier_km2.is_finite() && self.min_glacier_km2 >= 0.0) {
            return Err(Error::invalid(
                "snowline.min_glacier_km2",
                self.min_glacier_km2,
                "must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// Whether the snowline may be computed.
    ///
    /// Missing values (no summer scenes, no extent area) never pass.
    pub fn allows(&self, summer_scenes: usize, summer_clear: Option<f64>, extent_km2: Option<f64>) -> bool {
        summer_scenes >= self.min_scenes
            && summer_clear.is_some_and(|c| c >= self.min_clear_fraction)
            && extent_km2.is_some_and(|a| a >= self.min_glacier_km2)
    }
}

fn validate_fraction(name: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::invalid(name, value, "must lie in [0, 1]"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_count_boundary() {
        let gate = GatePolicy::new(2, 0.10);
        assert!(gate.evaluate(2, Some(0.5)).passed());
        let under = gate.evaluate(1, Some(0.5));
        assert!(!under.ok_scenes);
        assert_eq!(under.ok_overall, Some(false));
    }

    #[test]
    fn test_clear_fraction_boundary() {
        let gate = GatePolicy::new(2, 0.10);
        assert_eq!(gate.evaluate(3, Some(0.10)).ok_clear, Some(true));
        let under = gate.evaluate(3, Some(0.0999));
        assert_eq!(under.ok_clear, Some(false));
        assert_eq!(under.ok_overall, Some(false));
    }

    #[test]
    fn test_no_scenes_is_false_not_null() {
        let outcome = GatePolicy::new(2, 0.10).evaluate(0, None);
        assert!(!outcome.ok_scenes);
        assert_eq!(outcome.ok_clear, Some(false));
        assert_eq!(outcome.ok_overall, Some(false));
    }

    #[test]
    fn test_unknown_clear_is_null_when_scenes_ok() {
        let outcome = GatePolicy::new(2, 0.10).evaluate(5, None);
        assert_eq!(outcome.ok_clear, None);
        assert_eq!(outcome.ok_overall, None);
        // scene failure still decides the conjunction
        assert_eq!(GatePolicy::new(9, 0.10).evaluate(5, None).ok_overall, Some(false));
    }

    #[test]
    fn test_overall_is_conjunction() {
        let gate = GatePolicy::new(3, 0.2);
        for n in 0..6 {
            for clear in [0.0, 0.19, 0.2, 0.8] {
                let o = gate.evaluate(n, Some(clear));
                let expected = n >= 3 && clear >= 0.2;
                assert_eq!(o.ok_overall, Some(expected), "n={n} clear={clear}");
            }
        }
    }

    #[test]
    fn test_snowline_gate() {
        let gate = SnowlineGate {
            min_scenes: 3,
            min_clear_fraction: 0.20,
            min_glacier_km2: 5.0,
        };
        assert!(gate.allows(3, Some(0.2), Some(5.0)));
        assert!(!gate.allows(2, Some(0.9), Some(50.0)));
        assert!(!gate.allows(5, Some(0.19), Some(50.0)));
        assert!(!gate.allows(5, Some(0.9), Some(4.99)));
        assert!(!gate.allows(5, Some(0.9), None));
        assert!(!gate.allows(5, None, Some(50.0)));
    }
}
