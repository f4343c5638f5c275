//! Shared window pipeline: composite, clear fraction, classify, clean
//!
//! The yearly series, the hypsometry and the valid-year evaluation all run
//! the same chain on a window and differ only in sampling scales and gates.

use glacis_algorithms::imagery::classify;
use glacis_algorithms::morphology::despeckle;
use glacis_algorithms::statistics::{Reduction, RegionReducer};
use glacis_core::raster::BinaryMask;
use glacis_core::{DateWindow, Result, SceneSet};

use crate::composite::{Compositor, WindowComposite};
use crate::config::PipelineConfig;
use crate::context::AnalysisContext;
use crate::gate::{GateOutcome, GatePolicy};

/// One window after compositing and clear-fraction reduction
#[derive(Debug, Clone)]
pub struct WindowEvaluation {
    pub window: DateWindow,
    /// `None` when the window holds no scene
    pub composite: Option<WindowComposite>,
    /// `None` when there is no composite or the lattice misses the footprint
    pub clear_fraction: Option<f64>,
    /// Any reduction of this window was coarsened
    pub coarsened: bool,
}

impl WindowEvaluation {
    pub fn n_scenes(&self) -> usize {
        self.composite.as_ref().map_or(0, |c| c.n_scenes)
    }

    /// Gate flags for this window
    pub fn gate(&self, policy: &GatePolicy) -> GateOutcome {
        policy.evaluate(self.n_scenes(), self.clear_fraction)
    }
}

/// Runs the window pipeline against one context, scene set and config
#[derive(Debug, Clone, Copy)]
pub struct WindowEvaluator<'a> {
    context: &'a AnalysisContext,
    config: &'a PipelineConfig,
    compositor: Compositor<'a>,
    reducer: RegionReducer<'a>,
}

impl<'a> WindowEvaluator<'a> {
    pub fn new(context: &'a AnalysisContext, scenes: &'a SceneSet, config: &'a PipelineConfig) -> Result<Self> {
        Ok(Self {
            context,
            config,
            compositor: Compositor::new(scenes),
            reducer: context.reducer()?,
        })
    }

    pub fn context(&self) -> &'a AnalysisContext {
        self.context
    }

    pub fn config(&self) -> &'a PipelineConfig {
        self.config
    }

    pub fn reducer(&self) -> &RegionReducer<'a> {
        &self.reducer
    }

    /// Composite `window` and reduce its clear fraction at `clear_scale_m`
    pub fn evaluate(&self, window: DateWindow, clear_scale_m: f64) -> Result<WindowEvaluation> {
        let composite = self.compositor.composite(&window)?;
        let (clear_fraction, coarsened) = match &composite {
            Some(c) => {
                let Reduction { value, coarsened, .. } = self.reducer.valid_fraction(&c.green, clear_scale_m)?;
                (value, coarsened)
            }
            None => (None, false),
        };
        Ok(WindowEvaluation {
            window,
            composite,
            clear_fraction,
            coarsened,
        })
    }

    /// Raw snow/ice mask; `None` without a composite
    pub fn classify(&self, evaluation: &WindowEvaluation) -> Result<Option<BinaryMask>> {
        evaluation
            .composite
            .as_ref()
            .map(|c| classify(&c.green, &c.swir1, &self.config.classifier))
            .transpose()
    }

    /// Despeckled snow/ice mask; `None` without a composite
    pub fn cleaned_mask(&self, evaluation: &WindowEvaluation) -> Result<Option<BinaryMask>> {
        self.classify(evaluation)?
            .map(|mask| despeckle(&mask, &self.config.cleaning))
            .transpose()
    }

    /// Despeckled mask of a window that passes `policy`; `None` otherwise
    pub fn gated_cleaned_mask(&self, evaluation: &WindowEvaluation, policy: &GatePolicy) -> Result<Option<BinaryMask>> {
        if !evaluation.gate(policy).passed() {
            return Ok(None);
        }
        self.cleaned_mask(evaluation)
    }
}
