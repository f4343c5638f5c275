//! Region reductions over the analysis footprint
//!
//! Every reduction samples the footprint on a global lattice whose stride is
//! the requested sampling scale divided by the cell size, so a 60 m reduction
//! on a 30 m grid reads every second row and column. Each sampled pixel
//! stands for `stride²` cells of ground area.
//!
//! Two strategies are available:
//! - **Exact**: one pass over the whole grid, percentiles from the sorted
//!   samples.
//! - **Tiled**: independent tiles reduced in parallel and merged through
//!   associative accumulators. Percentiles come from a fixed-width histogram,
//!   and a reduction sampling more than `max_pixels` pixels doubles its
//!   stride until it fits (flagged as coarsened).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use glacis_core::geometry::Footprint;
use glacis_core::raster::{BinaryMask, Raster, RasterElement};
use glacis_core::{Error, Result};
use glacis_parallel::{ParallelStrategy, ProcessingMode, Tile, TileIterator};

/// How region reductions are evaluated
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReductionStrategy {
    /// Single pass, exact percentiles
    #[default]
    Exact,
    /// Tile-parallel with bounded sample counts
    Tiled {
        /// Tile side in pixels
        tile_size: usize,
        /// Largest number of sampled pixels before the stride is doubled
        max_pixels: usize,
        /// Histogram bin width for percentiles, in value units
        histogram_bin: f64,
    },
}

impl ReductionStrategy {
    /// Tiled strategy with reference settings
    pub fn tiled() -> Self {
        ReductionStrategy::Tiled {
            tile_size: 256,
            max_pixels: 10_000_000,
            histogram_bin: 1.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let ReductionStrategy::Tiled {
            tile_size,
            max_pixels,
            histogram_bin,
        } = *self
        {
            if tile_size == 0 {
                return Err(Error::invalid("tile_size", tile_size, "must be at least 1"));
            }
            if max_pixels == 0 {
                return Err(Error::invalid("max_pixels", max_pixels, "must be at least 1"));
            }
            if !(histogram_bin.is_finite() && histogram_bin > 0.0) {
                return Err(Error::invalid("histogram_bin", histogram_bin, "must be finite and > 0"));
            }
        }
        Ok(())
    }
}

/// A reduced value together with how it was sampled
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction<T> {
    pub value: T,
    /// Effective sampling scale in metres (larger than requested if coarsened)
    pub scale_used: f64,
    /// Whether the stride was increased to respect `max_pixels`
    pub coarsened: bool,
}

impl<T> Reduction<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Reduction<U> {
        Reduction {
            value: f(self.value),
            scale_used: self.scale_used,
            coarsened: self.coarsened,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SamplingPlan {
    stride: usize,
    coarsened: bool,
    scale_used: f64,
}

impl SamplingPlan {
    /// Ground area, in km², represented by one sampled pixel
    fn weight_km2(&self, footprint: &Footprint) -> f64 {
        let stride = self.stride as f64;
        stride * stride * footprint.transform().pixel_area() / 1.0e6
    }
}

// ---------------------------------------------------------------------------
// Accumulators
// ---------------------------------------------------------------------------

/// Value samples: raw for exact percentiles, binned for tiled ones
#[derive(Debug, Clone)]
enum Samples {
    Raw(Vec<f64>),
    Binned { bin: f64, counts: BTreeMap<i64, u64> },
}

impl Samples {
    fn for_strategy(strategy: &ReductionStrategy) -> Self {
        match *strategy {
            ReductionStrategy::Exact => Samples::Raw(Vec::new()),
            ReductionStrategy::Tiled { histogram_bin, .. } => Samples::Binned {
                bin: histogram_bin,
                counts: BTreeMap::new(),
            },
        }
    }

    fn push(&mut self, value: f64) {
        match self {
            Samples::Raw(values) => values.push(value),
            Samples::Binned { bin, counts } => {
                let key = (value / *bin).floor() as i64;
                *counts.entry(key).or_insert(0) += 1;
            }
        }
    }

    fn merge(mut self, other: Samples) -> Self {
        match (&mut self, other) {
            (Samples::Raw(a), Samples::Raw(b)) => a.extend(b),
            (Samples::Binned { counts: a, .. }, Samples::Binned { counts: b, .. }) => {
                for (key, n) in b {
                    *a.entry(key).or_insert(0) += n;
                }
            }
            // Accumulators of one reduction always share a variant
            _ => {}
        }
        self
    }

    fn len(&self) -> u64 {
        match self {
            Samples::Raw(values) => values.len() as u64,
            Samples::Binned { counts, .. } => counts.values().sum(),
        }
    }

    /// Linear interpolation between closest ranks, `None` when empty
    fn quantiles(self, quantiles: &[f64]) -> Option<Vec<f64>> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        match self {
            Samples::Raw(mut values) => {
                values.sort_by(f64::total_cmp);
                Some(
                    quantiles
                        .iter()
                        .map(|&q| interpolate(q, n, |rank| values[rank as usize]))
                        .collect(),
                )
            }
            Samples::Binned { bin, counts } => {
                // (cumulative count after the bin, bin centre)
                let mut cumulative = Vec::with_capacity(counts.len());
                let mut total = 0u64;
                for (key, count) in counts {
                    total += count;
                    cumulative.push((total, (key as f64 + 0.5) * bin));
                }
                let value_at = |rank: u64| {
                    let i = cumulative.partition_point(|&(upto, _)| upto <= rank);
                    cumulative[i.min(cumulative.len() - 1)].1
                };
                Some(quantiles.iter().map(|&q| interpolate(q, n, value_at)).collect())
            }
        }
    }
}

fn interpolate(q: f64, n: u64, value_at: impl Fn(u64) -> f64) -> f64 {
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as u64;
    let hi = pos.ceil() as u64;
    let lo_value = value_at(lo);
    if hi == lo {
        return lo_value;
    }
    lo_value + (pos - lo as f64) * (value_at(hi) - lo_value)
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

/// Reductions over the pixels of one footprint
#[derive(Debug, Clone, Copy)]
pub struct RegionReducer<'a> {
    footprint: &'a Footprint,
    strategy: ReductionStrategy,
    mode: ProcessingMode,
}

impl<'a> RegionReducer<'a> {
    pub fn new(footprint: &'a Footprint, strategy: ReductionStrategy, mode: ProcessingMode) -> Result<Self> {
        strategy.validate()?;
        Ok(Self {
            footprint,
            strategy,
            mode,
        })
    }

    /// Exact, single-threaded reducer
    pub fn exact(footprint: &'a Footprint) -> Self {
        Self {
            footprint,
            strategy: ReductionStrategy::Exact,
            mode: ProcessingMode::Sequential,
        }
    }

    pub fn footprint(&self) -> &'a Footprint {
        self.footprint
    }

    pub fn strategy(&self) -> &ReductionStrategy {
        &self.strategy
    }

    /// Area in km² of mask pixels equal to 1
    pub fn area_km2(&self, mask: &BinaryMask, scale_m: f64) -> Result<Reduction<f64>> {
        self.ensure_grid(mask)?;
        let plan = self.plan(scale_m)?;
        let hits = self.fold(
            &plan,
            || 0u64,
            |acc, r, c| {
                if unsafe { mask.get_unchecked(r, c) } == 1 {
                    *acc += 1;
                }
            },
            |a, b| a + b,
        );
        Ok(self.finish(plan, hits as f64 * plan.weight_km2(self.footprint)))
    }

    /// Fraction of footprint samples where `raster` holds a valid value.
    ///
    /// `None` when the lattice misses the footprint entirely.
    pub fn valid_fraction(&self, raster: &Raster<f64>, scale_m: f64) -> Result<Reduction<Option<f64>>> {
        self.ensure_grid(raster)?;
        let plan = self.plan(scale_m)?;
        let (valid, total) = self.fold(
            &plan,
            || (0u64, 0u64),
            |acc, r, c| {
                let v = unsafe { raster.get_unchecked(r, c) };
                acc.1 += 1;
                if !raster.is_nodata(v) {
                    acc.0 += 1;
                }
            },
            |a, b| (a.0 + b.0, a.1 + b.1),
        );
        let fraction = (total > 0).then(|| valid as f64 / total as f64);
        Ok(self.finish(plan, fraction))
    }

    /// Quantiles (each in [0, 1]) of the valid `values` under `selector`.
    ///
    /// Without a selector every footprint pixel is eligible. `None` when no
    /// sampled pixel is both selected and valid.
    pub fn percentiles(
        &self,
        values: &Raster<f64>,
        selector: Option<&BinaryMask>,
        quantiles: &[f64],
        scale_m: f64,
    ) -> Result<Reduction<Option<Vec<f64>>>> {
        self.ensure_grid(values)?;
        if let Some(selector) = selector {
            self.ensure_grid(selector)?;
        }
        for &q in quantiles {
            if !(0.0..=1.0).contains(&q) {
                return Err(Error::invalid("quantile", q, "must lie in [0, 1]"));
            }
        }

        let plan = self.plan(scale_m)?;
        let samples = self.fold(
            &plan,
            || Samples::for_strategy(&self.strategy),
            |acc, r, c| {
                if selector.is_some_and(|s| unsafe { s.get_unchecked(r, c) } != 1) {
                    return;
                }
                let v = unsafe { values.get_unchecked(r, c) };
                if !values.is_nodata(v) {
                    acc.push(v);
                }
            },
            Samples::merge,
        );
        Ok(self.finish(plan, samples.quantiles(quantiles)))
    }

    /// Median of the valid `values` under `selector`
    pub fn median(
        &self,
        values: &Raster<f64>,
        selector: Option<&BinaryMask>,
        scale_m: f64,
    ) -> Result<Reduction<Option<f64>>> {
        let reduction = self.percentiles(values, selector, &[0.5], scale_m)?;
        Ok(reduction.map(|q| q.and_then(|q| q.first().copied())))
    }

    /// Area in km² of mask pixels per group id.
    ///
    /// Groups equal to the raster's no-data value are skipped. Only groups
    /// with at least one sampled mask pixel appear in the result.
    pub fn grouped_area_km2(
        &self,
        groups: &Raster<i32>,
        mask: &BinaryMask,
        scale_m: f64,
    ) -> Result<Reduction<BTreeMap<i32, f64>>> {
        self.ensure_grid(groups)?;
        self.ensure_grid(mask)?;
        let plan = self.plan(scale_m)?;
        let counts = self.fold(
            &plan,
            BTreeMap::<i32, u64>::new,
            |acc, r, c| {
                if unsafe { mask.get_unchecked(r, c) } != 1 {
                    return;
                }
                let group = unsafe { groups.get_unchecked(r, c) };
                if !groups.is_nodata(group) {
                    *acc.entry(group).or_insert(0) += 1;
                }
            },
            |mut a, b| {
                for (group, n) in b {
                    *a.entry(group).or_insert(0) += n;
                }
                a
            },
        );
        let weight = plan.weight_km2(self.footprint);
        let areas = counts
            .into_iter()
            .map(|(group, n)| (group, n as f64 * weight))
            .collect();
        Ok(self.finish(plan, areas))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ensure_grid<T: RasterElement>(&self, raster: &Raster<T>) -> Result<()> {
        self.footprint.coverage().ensure_same_shape(raster)
    }

    fn tiles(&self) -> Vec<Tile> {
        let (rows, cols) = self.footprint.shape();
        match self.strategy {
            ReductionStrategy::Exact => vec![Tile::whole(rows, cols)],
            ReductionStrategy::Tiled { tile_size, .. } => TileIterator::new(rows, cols, tile_size).collect(),
        }
    }

    /// Visit every footprint pixel on the plan's lattice, one accumulator
    /// per tile, then merge the tile accumulators in tile order.
    fn fold<A, I, V, M>(&self, plan: &SamplingPlan, init: I, visit: V, merge: M) -> A
    where
        A: Send,
        I: Fn() -> A + Sync + Send,
        V: Fn(&mut A, usize, usize) + Sync + Send,
        M: Fn(A, A) -> A,
    {
        let coverage = self.footprint.coverage();
        let stride = plan.stride;
        let tiles = self.tiles();

        let partials = self.mode.par_map_items(&tiles, |tile| {
            let mut acc = init();
            for (r, c) in tile.lattice(stride) {
                if unsafe { coverage.get_unchecked(r, c) } == 1 {
                    visit(&mut acc, r, c);
                }
            }
            acc
        });

        partials.into_iter().fold(init(), merge)
    }

    fn plan(&self, scale_m: f64) -> Result<SamplingPlan> {
        if !(scale_m.is_finite() && scale_m > 0.0) {
            return Err(Error::invalid("scale_m", scale_m, "must be finite and > 0"));
        }
        let cell = self.footprint.transform().cell_size();
        let mut plan = SamplingPlan {
            stride: ((scale_m / cell).round() as usize).max(1),
            coarsened: false,
            scale_used: 0.0,
        };

        if let ReductionStrategy::Tiled { max_pixels, .. } = self.strategy {
            let (rows, cols) = self.footprint.shape();
            let limit = rows.max(cols).max(1);
            let mut sampled = self.fold(&plan, || 0usize, |n, _, _| *n += 1, |a, b| a + b);
            while sampled > max_pixels && plan.stride < limit {
                plan.stride *= 2;
                plan.coarsened = true;
                sampled = self.fold(&plan, || 0usize, |n, _, _| *n += 1, |a, b| a + b);
            }
            if plan.coarsened {
                debug!(
                    requested_m = scale_m,
                    stride = plan.stride,
                    sampled,
                    max_pixels,
                    "coarsened reduction to fit pixel budget"
                );
            }
        }

        plan.scale_used = plan.stride as f64 * cell;
        Ok(plan)
    }

    fn finish<T>(&self, plan: SamplingPlan, value: T) -> Reduction<T> {
        Reduction {
            value,
            scale_used: plan.scale_used,
            coarsened: plan.coarsened,
        }
    }
}
