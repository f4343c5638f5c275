//! Per-window median compositing

use chrono::NaiveDate;
use ndarray::Array2;
use rayon::prelude::*;
use tracing::debug;
use glacis_core::raster::Raster;
use glacis_core::scene::bands;
use glacis_core::{DateWindow, Error, Result, Scene, SceneSet};

/// Median composite of the scenes in one window.
///
/// Only exists for windows with at least one scene; an empty window is
/// `None` at the call site so that no statistic can read zeros from it.
#[derive(Debug, Clone)]
pub struct WindowComposite {
    pub window: DateWindow,
    pub n_scenes: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub green: Raster<f64>,
    pub swir1: Raster<f64>,
    /// °C; present when at least one scene carries a thermal band
    pub lst: Option<Raster<f64>>,
}

/// Filters a scene set by window and builds median composites
#[derive(Debug, Clone, Copy)]
pub struct Compositor<'a> {
    scenes: &'a SceneSet,
}

impl<'a> Compositor<'a> {
    pub fn new(scenes: &'a SceneSet) -> Self {
        Self { scenes }
    }

    /// Median composite for `window`, `None` when it holds no scene
    pub fn composite(&self, window: &DateWindow) -> Result<Option<WindowComposite>> {
        let scenes = self.scenes.within(window);
        let (Some(first), Some(last)) = (scenes.first(), scenes.last()) else {
            debug!(%window, "no scenes in window");
            return Ok(None);
        };
        let first_date = first.acquired().date_naive();
        let last_date = last.acquired().date_naive();

        let green = median_stack(&collect_band(&scenes, bands::GREEN)?)?;
        let swir1 = median_stack(&collect_band(&scenes, bands::SWIR1)?)?;

        let thermal: Vec<&Raster<f64>> = scenes.iter().filter_map(|s| s.band(bands::LST)).collect();
        let lst = if thermal.is_empty() {
            None
        } else {
            Some(median_stack(&thermal)?)
        };

        debug!(%window, n = scenes.len(), thermal = thermal.len(), "composited window");
        Ok(Some(WindowComposite {
            window: *window,
            n_scenes: scenes.len(),
            first_date,
            last_date,
            green,
            swir1,
            lst,
        }))
    }
}

fn collect_band<'s>(scenes: &[&'s Scene], name: &str) -> Result<Vec<&'s Raster<f64>>> {
    scenes
        .iter()
        .map(|s| {
            s.band(name).ok_or_else(|| Error::MissingBand {
                sensor: s.sensor().to_string(),
                scene: s.id().to_string(),
                band: name.to_string(),
            })
        })
        .collect()
}

/// Per-pixel median over the non-NaN values of a raster stack.
///
/// An even number of values gives the mean of the two middle ones; a pixel
/// with no valid value stays NaN.
pub fn median_stack(stack: &[&Raster<f64>]) -> Result<Raster<f64>> {
    let template = stack
        .first()
        .ok_or_else(|| Error::Algorithm("median of an empty stack".into()))?;
    for raster in stack.iter().skip(1) {
        template.ensure_same_shape(*raster)?;
    }
    let (rows, cols) = template.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut values = Vec::with_capacity(stack.len());
            for (col, out) in row_data.iter_mut().enumerate() {
                values.clear();
                values.extend(
                    stack
                        .iter()
                        .map(|r| unsafe { r.get_unchecked(row, col) })
                        .filter(|v| !v.is_nan()),
                );
                *out = median_of(&mut values);
            }
            row_data
        })
        .collect();

    let array = Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    let mut output = template.with_data(array)?;
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}

fn median_of(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
