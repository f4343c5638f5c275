mod common;

use approx::assert_relative_eq;
use glacis_pipeline::config::Period;
use glacis_pipeline::{HypsometricAggregator, ValidYearEvaluator, WindowEvaluator};

use common::*;

#[test]
fn test_period_curve_with_missing_bin() {
    let config = config();
    let ctx = context(&config);
    let scenes = ingest(&ctx, &config, &reference_archive());
    let evaluator = WindowEvaluator::new(&ctx, &scenes, &config).unwrap();

    let report = HypsometricAggregator::new(evaluator).run(&config.hypsometry.periods);
    assert!(report.failures.is_empty());
    assert!(report.gated_out_years.is_empty());

    // 2000 covers bins 1000, 1050, 1100; 2001 only 1000 and 1050
    assert_eq!(report.year_rows.iter().filter(|r| r.year == 2000).count(), 3);
    assert_eq!(report.year_rows.iter().filter(|r| r.year == 2001).count(), 2);

    let bins: Vec<f64> = report.rows.iter().map(|r| r.elev_bin).collect();
    assert_eq!(bins, vec![1000.0, 1050.0, 1100.0]);
    let band_km2 = 10.0 * ROW_KM2;
    for row in &report.rows[..2] {
        assert_eq!(row.n_years_in_bin, 2);
        assert_relative_eq!(row.area_km2, band_km2, epsilon = 1e-9);
    }
    // Mean over the one contributing year, not halved by the absent one
    assert_eq!(report.rows[2].n_years_in_bin, 1);
    assert_relative_eq!(report.rows[2].area_km2, band_km2, epsilon = 1e-9);
    assert!(report.rows.iter().all(|r| r.year_group == "Test"));
}

#[test]
fn test_three_year_period_counts_years_per_bin() {
    let mut config = config();
    config.hypsometry.periods = vec![Period::new("Span", 2000, 2002)];
    let mut archive = reference_archive();
    let oli = glacis_pipeline::sensor::SensorProfile::landsat_oli("LC08");
    for month in [9, 10, 11] {
        archive.push(raw_scene(&oli, &format!("season2002-{month}"), (2002, month, 10), 10));
    }
    let ctx = context(&config);
    let scenes = ingest(&ctx, &config, &archive);
    let evaluator = WindowEvaluator::new(&ctx, &scenes, &config).unwrap();

    let report = HypsometricAggregator::new(evaluator).run(&config.hypsometry.periods);
    assert!(report.failures.is_empty());
    assert_eq!(report.year_rows.iter().filter(|r| r.year == 2002).count(), 1);

    // 2002 holds only the 1000 m bin
    let bins: Vec<(f64, usize)> = report.rows.iter().map(|r| (r.elev_bin, r.n_years_in_bin)).collect();
    assert_eq!(bins, vec![(1000.0, 3), (1050.0, 2), (1100.0, 1)]);
    for row in &report.rows {
        assert_relative_eq!(row.area_km2, 10.0 * ROW_KM2, epsilon = 1e-9);
    }
}

#[test]
fn test_gate_excludes_years() {
    let mut config = config();
    config.gates.hypsometry.min_scenes = 4;
    config.hypsometry.periods = vec![Period::new("Early", 2000, 2000), Period::new("Late", 2001, 2002)];
    let ctx = context(&config);
    let scenes = ingest(&ctx, &config, &reference_archive());
    let evaluator = WindowEvaluator::new(&ctx, &scenes, &config).unwrap();

    let report = HypsometricAggregator::new(evaluator).run(&config.hypsometry.periods);
    assert!(report.rows.is_empty());
    assert!(report.year_rows.is_empty());
    assert_eq!(report.gated_out_years, vec![2000, 2001, 2002]);

    let valid = ValidYearEvaluator::new(evaluator).run(&config.hypsometry.periods);
    assert_eq!(valid.summaries.len(), 2);
    assert!(valid.summaries.iter().all(|s| s.n_valid_years == 0 && s.valid_years.is_empty()));
}

#[test]
fn test_periods_sorted_by_label_then_bin() {
    let mut config = config();
    config.hypsometry.periods = vec![Period::new("Late", 2001, 2001), Period::new("Early", 2000, 2000)];
    let ctx = context(&config);
    let scenes = ingest(&ctx, &config, &reference_archive());
    let evaluator = WindowEvaluator::new(&ctx, &scenes, &config).unwrap();

    let report = HypsometricAggregator::new(evaluator).run(&config.hypsometry.periods);
    let keys: Vec<(&str, f64)> = report.rows.iter().map(|r| (r.year_group.as_str(), r.elev_bin)).collect();
    assert_eq!(
        keys,
        vec![("Early", 1000.0), ("Early", 1050.0), ("Early", 1100.0), ("Late", 1000.0), ("Late", 1050.0)]
    );
    assert!(report.rows.iter().all(|r| r.n_years_in_bin == 1));
}

#[test]
fn test_valid_years() {
    let mut config = config();
    config.hypsometry.periods = vec![Period::new("Test", 1999, 2001)];
    let ctx = context(&config);
    let scenes = ingest(&ctx, &config, &reference_archive());
    let evaluator = WindowEvaluator::new(&ctx, &scenes, &config).unwrap();

    let report = ValidYearEvaluator::new(evaluator).run(&config.hypsometry.periods);
    assert!(report.failures.is_empty());
    let summary = &report.summaries[0];
    assert_eq!(summary.year_group, "Test");
    assert_eq!((summary.first_year, summary.last_year), (1999, 2001));
    // 1999 season (Aug 1999 - May 2000) holds only the three summer scenes
    // of 2000, which pass the gate and carry snow
    assert_eq!(summary.valid_years, vec![1999, 2000, 2001]);
    assert_eq!(summary.n_valid_years, 3);
}
